//! Hex board geometry with axial coordinates
//!
//! The 61 cells of a radius-4 hexagon are numbered row by row, top to bottom
//! (r = -4 first), left to right within a row. The index tables and the
//! neighbour graph never change, so they are built once per process and
//! shared by every [`GameState`](crate::game::GameState).

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Board radius (distance from center to edge)
pub const BOARD_RADIUS: i8 = 4;

/// Number of cells on the board
pub const CELL_COUNT: usize = 61;

/// Canonical identity of a board position, in `0..CELL_COUNT`
pub type Cell = usize;

/// Index into [`DIRECTIONS`]
pub type Direction = u8;

/// Unit direction vectors in axial coordinates (dq, dr)
pub const DIRECTIONS: [(i8, i8); 6] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, -1),
    (-1, 1),
];

/// Look up the direction index for a unit vector
pub fn direction_of(dq: i8, dr: i8) -> Option<Direction> {
    DIRECTIONS
        .iter()
        .position(|&d| d == (dq, dr))
        .map(|i| i as Direction)
}

/// Axial hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex {
    pub q: i8,
    pub r: i8,
}

impl Hex {
    pub const fn new(q: i8, r: i8) -> Self {
        Self { q, r }
    }

    /// Check if this hex is on the board
    pub fn is_valid(&self) -> bool {
        self.q.abs() <= BOARD_RADIUS
            && self.r.abs() <= BOARD_RADIUS
            && (self.q + self.r).abs() <= BOARD_RADIUS
    }

    /// Distance from center (0,0)
    pub fn distance_to_center(&self) -> i8 {
        self.q.abs().max(self.r.abs()).max((self.q + self.r).abs())
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: Hex) -> i8 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = ((self.q + self.r) - (other.q + other.r)).abs();
        dq.max(dr).max(ds)
    }

    /// Steps to the outer ring: 0 on the edge, 4 at the center
    pub fn edge_distance(&self) -> i8 {
        (BOARD_RADIUS - self.q.abs())
            .min(BOARD_RADIUS - self.r.abs())
            .min(BOARD_RADIUS - (self.q + self.r).abs())
    }

    /// Get neighbor in direction (0-5); may be off the board
    pub fn neighbor(&self, direction: Direction) -> Hex {
        let (dq, dr) = DIRECTIONS[direction as usize % 6];
        Hex::new(self.q + dq, self.r + dr)
    }
}

/// Index tables and adjacency for the fixed 61-cell board
#[derive(Debug)]
pub struct Geometry {
    /// Cell -> axial coordinate
    coords: [Hex; CELL_COUNT],
    /// (q + 4, r + 4) -> cell, `None` outside the hexagon
    lookup: [[Option<Cell>; 9]; 9],
    /// Cell -> cell one step away in each direction
    steps: [[Option<Cell>; 6]; CELL_COUNT],
    /// Cell -> on-board neighbours, in direction order
    neighbors: Vec<Vec<Cell>>,
}

static GEOMETRY: OnceLock<Geometry> = OnceLock::new();

impl Geometry {
    /// Shared geometry, built on first use
    pub fn get() -> &'static Geometry {
        GEOMETRY.get_or_init(Geometry::build)
    }

    fn build() -> Self {
        let mut coords = [Hex::new(0, 0); CELL_COUNT];
        let mut lookup = [[None; 9]; 9];

        let mut index = 0;
        for r in -BOARD_RADIUS..=BOARD_RADIUS {
            let q_min = (-BOARD_RADIUS).max(-r - BOARD_RADIUS);
            let q_max = BOARD_RADIUS.min(-r + BOARD_RADIUS);
            for q in q_min..=q_max {
                coords[index] = Hex::new(q, r);
                lookup[(q + BOARD_RADIUS) as usize][(r + BOARD_RADIUS) as usize] = Some(index);
                index += 1;
            }
        }
        debug_assert_eq!(index, CELL_COUNT);

        let find = |hex: Hex| -> Option<Cell> {
            if hex.is_valid() {
                lookup[(hex.q + BOARD_RADIUS) as usize][(hex.r + BOARD_RADIUS) as usize]
            } else {
                None
            }
        };

        let mut steps = [[None; 6]; CELL_COUNT];
        let mut neighbors = Vec::with_capacity(CELL_COUNT);
        for (cell, hex) in coords.iter().enumerate() {
            let mut adjacent = Vec::with_capacity(6);
            for dir in 0..6u8 {
                let next = find(hex.neighbor(dir));
                steps[cell][dir as usize] = next;
                if let Some(n) = next {
                    adjacent.push(n);
                }
            }
            neighbors.push(adjacent);
        }

        Self {
            coords,
            lookup,
            steps,
            neighbors,
        }
    }

    /// Axial coordinate of a cell
    pub fn hex(&self, cell: Cell) -> Result<Hex, EngineError> {
        self.coords
            .get(cell)
            .copied()
            .ok_or(EngineError::InvalidCell(cell))
    }

    /// Cell at an axial coordinate, `None` when off the board
    pub fn index_of(&self, hex: Hex) -> Option<Cell> {
        if !hex.is_valid() {
            return None;
        }
        self.lookup[(hex.q + BOARD_RADIUS) as usize][(hex.r + BOARD_RADIUS) as usize]
    }

    /// Cell at an axial coordinate that must be on the board
    pub fn require_index(&self, hex: Hex) -> Result<Cell, EngineError> {
        self.index_of(hex).ok_or(EngineError::InvalidCoordinate {
            q: hex.q,
            r: hex.r,
        })
    }

    /// On-board neighbours of a cell
    pub fn neighbors(&self, cell: Cell) -> Result<&[Cell], EngineError> {
        self.neighbors
            .get(cell)
            .map(Vec::as_slice)
            .ok_or(EngineError::InvalidCell(cell))
    }

    /// Cell one step away in a direction, `None` when that leaves the board
    pub fn step(&self, cell: Cell, direction: Direction) -> Result<Option<Cell>, EngineError> {
        let row = self.steps.get(cell).ok_or(EngineError::InvalidCell(cell))?;
        row.get(direction as usize)
            .copied()
            .ok_or(EngineError::InvalidDirection(direction))
    }

    pub fn is_valid_cell(&self, cell: Cell) -> bool {
        cell < CELL_COUNT
    }

    // Unchecked variants for cells already known to be on the board.

    pub(crate) fn coord(&self, cell: Cell) -> Hex {
        self.coords[cell]
    }

    pub(crate) fn next(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        self.steps[cell][direction as usize]
    }

    pub(crate) fn adjacent(&self, cell: Cell) -> &[Cell] {
        &self.neighbors[cell]
    }
}

/// Cell -> axial coordinate
pub fn index_to_axial(cell: Cell) -> Result<Hex, EngineError> {
    Geometry::get().hex(cell)
}

/// Axial coordinate -> cell
pub fn axial_to_index(hex: Hex) -> Option<Cell> {
    Geometry::get().index_of(hex)
}
