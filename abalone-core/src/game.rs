//! Game state, move legality and push resolution

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{direction_of, Cell, Direction, Geometry, BOARD_RADIUS, CELL_COUNT, DIRECTIONS};
use crate::error::EngineError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Pieces each side starts with
pub const PIECES_PER_SIDE: usize = 14;

/// Primary starts on the bottom rows
const PRIMARY_START: [Cell; PIECES_PER_SIDE] =
    [45, 46, 47, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60];

/// Opponent starts on the top rows (mirror of Primary)
const OPPONENT_START: [Cell; PIECES_PER_SIDE] =
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 13, 14, 15];

// ============================================================================
// CORE TYPES
// ============================================================================

/// One of the two competing sides
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Primary = 0,
    Opponent = 1,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Primary, Side::Opponent];

    pub fn opponent(self) -> Self {
        match self {
            Side::Primary => Side::Opponent,
            Side::Opponent => Side::Primary,
        }
    }

    /// Marker used in text renderings
    pub fn symbol(self) -> char {
        match self {
            Side::Primary => 'O',
            Side::Opponent => 'X',
        }
    }
}

/// A request to push the line starting at `from` one step towards `to`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    from: Cell,
    to: Cell,
}

impl Move {
    /// Build a move between two on-board cells
    ///
    /// The cells need not be adjacent; a non-adjacent move is simply never
    /// legal.
    pub fn new(from: Cell, to: Cell) -> Result<Self, EngineError> {
        let geo = Geometry::get();
        for cell in [from, to] {
            if !geo.is_valid_cell(cell) {
                return Err(EngineError::InvalidCell(cell));
            }
        }
        Ok(Self { from, to })
    }

    pub(crate) const fn between(from: Cell, to: Cell) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> Cell {
        self.from
    }

    pub fn to(&self) -> Cell {
        self.to
    }

    /// Unit direction from `from` to `to`, if there is one
    pub fn direction(&self) -> Option<Direction> {
        let geo = Geometry::get();
        let a = geo.coord(self.from);
        let b = geo.coord(self.to);
        direction_of(b.q - a.q, b.r - a.r)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// How a legal move resolves on the current board
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveAnalysis {
    pub side: Side,
    pub direction: Direction,
    /// Mover's line, starting at the move's `from`
    pub group: Vec<Cell>,
    /// Opposing line directly in front of the mover; empty for a simple move
    pub opposing: Vec<Cell>,
    /// Cell the front piece moves into, `None` when it leaves the board
    pub destination: Option<Cell>,
}

impl MoveAnalysis {
    pub fn is_push(&self) -> bool {
        !self.opposing.is_empty()
    }

    /// True when the push drives an opposing piece off the board
    pub fn eliminates(&self) -> bool {
        self.is_push() && self.destination.is_none()
    }

    /// Front cell of the mover's line
    pub fn leading(&self) -> Cell {
        self.group[self.group.len() - 1]
    }
}

/// What applying a move did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Simple {
        moved: usize,
    },
    Push {
        moved: usize,
        pushed: usize,
        /// Cell the pushed-off piece stood on
        eliminated: Option<Cell>,
    },
}

/// Pieces on board per side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub primary: usize,
    pub opponent: usize,
}

impl Scores {
    pub fn of(&self, side: Side) -> usize {
        match side {
            Side::Primary => self.primary,
            Side::Opponent => self.opponent,
        }
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Board occupancy (clone to simulate)
///
/// Geometry is shared, so a clone copies only the occupancy map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    /// Board: cell -> owner (sparse representation)
    board: FxHashMap<Cell, Side>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Standard 14-a-side starting position
    pub fn new() -> Self {
        let mut board = FxHashMap::default();
        for &cell in &PRIMARY_START {
            board.insert(cell, Side::Primary);
        }
        for &cell in &OPPONENT_START {
            board.insert(cell, Side::Opponent);
        }
        Self { board }
    }

    /// Arbitrary position; a cell listed for both sides goes to Opponent
    pub fn from_pieces(primary: &[Cell], opponent: &[Cell]) -> Result<Self, EngineError> {
        let geo = Geometry::get();
        let mut board = FxHashMap::default();
        for (cells, side) in [(primary, Side::Primary), (opponent, Side::Opponent)] {
            for &cell in cells {
                if !geo.is_valid_cell(cell) {
                    return Err(EngineError::InvalidCell(cell));
                }
                board.insert(cell, side);
            }
        }
        Ok(Self { board })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Owner of a cell
    pub fn player_at(&self, cell: Cell) -> Result<Option<Side>, EngineError> {
        if !Geometry::get().is_valid_cell(cell) {
            return Err(EngineError::InvalidCell(cell));
        }
        Ok(self.board.get(&cell).copied())
    }

    /// Check whether an index names a board cell
    pub fn is_valid_position(&self, cell: Cell) -> bool {
        Geometry::get().is_valid_cell(cell)
    }

    /// Iterate pieces on board in cell order
    pub fn pieces(&self) -> impl Iterator<Item = (Cell, Side)> + '_ {
        (0..CELL_COUNT).filter_map(move |cell| self.board.get(&cell).map(|&side| (cell, side)))
    }

    /// Pieces a side has on the board (its score)
    pub fn piece_count(&self, side: Side) -> usize {
        self.board.values().filter(|&&s| s == side).count()
    }

    /// Recount both scores from the occupancy map
    pub fn scores(&self) -> Scores {
        Scores {
            primary: self.piece_count(Side::Primary),
            opponent: self.piece_count(Side::Opponent),
        }
    }

    /// Empty cells next to a cell
    pub fn empty_neighbors(&self, cell: Cell) -> Result<Vec<Cell>, EngineError> {
        let neighbors = Geometry::get().neighbors(cell)?;
        Ok(neighbors
            .iter()
            .copied()
            .filter(|n| !self.board.contains_key(n))
            .collect())
    }

    /// Line of same-owner pieces from `start` along `direction`
    ///
    /// Empty when `start` itself is empty.
    pub fn piece_group(&self, start: Cell, direction: Direction) -> Result<Vec<Cell>, EngineError> {
        if direction as usize >= DIRECTIONS.len() {
            return Err(EngineError::InvalidDirection(direction));
        }
        let owner = match self.player_at(start)? {
            Some(side) => side,
            None => return Ok(Vec::new()),
        };
        Ok(self.line_of(start, direction, owner))
    }

    fn line_of(&self, start: Cell, direction: Direction, owner: Side) -> Vec<Cell> {
        let geo = Geometry::get();
        let mut group = vec![start];
        let mut current = start;
        while let Some(next) = geo.next(current, direction) {
            if self.board.get(&next) != Some(&owner) {
                break;
            }
            group.push(next);
            current = next;
        }
        group
    }

    // ========================================================================
    // LEGALITY
    // ========================================================================

    /// Resolve a move against the board, `None` when it is illegal
    pub fn analyze(&self, mv: Move) -> Option<MoveAnalysis> {
        let geo = Geometry::get();
        let direction = mv.direction()?;
        let side = *self.board.get(&mv.from)?;

        let group = self.line_of(mv.from, direction, side);
        let leading = group[group.len() - 1];
        let next = geo.next(leading, direction)?;

        if !self.board.contains_key(&next) {
            return Some(MoveAnalysis {
                side,
                direction,
                group,
                opposing: Vec::new(),
                destination: Some(next),
            });
        }

        // The mover's line ended, so `next` is held by the other side
        let opposing = self.line_of(next, direction, side.opponent());
        if group.len() <= opposing.len() {
            return None;
        }

        let tail = opposing[opposing.len() - 1];
        let destination = geo.next(tail, direction);
        if let Some(cell) = destination {
            if self.board.contains_key(&cell) {
                return None;
            }
        }

        Some(MoveAnalysis {
            side,
            direction,
            group,
            opposing,
            destination,
        })
    }

    /// Check a move against the push rules
    pub fn is_legal_move(&self, mv: Move) -> bool {
        self.analyze(mv).is_some()
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Every legal move for a side
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        let geo = Geometry::get();
        let mut moves = Vec::new();

        for (from, owner) in self.pieces() {
            if owner != side {
                continue;
            }
            for &to in geo.adjacent(from) {
                let mv = Move::between(from, to);
                if self.is_legal_move(mv) {
                    moves.push(mv);
                }
            }
        }

        moves
    }

    /// Count legal moves for a side (mobility heuristic)
    pub fn mobility(&self, side: Side) -> usize {
        self.legal_moves(side).len()
    }

    // ========================================================================
    // APPLY MOVE
    // ========================================================================

    /// Apply a legal move in place
    ///
    /// An illegal move is rejected and leaves the board untouched.
    pub fn apply_move(&mut self, mv: Move) -> Result<MoveOutcome, EngineError> {
        let analysis = self.analyze(mv).ok_or(EngineError::IllegalMove {
            from: mv.from,
            to: mv.to,
        })?;

        // Opposing line moves first, farthest piece first
        let mut eliminated = None;
        for &cell in analysis.opposing.iter().rev() {
            if self.shift(cell, analysis.direction).is_none() {
                eliminated = Some(cell);
            }
        }
        for &cell in analysis.group.iter().rev() {
            self.shift(cell, analysis.direction);
        }

        let moved = analysis.group.len();
        Ok(if analysis.is_push() {
            MoveOutcome::Push {
                moved,
                pushed: analysis.opposing.len(),
                eliminated,
            }
        } else {
            MoveOutcome::Simple { moved }
        })
    }

    /// Copy with a move applied, `None` when it is illegal
    pub fn after_move(&self, mv: Move) -> Option<GameState> {
        let mut next = self.clone();
        next.apply_move(mv).ok()?;
        Some(next)
    }

    /// Move one piece a step; returns the destination, `None` if it fell off
    fn shift(&mut self, cell: Cell, direction: Direction) -> Option<Cell> {
        let owner = self.board.remove(&cell)?;
        let dest = Geometry::get().next(cell, direction)?;
        self.board.insert(dest, owner);
        Some(dest)
    }
}

impl fmt::Display for GameState {
    /// Hex-shaped text board, top row first
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geo = Geometry::get();
        let mut cell = 0;
        for r in -BOARD_RADIUS..=BOARD_RADIUS {
            let width = (2 * BOARD_RADIUS + 1 - r.abs()) as usize;
            write!(f, "{}", " ".repeat(r.unsigned_abs() as usize))?;
            for i in 0..width {
                debug_assert_eq!(geo.coord(cell).r, r);
                let mark = self.board.get(&cell).map_or('.', |s| s.symbol());
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", mark)?;
                cell += 1;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Hex-shaped layout of cell indices, for choosing moves by number
pub fn index_layout() -> String {
    let mut out = String::new();
    let mut cell = 0;
    for r in -BOARD_RADIUS..=BOARD_RADIUS {
        let width = (2 * BOARD_RADIUS + 1 - r.abs()) as usize;
        out.push_str(&"  ".repeat(r.unsigned_abs() as usize));
        let row: Vec<String> = (cell..cell + width).map(|c| format!("{:>2}", c)).collect();
        out.push_str(&row.join("  "));
        out.push('\n');
        cell += width;
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn mv(from: Cell, to: Cell) -> Move {
        Move::new(from, to).unwrap()
    }

    #[test]
    fn test_game_creation() {
        let game = GameState::new();
        let scores = game.scores();
        assert_eq!(scores.primary, 14);
        assert_eq!(scores.opponent, 14);
        assert_eq!(game.player_at(45).unwrap(), Some(Side::Primary));
        assert_eq!(game.player_at(13).unwrap(), Some(Side::Opponent));
        assert_eq!(game.player_at(30).unwrap(), None);
    }

    #[test]
    fn test_start_is_mirrored() {
        let geo = Geometry::get();
        let game = GameState::new();
        for (cell, side) in game.pieces() {
            let hex = geo.coord(cell);
            let mirror = geo.index_of(crate::board::Hex::new(-hex.q, -hex.r)).unwrap();
            assert_eq!(game.player_at(mirror).unwrap(), Some(side.opponent()));
        }
    }

    #[test]
    fn test_invalid_cells() {
        let game = GameState::new();
        assert_eq!(game.player_at(61), Err(EngineError::InvalidCell(61)));
        assert!(!game.is_valid_position(61));
        assert!(game.is_valid_position(0));
        assert_eq!(Move::new(3, 99), Err(EngineError::InvalidCell(99)));
    }

    #[test]
    fn test_non_unit_moves_illegal() {
        // Start position plus positions reached by seeded random play
        let mut positions = vec![GameState::new()];
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut game = GameState::new();
        let mut side = Side::Primary;
        for ply in 1..=60 {
            if let Some(&m) = game.legal_moves(side).choose(&mut rng) {
                game.apply_move(m).unwrap();
            }
            side = side.opponent();
            if ply % 15 == 0 {
                positions.push(game.clone());
            }
        }

        let geo = Geometry::get();
        for state in &positions {
            for from in 0..CELL_COUNT {
                for to in 0..CELL_COUNT {
                    let m = mv(from, to);
                    if m.direction().is_none() {
                        assert!(!state.is_legal_move(m), "{} accepted", m);
                    } else {
                        assert!(geo.adjacent(from).contains(&to));
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_origin_illegal() {
        let game = GameState::new();
        assert!(!game.is_legal_move(mv(30, 31)));
    }

    #[test]
    fn test_simple_group_move() {
        // Column (0,4) (0,3) (0,2) stepping towards the center
        let mut game = GameState::new();
        let outcome = game.apply_move(mv(60, 54)).unwrap();
        assert_eq!(outcome, MoveOutcome::Simple { moved: 3 });
        assert_eq!(game.player_at(60).unwrap(), None);
        for cell in [54, 47, 39] {
            assert_eq!(game.player_at(cell).unwrap(), Some(Side::Primary));
        }
        assert_eq!(game.piece_count(Side::Primary), 14);
    }

    #[test]
    fn test_three_push_two() {
        // Row r=0 runs 26..=34; push east
        let mut game = GameState::from_pieces(&[27, 28, 29], &[30, 31]).unwrap();
        let m = mv(27, 28);
        assert!(game.is_legal_move(m));
        let outcome = game.apply_move(m).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Push { moved: 3, pushed: 2, eliminated: None }
        );
        assert_eq!(game.player_at(27).unwrap(), None);
        for cell in [28, 29, 30] {
            assert_eq!(game.player_at(cell).unwrap(), Some(Side::Primary));
        }
        for cell in [31, 32] {
            assert_eq!(game.player_at(cell).unwrap(), Some(Side::Opponent));
        }
    }

    #[test]
    fn test_push_off_board() {
        let mut game = GameState::from_pieces(&[31, 32, 33], &[34, 0]).unwrap();
        let before = game.piece_count(Side::Opponent);
        let outcome = game.apply_move(mv(31, 32)).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Push { moved: 3, pushed: 1, eliminated: Some(34) }
        );
        assert_eq!(game.piece_count(Side::Opponent), before - 1);
        assert_eq!(game.piece_count(Side::Primary), 3);
        assert_eq!(game.player_at(34).unwrap(), Some(Side::Primary));
        assert_eq!(game.player_at(31).unwrap(), None);
        assert_eq!(game.pieces().filter(|&(_, s)| s == Side::Opponent).count(), 1);
    }

    #[test]
    fn test_equal_groups_cannot_push() {
        let game = GameState::from_pieces(&[28, 29], &[30, 31]).unwrap();
        assert!(!game.is_legal_move(mv(28, 29)));
    }

    #[test]
    fn test_push_blocked_behind() {
        // O O O X O: the cell behind the opposing piece is taken
        let game = GameState::from_pieces(&[27, 28, 29, 31], &[30]).unwrap();
        assert!(!game.is_legal_move(mv(27, 28)));
        // A larger line still needs the cell beyond the defenders free
        let game = GameState::from_pieces(&[26, 27, 28, 29, 33], &[30, 31, 32]).unwrap();
        assert!(!game.is_legal_move(mv(26, 27)));
    }

    #[test]
    fn test_line_at_edge_cannot_step_off() {
        let game = GameState::from_pieces(&[33, 34], &[]).unwrap();
        assert!(!game.is_legal_move(mv(33, 34)));
        assert!(game.is_legal_move(mv(34, 33)));
    }

    #[test]
    fn test_push_size_not_capped() {
        // Four movers beat three defenders; no three-piece limit applies
        let game = GameState::from_pieces(&[26, 27, 28, 29], &[30, 31, 32]).unwrap();
        assert!(game.is_legal_move(mv(26, 27)));
    }

    #[test]
    fn test_illegal_apply_leaves_board() {
        let mut game = GameState::from_pieces(&[28, 29], &[30, 31]).unwrap();
        let snapshot = game.clone();
        let err = game.apply_move(mv(28, 29)).unwrap_err();
        assert_eq!(err, EngineError::IllegalMove { from: 28, to: 29 });
        assert_eq!(game, snapshot);
    }

    #[test]
    fn test_piece_group() {
        let game = GameState::new();
        // (0,4) north through (0,3) and (0,2)
        let dir = direction_of(0, -1).unwrap();
        assert_eq!(game.piece_group(60, dir).unwrap(), vec![60, 54, 47]);
        assert!(game.piece_group(30, dir).unwrap().is_empty());
        assert!(game.piece_group(70, dir).is_err());
        assert_eq!(game.piece_group(60, 9), Err(EngineError::InvalidDirection(9)));
        assert_eq!(game.piece_group(60, 6), Err(EngineError::InvalidDirection(6)));
    }

    #[test]
    fn test_legal_moves_sound_and_complete() {
        let geo = Geometry::get();
        let game = GameState::new();
        for side in Side::ALL {
            let moves = game.legal_moves(side);
            assert!(!moves.is_empty());
            let mut seen = std::collections::HashSet::new();
            for m in &moves {
                assert!(game.is_legal_move(*m));
                assert_eq!(game.player_at(m.from()).unwrap(), Some(side));
                assert!(seen.insert(*m), "duplicate {}", m);
            }
            for (from, owner) in game.pieces() {
                if owner != side {
                    continue;
                }
                for &to in geo.neighbors(from).unwrap() {
                    let m = mv(from, to);
                    assert_eq!(game.is_legal_move(m), moves.contains(&m));
                }
            }
        }
    }

    #[test]
    fn test_random_play_never_gains_pieces() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut game = GameState::new();
        let mut side = Side::Primary;
        let mut last = game.scores();

        for _ in 0..300 {
            let moves = game.legal_moves(side);
            if let Some(&m) = moves.choose(&mut rng) {
                let before_total = last.primary + last.opponent;
                game.apply_move(m).unwrap();
                let now = game.scores();
                assert!(now.primary + now.opponent <= before_total);
                assert!(now.primary <= last.primary);
                assert!(now.opponent <= last.opponent);
                // only the side not moving can lose a piece
                assert_eq!(now.of(side), last.of(side));
                last = now;
            }
            side = side.opponent();
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let game = GameState::new();
        let mut copy = game.clone();
        copy.apply_move(mv(60, 54)).unwrap();
        assert_eq!(game.player_at(60).unwrap(), Some(Side::Primary));
        assert_ne!(game, copy);
        assert_eq!(game.after_move(mv(60, 54)), Some(copy));
    }

    #[test]
    fn test_empty_neighbors() {
        let game = GameState::new();
        let mut empty = game.empty_neighbors(47).unwrap();
        empty.sort();
        assert_eq!(empty, vec![39, 40, 48]);
    }

    #[test]
    fn test_render() {
        let text = GameState::new().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0].trim(), "X X X X X");
        assert_eq!(lines[8].trim(), "O O O O O");
        assert_eq!(lines[4].trim(), ". . . . . . . . .");
        assert!(index_layout().contains("60"));
    }
}
