//! Engine error types

use crate::board::{Cell, Direction};
use crate::game::Side;

/// Errors raised by board lookups and move application
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("cell index {0} is outside the board (0-60)")]
    InvalidCell(Cell),

    #[error("axial coordinate ({q}, {r}) is outside the board")]
    InvalidCoordinate { q: i8, r: i8 },

    #[error("direction {0} is not one of the six unit directions (0-5)")]
    InvalidDirection(Direction),

    #[error("illegal move {from} -> {to}")]
    IllegalMove { from: Cell, to: Cell },

    #[error("cell {cell} does not hold a {side:?} piece")]
    NotYourPiece { cell: Cell, side: Side },

    #[error("the game is already over")]
    GameOver,
}
