//! Abalone Core - Board engine and heuristic AI
//!
//! This crate provides the core game logic:
//! - Board geometry (61-cell hex grid with axial coordinates)
//! - Move legality, push resolution and move generation
//! - One-ply move evaluation heuristic
//! - Heuristic AI move selection
//! - Turn and game-over bookkeeping

pub mod board;
pub mod error;
pub mod game;
pub mod eval;
pub mod ai;
pub mod session;

// Re-exports for convenient access
pub use board::{
    axial_to_index, index_to_axial, Cell, Direction, Geometry, Hex, BOARD_RADIUS, CELL_COUNT,
    DIRECTIONS,
};
pub use error::EngineError;
pub use game::{
    index_layout, GameState, Move, MoveAnalysis, MoveOutcome, Scores, Side, PIECES_PER_SIDE,
};
pub use eval::{evaluate_move, score_breakdown, Heuristics, ScoreBreakdown};
pub use ai::{play_versus, select_move, HeuristicAI};
pub use session::{GameSession, LOSS_THRESHOLD};
