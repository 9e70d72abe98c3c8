//! Heuristic move selection

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::eval::{evaluate_move_with, Baseline, Heuristics};
use crate::game::{GameState, Move, Side};
use crate::session::GameSession;

// ============================================================================
// HEURISTIC AI
// ============================================================================

/// Picks the best-scoring legal move, one ply deep
pub struct HeuristicAI {
    pub heuristics: Heuristics,
    rng: ChaCha8Rng,
}

impl HeuristicAI {
    pub fn new(heuristics: Heuristics) -> Self {
        Self {
            heuristics,
            rng: ChaCha8Rng::seed_from_u64(42),
        }
    }

    pub fn with_seed(heuristics: Heuristics, seed: u64) -> Self {
        Self {
            heuristics,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy(heuristics: Heuristics) -> Self {
        Self {
            heuristics,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Get best move for `side`, `None` when it cannot move
    pub fn best_move(&mut self, state: &GameState, side: Side) -> Option<Move> {
        select_move(state, side, &self.heuristics, &mut self.rng)
    }

    /// Play both sides until the game ends or `max_turns` is reached
    pub fn play_game(&mut self, session: GameSession, max_turns: u32) -> (GameSession, Vec<Move>) {
        run_game(session, max_turns, |state, side| self.best_move(state, side))
    }
}

/// Play a game between two AIs, `primary` moving for [`Side::Primary`]
pub fn play_versus(
    primary: &mut HeuristicAI,
    opponent: &mut HeuristicAI,
    session: GameSession,
    max_turns: u32,
) -> (GameSession, Vec<Move>) {
    run_game(session, max_turns, |state, side| match side {
        Side::Primary => primary.best_move(state, side),
        Side::Opponent => opponent.best_move(state, side),
    })
}

fn run_game<F>(mut session: GameSession, max_turns: u32, mut pick: F) -> (GameSession, Vec<Move>)
where
    F: FnMut(&GameState, Side) -> Option<Move>,
{
    let mut history = Vec::new();

    while !session.is_game_over() && session.turn() < max_turns {
        let side = session.to_move();
        match pick(session.state(), side) {
            Some(mv) => match session.play(mv) {
                Ok(_) => history.push(mv),
                Err(e) => {
                    tracing::warn!("{:?} chose a rejected move {}: {}", side, mv, e);
                    break;
                }
            },
            None => {
                tracing::debug!("{:?} has no legal move, passing", side);
                session.pass_turn();
            }
        }
    }

    (session, history)
}

// ============================================================================
// SELECTION
// ============================================================================

/// Score every legal move for `side` and keep the strict maximum
///
/// Ties at equal total keep the first move seen; the per-call noise in the
/// total makes that ordering matter rarely.
pub fn select_move<R: Rng + ?Sized>(
    state: &GameState,
    side: Side,
    heuristics: &Heuristics,
    rng: &mut R,
) -> Option<Move> {
    let moves = state.legal_moves(side);
    if moves.is_empty() {
        return None;
    }

    let baseline = Baseline::of(state, side);
    let mut best_move = None;
    let mut best_score = i32::MIN;

    for mv in moves {
        let score = evaluate_move_with(state, mv, side, heuristics, &baseline, rng);
        tracing::trace!("{:?} {} scores {}", side, mv, score);
        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }
    }

    if let Some(mv) = best_move {
        tracing::debug!("{:?} best move {} score {}", side, mv, best_score);
    }
    best_move
}

// ============================================================================
// TESTS
// ============================================================================
