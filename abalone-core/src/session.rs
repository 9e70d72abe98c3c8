//! Turn, score and game-over bookkeeping for one game

use crate::board::Cell;
use crate::error::EngineError;
use crate::game::{GameState, Move, MoveOutcome, Scores, Side};

/// A side with this many pieces or fewer has lost
pub const LOSS_THRESHOLD: usize = 8;

/// One game in progress: board, whose turn it is, and display names
#[derive(Clone, Debug)]
pub struct GameSession {
    state: GameState,
    names: [String; 2],
    to_move: Side,
    turn: u32,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new("Human", "AI")
    }
}

impl GameSession {
    /// Fresh game; Primary moves first
    pub fn new(primary_name: &str, opponent_name: &str) -> Self {
        Self::with_state(GameState::new(), Side::Primary, primary_name, opponent_name)
    }

    /// Continue from an arbitrary position
    pub fn with_state(
        state: GameState,
        to_move: Side,
        primary_name: &str,
        opponent_name: &str,
    ) -> Self {
        Self {
            state,
            names: [primary_name.to_string(), opponent_name.to_string()],
            to_move,
            turn: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn to_move(&self) -> Side {
        self.to_move
    }

    /// Turns taken so far, passes included
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn name_of(&self, side: Side) -> &str {
        &self.names[side as usize]
    }

    pub fn scores(&self) -> Scores {
        self.state.scores()
    }

    pub fn is_game_over(&self) -> bool {
        let scores = self.scores();
        scores.primary <= LOSS_THRESHOLD || scores.opponent <= LOSS_THRESHOLD
    }

    /// The side whose opponent dropped to the threshold
    pub fn winner(&self) -> Option<Side> {
        let scores = self.scores();
        if scores.opponent <= LOSS_THRESHOLD {
            Some(Side::Primary)
        } else if scores.primary <= LOSS_THRESHOLD {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    /// Legal moves for the side to move
    pub fn legal_moves(&self) -> Vec<Move> {
        self.state.legal_moves(self.to_move)
    }

    /// Play a move for the side to move and hand the turn over
    pub fn play(&mut self, mv: Move) -> Result<MoveOutcome, EngineError> {
        if self.is_game_over() {
            return Err(EngineError::GameOver);
        }
        self.check_owner(mv.from())?;

        let outcome = self.state.apply_move(mv)?;
        if let MoveOutcome::Push { eliminated: Some(cell), .. } = outcome {
            let scores = self.scores();
            tracing::debug!(
                "{} pushed a piece off from cell {} (score {} - {})",
                self.name_of(self.to_move),
                cell,
                scores.primary,
                scores.opponent
            );
        }

        self.end_turn();
        Ok(outcome)
    }

    /// Skip the turn of a side that has no legal move
    pub fn pass_turn(&mut self) {
        self.end_turn();
    }

    fn check_owner(&self, cell: Cell) -> Result<(), EngineError> {
        match self.state.player_at(cell)? {
            Some(side) if side == self.to_move => Ok(()),
            _ => Err(EngineError::NotYourPiece {
                cell,
                side: self.to_move,
            }),
        }
    }

    fn end_turn(&mut self) {
        self.to_move = self.to_move.opponent();
        self.turn += 1;
    }
}
