//! Move evaluation
//!
//! A candidate move is scored on its own, with a one-ply look at what the
//! opponent could do afterwards. The sub-scores are summed and a small random
//! value breaks ties.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::Geometry;
use crate::game::{GameState, Move, MoveAnalysis, Side};

/// Heuristic weights for move evaluation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    /// Per piece of size advantage in a push
    pub push_weight: i32,
    /// Flat bonus for pushing a piece off the board
    pub elimination_bonus: i32,
    /// Per step the pushed line is driven towards the edge
    pub edge_push_weight: i32,
    /// Per step the front piece gains towards the center
    pub center_weight: i32,
    /// Per opponent elimination threat removed
    pub defense_weight: i32,
    /// Per unit change in (own - opponent) legal move count
    pub mobility_weight: i32,
    /// Per change in exposed pieces; negative when exposure grows
    pub exposure_weight: i32,
    /// Tie-break noise is drawn from `0..noise`
    pub noise: u32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            push_weight: 10,
            elimination_bonus: 100,
            edge_push_weight: 30,
            center_weight: 20,
            defense_weight: 10_000,
            mobility_weight: 5,
            exposure_weight: 200,
            noise: 10,
        }
    }
}

impl Heuristics {
    /// Load weights from a JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let heuristics = serde_json::from_str(&content)?;
        Ok(heuristics)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Deterministic part of a move's score
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub push: i32,
    pub centering: i32,
    pub defense: i32,
    pub control: i32,
    pub exposure: i32,
}

impl ScoreBreakdown {
    /// Sum of the sub-scores, saturating at the `i32` bounds
    pub fn total(&self) -> i32 {
        [self.centering, self.defense, self.control, self.exposure]
            .iter()
            .fold(self.push, |acc, &s| acc.saturating_add(s))
    }
}

/// Threat and mobility counts of the position before any candidate is played
///
/// Identical for every candidate of one side, so a selector computes it once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Baseline {
    /// Opponent moves that would push one of our pieces off
    pub threats: usize,
    /// Own legal moves minus opponent legal moves
    pub mobility_diff: i32,
}

impl Baseline {
    pub fn of(state: &GameState, side: Side) -> Self {
        let (threats, opponent_mobility) = threat_and_mobility(state, side.opponent());
        Self {
            threats,
            mobility_diff: state.mobility(side) as i32 - opponent_mobility as i32,
        }
    }
}

/// Count legal pushes by `attacker` that drive a piece off the board
pub fn eliminating_moves(state: &GameState, attacker: Side) -> usize {
    threat_and_mobility(state, attacker).0
}

fn threat_and_mobility(state: &GameState, attacker: Side) -> (usize, usize) {
    let moves = state.legal_moves(attacker);
    let threats = moves
        .iter()
        .filter_map(|&mv| state.analyze(mv))
        .filter(MoveAnalysis::eliminates)
        .count();
    (threats, moves.len())
}

/// Score breakdown of a move for `side`; all zero when the move is illegal
/// or moves the other side's pieces
pub fn score_breakdown(
    state: &GameState,
    mv: Move,
    side: Side,
    heuristics: &Heuristics,
) -> ScoreBreakdown {
    let baseline = Baseline::of(state, side);
    score_breakdown_with(state, mv, side, heuristics, &baseline)
}

/// [`score_breakdown`] against a precomputed baseline
pub fn score_breakdown_with(
    state: &GameState,
    mv: Move,
    side: Side,
    heuristics: &Heuristics,
    baseline: &Baseline,
) -> ScoreBreakdown {
    let analysis = match state.analyze(mv) {
        Some(a) if a.side == side => a,
        _ => return ScoreBreakdown::default(),
    };
    let after = match state.after_move(mv) {
        Some(s) => s,
        None => return ScoreBreakdown::default(),
    };

    let (threats_after, opponent_mobility) = threat_and_mobility(&after, side.opponent());
    let mobility_diff = after.mobility(side) as i32 - opponent_mobility as i32;
    let threats_before = baseline.threats as i32;
    let threats_after = threats_after as i32;

    let defense = if threats_after < threats_before {
        heuristics.defense_weight.saturating_mul(threats_before - threats_after)
    } else {
        0
    };

    ScoreBreakdown {
        push: push_score(&analysis, heuristics),
        centering: centering_score(&analysis, heuristics),
        defense,
        control: heuristics
            .mobility_weight
            .saturating_mul(mobility_diff - baseline.mobility_diff),
        exposure: heuristics.exposure_weight.saturating_mul(threats_before - threats_after),
    }
}

/// Full score of a move for `side`, including tie-break noise
///
/// Illegal moves score 0.
pub fn evaluate_move<R: Rng + ?Sized>(
    state: &GameState,
    mv: Move,
    side: Side,
    heuristics: &Heuristics,
    rng: &mut R,
) -> i32 {
    let baseline = Baseline::of(state, side);
    evaluate_move_with(state, mv, side, heuristics, &baseline, rng)
}

/// [`evaluate_move`] against a precomputed baseline
pub fn evaluate_move_with<R: Rng + ?Sized>(
    state: &GameState,
    mv: Move,
    side: Side,
    heuristics: &Heuristics,
    baseline: &Baseline,
    rng: &mut R,
) -> i32 {
    if !matches!(state.analyze(mv), Some(a) if a.side == side) {
        return 0;
    }
    let score = score_breakdown_with(state, mv, side, heuristics, baseline).total();
    score.saturating_add(noise(heuristics, rng))
}

fn noise<R: Rng + ?Sized>(heuristics: &Heuristics, rng: &mut R) -> i32 {
    if heuristics.noise == 0 {
        0
    } else {
        rng.gen_range(0..heuristics.noise.min(i32::MAX as u32)) as i32
    }
}

fn push_score(analysis: &MoveAnalysis, heuristics: &Heuristics) -> i32 {
    if !analysis.is_push() {
        return 0;
    }

    let advantage = (analysis.group.len() - analysis.opposing.len()) as i32;
    let score = heuristics.push_weight.saturating_mul(advantage);

    match analysis.destination {
        None => score.saturating_add(heuristics.elimination_bonus),
        Some(dest) => {
            // Measured at the far end of the pushed line
            let geo = Geometry::get();
            let tail = analysis.opposing[analysis.opposing.len() - 1];
            let before = geo.coord(tail).edge_distance();
            let after = geo.coord(dest).edge_distance();
            let gained = (before - after).max(0) as i32;
            score.saturating_add(heuristics.edge_push_weight.saturating_mul(gained))
        }
    }
}

fn centering_score(analysis: &MoveAnalysis, heuristics: &Heuristics) -> i32 {
    let geo = Geometry::get();
    let leading = analysis.leading();
    let target = match geo.next(leading, analysis.direction) {
        Some(cell) => cell,
        None => return 0,
    };

    let before = geo.coord(leading).distance_to_center();
    let after = geo.coord(target).distance_to_center();
    if after < before {
        heuristics.center_weight.saturating_mul((before - after) as i32)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn mv(from: usize, to: usize) -> Move {
        Move::new(from, to).unwrap()
    }

    #[test]
    fn test_default_heuristics() {
        let h = Heuristics::default();
        assert_eq!(h.push_weight, 10);
        assert_eq!(h.elimination_bonus, 100);
        assert!(h.defense_weight > h.exposure_weight);
        assert_eq!(h.noise, 10);
    }

    #[test]
    fn test_elimination_bonus() {
        let h = Heuristics::default();

        // Three push one off the east edge
        let off = GameState::from_pieces(&[31, 32, 33], &[34]).unwrap();
        let eliminating = score_breakdown(&off, mv(31, 32), Side::Primary, &h);

        // Same shape pushing towards the center, nobody leaves the board
        let inward = GameState::from_pieces(&[34, 33, 32], &[31]).unwrap();
        let plain = score_breakdown(&inward, mv(34, 33), Side::Primary, &h);

        assert_eq!(eliminating.push, 10 * 2 + 100);
        assert_eq!(plain.push, 10 * 2);
        assert!(eliminating.push - plain.push >= 100);
    }

    #[test]
    fn test_edge_push_bonus() {
        let h = Heuristics::default();
        // (2,0) pushed to (3,0): edge distance 2 -> 1
        let state = GameState::from_pieces(&[30, 31], &[32]).unwrap();
        let breakdown = score_breakdown(&state, mv(30, 31), Side::Primary, &h);
        assert_eq!(breakdown.push, 10 + 30);
    }

    #[test]
    fn test_centering() {
        let h = Heuristics::default();
        let state = GameState::from_pieces(&[34], &[0]).unwrap();
        let inward = score_breakdown(&state, mv(34, 33), Side::Primary, &h);
        assert_eq!(inward.centering, 20);

        let state = GameState::from_pieces(&[33], &[0]).unwrap();
        let outward = score_breakdown(&state, mv(33, 34), Side::Primary, &h);
        assert_eq!(outward.centering, 0);
    }

    #[test]
    fn test_defense_and_exposure() {
        let h = Heuristics::default();
        // Opponent line (2,0)(3,0) can push our (4,0) off the edge
        let state = GameState::from_pieces(&[34, 56, 57], &[32, 33]).unwrap();
        assert_eq!(eliminating_moves(&state, Side::Opponent), 1);

        // Stepping to (4,-1) escapes
        let escape = score_breakdown(&state, mv(34, 25), Side::Primary, &h);
        assert_eq!(escape.defense, 10_000);
        assert_eq!(escape.exposure, 200);

        // Moving an unrelated piece leaves the threat standing
        let idle = score_breakdown(&state, mv(56, 50), Side::Primary, &h);
        assert_eq!(idle.defense, 0);
        assert_eq!(idle.exposure, 0);
    }

    #[test]
    fn test_control_tracks_mobility() {
        let h = Heuristics::default();
        let state = GameState::new();
        let m = mv(60, 54);
        let after = state.after_move(m).unwrap();
        let before_diff =
            state.mobility(Side::Primary) as i32 - state.mobility(Side::Opponent) as i32;
        let after_diff =
            after.mobility(Side::Primary) as i32 - after.mobility(Side::Opponent) as i32;
        let breakdown = score_breakdown(&state, m, Side::Primary, &h);
        assert_eq!(breakdown.control, 5 * (after_diff - before_diff));
    }

    #[test]
    fn test_illegal_or_foreign_scores_zero() {
        let h = Heuristics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let state = GameState::new();
        assert_eq!(evaluate_move(&state, mv(45, 47), Side::Primary, &h, &mut rng), 0);
        // Opponent piece, asked for Primary
        assert_eq!(evaluate_move(&state, mv(13, 21), Side::Primary, &h, &mut rng), 0);
        assert_eq!(
            score_breakdown(&state, mv(13, 21), Side::Primary, &h),
            ScoreBreakdown::default()
        );
    }

    #[test]
    fn test_noise_is_bounded() {
        let h = Heuristics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let state = GameState::new();
        let m = mv(60, 54);
        let base = score_breakdown(&state, m, Side::Primary, &h).total();
        for _ in 0..50 {
            let score = evaluate_move(&state, m, Side::Primary, &h, &mut rng);
            assert!((base..base + 10).contains(&score));
        }

        let quiet = Heuristics { noise: 0, ..Heuristics::default() };
        assert_eq!(evaluate_move(&state, m, Side::Primary, &quiet, &mut rng), base);
    }

    #[test]
    fn test_huge_weights_saturate() {
        let path = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{
            "defense_weight": 2147483647,
            "exposure_weight": 2147483647,
            "noise": 4294967295
        }"#;
        std::fs::write(path.path(), json).unwrap();
        let h = Heuristics::load(path.path()).unwrap();

        let state = GameState::from_pieces(&[34, 56, 57], &[32, 33]).unwrap();
        let escape = mv(34, 25);
        assert_eq!(score_breakdown(&state, escape, Side::Primary, &h).total(), i32::MAX);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(evaluate_move(&state, escape, Side::Primary, &h, &mut rng), i32::MAX);

        let low = Heuristics { push_weight: i32::MIN, elimination_bonus: i32::MIN, ..h };
        let push_off = GameState::from_pieces(&[32, 33], &[34]).unwrap();
        let breakdown = score_breakdown(&push_off, mv(32, 33), Side::Primary, &low);
        assert_eq!(breakdown.push, i32::MIN);
    }

    #[test]
    fn test_load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let h = Heuristics { center_weight: 35, noise: 0, ..Heuristics::default() };
        h.save(&path).unwrap();
        assert_eq!(Heuristics::load(&path).unwrap(), h);

        let partial = dir.path().join("partial.json");
        std::fs::write(&partial, r#"{ "mobility_weight": 8 }"#).unwrap();
        let loaded = Heuristics::load(&partial).unwrap();
        assert_eq!(loaded.mobility_weight, 8);
        assert_eq!(loaded.elimination_bonus, 100);
    }
}
