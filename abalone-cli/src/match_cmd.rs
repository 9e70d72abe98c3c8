//! Match command - headless AI vs AI games between two sets of weights
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_weights(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use abalone_core::{play_versus, GameSession, HeuristicAI, Heuristics, Move, Side};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Heuristic weights JSON for the first AI (defaults when omitted)
    #[arg(long, value_name = "FILE")]
    pub weights_a: Option<PathBuf>,

    /// Heuristic weights JSON for the second AI (defaults when omitted)
    #[arg(long, value_name = "FILE")]
    pub weights_b: Option<PathBuf>,

    /// Number of games to play (will alternate sides)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Maximum turns per game before it is called a draw
    #[arg(long, default_value = "400")]
    pub max_turns: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// A named set of weights
#[derive(Clone, Debug)]
struct Contender {
    label: String,
    heuristics: Heuristics,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    winner: Option<Side>,
    /// Label of the weights that won, if any
    winner_label: Option<String>,
    turns: u32,
    primary_label: String,
    opponent_label: String,
    final_scores: (usize, usize),
    #[allow(dead_code)] // Kept for replaying a game in a debugger
    moves: Vec<Move>,
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    a_label: String,
    b_label: String,
    a_wins: usize,
    b_wins: usize,
    primary_wins: usize,
    opponent_wins: usize,
    draws: usize,
    avg_turns: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// This function reads like a table of contents:
/// 1. Load both sets of weights
/// 2. Play the match (multiple games)
/// 3. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let (a, b) = load_weights(&args)?;

    tracing::info!(
        "Starting match: {} vs {} ({} games, max {} turns)",
        a.label,
        b.label,
        args.games,
        args.max_turns
    );

    let results = play_match(&a, &b, &args, seed);

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load both weight files, falling back to defaults
fn load_weights(args: &MatchArgs) -> Result<(Contender, Contender)> {
    let a = load_contender(args.weights_a.as_deref(), "a")
        .context("Failed to load weights A")?;
    let b = load_contender(args.weights_b.as_deref(), "b")
        .context("Failed to load weights B")?;
    Ok((a, b))
}

/// Play all games in the match
fn play_match(a: &Contender, b: &Contender, args: &MatchArgs, seed: Option<u64>) -> MatchResults {
    let mut games = Vec::with_capacity(args.games);

    for game_num in 0..args.games {
        // Alternate sides for fairness
        let (primary, opponent) = if game_num % 2 == 1 { (b, a) } else { (a, b) };
        let game_seed = seed.map(|s| s.wrapping_add(game_num as u64 * 2));

        let record = play_single_game(primary, opponent, game_num + 1, args.max_turns, game_seed);

        tracing::info!(
            "Game {}: winner {} ({} turns, {}-{})",
            record.game_number,
            record.winner_label.as_deref().unwrap_or("none"),
            record.turns,
            record.final_scores.0,
            record.final_scores.1
        );

        games.push(record);
    }

    compute_match_statistics(games, &a.label, &b.label)
}

/// Report match results
fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game, `primary` moving first
fn play_single_game(
    primary: &Contender,
    opponent: &Contender,
    game_number: usize,
    max_turns: u32,
    seed: Option<u64>,
) -> GameRecord {
    let mut primary_ai = create_ai(primary, seed);
    let mut opponent_ai = create_ai(opponent, seed.map(|s| s.wrapping_add(1)));

    let session = GameSession::new(&primary.label, &opponent.label);
    let (session, moves) = play_versus(&mut primary_ai, &mut opponent_ai, session, max_turns);

    let winner = session.winner();
    let scores = session.scores();

    GameRecord {
        game_number,
        winner,
        winner_label: winner.map(|side| session.name_of(side).to_string()),
        turns: session.turn(),
        primary_label: primary.label.clone(),
        opponent_label: opponent.label.clone(),
        final_scores: (scores.primary, scores.opponent),
        moves,
    }
}

/// Compute aggregate statistics from game records
fn compute_match_statistics(games: Vec<GameRecord>, a_label: &str, b_label: &str) -> MatchResults {
    let won_by = |label: &str| {
        games
            .iter()
            .filter(|g| g.winner_label.as_deref() == Some(label))
            .count()
    };
    let a_wins = won_by(a_label);
    let b_wins = won_by(b_label);
    let primary_wins = games
        .iter()
        .filter(|g| g.winner == Some(Side::Primary))
        .count();
    let opponent_wins = games
        .iter()
        .filter(|g| g.winner == Some(Side::Opponent))
        .count();
    let draws = games.iter().filter(|g| g.winner.is_none()).count();

    let total_turns: u32 = games.iter().map(|g| g.turns).sum();
    let avg_turns = if games.is_empty() {
        0.0
    } else {
        total_turns as f32 / games.len() as f32
    };

    MatchResults {
        games,
        a_label: a_label.to_string(),
        b_label: b_label.to_string(),
        a_wins,
        b_wins,
        primary_wins,
        opponent_wins,
        draws,
        avg_turns,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Load weights from a file, labelled by file stem
fn load_contender(path: Option<&Path>, fallback: &str) -> Result<Contender> {
    match path {
        Some(p) => {
            let heuristics = Heuristics::load(p)
                .with_context(|| format!("reading {}", p.display()))?;
            let stem = p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| fallback.to_string());
            Ok(Contender {
                label: format!("{}:{}", fallback, stem),
                heuristics,
            })
        }
        None => Ok(Contender {
            label: format!("{}:default", fallback),
            heuristics: Heuristics::default(),
        }),
    }
}

/// Create an AI from a seed or from entropy
fn create_ai(contender: &Contender, seed: Option<u64>) -> HeuristicAI {
    match seed {
        Some(s) => HeuristicAI::with_seed(contender.heuristics.clone(), s),
        None => HeuristicAI::from_entropy(contender.heuristics.clone()),
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        winner: Option<String>,
        turns: u32,
        primary: String,
        opponent: String,
        primary_score: usize,
        opponent_score: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        a: String,
        b: String,
        a_wins: usize,
        b_wins: usize,
        primary_wins: usize,
        opponent_wins: usize,
        draws: usize,
        avg_turns: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        a: results.a_label.clone(),
        b: results.b_label.clone(),
        a_wins: results.a_wins,
        b_wins: results.b_wins,
        primary_wins: results.primary_wins,
        opponent_wins: results.opponent_wins,
        draws: results.draws,
        avg_turns: results.avg_turns,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                winner: g.winner_label.clone(),
                turns: g.turns,
                primary: g.primary_label.clone(),
                opponent: g.opponent_label.clone(),
                primary_score: g.final_scores.0,
                opponent_score: g.final_scores.1,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(results: &MatchResults) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("Total games:    {}", total);
    println!(
        "{} wins: {} ({:.1}%)",
        results.a_label,
        results.a_wins,
        percent(results.a_wins, total)
    );
    println!(
        "{} wins: {} ({:.1}%)",
        results.b_label,
        results.b_wins,
        percent(results.b_wins, total)
    );
    println!(
        "Draws:          {} ({:.1}%)",
        results.draws,
        percent(results.draws, total)
    );
    println!(
        "First mover:    {} wins, second mover {} wins",
        results.primary_wins, results.opponent_wins
    );
    println!("Avg turns:      {:.1}", results.avg_turns);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {} vs {} -> {} in {} turns ({}-{})",
            game.game_number,
            game.primary_label,
            game.opponent_label,
            game.winner_label.as_deref().unwrap_or("draw"),
            game.turns,
            game.final_scores.0,
            game.final_scores.1
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
