//! Play command - a human at the terminal against the heuristic AI
//!
//! Input is one command per line:
//! - `FROM TO`   move the piece on cell FROM one step towards cell TO
//! - `hint [N]`  list the N best moves for the human side (default 3)
//! - `moves`     list every legal move
//! - `board`     redraw the board
//! - `cells`     show the cell numbering
//! - `quit`      leave the game

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use abalone_core::{index_layout, score_breakdown, GameSession, HeuristicAI, Heuristics, Move, Side};

const DEFAULT_HINTS: usize = 3;

#[derive(Args)]
pub struct PlayArgs {
    /// Heuristic weights JSON for the AI (defaults when omitted)
    #[arg(long, value_name = "FILE")]
    pub heuristics: Option<PathBuf>,

    /// Let the AI move first (the human then plays the second side)
    #[arg(long)]
    pub ai_first: bool,
}

/// One parsed line of user input
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Move(Move),
    Hint(usize),
    Moves,
    Board,
    Cells,
    Quit,
}

// ============================================================================
// ENTRY POINT
// ============================================================================

pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let heuristics = match &args.heuristics {
        Some(path) => Heuristics::load(path)
            .with_context(|| format!("Failed to load heuristics from {}", path.display()))?,
        None => Heuristics::default(),
    };
    let mut ai = match seed {
        Some(s) => HeuristicAI::with_seed(heuristics, s),
        None => HeuristicAI::from_entropy(heuristics),
    };

    let (human, mut session) = if args.ai_first {
        (Side::Opponent, GameSession::new("AI", "Human"))
    } else {
        (Side::Primary, GameSession::new("Human", "AI"))
    };

    tracing::info!("Starting game, human plays {:?}", human);

    let stdin = io::stdin();
    let stdout = io::stdout();
    play_loop(&mut session, &mut ai, human, stdin.lock(), stdout.lock())
}

// ============================================================================
// GAME LOOP
// ============================================================================

/// Drive a session until it ends, the input runs out or the human quits
fn play_loop<R: BufRead, W: Write>(
    session: &mut GameSession,
    ai: &mut HeuristicAI,
    human: Side,
    mut input: R,
    mut out: W,
) -> Result<()> {
    let mut consecutive_passes = 0;
    let mut show_board = true;

    while !session.is_game_over() {
        let side = session.to_move();

        if session.legal_moves().is_empty() {
            writeln!(out, "{} has no legal move and passes", session.name_of(side))?;
            session.pass_turn();
            consecutive_passes += 1;
            if consecutive_passes >= 2 {
                writeln!(out, "Neither side can move.")?;
                break;
            }
            continue;
        }
        consecutive_passes = 0;

        if side != human {
            let Some(mv) = ai.best_move(session.state(), side) else {
                bail!("AI found no move in a position with legal moves");
            };
            session.play(mv)?;
            writeln!(out, "{} plays {}", session.name_of(side), mv)?;
            show_board = true;
            continue;
        }

        if show_board {
            print_position(session, &mut out)?;
            show_board = false;
        }
        write!(out, "{}> ", session.name_of(side))?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok(Command::Move(mv)) => match session.play(mv) {
                Ok(_) => show_board = true,
                Err(e) => writeln!(out, "Rejected: {}", e)?,
            },
            Ok(Command::Hint(n)) => print_hints(session, ai, n, &mut out)?,
            Ok(Command::Moves) => {
                let moves: Vec<String> =
                    session.legal_moves().iter().map(Move::to_string).collect();
                writeln!(out, "{} legal moves: {}", moves.len(), moves.join(" "))?;
            }
            Ok(Command::Board) => print_position(session, &mut out)?,
            Ok(Command::Cells) => write!(out, "{}", index_layout())?,
            Ok(Command::Quit) => {
                writeln!(out, "Goodbye.")?;
                return Ok(());
            }
            Err(e) => writeln!(out, "{}", e)?,
        }
    }

    print_position(session, &mut out)?;
    match session.winner() {
        Some(side) => writeln!(
            out,
            "Game over: {} wins after {} turns.",
            session.name_of(side),
            session.turn()
        )?,
        None => writeln!(out, "Game over: no winner after {} turns.", session.turn())?,
    }
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn parse_command(line: &str) -> Result<Command> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["quit"] | ["q"] | ["exit"] => Ok(Command::Quit),
        ["moves"] => Ok(Command::Moves),
        ["board"] => Ok(Command::Board),
        ["cells"] => Ok(Command::Cells),
        ["hint"] => Ok(Command::Hint(DEFAULT_HINTS)),
        ["hint", n] => {
            let n: usize = n.parse().with_context(|| format!("not a count: {}", n))?;
            Ok(Command::Hint(n.max(1)))
        }
        [from, to] => {
            let from: usize = from.parse().with_context(|| format!("not a cell number: {}", from))?;
            let to: usize = to.parse().with_context(|| format!("not a cell number: {}", to))?;
            Ok(Command::Move(Move::new(from, to)?))
        }
        _ => bail!("expected FROM TO, hint [N], moves, board, cells or quit"),
    }
}

fn print_position<W: Write>(session: &GameSession, out: &mut W) -> Result<()> {
    let scores = session.scores();
    writeln!(out)?;
    write!(out, "{}", session.state())?;
    writeln!(
        out,
        "{} ({}): {}   {} ({}): {}   turn {}",
        session.name_of(Side::Primary),
        Side::Primary.symbol(),
        scores.primary,
        session.name_of(Side::Opponent),
        Side::Opponent.symbol(),
        scores.opponent,
        session.turn()
    )?;
    Ok(())
}

/// Rank the side-to-move's moves by the AI's deterministic score
fn print_hints<W: Write>(
    session: &GameSession,
    ai: &HeuristicAI,
    n: usize,
    out: &mut W,
) -> Result<()> {
    let side = session.to_move();
    let mut ranked: Vec<_> = session
        .legal_moves()
        .into_iter()
        .map(|mv| (mv, score_breakdown(session.state(), mv, side, &ai.heuristics)))
        .collect();
    ranked.sort_by(|a, b| b.1.total().cmp(&a.1.total()));

    for (mv, breakdown) in ranked.iter().take(n) {
        writeln!(
            out,
            "  {:>7}  {:>6}  (push {}, center {}, defense {}, control {}, exposure {})",
            mv.to_string(),
            breakdown.total(),
            breakdown.push,
            breakdown.centering,
            breakdown.defense,
            breakdown.control,
            breakdown.exposure
        )?;
    }
    Ok(())
}
