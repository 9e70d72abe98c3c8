//! Abalone CLI - Command-line interface
//!
//! Commands:
//! - show: Print the starting position and the cell numbering
//! - play: Play against the heuristic AI at the terminal
//! - match: Run headless AI vs AI games

mod match_cmd;
mod play_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use abalone_core::{index_layout, GameState};

#[derive(Parser)]
#[command(name = "abalone")]
#[command(about = "Hexagonal push game with a heuristic AI")]
struct Cli {
    /// Random seed for reproducible AI play
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the starting position and cell numbers
    Show,
    /// Play against the AI
    Play(play_cmd::PlayArgs),
    /// Run AI vs AI games between two sets of weights
    Match(match_cmd::MatchArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with the board on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show => {
            print!("{}", GameState::new());
            println!();
            print!("{}", index_layout());
            Ok(())
        }
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
    }
}
