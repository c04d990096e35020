//! Skill Tree Control - CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use skilltreectl::{commands, display};

#[derive(Parser)]
#[command(name = "skilltreectl")]
#[command(about = "Skill tree progression - statistics, tree view, administration", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the skill database (overrides SKILLTREE_DB and the XDG default)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show overall statistics and top skills
    Stats {
        /// Emit machine-readable JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Show the full skill tree grouped by context
    Tree,

    /// Add XP to a skill
    AddXp {
        /// Skill name, e.g. "web_search"
        skill: String,

        /// XP amount (positive integer)
        amount: u32,
    },

    /// Reset a skill's progress to zero (keeps history and unlocks)
    Reset {
        /// Skill name
        skill: String,
    },
}

fn main() -> ExitCode {
    // Logs go to stderr so command output stays clean; RUST_LOG raises the
    // level when debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // The process contract is exit 0 on success, 1 on any failure; clap's
    // usage errors default to 2, so parse failures are mapped here
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let result = match cli.command {
        Some(Commands::Stats { json }) => commands::stats(cli.db, json),
        Some(Commands::Tree) => commands::tree(cli.db),
        Some(Commands::AddXp { skill, amount }) => commands::add_xp(cli.db, &skill, amount),
        Some(Commands::Reset { skill }) => commands::reset(cli.db, &skill),
        None => commands::overview(cli.db),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", display::render_error(&err));
            ExitCode::FAILURE
        }
    }
}
