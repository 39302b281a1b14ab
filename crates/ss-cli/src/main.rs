//! Terminal host for compiled StoryScript programs.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ss",
    about = "StoryScript — run compiled interactive-fiction programs",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a compiled story interactively
    Run {
        /// The compiled stream file
        file: PathBuf,

        /// RNG seed for a deterministic run
        #[arg(short, long)]
        seed: Option<u64>,

        /// Print the final state as JSON after the story ends
        #[arg(long)]
        state: bool,
    },

    /// Load a compiled stream and report diagnostics without running it
    Check {
        /// The compiled stream file
        file: PathBuf,
    },

    /// Load a compiled stream and print its re-serialized form
    Dump {
        /// The compiled stream file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file, seed, state } => commands::run::run(&file, seed, state),
        Commands::Check { file } => commands::check::run(&file),
        Commands::Dump { file } => commands::dump::run(&file),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
