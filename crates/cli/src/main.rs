// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! engram - per-project knowledge server CLI

mod commands;
mod exit_error;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "engram",
    version,
    about = "Engram - living knowledge docs that follow your repository"
)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the state store, config template, and living docs
    Init,
    /// Run adapters and write the chronological queue
    BuildQueue {
        /// Only keep entries on or after this date (YYYY-MM-DD);
        /// defaults to the fold-from marker when one is set
        #[arg(long = "start-date", value_name = "YYYY-MM-DD")]
        start_date: Option<String>,
    },
    /// Produce the next chunk (refuses while a chunk is active)
    NextChunk,
    /// Remove the active-chunk lock
    ClearActiveChunk,
    /// Run the schema linter over living and graveyard docs
    Lint,
    /// Enter the server loop (foreground)
    Run,
    /// Show buffer fill, dispatch state, and markers
    Status,
    /// Bootstrap the living docs, optionally from a historical date
    Seed {
        /// Seed from the repository state at this date, then forward-fold
        #[arg(long = "from-date", value_name = "YYYY-MM-DD")]
        from_date: Option<String>,
    },
    /// Forward-fold history from a date without re-seeding
    Fold {
        #[arg(long = "from", value_name = "YYYY-MM-DD")]
        from: String,
    },
    /// Backfill identifiers and graveyards on pre-existing docs
    Migrate {
        /// Also set the fold-from marker
        #[arg(long = "fold-from", value_name = "YYYY-MM-DD")]
        fold_from: Option<String>,
    },
}

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(e) => {
            // Single-line reason at the boundary
            eprintln!("Error: {e}");
            e.downcast_ref::<exit_error::ExitError>().map_or(1, |c| c.code)
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let root = match cli.directory {
        Some(dir) => dir.canonicalize()?,
        None => std::env::current_dir()?,
    };

    init_tracing(&cli.command);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        match cli.command {
            Commands::Init => commands::init::run(&root),
            Commands::BuildQueue { start_date } => {
                commands::queue::run(&root, start_date.as_deref()).await
            }
            Commands::NextChunk => commands::chunk::next(&root).await,
            Commands::ClearActiveChunk => commands::chunk::clear(&root),
            Commands::Lint => commands::lint::run(&root),
            Commands::Run => commands::server::run(&root).await,
            Commands::Status => commands::status::run(&root),
            Commands::Seed { from_date } => {
                commands::bootstrap::seed(&root, from_date.as_deref()).await
            }
            Commands::Fold { from } => commands::bootstrap::fold(&root, &from).await,
            Commands::Migrate { fold_from } => {
                commands::migrate::run(&root, fold_from.as_deref())
            }
        }
    })
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// Stderr logging for one-shot commands; `run` adds the file appender in
/// its own command module.
fn init_tracing(command: &Commands) {
    if matches!(command, Commands::Run) {
        // The server installs its subscriber after resolving paths
        return;
    }
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
