//! statusbridge: push ShotGrid shot statuses into FileMaker.
//!
//! # Usage
//!
//! ```text
//! statusbridge serve [--config <path>] [--bind <addr>] [--log-json]
//! statusbridge sync <ids> [--config <path>] [--debug] [--json]
//! statusbridge map [--config <path>] [--json]
//! ```
//!
//! Credentials come from `SG_URL`, `SG_SCRIPT_NAME`, `SG_API_KEY`,
//! `FMP_SERVER`, `FMP_DB`, `FMP_USERNAME` and `FMP_PASSWORD`, or the
//! matching flags.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{map::MapArgs, serve::ServeArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "statusbridge",
    version,
    about = "One-way shot status sync from ShotGrid to FileMaker",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP trigger endpoint for ShotGrid action menu items.
    Serve(ServeArgs),

    /// Sync a list of Version ids once from the terminal.
    Sync(SyncArgs),

    /// Print the effective status translation table.
    Map(MapArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Map(args) => args.run(),
    }
}
