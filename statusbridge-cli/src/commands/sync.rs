//! `statusbridge sync`: one reconciliation run from the terminal.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use statusbridge_core::{LogEntry, OutcomeKind, SyncRequest};
use statusbridge_server::response::SyncSummary;

use super::backend::BackendArgs;

/// Arguments for `statusbridge sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Comma-separated Version ids, e.g. `12,13`.
    pub ids: String,

    /// Log every item and print the per-item table.
    #[arg(long)]
    pub debug: bool,

    /// Emit the same JSON body the trigger endpoint returns.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "version")]
    version: String,
    #[tabled(rename = "shot")]
    shot: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "mapped")]
    mapped: String,
    #[tabled(rename = "outcome")]
    outcome: String,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let request = SyncRequest::parse(&self.ids, self.debug)
            .with_context(|| format!("cannot sync '{}'", self.ids))?;

        statusbridge_server::init_tracing(false);
        let (_, service) = self.backend.connect()?;
        let result = service.run(&request).context("sync aborted")?;
        let summary = SyncSummary::from_result(result, self.debug);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        print_summary(&summary);
        Ok(())
    }
}

fn print_summary(summary: &SyncSummary) {
    let mark = if summary.updated > 0 {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "{mark} {} updated, {} skipped",
        summary.updated.to_string().bold(),
        summary.skipped.to_string().bold()
    );

    let Some(entries) = summary.debug_log.as_deref() else {
        return;
    };
    let rows: Vec<EntryRow> = entries.iter().map(entry_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn entry_row(entry: &LogEntry) -> EntryRow {
    let outcome = match entry.outcome {
        OutcomeKind::Updated => entry.note.green().to_string(),
        OutcomeKind::Skipped => entry.note.yellow().to_string(),
    };
    EntryRow {
        version: entry.version_id.to_string(),
        shot: entry
            .shot_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string()),
        status: entry.source_status.clone().unwrap_or_default(),
        mapped: entry.mapped_status.clone().unwrap_or_default(),
        outcome,
    }
}
