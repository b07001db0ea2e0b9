//! `statusbridge map`: show the effective status translation table.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use statusbridge_core::UNKNOWN_STATUS;

use super::backend::ConfigArgs;

/// Arguments for `statusbridge map`.
#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit the table as a JSON object.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct MapRow {
    #[tabled(rename = "shotgrid code")]
    code: String,
    #[tabled(rename = "filemaker status")]
    label: String,
}

impl MapArgs {
    pub fn run(self) -> Result<()> {
        let settings = self.config.load()?;

        if self.json {
            let table: BTreeMap<&str, &str> = settings.status_map.iter().collect();
            println!("{}", serde_json::to_string_pretty(&table)?);
            return Ok(());
        }

        let rows: Vec<MapRow> = settings
            .status_map
            .iter()
            .map(|(code, label)| MapRow {
                code: code.to_string(),
                label: label.to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!(
            "{}",
            format!("Any other code is treated as '{UNKNOWN_STATUS}' and skipped.").bright_black()
        );
        Ok(())
    }
}
