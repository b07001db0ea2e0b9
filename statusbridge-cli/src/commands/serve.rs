//! `statusbridge serve`: run the trigger endpoint.

use anyhow::{Context, Result};
use clap::Args;

use super::backend::BackendArgs;

/// Arguments for `statusbridge serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Listen address, overriding the settings file.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub log_json: bool,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        statusbridge_server::init_tracing(self.log_json);

        let (settings, service) = self.backend.connect()?;
        let bind = self.bind.unwrap_or(settings.bind);
        tracing::info!(
            statuses = service.status_map().len(),
            source = ?settings.shot_status_source,
            "starting status bridge"
        );

        statusbridge_server::serve_blocking(service, &bind)
            .with_context(|| format!("server on {bind} failed"))
    }
}
