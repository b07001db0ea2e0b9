//! Flags shared by every command that talks to ShotGrid or FileMaker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use statusbridge_clients::{FileMakerClient, ShotGridClient};
use statusbridge_core::config::{self, FileMakerCredentials, Settings, ShotGridCredentials};
use statusbridge_sync::SyncService;

/// Settings file location.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Settings file (default: ~/.statusbridge/config.yaml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Settings> {
        let settings = match &self.config {
            Some(path) => config::load_at(path),
            None => config::load(),
        };
        settings.context("failed to load settings")
    }
}

/// Connection credentials; each flag falls back to its environment variable.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// ShotGrid site URL.
    #[arg(long, env = "SG_URL", hide_env_values = true)]
    pub sg_url: Option<String>,

    /// ShotGrid script name.
    #[arg(long, env = "SG_SCRIPT_NAME", hide_env_values = true)]
    pub sg_script_name: Option<String>,

    /// ShotGrid script API key.
    #[arg(long, env = "SG_API_KEY", hide_env_values = true)]
    pub sg_api_key: Option<String>,

    /// FileMaker server base URL.
    #[arg(long, env = "FMP_SERVER", hide_env_values = true)]
    pub fmp_server: Option<String>,

    /// FileMaker database name.
    #[arg(long, env = "FMP_DB", hide_env_values = true)]
    pub fmp_db: Option<String>,

    /// FileMaker account name.
    #[arg(long, env = "FMP_USERNAME", hide_env_values = true)]
    pub fmp_username: Option<String>,

    /// FileMaker account password.
    #[arg(long, env = "FMP_PASSWORD", hide_env_values = true)]
    pub fmp_password: Option<String>,
}

impl BackendArgs {
    /// Load settings and wire both clients into a [`SyncService`].
    pub fn connect(self) -> Result<(Settings, SyncService)> {
        let settings = self.config.load()?;

        let shotgrid = ShotGridCredentials::new(
            self.sg_url.unwrap_or_default(),
            self.sg_script_name.unwrap_or_default(),
            self.sg_api_key.unwrap_or_default(),
        )
        .context("incomplete ShotGrid credentials")?;
        let filemaker = FileMakerCredentials::new(
            self.fmp_server.unwrap_or_default(),
            self.fmp_db.unwrap_or_default(),
            self.fmp_username.unwrap_or_default(),
            self.fmp_password.unwrap_or_default(),
        )
        .context("incomplete FileMaker credentials")?;

        let tracking = ShotGridClient::new(shotgrid, settings.timeout())
            .context("invalid ShotGrid configuration")?;
        let store = FileMakerClient::new(filemaker, settings.filemaker.clone(), settings.timeout())
            .context("invalid FileMaker configuration")?;

        let service = SyncService::new(
            Arc::new(tracking),
            Arc::new(store),
            Arc::new(settings.status_map.clone()),
            settings.shot_status_source,
        );
        Ok((settings, service))
    }
}
