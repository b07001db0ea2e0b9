use statusbridge_sync::SyncService;

use crate::error::{io_err, ServerError};
use crate::router::{build_router, AppState};

/// Start the server runtime and block the current thread until it exits.
pub fn serve_blocking(service: SyncService, bind: &str) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(serve(service, bind))
}

/// Serve the trigger endpoint until Ctrl-C.
pub async fn serve(service: SyncService, bind: &str) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| io_err(format!("bind {bind}"), e))?;
    let local = listener
        .local_addr()
        .map_err(|e| io_err("local-addr", e))?;
    tracing::info!(addr = %local, "status bridge listening");

    let app = build_router(AppState::new(service));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| io_err("serve", e))?;

    tracing::info!("status bridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Install the global subscriber on stderr. `RUST_LOG` overrides the `info`
/// default.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
