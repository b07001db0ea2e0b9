//! Shared sync pipeline entrypoint used by the HTTP trigger and the CLI.

use std::sync::Arc;
use std::time::Instant;

use statusbridge_core::{
    config::ShotStatusSource, ExternalStore, StatusMap, SyncRequest, SyncResult, TrackingSystem,
};

use crate::{reconciler, resolver, SyncError};

/// Everything one trigger needs, fixed at process start.
///
/// Cheap to clone; the HTTP handler moves a clone onto a blocking thread per
/// request.
#[derive(Clone)]
pub struct SyncService {
    tracking: Arc<dyn TrackingSystem>,
    store: Arc<dyn ExternalStore>,
    status_map: Arc<StatusMap>,
    status_source: ShotStatusSource,
}

impl SyncService {
    pub fn new(
        tracking: Arc<dyn TrackingSystem>,
        store: Arc<dyn ExternalStore>,
        status_map: Arc<StatusMap>,
        status_source: ShotStatusSource,
    ) -> Self {
        Self {
            tracking,
            store,
            status_map,
            status_source,
        }
    }

    pub fn status_map(&self) -> &StatusMap {
        &self.status_map
    }

    /// Resolve then reconcile one request.
    ///
    /// Blocks until the batch is finished. The store is only contacted after
    /// the Version batch query succeeded.
    pub fn run(&self, request: &SyncRequest) -> Result<SyncResult, SyncError> {
        let started = Instant::now();
        tracing::info!(
            versions = request.len(),
            debug = request.debug(),
            "sync request received"
        );
        if request.debug() {
            tracing::info!(version_ids = ?request.version_ids(), "requested versions");
        }

        let resolutions = resolver::resolve(
            self.tracking.as_ref(),
            request.version_ids(),
            self.status_source,
        )?;
        let result = reconciler::reconcile(
            self.store.as_ref(),
            &self.status_map,
            &resolutions,
            request.debug(),
        )?;

        tracing::info!(
            updated = result.updated,
            skipped = result.skipped,
            duration_ms = started.elapsed().as_millis() as u64,
            "sync finished"
        );
        Ok(result)
    }
}
