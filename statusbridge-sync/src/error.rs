//! Error types for statusbridge-sync.
//!
//! Only batch-aborting failures are errors. Everything that goes wrong for a
//! single item is an outcome recorded in the `SyncResult`.

use thiserror::Error;

use statusbridge_core::BackendError;

/// The Version batch query failed; no item was looked at.
#[derive(Debug, Error)]
#[error("tracking system query failed: {0}")]
pub struct ResolveError(#[from] pub BackendError);

/// The external store refused or failed to open a session; no item was applied.
#[derive(Debug, Error)]
#[error("external store login failed: {0}")]
pub struct ReconcileError(#[from] pub BackendError);

/// All errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
