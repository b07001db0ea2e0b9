//! Translation and idempotent application of Shot statuses.
//!
//! ## Per-batch protocol
//!
//! 1. Open one external-store session. Failure aborts the batch.
//! 2. For each resolution, in order:
//!    - unresolved → skipped with the resolver's reason
//!    - unmapped code → skipped, nothing sent downstream
//!    - otherwise `apply_status`, whose outcome decides updated / skipped
//! 3. Release the session (best effort).

use statusbridge_core::{
    ApplyOutcome, ExternalStore, LogEntry, OutcomeKind, Resolution, SessionToken, ShotStatusPair,
    SkipReason, StatusMap, SyncResult,
};

use crate::error::ReconcileError;

/// Apply every resolution against the external store.
///
/// `verbose` raises per-item tracing from `debug` to `info`; it never changes
/// the outcome.
pub fn reconcile(
    store: &dyn ExternalStore,
    status_map: &StatusMap,
    resolutions: &[Resolution],
    verbose: bool,
) -> Result<SyncResult, ReconcileError> {
    let session = store.authenticate()?;

    let mut result = SyncResult::default();
    for resolution in resolutions {
        let entry = match resolution {
            Resolution::Unresolved { version_id, reason } => LogEntry {
                version_id: *version_id,
                shot_id: None,
                source_status: None,
                mapped_status: None,
                outcome: OutcomeKind::Skipped,
                note: SkipReason::Unresolved(reason.clone()).to_string(),
            },
            Resolution::Resolved(pair) => apply_pair(store, &session, status_map, pair),
        };
        trace_entry(&entry, verbose);
        result.record(entry);
    }

    if let Err(err) = store.release(session) {
        tracing::warn!(error = %err, "external store logout failed");
    }

    Ok(result)
}

fn apply_pair(
    store: &dyn ExternalStore,
    session: &SessionToken,
    status_map: &StatusMap,
    pair: &ShotStatusPair,
) -> LogEntry {
    let mut entry = LogEntry {
        version_id: pair.version_id,
        shot_id: Some(pair.shot_id),
        source_status: Some(pair.status_code.clone()),
        mapped_status: Some(status_map.label_or_unknown(&pair.status_code).to_string()),
        outcome: OutcomeKind::Skipped,
        note: String::new(),
    };

    let Some(label) = status_map.translate(&pair.status_code) else {
        entry.note = SkipReason::UnmappedStatus(pair.status_code.clone()).to_string();
        return entry;
    };

    match store.apply_status(session, pair.shot_id, label) {
        ApplyOutcome::Applied => {
            entry.outcome = OutcomeKind::Updated;
            entry.note = "updated".to_string();
        }
        ApplyOutcome::NoMatch => entry.note = SkipReason::NoMatchingRecord.to_string(),
        ApplyOutcome::Failed(detail) => {
            entry.note = SkipReason::ExternalUpdateFailed(detail).to_string();
        }
    }
    entry
}

fn trace_entry(entry: &LogEntry, verbose: bool) {
    let shot = entry.shot_id.map(|id| id.to_string()).unwrap_or_default();
    let source = entry.source_status.as_deref().unwrap_or_default();
    let mapped = entry.mapped_status.as_deref().unwrap_or_default();
    if verbose {
        tracing::info!(
            version_id = %entry.version_id,
            shot_id = %shot,
            source_status = source,
            mapped_status = mapped,
            outcome = ?entry.outcome,
            "{}",
            entry.note
        );
    } else {
        tracing::debug!(
            version_id = %entry.version_id,
            outcome = ?entry.outcome,
            "{}",
            entry.note
        );
    }
}
