//! Domain types for a single status reconciliation.
//!
//! Everything here is request-scoped: built when a trigger arrives, returned
//! to the caller, then dropped. Nothing is persisted.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a Version record in the tracking system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for VersionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a Shot. Doubles as the external key (`SG_ID`) shared with
/// the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShotId(pub u64);

impl fmt::Display for ShotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ShotId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A canonical, validated trigger: at least one Version id, no duplicates,
/// input order preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    version_ids: Vec<VersionId>,
    debug: bool,
}

impl SyncRequest {
    /// Build a request from ids. Duplicates keep their first position.
    pub fn new(
        ids: impl IntoIterator<Item = VersionId>,
        debug: bool,
    ) -> Result<Self, RequestError> {
        let mut seen = HashSet::new();
        let version_ids: Vec<VersionId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
        if version_ids.is_empty() {
            return Err(RequestError::NoValidIds);
        }
        Ok(Self { version_ids, debug })
    }

    /// Parse a comma-separated id list such as `"12, 13,abc"`.
    ///
    /// Tokens that are not plain ASCII digits are ignored, as is `0`.
    pub fn parse(selected_ids: &str, debug: bool) -> Result<Self, RequestError> {
        let ids = selected_ids
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
            .filter_map(|token| token.parse::<u64>().ok())
            .filter(|id| *id > 0)
            .map(VersionId);
        Self::new(ids, debug)
    }

    pub fn version_ids(&self) -> &[VersionId] {
        &self.version_ids
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn len(&self) -> usize {
        self.version_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.version_ids.is_empty()
    }
}

/// Case-insensitive truthy check used for the `debug` trigger parameter.
pub fn parse_debug_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A Version resolved to its Shot and that Shot's current status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotStatusPair {
    pub version_id: VersionId,
    pub shot_id: ShotId,
    pub status_code: String,
}

/// Why a Version could not be resolved to a Shot status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The batch query returned no record for this id.
    VersionNotFound,
    /// The Version has no linked entity, or the entity is not a Shot.
    NoLinkedShot,
    /// The authoritative Shot lookup came back empty.
    ShotNotFound,
    /// The per-Shot lookup itself failed.
    LookupFailed(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::VersionNotFound => write!(f, "version not found"),
            UnresolvedReason::NoLinkedShot => write!(f, "no linked shot"),
            UnresolvedReason::ShotNotFound => write!(f, "shot not found"),
            UnresolvedReason::LookupFailed(detail) => write!(f, "shot lookup failed: {detail}"),
        }
    }
}

/// Resolver output for one input Version id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ShotStatusPair),
    Unresolved {
        version_id: VersionId,
        reason: UnresolvedReason,
    },
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an item ended in the `Skipped` state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unresolved(UnresolvedReason),
    UnmappedStatus(String),
    NoMatchingRecord,
    ExternalUpdateFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unresolved(reason) => reason.fmt(f),
            SkipReason::UnmappedStatus(code) => write!(f, "unmapped status: {code}"),
            SkipReason::NoMatchingRecord => write!(f, "no matching external record"),
            SkipReason::ExternalUpdateFailed(detail) => {
                write!(f, "external update failed: {detail}")
            }
        }
    }
}

/// Terminal state of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Updated,
    Skipped,
}

/// One line of the per-item log, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub version_id: VersionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_id: Option<ShotId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_status: Option<String>,
    pub outcome: OutcomeKind,
    pub note: String,
}

/// Aggregate of a reconciliation batch.
///
/// `updated + skipped == entries.len()` always holds; use [`SyncResult::record`]
/// rather than touching the counters directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub updated: usize,
    pub skipped: usize,
    pub entries: Vec<LogEntry>,
}

impl SyncResult {
    pub fn record(&mut self, entry: LogEntry) {
        match entry.outcome {
            OutcomeKind::Updated => self.updated += 1,
            OutcomeKind::Skipped => self.skipped += 1,
        }
        self.entries.push(entry);
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
