//! statusbridge core library: domain types, capability traits, config, errors.
//!
//! - [`types`]: id newtypes, requests, resolutions, per-item outcomes
//! - [`status_map`]: the read-only status translation table
//! - [`capability`]: the tracking-system and external-store seams
//! - [`config`]: YAML settings and connection credentials
//! - [`error`]: [`ConfigError`], [`RequestError`], [`BackendError`]

pub mod capability;
pub mod config;
pub mod error;
pub mod status_map;
pub mod types;

pub use capability::{
    ApplyOutcome, ExternalStore, Filter, FilterOp, Record, SessionToken, TrackingSystem,
};
pub use error::{BackendError, ConfigError, RequestError};
pub use status_map::{StatusMap, UNKNOWN_STATUS};
pub use types::{
    LogEntry, OutcomeKind, Resolution, ShotId, ShotStatusPair, SkipReason, SyncRequest,
    SyncResult, UnresolvedReason, VersionId,
};
