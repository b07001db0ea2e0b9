//! # statusbridge-sync
//!
//! The status reconciliation protocol.
//!
//! [`resolver::resolve`] turns Version ids into Shot statuses,
//! [`reconciler::reconcile`] pushes translated statuses into the external
//! store, and [`pipeline::SyncService`] runs both for one trigger.

pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod resolver;

pub use error::{ReconcileError, ResolveError, SyncError};
pub use pipeline::SyncService;
