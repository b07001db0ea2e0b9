//! The two seams the reconciliation core talks through.
//!
//! [`TrackingSystem`] is the production-tracking side (read only),
//! [`ExternalStore`] the record store that receives translated statuses.
//! Both are blocking: one batch runs sequentially on one thread.

use std::fmt;

use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::Value;

use crate::error::BackendError;
use crate::types::ShotId;

/// A flattened tracking-system record: `id`, `type`, then one key per
/// requested field. Linked entities appear as `{"type": .., "id": ..}` objects.
pub type Record = serde_json::Map<String, Value>;

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Is,
    In,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Is => "is",
            FilterOp::In => "in",
        }
    }
}

/// One `[field, operator, value]` condition. Serializes as a JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn is(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Is,
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::In,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.field)?;
        tuple.serialize_element(self.op.as_str())?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

/// Read access to the production-tracking system.
pub trait TrackingSystem: Send + Sync {
    /// All records of `entity_type` matching every filter.
    fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Vec<Record>, BackendError>;

    /// First matching record, if any.
    fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Option<Record>, BackendError> {
        Ok(self.find(entity_type, filters, fields)?.into_iter().next())
    }
}

/// Opaque bearer token for one reconciliation batch.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Result of applying a status to one external record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record now carries the requested status (including no-op writes).
    Applied,
    /// No record carries the external key.
    NoMatch,
    /// Transport failure or an application-level error code.
    Failed(String),
}

/// Write access to the external record store.
pub trait ExternalStore: Send + Sync {
    /// Open a session. Called once per batch.
    fn authenticate(&self) -> Result<SessionToken, BackendError>;

    /// Set the status field of the record whose key is `shot_id`.
    ///
    /// Must be idempotent. Never returns an error: every failure is an
    /// [`ApplyOutcome`].
    fn apply_status(&self, session: &SessionToken, shot_id: ShotId, status: &str) -> ApplyOutcome;

    /// Invalidate the session. Stores whose tokens simply expire keep the default.
    fn release(&self, _session: SessionToken) -> Result<(), BackendError> {
        Ok(())
    }
}
