//! Version → Shot status resolution.
//!
//! One batch query fetches every requested Version with its linked entity.
//! Depending on [`ShotStatusSource`], each Shot's status is then either taken
//! from that query or looked up again individually.

use std::collections::HashMap;

use serde_json::Value;

use statusbridge_core::{
    config::ShotStatusSource, Filter, Record, Resolution, ShotId, ShotStatusPair,
    TrackingSystem, UnresolvedReason, VersionId,
};

use crate::error::ResolveError;

pub const VERSION_ENTITY: &str = "Version";
pub const SHOT_ENTITY: &str = "Shot";
pub const SHOT_STATUS_FIELD: &str = "sg_status_list";

const LINKED_SHOT_STATUS_FIELD: &str = "entity.Shot.sg_status_list";

const VERSION_FIELDS: &[&str] = &[
    "id",
    "code",
    "entity",
    "entity.Shot.id",
    LINKED_SHOT_STATUS_FIELD,
];

/// Resolve every Version id to its Shot and status.
///
/// The output has exactly one entry per input id, in input order. Only a
/// failed batch query is an error; every per-item problem becomes
/// [`Resolution::Unresolved`].
pub fn resolve(
    tracking: &dyn TrackingSystem,
    version_ids: &[VersionId],
    source: ShotStatusSource,
) -> Result<Vec<Resolution>, ResolveError> {
    let filters = [Filter::is_in("id", version_ids.iter().map(|id| id.0))];
    let records = tracking.find(VERSION_ENTITY, &filters, VERSION_FIELDS)?;
    tracing::debug!(
        requested = version_ids.len(),
        returned = records.len(),
        "version batch query complete"
    );

    let by_id: HashMap<VersionId, Record> = records
        .into_iter()
        .filter_map(|record| record_id(&record).map(|id| (VersionId(id), record)))
        .collect();

    Ok(version_ids
        .iter()
        .map(|&version_id| match by_id.get(&version_id) {
            Some(record) => resolve_version(tracking, version_id, record, source),
            None => Resolution::Unresolved {
                version_id,
                reason: UnresolvedReason::VersionNotFound,
            },
        })
        .collect())
}

fn resolve_version(
    tracking: &dyn TrackingSystem,
    version_id: VersionId,
    record: &Record,
    source: ShotStatusSource,
) -> Resolution {
    let Some(shot_id) = linked_shot(record) else {
        return Resolution::Unresolved {
            version_id,
            reason: UnresolvedReason::NoLinkedShot,
        };
    };

    let status_code = match source {
        ShotStatusSource::Batch => status_code(record.get(LINKED_SHOT_STATUS_FIELD)),
        ShotStatusSource::Refetch => match fetch_shot_status(tracking, shot_id) {
            Ok(code) => code,
            Err(reason) => return Resolution::Unresolved { version_id, reason },
        },
    };

    Resolution::Resolved(ShotStatusPair {
        version_id,
        shot_id,
        status_code,
    })
}

fn fetch_shot_status(
    tracking: &dyn TrackingSystem,
    shot_id: ShotId,
) -> Result<String, UnresolvedReason> {
    let filters = [Filter::is("id", shot_id.0)];
    match tracking.find_one(SHOT_ENTITY, &filters, &[SHOT_STATUS_FIELD]) {
        Ok(Some(shot)) => Ok(status_code(shot.get(SHOT_STATUS_FIELD))),
        Ok(None) => Err(UnresolvedReason::ShotNotFound),
        Err(err) => {
            tracing::warn!(shot_id = %shot_id, error = %err, "shot lookup failed");
            Err(UnresolvedReason::LookupFailed(err.to_string()))
        }
    }
}

/// The Shot a Version links to, if its entity is a Shot.
fn linked_shot(record: &Record) -> Option<ShotId> {
    let entity = record.get("entity")?.as_object()?;
    if entity.get("type")?.as_str()? != SHOT_ENTITY {
        return None;
    }
    entity.get("id")?.as_u64().map(ShotId)
}

fn record_id(record: &Record) -> Option<u64> {
    record.get("id")?.as_u64()
}

/// A missing or null status resolves to the empty code, which no table maps.
fn status_code(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_default()
}
