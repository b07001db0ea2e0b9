//! End-to-end protocol tests against in-memory tracking and store fakes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rstest::rstest;
use serde_json::{json, Value};
use statusbridge_core::{
    config::ShotStatusSource, ApplyOutcome, BackendError, ExternalStore, Filter, OutcomeKind,
    Record, SessionToken, ShotId, StatusMap, SyncRequest, TrackingSystem,
};
use statusbridge_sync::{pipeline::SyncService, SyncError};

type CallLog = Arc<Mutex<Vec<String>>>;

struct Tracking {
    /// version id → linked entity (`null` for none)
    versions: HashMap<u64, Value>,
    /// shot id → status code
    shots: HashMap<u64, String>,
    fail_batch: bool,
    log: CallLog,
}

impl TrackingSystem for Tracking {
    fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        _fields: &[&str],
    ) -> Result<Vec<Record>, BackendError> {
        self.log.lock().expect("log").push(format!("find {entity_type}"));
        if entity_type == "Version" {
            if self.fail_batch {
                return Err(BackendError::Http {
                    status: 401,
                    body: "invalid credentials".into(),
                });
            }
            let wanted = filters[0].value.as_array().expect("id list").clone();
            return Ok(wanted
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|id| {
                    let entity = self.versions.get(&id)?;
                    json!({"id": id, "type": "Version", "entity": entity})
                        .as_object()
                        .cloned()
                })
                .collect());
        }
        let id = filters[0].value.as_u64().expect("shot id");
        Ok(self
            .shots
            .get(&id)
            .and_then(|status| {
                json!({"id": id, "type": "Shot", "sg_status_list": status})
                    .as_object()
                    .cloned()
            })
            .into_iter()
            .collect())
    }
}

/// Keyed record store; `apply_status` is a plain field overwrite.
struct Store {
    records: Mutex<HashMap<u64, String>>,
    fail_login: bool,
    log: CallLog,
}

impl ExternalStore for Store {
    fn authenticate(&self) -> Result<SessionToken, BackendError> {
        self.log.lock().expect("log").push("authenticate".into());
        if self.fail_login {
            return Err(BackendError::Api {
                code: "212".into(),
                message: "Invalid user account and/or password".into(),
            });
        }
        Ok(SessionToken::new("session-1"))
    }

    fn apply_status(&self, _session: &SessionToken, shot_id: ShotId, status: &str) -> ApplyOutcome {
        self.log
            .lock()
            .expect("log")
            .push(format!("apply {shot_id} {status}"));
        let mut records = self.records.lock().expect("records");
        match records.get_mut(&shot_id.0) {
            Some(field) => {
                *field = status.to_string();
                ApplyOutcome::Applied
            }
            None => ApplyOutcome::NoMatch,
        }
    }

    fn release(&self, _session: SessionToken) -> Result<(), BackendError> {
        self.log.lock().expect("log").push("release".into());
        Ok(())
    }
}

struct Harness {
    service: SyncService,
    store: Arc<Store>,
    log: CallLog,
}

impl Harness {
    fn calls(&self) -> Vec<String> {
        self.log.lock().expect("log").clone()
    }

    fn applies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("apply"))
            .collect()
    }
}

#[derive(Default)]
struct Setup {
    versions: Vec<(u64, Value)>,
    shots: Vec<(u64, &'static str)>,
    records: Vec<u64>,
    fail_batch: bool,
    fail_login: bool,
}

impl Setup {
    fn build(self) -> Harness {
        let log: CallLog = Arc::default();
        let tracking = Arc::new(Tracking {
            versions: self.versions.into_iter().collect(),
            shots: self
                .shots
                .into_iter()
                .map(|(id, s)| (id, s.to_string()))
                .collect(),
            fail_batch: self.fail_batch,
            log: log.clone(),
        });
        let store = Arc::new(Store {
            records: Mutex::new(self.records.into_iter().map(|id| (id, String::new())).collect()),
            fail_login: self.fail_login,
            log: log.clone(),
        });
        let service = SyncService::new(
            tracking,
            store.clone(),
            Arc::new(StatusMap::default()),
            ShotStatusSource::Refetch,
        );
        Harness {
            service,
            store,
            log,
        }
    }
}

fn shot(id: u64) -> Value {
    json!({"type": "Shot", "id": id})
}

#[test]
fn linked_and_unlinked_versions() {
    let harness = Setup {
        versions: vec![(12, shot(7001)), (13, Value::Null)],
        shots: vec![(7001, "ip")],
        records: vec![7001],
        ..Setup::default()
    }
    .build();

    let request = SyncRequest::parse("12,13", false).expect("request");
    let result = harness.service.run(&request).expect("run");

    assert_eq!((result.updated, result.skipped), (1, 1));
    assert_eq!(result.entries[0].mapped_status.as_deref(), Some("IN PROGRESS"));
    assert_eq!(result.entries[0].outcome, OutcomeKind::Updated);
    assert_eq!(result.entries[1].note, "no linked shot");
    assert_eq!(
        harness.store.records.lock().expect("records")[&7001],
        "IN PROGRESS"
    );
}

#[test]
fn unmapped_status_makes_no_external_call() {
    let harness = Setup {
        versions: vec![(5, shot(7005))],
        shots: vec![(7005, "xyz")],
        records: vec![7005],
        ..Setup::default()
    }
    .build();

    let result = harness
        .service
        .run(&SyncRequest::parse("5", false).expect("request"))
        .expect("run");

    assert_eq!((result.updated, result.skipped), (0, 1));
    assert_eq!(result.entries[0].note, "unmapped status: xyz");
    assert!(harness.applies().is_empty());
}

#[rstest]
#[case("wtg", "NEW")]
#[case("ip", "IN PROGRESS")]
#[case("hld", "ON HOLD")]
#[case("profi", "NEED POST APPROVAL")]
#[case("apr", "APPROVED")]
#[case("omt", "OMIT")]
fn every_mapped_code_is_applied_exactly_once(#[case] code: &'static str, #[case] label: &str) {
    let harness = Setup {
        versions: vec![(1, shot(7001))],
        shots: vec![(7001, code)],
        records: vec![7001],
        ..Setup::default()
    }
    .build();

    let result = harness
        .service
        .run(&SyncRequest::parse("1", false).expect("request"))
        .expect("run");

    assert_eq!(result.updated, 1);
    assert_eq!(harness.applies(), vec![format!("apply 7001 {label}")]);
}

#[test]
fn applying_the_same_status_twice_updates_both_times() {
    let harness = Setup {
        versions: vec![(1, shot(7001))],
        shots: vec![(7001, "apr")],
        records: vec![7001],
        ..Setup::default()
    }
    .build();
    let request = SyncRequest::parse("1", false).expect("request");

    let first = harness.service.run(&request).expect("first run");
    let second = harness.service.run(&request).expect("second run");

    assert_eq!(first.updated, 1);
    assert_eq!(second.updated, 1);
    assert_eq!(harness.store.records.lock().expect("records")[&7001], "APPROVED");
}

#[test]
fn counts_cover_every_input() {
    // 2 linked + mapped, 1 linked but no external record, 3 unlinked, 1 unknown version.
    let harness = Setup {
        versions: vec![
            (1, shot(7001)),
            (2, shot(7002)),
            (3, shot(7003)),
            (4, Value::Null),
            (5, json!({"type": "Asset", "id": 9})),
            (6, Value::Null),
        ],
        shots: vec![(7001, "ip"), (7002, "wtg"), (7003, "hld")],
        records: vec![7001, 7002],
        ..Setup::default()
    }
    .build();

    let request = SyncRequest::parse("1,2,3,4,5,6,7", false).expect("request");
    let result = harness.service.run(&request).expect("run");

    assert_eq!(result.updated + result.skipped, request.len());
    assert!(result.skipped >= 3);
    assert_eq!(result.updated, 2);
    let notes: Vec<_> = result.entries.iter().map(|e| e.note.as_str()).collect();
    assert_eq!(
        notes,
        vec![
            "updated",
            "updated",
            "no matching external record",
            "no linked shot",
            "no linked shot",
            "no linked shot",
            "version not found",
        ]
    );
}

#[test]
fn login_failure_aborts_before_any_apply() {
    let harness = Setup {
        versions: vec![(1, shot(7001))],
        shots: vec![(7001, "ip")],
        records: vec![7001],
        fail_login: true,
        ..Setup::default()
    }
    .build();

    let err = harness
        .service
        .run(&SyncRequest::parse("1", false).expect("request"))
        .unwrap_err();

    assert!(matches!(err, SyncError::Reconcile(_)), "got: {err}");
    assert!(err.to_string().contains("login failed"), "got: {err}");
    assert!(harness.applies().is_empty());
}

#[test]
fn batch_query_failure_aborts_before_shot_lookups_and_login() {
    let harness = Setup {
        versions: vec![(1, shot(7001))],
        shots: vec![(7001, "ip")],
        fail_batch: true,
        ..Setup::default()
    }
    .build();

    let err = harness
        .service
        .run(&SyncRequest::parse("1", false).expect("request"))
        .unwrap_err();

    assert!(matches!(err, SyncError::Resolve(_)), "got: {err}");
    assert_eq!(harness.calls(), vec!["find Version"]);
}

#[test]
fn session_is_opened_once_and_released() {
    let harness = Setup {
        versions: vec![(1, shot(7001)), (2, shot(7002))],
        shots: vec![(7001, "ip"), (7002, "apr")],
        records: vec![7001, 7002],
        ..Setup::default()
    }
    .build();

    harness
        .service
        .run(&SyncRequest::parse("1,2", true).expect("request"))
        .expect("run");

    let calls = harness.calls();
    assert_eq!(calls.iter().filter(|c| *c == "authenticate").count(), 1);
    assert_eq!(calls.last().map(String::as_str), Some("release"));
}
