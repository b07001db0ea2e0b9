use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENV_VARS: [&str; 7] = [
    "SG_URL",
    "SG_SCRIPT_NAME",
    "SG_API_KEY",
    "FMP_SERVER",
    "FMP_DB",
    "FMP_USERNAME",
    "FMP_PASSWORD",
];

fn statusbridge_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("statusbridge"));
    cmd.env("HOME", home).env("USERPROFILE", home);
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn map_prints_default_table() {
    let home = TempDir::new().expect("home");
    statusbridge_cmd(home.path())
        .arg("map")
        .assert()
        .success()
        .stdout(contains("NEED POST APPROVAL"))
        .stdout(contains("profi"));
}

#[test]
fn map_reads_table_from_settings_file() {
    let home = TempDir::new().expect("home");
    let config = home.path().join("bridge.yaml");
    fs::write(&config, "status_map:\n  ip: WORKING\n  fin: DELIVERED\n").expect("write config");

    let output = statusbridge_cmd(home.path())
        .args(["map", "--json", "--config"])
        .arg(&config)
        .output()
        .expect("run");
    assert!(output.status.success());
    let table: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(table, json!({"fin": "DELIVERED", "ip": "WORKING"}));
}

#[test]
fn map_rejects_corrupt_settings() {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".statusbridge");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("config.yaml"), "status_map: [unclosed").expect("write config");

    statusbridge_cmd(home.path())
        .arg("map")
        .assert()
        .failure()
        .stderr(contains("config.yaml"));
}

#[test]
fn sync_rejects_ids_without_digits() {
    let home = TempDir::new().expect("home");
    statusbridge_cmd(home.path())
        .args(["sync", "abc,,x1"])
        .assert()
        .failure()
        .stderr(contains("no valid Version IDs received"));
}

#[test]
fn sync_names_the_missing_credential() {
    let home = TempDir::new().expect("home");
    statusbridge_cmd(home.path())
        .args(["sync", "12"])
        .env("SG_SCRIPT_NAME", "status_bridge")
        .env("SG_API_KEY", "s3cret")
        .assert()
        .failure()
        .stderr(contains("SG_URL"));
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_pushes_status_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "sg-token", "expires_in": 600})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/entity/versions/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": 12,
                "type": "Version",
                "attributes": {"code": "sh010_comp_v003"},
                "relationships": {"entity": {"data": {"type": "Shot", "id": 7001}}}
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/entity/shots/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 7001, "type": "Shot", "attributes": {"sg_status_list": "apr"}}]
        })))
        .mount(&server)
        .await;

    let db = "/fmi/data/vLatest/databases/Shots";
    let fm_ok = |response: Value| {
        ResponseTemplate::new(200).set_body_json(json!({
            "response": response,
            "messages": [{"code": "0", "message": "OK"}]
        }))
    };
    Mock::given(method("POST"))
        .and(path(format!("{db}/sessions")))
        .respond_with(fm_ok(json!({"token": "fm-token"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{db}/layouts/status_update/_find")))
        .respond_with(fm_ok(json!({"data": [{"fieldData": {}, "recordId": "42"}]})))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("{db}/layouts/status_update/records/42")))
        .and(body_json(json!({"fieldData": {"Status": "APPROVED"}})))
        .respond_with(fm_ok(json!({"modId": "2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{db}/sessions/fm-token")))
        .respond_with(fm_ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        let home = TempDir::new().expect("home");
        statusbridge_cmd(home.path())
            .args(["sync", "12", "--json", "--debug"])
            .env("SG_URL", &uri)
            .env("SG_SCRIPT_NAME", "status_bridge")
            .env("SG_API_KEY", "s3cret")
            .env("FMP_SERVER", &uri)
            .env("FMP_DB", "Shots")
            .env("FMP_USERNAME", "bridge")
            .env("FMP_PASSWORD", "hunter2")
            .output()
            .expect("run")
    })
    .await
    .expect("blocking task");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(summary["updated"], 1);
    assert_eq!(summary["skipped"], 0);
    assert_eq!(summary["debug_log"][0]["mapped_status"], "APPROVED");
}
