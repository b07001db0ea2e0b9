//! FileMaker Data API client.
//!
//! Every Data API response carries `messages[0].code`; `"0"` means success
//! whatever the HTTP status, anything else is an application error. Code
//! `"401"` is FileMaker's "no records match the request" and maps to
//! [`ApplyOutcome::NoMatch`].

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use statusbridge_core::{
    config::{FileMakerCredentials, FileMakerSettings, UpdateMode},
    ApplyOutcome, BackendError, ConfigError, ExternalStore, SessionToken, ShotId,
};

use crate::http::{self, decode, exchange, is_success, snippet};

const CODE_OK: &str = "0";
const CODE_NO_RECORDS_MATCH: &str = "401";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response: Value,
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    code: String,
    #[serde(default)]
    message: String,
}

impl Envelope {
    fn code(&self) -> Option<&str> {
        self.messages.first().map(|m| m.code.as_str())
    }

    /// The `response` object, or the API error the envelope reports.
    fn into_response(self) -> Result<Value, BackendError> {
        match self.messages.into_iter().next() {
            Some(message) if message.code == CODE_OK => Ok(self.response),
            Some(message) => Err(BackendError::Api {
                code: message.code,
                message: message.message,
            }),
            None => Err(BackendError::Decode(
                "response has no messages array".to_string(),
            )),
        }
    }
}

pub struct FileMakerClient {
    agent: ureq::Agent,
    database: Url,
    credentials: FileMakerCredentials,
    settings: FileMakerSettings,
}

impl FileMakerClient {
    pub fn new(
        credentials: FileMakerCredentials,
        settings: FileMakerSettings,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let server = http::base_url("FMP_SERVER", &credentials.server)?;
        let database = http::join(
            &server,
            &["fmi", "data", "vLatest", "databases", credentials.database.as_str()],
        );
        Ok(Self {
            agent: http::agent(timeout),
            database,
            credentials,
            settings,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        http::join(&self.database, segments)
    }

    fn layout(&self, segments: &[&str]) -> Url {
        let mut path = vec!["layouts", self.settings.layout.as_str()];
        path.extend_from_slice(segments);
        self.endpoint(&path)
    }

    fn bearer(request: ureq::Request, session: &SessionToken) -> ureq::Request {
        request.set("Authorization", &format!("Bearer {}", session.expose()))
    }

    /// Send a request and decode the Data API envelope, also from error statuses.
    ///
    /// Only `op`, the HTTP status and the message code are logged. URLs and
    /// bodies can carry the session token and are never logged.
    fn call(
        &self,
        op: &'static str,
        request: ureq::Request,
        body: Option<&Value>,
    ) -> Result<Envelope, BackendError> {
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        let (status, text) = exchange(result)?;
        match decode::<Envelope>(&text) {
            Ok(envelope) => {
                tracing::trace!(op, status, code = envelope.code().unwrap_or("-"), "filemaker call");
                Ok(envelope)
            }
            Err(err) if is_success(status) => Err(err),
            Err(_) => Err(BackendError::Http {
                status,
                body: snippet(&text),
            }),
        }
    }

    /// Find the record by key field, then patch its status field.
    fn apply_by_record(
        &self,
        session: &SessionToken,
        shot_id: ShotId,
        status: &str,
    ) -> Result<ApplyOutcome, BackendError> {
        let mut criteria = Map::new();
        criteria.insert(
            self.settings.key_field.clone(),
            Value::String(format!("=={shot_id}")),
        );
        let query = json!({ "query": [criteria], "limit": "1" });

        let request = Self::bearer(self.agent.post(self.layout(&["_find"]).as_str()), session);
        let found = self.call("find", request, Some(&query))?;
        if found.code() == Some(CODE_NO_RECORDS_MATCH) {
            return Ok(ApplyOutcome::NoMatch);
        }
        let response = found.into_response()?;
        let Some(record_id) = response.pointer("/data/0/recordId").and_then(record_id) else {
            return Ok(ApplyOutcome::NoMatch);
        };

        let mut field_data = Map::new();
        field_data.insert(
            self.settings.status_field.clone(),
            Value::String(status.to_string()),
        );
        let patch = json!({ "fieldData": field_data });
        let url = self.layout(&["records", record_id.as_str()]);
        let request = Self::bearer(self.agent.patch(url.as_str()), session);
        self.call("update", request, Some(&patch))?.into_response()?;

        tracing::debug!(shot_id = %shot_id, record_id = %record_id, status, "external record updated");
        Ok(ApplyOutcome::Applied)
    }

    /// Run the configured script with `{"sg_id", "status"}` as its parameter.
    fn apply_by_script(
        &self,
        session: &SessionToken,
        script_name: &str,
        shot_id: ShotId,
        status: &str,
    ) -> Result<ApplyOutcome, BackendError> {
        let param = json!({ "sg_id": shot_id.to_string(), "status": status }).to_string();
        let url = self.layout(&["script", script_name]);
        let request = Self::bearer(self.agent.get(url.as_str()), session)
            .query("script.param", &param);
        let response = self.call("script", request, None)?.into_response()?;

        let script_error = response
            .get("scriptError")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Decode("script response has no scriptError".to_string()))?;
        match script_error {
            CODE_OK => Ok(ApplyOutcome::Applied),
            CODE_NO_RECORDS_MATCH => Ok(ApplyOutcome::NoMatch),
            code => {
                let result = response
                    .get("scriptResult")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Ok(ApplyOutcome::Failed(format!(
                    "script '{script_name}' error {code}: {result}"
                )))
            }
        }
    }
}

impl ExternalStore for FileMakerClient {
    fn authenticate(&self) -> Result<SessionToken, BackendError> {
        let basic = STANDARD.encode(format!(
            "{}:{}",
            self.credentials.username, self.credentials.password
        ));
        let request = self
            .agent
            .post(self.endpoint(&["sessions"]).as_str())
            .set("Authorization", &format!("Basic {basic}"));
        let response = self
            .call("login", request, Some(&json!({})))?
            .into_response()?;
        let token = response
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::Decode("login response has no token".to_string()))?;
        tracing::debug!("filemaker session opened");
        Ok(SessionToken::new(token))
    }

    fn apply_status(&self, session: &SessionToken, shot_id: ShotId, status: &str) -> ApplyOutcome {
        let result = match &self.settings.update_mode {
            UpdateMode::Record => self.apply_by_record(session, shot_id, status),
            UpdateMode::Script { script_name } => {
                self.apply_by_script(session, script_name, shot_id, status)
            }
        };
        result.unwrap_or_else(|err| {
            tracing::warn!(shot_id = %shot_id, error = %err, "external update failed");
            ApplyOutcome::Failed(err.to_string())
        })
    }

    fn release(&self, session: SessionToken) -> Result<(), BackendError> {
        let url = self.endpoint(&["sessions", session.expose()]);
        self.call("logout", self.agent.delete(url.as_str()), None)?
            .into_response()
            .map(|_| ())
    }
}

/// `recordId` is a string in the Data API; accept a number too.
fn record_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).expect("envelope")
    }

    #[test]
    fn success_code_yields_response() {
        let env = envelope(json!({
            "response": {"token": "abc"},
            "messages": [{"code": "0", "message": "OK"}]
        }));
        assert_eq!(env.into_response().expect("ok")["token"], json!("abc"));
    }

    #[test]
    fn non_zero_code_is_an_api_error() {
        let env = envelope(json!({
            "response": {},
            "messages": [{"code": "952", "message": "Invalid FileMaker Data API token (*)"}]
        }));
        let err = env.into_response().unwrap_err();
        assert_eq!(
            err,
            BackendError::Api {
                code: "952".into(),
                message: "Invalid FileMaker Data API token (*)".into()
            }
        );
    }

    #[test]
    fn record_ids_accept_strings_and_numbers() {
        assert_eq!(record_id(&json!("17")), Some("17".to_string()));
        assert_eq!(record_id(&json!(17)), Some("17".to_string()));
        assert_eq!(record_id(&json!("")), None);
        assert_eq!(record_id(&Value::Null), None);
    }
}
