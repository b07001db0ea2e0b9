//! Trigger parameter parsing.
//!
//! ShotGrid action menu items may deliver parameters in the query string, a
//! form body, or a JSON body. They are merged in that order, later sources
//! overwriting earlier ones, then turned into one [`SyncRequest`].

use std::collections::BTreeMap;

use serde_json::Value;

use statusbridge_core::{types::parse_debug_flag, SyncRequest};

use crate::error::TriggerError;

pub const IDS_PARAM: &str = "selected_ids";
pub const DEBUG_PARAM: &str = "debug";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Merged string parameters of one trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerParams {
    values: BTreeMap<String, String>,
}

impl TriggerParams {
    pub fn merge_urlencoded(&mut self, raw: &[u8]) {
        for (key, value) in url::form_urlencoded::parse(raw) {
            self.values.insert(key.into_owned(), value.into_owned());
        }
    }

    /// Merge the top-level keys of a JSON object. Scalars are stringified,
    /// arrays joined with `,`, nulls ignored.
    pub fn merge_json(&mut self, raw: &[u8]) -> Result<(), TriggerError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| TriggerError::InvalidJson(e.to_string()))?;
        let Value::Object(object) = value else {
            return Err(TriggerError::InvalidJson(
                "expected a JSON object".to_string(),
            ));
        };
        for (key, value) in object {
            if let Some(text) = stringify(&value) {
                self.values.insert(key, text);
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn into_sync_request(self) -> Result<SyncRequest, TriggerError> {
        let debug = self.get(DEBUG_PARAM).is_some_and(parse_debug_flag);
        let ids = self.get(IDS_PARAM).unwrap_or_default();
        Ok(SyncRequest::parse(ids, debug)?)
    }
}

/// Build a [`SyncRequest`] from the raw parts of an HTTP request.
pub fn parse_trigger(
    query: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<SyncRequest, TriggerError> {
    let mut params = TriggerParams::default();
    if let Some(query) = query {
        params.merge_urlencoded(query.as_bytes());
    }

    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if !body.is_empty() {
        if media_type == FORM_CONTENT_TYPE {
            params.merge_urlencoded(body);
        } else if is_json(&media_type) {
            params.merge_json(body)?;
        }
    }

    params.into_sync_request()
}

/// `application/json` or any `application/*+json` type.
fn is_json(media_type: &str) -> bool {
    media_type == JSON_CONTENT_TYPE
        || media_type
            .strip_prefix("application/")
            .is_some_and(|subtype| subtype.ends_with("+json"))
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(stringify)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
