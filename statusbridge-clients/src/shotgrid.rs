//! ShotGrid REST API client.
//!
//! Authenticates with script-key credentials (`client_credentials` grant) and
//! queries through `/api/v1/entity/{collection}/_search`. Returned records are
//! flattened into [`Record`]s: `id`, `type`, every attribute, and every
//! relationship's `data` under its field name.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use statusbridge_core::{
    config::ShotGridCredentials, BackendError, ConfigError, Filter, Record, TrackingSystem,
};

use crate::http::{self, decode, exchange, is_success, snippet};

const SEARCH_CONTENT_TYPE: &str = "application/vnd+shotgun.api3_array+json";
const PAGE_SIZE: usize = 500;
/// Refresh a cached token this long before the server would expire it.
const REFRESH_MARGIN: Duration = Duration::from_secs(30);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    600
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<EntityRecord>,
}

#[derive(Deserialize)]
struct EntityRecord {
    id: u64,
    #[serde(rename = "type")]
    entity_type: String,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    relationships: Map<String, Value>,
}

impl EntityRecord {
    fn flatten(self) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::from(self.id));
        record.insert("type".to_string(), Value::String(self.entity_type));
        record.extend(self.attributes);
        for (field, relationship) in self.relationships {
            let data = relationship.get("data").cloned().unwrap_or(Value::Null);
            record.insert(field, data);
        }
        record
    }
}

pub struct ShotGridClient {
    agent: ureq::Agent,
    site: Url,
    credentials: ShotGridCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl ShotGridClient {
    pub fn new(credentials: ShotGridCredentials, timeout: Duration) -> Result<Self, ConfigError> {
        let site = http::base_url("SG_URL", &credentials.site_url)?;
        Ok(Self {
            agent: http::agent(timeout),
            site,
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Cached bearer token, fetching a new one when absent or about to expire.
    fn access_token(&self) -> Result<String, BackendError> {
        let mut cached = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = cached.as_ref() {
            if Instant::now() + REFRESH_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let url = http::join(&self.site, &["api", "v1", "auth", "access_token"]);
        let result = self
            .agent
            .post(url.as_str())
            .set("Accept", "application/json")
            .send_form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.script_name.as_str()),
                ("client_secret", self.credentials.api_key.as_str()),
            ]);
        let (status, body) = exchange(result)?;
        if !is_success(status) {
            return Err(BackendError::Http {
                status,
                body: snippet(&body),
            });
        }
        let response: TokenResponse = decode(&body)?;
        tracing::debug!(expires_in = response.expires_in, "shotgrid access token issued");

        // An out-of-range lifetime is not cached; the next call asks again.
        *cached = Instant::now()
            .checked_add(Duration::from_secs(response.expires_in))
            .map(|expires_at| CachedToken {
                value: response.access_token.clone(),
                expires_at,
            });
        Ok(response.access_token)
    }

    fn forget_token(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Page through `_search` until a short page or `limit` records.
    fn search(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
        page_size: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, BackendError> {
        let token = self.access_token()?;
        let collection = collection_name(entity_type);
        let url = http::join(&self.site, &["api", "v1", "entity", collection.as_str(), "_search"]);
        let body = json!({ "filters": filters }).to_string();
        let fields = fields.join(",");

        let mut records = Vec::new();
        let mut page = 1usize;
        loop {
            tracing::trace!(entity_type, page, "shotgrid search");
            let result = self
                .agent
                .post(url.as_str())
                .set("Authorization", &format!("Bearer {token}"))
                .set("Accept", "application/json")
                .set("Content-Type", SEARCH_CONTENT_TYPE)
                .query("fields", &fields)
                .query("page[size]", &page_size.to_string())
                .query("page[number]", &page.to_string())
                .send_string(&body);
            let (status, text) = exchange(result)?;
            if status == 401 {
                self.forget_token();
            }
            if !is_success(status) {
                return Err(BackendError::Http {
                    status,
                    body: snippet(&text),
                });
            }

            let batch: SearchPage = decode(&text)?;
            let returned = batch.data.len();
            records.extend(batch.data.into_iter().map(EntityRecord::flatten));

            let reached_limit = limit.is_some_and(|max| records.len() >= max);
            if returned < page_size || reached_limit {
                break;
            }
            page += 1;
        }

        if let Some(max) = limit {
            records.truncate(max);
        }
        Ok(records)
    }
}

impl TrackingSystem for ShotGridClient {
    fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Vec<Record>, BackendError> {
        self.search(entity_type, filters, fields, PAGE_SIZE, None)
    }

    fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        fields: &[&str],
    ) -> Result<Option<Record>, BackendError> {
        Ok(self
            .search(entity_type, filters, fields, 1, Some(1))?
            .into_iter()
            .next())
    }
}

/// REST collection for an entity type: `Version` → `versions`,
/// `CustomEntity01` → `custom_entity01s`.
fn collection_name(entity_type: &str) -> String {
    let mut name = String::with_capacity(entity_type.len() + 2);
    for (i, ch) in entity_type.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name.push('s');
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names() {
        assert_eq!(collection_name("Version"), "versions");
        assert_eq!(collection_name("Shot"), "shots");
        assert_eq!(collection_name("CustomEntity01"), "custom_entity01s");
    }

    #[test]
    fn flatten_merges_attributes_and_relationships() {
        let record: EntityRecord = serde_json::from_value(json!({
            "id": 12,
            "type": "Version",
            "attributes": {"code": "sh010_v001", "entity.Shot.sg_status_list": "ip"},
            "relationships": {
                "entity": {"data": {"type": "Shot", "id": 7001, "name": "sh010"}, "links": {}},
                "user": {"links": {}}
            },
            "links": {"self": "/api/v1/entity/versions/12"}
        }))
        .expect("record");

        let flat = record.flatten();
        assert_eq!(flat["id"], json!(12));
        assert_eq!(flat["type"], json!("Version"));
        assert_eq!(flat["code"], json!("sh010_v001"));
        assert_eq!(flat["entity.Shot.sg_status_list"], json!("ip"));
        assert_eq!(flat["entity"]["id"], json!(7001));
        assert_eq!(flat["user"], Value::Null);
    }
}
