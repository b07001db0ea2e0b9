//! Shared `ureq` plumbing.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use statusbridge_core::{BackendError, ConfigError};

const USER_AGENT: &str = concat!("statusbridge/", env!("CARGO_PKG_VERSION"));
const SNIPPET_LEN: usize = 512;

/// Agent with a connect timeout and an overall per-request timeout.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Parse a base URL that later gets path segments appended.
pub(crate) fn base_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            field,
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// `base` with `segments` appended, each percent-encoded.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Status and body text of a response, whether or not the status is a success.
///
/// Only transport-level failures (including timeouts) are errors here.
pub(crate) fn exchange(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<(u16, String), BackendError> {
    let response = match result {
        Ok(response) | Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(transport)) => {
            return Err(BackendError::Transport(transport.to_string()))
        }
    };
    let status = response.status();
    let body = response
        .into_string()
        .map_err(|e| BackendError::Transport(format!("reading response body: {e}")))?;
    Ok((status, body))
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Bounded prefix of a response body for error messages.
pub(crate) fn snippet(body: &str) -> String {
    match body.char_indices().nth(SNIPPET_LEN) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}
