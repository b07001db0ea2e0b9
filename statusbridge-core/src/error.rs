//! Error types for statusbridge-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the settings file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.statusbridge/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A status translation table entry violates the table invariants.
    #[error("invalid status map: {0}")]
    InvalidStatusMap(String),

    /// A required connection setting was empty or absent.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A connection URL could not be parsed.
    #[error("invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
}

/// Errors raised while turning trigger parameters into a sync request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("no valid Version IDs received")]
    NoValidIds,
}

/// Failure talking to one of the two remote systems.
///
/// Both capability implementations map their transport and protocol errors
/// into this shape so the reconciliation core never sees HTTP client types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, TLS failure, timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status with an undecodable body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Success status but the body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The remote system reported an application-level error code.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
}
