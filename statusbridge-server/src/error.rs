use thiserror::Error;

use statusbridge_core::RequestError;

/// Error surface for the server runtime.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// A trigger that cannot become a sync request. Always answered with 400.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Request(#[from] RequestError),
}

pub(crate) fn io_err(context: impl Into<String>, source: std::io::Error) -> ServerError {
    ServerError::Io {
        context: context.into(),
        source,
    }
}
