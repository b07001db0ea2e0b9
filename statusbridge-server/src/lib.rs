//! HTTP trigger endpoint: request parsing, routing, and the server runtime.

mod error;
pub mod request;
pub mod response;
pub mod router;
mod runtime;

pub use error::{ServerError, TriggerError};
pub use router::{build_router, AppState};
pub use runtime::{init_tracing, serve, serve_blocking};
