use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use statusbridge_sync::SyncService;

use crate::request::parse_trigger;
use crate::response::{error_html, summary_html, ErrorBody, SyncSummary};

pub const TRIGGER_PATH: &str = "/update_shot_status";

#[derive(Clone)]
pub struct AppState {
    pub service: SyncService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: SyncService) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(TRIGGER_PATH, get(update_shot_status).post(update_shot_status))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "started_at": state.started_at.to_rfc3339(),
        })),
    )
}

async fn update_shot_status(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let format = Format::negotiate(&headers);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let request = match parse_trigger(query.as_deref(), content_type, &body) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "rejected trigger");
            return format.error(StatusCode::BAD_REQUEST, err.to_string());
        }
    };

    let debug = request.debug();
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.run(&request)).await;

    match outcome {
        Ok(Ok(result)) => format.summary(SyncSummary::from_result(result, debug)),
        Ok(Err(err)) => {
            tracing::error!(error = %err, "sync aborted");
            format.error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        Err(err) => {
            tracing::error!(error = %err, "sync task panicked");
            format.error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error while running sync".to_string(),
            )
        }
    }
}

/// Response rendering chosen from the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Html,
}

impl Format {
    /// HTML only when `text/html` is listed before any JSON media type.
    fn negotiate(headers: &HeaderMap) -> Self {
        let Some(accept) = headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
        else {
            return Format::Json;
        };
        for media in accept.split(',') {
            let media = media.split(';').next().unwrap_or_default().trim();
            if media.eq_ignore_ascii_case("text/html") {
                return Format::Html;
            }
            if media.eq_ignore_ascii_case("application/json") {
                return Format::Json;
            }
        }
        Format::Json
    }

    fn summary(self, summary: SyncSummary) -> Response {
        match self {
            Format::Json => (StatusCode::OK, Json(summary)).into_response(),
            Format::Html => (StatusCode::OK, Html(summary_html(&summary))).into_response(),
        }
    }

    fn error(self, status: StatusCode, message: String) -> Response {
        match self {
            Format::Json => (status, Json(ErrorBody { error: message })).into_response(),
            Format::Html => (status, Html(error_html(&message))).into_response(),
        }
    }
}
