//! HTTP listener
//!
//! - `POST /`: IPAM webhook
//! - `GET /hello`: health check

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use ipam_dns_core::signature::{self, SIGNATURE_HEADER};
use ipam_dns_core::{ChangeEvent, Error, SyncEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, error, info, info_span, warn};

/// Shared handler state
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub secret: Option<String>,
    pub pipeline_timeout: Duration,
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_webhook))
        .route("/hello", get(handle_hello))
        .with_state(Arc::new(state))
}

/// GET /hello - Simple health check
async fn handle_hello() -> impl IntoResponse {
    Json(serde_json::json!({ "Hello": "World!" }))
}

/// POST / - Process one IPAM webhook
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // Verify the signature if it's present
    if let Some(value) = headers.get(SIGNATURE_HEADER) {
        let Ok(sig) = value.to_str() else {
            warn!("Signature header is not valid text");
            return StatusCode::BAD_REQUEST;
        };

        let secret = state.secret.as_deref().unwrap_or_default();
        if let Err(e) = signature::verify(secret.as_bytes(), sig, &body) {
            warn!("{}", e);
            return StatusCode::BAD_REQUEST;
        }
    } else if state.secret.is_some() {
        warn!("Request carries no {} header, processing it unverified", SIGNATURE_HEADER);
    }

    let event = match ChangeEvent::from_json(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("Could not decode request body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    let span = info_span!(
        "webhook",
        request_id = event.request_id.as_deref().unwrap_or("-")
    );
    process(&state, event).instrument(span).await
}

async fn process(state: &AppState, event: ChangeEvent) -> StatusCode {
    info!("Received {} event", event.kind);

    let result = match tokio::time::timeout(state.pipeline_timeout, state.engine.process(&event)).await {
        Ok(result) => result,
        Err(_) => Err(Error::timeout(format!(
            "processing exceeded {:?}",
            state.pipeline_timeout
        ))),
    };

    match result {
        Ok(applied) => {
            info!("Done, {} operation(s) applied", applied);
            StatusCode::OK
        }
        Err(e) if e.is_client_error() => {
            warn!("Rejected event: {}", e);
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            error!("{}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
