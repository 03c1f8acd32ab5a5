use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::speech::SpeechService;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(service): State<Arc<SpeechService>>) -> impl IntoResponse {
    let remote = service.remote_initialized();
    let store = service.store_initialized();

    let body = json!({
        "status": if remote && store { "ready" } else { "not_ready" },
        "synthesis_host": if remote { "connected" } else { "unavailable" },
        "object_store": if store { "connected" } else { "unavailable" },
    });

    let status = if remote && store {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body))
}
