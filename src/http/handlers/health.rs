//! Liveness, readiness and metrics.

use crate::http::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

/// `GET /api/`
pub async fn root() -> Json<&'static str> {
    Json("ok")
}

/// `GET /api/healthcheck`: reports whether the graph answers a ping.
pub async fn healthcheck(State(state): State<AppState>) -> Json<Value> {
    let graph = match state.graph_store.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Graph ping failed");
            "down"
        },
    };
    Json(json!({ "status": "ok", "graph": graph }))
}

/// `GET /metrics`: Prometheus exposition text.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
