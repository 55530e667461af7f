//! Health, liveness, and readiness endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use super::AppState;
use crate::network::ServingState;

/// `GET /health` -- always `200 {"status":"healthy"}`.
///
/// Reports only that the process answers; the store is not consulted.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// `GET /health/live` -- always 200.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// `GET /health/ready` -- 200 only while serving and the store answers a ping.
///
/// Returns 503 while starting, once draining has begun, or when the store
/// is unreachable, so load balancers stop routing to this instance.
pub async fn readiness_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let serving = state.lifecycle.state();
    if serving != ServingState::Ready {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": serving.as_str() })),
        );
    }

    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            warn!(error = %e, "readiness probe: order store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "store_unavailable" })),
            )
        }
    }
}
