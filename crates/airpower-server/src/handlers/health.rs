//! Health and info endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::server::AppState;

/// Service banner at `/`.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": "airpower-server",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage.backend_name(),
    }))
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}

/// Readiness probe. Ready once the storage backend answers a query.
pub async fn readyz(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    let probe = airpower_storage::Query::new().limit(1);
    match state.storage.find("users", &probe).await {
        Ok(_) => Ok("ready"),
        Err(err) => {
            tracing::warn!(error = %err, "storage not ready");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
