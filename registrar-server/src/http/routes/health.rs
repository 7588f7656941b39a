//! Health check and banner endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::http::server::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Banner response
#[derive(Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub message: &'static str,
}

/// GET /
async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "registrar",
        message: "Registrar API operational",
    })
}

/// GET /health - reports unavailable when the store cannot be reached
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let reachable = sqlx::query("SELECT 1").execute(&state.pool).await;

    let (status, label) = match reachable {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}
