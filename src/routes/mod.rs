pub mod announcements;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;

use crate::AppState;

/// All routes, without transport layers (CORS, tracing), with state applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route(
            "/announcements",
            get(announcements::list_announcements).post(announcements::create_announcement),
        )
        .route(
            "/announcements/{id}",
            put(announcements::update_announcement).delete(announcements::delete_announcement),
        )
        .with_state(state)
}

/// GET /health — reports whether the announcement store answers.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.announcements.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "store": "connected" }))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "store": e.to_string() })),
        ),
    }
}

/// GET /metrics — Prometheus text exposition.
pub async fn metrics() -> Result<impl IntoResponse, StatusCode> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer))
}
