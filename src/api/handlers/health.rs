use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use crate::AppState;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub handlers: Vec<String>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    // A missing probe object still proves the bucket is reachable
    let storage_status = match state.records.file_exists("health-check").await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Records bucket unreachable: {}", e);
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        storage: storage_status.to_string(),
        handlers: state
            .dispatcher
            .handler_names()
            .into_iter()
            .map(String::from)
            .collect(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
