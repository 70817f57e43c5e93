pub mod api;
pub mod config;
pub mod hooks;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers;
use crate::config::HookConfig;
use crate::hooks::HookDispatcher;
use crate::services::storage::StorageService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::hooks::receive_hook,
        handlers::health::health_check,
    ),
    components(
        schemas(
            handlers::hooks::HookRequest,
            handlers::hooks::HookEvent,
            handlers::hooks::UploadInfo,
            handlers::hooks::HttpRequestInfo,
            handlers::hooks::HookResponseBody,
            handlers::hooks::HttpResponseInfo,
            handlers::hooks::FileInfoChanges,
            handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "hooks", description = "Upload server lifecycle hooks"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<HookDispatcher>,
    pub records: Arc<dyn StorageService>,
    pub config: HookConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/hooks", post(handlers::hooks::receive_hook))
        .route("/health", get(handlers::health::health_check))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
