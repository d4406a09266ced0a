pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::services::bridge::FileBridge;
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
        api::handlers::health::health_check,
        api::handlers::files::open_file,
        api::handlers::files::pending_file,
        api::handlers::files::file_events,
        api::handlers::updates::check_for_updates,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::files::OpenFileRequest,
            api::handlers::files::OpenFileResponse,
            api::handlers::files::DeliveryKind,
            api::handlers::files::PendingFileResponse,
            models::StagedFile,
        )
    ),
    tags(
        (name = "files", description = "File handoff between the OS and the application"),
        (name = "system", description = "Health and update checks")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<FileBridge>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/files/open", post(api::handlers::files::open_file))
        .route("/files/pending", get(api::handlers::files::pending_file))
        .route("/files/events", get(api::handlers::files::file_events))
        .route("/updates/check", post(api::handlers::updates::check_for_updates))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
