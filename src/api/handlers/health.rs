use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub staging_dir: String,
    pub receiver_registered: bool,
    pub file_pending: bool,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Bridge health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let relay = state.bridge.relay();

    Json(HealthResponse {
        status: "ok".to_string(),
        staging_dir: state.bridge.intake().staging_dir().display().to_string(),
        receiver_registered: relay.is_receiver_registered(),
        file_pending: relay.has_pending(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
