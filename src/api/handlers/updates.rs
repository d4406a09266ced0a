use crate::AppState;
use axum::{extract::State, http::StatusCode};

#[utoipa::path(
    post,
    path = "/updates/check",
    responses(
        (status = 202, description = "Update check triggered")
    ),
    tag = "system"
)]
pub async fn check_for_updates(State(state): State<AppState>) -> StatusCode {
    state.bridge.trigger_update_check();
    StatusCode::ACCEPTED
}
