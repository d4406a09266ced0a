use crate::services::intake::IntakeError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Bad Request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Intake(e @ IntakeError::UnsupportedType { .. }) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
            }
            AppError::Intake(e @ IntakeError::AccessDenied { .. }) => {
                (StatusCode::FORBIDDEN, e.to_string())
            }
            AppError::Intake(e @ IntakeError::CopyFailed { .. }) => {
                tracing::error!("Staging error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
