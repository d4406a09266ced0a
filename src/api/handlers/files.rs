use crate::AppState;
use crate::api::error::AppError;
use crate::models::{FileReference, StagedFile};
use crate::services::relay::Delivery;
use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::ToSchema;

pub const FILE_RECEIVED_EVENT: &str = "fileReceived";

#[derive(Serialize, Deserialize, ToSchema)]
pub struct OpenFileRequest {
    /// Filesystem path or `file://` URL handed over by the OS
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryKind {
    Pushed,
    Held,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct OpenFileResponse {
    pub file: StagedFile,
    pub delivery: DeliveryKind,
    /// Staged path of a pending file this delivery replaced
    pub replaced: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PendingFileResponse {
    pub path: Option<String>,
}

#[utoipa::path(
    post,
    path = "/files/open",
    request_body = OpenFileRequest,
    responses(
        (status = 200, description = "File staged and handed off", body = OpenFileResponse),
        (status = 400, description = "Reference is not a local file"),
        (status = 403, description = "Access to the reference was refused"),
        (status = 415, description = "Extension not accepted"),
        (status = 500, description = "Copy into staging failed")
    ),
    tag = "files"
)]
pub async fn open_file(
    State(state): State<AppState>,
    Json(req): Json<OpenFileRequest>,
) -> Result<Json<OpenFileResponse>, AppError> {
    let reference = FileReference::parse(&req.reference)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid file reference: {}", req.reference)))?;

    let (file, delivery) = state.bridge.open_file(&reference).await?;

    let (delivery, replaced) = match delivery {
        Delivery::Pushed => (DeliveryKind::Pushed, None),
        Delivery::Held { replaced } => (
            DeliveryKind::Held,
            replaced.map(|old| old.staged_path_string()),
        ),
    };

    Ok(Json(OpenFileResponse {
        file,
        delivery,
        replaced,
    }))
}

#[utoipa::path(
    get,
    path = "/files/pending",
    responses(
        (status = 200, description = "The file waiting since startup, consumed by this call", body = PendingFileResponse)
    ),
    tag = "files"
)]
pub async fn pending_file(State(state): State<AppState>) -> Json<PendingFileResponse> {
    Json(PendingFileResponse {
        path: state.bridge.request_pending_file(),
    })
}

#[utoipa::path(
    get,
    path = "/files/events",
    responses(
        (status = 200, description = "Server-sent `fileReceived` events carrying staged paths", content_type = "text/event-stream", body = String)
    ),
    tag = "files"
)]
pub async fn file_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // The subscription lives inside the stream, so a client that goes away
    // hands every file it never received back to the relay.
    let mut subscription = state.bridge.register_receiver();

    let stream = async_stream::stream! {
        while let Some(file) = subscription.recv().await {
            yield Ok::<_, Infallible>(file_received(&file));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn file_received(file: &StagedFile) -> Event {
    Event::default()
        .event(FILE_RECEIVED_EVENT)
        .data(file.staged_path_string())
}
