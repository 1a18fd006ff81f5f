use crate::dtos::{UploadAccepted, UploadRequest, UploadStatusResponse};
use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{Stream, StreamExt};
use service_core::error::AppError;
use std::convert::Infallible;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

pub async fn submit_upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.pipeline.submit(req.title, req.description)?;

    tracing::info!(submission_id = %handle.id(), "Upload accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadAccepted {
            submission_id: handle.id(),
        }),
    ))
}

pub async fn upload_status(State(state): State<AppState>) -> Json<UploadStatusResponse> {
    Json(UploadStatusResponse {
        is_uploading: state.pipeline.uploading(),
    })
}

/// Streams terminal events fired after the client connected. The stream ends
/// when the service shuts down.
pub async fn upload_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = BroadcastStream::new(state.pipeline.terminal_events()).filter_map(
        |item| async move {
            match item {
                Ok(event) => match Event::default().event("terminal").json_data(&event) {
                    Ok(sse) => Some(Ok(sse)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode upload event");
                        None
                    }
                },
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Upload event subscriber lagged");
                    None
                }
            }
        },
    );

    let events = events.take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(events).keep_alive(KeepAlive::default())
}
