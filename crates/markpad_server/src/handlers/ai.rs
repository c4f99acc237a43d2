//! AI generation stream endpoint.

use crate::{error::HttpError, AppState};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use markpad_core::ai::GenerateRequest;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};

/// Stream generated Markdown as `data: {content?, done?, error?}` events.
///
/// # Errors
/// Returns `400` for invalid requests and `503` when generation is not
/// configured. Failures after the stream starts arrive as `error` frames.
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, HttpError> {
    req.validate(state.config.max_document_size)?;
    let frames = state.generator.generate(req)?;
    let events = ReceiverStream::new(frames).map(|frame| Event::default().json_data(frame));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
