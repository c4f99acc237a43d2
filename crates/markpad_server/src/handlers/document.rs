//! Shared-document HTTP handlers.

use crate::{error::HttpError, models::document::*, naming, AppError, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use markpad_core::validation::{normalize_optional_nonempty, validate_document, validate_share_token};

/// Share a document, reusing an existing public row with identical content.
///
/// # Returns
/// `201 Created` for a new row, `200 OK` when an existing row was reused.
///
/// # Errors
/// Returns `400` for invalid input and `500` when persistence fails.
pub async fn create_document(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<CreateDocumentResponse>), HttpError> {
    let title = normalize_optional_nonempty(req.title);
    validate_document(title.as_deref(), &req.content, state.config.max_document_size)?;

    let title = title.unwrap_or_else(|| naming::title_for_content(&req.content));
    let (document, reused) = state.db.documents.create_or_reuse(title, req.content)?;
    tracing::info!(
        "Shared document {} (reused: {})",
        document.id,
        reused
    );

    let status = if reused {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(document.into_create_response(reused))))
}

/// Fetch a shared document by token.
///
/// # Errors
/// Returns `400` for malformed tokens and `404` for unknown ones.
pub async fn get_document(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicDocument>, HttpError> {
    validate_share_token(&token)?;
    let document = state
        .db
        .documents
        .get_by_token(&token)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(PublicDocument::from(&document)))
}
