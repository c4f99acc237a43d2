//! Image upload and retrieval handlers.

use crate::{error::HttpError, models::image::*, AppError, AppState};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// Store a raw `image/*` request body.
///
/// # Returns
/// `201 Created` with the image id and its public URL.
///
/// # Errors
/// Returns `400` for missing/unsupported types, empty or oversized bodies.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ImageUploadResponse>), HttpError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(normalize_image_type)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Unsupported image type; expected one of {}",
                ALLOWED_IMAGE_TYPES.join(", ")
            ))
        })?;
    if body.is_empty() {
        return Err(AppError::BadRequest("Image body is empty".to_string()).into());
    }
    if body.len() > state.config.max_image_size {
        return Err(AppError::BadRequest(format!(
            "Image exceeds maximum size of {} bytes",
            state.config.max_image_size
        ))
        .into());
    }

    let image = StoredImage::new(content_type, body.to_vec());
    state.db.images.put(&image)?;
    tracing::info!("Stored image {} ({} bytes)", image.id, image.bytes.len());

    let url = format!("{}/api/images/{}", state.config.public_base_url, image.id);
    Ok((
        StatusCode::CREATED,
        Json(ImageUploadResponse { id: image.id, url }),
    ))
}

/// Serve stored image bytes.
///
/// # Errors
/// Returns `404` for unknown ids.
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let image = state.db.images.get(&id)?.ok_or(AppError::NotFound)?;
    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=31536000, immutable"),
            ),
        ],
        image.bytes,
    )
        .into_response())
}
