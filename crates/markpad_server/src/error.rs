//! HTTP error mapping for API handlers.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use markpad_core::AppError;
use serde_json::json;

/// Response wrapper turning [`AppError`] into a JSON error body.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl HttpError {
    /// Status code used for this error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_)
            | AppError::StorageMessage(_)
            | AppError::Serialization(_)
            | AppError::Json(_)
            | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            AppError::NotFound => "Not found".to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::RateLimited { .. } => self.0.to_string(),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                "AI provider request failed".to_string()
            }
            AppError::Unavailable(msg) => msg.clone(),
            AppError::Database(_) | AppError::StorageMessage(_) => {
                tracing::error!("Storage error: {}", self.0);
                "Database error".to_string()
            }
            _ => {
                tracing::error!("Internal error: {:?}", self.0);
                "Internal server error".to_string()
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let AppError::RateLimited { retry_after_secs } = self.0 {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
