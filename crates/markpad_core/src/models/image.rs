//! Uploaded image models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content types accepted by the image store.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Image bytes as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredImage {
    pub id: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Response body for `POST /api/images`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageUploadResponse {
    pub id: String,
    pub url: String,
}

impl StoredImage {
    pub fn new(content_type: String, bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content_type,
            bytes,
            created_at: Utc::now(),
        }
    }
}

/// Normalize a `Content-Type` value and check it against the allow-list.
///
/// # Returns
/// The bare lowercase media type when allowed.
pub fn normalize_image_type(raw: &str) -> Option<String> {
    let media = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES
        .contains(&media.as_str())
        .then_some(media)
}
