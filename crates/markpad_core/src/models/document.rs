//! Shared-document models for the REST backend.

use crate::naming;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared document row stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub share_token: String,
    pub content_hash: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for sharing a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

/// Dedupe outcome attached to create responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeta {
    pub is_reused: bool,
    pub message: String,
}

/// Response body for `POST /api/documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "_meta")]
    pub meta: CreateMeta,
}

/// Document as served to anyone holding its share token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hex blake3 digest used for exact-content dedupe.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

impl Document {
    /// Create a new public document with a fresh id and share token.
    pub fn new(title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content_hash: content_hash(&content),
            content,
            share_token: naming::generate_share_token(),
            is_public: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build the create response for this row.
    pub fn into_create_response(self, is_reused: bool) -> CreateDocumentResponse {
        let message = if is_reused {
            "Identical content was already shared; reusing the existing link".to_string()
        } else {
            "Document shared".to_string()
        };
        CreateDocumentResponse {
            id: self.id,
            title: self.title,
            content: self.content,
            share_token: self.share_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
            meta: CreateMeta { is_reused, message },
        }
    }
}

impl From<&Document> for PublicDocument {
    fn from(value: &Document) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            content: value.content.clone(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
