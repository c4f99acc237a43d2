//! HTTP request handlers.

/// AI generation stream endpoint.
pub mod ai;
/// Shared-document endpoints.
pub mod document;
/// Image upload and retrieval endpoints.
pub mod image;
