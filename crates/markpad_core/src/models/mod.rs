//! Data models for API requests and persistence.

/// Shared documents.
pub mod document;
/// Uploaded images.
pub mod image;
