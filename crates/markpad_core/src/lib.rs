//! Core library for Markpad: editing state, storage, models and codecs.

/// AI generation wire types and stream codec.
pub mod ai;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Database access layer.
pub mod db;
/// Headless editing state.
pub mod editor;
/// Application error types (storage/domain).
pub mod error;
/// Locally saved documents and folders.
pub mod library;
/// Data models for API requests and persistence.
pub mod models;
/// Title and share-token helpers.
pub mod naming;
/// Input validation shared by server and CLI.
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use constants::{DEFAULT_CLI_SERVER_URL, DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_PORT};
pub use db::Database;
pub use error::AppError;
