//! Database layer for Markpad's shared documents and images.

/// Shared-document storage.
pub mod document;
/// Image storage.
pub mod image;
/// Table definitions.
pub mod tables;

#[cfg(test)]
mod tests;

use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;

/// Database handle with typed accessors over one redb file.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub documents: document::DocumentDb,
    pub images: image::ImageDb,
}

impl Database {
    /// Build a database handle from an existing shared redb instance.
    ///
    /// # Returns
    /// A new [`Database`] wrapper that shares the underlying redb instance.
    ///
    /// # Errors
    /// Returns an error if the required tables cannot be created.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, AppError> {
        Ok(Self {
            documents: document::DocumentDb::new(db.clone())?,
            images: image::ImageDb::new(db.clone())?,
            db,
        })
    }

    /// Clone this handle for another subsystem in the same process.
    ///
    /// redb allows one open handle per file, so a second `open` would fail.
    ///
    /// # Errors
    /// Returns an error if table initialization fails.
    pub fn share(&self) -> Result<Self, AppError> {
        Self::from_shared(self.db.clone())
    }

    /// Open (or create) the database inside the `path` directory.
    ///
    /// # Returns
    /// A fully initialized [`Database`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the file is held
    /// by another process, or tables cannot be initialized.
    pub fn new(path: &str) -> Result<Self, AppError> {
        let dir = Path::new(path);
        std::fs::create_dir_all(dir).map_err(|err| {
            AppError::StorageMessage(format!(
                "Failed to create database directory '{}': {}",
                dir.display(),
                err
            ))
        })?;
        let file = dir.join(tables::REDB_FILE_NAME);

        let db = match redb::Database::create(&file) {
            Ok(db) => Arc::new(db),
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                return Err(AppError::StorageMessage(format!(
                    "Database at '{}' is already open in another Markpad process.\n\
                    Stop the other instance, or set DB_PATH to a different location.",
                    file.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::debug!("Opened database at {}", file.display());
        Self::from_shared(db)
    }
}
