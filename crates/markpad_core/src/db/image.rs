//! Image storage backed by redb.

use crate::{db::tables::IMAGES, error::AppError, models::image::StoredImage};
use redb::ReadableDatabase;
use std::sync::Arc;

/// Accessor for the image table.
pub struct ImageDb {
    db: Arc<redb::Database>,
}

impl ImageDb {
    /// Initialize the image table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(IMAGES)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Persist an uploaded image.
    ///
    /// # Errors
    /// Returns an error when serialization or storage fails.
    pub fn put(&self, image: &StoredImage) -> Result<(), AppError> {
        let encoded = bincode::serialize(image)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut images = write_txn.open_table(IMAGES)?;
            images.insert(image.id.as_str(), encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Fetch an image by id.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: &str) -> Result<Option<StoredImage>, AppError> {
        let read_txn = self.db.begin_read()?;
        let images = read_txn.open_table(IMAGES)?;
        match images.get(id)? {
            Some(value) => Ok(Some(bincode::deserialize(value.value())?)),
            None => Ok(None),
        }
    }
}
