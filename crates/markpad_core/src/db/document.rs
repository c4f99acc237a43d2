//! Shared-document storage backed by redb.

use crate::{db::tables::*, error::AppError, models::document::*};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use std::sync::Arc;

/// Token regeneration attempts before giving up on a collision streak.
const MAX_TOKEN_ATTEMPTS: usize = 8;

/// Accessor for document tables.
pub struct DocumentDb {
    db: Arc<redb::Database>,
}

fn deserialize_document(bytes: &[u8]) -> Result<Document, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

impl DocumentDb {
    /// Initialize document tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(DOCUMENTS)?;
        write_txn.open_table(DOCUMENTS_BY_TOKEN)?;
        write_txn.open_table(DOCUMENTS_BY_HASH)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Store a new public document, or return the existing public document
    /// with byte-identical content.
    ///
    /// Lookup and insert run in one write transaction, so concurrent shares
    /// of the same content resolve to a single row.
    ///
    /// # Arguments
    /// - `title`: Title for a newly created row.
    /// - `content`: Markdown body.
    ///
    /// # Returns
    /// The stored document and whether it was reused.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn create_or_reuse(
        &self,
        title: String,
        content: String,
    ) -> Result<(Document, bool), AppError> {
        let hash = content_hash(&content);
        let write_txn = self.db.begin_write()?;
        let document = {
            let mut documents = write_txn.open_table(DOCUMENTS)?;
            let mut by_token = write_txn.open_table(DOCUMENTS_BY_TOKEN)?;
            let mut by_hash = write_txn.open_table(DOCUMENTS_BY_HASH)?;

            let existing_id = by_hash
                .get(hash.as_str())?
                .map(|guard| guard.value().to_string());
            if let Some(existing_id) = existing_id {
                if let Some(guard) = documents.get(existing_id.as_str())? {
                    let existing = deserialize_document(guard.value())?;
                    if existing.is_public && existing.content == content {
                        tracing::debug!("Reusing document {} for identical content", existing.id);
                        return Ok((existing, true));
                    }
                }
            }

            let mut document = Document::new(title, content);
            let mut attempts = 1;
            while by_token.get(document.share_token.as_str())?.is_some() {
                if attempts >= MAX_TOKEN_ATTEMPTS {
                    return Err(AppError::StorageMessage(
                        "Could not allocate a unique share token".to_string(),
                    ));
                }
                document.share_token = crate::naming::generate_share_token();
                attempts += 1;
            }

            let encoded = bincode::serialize(&document)?;
            documents.insert(document.id.as_str(), encoded.as_slice())?;
            by_token.insert(document.share_token.as_str(), document.id.as_str())?;
            by_hash.insert(document.content_hash.as_str(), document.id.as_str())?;
            document
        };
        write_txn.commit()?;
        Ok((document, false))
    }

    /// Fetch a public document by share token.
    ///
    /// # Returns
    /// `Ok(None)` when the token is unknown or the document is not public.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get_by_token(&self, token: &str) -> Result<Option<Document>, AppError> {
        let read_txn = self.db.begin_read()?;
        let by_token = read_txn.open_table(DOCUMENTS_BY_TOKEN)?;
        let Some(id_guard) = by_token.get(token)? else {
            return Ok(None);
        };
        let id = id_guard.value().to_string();
        drop(id_guard);

        let documents = read_txn.open_table(DOCUMENTS)?;
        match documents.get(id.as_str())? {
            Some(value) => {
                let document = deserialize_document(value.value())?;
                Ok(document.is_public.then_some(document))
            }
            None => Ok(None),
        }
    }

    /// Fetch a document by id regardless of visibility.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: &str) -> Result<Option<Document>, AppError> {
        let read_txn = self.db.begin_read()?;
        let documents = read_txn.open_table(DOCUMENTS)?;
        match documents.get(id)? {
            Some(value) => Ok(Some(deserialize_document(value.value())?)),
            None => Ok(None),
        }
    }

    /// Number of stored documents.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn count(&self) -> Result<u64, AppError> {
        let read_txn = self.db.begin_read()?;
        let documents = read_txn.open_table(DOCUMENTS)?;
        Ok(documents.len()?)
    }
}
