//! Locally saved documents and folders.
//!
//! The library lives in a single durable slot as versioned JSON. Older
//! shapes are migrated when read; missing fields take their defaults.

use crate::constants::LIBRARY_STORAGE_KEY;
use crate::editor::DraftStore;
use crate::error::AppError;
use crate::naming;
use crate::validation::normalize_optional_nonempty;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// Current on-disk schema version.
pub const LIBRARY_SCHEMA_VERSION: u32 = 2;

/// A document saved to the local library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDocument {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// A flat folder grouping saved documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct LibraryFile {
    version: u32,
    documents: Vec<SavedDocument>,
    folders: Vec<Folder>,
}

/// In-memory view of the library slot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Library {
    documents: Vec<SavedDocument>,
    folders: Vec<Folder>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and migrate the library from `store`.
    ///
    /// A missing slot yields an empty library; unreadable JSON is logged and
    /// also treated as empty.
    pub fn load(store: &dyn DraftStore) -> Self {
        let Some(raw) = store.get(LIBRARY_STORAGE_KEY) else {
            return Self::default();
        };
        match Self::from_json(&raw) {
            Ok(library) => library,
            Err(err) => {
                tracing::warn!("Discarding unreadable library slot: {}", err);
                Self::default()
            }
        }
    }

    /// Parse any known library shape.
    ///
    /// Version 0 stored a bare array of documents. Version 1 had no folder
    /// support, so `folder_id` is absent. Entries are migrated one at a time:
    /// a missing id is regenerated and an entry that still cannot be read is
    /// skipped. References to folders that no longer exist are cleared.
    ///
    /// # Errors
    /// Returns [`AppError::Json`] when the payload is not JSON and
    /// [`AppError::StorageMessage`] when it is neither an array nor an object.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(raw)?;
        let (version, documents, folders) = match value {
            Value::Array(documents) => (0, documents, Vec::new()),
            Value::Object(mut fields) => {
                let version = fields.get("version").and_then(Value::as_u64).unwrap_or(0);
                (
                    version,
                    take_entries(&mut fields, "documents"),
                    take_entries(&mut fields, "folders"),
                )
            }
            _ => {
                return Err(AppError::StorageMessage(
                    "Library slot holds an unknown shape".to_string(),
                ))
            }
        };

        if version < u64::from(LIBRARY_SCHEMA_VERSION) {
            tracing::info!(
                "Migrating library from schema v{} to v{}",
                version,
                LIBRARY_SCHEMA_VERSION
            );
        }

        let mut library = Self {
            documents: documents
                .into_iter()
                .filter_map(|entry| migrate_entry::<SavedDocument>("document", entry))
                .collect(),
            folders: folders
                .into_iter()
                .filter_map(|entry| migrate_entry::<Folder>("folder", entry))
                .collect(),
        };
        let known: HashSet<String> = library.folders.iter().map(|f| f.id.clone()).collect();
        for doc in &mut library.documents {
            if doc
                .folder_id
                .as_ref()
                .is_some_and(|folder_id| !known.contains(folder_id))
            {
                doc.folder_id = None;
            }
            if doc.title.trim().is_empty() {
                doc.title = naming::title_for_content(&doc.content);
            }
        }
        Ok(library)
    }

    /// Serialize in the current schema.
    ///
    /// # Errors
    /// Returns [`AppError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, AppError> {
        let file = LibraryFile {
            version: LIBRARY_SCHEMA_VERSION,
            documents: self.documents.clone(),
            folders: self.folders.clone(),
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// Write the library back to `store`.
    ///
    /// # Returns
    /// `false` when the slot rejected the write.
    pub fn persist(&self, store: &mut dyn DraftStore) -> bool {
        match self.to_json() {
            Ok(json) => store.set(LIBRARY_STORAGE_KEY, &json),
            Err(err) => {
                tracing::warn!("Failed to encode library: {}", err);
                false
            }
        }
    }

    /// Save a new document, deriving a title when none is given.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when `folder_id` names no folder.
    pub fn save_document(
        &mut self,
        title: Option<String>,
        content: String,
        folder_id: Option<String>,
    ) -> Result<&SavedDocument, AppError> {
        if let Some(folder_id) = folder_id.as_deref() {
            self.ensure_folder(folder_id)?;
        }
        let now = Utc::now();
        let title =
            normalize_optional_nonempty(title).unwrap_or_else(|| naming::title_for_content(&content));
        self.documents.push(SavedDocument {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            folder_id,
            created_at: now,
            updated_at: now,
        });
        let index = self.documents.len() - 1;
        Ok(&self.documents[index])
    }

    /// Update title and/or content of a saved document.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids.
    pub fn update_document(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<&SavedDocument, AppError> {
        let doc = self
            .documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or(AppError::NotFound)?;
        if let Some(title) = normalize_optional_nonempty(title) {
            doc.title = title;
        }
        if let Some(content) = content {
            doc.content = content;
        }
        doc.updated_at = Utc::now();
        Ok(&*doc)
    }

    /// Remove a saved document.
    ///
    /// # Returns
    /// `true` when a document was removed.
    pub fn delete_document(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.id != id);
        self.documents.len() != before
    }

    /// Move a document into `folder_id`, or out of any folder with `None`.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for an unknown document or folder.
    pub fn move_document(&mut self, id: &str, folder_id: Option<&str>) -> Result<(), AppError> {
        if let Some(folder_id) = folder_id {
            self.ensure_folder(folder_id)?;
        }
        let doc = self
            .documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or(AppError::NotFound)?;
        doc.folder_id = folder_id.map(str::to_string);
        doc.updated_at = Utc::now();
        Ok(())
    }

    /// Create a folder.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for a blank or duplicate name.
    pub fn create_folder(&mut self, name: &str) -> Result<&Folder, AppError> {
        let name = self.checked_folder_name(name, None)?;
        self.folders.push(Folder {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
        });
        let index = self.folders.len() - 1;
        Ok(&self.folders[index])
    }

    /// Rename a folder.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids and
    /// [`AppError::BadRequest`] for a blank or duplicate name.
    pub fn rename_folder(&mut self, id: &str, name: &str) -> Result<(), AppError> {
        self.ensure_folder(id)?;
        let name = self.checked_folder_name(name, Some(id))?;
        if let Some(folder) = self.folders.iter_mut().find(|folder| folder.id == id) {
            folder.name = name;
        }
        Ok(())
    }

    /// Delete a folder; its documents fall back to "no folder".
    ///
    /// # Returns
    /// The number of documents that were unfiled.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] for unknown ids.
    pub fn delete_folder(&mut self, id: &str) -> Result<usize, AppError> {
        self.ensure_folder(id)?;
        self.folders.retain(|folder| folder.id != id);
        let mut unfiled = 0;
        for doc in &mut self.documents {
            if doc.folder_id.as_deref() == Some(id) {
                doc.folder_id = None;
                unfiled += 1;
            }
        }
        Ok(unfiled)
    }

    /// Documents in `folder_id` (or unfiled for `None`), newest first.
    pub fn documents_in(&self, folder_id: Option<&str>) -> Vec<&SavedDocument> {
        let mut docs: Vec<&SavedDocument> = self
            .documents
            .iter()
            .filter(|doc| doc.folder_id.as_deref() == folder_id)
            .collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        docs
    }

    /// Folders sorted by name.
    pub fn list_folders(&self) -> Vec<&Folder> {
        let mut folders: Vec<&Folder> = self.folders.iter().collect();
        folders.sort_by_key(|folder| folder.name.to_lowercase());
        folders
    }

    pub fn get_document(&self, id: &str) -> Option<&SavedDocument> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    pub fn documents(&self) -> &[SavedDocument] {
        &self.documents
    }

    fn ensure_folder(&self, id: &str) -> Result<(), AppError> {
        if self.folders.iter().any(|folder| folder.id == id) {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    fn checked_folder_name(&self, name: &str, exclude_id: Option<&str>) -> Result<String, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Folder name must not be empty".to_string()));
        }
        let duplicate = self.folders.iter().any(|folder| {
            Some(folder.id.as_str()) != exclude_id && folder.name.eq_ignore_ascii_case(name)
        });
        if duplicate {
            return Err(AppError::BadRequest(format!(
                "A folder named '{}' already exists",
                name
            )));
        }
        Ok(name.to_string())
    }
}

fn take_entries(fields: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match fields.remove(key) {
        Some(Value::Array(entries)) => entries,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => {
            tracing::warn!("Ignoring library '{}' that is not a list", key);
            Vec::new()
        }
    }
}

fn migrate_entry<T: DeserializeOwned>(kind: &str, mut entry: Value) -> Option<T> {
    let Some(fields) = entry.as_object_mut() else {
        tracing::warn!("Skipping library {} that is not an object", kind);
        return None;
    };
    let has_id = fields
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !has_id {
        fields.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    match serde_json::from_value(entry) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!("Skipping unreadable library {}: {}", kind, err);
            None
        }
    }
}
