//! Durable key-value slots for drafts and the local library.
//!
//! Every implementation tolerates failure: reads return `None` and writes
//! return `false` instead of erroring, so callers can degrade silently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Minimal durable key-value slot.
pub trait DraftStore {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`; `false` when the write did not happen.
    fn set(&mut self, key: &str, value: &str) -> bool;
    /// Delete `key`; `false` when nothing could be removed.
    fn remove(&mut self, key: &str) -> bool;
}

/// In-process store, optionally with a byte quota per value.
#[derive(Debug, Default, Clone)]
pub struct MemoryDraftStore {
    values: HashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any value longer than `quota` bytes, like a full browser store.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        if self.quota.is_some_and(|quota| value.len() > quota) {
            return false;
        }
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        true
    }

    fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }
}

/// Store used where no durable storage exists (headless rendering, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDraftStore;

impl DraftStore for UnavailableDraftStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, _key: &str, _value: &str) -> bool {
        false
    }

    fn remove(&mut self, _key: &str) -> bool {
        false
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    /// Bind the store to `dir`; the directory is created lazily on write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.slot", file_name))
    }
}

impl DraftStore for FileDraftStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        let path = self.path_for(key);
        let tmp_path = path.with_extension("slot.tmp");
        let result = std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(&tmp_path, value))
            .and_then(|_| std::fs::rename(&tmp_path, &path));
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Failed to write slot '{}': {}", key, err);
                let _ = std::fs::remove_file(&tmp_path);
                false
            }
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        std::fs::remove_file(self.path_for(key)).is_ok()
    }
}
