//! Trailing-edge debounced persistence of the draft text.
//!
//! The owner feeds every new text value through [`Autosave::schedule`] and
//! drives time with [`Autosave::poll`]; a write happens only once the text has
//! been quiet for the configured delay.

use super::draft::DraftStore;
use crate::constants::{DEFAULT_AUTOSAVE_DELAY_MS, DRAFT_STORAGE_KEY};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct PendingWrite {
    value: String,
    due: Instant,
}

/// Debounced writer for a single durable slot.
#[derive(Debug, Clone)]
pub struct Autosave {
    key: String,
    delay: Duration,
    pending: Option<PendingWrite>,
    last_saved: Option<DateTime<Utc>>,
    hydrated: bool,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new(
            DRAFT_STORAGE_KEY,
            Duration::from_millis(DEFAULT_AUTOSAVE_DELAY_MS),
        )
    }
}

fn saved_at_key(key: &str) -> String {
    format!("{}:saved-at", key)
}

impl Autosave {
    pub fn new(key: impl Into<String>, delay: Duration) -> Self {
        Self {
            key: key.into(),
            delay,
            pending: None,
            last_saved: None,
            hydrated: false,
        }
    }

    /// Queue `value`, replacing and restarting any pending write.
    pub fn schedule(&mut self, value: impl Into<String>, now: Instant) {
        self.pending = Some(PendingWrite {
            value: value.into(),
            due: now + self.delay,
        });
    }

    /// Perform the pending write when its quiet period has elapsed.
    ///
    /// # Returns
    /// `true` when a write succeeded during this poll.
    pub fn poll(&mut self, store: &mut dyn DraftStore, now: Instant) -> bool {
        let due = match &self.pending {
            Some(pending) => pending.due <= now,
            None => false,
        };
        if !due {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.write(store, pending.value.as_str())
    }

    /// Write `value` immediately, dropping any pending debounced write.
    pub fn save_now(&mut self, store: &mut dyn DraftStore, value: &str) -> bool {
        self.pending = None;
        self.write(store, value)
    }

    /// Remove the persisted draft and forget the last-saved time.
    pub fn clear(&mut self, store: &mut dyn DraftStore) {
        self.pending = None;
        self.last_saved = None;
        store.remove(self.key.as_str());
        store.remove(saved_at_key(self.key.as_str()).as_str());
    }

    /// Drop the pending write without persisting it (surface teardown).
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Read the persisted draft; only the first call reads the store.
    pub fn hydrate(&mut self, store: &dyn DraftStore) -> Option<String> {
        if self.hydrated {
            return None;
        }
        self.hydrated = true;
        let value = store.get(self.key.as_str())?;
        self.last_saved = store
            .get(saved_at_key(self.key.as_str()).as_str())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
            .map(|stamp| stamp.with_timezone(&Utc));
        Some(value)
    }

    fn write(&mut self, store: &mut dyn DraftStore, value: &str) -> bool {
        if !store.set(self.key.as_str(), value) {
            tracing::warn!(
                "Draft write to '{}' failed; keeping previous save state",
                self.key
            );
            return false;
        }
        let now = Utc::now();
        // The timestamp is advisory; a failed stamp write does not undo the save.
        store.set(saved_at_key(self.key.as_str()).as_str(), &now.to_rfc3339());
        self.last_saved = Some(now);
        tracing::debug!("Draft saved to '{}' ({} bytes)", self.key, value.len());
        true
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Instant at which the pending write becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
