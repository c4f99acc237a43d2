//! Snapshot-based undo/redo ledger for the document text.

use crate::constants::DEFAULT_HISTORY_LIMIT;
use std::collections::VecDeque;

/// Origin-tagged text update routed through the editing session.
///
/// Only [`TextChange::Edit`] is recorded; text restored by undo/redo travels
/// as [`TextChange::HistoryReplay`] so it never re-enters the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextChange {
    Edit(String),
    HistoryReplay(String),
}

impl TextChange {
    /// Borrow the carried text.
    pub fn text(&self) -> &str {
        match self {
            Self::Edit(text) | Self::HistoryReplay(text) => text.as_str(),
        }
    }

    /// Take ownership of the carried text.
    pub fn into_text(self) -> String {
        match self {
            Self::Edit(text) | Self::HistoryReplay(text) => text,
        }
    }
}

/// Bounded linear history of text snapshots with a movable cursor.
///
/// Invariants: the ledger is never empty, `cursor < len`, and no two
/// adjacent entries are equal.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    entries: VecDeque<String>,
    cursor: usize,
    limit: usize,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(String::new(), DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLedger {
    /// Create a ledger whose baseline is `initial`.
    ///
    /// A `limit` of zero is treated as one.
    pub fn new(initial: impl Into<String>, limit: usize) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(initial.into());
        Self {
            entries,
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record `text` as the newest entry, pruning any redo branch.
    ///
    /// # Returns
    /// `true` when an entry was appended, `false` when `text` duplicates the
    /// entry at the cursor.
    pub fn push_value(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.entries.get(self.cursor) == Some(&text) {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(text);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Route a tagged change: edits are pushed, replays are ignored.
    pub fn apply(&mut self, change: &TextChange) -> bool {
        match change {
            TextChange::Edit(text) => self.push_value(text.as_str()),
            TextChange::HistoryReplay(_) => false,
        }
    }

    /// Step back one entry.
    ///
    /// # Returns
    /// The entry now under the cursor, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step forward one entry.
    ///
    /// # Returns
    /// The entry now under the cursor, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Replace the whole ledger with a single baseline entry.
    pub fn reset_history(&mut self, value: impl Into<String>) {
        self.entries.clear();
        self.entries.push_back(value.into());
        self.cursor = 0;
    }

    /// Entry under the cursor.
    pub fn current(&self) -> &str {
        self.entries
            .get(self.cursor)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Iterate entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
