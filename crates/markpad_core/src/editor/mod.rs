//! Headless editing state core: history, autosave, scroll sync, toolbar edits.

/// Debounced draft persistence.
pub mod autosave;
/// Durable key-value slots.
pub mod draft;
/// Snapshot undo/redo ledger.
pub mod history;
/// Pure toolbar text mutations.
pub mod mutation;
/// Proportional pane scroll synchronization.
pub mod scroll;
/// Session tying the pieces together.
pub mod session;

pub use autosave::Autosave;
pub use draft::{DraftStore, FileDraftStore, MemoryDraftStore, UnavailableDraftStore};
pub use history::{HistoryLedger, TextChange};
pub use mutation::{Mutation, Selection, ToolbarAction};
pub use scroll::{PaneMetrics, ScrollPane, ScrollSync};
pub use session::{EditingSession, Feature, FeatureErrors, PendingSelection, SaveIndicator};

use crate::constants::{DEFAULT_AUTOSAVE_DELAY_MS, DEFAULT_HISTORY_LIMIT, DEFAULT_SCROLL_GUARD_MS};
use std::time::Duration;

/// Tunables for an [`EditingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    pub history_limit: usize,
    pub autosave_delay: Duration,
    pub scroll_guard_delay: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            autosave_delay: Duration::from_millis(DEFAULT_AUTOSAVE_DELAY_MS),
            scroll_guard_delay: Duration::from_millis(DEFAULT_SCROLL_GUARD_MS),
        }
    }
}
