//! The editing session: single owner of the document text.
//!
//! Every text change flows through [`EditingSession::set_text`], which is the
//! only path feeding both the history ledger and the autosave debouncer.

use super::autosave::Autosave;
use super::draft::DraftStore;
use super::history::{HistoryLedger, TextChange};
use super::mutation::{image_markdown, insert_at_cursor, select_all, Selection, ToolbarAction};
use super::scroll::ScrollSync;
use super::EditorSettings;
use crate::ai::{ApplyMode, GenerationBuffer};
use crate::constants::DRAFT_STORAGE_KEY;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// Selection to restore once the surface has rendered `revision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSelection {
    pub revision: u64,
    pub selection: Selection,
}

/// Network-backed features that own a user-visible error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Share,
    Generate,
    Load,
}

/// One error slot per network-backed feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureErrors {
    pub share: Option<String>,
    pub generate: Option<String>,
    pub load: Option<String>,
}

impl FeatureErrors {
    fn slot_mut(&mut self, feature: Feature) -> &mut Option<String> {
        match feature {
            Feature::Share => &mut self.share,
            Feature::Generate => &mut self.generate,
            Feature::Load => &mut self.load,
        }
    }

    pub fn get(&self, feature: Feature) -> Option<&str> {
        match feature {
            Feature::Share => self.share.as_deref(),
            Feature::Generate => self.generate.as_deref(),
            Feature::Load => self.load.as_deref(),
        }
    }
}

/// Save state shown next to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIndicator {
    NeverSaved,
    Pending,
    SavedAt(DateTime<Utc>),
}

/// Editing state manager for one document surface.
pub struct EditingSession<S: DraftStore> {
    text: String,
    revision: u64,
    selection: Selection,
    pending_selection: Option<PendingSelection>,
    history: HistoryLedger,
    autosave: Autosave,
    scroll: ScrollSync,
    store: S,
    ready: bool,
    surface_attached: bool,
    errors: FeatureErrors,
}

impl<S: DraftStore> EditingSession<S> {
    /// Create a session seeded with `initial` text.
    ///
    /// The durable store is not touched until [`Self::mark_ready`].
    pub fn new(initial: impl Into<String>, store: S, settings: EditorSettings) -> Self {
        let text = initial.into();
        Self {
            history: HistoryLedger::new(text.clone(), settings.history_limit),
            autosave: Autosave::new(DRAFT_STORAGE_KEY, settings.autosave_delay),
            scroll: ScrollSync::new(settings.scroll_guard_delay),
            text,
            revision: 0,
            selection: Selection::default(),
            pending_selection: None,
            store,
            ready: false,
            surface_attached: false,
            errors: FeatureErrors::default(),
        }
    }

    /// Signal that the interactive environment is up and hydrate the draft.
    ///
    /// A persisted draft replaces the seed text and becomes the new undo
    /// baseline. Only the first call has any effect.
    ///
    /// # Returns
    /// `true` when a persisted draft was loaded.
    pub fn mark_ready(&mut self) -> bool {
        if self.ready {
            return false;
        }
        self.ready = true;
        let Some(draft) = self.autosave.hydrate(&self.store) else {
            return false;
        };
        tracing::debug!("Hydrated draft ({} bytes)", draft.len());
        self.history.reset_history(draft.clone());
        if draft != self.text {
            self.replace_text(draft);
        }
        true
    }

    /// Apply a tagged text change.
    ///
    /// # Returns
    /// `true` when the document text changed.
    pub fn set_text(&mut self, change: TextChange, now: Instant) -> bool {
        self.history.apply(&change);
        let text = change.into_text();
        if text == self.text {
            return false;
        }
        self.replace_text(text);
        if self.ready {
            self.autosave.schedule(self.text.clone(), now);
        }
        true
    }

    /// Record a user edit (keystroke, paste, ...).
    pub fn edit(&mut self, text: impl Into<String>, now: Instant) -> bool {
        self.set_text(TextChange::Edit(text.into()), now)
    }

    fn replace_text(&mut self, text: String) {
        self.text = text;
        self.revision += 1;
        self.selection = self.selection.clamped(self.text.chars().count());
    }

    /// Restore the previous history entry.
    pub fn undo(&mut self, now: Instant) -> bool {
        let Some(previous) = self.history.undo().map(str::to_string) else {
            return false;
        };
        self.set_text(TextChange::HistoryReplay(previous), now);
        true
    }

    /// Restore the next history entry.
    pub fn redo(&mut self, now: Instant) -> bool {
        let Some(next) = self.history.redo().map(str::to_string) else {
            return false;
        };
        self.set_text(TextChange::HistoryReplay(next), now);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Mark the editing surface as mounted.
    pub fn attach_surface(&mut self) {
        self.surface_attached = true;
    }

    /// Tear down the surface: pending writes and selections are dropped.
    pub fn detach_surface(&mut self) {
        self.surface_attached = false;
        self.pending_selection = None;
        self.autosave.cancel();
    }

    /// Selection reported by the surface.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamped(self.text.chars().count());
    }

    /// Run a toolbar edit against the current selection.
    ///
    /// # Returns
    /// The selection to restore after the new text renders, or `None` when no
    /// surface is attached.
    pub fn apply_toolbar(&mut self, action: ToolbarAction, now: Instant) -> Option<PendingSelection> {
        if !self.surface_attached {
            return None;
        }
        let mutation = action.apply(&self.text, self.selection);
        self.commit_mutation(mutation.text, mutation.selection, now)
    }

    /// Insert arbitrary text at the caret.
    pub fn insert_text(&mut self, insert: &str, now: Instant) -> Option<PendingSelection> {
        if !self.surface_attached {
            return None;
        }
        let mutation = insert_at_cursor(&self.text, self.selection, insert);
        self.commit_mutation(mutation.text, mutation.selection, now)
    }

    /// Insert a Markdown image link for an uploaded image.
    pub fn insert_image(&mut self, alt: &str, url: &str, now: Instant) -> Option<PendingSelection> {
        self.insert_text(&image_markdown(alt, url), now)
    }

    /// Select the whole document.
    pub fn select_all(&mut self) -> Option<PendingSelection> {
        if !self.surface_attached {
            return None;
        }
        let pending = PendingSelection {
            revision: self.revision,
            selection: select_all(&self.text),
        };
        self.pending_selection = Some(pending);
        Some(pending)
    }

    fn commit_mutation(
        &mut self,
        text: String,
        selection: Selection,
        now: Instant,
    ) -> Option<PendingSelection> {
        self.set_text(TextChange::Edit(text), now);
        let pending = PendingSelection {
            revision: self.revision,
            selection,
        };
        self.pending_selection = Some(pending);
        Some(pending)
    }

    /// Post-render hook: the surface has committed `revision` to screen.
    ///
    /// # Returns
    /// The selection to apply (with focus) if one was waiting for exactly this
    /// revision. A pending selection for an older revision is discarded.
    pub fn on_render_committed(&mut self, revision: u64) -> Option<Selection> {
        let pending = self.pending_selection?;
        if pending.revision > revision {
            return None;
        }
        self.pending_selection = None;
        if pending.revision < revision {
            return None;
        }
        self.selection = pending.selection;
        Some(pending.selection)
    }

    /// Commit generated content as a regular edit.
    pub fn apply_generated(
        &mut self,
        buffer: &GenerationBuffer,
        mode: ApplyMode,
        now: Instant,
    ) -> bool {
        if buffer.content().is_empty() {
            return false;
        }
        let next = buffer.applied_to(&self.text, mode);
        let changed = self.edit(next, now);
        if changed {
            self.selection = Selection::caret(self.text.chars().count());
        }
        changed
    }

    /// Drive the debounce timer.
    ///
    /// # Returns
    /// `true` when the draft was written.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.ready {
            return false;
        }
        self.autosave.poll(&mut self.store, now)
    }

    /// Explicit save command.
    pub fn save_now(&mut self) -> bool {
        if !self.ready {
            return false;
        }
        self.autosave.save_now(&mut self.store, &self.text)
    }

    /// Forget the persisted draft.
    pub fn clear_draft(&mut self) {
        self.autosave.clear(&mut self.store);
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.autosave.last_saved()
    }

    pub fn save_indicator(&self) -> SaveIndicator {
        if self.autosave.is_pending() {
            return SaveIndicator::Pending;
        }
        match self.autosave.last_saved() {
            Some(stamp) => SaveIndicator::SavedAt(stamp),
            None => SaveIndicator::NeverSaved,
        }
    }

    pub fn set_error(&mut self, feature: Feature, message: impl Into<String>) {
        *self.errors.slot_mut(feature) = Some(message.into());
    }

    pub fn clear_error(&mut self, feature: Feature) {
        *self.errors.slot_mut(feature) = None;
    }

    pub fn errors(&self) -> &FeatureErrors {
        &self.errors
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn pending_selection(&self) -> Option<PendingSelection> {
        self.pending_selection
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn scroll_sync(&mut self) -> &mut ScrollSync {
        &mut self.scroll
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StreamFrame;
    use crate::editor::draft::MemoryDraftStore;
    use crate::editor::scroll::PaneMetrics;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn ready_session(initial: &str) -> EditingSession<MemoryDraftStore> {
        let mut session =
            EditingSession::new(initial, MemoryDraftStore::new(), EditorSettings::default());
        session.mark_ready();
        session.attach_surface();
        session
    }

    #[test]
    fn edits_feed_history_and_debounced_save() {
        let mut session = ready_session("");
        let t0 = Instant::now();
        session.edit("a", t0);
        session.edit("ab", t0 + ms(100));
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.save_indicator(), SaveIndicator::Pending);

        assert!(!session.poll(t0 + ms(1_000)));
        assert!(session.poll(t0 + ms(1_100)));
        assert_eq!(
            session.store().get(DRAFT_STORAGE_KEY).as_deref(),
            Some("ab")
        );
        assert!(matches!(session.save_indicator(), SaveIndicator::SavedAt(_)));
    }

    #[test]
    fn undo_redo_replays_without_recording() {
        let mut session = ready_session("v1");
        let t0 = Instant::now();
        session.edit("v2", t0);
        session.edit("v3", t0);
        assert!(session.undo(t0));
        assert!(session.undo(t0));
        assert!(!session.undo(t0));
        assert_eq!(session.text(), "v1");
        assert!(session.redo(t0));
        assert_eq!(session.text(), "v2");
        assert_eq!(session.history().len(), 3);
        assert!(session.can_redo());
    }

    #[test]
    fn hydration_resets_undo_baseline_once() {
        let mut store = MemoryDraftStore::new();
        store.set(DRAFT_STORAGE_KEY, "# Saved draft");
        let mut session = EditingSession::new("# Default", store, EditorSettings::default());
        assert_eq!(session.text(), "# Default");

        assert!(session.mark_ready());
        assert_eq!(session.text(), "# Saved draft");
        assert!(!session.can_undo());
        assert!(!session.mark_ready());
    }

    #[test]
    fn edits_before_ready_do_not_touch_storage() {
        let mut store = MemoryDraftStore::new();
        store.set(DRAFT_STORAGE_KEY, "persisted");
        let mut session = EditingSession::new("seed", store, EditorSettings::default());
        let t0 = Instant::now();
        session.edit("typed early", t0);
        assert!(!session.poll(t0 + ms(5_000)));
        assert!(!session.save_now());
        assert_eq!(
            session.store().get(DRAFT_STORAGE_KEY).as_deref(),
            Some("persisted")
        );
    }

    #[test]
    fn toolbar_is_noop_without_surface() {
        let mut session =
            EditingSession::new("hello", MemoryDraftStore::new(), EditorSettings::default());
        session.mark_ready();
        assert_eq!(
            session.apply_toolbar(ToolbarAction::Bold, Instant::now()),
            None
        );
        assert_eq!(session.select_all(), None);
        assert_eq!(session.text(), "hello");
    }

    #[test]
    fn selection_is_applied_only_after_matching_render() {
        let mut session = ready_session("hello");
        session.set_selection(Selection::new(1, 4));
        let pending = session
            .apply_toolbar(ToolbarAction::Bold, Instant::now())
            .expect("surface attached");
        assert_eq!(session.text(), "h**ell**o");

        assert_eq!(session.on_render_committed(pending.revision - 1), None);
        assert_eq!(
            session.on_render_committed(pending.revision),
            Some(Selection::new(3, 6))
        );
        assert_eq!(session.selection(), Selection::new(3, 6));
        assert_eq!(session.on_render_committed(pending.revision), None);
    }

    #[test]
    fn stale_pending_selection_is_discarded() {
        let mut session = ready_session("ab");
        session.set_selection(Selection::caret(1));
        let pending = session
            .insert_text("X", Instant::now())
            .expect("surface attached");
        session.edit("something else", Instant::now());
        assert_eq!(session.on_render_committed(pending.revision + 1), None);
        assert_eq!(session.pending_selection(), None);
    }

    #[test]
    fn detach_cancels_pending_write() {
        let mut session = ready_session("");
        let t0 = Instant::now();
        session.edit("unsaved", t0);
        session.detach_surface();
        assert!(!session.poll(t0 + ms(2_000)));
        assert_eq!(session.store().get(DRAFT_STORAGE_KEY), None);
    }

    #[test]
    fn generated_content_is_committed_as_one_edit() {
        let mut session = ready_session("# Notes");
        let mut buffer = GenerationBuffer::new();
        buffer.push_frame(StreamFrame::content("More"));
        buffer.push_frame(StreamFrame::content(" text"));
        assert_eq!(session.history().len(), 1);

        assert!(session.apply_generated(&buffer, ApplyMode::Append, Instant::now()));
        assert_eq!(session.text(), "# Notes\n\nMore text");
        assert_eq!(session.history().len(), 2);
        assert!(session.undo(Instant::now()));
        assert_eq!(session.text(), "# Notes");
    }

    #[test]
    fn image_insert_and_feature_errors() {
        let mut session = ready_session("");
        session
            .insert_image("logo", "http://localhost/api/images/1", Instant::now())
            .expect("inserted");
        assert_eq!(session.text(), "![logo](http://localhost/api/images/1)");

        session.set_error(Feature::Share, "Network error");
        assert_eq!(session.errors().get(Feature::Share), Some("Network error"));
        session.clear_error(Feature::Share);
        assert_eq!(session.errors().get(Feature::Share), None);
    }

    #[test]
    fn clear_draft_resets_indicator() {
        let mut session = ready_session("text");
        assert!(session.save_now());
        session.clear_draft();
        assert_eq!(session.save_indicator(), SaveIndicator::NeverSaved);
        assert_eq!(session.store().get(DRAFT_STORAGE_KEY), None);
    }

    #[test]
    fn scroll_sync_uses_configured_guard() {
        let settings = EditorSettings {
            scroll_guard_delay: ms(20),
            ..EditorSettings::default()
        };
        let mut session = EditingSession::new("", MemoryDraftStore::new(), settings);
        let t0 = Instant::now();
        let editor = PaneMetrics::new(50.0, 200.0, 100.0);
        let mut preview = PaneMetrics::new(0.0, 300.0, 100.0);
        assert!(session
            .scroll_sync()
            .handle_editor_scroll(&editor, &mut preview, t0));
        assert!(session.scroll_sync().is_guarded(t0 + ms(19)));
        assert!(!session.scroll_sync().is_guarded(t0 + ms(20)));
    }
}
