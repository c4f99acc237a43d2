//! Proportional scroll synchronization between the source and preview panes.
//!
//! Moving one pane programmatically makes the host emit a scroll event for
//! the other pane. A one-shot guard, released `guard_delay` after the last
//! programmatic scroll, swallows that echo so the panes never ping-pong.

use crate::constants::DEFAULT_SCROLL_GUARD_MS;
use std::time::{Duration, Instant};

/// Anything with a vertical scroll position and extent.
pub trait ScrollPane {
    fn scroll_top(&self) -> f64;
    fn scroll_height(&self) -> f64;
    fn client_height(&self) -> f64;
    fn set_scroll_top(&mut self, value: f64);

    /// Scrollable distance; zero when the content fits.
    fn overflow(&self) -> f64 {
        (self.scroll_height() - self.client_height()).max(0.0)
    }

    /// Position as a fraction of the overflow, `None` without overflow.
    fn scroll_ratio(&self) -> Option<f64> {
        let overflow = self.overflow();
        if overflow <= f64::EPSILON {
            return None;
        }
        Some((self.scroll_top() / overflow).clamp(0.0, 1.0))
    }
}

/// Plain pane geometry, as reported by the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaneMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl PaneMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }
}

impl ScrollPane for PaneMetrics {
    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_height(&self) -> f64 {
        self.scroll_height
    }

    fn client_height(&self) -> f64 {
        self.client_height
    }

    fn set_scroll_top(&mut self, value: f64) {
        self.scroll_top = value;
    }
}

/// Reentrancy-guarded scroll mapper.
#[derive(Debug, Clone)]
pub struct ScrollSync {
    guard_delay: Duration,
    guard_until: Option<Instant>,
}

impl Default for ScrollSync {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SCROLL_GUARD_MS))
    }
}

impl ScrollSync {
    pub fn new(guard_delay: Duration) -> Self {
        Self {
            guard_delay,
            guard_until: None,
        }
    }

    /// Whether scroll events are currently being swallowed.
    pub fn is_guarded(&self, now: Instant) -> bool {
        self.guard_until.is_some_and(|until| now < until)
    }

    /// Native scroll event from the source (editor) pane.
    ///
    /// # Returns
    /// `true` when the preview pane was moved.
    pub fn handle_editor_scroll(
        &mut self,
        editor: &dyn ScrollPane,
        preview: &mut dyn ScrollPane,
        now: Instant,
    ) -> bool {
        if self.is_guarded(now) {
            return false;
        }
        self.align(editor, preview, now)
    }

    /// Native scroll event from the preview pane.
    ///
    /// # Returns
    /// `true` when the editor pane was moved.
    pub fn handle_preview_scroll(
        &mut self,
        preview: &dyn ScrollPane,
        editor: &mut dyn ScrollPane,
        now: Instant,
    ) -> bool {
        if self.is_guarded(now) {
            return false;
        }
        self.align(preview, editor, now)
    }

    /// Align the editor to the preview regardless of the guard.
    pub fn sync_scroll_to_editor(
        &mut self,
        preview: &dyn ScrollPane,
        editor: &mut dyn ScrollPane,
        now: Instant,
    ) -> bool {
        self.align(preview, editor, now)
    }

    /// Align the preview to the editor regardless of the guard.
    pub fn sync_scroll_to_preview(
        &mut self,
        editor: &dyn ScrollPane,
        preview: &mut dyn ScrollPane,
        now: Instant,
    ) -> bool {
        self.align(editor, preview, now)
    }

    fn align(&mut self, source: &dyn ScrollPane, target: &mut dyn ScrollPane, now: Instant) -> bool {
        let Some(ratio) = source.scroll_ratio() else {
            return false;
        };
        self.guard_until = Some(now + self.guard_delay);
        target.set_scroll_top(ratio * target.overflow());
        true
    }

    pub fn guard_delay(&self) -> Duration {
        self.guard_delay
    }
}
