//! Pure toolbar edits: new text plus the selection to restore afterwards.
//!
//! Offsets are char indices, so multi-byte characters are never split.

/// Active selection or caret in the source surface, in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Build a selection, ordering the bounds.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Collapsed selection at `position`.
    pub fn caret(position: usize) -> Self {
        Self::new(position, position)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Clamp both bounds into `0..=len_chars`.
    pub fn clamped(self, len_chars: usize) -> Self {
        Self::new(self.start.min(len_chars), self.end.min(len_chars))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }
}

/// Result of a text mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub text: String,
    pub selection: Selection,
}

/// Fenced code block skeleton inserted by the toolbar.
pub const CODE_BLOCK_TEMPLATE: &str = "\n```\n\n```\n";

/// Table skeleton inserted by the toolbar.
pub const TABLE_TEMPLATE: &str = "\n| Header 1 | Header 2 | Header 3 |\n|----------|----------|----------|\n| Cell 1   | Cell 2   | Cell 3   |\n| Cell 4   | Cell 5   | Cell 6   |\n";

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Surround the selection with `before`/`after`.
///
/// A non-empty selection stays selected inside the markers; a caret lands
/// between them.
pub fn wrap_selection(text: &str, selection: Selection, before: &str, after: &str) -> Mutation {
    let selection = selection.clamped(char_len(text));
    let start = byte_index(text, selection.start);
    let end = byte_index(text, selection.end);

    let mut out = String::with_capacity(text.len() + before.len() + after.len());
    out.push_str(&text[..start]);
    out.push_str(before);
    out.push_str(&text[start..end]);
    out.push_str(after);
    out.push_str(&text[end..]);

    let shift = char_len(before);
    let selection = if selection.is_collapsed() {
        Selection::caret(selection.start + shift)
    } else {
        Selection::new(selection.start + shift, selection.end + shift)
    };
    Mutation {
        text: out,
        selection,
    }
}

/// Insert `insert` at the selection start; the caret lands after it.
pub fn insert_at_cursor(text: &str, selection: Selection, insert: &str) -> Mutation {
    let selection = selection.clamped(char_len(text));
    let start = byte_index(text, selection.start);

    let mut out = String::with_capacity(text.len() + insert.len());
    out.push_str(&text[..start]);
    out.push_str(insert);
    out.push_str(&text[start..]);

    Mutation {
        text: out,
        selection: Selection::caret(selection.start + char_len(insert)),
    }
}

/// Selection spanning the whole text.
pub fn select_all(text: &str) -> Selection {
    Selection::new(0, char_len(text))
}

/// `#` repeated `level` times plus a space; `level` is clamped to 1..=6.
pub fn heading_prefix(level: u8) -> String {
    let level = level.clamp(1, 6) as usize;
    format!("{} ", "#".repeat(level))
}

/// Markdown image link for an uploaded image.
pub fn image_markdown(alt: &str, url: &str) -> String {
    let alt = alt.replace(['[', ']'], "");
    format!("![{}]({})", alt.trim(), url.trim())
}

/// Toolbar commands understood by the editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Strikethrough,
    InlineCode,
    Link,
    Image,
    BulletList,
    NumberedList,
    Heading(u8),
    CodeBlock,
    Table,
}

impl ToolbarAction {
    /// Compute the edit for this action.
    pub fn apply(self, text: &str, selection: Selection) -> Mutation {
        match self {
            Self::Bold => wrap_selection(text, selection, "**", "**"),
            Self::Italic => wrap_selection(text, selection, "*", "*"),
            Self::Strikethrough => wrap_selection(text, selection, "~~", "~~"),
            Self::InlineCode => wrap_selection(text, selection, "`", "`"),
            Self::Link => wrap_selection(text, selection, "[", "](url)"),
            Self::Image => wrap_selection(text, selection, "![", "](url)"),
            Self::BulletList => insert_at_cursor(text, selection, "- "),
            Self::NumberedList => insert_at_cursor(text, selection, "1. "),
            Self::Heading(level) => insert_at_cursor(text, selection, &heading_prefix(level)),
            Self::CodeBlock => insert_at_cursor(text, selection, CODE_BLOCK_TEMPLATE),
            Self::Table => insert_at_cursor(text, selection, TABLE_TEMPLATE),
        }
    }
}
