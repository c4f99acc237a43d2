//! Shared constants used across Markpad crates.

/// Default API port for the Markpad backend.
pub const DEFAULT_PORT: u16 = 38420;

/// Default maximum Markdown document size accepted by the API layer.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 1024 * 1024;

/// Default maximum uploaded image size.
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Default quiet period before a draft is written to the durable slot.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 1_000;

/// Default delay before the scroll reentrancy guard is released.
pub const DEFAULT_SCROLL_GUARD_MS: u64 = 50;

/// Default number of undo snapshots kept by the history ledger.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default number of mutation requests accepted per client per window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 10;
/// Default rate-limit window in seconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Durable slot key holding the in-progress draft.
pub const DRAFT_STORAGE_KEY: &str = "markdown-editor-content";
/// Durable slot key holding the saved document library.
pub const LIBRARY_STORAGE_KEY: &str = "markdown-editor-library";

/// Default base URL for CLI/API clients.
pub const DEFAULT_CLI_SERVER_URL: &str = "http://localhost:38420";

/// Default OpenAI-compatible chat completion endpoint for AI generation.
pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Default model requested from the AI provider.
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// Markdown extensions the renderer must enable.
pub const RENDER_EXTENSIONS: &[&str] = &["tables", "strikethrough", "tasklists"];
