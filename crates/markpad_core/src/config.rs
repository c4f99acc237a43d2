//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_AI_API_URL, DEFAULT_AI_MODEL, DEFAULT_AUTOSAVE_DELAY_MS, DEFAULT_HISTORY_LIMIT,
    DEFAULT_MAX_DOCUMENT_SIZE, DEFAULT_MAX_IMAGE_SIZE, DEFAULT_PORT,
    DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS, DEFAULT_SCROLL_GUARD_MS,
};
use crate::editor::EditorSettings;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Upstream AI provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl AiConfig {
    /// Whether a provider key is configured.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Runtime configuration for Markpad.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    pub max_document_size: usize,
    pub max_image_size: usize,
    pub autosave_delay_ms: u64,
    pub scroll_guard_ms: u64,
    pub history_limit: usize,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    pub public_base_url: String,
    pub ai: AiConfig,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows USERPROFILE (standard)
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = parsed(&lookup, "PORT", DEFAULT_PORT);
        let public_base_url = non_empty(&lookup, "PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Self {
            db_path: lookup("DB_PATH").map(expand_tilde).unwrap_or_else(|| {
                let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
                let cache_dir = home.join(".cache").join("markpad");
                cache_dir.join("db").to_string_lossy().to_string()
            }),
            port,
            max_document_size: parsed(&lookup, "MAX_DOCUMENT_SIZE", DEFAULT_MAX_DOCUMENT_SIZE),
            max_image_size: parsed(&lookup, "MAX_IMAGE_SIZE", DEFAULT_MAX_IMAGE_SIZE),
            autosave_delay_ms: parsed(&lookup, "AUTOSAVE_DELAY_MS", DEFAULT_AUTOSAVE_DELAY_MS),
            scroll_guard_ms: parsed(&lookup, "SCROLL_GUARD_MS", DEFAULT_SCROLL_GUARD_MS),
            history_limit: parsed(&lookup, "HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT).max(1),
            rate_limit_max_requests: parsed(
                &lookup,
                "RATE_LIMIT_MAX_REQUESTS",
                DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            ),
            rate_limit_window_secs: parsed(
                &lookup,
                "RATE_LIMIT_WINDOW_SECS",
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            ),
            public_base_url,
            ai: AiConfig {
                api_url: non_empty(&lookup, "AI_API_URL")
                    .unwrap_or_else(|| DEFAULT_AI_API_URL.to_string()),
                api_key: non_empty(&lookup, "AI_API_KEY"),
                model: non_empty(&lookup, "AI_MODEL")
                    .unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            },
        }
    }

    /// Editing-core tunables derived from this configuration.
    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            history_limit: self.history_limit,
            autosave_delay: Duration::from_millis(self.autosave_delay_ms),
            scroll_guard_delay: Duration::from_millis(self.scroll_guard_ms),
        }
    }

    /// Rate-limit window as a [`Duration`].
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}
