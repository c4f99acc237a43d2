//! Input checks shared by the server and the CLI.

use crate::error::AppError;
use crate::naming::is_valid_share_token;

/// Maximum document title length, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

const DISALLOWED_SNIPPETS: &[&str] = &["<script", "<iframe", "javascript:"];

/// Trim an optional string and drop empty values.
///
/// # Returns
/// `None` when the input is missing or whitespace-only; otherwise the trimmed
/// string.
pub fn normalize_optional_nonempty(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Locate markup that must not be shared.
///
/// Matches script and iframe tags, `javascript:` URLs and inline `on*=`
/// event handler attributes inside tags, case-insensitively.
///
/// # Returns
/// A short description of the first offending construct.
pub fn find_disallowed_markup(content: &str) -> Option<&'static str> {
    let lowered = content.to_ascii_lowercase();
    if let Some(snippet) = DISALLOWED_SNIPPETS
        .iter()
        .find(|snippet| lowered.contains(**snippet))
    {
        return Some(match *snippet {
            "<script" => "script tags",
            "<iframe" => "iframe tags",
            _ => "javascript: URLs",
        });
    }
    has_inline_handler(lowered.as_bytes()).then_some("inline event handlers")
}

fn has_inline_handler(bytes: &[u8]) -> bool {
    let mut in_tag = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => {
                in_tag = bytes
                    .get(i + 1)
                    .is_some_and(|next| next.is_ascii_alphabetic() || *next == b'/');
            }
            b'>' => in_tag = false,
            b'o' if in_tag
                && i > 0
                && (bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b'/')
                && bytes.get(i + 1) == Some(&b'n') =>
            {
                let mut j = i + 2;
                let name_start = j;
                while j < bytes.len() && bytes[j].is_ascii_alphabetic() {
                    j += 1;
                }
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j > name_start && bytes.get(j) == Some(&b'=') {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

/// Check document content against the size limit and markup rules.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for empty, oversized or unsafe content.
pub fn validate_content(content: &str, max_size: usize) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::BadRequest("Content must not be empty".to_string()));
    }
    if content.len() > max_size {
        return Err(AppError::BadRequest(format!(
            "Content exceeds maximum size of {} bytes",
            max_size
        )));
    }
    if let Some(found) = find_disallowed_markup(content) {
        return Err(AppError::BadRequest(format!(
            "Content contains disallowed markup ({})",
            found
        )));
    }
    Ok(())
}

/// Check a share request before it is sent or stored.
///
/// # Errors
/// Returns [`AppError::BadRequest`] when the title is too long or the
/// content fails [`validate_content`].
pub fn validate_document(
    title: Option<&str>,
    content: &str,
    max_size: usize,
) -> Result<(), AppError> {
    if let Some(title) = title {
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::BadRequest(format!(
                "Title exceeds maximum of {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if find_disallowed_markup(title).is_some() {
            return Err(AppError::BadRequest(
                "Title contains disallowed markup".to_string(),
            ));
        }
    }
    validate_content(content, max_size)
}

/// Check the shape of a share token before any lookup.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for malformed tokens.
pub fn validate_share_token(token: &str) -> Result<(), AppError> {
    if is_valid_share_token(token) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid share token".to_string()))
    }
}
