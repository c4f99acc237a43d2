//! Document titles and share tokens.

use rand::distributions::Alphanumeric;
use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "arctic", "bold", "brave", "bright", "calm", "cosmic", "crimson",
    "crystal", "digital", "electric", "ethereal", "fierce", "gentle", "golden", "harmonic",
    "hidden", "lunar", "mellow", "mystic", "noble", "quiet", "radiant", "rapid", "serene",
    "silver", "solar", "stellar", "swift", "tranquil", "velvet", "vibrant", "wild", "zen",
];

const NOUNS: &[&str] = &[
    "atlas", "beacon", "bridge", "canyon", "comet", "draft", "ember", "falcon", "fjord",
    "garden", "harbor", "journal", "lantern", "ledger", "meadow", "memo", "nebula", "notebook",
    "orchid", "outline", "quill", "river", "scroll", "sketch", "spark", "summit", "tide",
    "valley", "voyage", "willow",
];

/// Length of generated share tokens.
pub const SHARE_TOKEN_LEN: usize = 12;

const TITLE_MAX_CHARS: usize = 80;

/// Generate a random adjective-noun name.
pub fn generate_name() -> String {
    let mut rng = rand::thread_rng();
    let adj = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    format!("{}-{}", adj, noun)
}

/// Generate an unguessable alphanumeric share token.
pub fn generate_share_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Whether `token` has the shape of a share token (`[A-Za-z0-9]{8,64}`).
pub fn is_valid_share_token(token: &str) -> bool {
    (8..=64).contains(&token.len()) && token.bytes().all(|byte| byte.is_ascii_alphanumeric())
}

/// Derive a title from Markdown content.
///
/// Prefers the first ATX heading, then the first non-empty line with
/// leading list/quote markers removed.
///
/// # Returns
/// A derived title, or `None` when the content has no usable line.
pub fn derive_title_from_markdown(content: &str) -> Option<String> {
    let mut in_fence = false;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence && trimmed.starts_with('#') {
            let candidate = trimmed.trim_start_matches('#').trim();
            if !candidate.is_empty() {
                return Some(truncate_title(candidate));
            }
        }
    }

    let mut in_fence = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || trimmed.is_empty() || trimmed.starts_with('|') {
            continue;
        }
        let candidate = trimmed
            .trim_start_matches(['>', '-', '*', '+'])
            .trim()
            .trim_matches(['*', '_', '`'])
            .trim();
        if !candidate.is_empty() {
            return Some(truncate_title(candidate));
        }
    }

    None
}

/// Prefer a content-derived title and fall back to a random name.
pub fn title_for_content(content: &str) -> String {
    derive_title_from_markdown(content).unwrap_or_else(generate_name)
}

fn truncate_title(value: &str) -> String {
    value.chars().take(TITLE_MAX_CHARS).collect::<String>()
}
