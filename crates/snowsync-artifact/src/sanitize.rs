//! Filesystem-safe names for local artifacts

/// Maximum length of a sanitized directory name
pub const MAX_NAME_LEN: usize = 50;

/// Name used when sanitizing leaves nothing behind
pub const FALLBACK_NAME: &str = "artifact";

/// Turn a record's display name into a directory token
///
/// ASCII-lowercases, maps every character outside `[a-z0-9]` to `_`,
/// collapses runs of `_`, trims `_` from both ends and truncates to
/// [`MAX_NAME_LEN`]. The result only contains lowercase alphanumerics and
/// single underscores.
#[must_use]
pub fn sanitize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(MAX_NAME_LEN));
    let mut last_underscore = true;

    for ch in raw.chars() {
        if out.len() >= MAX_NAME_LEN {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }

    while out.ends_with('_') {
        out.pop();
    }

    if out.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}

/// Make a rendered file-name stem safe to create on disk
///
/// Keeps case and most punctuation, replaces path separators, control
/// characters and characters Windows rejects with `_`. Returns `None` when
/// nothing usable remains.
#[must_use]
pub fn sanitize_file_stem(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
