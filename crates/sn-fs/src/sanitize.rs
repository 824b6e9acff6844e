//! Deterministic sanitization of remote identifiers into directory names

use crate::{Error, Result};

/// Maximum length of a sanitized directory segment.
const MAX_SEGMENT_LEN: usize = 80;

/// Sanitize a remote identifier into a filesystem-safe directory name.
///
/// The mapping is deterministic: the same identifier always produces the
/// same segment, so repeated pulls land in the same directory. Characters
/// outside `[A-Za-z0-9._-]` collapse to single underscores; the result is
/// lowercased and truncated.
pub fn sanitize_identifier(identifier: &str) -> Result<String> {
    let mut out = String::with_capacity(identifier.len());
    let mut last_was_sep = false;

    for ch in identifier.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep && !out.is_empty() {
            out.push('_');
            last_was_sep = true;
        }
    }

    // Trailing separator carries no information
    while out.ends_with('_') || out.ends_with('.') {
        out.pop();
    }

    if out.is_empty() {
        return Err(Error::UnusableIdentifier {
            identifier: identifier.to_string(),
        });
    }

    out.truncate(MAX_SEGMENT_LEN);
    Ok(out)
}
