//! Wrapper injection heuristic
//!
//! Decides, per file, whether materialization should inject the schema's
//! scaffold header/footer. The bias is conservative: any signal of prior
//! structure means "skip wrapping", because a repeated pull must never
//! stack a second scaffold around content that already has one.

use sn_schema::WrapperSpec;

/// Content at or above this length is considered structured enough
/// to stand on its own.
pub const WRAP_THRESHOLD: usize = 120;

/// Comment markers that indicate the content already has structure.
const COMMENT_MARKERS: &[&str] = &["//", "/*", "#", "<!--"];

/// Function-wrapper patterns that indicate an existing shell.
const FUNCTION_PATTERNS: &[&str] = &["function", "=>"];

/// Decide whether `content` should receive the scaffold from `spec`.
///
/// Returns true only for short, unstructured content: empty or nearly
/// empty fields get a scaffold to write into; anything carrying a comment
/// marker, a function shell, a schema signal token, or simply enough text
/// is left untouched. When signals conflict, skipping wins.
pub fn needs_wrapper(content: &str, spec: &WrapperSpec) -> bool {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.len() >= WRAP_THRESHOLD {
        return false;
    }
    if COMMENT_MARKERS.iter().any(|m| trimmed.contains(m)) {
        return false;
    }
    if FUNCTION_PATTERNS.iter().any(|p| trimmed.contains(p)) {
        return false;
    }
    if spec.signal_tokens.iter().any(|t| trimmed.contains(t)) {
        return false;
    }
    true
}

/// Inject the scaffold around `content`.
pub fn apply_wrapper(content: &str, spec: &WrapperSpec) -> String {
    let inner = content.trim();
    if inner.is_empty() {
        format!("{}\n{}\n", spec.header, spec.footer)
    } else {
        format!("{}\n{}\n{}\n", spec.header, inner, spec.footer)
    }
}
