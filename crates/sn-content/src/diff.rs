//! Change detection against stored baselines

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use similar::TextDiff;

/// A field whose scaffold-stripped content differs from its baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedField {
    /// Remote field name.
    pub field: String,
    /// The new scaffold-stripped content.
    pub content: String,
    /// Unified diff against the baseline, for logs and reports.
    pub diff: String,
    /// Line similarity ratio (0.0 to 1.0).
    pub similarity: f64,
}

/// Hex-encoded SHA-256 of content, used for baseline comparisons.
pub fn content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare scaffold-stripped content to its baseline.
///
/// Returns `None` when nothing really changed. Both inputs must already
/// be scaffold-free; raw wrapped content never reaches this comparison.
pub fn detect_change(field: &str, baseline: &str, stripped: &str) -> Option<ChangedField> {
    if content_checksum(baseline) == content_checksum(stripped) {
        return None;
    }

    let text_diff = TextDiff::from_lines(baseline, stripped);
    let similarity = text_diff.ratio() as f64;
    let diff = text_diff
        .unified_diff()
        .context_radius(2)
        .header("baseline", "local")
        .to_string();

    Some(ChangedField {
        field: field.to_string(),
        content: stripped.to_string(),
        diff,
        similarity,
    })
}
