//! Unified diffs for surfacing edits.

use similar::TextDiff;

/// Build a unified diff of `original` against `modified`, labelled
/// `a/<label>` and `b/<label>`. Empty when the texts are identical.
pub fn unified_diff(original: &str, modified: &str, label: &str) -> String {
    if original == modified {
        return String::new();
    }
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{label}"), &format!("b/{label}"))
        .to_string()
}
