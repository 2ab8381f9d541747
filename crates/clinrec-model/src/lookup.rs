//! Key normalization for hierarchical paths and attribute names.

/// Normalize a hierarchical path or attribute name to its index key form.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Join a parent path and a child segment into a normalized path.
pub fn join_path(parent: &str, segment: &str) -> String {
    let segment = normalize_key(segment);
    if parent.is_empty() {
        segment
    } else {
        format!("{parent}.{segment}")
    }
}
