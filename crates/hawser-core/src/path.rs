//! Remote path helpers shared by the providers.
//!
//! Remote paths are `/`-separated regardless of the server's platform.
//! Providers receive operation paths relative to the mount root and join
//! them with these helpers.

/// Normalize a configured mount root to `/`-prefixed, no-trailing-slash
/// form. Empty input becomes `/`.
pub fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}")
    }
}

/// Join a mount root with an operation path.
pub fn join_root(root: &str, path: &str) -> String {
    let rel = path.trim_start_matches('/');
    if rel.is_empty() {
        return root.to_owned();
    }
    if root == "/" {
        format!("/{rel}")
    } else {
        format!("{root}/{rel}")
    }
}

/// Parent directory and final component of a remote path.
///
/// Returns `None` for the root path, which has no parent.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rsplit_once('/') {
        Some(("", name)) => Some(("/", name)),
        Some((parent, name)) => Some((parent, name)),
        None => Some(("/", trimmed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_roots() {
        assert_eq!(normalize_root(""), "/");
        assert_eq!(normalize_root("/"), "/");
        assert_eq!(normalize_root("pub/incoming"), "/pub/incoming");
        assert_eq!(normalize_root("/pub/incoming/"), "/pub/incoming");
    }

    #[test]
    fn joins_roots_and_paths() {
        assert_eq!(join_root("/", "a/b"), "/a/b");
        assert_eq!(join_root("/pub", "a/b"), "/pub/a/b");
        assert_eq!(join_root("/pub", "/a/b"), "/pub/a/b");
        assert_eq!(join_root("/pub", ""), "/pub");
        assert_eq!(join_root("/", "/"), "/");
    }

    #[test]
    fn splits_parents() {
        assert_eq!(split_parent("/a/b/c"), Some(("/a/b", "c")));
        assert_eq!(split_parent("/a"), Some(("/", "a")));
        assert_eq!(split_parent("a"), Some(("/", "a")));
        assert_eq!(split_parent("/"), None);
        assert_eq!(split_parent(""), None);
    }
}
