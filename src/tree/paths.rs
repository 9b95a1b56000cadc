use unicode_normalization::UnicodeNormalization;

use crate::error::{TreeError, TreeResult};

/// Normalize a UTF-8 string to NFC.
pub fn normalize_nfc(input: &str) -> String {
    input.nfc().collect::<String>()
}

/// Validate an entry path and return its normalized (NFC) form.
/// Rules, first failure wins:
/// - not empty
/// - no leading '/'
/// - no trailing '/'
/// - no empty segments ('//')
/// - no NUL characters
/// - no '.' or '..' segments
pub fn validate_path(path: &str) -> TreeResult<String> {
    if path.is_empty() {
        return Err(TreeError::invalid_path(path, "path cannot be empty"));
    }
    if path.starts_with('/') {
        return Err(TreeError::invalid_path(path, "path cannot start with '/'"));
    }
    if path.ends_with('/') {
        return Err(TreeError::invalid_path(path, "path cannot end with '/'"));
    }
    if path.split('/').any(|seg| seg.is_empty()) {
        return Err(TreeError::invalid_path(path, "empty segments ('//') are not allowed"));
    }
    if path.contains('\u{0000}') {
        return Err(TreeError::invalid_path(path, "path cannot contain NUL characters"));
    }
    if path.split('/').any(|seg| seg == "." || seg == "..") {
        return Err(TreeError::invalid_path(path, "segments '.' and '..' are not allowed"));
    }
    Ok(normalize_nfc(path))
}

/// Path with its last segment removed; "" when the path sits at the namespace root.
pub fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last segment of a path.
pub fn name_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Strict ancestors of `path`, ordered root-to-immediate-parent. The root ("") is not included.
pub fn ancestors_of(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (idx, ch) in path.char_indices() {
        if ch == '/' { out.push(path[..idx].to_string()); }
    }
    out
}

/// True when `path` lies strictly below `ancestor`. The root ("") is an ancestor of everything.
pub fn is_descendant_of(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() { return !path.is_empty(); }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Move `path` from under `from` to under `to`. `path` must be `from` itself or one of its descendants.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from { return Some(to.to_string()); }
    if !is_descendant_of(path, from) { return None; }
    Some(format!("{}{}", to, &path[from.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_nfc_basic() {
        // 'e' + combining acute should normalize to the precomposed form
        let s = "Cafe\u{0301}";
        let n = normalize_nfc(s);
        assert_eq!(n, "Caf\u{00e9}");
    }

    #[test]
    fn validate_returns_nfc_form() {
        let p = validate_path("docs/Cafe\u{0301}.md").unwrap();
        assert_eq!(p, "docs/Caf\u{00e9}.md");
    }

    #[test]
    fn test_invalid_paths() {
        assert!(validate_path("").is_err());
        assert!(validate_path("/leading").is_err());
        assert!(validate_path("trailing/").is_err());
        assert!(validate_path("double//slash").is_err());
        assert!(validate_path("a/./b").is_err());
        assert!(validate_path("a/../b").is_err());
        assert!(validate_path("..").is_err());
        let with_nul = format!("a\u{0000}b");
        assert!(validate_path(&with_nul).is_err());
    }

    #[test]
    fn first_failing_rule_wins() {
        // "/" both starts and ends with '/', the leading-slash rule is reported
        match validate_path("/") {
            Err(TreeError::InvalidPath { reason, .. }) => assert!(reason.contains("start")),
            other => panic!("unexpected: {:?}", other),
        }
        match validate_path("a//b/") {
            Err(TreeError::InvalidPath { reason, .. }) => assert!(reason.contains("end")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn dotfiles_are_allowed() {
        assert_eq!(validate_path(".gitignore").unwrap(), ".gitignore");
        assert_eq!(validate_path("conf/.env.example").unwrap(), "conf/.env.example");
    }

    #[test]
    fn parent_and_name() {
        assert_eq!(parent_of("a"), "");
        assert_eq!(parent_of("a/b/c.txt"), "a/b");
        assert_eq!(name_of("a/b/c.txt"), "c.txt");
        assert_eq!(name_of("single"), "single");
    }

    #[test]
    fn ancestors_root_first() {
        assert_eq!(ancestors_of("a/b/c"), vec!["a".to_string(), "a/b".to_string()]);
        assert!(ancestors_of("top").is_empty());
    }

    #[test]
    fn descendant_checks_respect_segment_boundaries() {
        assert!(is_descendant_of("a/b", "a"));
        assert!(is_descendant_of("a/b/c", "a"));
        assert!(!is_descendant_of("ab", "a"));
        assert!(!is_descendant_of("a", "a"));
        assert!(is_descendant_of("x", ""));
    }

    #[test]
    fn rebase_moves_subtree_paths() {
        assert_eq!(rebase("src/lib/mod.rs", "src", "pkg/src").as_deref(), Some("pkg/src/lib/mod.rs"));
        assert_eq!(rebase("src", "src", "code").as_deref(), Some("code"));
        assert_eq!(rebase("srcx/a", "src", "code"), None);
    }
}
