//! Remote path normalization
//!
//! Logical paths into the storage namespace are slash-separated and always
//! canonicalized before they reach a request: forward slashes only, no
//! duplicate separators, exactly one leading slash. The empty string denotes
//! the namespace root.

use serde::{Deserialize, Serialize};

/// A normalized logical path into the remote storage namespace
///
/// Always of the form `/seg1/seg2/...`, or the empty string for the root.
/// Construction cannot fail; any input string has a canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemotePath(String);

impl RemotePath {
    /// Normalize a caller-supplied path string
    pub fn new(path: &str) -> Self {
        let mut path = path.replace('\\', "/");
        while path.contains("//") {
            path = path.replace("//", "/");
        }
        let path = path.strip_prefix('/').unwrap_or(&path);
        if path.is_empty() {
            return Self::root();
        }
        Self(format!("/{path}"))
    }

    /// The namespace root
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Whether this path is the namespace root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The normalized path string (`""` for root, `/a/b/c` otherwise)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment, if any
    pub fn name(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Join a child segment, normalizing the result
    pub fn join(&self, child: &str) -> Self {
        Self::new(&format!("{}/{}", self.0, child))
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backslashes_become_slashes() {
        let path = RemotePath::new("Deployment\\App\\1.0");
        assert_eq!(path.as_str(), "/Deployment/App/1.0");
    }

    #[test]
    fn test_duplicate_slashes_collapse() {
        let path = RemotePath::new("//Deployment///App////file.ipa");
        assert_eq!(path.as_str(), "/Deployment/App/file.ipa");

        // runs produced by backslash replacement collapse too
        let path = RemotePath::new("a\\/\\/b");
        assert_eq!(path.as_str(), "/a/b");
    }

    #[test]
    fn test_leading_slash_is_exactly_one() {
        assert_eq!(RemotePath::new("Deployment").as_str(), "/Deployment");
        assert_eq!(RemotePath::new("/Deployment").as_str(), "/Deployment");
    }

    #[test]
    fn test_root_forms() {
        assert_eq!(RemotePath::new("").as_str(), "");
        assert_eq!(RemotePath::new("/").as_str(), "");
        assert_eq!(RemotePath::root().as_str(), "");
        assert!(RemotePath::new("/").is_root());
    }

    #[test]
    fn test_idempotent() {
        for raw in ["a\\b//c", "//x//", "", "/", "foo/bar", "\\\\server\\share"] {
            let once = RemotePath::new(raw);
            let twice = RemotePath::new(once.as_str());
            assert_eq!(once, twice, "normalize not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_name() {
        assert_eq!(RemotePath::new("/a/b/file.ipa").name(), Some("file.ipa"));
        assert_eq!(RemotePath::root().name(), None);
    }

    #[test]
    fn test_join() {
        let base = RemotePath::new("/Deployment");
        assert_eq!(base.join("App").as_str(), "/Deployment/App");
        assert_eq!(base.join("/App").as_str(), "/Deployment/App");
        assert_eq!(RemotePath::root().join("App").as_str(), "/App");
    }

    #[test]
    fn test_display() {
        assert_eq!(RemotePath::new("/a/b").to_string(), "/a/b");
        assert_eq!(RemotePath::root().to_string(), "/");
    }
}
