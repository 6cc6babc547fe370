use std::path::{MAIN_SEPARATOR, Path};

/// The key used to join a document against the signal tables: the final
/// segment of its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Derive the identifier from a path string.
    ///
    /// # Panics
    ///
    /// Panics if `path` has no non-empty segment. Callers only pass paths
    /// produced by the walker, so this is a programming error.
    ///
    /// # Examples
    ///
    /// ```
    /// use boostdex::DocumentId;
    ///
    /// assert_eq!(DocumentId::resolve("a/b/c"), DocumentId::resolve("x/c"));
    /// assert_eq!(DocumentId::resolve("wiki/pages/doc1").as_str(), "doc1");
    /// ```
    pub fn resolve(path: &str) -> Self {
        match last_segment(path) {
            Some(segment) => Self(segment.to_string()),
            None => panic!("cannot derive an identifier from {path:?}"),
        }
    }

    /// Derive the identifier from a filesystem path, if it has a file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy();
        last_segment(&name).map(|s| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last non-empty `/`-separated segment of `s`.
pub(crate) fn last_segment(s: &str) -> Option<&str> {
    s.split(['/', MAIN_SEPARATOR])
        .rev()
        .find(|segment| !segment.is_empty())
}
