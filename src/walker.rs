use std::{
    fs::Metadata,
    path::{Path, PathBuf},
    time::SystemTime,
};

use tracing::warn;
use walkdir::WalkDir;

/// A regular file found under the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Last modification time in milliseconds since the Unix epoch.
    pub last_modified_ms: i64,
}

/// Lazily walks a document tree, yielding every regular file.
///
/// Symlinks are followed. Entries that cannot be read (permission denied,
/// broken links, link loops) are logged, counted and skipped; the walk
/// itself never fails. Yield order is unspecified.
pub struct DocumentWalker {
    entries: walkdir::IntoIter,
    skipped: usize,
}

impl DocumentWalker {
    pub fn new(root: &Path) -> Self {
        Self {
            entries: WalkDir::new(root).follow_links(true).into_iter(),
            skipped: 0,
        }
    }

    /// Number of entries skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn skip(&mut self, path: Option<&Path>, err: &dyn std::fmt::Display) {
        self.skipped += 1;
        match path {
            Some(path) => {
                warn!(path = %path.display(), %err, "skipping unreadable entry")
            }
            None => warn!(%err, "skipping unreadable entry"),
        }
    }
}

impl Iterator for DocumentWalker {
    type Item = DiscoveredFile;

    fn next(&mut self) -> Option<DiscoveredFile> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    self.skip(err.path(), &err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    self.skip(Some(entry.path()), &err);
                    continue;
                }
            };

            return Some(DiscoveredFile {
                last_modified_ms: modified_millis(&metadata),
                path: entry.into_path(),
            });
        }
    }
}

fn modified_millis(metadata: &Metadata) -> i64 {
    metadata
        .modified()
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
