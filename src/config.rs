use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    signals::{SignalConfiguration, SignalPaths},
    tantivy_index::DEFAULT_MEMORY_BUDGET,
    writer::OpenMode,
};

/// Environment variable overriding the default index directory.
pub const INDEX_DIR_ENV: &str = "BOOSTDEX_INDEX_DIR";

/// Everything one ingestion run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub index_dir: PathBuf,
    pub docs_root: PathBuf,
    pub mode: OpenMode,
    pub signals: SignalConfiguration,
    pub signal_paths: SignalPaths,
    pub memory_budget: usize,
}

impl RunConfig {
    pub fn new(docs_root: PathBuf, signals: SignalConfiguration) -> Self {
        Self {
            index_dir: PathBuf::from(signals.default_index_dir()),
            docs_root,
            mode: OpenMode::FreshBuild,
            signals,
            signal_paths: SignalPaths::default(),
            memory_budget: DEFAULT_MEMORY_BUDGET,
        }
    }

    /// Resolve the index directory from, in order of priority:
    /// 1. An explicit path (from --index)
    /// 2. The BOOSTDEX_INDEX_DIR environment variable
    /// 3. A directory named after the signal configuration
    pub fn resolve_index_dir(
        explicit: Option<&Path>,
        env: Option<OsString>,
        signals: SignalConfiguration,
    ) -> PathBuf {
        if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Some(val) = env.filter(|v| !v.is_empty()) {
            PathBuf::from(val)
        } else {
            PathBuf::from(signals.default_index_dir())
        }
    }

    /// Check that the run can start: the document root is readable and
    /// every signal file the configuration needs exists.
    pub fn validate(&self) -> Result<()> {
        let root = &self.docs_root;
        let readable = match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => std::fs::read_dir(root).is_ok(),
            Ok(_) => std::fs::File::open(root).is_ok(),
            Err(_) => false,
        };
        if !readable {
            return Err(Error::Config(format!(
                "document directory '{}' does not exist or is not readable",
                root.display()
            )));
        }

        for file in self.signal_paths.required(self.signals) {
            if !file.is_file() {
                return Err(Error::Config(format!(
                    "signal file '{}' does not exist",
                    file.display()
                )));
            }
        }

        if self.memory_budget < 15_000_000 {
            return Err(Error::Config(format!(
                "writer memory budget must be at least 15000000 bytes, got {}",
                self.memory_budget
            )));
        }

        Ok(())
    }
}
