use std::{io, path::PathBuf};

use crate::signals::SignalKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("index error: {0}")]
    IndexWrite(#[from] tantivy::TantivyError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot read signal file {}: {source}", .path.display())]
    SignalFile { path: PathBuf, source: io::Error },

    #[error("{}:{line}: malformed signal line {content:?}", .path.display())]
    MalformedSignalLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("{}:{line}: invalid numeric signal {value:?}", .path.display())]
    InvalidNumericSignal {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("no {table} signal for document '{id}'")]
    MissingSignal { table: SignalKind, id: String },

    #[error("document '{id}' has a non-positive boost ({boost})")]
    InvalidBoost { id: String, boost: f32 },

    #[error("cannot read document {}: {source}", .path.display())]
    DocumentRead { path: PathBuf, source: io::Error },
}

impl Error {
    /// Whether this error only concerns the document being processed.
    ///
    /// Per-document errors are counted and skipped by the ingestion loop;
    /// everything else aborts the run.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            Self::MissingSignal { .. }
                | Self::InvalidBoost { .. }
                | Self::DocumentRead { .. }
        )
    }
}
