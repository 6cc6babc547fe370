use tracing::debug;

use crate::{error::Result, record::DocumentRecord};

/// How the index was opened for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// The index starts empty; records are appended without any existence
    /// check.
    FreshBuild,
    /// The index may already hold a document for a path; records replace
    /// it.
    IncrementalUpdate,
}

/// The write side of an index, as seen by the ingestion pipeline.
pub trait IndexSink {
    fn open_mode(&self) -> OpenMode;

    /// Append `record` as a new document.
    fn add(&mut self, record: DocumentRecord) -> Result<()>;

    /// Remove every document whose `path` equals `key`, then add `record`.
    fn replace(&mut self, key: &str, record: DocumentRecord) -> Result<()>;
}

/// Hand `record` to `sink`, appending or upserting by path according to
/// the sink's open mode.
pub fn commit<S: IndexSink + ?Sized>(
    sink: &mut S,
    record: DocumentRecord,
) -> Result<()> {
    match sink.open_mode() {
        OpenMode::FreshBuild => {
            debug!(path = %record.path, "adding");
            sink.add(record)
        }
        OpenMode::IncrementalUpdate => {
            debug!(path = %record.path, "updating");
            let key = record.path.clone();
            sink.replace(&key, record)
        }
    }
}
