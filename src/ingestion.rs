use std::{path::Path, time::Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    builder::DocumentBuilder,
    doc_id::DocumentId,
    error::{Error, Result},
    signals::SignalSet,
    walker::DocumentWalker,
    writer::{IndexSink, commit},
};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Documents handed to the index.
    pub indexed: usize,
    /// Documents skipped because a required signal was missing.
    pub missing_signal: usize,
    /// Documents skipped because their boost came out non-positive.
    pub invalid_boost: usize,
    /// Documents skipped because the file could not be read.
    pub unreadable: usize,
    /// Tree entries the walker could not visit.
    pub walk_errors: usize,
    /// Wall-clock milliseconds from signal loading to the final commit.
    /// `ingest` only covers the walk, so the owner of the whole run sets
    /// this with [`IngestReport::stamp_elapsed`].
    pub elapsed_ms: u64,
}

impl IngestReport {
    /// Total number of skip events.
    pub fn skipped(&self) -> usize {
        self.missing_signal
            + self.invalid_boost
            + self.unreadable
            + self.walk_errors
    }

    /// Record the time elapsed since `start` as the run's duration.
    pub fn stamp_elapsed(&mut self, start: Instant) {
        self.elapsed_ms =
            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    }

    fn record_skip(&mut self, err: &Error) {
        match err {
            Error::MissingSignal { .. } => self.missing_signal += 1,
            Error::InvalidBoost { .. } => self.invalid_boost += 1,
            _ => self.unreadable += 1,
        }
    }
}

/// Walk `root` and write one record per file into `sink`.
///
/// Per-document failures are logged and counted in the report; an index
/// failure aborts the run. `progress` is called after every file.
pub fn ingest<S: IndexSink + ?Sized>(
    root: &Path,
    signals: &SignalSet,
    builder: &DocumentBuilder,
    sink: &mut S,
    mut progress: impl FnMut(&IngestReport),
) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    let mut walker = DocumentWalker::new(root);

    for file in walker.by_ref() {
        let Some(id) = DocumentId::from_path(&file.path) else {
            warn!(path = %file.path.display(), "no file name, skipping");
            report.walk_errors += 1;
            continue;
        };

        let outcome = builder
            .build(&file, &id, signals)
            .and_then(|record| commit(sink, record));
        match outcome {
            Ok(()) => report.indexed += 1,
            Err(err) if err.is_per_document() => {
                warn!(path = %file.path.display(), %err, "skipping document");
                report.record_skip(&err);
            }
            Err(err) => return Err(err),
        }
        progress(&report);
    }

    report.walk_errors += walker.skipped();

    info!(
        indexed = report.indexed,
        skipped = report.skipped(),
        "ingestion finished"
    );
    Ok(report)
}
