//! Turns a discovered file plus its signals into a [`DocumentRecord`].

use crate::{
    doc_id::DocumentId,
    error::{Error, Result},
    record::{ContentStream, DocumentRecord, Weighted},
    signals::{SignalKind, SignalSet, SignalTable},
    walker::DiscoveredFile,
};

/// Base boost weights, fixed for the lifetime of a builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostPolicy {
    pub title_base: f32,
    pub anchor_base: f32,
}

impl Default for BoostPolicy {
    fn default() -> Self {
        Self {
            title_base: 1.0,
            anchor_base: 0.8,
        }
    }
}

/// Boost weights for the text fields of one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBoosts {
    pub title: f32,
    /// `None` when the record carries no anchor field.
    pub anchor: Option<f32>,
    pub contents: f32,
}

impl BoostPolicy {
    /// Every field scaled by the document's importance score.
    pub fn full(&self, importance: f32) -> FieldBoosts {
        FieldBoosts {
            title: self.title_base * importance,
            anchor: Some(self.anchor_base * importance),
            contents: importance,
        }
    }

    pub fn anchor_only(&self) -> FieldBoosts {
        FieldBoosts {
            title: self.title_base,
            anchor: Some(self.anchor_base),
            contents: 1.0,
        }
    }

    pub fn plain(&self) -> FieldBoosts {
        FieldBoosts {
            title: self.title_base,
            anchor: None,
            contents: 1.0,
        }
    }
}

impl FieldBoosts {
    /// Reject any boost that is not a finite positive number.
    fn validated(self, id: &DocumentId) -> Result<Self> {
        let boosts = [Some(self.title), self.anchor, Some(self.contents)];
        match boosts
            .into_iter()
            .flatten()
            .find(|b| !(b.is_finite() && *b > 0.0))
        {
            Some(boost) => Err(Error::InvalidBoost {
                id: id.to_string(),
                boost,
            }),
            None => Ok(self),
        }
    }
}

/// Builds index records, one per file.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    policy: BoostPolicy,
}

impl DocumentBuilder {
    pub fn new(policy: BoostPolicy) -> Self {
        Self { policy }
    }

    /// Look up the signals for `id` and assemble its record.
    ///
    /// Every lookup the active configuration requires must succeed; a miss
    /// is reported as [`Error::MissingSignal`]. The file is opened last, so
    /// a missing signal never touches the filesystem.
    pub fn build(
        &self,
        file: &DiscoveredFile,
        id: &DocumentId,
        signals: &SignalSet,
    ) -> Result<DocumentRecord> {
        let title = lookup(signals.titles(), SignalKind::Title, id)?;

        let (anchor, boosts) = match signals {
            SignalSet::Full {
                anchors,
                importance,
                ..
            } => {
                let anchor = lookup(anchors, SignalKind::Anchor, id)?;
                let score = *lookup(importance, SignalKind::Importance, id)?;
                (Some(anchor), self.policy.full(score))
            }
            SignalSet::AnchorOnly { anchors, .. } => {
                let anchor = lookup(anchors, SignalKind::Anchor, id)?;
                (Some(anchor), self.policy.anchor_only())
            }
            SignalSet::Plain { .. } => (None, self.policy.plain()),
        };
        let boosts = boosts.validated(id)?;

        let contents = ContentStream::open(&file.path).map_err(|source| {
            Error::DocumentRead {
                path: file.path.clone(),
                source,
            }
        })?;

        Ok(DocumentRecord {
            path: file.path.to_string_lossy().into_owned(),
            last_modified: file.last_modified_ms,
            title: Weighted::new(title.clone(), boosts.title),
            anchor: anchor
                .zip(boosts.anchor)
                .map(|(text, boost)| Weighted::new(text.clone(), boost)),
            contents: Weighted::new(contents, boosts.contents),
        })
    }
}

fn lookup<'a, V>(
    table: &'a SignalTable<V>,
    kind: SignalKind,
    id: &DocumentId,
) -> Result<&'a V> {
    table.get(id.as_str()).ok_or_else(|| Error::MissingSignal {
        table: kind,
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::signals::{ScoreTable, TextTable};

    fn titles() -> TextTable {
        [("doc1", "doc1".to_string()), ("doc2", "Second".to_string())]
            .into_iter()
            .collect()
    }

    fn anchors() -> TextTable {
        [
            ("doc1", "click here".to_string()),
            ("doc2", "read more".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn importance() -> ScoreTable {
        [("doc1", 0.5_f32), ("doc2", 2.0)].into_iter().collect()
    }

    fn fixture(dir: &Path, name: &str) -> (DiscoveredFile, DocumentId) {
        let path = dir.join(name);
        std::fs::write(&path, "some body text").unwrap();
        let file = DiscoveredFile {
            path,
            last_modified_ms: 1_700_000_000_123,
        };
        (file, DocumentId::resolve(name))
    }

    #[test]
    fn full_scenario_boosts() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc1");
        let signals = SignalSet::Full {
            titles: titles(),
            anchors: anchors(),
            importance: importance(),
        };

        let record = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap();

        assert_eq!(record.title.boost, 0.5);
        assert_eq!(record.anchor.as_ref().unwrap().boost, 0.8_f32 * 0.5);
        assert_eq!(record.contents.boost, 0.5);
        assert_eq!(record.anchor.unwrap().value, "click here");
        assert_eq!(record.title.value, "doc1");
        assert_eq!(record.last_modified, 1_700_000_000_123);
        assert_eq!(record.path, file.path.to_string_lossy());
    }

    #[test]
    fn full_boosts_scale_with_importance() {
        let policy = BoostPolicy::default();
        for (_, score) in [("doc1", 0.5_f32), ("doc2", 2.0), ("doc3", 0.013)] {
            let boosts = policy.full(score);
            assert_eq!(boosts.title, 1.0 * score);
            assert_eq!(boosts.anchor, Some(0.8 * score));
            assert_eq!(boosts.contents, score);
        }
    }

    #[test]
    fn anchor_only_boosts_are_constant() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc2");
        let signals = SignalSet::AnchorOnly {
            titles: titles(),
            anchors: anchors(),
        };

        let record = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap();

        assert_eq!(record.title.boost, 1.0);
        assert_eq!(record.anchor.unwrap().boost, 0.8);
        assert_eq!(record.contents.boost, 1.0);
    }

    #[test]
    fn plain_has_no_anchor() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc2");
        let signals = SignalSet::Plain { titles: titles() };

        let record = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap();

        assert!(record.anchor.is_none());
        assert_eq!(record.title.value, "Second");
        assert_eq!(record.title.boost, 1.0);
        assert_eq!(record.contents.boost, 1.0);
    }

    #[test]
    fn missing_title_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc3");
        let signals = SignalSet::Plain { titles: titles() };

        let err = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingSignal {
                table: SignalKind::Title,
                ..
            }
        ));
    }

    #[test]
    fn missing_importance_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc2");
        let signals = SignalSet::Full {
            titles: titles(),
            anchors: anchors(),
            importance: [("doc1", 0.5_f32)].into_iter().collect(),
        };

        let err = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap_err();
        match err {
            Error::MissingSignal { table, id } => {
                assert_eq!(table, SignalKind::Importance);
                assert_eq!(id, "doc2");
            }
            other => panic!("expected MissingSignal, got {other:?}"),
        }
    }

    #[test]
    fn zero_importance_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc1");
        let signals = SignalSet::Full {
            titles: titles(),
            anchors: anchors(),
            importance: [("doc1", 0.0_f32)].into_iter().collect(),
        };

        let err = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBoost { .. }));
    }

    #[test]
    fn unreadable_file_is_document_read_error() {
        let file = DiscoveredFile {
            path: PathBuf::from("/nonexistent/boostdex/doc1"),
            last_modified_ms: 0,
        };
        let id = DocumentId::resolve("doc1");
        let signals = SignalSet::Plain { titles: titles() };

        let err = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap_err();
        assert!(matches!(err, Error::DocumentRead { .. }));
        assert!(err.is_per_document());
    }

    #[test]
    fn missing_anchor_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc1");
        let signals = SignalSet::AnchorOnly {
            titles: titles(),
            anchors: TextTable::default(),
        };

        let err = DocumentBuilder::default()
            .build(&file, &id, &signals)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingSignal {
                table: SignalKind::Anchor,
                ..
            }
        ));
        assert!(err.is_per_document());
    }

    #[test]
    fn custom_policy_is_used() {
        let tmp = tempfile::tempdir().unwrap();
        let (file, id) = fixture(tmp.path(), "doc2");
        let signals = SignalSet::AnchorOnly {
            titles: titles(),
            anchors: anchors(),
        };
        let policy = BoostPolicy {
            title_base: 3.0,
            anchor_base: 1.5,
        };

        let record = DocumentBuilder::new(policy)
            .build(&file, &id, &signals)
            .unwrap();
        assert_eq!(record.title.boost, 3.0);
        assert_eq!(record.anchor.unwrap().boost, 1.5);
    }
}
