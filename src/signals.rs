//! Relevance signals keyed by document identifier.
//!
//! Signals arrive as line-oriented files produced by an external link-graph
//! job: one `key<sep>value` pair per line. Every table is loaded once,
//! before any document is touched, and is read-only afterwards.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    doc_id::last_segment,
    error::{Error, Result},
};

/// Which signal tables a run loads and requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SignalConfiguration {
    /// Anchor text, importance scores and titles.
    Full,
    /// Anchor text and titles, no importance scores.
    AnchorOnly,
    /// Titles only.
    Plain,
}

impl SignalConfiguration {
    /// Index directory used when none is configured explicitly.
    pub fn default_index_dir(self) -> &'static str {
        match self {
            Self::Full => "HIndex",
            Self::AnchorOnly => "AIndex",
            Self::Plain => "index",
        }
    }
}

/// Names a signal table in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Title,
    Anchor,
    Importance,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Title => "title",
            Self::Anchor => "anchor",
            Self::Importance => "importance",
        })
    }
}

/// How a signal line separates its key from its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// `key<space>url`; the value is the url's final path segment.
    UrlSegment,
    /// `key<tab>value`.
    Tab,
}

impl LineFormat {
    fn split(self, line: &str) -> Option<(&str, &str)> {
        let (key, value) = match self {
            Self::UrlSegment => {
                let mut fields = line.split(' ');
                let key = fields.next()?;
                (key, last_segment(fields.next()?)?)
            }
            Self::Tab => {
                let mut fields = line.split('\t');
                (fields.next()?, fields.next()?)
            }
        };
        (!key.is_empty() && !value.is_empty()).then_some((key, value))
    }
}

/// A value that can be parsed from the value column of a signal line.
pub trait SignalValue: Sized {
    fn parse_signal(raw: &str) -> Option<Self>;
}

impl SignalValue for String {
    fn parse_signal(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl SignalValue for f32 {
    fn parse_signal(raw: &str) -> Option<Self> {
        raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())
    }
}

/// Lookup table from document identifier to a signal value.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable<V> {
    entries: HashMap<String, V>,
}

pub type TextTable = SignalTable<String>;
pub type ScoreTable = SignalTable<f32>;

impl<V> Default for SignalTable<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: SignalValue> SignalTable<V> {
    /// Load a table from a file on disk.
    pub fn load(path: &Path, format: LineFormat) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::SignalFile {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(BufReader::new(file), path, format)?;
        if table.is_empty() {
            warn!(path = %path.display(), "signal table is empty");
        } else {
            debug!(
                path = %path.display(),
                entries = table.len(),
                "loaded signal table"
            );
        }
        Ok(table)
    }

    /// Parse a table from any buffered reader. `source` only labels errors.
    ///
    /// Blank lines are skipped; any other line that does not split into a
    /// non-empty key and value fails the whole load.
    pub fn from_reader<R: BufRead>(
        reader: R,
        source: &Path,
        format: LineFormat,
    ) -> Result<Self> {
        let mut table = Self::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source_err| Error::SignalFile {
                path: source.to_path_buf(),
                source: source_err,
            })?;
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if line.is_empty() {
                continue;
            }

            let (key, raw) =
                format.split(line).ok_or_else(|| Error::MalformedSignalLine {
                    path: source.to_path_buf(),
                    line: idx + 1,
                    content: line.to_string(),
                })?;
            let value = V::parse_signal(raw).ok_or_else(|| {
                Error::InvalidNumericSignal {
                    path: source.to_path_buf(),
                    line: idx + 1,
                    value: raw.to_string(),
                }
            })?;

            if table.entries.insert(key.to_string(), value).is_some() {
                debug!(key, line = idx + 1, "duplicate key, keeping last");
            }
        }

        Ok(table)
    }
}

impl<V> SignalTable<V> {
    pub fn get(&self, id: &str) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for SignalTable<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Locations of the signal files on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalPaths {
    /// Identifier to url table (`key<space>url`).
    pub urls: PathBuf,
    /// Aggregated anchor text (`key<tab>text`).
    pub anchors: PathBuf,
    /// Link-graph importance scores (`key<tab>float`).
    pub importance: PathBuf,
    /// Optional title table (`key<tab>title`). When absent, titles are the
    /// final url segments from `urls`.
    pub titles: Option<PathBuf>,
}

impl Default for SignalPaths {
    fn default() -> Self {
        Self {
            urls: PathBuf::from("wiki/id2url"),
            anchors: PathBuf::from("anchor.txt"),
            importance: PathBuf::from("pagerank.txt"),
            titles: None,
        }
    }
}

impl SignalPaths {
    /// Files that must exist for a run with `configuration`.
    pub fn required(&self, configuration: SignalConfiguration) -> Vec<&Path> {
        let mut files = vec![self.titles.as_deref().unwrap_or(&self.urls)];
        if configuration != SignalConfiguration::Plain {
            files.push(&self.anchors);
        }
        if configuration == SignalConfiguration::Full {
            files.push(&self.importance);
        }
        files
    }
}

/// The signal tables of one run. Each variant carries exactly the tables
/// its configuration populates.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalSet {
    Full {
        titles: TextTable,
        anchors: TextTable,
        importance: ScoreTable,
    },
    AnchorOnly {
        titles: TextTable,
        anchors: TextTable,
    },
    Plain {
        titles: TextTable,
    },
}

impl SignalSet {
    /// Load every table `configuration` requires, failing on the first
    /// unreadable or malformed file.
    pub fn load(
        configuration: SignalConfiguration,
        paths: &SignalPaths,
    ) -> Result<Self> {
        let titles = match &paths.titles {
            Some(path) => TextTable::load(path, LineFormat::Tab)?,
            None => TextTable::load(&paths.urls, LineFormat::UrlSegment)?,
        };

        let set = match configuration {
            SignalConfiguration::Full => Self::Full {
                titles,
                anchors: TextTable::load(&paths.anchors, LineFormat::Tab)?,
                importance: ScoreTable::load(
                    &paths.importance,
                    LineFormat::Tab,
                )?,
            },
            SignalConfiguration::AnchorOnly => Self::AnchorOnly {
                titles,
                anchors: TextTable::load(&paths.anchors, LineFormat::Tab)?,
            },
            SignalConfiguration::Plain => Self::Plain { titles },
        };

        info!(
            signals = ?configuration,
            titles = set.titles().len(),
            anchors = set.anchors().map_or(0, SignalTable::len),
            importance = set.importance().map_or(0, SignalTable::len),
            "signal tables loaded"
        );
        Ok(set)
    }

    pub fn configuration(&self) -> SignalConfiguration {
        match self {
            Self::Full { .. } => SignalConfiguration::Full,
            Self::AnchorOnly { .. } => SignalConfiguration::AnchorOnly,
            Self::Plain { .. } => SignalConfiguration::Plain,
        }
    }

    pub fn titles(&self) -> &TextTable {
        match self {
            Self::Full { titles, .. }
            | Self::AnchorOnly { titles, .. }
            | Self::Plain { titles } => titles,
        }
    }

    pub fn anchors(&self) -> Option<&TextTable> {
        match self {
            Self::Full { anchors, .. } | Self::AnchorOnly { anchors, .. } => {
                Some(anchors)
            }
            Self::Plain { .. } => None,
        }
    }

    pub fn importance(&self) -> Option<&ScoreTable> {
        match self {
            Self::Full { importance, .. } => Some(importance),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn parse<V: SignalValue>(
        input: &str,
        format: LineFormat,
    ) -> Result<SignalTable<V>> {
        SignalTable::from_reader(
            Cursor::new(input),
            Path::new("test.txt"),
            format,
        )
    }

    #[test]
    fn url_table_keeps_final_segment() {
        let table: TextTable = parse(
            "doc1 http://site/a/doc1\ndoc2 http://site/b/Page_Two/\n",
            LineFormat::UrlSegment,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("doc1").map(String::as_str), Some("doc1"));
        assert_eq!(table.get("doc2").map(String::as_str), Some("Page_Two"));
    }

    #[test]
    fn tab_table_keeps_second_field() {
        let table: TextTable =
            parse("doc1\tclick here\ndoc2\tmore\textra\n", LineFormat::Tab)
                .unwrap();
        assert_eq!(table.get("doc1").map(String::as_str), Some("click here"));
        assert_eq!(table.get("doc2").map(String::as_str), Some("more"));
    }

    #[test]
    fn scores_parse_as_floats() {
        let table: ScoreTable =
            parse("doc1\t0.5\ndoc2\t 1.25 \r\n", LineFormat::Tab).unwrap();
        assert_eq!(table.get("doc1"), Some(&0.5));
        assert_eq!(table.get("doc2"), Some(&1.25));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let table: TextTable =
            parse("\ndoc1\ttext\n\n", LineFormat::Tab).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn empty_file_loads_empty_table() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("anchor.txt");
        std::fs::write(&path, "\n").unwrap();

        let table = TextTable::load(&path, LineFormat::Tab).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.get("doc1"), None);
    }

    #[test]
    fn duplicate_keys_keep_last() {
        let table: ScoreTable =
            parse("doc1\t0.1\ndoc1\t0.9\n", LineFormat::Tab).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("doc1"), Some(&0.9));
    }

    #[test]
    fn missing_separator_is_malformed() {
        let err = parse::<String>("doc1\ttext\ndoc2 no tab\n", LineFormat::Tab)
            .unwrap_err();
        match err {
            Error::MalformedSignalLine { line, content, .. } => {
                assert_eq!(line, 2);
                assert_eq!(content, "doc2 no tab");
            }
            other => panic!("expected MalformedSignalLine, got {other:?}"),
        }
    }

    #[test]
    fn empty_value_is_malformed() {
        let err = parse::<String>("doc1\t\n", LineFormat::Tab).unwrap_err();
        assert!(matches!(err, Error::MalformedSignalLine { line: 1, .. }));

        let err = parse::<String>("doc1 /\n", LineFormat::UrlSegment)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSignalLine { line: 1, .. }));
    }

    #[test]
    fn bad_score_is_invalid_numeric() {
        let err = parse::<f32>("doc1\t0.5\ndoc2\thigh\n", LineFormat::Tab)
            .unwrap_err();
        match err {
            Error::InvalidNumericSignal { line, value, .. } => {
                assert_eq!(line, 2);
                assert_eq!(value, "high");
            }
            other => panic!("expected InvalidNumericSignal, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_score_is_invalid_numeric() {
        let err = parse::<f32>("doc1\tNaN\n", LineFormat::Tab).unwrap_err();
        assert!(matches!(err, Error::InvalidNumericSignal { .. }));
    }

    #[test]
    fn missing_file_is_signal_file_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = TextTable::load(&tmp.path().join("nope.txt"), LineFormat::Tab)
            .unwrap_err();
        assert!(matches!(err, Error::SignalFile { .. }));
    }

    fn write_signals(dir: &Path) -> SignalPaths {
        std::fs::create_dir_all(dir.join("wiki")).unwrap();
        std::fs::write(dir.join("wiki/id2url"), "doc1 http://site/a/doc1\n")
            .unwrap();
        std::fs::write(dir.join("anchor.txt"), "doc1\tclick here\n").unwrap();
        std::fs::write(dir.join("pagerank.txt"), "doc1\t0.5\n").unwrap();
        SignalPaths {
            urls: dir.join("wiki/id2url"),
            anchors: dir.join("anchor.txt"),
            importance: dir.join("pagerank.txt"),
            titles: None,
        }
    }

    #[test]
    fn load_full_set() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = write_signals(tmp.path());

        let set = SignalSet::load(SignalConfiguration::Full, &paths).unwrap();
        assert_eq!(set.configuration(), SignalConfiguration::Full);
        assert_eq!(set.titles().get("doc1").map(String::as_str), Some("doc1"));
        assert_eq!(
            set.anchors().and_then(|t| t.get("doc1")).map(String::as_str),
            Some("click here")
        );
        assert_eq!(set.importance().and_then(|t| t.get("doc1")), Some(&0.5));
    }

    #[test]
    fn plain_set_ignores_other_tables() {
        let tmp = tempfile::tempdir().unwrap();
        let mut paths = write_signals(tmp.path());
        paths.anchors = tmp.path().join("missing-anchor.txt");
        paths.importance = tmp.path().join("missing-pagerank.txt");

        let set = SignalSet::load(SignalConfiguration::Plain, &paths).unwrap();
        assert!(set.anchors().is_none());
        assert!(set.importance().is_none());
    }

    #[test]
    fn anchor_only_set_has_no_importance() {
        let tmp = tempfile::tempdir().unwrap();
        let mut paths = write_signals(tmp.path());
        paths.importance = tmp.path().join("missing-pagerank.txt");

        let set =
            SignalSet::load(SignalConfiguration::AnchorOnly, &paths).unwrap();
        assert!(set.anchors().is_some());
        assert!(set.importance().is_none());
    }

    #[test]
    fn explicit_title_table_replaces_urls() {
        let tmp = tempfile::tempdir().unwrap();
        let mut paths = write_signals(tmp.path());
        std::fs::write(tmp.path().join("titles.txt"), "doc1\tFirst Doc\n")
            .unwrap();
        paths.titles = Some(tmp.path().join("titles.txt"));
        paths.urls = tmp.path().join("missing-id2url");

        let set = SignalSet::load(SignalConfiguration::Plain, &paths).unwrap();
        assert_eq!(
            set.titles().get("doc1").map(String::as_str),
            Some("First Doc")
        );
    }

    #[test]
    fn required_files_follow_configuration() {
        let paths = SignalPaths::default();
        assert_eq!(paths.required(SignalConfiguration::Plain).len(), 1);
        assert_eq!(paths.required(SignalConfiguration::AnchorOnly).len(), 2);
        assert_eq!(paths.required(SignalConfiguration::Full).len(), 3);
    }
}
