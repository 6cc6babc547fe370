use std::path::Path;

use tantivy::{
    Index,
    IndexReader,
    IndexWriter,
    TantivyDocument,
    Term,
    collector::{Count, TopDocs},
    query::{QueryParser, TermQuery},
    schema::*,
    tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer},
};
use tracing::info;

use crate::{
    error::{Error, Result},
    record::DocumentRecord,
    writer::{IndexSink, OpenMode},
};

/// Field names used in the schema.
pub mod fields {
    pub const PATH: &str = "path";
    pub const MODIFIED: &str = "modified";
    pub const TITLE: &str = "title";
    pub const ANCHOR: &str = "anchor";
    pub const CONTENTS: &str = "contents";
    pub const TITLE_BOOST: &str = "title_boost";
    pub const ANCHOR_BOOST: &str = "anchor_boost";
    pub const CONTENTS_BOOST: &str = "contents_boost";
}

const ANALYZER: &str = "standard";

/// Default writer memory budget (in bytes).
pub const DEFAULT_MEMORY_BUDGET: usize = 50_000_000;

/// Owns the Tantivy index that signal-weighted documents are written to.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    fields: SchemaFields,
}

/// Resolved field handles for the schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaFields {
    pub path: Field,
    pub modified: Field,
    pub title: Field,
    pub anchor: Field,
    pub contents: Field,
    pub title_boost: Field,
    pub anchor_boost: Field,
    pub contents_boost: Field,
}

/// A document read back from the index. `contents` is not stored, so it
/// cannot be read back.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub path: String,
    pub last_modified: i64,
    pub title: String,
    pub anchor: Option<String>,
    pub title_boost: f32,
    pub anchor_boost: Option<f32>,
    pub contents_boost: f32,
}

fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field(fields::PATH, STRING | STORED);
    builder.add_i64_field(fields::MODIFIED, INDEXED | STORED | FAST);

    let indexing = TextFieldIndexing::default()
        .set_tokenizer(ANALYZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let stored_text = TextOptions::default()
        .set_indexing_options(indexing.clone())
        .set_stored();
    builder.add_text_field(fields::TITLE, stored_text.clone());
    builder.add_text_field(fields::ANCHOR, stored_text);
    builder.add_text_field(
        fields::CONTENTS,
        TextOptions::default().set_indexing_options(indexing),
    );

    // Tantivy has no index-time field boosts; the weights are kept per
    // document for the query side to apply.
    builder.add_f64_field(fields::TITLE_BOOST, STORED | FAST);
    builder.add_f64_field(fields::ANCHOR_BOOST, STORED | FAST);
    builder.add_f64_field(fields::CONTENTS_BOOST, STORED | FAST);

    builder.build()
}

fn resolve_fields(schema: &Schema) -> Result<SchemaFields> {
    let f = |name: &str| {
        schema.get_field(name).map_err(|_| {
            Error::Config(format!(
                "index schema has no '{name}' field; \
                 was it built by another tool?"
            ))
        })
    };
    Ok(SchemaFields {
        path: f(fields::PATH)?,
        modified: f(fields::MODIFIED)?,
        title: f(fields::TITLE)?,
        anchor: f(fields::ANCHOR)?,
        contents: f(fields::CONTENTS)?,
        title_boost: f(fields::TITLE_BOOST)?,
        anchor_boost: f(fields::ANCHOR_BOOST)?,
        contents_boost: f(fields::CONTENTS_BOOST)?,
    })
}

fn register_tokenizers(index: &Index) {
    let standard = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(255))
        .filter(LowerCaser)
        .build();
    index.tokenizers().register(ANALYZER, standard);
}

impl SearchIndex {
    /// Open or create a search index at the given directory.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mmap_dir = tantivy::directory::MmapDirectory::open(dir)
            .map_err(|e| tantivy::TantivyError::SystemError(e.to_string()))?;
        let index = if Index::exists(&mmap_dir)
            .map_err(|e| tantivy::TantivyError::SystemError(e.to_string()))?
        {
            Index::open(mmap_dir)?
        } else {
            info!(dir = %dir.display(), "creating new index");
            Index::create(
                mmap_dir,
                build_schema(),
                tantivy::IndexSettings::default(),
            )?
        };

        Self::from_index(index)
    }

    /// Create an in-memory search index (for testing).
    pub fn open_in_ram() -> Result<Self> {
        Self::from_index(Index::create_in_ram(build_schema()))
    }

    fn from_index(index: Index) -> Result<Self> {
        let fields = resolve_fields(&index.schema())?;
        register_tokenizers(&index);
        let reader = index.reader()?;
        Ok(Self {
            index,
            reader,
            fields,
        })
    }

    /// Start a single-threaded write session.
    ///
    /// A [`OpenMode::FreshBuild`] session deletes every existing document
    /// before anything is written, so its appends never collide with old
    /// entries.
    pub fn session(
        &self,
        mode: OpenMode,
        memory_budget: usize,
    ) -> Result<IndexSession> {
        let writer = self.index.writer_with_num_threads(1, memory_budget)?;
        if mode == OpenMode::FreshBuild {
            writer.delete_all_documents()?;
        }
        Ok(IndexSession {
            writer,
            mode,
            fields: self.fields,
        })
    }

    /// Number of live documents as of the last commit.
    pub fn num_docs(&self) -> Result<u64> {
        self.reader.reload()?;
        Ok(self.reader.searcher().num_docs())
    }

    /// Number of live documents whose `path` is exactly `path`.
    pub fn count_path(&self, path: &str) -> Result<usize> {
        self.reader.reload()?;
        let query = self.path_query(path);
        Ok(self.reader.searcher().search(&query, &Count)?)
    }

    /// Read back the document stored under `path`, if any.
    pub fn find_by_path(&self, path: &str) -> Result<Option<StoredDocument>> {
        self.reader.reload()?;
        let searcher = self.reader.searcher();
        let query = self.path_query(path);

        let Some((_, address)) = searcher
            .search(&query, &TopDocs::with_limit(1))?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let doc: TantivyDocument = searcher.doc(address)?;
        let f = self.fields;
        Ok(Some(StoredDocument {
            path: extract_text(&doc, f.path).unwrap_or_default(),
            last_modified: doc
                .get_first(f.modified)
                .and_then(|v| v.as_i64())
                .unwrap_or_default(),
            title: extract_text(&doc, f.title).unwrap_or_default(),
            anchor: extract_text(&doc, f.anchor),
            title_boost: extract_boost(&doc, f.title_boost).unwrap_or_default(),
            anchor_boost: extract_boost(&doc, f.anchor_boost),
            contents_boost: extract_boost(&doc, f.contents_boost)
                .unwrap_or_default(),
        }))
    }

    /// Count documents last modified within `[from, to]` (epoch millis).
    pub fn count_modified_between(&self, from: i64, to: i64) -> Result<usize> {
        self.reader.reload()?;
        let parser = QueryParser::for_index(&self.index, vec![]);
        let query = parser
            .parse_query(&format!("{}:[{from} TO {to}]", fields::MODIFIED))
            .map_err(|e| {
                tantivy::TantivyError::InvalidArgument(e.to_string())
            })?;
        Ok(self.reader.searcher().search(&query, &Count)?)
    }

    /// Count documents matching `query` in the title, anchor or contents
    /// fields.
    pub fn count_matching(&self, query: &str) -> Result<usize> {
        self.reader.reload()?;
        let f = self.fields;
        let parser = QueryParser::for_index(
            &self.index,
            vec![f.title, f.anchor, f.contents],
        );
        let (query, _errors) = parser.parse_query_lenient(query);
        Ok(self.reader.searcher().search(&query, &Count)?)
    }

    fn path_query(&self, path: &str) -> TermQuery {
        TermQuery::new(
            Term::from_field_text(self.fields.path, path),
            IndexRecordOption::Basic,
        )
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").finish_non_exhaustive()
    }
}

/// The single writer of one ingestion run.
///
/// Nothing written through a session is visible until [`finish`] commits
/// it.
///
/// [`finish`]: IndexSession::finish
pub struct IndexSession {
    writer: IndexWriter,
    mode: OpenMode,
    fields: SchemaFields,
}

impl IndexSession {
    /// Commit everything written in this session.
    pub fn finish(mut self) -> Result<()> {
        self.writer.commit()?;
        Ok(())
    }

    /// Drain the record's content stream into a Tantivy document.
    fn to_document(&self, record: DocumentRecord) -> Result<TantivyDocument> {
        let f = self.fields;
        let DocumentRecord {
            path,
            last_modified,
            title,
            anchor,
            contents,
        } = record;

        let text = contents.value.into_text().map_err(|source| {
            Error::DocumentRead {
                path: path.clone().into(),
                source,
            }
        })?;

        let mut doc = TantivyDocument::default();
        doc.add_text(f.path, &path);
        doc.add_i64(f.modified, last_modified);
        doc.add_text(f.title, &title.value);
        doc.add_f64(f.title_boost, f64::from(title.boost));
        if let Some(anchor) = anchor {
            doc.add_text(f.anchor, &anchor.value);
            doc.add_f64(f.anchor_boost, f64::from(anchor.boost));
        }
        doc.add_text(f.contents, &text);
        doc.add_f64(f.contents_boost, f64::from(contents.boost));
        Ok(doc)
    }
}

impl IndexSink for IndexSession {
    fn open_mode(&self) -> OpenMode {
        self.mode
    }

    fn add(&mut self, record: DocumentRecord) -> Result<()> {
        let doc = self.to_document(record)?;
        self.writer.add_document(doc)?;
        Ok(())
    }

    fn replace(&mut self, key: &str, record: DocumentRecord) -> Result<()> {
        // Read the source first so a failed read leaves the old entry alone.
        let doc = self.to_document(record)?;
        self.writer
            .delete_term(Term::from_field_text(self.fields.path, key));
        self.writer.add_document(doc)?;
        Ok(())
    }
}

fn extract_text(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn extract_boost(doc: &TantivyDocument, field: Field) -> Option<f32> {
    doc.get_first(field)
        .and_then(|v| v.as_f64())
        .map(|b| b as f32)
}
