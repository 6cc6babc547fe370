//! boostdex - build a full-text index whose fields are weighted by external
//! relevance signals.
//!
//! Each file under a document root is joined, by its file name, against
//! signal tables produced elsewhere (link-graph importance scores,
//! aggregated anchor text, titles). The signals decide the boost weight of
//! every text field before the document is written into a
//! [Tantivy](https://github.com/quickwit-oss/tantivy) index.
//!
//! # Quick start
//!
//! ```no_run
//! use boostdex::{
//!     DocumentBuilder, OpenMode, SearchIndex, SignalConfiguration, SignalSet,
//!     ingestion, signals::SignalPaths,
//! };
//!
//! let paths = SignalPaths::default();
//! let signals = SignalSet::load(SignalConfiguration::Full, &paths).unwrap();
//! let index = SearchIndex::open("HIndex".as_ref()).unwrap();
//! let mut session = index.session(OpenMode::FreshBuild, 50_000_000).unwrap();
//!
//! let report = ingestion::ingest(
//!     "docs".as_ref(),
//!     &signals,
//!     &DocumentBuilder::default(),
//!     &mut session,
//!     |_| {},
//! )
//! .unwrap();
//! session.finish().unwrap();
//! println!("indexed {} documents", report.indexed);
//! ```

pub mod builder;
pub mod config;
pub mod doc_id;
pub mod error;
pub mod ingestion;
pub mod record;
pub mod signals;
pub mod tantivy_index;
pub mod walker;
pub mod writer;

pub use builder::{BoostPolicy, DocumentBuilder};
pub use config::RunConfig;
pub use doc_id::DocumentId;
pub use error::{Error, Result};
pub use record::DocumentRecord;
pub use signals::{SignalConfiguration, SignalSet};
pub use tantivy_index::SearchIndex;
pub use writer::{IndexSink, OpenMode};
