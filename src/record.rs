use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

/// A field value together with its boost weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Weighted<T> {
    pub value: T,
    pub boost: f32,
}

impl<T> Weighted<T> {
    pub fn new(value: T, boost: f32) -> Self {
        Self { value, boost }
    }
}

/// Readable handle over a document's bytes.
///
/// The underlying file stays open only as long as the stream lives; it is
/// closed on drop whether or not the record was written.
pub struct ContentStream {
    inner: Box<dyn Read + Send>,
}

impl ContentStream {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            inner: Box::new(reader),
        }
    }

    /// Drain the stream as UTF-8 text. Invalid sequences are replaced with
    /// U+FFFD rather than rejected.
    pub fn into_text(mut self) -> io::Result<String> {
        let mut bytes = Vec::new();
        self.inner.read_to_end(&mut bytes)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }
}

impl Read for ContentStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream").finish_non_exhaustive()
    }
}

/// One document ready to be written to the index.
///
/// Built fresh per file and moved into the index sink, so it can never be
/// written twice or shared between files.
#[derive(Debug)]
pub struct DocumentRecord {
    /// File location; the unique key for incremental updates.
    pub path: String,
    /// Last modification time in epoch milliseconds.
    pub last_modified: i64,
    pub title: Weighted<String>,
    /// Present only when anchor signals are in use.
    pub anchor: Option<Weighted<String>>,
    pub contents: Weighted<ContentStream>,
}
