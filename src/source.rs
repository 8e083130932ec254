//! Record source abstraction.
//!
//! Anything that can yield [`Record`]s in stream order can feed a
//! [`LedgerTable`](crate::LedgerTable) through
//! [`ingest_source`](crate::LedgerTable::ingest_source): a tick file, an
//! in-memory vector, or a custom feed.
//!
//! # Implementing Custom Sources
//!
//! ```
//! use tick_ledger::source::{RecordSource, SourceMetadata, VecRecords};
//! use tick_ledger::{Record, Result};
//!
//! struct Replay {
//!     records: Vec<Record>,
//!     metadata: SourceMetadata,
//! }
//!
//! impl RecordSource for Replay {
//!     type RecordIter = VecRecords;
//!
//!     fn records(self) -> Result<Self::RecordIter> {
//!         Ok(VecRecords::new(self.records))
//!     }
//!
//!     fn metadata(&self) -> &SourceMetadata {
//!         &self.metadata
//!     }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::loader::{RecordIterator, TickFileLoader};
use crate::types::Record;
use crate::warnings::WarningTracker;

/// Metadata about a record source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMetadata {
    /// File path (if loaded from file)
    pub file_path: Option<PathBuf>,

    /// Data provider name (e.g., "file", "memory")
    pub provider: Option<String>,

    /// Estimated record count
    pub estimated_records: Option<u64>,

    /// File size in bytes (if applicable)
    pub file_size: Option<u64>,
}

impl SourceMetadata {
    /// Create new empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file path.
    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the estimated record count.
    pub fn with_estimated_records(mut self, count: u64) -> Self {
        self.estimated_records = Some(count);
        self
    }

    /// Set the file size.
    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }
}

/// Stream of records from a source.
///
/// An `Err` item ends the stream: consumers stop at it and report it.
pub trait RecordStream: Iterator<Item = Result<Record>> {
    /// Move out the warnings collected while streaming.
    fn take_warnings(&mut self) -> WarningTracker {
        WarningTracker::new()
    }
}

/// A single-pass supplier of records.
///
/// `records()` consumes the source; records must come out in stream order.
pub trait RecordSource {
    /// Iterator type returned by [`records`](Self::records).
    type RecordIter: RecordStream;

    /// Start streaming records.
    fn records(self) -> Result<Self::RecordIter>;

    /// Information about the source.
    fn metadata(&self) -> &SourceMetadata;
}

/// In-memory source, mostly for tests and replays.
#[derive(Debug, Clone)]
pub struct VecSource {
    records: Vec<Record>,
    metadata: SourceMetadata,
}

impl VecSource {
    /// Wrap a vector of records.
    pub fn new(records: Vec<Record>) -> Self {
        let metadata = SourceMetadata::new()
            .with_provider("memory")
            .with_estimated_records(records.len() as u64);
        Self { records, metadata }
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Stream over an owned vector of records. Never fails.
#[derive(Debug, Clone)]
pub struct VecRecords {
    inner: std::vec::IntoIter<Record>,
}

impl VecRecords {
    /// Stream `records` in order.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            inner: records.into_iter(),
        }
    }
}

impl Iterator for VecRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl RecordStream for VecRecords {}

impl RecordSource for VecSource {
    type RecordIter = VecRecords;

    fn records(self) -> Result<Self::RecordIter> {
        Ok(VecRecords::new(self.records))
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}

/// Tick file source backed by [`TickFileLoader`].
#[derive(Debug)]
pub struct FileSource {
    loader: TickFileLoader,
    metadata: SourceMetadata,
}

impl FileSource {
    /// Open a tick file.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let loader = TickFileLoader::new(path.as_ref())?;
        let metadata = SourceMetadata::new()
            .with_file_path(loader.path())
            .with_provider("file")
            .with_file_size(loader.stats().file_size);
        Ok(Self { loader, metadata })
    }

    /// Choose whether undecodable lines are skipped.
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.loader = self.loader.skip_invalid(skip);
        self
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        self.loader.path()
    }
}

/// Stream over a tick file.
///
/// Yields the error that stopped the underlying [`RecordIterator`] (an I/O
/// failure, or a decode failure in strict mode) as its last item.
pub struct FileRecords {
    inner: RecordIterator<BufReader<File>>,
    finished: bool,
}

impl FileRecords {
    /// Wrap a file iterator.
    pub fn new(inner: RecordIterator<BufReader<File>>) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    /// Underlying iterator, for its loader statistics.
    pub fn inner(&self) -> &RecordIterator<BufReader<File>> {
        &self.inner
    }
}

impl Iterator for FileRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.inner.next() {
            Some(record) => Some(Ok(record)),
            None => {
                self.finished = true;
                self.inner.take_error().map(Err)
            }
        }
    }
}

impl RecordStream for FileRecords {
    fn take_warnings(&mut self) -> WarningTracker {
        self.inner.take_warnings()
    }
}

impl RecordSource for FileSource {
    type RecordIter = FileRecords;

    fn records(self) -> Result<Self::RecordIter> {
        Ok(FileRecords::new(self.loader.iter_records()?))
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}
