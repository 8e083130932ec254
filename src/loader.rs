//! Tick file loader and streaming interface.
//!
//! Streams [`Record`]s out of a comma-delimited tick file without reading the
//! whole file into memory. Each line goes through
//! [`decode_line`](crate::decoder::decode_line); lines with an ineligible
//! condition code are counted and dropped, and lines that fail to decode are
//! either skipped with a warning or end the stream, depending on
//! [`skip_invalid`](TickFileLoader::skip_invalid).
//!
//! # Example
//!
//! ```no_run
//! use tick_ledger::{LedgerTable, TickFileLoader};
//!
//! let loader = TickFileLoader::new("ticks.csv")?.skip_invalid(true);
//! let mut table = LedgerTable::new();
//!
//! for record in loader.iter_records()? {
//!     table.process(&record)?;
//! }
//!
//! println!("Total orders: {}", table.total_orders());
//! # Ok::<(), tick_ledger::LedgerError>(())
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::decoder::{decode_line, LineOutcome};
use crate::error::{LedgerError, Result};
use crate::types::Record;
use crate::warnings::WarningTracker;

/// I/O buffer size for file reading.
pub const IO_BUFFER_SIZE: usize = 1024 * 1024; // 1 MB

/// Counters for one pass over a tick file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Non-blank lines read
    pub lines_read: u64,

    /// Lines decoded into records
    pub records_accepted: u64,

    /// Lines dropped for an ineligible condition code
    pub records_filtered: u64,

    /// Lines that failed to decode
    pub lines_rejected: u64,

    /// File size in bytes
    pub file_size: u64,
}

/// Tick file loader.
///
/// Handles file I/O and line decoding only. Ordering checks and statistics
/// belong to the ledgers.
#[derive(Debug)]
pub struct TickFileLoader {
    /// Path to the tick file
    path: PathBuf,

    /// Statistics
    stats: LoaderStats,

    /// Skip lines that fail to decode (instead of ending the stream)
    skip_invalid: bool,

    /// Stop after reading this many non-blank lines
    limit: Option<u64>,
}

impl TickFileLoader {
    /// Create a loader for `path`.
    ///
    /// # Errors
    ///
    /// `Io` if the file does not exist or its metadata cannot be read.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(LedgerError::Io(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let file_size = std::fs::metadata(&path)
            .map_err(|e| LedgerError::Io(format!("Failed to read file metadata: {e}")))?
            .len();

        Ok(Self {
            path,
            stats: LoaderStats {
                file_size,
                ..Default::default()
            },
            skip_invalid: true,
            limit: None,
        })
    }

    /// Choose whether undecodable lines are skipped (default) or end the
    /// stream with an error available from [`RecordIterator::take_error`].
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    /// Stop after reading `limit` non-blank lines, whatever became of them.
    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get statistics.
    pub fn stats(&self) -> &LoaderStats {
        &self.stats
    }

    /// Open the file and stream its records.
    pub fn iter_records(self) -> Result<RecordIterator<BufReader<File>>> {
        let file = File::open(&self.path)
            .map_err(|e| LedgerError::Io(format!("Failed to open file: {e}")))?;
        let reader = BufReader::with_capacity(IO_BUFFER_SIZE, file);

        log::debug!("Reading ticks from {}", self.path.display());

        Ok(RecordIterator {
            reader,
            buffer: Vec::new(),
            line_number: 0,
            stats: self.stats,
            skip_invalid: self.skip_invalid,
            limit: self.limit,
            warnings: WarningTracker::new(),
            error: None,
        })
    }

    /// Read every record into a `Vec`.
    ///
    /// In strict mode the first decode error is returned.
    pub fn read_all(self) -> Result<Vec<Record>> {
        let mut iter = self.iter_records()?;
        let records: Vec<Record> = iter.by_ref().collect();
        match iter.take_error() {
            Some(err) => Err(err),
            None => Ok(records),
        }
    }
}

/// Iterator over the records of a tick stream.
pub struct RecordIterator<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line_number: u64,
    stats: LoaderStats,
    skip_invalid: bool,
    limit: Option<u64>,
    warnings: WarningTracker,
    error: Option<LedgerError>,
}

impl<R: BufRead> RecordIterator<R> {
    /// Stream records from any buffered reader, skipping invalid lines.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
            stats: LoaderStats::default(),
            skip_invalid: true,
            limit: None,
            warnings: WarningTracker::new(),
            error: None,
        }
    }

    /// Choose whether undecodable lines are skipped.
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    /// Get current statistics.
    pub fn stats(&self) -> &LoaderStats {
        &self.stats
    }

    /// Decode failures seen so far.
    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    /// Consume the iterator, keeping its decode warnings.
    pub fn into_warnings(self) -> WarningTracker {
        self.warnings
    }

    /// Move the decode warnings out, leaving an empty tracker behind.
    pub fn take_warnings(&mut self) -> WarningTracker {
        std::mem::replace(&mut self.warnings, WarningTracker::new())
    }

    /// The error that ended the stream early, if any.
    pub fn take_error(&mut self) -> Option<LedgerError> {
        self.error.take()
    }

    fn limit_reached(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.stats.lines_read >= limit)
    }
}

impl<R: BufRead> Iterator for RecordIterator<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }

        loop {
            if self.limit_reached() {
                return None;
            }

            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    log::error!("Failed to read line {}: {e}", self.line_number + 1);
                    self.error = Some(e.into());
                    return None;
                }
            }
            self.line_number += 1;

            // Symbols in some exchange files are Latin-1; keep the line.
            let line = String::from_utf8_lossy(&self.buffer);
            if line.trim().is_empty() {
                continue;
            }
            self.stats.lines_read += 1;

            match decode_line(&line) {
                Ok(LineOutcome::Accepted(record)) => {
                    self.stats.records_accepted += 1;
                    return Some(record);
                }
                Ok(LineOutcome::Filtered {
                    symbol,
                    condition_code,
                }) => {
                    log::trace!(
                        "Line {}: filtered {symbol} with condition '{condition_code}'",
                        self.line_number
                    );
                    self.stats.records_filtered += 1;
                }
                Err(e) => {
                    self.stats.lines_rejected += 1;
                    self.warnings.record_decode_failure(self.line_number, &e);
                    if self.skip_invalid {
                        log::warn!("Skipping line {}: {e}", self.line_number);
                    } else {
                        log::error!("Invalid line {}: {e}", self.line_number);
                        self.error = Some(e);
                        return None;
                    }
                }
            }
        }
    }
}
