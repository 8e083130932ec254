//! # tick-ledger
//!
//! Per-instrument tick statistics for market data replays.
//!
//! The library ingests a stream of tick records (trades plus bid and ask quote
//! changes) and keeps, for every symbol, the time between consecutive trades,
//! the time between consecutive price changes on either side of the book
//! ("ticks"), and the bid/ask spread. Across symbols it tracks which symbol
//! has the longest gap between trades and the longest gap between ticks.
//!
//! ## Features
//!
//! - **Exact statistics**: mean, median and maximum recomputed from the full
//!   history of each series
//! - **Order checks**: out-of-order timestamps are reported, never absorbed
//! - **Streaming input**: tick files are decoded line by line
//! - **Parallel replay**: symbols are independent and can be ingested on a
//!   rayon pool
//!
//! ## Quick Start
//!
//! ```rust
//! use tick_ledger::{EventKind, LedgerTable, Record};
//!
//! let mut table = LedgerTable::new();
//!
//! table.process(&Record::new("ABC", EventKind::Trade, 100)).unwrap();
//! table.process(&Record::new("ABC", EventKind::Trade, 110)).unwrap();
//! table.process(&Record::new("ABC", EventKind::Trade, 125)).unwrap();
//!
//! let abc = table.symbol_snapshot("ABC").unwrap();
//! assert_eq!(abc.mean_trade_interval, 12.5);
//! assert_eq!(abc.max_trade_interval, 15.0);
//! assert_eq!(table.total_orders(), 3);
//! ```
//!
//! ### Load from a tick file
//!
//! ```no_run
//! use tick_ledger::{report, LedgerTable, TickFileLoader};
//!
//! let loader = TickFileLoader::new("data/ticks.csv")?;
//! let mut table = LedgerTable::new();
//!
//! for record in loader.iter_records()? {
//!     table.process(&record)?;
//! }
//!
//! print!("{}", report::summary(&table));
//! report::save_report("output.txt", &table.snapshot())?;
//! # Ok::<(), tick_ledger::LedgerError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Core types: `Record`, `EventKind`, `LedgerSnapshot`, `GapLeader` |
//! | [`ledger`] | Statistics: `SymbolLedger`, `LedgerTable`, `LedgerConfig` |
//! | [`statistics`] | Pure `mean` / `median` / `max` over a series |
//! | [`decoder`] | Tick line decoding and condition-code filter |
//! | [`loader`] | Streaming tick file reader |
//! | [`source`] | `RecordSource` trait and implementations |
//! | [`report`] | Fixed-width table, run summary, JSON export |
//! | [`warnings`] | Warning tracking: `WarningTracker`, `Warning`, `WarningCategory` |

pub mod decoder;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod report;
pub mod source;
pub mod statistics;
pub mod types;
pub mod warnings;

// Re-exports - Core types
pub use error::{LedgerError, Result};
pub use types::{
    format_timestamp, EventKind, GapLeader, LedgerSnapshot, OutOfOrderEvent, QuoteMark, Record,
    Timestamp,
};

// Re-exports - Ledgers
pub use ledger::{
    DuplicateQuotePolicy, IngestOutcome, LedgerConfig, LedgerTable, StatsMode, SymbolLedger,
    TableStats,
};

// Re-exports - Statistics
pub use statistics::SeriesStats;

// Re-exports - Input
pub use decoder::{decode_line, LineOutcome};
pub use loader::{LoaderStats, RecordIterator, TickFileLoader, IO_BUFFER_SIZE};
pub use source::{
    FileRecords, FileSource, RecordSource, RecordStream, SourceMetadata, VecRecords, VecSource,
};

// Re-exports - Reporting
pub use report::TableReport;

// Re-exports - Warnings
pub use warnings::{
    Warning, WarningCategory, WarningSummary, WarningTracker, WarningTrackerConfig,
};
