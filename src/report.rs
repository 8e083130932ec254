//! Report rendering for a finished run.
//!
//! The fixed-width table is a compatibility format: a 35-wide symbol column
//! followed by eight 20-wide numeric columns, all left-justified. Trade-time
//! figures use 6 decimal places, tick-time and spread figures 4.
//!
//! ```
//! use tick_ledger::report::{format_row, header};
//! use tick_ledger::LedgerSnapshot;
//!
//! let row = format_row(&LedgerSnapshot::empty("ABC"));
//! assert!(header().starts_with("Symbol"));
//! assert!(row.starts_with("ABC"));
//! assert_eq!(row.len(), header().len());
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ledger::{LedgerTable, TableStats};
use crate::types::{GapLeader, LedgerSnapshot};
use crate::warnings::WarningSummary;

/// Width of the symbol column.
pub const SYMBOL_WIDTH: usize = 35;

/// Width of every numeric column.
pub const VALUE_WIDTH: usize = 20;

/// Column titles after the symbol column, in report order.
pub const COLUMNS: [&str; 8] = [
    "Mean Trade Time",
    "Median Trade Time",
    "Longest Trade Time",
    "Mean Tick Time",
    "Median Tick Time",
    "Longest Tick Time",
    "Mean Spread",
    "Median Spread",
];

/// Header line of the table.
pub fn header() -> String {
    let mut line = format!("{:<SYMBOL_WIDTH$}", "Symbol");
    for title in COLUMNS {
        let _ = write!(line, "{title:<VALUE_WIDTH$}");
    }
    line
}

/// One table row.
pub fn format_row(snapshot: &LedgerSnapshot) -> String {
    let mut line = format!("{:<SYMBOL_WIDTH$}", snapshot.symbol);
    for (i, value) in snapshot.values().into_iter().enumerate() {
        // First three columns are trade-time figures.
        let precision = if i < 3 { 6 } else { 4 };
        let _ = write!(line, "{value:<VALUE_WIDTH$.precision$}");
    }
    line
}

/// Write the header and one row per snapshot.
pub fn write_report<W: Write>(writer: &mut W, snapshots: &[LedgerSnapshot]) -> Result<()> {
    writeln!(writer, "{}", header())?;
    for snapshot in snapshots {
        writeln!(writer, "{}", format_row(snapshot))?;
    }
    Ok(())
}

/// Write the table to `path`, replacing any existing file.
pub fn save_report(path: impl AsRef<Path>, snapshots: &[LedgerSnapshot]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_report(&mut writer, snapshots)?;
    writer.flush()?;

    log::info!("Saved report for {} symbols to {}", snapshots.len(), path.display());
    Ok(())
}

/// Human-readable run summary.
///
/// Lists the symbol count, each book's record count, the total, and both
/// overall longest gaps as `SYMBOL|value seconds`.
pub fn summary(table: &LedgerTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order Table Summary");
    let _ = writeln!(out, "Number of Symbols in Order Table: {}", table.symbol_count());
    for snapshot in table.snapshot() {
        let _ = writeln!(out, "\tOrder Book {} ({})", snapshot.symbol, snapshot.order_count);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Total number of Orders: {}", table.total_orders());
    let _ = writeln!(
        out,
        "Overall Longest Time between Trades: {}",
        table.longest_trade_gap()
    );
    let _ = writeln!(
        out,
        "Overall Longest Time between Tick: {}",
        table.longest_tick_gap()
    );
    out
}

/// Machine-readable form of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub symbol_count: usize,
    pub total_orders: u64,
    pub longest_trade_gap: GapLeader,
    pub longest_tick_gap: GapLeader,
    pub stats: TableStats,
    pub symbols: Vec<LedgerSnapshot>,
}

impl TableReport {
    /// Capture the current state of a table.
    pub fn from_table(table: &LedgerTable) -> Self {
        Self {
            symbol_count: table.symbol_count(),
            total_orders: table.total_orders(),
            longest_trade_gap: table.longest_trade_gap(),
            longest_tick_gap: table.longest_tick_gap(),
            stats: table.stats().clone(),
            symbols: table.snapshot(),
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    report: &'a TableReport,
    warnings: WarningSummary,
}

/// Write the table (plus a warning summary) to `path` as pretty JSON.
pub fn save_json(path: impl AsRef<Path>, table: &LedgerTable) -> Result<()> {
    let path = path.as_ref();
    let report = TableReport::from_table(table);
    let document = JsonDocument {
        report: &report,
        warnings: table.warnings().summary(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writeln!(writer)?;
    writer.flush()?;

    log::info!("Saved JSON report to {}", path.display());
    Ok(())
}
