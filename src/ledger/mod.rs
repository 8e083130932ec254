//! Per-symbol statistics ledgers and the table that routes records to them.

mod symbol_ledger;
mod table;

pub use symbol_ledger::{DuplicateQuotePolicy, IngestOutcome, LedgerConfig, StatsMode, SymbolLedger};
pub use table::{LedgerTable, TableStats};
