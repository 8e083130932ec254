//! Multi-symbol ledger table.
//!
//! Routes records to one [`SymbolLedger`] per symbol, creating ledgers on
//! first sight, and answers the cross-symbol questions: how many symbols and
//! records were seen, and which symbol has the longest trade and tick gaps.

use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::symbol_ledger::{IngestOutcome, LedgerConfig, SymbolLedger};
use crate::error::{LedgerError, Result};
use crate::source::{RecordSource, RecordStream};
use crate::types::{GapLeader, LedgerSnapshot, OutOfOrderEvent, Record};
use crate::warnings::WarningTracker;

/// Table-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Records accepted by `process`
    pub records_processed: u64,

    /// Records whose interval was skipped as out of order
    pub violations: u64,
}

/// Owner of every per-symbol ledger for one run.
///
/// # Example
/// ```
/// use tick_ledger::{EventKind, LedgerTable, Record};
///
/// let mut table = LedgerTable::new();
/// for ts in [0, 10, 25] {
///     table.process(&Record::new("ABC", EventKind::Trade, ts)).unwrap();
/// }
///
/// let leader = table.longest_trade_gap();
/// assert_eq!(leader.symbol, "ABC");
/// assert_eq!(leader.seconds, 15.0);
/// ```
#[derive(Debug)]
pub struct LedgerTable {
    /// Configuration handed to every new ledger
    config: LedgerConfig,

    /// Map of symbol -> ledger
    ledgers: AHashMap<String, SymbolLedger>,

    /// Ordering violations seen so far
    warnings: WarningTracker,

    /// Statistics
    stats: TableStats,
}

impl LedgerTable {
    /// Create an empty table with default ledger configuration.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Create an empty table whose ledgers use `config`.
    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            config,
            ledgers: AHashMap::new(),
            warnings: WarningTracker::new(),
            stats: TableStats::default(),
        }
    }

    /// Build a table by ingesting each symbol's records on its own worker.
    ///
    /// The stream is partitioned by symbol with every partition keeping its
    /// input order, so each ledger still sees its records strictly in
    /// sequence. Results are identical to calling [`process`](Self::process)
    /// on every record in order.
    pub fn from_records_parallel(config: LedgerConfig, records: Vec<Record>) -> Result<Self> {
        let mut partitions: AHashMap<String, Vec<Record>> = AHashMap::new();
        for record in records {
            partitions
                .entry(record.symbol.clone())
                .or_default()
                .push(record);
        }

        let mut partitions: Vec<(String, Vec<Record>)> = partitions.into_iter().collect();
        partitions.sort_by(|a, b| a.0.cmp(&b.0));

        log::debug!(
            "Ingesting {} symbol partitions in parallel",
            partitions.len()
        );

        let results: Vec<Result<(SymbolLedger, Vec<OutOfOrderEvent>)>> = partitions
            .into_par_iter()
            .map(|(symbol, records)| -> Result<(SymbolLedger, Vec<OutOfOrderEvent>)> {
                let mut ledger = SymbolLedger::with_config(symbol, config);
                let mut violations = Vec::new();
                for record in &records {
                    if let Some(event) = ledger.ingest(record)?.violation {
                        violations.push(event);
                    }
                }
                Ok((ledger, violations))
            })
            .collect();

        let mut table = Self::with_config(config);
        for result in results {
            let (ledger, violations) = result?;
            table.stats.records_processed += ledger.order_count();
            for event in &violations {
                table.note_violation(event);
            }
            table.ledgers.insert(ledger.symbol().to_string(), ledger);
        }

        Ok(table)
    }

    /// Route a record to its symbol's ledger, creating the ledger if needed.
    ///
    /// Ordering violations are returned in the outcome and also collected in
    /// [`warnings`](Self::warnings). Validation happens in the ledger; a
    /// rejected record never creates one.
    pub fn process(&mut self, record: &Record) -> Result<IngestOutcome> {
        let outcome = match self.ledgers.get_mut(record.symbol.as_str()) {
            Some(ledger) => ledger.ingest(record)?,
            None => {
                let mut ledger = SymbolLedger::with_config(record.symbol.clone(), self.config);
                let outcome = ledger.ingest(record)?;
                log::debug!("New symbol: {}", record.symbol);
                self.ledgers.insert(record.symbol.clone(), ledger);
                outcome
            }
        };

        self.stats.records_processed += 1;
        if let Some(event) = &outcome.violation {
            self.note_violation(event);
        }

        Ok(outcome)
    }

    /// Drive every record of a source through [`process`](Self::process).
    ///
    /// Returns the number of records processed. Stops at the first error,
    /// whether the source yields it or `process` returns it. Warnings the
    /// source collected are absorbed into this table either way.
    pub fn ingest_source<S: RecordSource>(&mut self, source: S) -> Result<u64> {
        let mut records = source.records()?;
        let mut count = 0u64;
        let mut outcome = Ok(());

        for item in records.by_ref() {
            match item.and_then(|record| self.process(&record)) {
                Ok(_) => count += 1,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        self.absorb_warnings(records.take_warnings());
        outcome.map(|()| count)
    }

    fn note_violation(&mut self, event: &OutOfOrderEvent) {
        self.stats.violations += 1;
        self.warnings.record_violation(event);
    }

    /// Fold warnings collected elsewhere (e.g. while decoding) into this
    /// table's tracker.
    pub fn absorb_warnings(&mut self, warnings: WarningTracker) {
        self.warnings.merge_from(warnings);
    }

    /// Absorb another table whose symbols are disjoint from this one.
    ///
    /// # Errors
    ///
    /// `DuplicateSymbol` if any symbol is present in both tables; `self` is
    /// left unchanged in that case.
    pub fn merge(&mut self, other: LedgerTable) -> Result<()> {
        let mut overlap: Vec<&String> = other
            .ledgers
            .keys()
            .filter(|symbol| self.ledgers.contains_key(symbol.as_str()))
            .collect();
        overlap.sort();
        if let Some(symbol) = overlap.first() {
            return Err(LedgerError::DuplicateSymbol((*symbol).clone()));
        }

        self.stats.records_processed += other.stats.records_processed;
        self.stats.violations += other.stats.violations;
        self.warnings.merge_from(other.warnings);
        for (symbol, ledger) in other.ledgers {
            self.ledgers.insert(symbol, ledger);
        }

        Ok(())
    }

    /// Number of distinct symbols seen.
    pub fn symbol_count(&self) -> usize {
        self.ledgers.len()
    }

    /// Sum of record counts over all ledgers.
    pub fn total_orders(&self) -> u64 {
        self.ledgers.values().map(SymbolLedger::order_count).sum()
    }

    /// Symbol with the longest interval between trades.
    ///
    /// Symbols are scanned in sorted order and only a strictly greater value
    /// replaces the current leader, so ties go to the alphabetically first
    /// symbol. Returns the sentinel `GapLeader::default()` when no ledger has
    /// a positive trade interval.
    pub fn longest_trade_gap(&self) -> GapLeader {
        self.leader_by(SymbolLedger::longest_trade_interval)
    }

    /// Symbol with the longest interval between ticks.
    ///
    /// Same scan and tie rules as [`longest_trade_gap`](Self::longest_trade_gap).
    pub fn longest_tick_gap(&self) -> GapLeader {
        self.leader_by(SymbolLedger::longest_tick_interval)
    }

    fn leader_by(&self, metric: impl Fn(&SymbolLedger) -> f64) -> GapLeader {
        let mut leader = GapLeader::default();
        for ledger in self.sorted_ledgers() {
            let value = metric(ledger);
            if value > leader.seconds {
                leader = GapLeader::new(ledger.symbol(), value);
            }
        }
        leader
    }

    fn sorted_ledgers(&self) -> Vec<&SymbolLedger> {
        let mut ledgers: Vec<&SymbolLedger> = self.ledgers.values().collect();
        ledgers.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        ledgers
    }

    /// Summaries for every symbol, sorted by symbol.
    ///
    /// Reads only; calling it twice without an intervening `process` yields
    /// identical results.
    pub fn snapshot(&self) -> Vec<LedgerSnapshot> {
        self.sorted_ledgers()
            .into_iter()
            .map(SymbolLedger::snapshot)
            .collect()
    }

    /// Summary for one symbol.
    pub fn symbol_snapshot(&self, symbol: &str) -> Result<LedgerSnapshot> {
        self.ledger(symbol).map(SymbolLedger::snapshot)
    }

    /// Ledger for one symbol.
    pub fn ledger(&self, symbol: &str) -> Result<&SymbolLedger> {
        self.ledgers
            .get(symbol)
            .ok_or_else(|| LedgerError::SymbolNotFound(symbol.to_string()))
    }

    /// All tracked symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.ledgers.keys().map(|s| s.as_str()).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Check if a symbol is being tracked.
    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.ledgers.contains_key(symbol)
    }

    /// Get statistics.
    pub fn stats(&self) -> &TableStats {
        &self.stats
    }

    /// Ordering violations collected so far.
    pub fn warnings(&self) -> &WarningTracker {
        &self.warnings
    }

    /// Configuration handed to new ledgers.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl Default for LedgerTable {
    fn default() -> Self {
        Self::new()
    }
}
