//! Single-symbol statistics ledger.
//!
//! Tracks, for one instrument:
//! - the interval between consecutive trades
//! - the interval between consecutive price changes on each side of the book
//! - the bid/ask spread carried by every record
//!
//! and the mean, median and maximum of each series. Derived values are always
//! recomputed from the full series rather than maintained incrementally.

use crate::error::{LedgerError, Result};
use crate::statistics::SeriesStats;
use crate::types::{EventKind, LedgerSnapshot, OutOfOrderEvent, QuoteMark, Record, Timestamp};

/// When derived statistics are recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsMode {
    /// Recompute after every ingested record (default)
    #[default]
    EveryIngest,

    /// Recompute only when a statistic or snapshot is read.
    ///
    /// Same observable values as `EveryIngest`, but `ingest` does no
    /// statistics work and returns no snapshot in its outcome. Suited to bulk
    /// loads where nothing reads the ledger until the end.
    OnDemand,
}

/// What a quote change at an unchanged price does to the side's baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateQuotePolicy {
    /// The duplicate replaces the last (price, timestamp), so the next real
    /// change is measured from the duplicate's time (default)
    #[default]
    RefreshBaseline,

    /// The duplicate is ignored; the baseline stays at the last real change
    KeepBaseline,
}

/// Configuration for ledger behavior.
#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    /// When derived statistics are recomputed
    pub stats_mode: StatsMode,

    /// Handling of quote changes that do not change the price
    pub duplicate_quote_policy: DuplicateQuotePolicy,

    /// Whether to validate records before ingesting
    pub validate_records: bool,

    /// Whether to log ordering violations
    pub log_violations: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            stats_mode: StatsMode::EveryIngest,
            duplicate_quote_policy: DuplicateQuotePolicy::RefreshBaseline,
            validate_records: true,
            log_violations: true,
        }
    }
}

impl LedgerConfig {
    /// Set when statistics are recomputed.
    pub fn with_stats_mode(mut self, mode: StatsMode) -> Self {
        self.stats_mode = mode;
        self
    }

    /// Set duplicate quote handling.
    pub fn with_duplicate_quote_policy(mut self, policy: DuplicateQuotePolicy) -> Self {
        self.duplicate_quote_policy = policy;
        self
    }

    /// Enable/disable record validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_records = validate;
        self
    }

    /// Enable/disable violation logs.
    pub fn with_logging(mut self, log: bool) -> Self {
        self.log_violations = log;
        self
    }
}

/// Result of ingesting one record.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// Ledger state after the record; `None` under `StatsMode::OnDemand`,
    /// where [`SymbolLedger::snapshot`] computes it on request
    pub snapshot: Option<LedgerSnapshot>,

    /// Set when the record's interval would have been negative
    pub violation: Option<OutOfOrderEvent>,
}

/// Derived statistics for the three series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DerivedStats {
    trade: SeriesStats,
    tick: SeriesStats,
    spread: SeriesStats,
}

/// Statistical state for one instrument.
#[derive(Debug, Clone)]
pub struct SymbolLedger {
    /// Instrument this ledger owns
    symbol: String,

    /// Configuration
    config: LedgerConfig,

    /// Time of the most recent trade
    last_trade_time: Option<Timestamp>,

    /// Most recent bid change
    last_bid: Option<QuoteMark>,

    /// Most recent ask change
    last_ask: Option<QuoteMark>,

    /// Seconds between consecutive trades
    trade_intervals: Vec<i64>,

    /// Seconds between consecutive price changes, both sides interleaved
    tick_intervals: Vec<i64>,

    /// Ask minus bid, one per record
    spreads: Vec<f64>,

    /// Records ingested
    order_count: u64,

    /// Records whose interval was skipped as out of order
    violation_count: u64,

    /// Cached under `StatsMode::EveryIngest`
    derived: DerivedStats,
}

impl SymbolLedger {
    /// Create an empty ledger with default configuration.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_config(symbol, LedgerConfig::default())
    }

    /// Create an empty ledger with custom configuration.
    pub fn with_config(symbol: impl Into<String>, config: LedgerConfig) -> Self {
        Self {
            symbol: symbol.into(),
            config,
            last_trade_time: None,
            last_bid: None,
            last_ask: None,
            trade_intervals: Vec::new(),
            tick_intervals: Vec::new(),
            spreads: Vec::new(),
            order_count: 0,
            violation_count: 0,
            derived: DerivedStats::default(),
        }
    }

    /// Ingest one record for this symbol.
    ///
    /// # Errors
    ///
    /// - `SymbolMismatch` if the record belongs to another symbol
    /// - `InvalidRecord` if validation is enabled and the record fails it
    ///
    /// Neither error changes the ledger. An out-of-order record is not an
    /// error: it is reported in [`IngestOutcome::violation`].
    pub fn ingest(&mut self, record: &Record) -> Result<IngestOutcome> {
        if record.symbol != self.symbol {
            return Err(LedgerError::SymbolMismatch {
                expected: self.symbol.clone(),
                actual: record.symbol.clone(),
            });
        }

        if self.config.validate_records {
            record.validate()?;
        }

        let violation = match record.event_kind {
            EventKind::Trade => self.apply_trade(record.timestamp),
            EventKind::BidChange => {
                self.apply_quote(EventKind::BidChange, record.bid_price, record.timestamp)
            }
            EventKind::AskChange => {
                self.apply_quote(EventKind::AskChange, record.ask_price, record.timestamp)
            }
        };

        self.spreads.push(record.spread());
        self.order_count += 1;

        if let Some(event) = &violation {
            self.violation_count += 1;
            if self.config.log_violations {
                log::warn!("Out-of-order event, interval skipped: {event}");
            }
        }

        let snapshot = match self.config.stats_mode {
            StatsMode::EveryIngest => {
                self.derived = self.compute_derived();
                Some(self.snapshot())
            }
            StatsMode::OnDemand => None,
        };

        Ok(IngestOutcome {
            snapshot,
            violation,
        })
    }

    /// Record the interval since the previous trade and move the baseline.
    fn apply_trade(&mut self, timestamp: Timestamp) -> Option<OutOfOrderEvent> {
        let mut violation = None;

        if let Some(previous) = self.last_trade_time {
            let interval = timestamp - previous;
            if interval < 0 {
                violation = Some(self.out_of_order(EventKind::Trade, previous, timestamp));
            } else {
                self.trade_intervals.push(interval);
            }
        }

        self.last_trade_time = Some(timestamp);
        violation
    }

    /// Record a tick interval if the quoted price moved, then update the side.
    fn apply_quote(
        &mut self,
        kind: EventKind,
        price: f64,
        timestamp: Timestamp,
    ) -> Option<OutOfOrderEvent> {
        let last = match kind {
            EventKind::AskChange => self.last_ask,
            _ => self.last_bid,
        };

        let mut violation = None;

        if let Some(last) = last {
            if price == last.price {
                // Same price: not a tick.
                if self.config.duplicate_quote_policy == DuplicateQuotePolicy::KeepBaseline {
                    return None;
                }
            } else {
                let interval = timestamp - last.timestamp;
                if interval < 0 {
                    violation = Some(self.out_of_order(kind, last.timestamp, timestamp));
                } else {
                    self.tick_intervals.push(interval);
                }
            }
        }

        let mark = Some(QuoteMark::new(price, timestamp));
        match kind {
            EventKind::AskChange => self.last_ask = mark,
            _ => self.last_bid = mark,
        }

        violation
    }

    fn out_of_order(
        &self,
        kind: EventKind,
        previous: Timestamp,
        current: Timestamp,
    ) -> OutOfOrderEvent {
        OutOfOrderEvent {
            symbol: self.symbol.clone(),
            kind,
            previous,
            current,
        }
    }

    fn compute_derived(&self) -> DerivedStats {
        DerivedStats {
            trade: SeriesStats::from_seconds(&self.trade_intervals),
            tick: SeriesStats::from_seconds(&self.tick_intervals),
            spread: SeriesStats::from_values(&self.spreads),
        }
    }

    /// Current derived statistics, recomputing if not cached.
    fn derived(&self) -> DerivedStats {
        match self.config.stats_mode {
            StatsMode::EveryIngest => self.derived,
            StatsMode::OnDemand => self.compute_derived(),
        }
    }

    /// Summary of this ledger: order count and derived statistics.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let derived = self.derived();
        LedgerSnapshot {
            symbol: self.symbol.clone(),
            order_count: self.order_count,
            mean_trade_interval: derived.trade.mean,
            median_trade_interval: derived.trade.median,
            max_trade_interval: derived.trade.max,
            mean_tick_interval: derived.tick.mean,
            median_tick_interval: derived.tick.median,
            max_tick_interval: derived.tick.max,
            mean_spread: derived.spread.mean,
            median_spread: derived.spread.median,
        }
    }

    /// Instrument this ledger owns.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of records ingested.
    pub fn order_count(&self) -> u64 {
        self.order_count
    }

    /// Number of records whose interval was skipped as out of order.
    pub fn violation_count(&self) -> u64 {
        self.violation_count
    }

    /// Recorded trade intervals, in arrival order.
    pub fn trade_intervals(&self) -> &[i64] {
        &self.trade_intervals
    }

    /// Recorded tick intervals, in arrival order.
    pub fn tick_intervals(&self) -> &[i64] {
        &self.tick_intervals
    }

    /// Recorded spreads, in arrival order.
    pub fn spreads(&self) -> &[f64] {
        &self.spreads
    }

    /// Time of the most recent trade.
    pub fn last_trade_time(&self) -> Option<Timestamp> {
        self.last_trade_time
    }

    /// Most recent bid change.
    pub fn last_bid(&self) -> Option<QuoteMark> {
        self.last_bid
    }

    /// Most recent ask change.
    pub fn last_ask(&self) -> Option<QuoteMark> {
        self.last_ask
    }

    /// Longest interval between trades, `0.0` if none recorded.
    pub fn longest_trade_interval(&self) -> f64 {
        self.derived().trade.max
    }

    /// Longest interval between ticks, `0.0` if none recorded.
    pub fn longest_tick_interval(&self) -> f64 {
        self.derived().tick.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(symbol: &str, ts: Timestamp) -> Record {
        Record::new(symbol, EventKind::Trade, ts)
            .with_bid(10.0, 100)
            .with_ask(10.5, 100)
            .with_trade(10.25, 50)
    }

    fn bid(symbol: &str, price: f64, ts: Timestamp) -> Record {
        Record::new(symbol, EventKind::BidChange, ts)
            .with_bid(price, 100)
            .with_ask(price + 0.5, 100)
    }

    fn ask(symbol: &str, bid_price: f64, ask_price: f64, ts: Timestamp) -> Record {
        Record::new(symbol, EventKind::AskChange, ts)
            .with_bid(bid_price, 100)
            .with_ask(ask_price, 100)
    }

    fn quiet(symbol: &str) -> SymbolLedger {
        SymbolLedger::with_config(symbol, LedgerConfig::default().with_logging(false))
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = SymbolLedger::new("ABC");
        assert_eq!(ledger.symbol(), "ABC");
        assert_eq!(ledger.order_count(), 0);
        assert_eq!(ledger.snapshot(), LedgerSnapshot::empty("ABC"));
    }

    #[test]
    fn test_trade_intervals_scenario() {
        let mut ledger = quiet("ABC");
        for ts in [0, 10, 25] {
            ledger.ingest(&trade("ABC", ts)).unwrap();
        }

        assert_eq!(ledger.trade_intervals(), &[10, 15]);
        let snap = ledger.snapshot();
        assert_eq!(snap.mean_trade_interval, 12.5);
        assert_eq!(snap.median_trade_interval, 12.5);
        assert_eq!(snap.max_trade_interval, 15.0);
        assert_eq!(snap.order_count, 3);
    }

    #[test]
    fn test_single_trade_records_no_interval() {
        let mut ledger = quiet("ABC");
        let outcome = ledger.ingest(&trade("ABC", 1_000)).unwrap();

        assert!(ledger.trade_intervals().is_empty());
        assert_eq!(ledger.last_trade_time(), Some(1_000));
        let snap = outcome.snapshot.unwrap();
        assert_eq!(snap.mean_trade_interval, 0.0);
        assert_eq!(snap.median_trade_interval, 0.0);
        assert_eq!(snap.max_trade_interval, 0.0);
        assert!(outcome.violation.is_none());
    }

    #[test]
    fn test_identical_bid_prices_never_tick() {
        let mut ledger = quiet("XYZ");
        ledger.ingest(&bid("XYZ", 10.0, 0)).unwrap();
        ledger.ingest(&bid("XYZ", 10.0, 5)).unwrap();
        ledger.ingest(&bid("XYZ", 10.0, 9)).unwrap();

        assert!(ledger.tick_intervals().is_empty());
    }

    #[test]
    fn test_changed_bid_price_ticks_once_with_delta() {
        let mut ledger = quiet("XYZ");
        ledger.ingest(&bid("XYZ", 10.0, 100)).unwrap();
        ledger.ingest(&bid("XYZ", 10.25, 107)).unwrap();

        assert_eq!(ledger.tick_intervals(), &[7]);
    }

    #[test]
    fn test_duplicate_bid_refreshes_baseline() {
        let mut ledger = quiet("XYZ");
        ledger.ingest(&bid("XYZ", 10.0, 0)).unwrap();
        ledger.ingest(&bid("XYZ", 10.0, 5)).unwrap();
        ledger.ingest(&bid("XYZ", 10.5, 8)).unwrap();

        assert_eq!(ledger.tick_intervals(), &[3]);
        assert_eq!(ledger.last_bid(), Some(QuoteMark::new(10.5, 8)));
    }

    #[test]
    fn test_duplicate_bid_kept_baseline() {
        let config = LedgerConfig::default()
            .with_logging(false)
            .with_duplicate_quote_policy(DuplicateQuotePolicy::KeepBaseline);
        let mut ledger = SymbolLedger::with_config("XYZ", config);
        ledger.ingest(&bid("XYZ", 10.0, 0)).unwrap();
        ledger.ingest(&bid("XYZ", 10.0, 5)).unwrap();
        assert_eq!(ledger.last_bid(), Some(QuoteMark::new(10.0, 0)));

        ledger.ingest(&bid("XYZ", 10.5, 8)).unwrap();
        assert_eq!(ledger.tick_intervals(), &[8]);
        // The duplicate is still a record: it counts and carries a spread.
        assert_eq!(ledger.order_count(), 3);
        assert_eq!(ledger.spreads().len(), 3);
    }

    #[test]
    fn test_ask_side_tracks_ask_price() {
        let mut ledger = quiet("XYZ");
        // Bid moves between ask updates but the ask price does not.
        ledger.ingest(&ask("XYZ", 9.0, 10.0, 0)).unwrap();
        ledger.ingest(&ask("XYZ", 9.5, 10.0, 4)).unwrap();
        assert!(ledger.tick_intervals().is_empty());

        ledger.ingest(&ask("XYZ", 9.5, 10.25, 10)).unwrap();
        assert_eq!(ledger.tick_intervals(), &[6]);
        assert_eq!(ledger.last_ask(), Some(QuoteMark::new(10.25, 10)));
    }

    #[test]
    fn test_bid_and_ask_sides_are_independent() {
        let mut ledger = quiet("XYZ");
        ledger.ingest(&bid("XYZ", 10.0, 0)).unwrap();
        ledger.ingest(&ask("XYZ", 10.0, 10.5, 2)).unwrap();
        ledger.ingest(&bid("XYZ", 10.1, 6)).unwrap();
        ledger.ingest(&ask("XYZ", 10.1, 10.6, 20)).unwrap();

        // Bid measured 0 -> 6, ask measured 2 -> 20.
        assert_eq!(ledger.tick_intervals(), &[6, 18]);
        let snap = ledger.snapshot();
        assert_eq!(snap.max_tick_interval, 18.0);
        assert_eq!(snap.mean_tick_interval, 12.0);
    }

    #[test]
    fn test_trades_do_not_touch_quote_state() {
        let mut ledger = quiet("ABC");
        ledger.ingest(&trade("ABC", 0)).unwrap();
        ledger.ingest(&trade("ABC", 5)).unwrap();

        assert!(ledger.last_bid().is_none());
        assert!(ledger.last_ask().is_none());
        assert!(ledger.tick_intervals().is_empty());
    }

    #[test]
    fn test_spread_recorded_for_every_kind() {
        let mut ledger = quiet("ABC");
        ledger.ingest(&trade("ABC", 0)).unwrap(); // 0.5
        ledger.ingest(&bid("ABC", 10.0, 1)).unwrap(); // 0.5
        ledger.ingest(&ask("ABC", 10.0, 10.25, 2)).unwrap(); // 0.25

        assert_eq!(ledger.spreads(), &[0.5, 0.5, 0.25]);
        let snap = ledger.snapshot();
        assert!((snap.mean_spread - 1.25 / 3.0).abs() < 1e-12);
        assert_eq!(snap.median_spread, 0.5);
    }

    #[test]
    fn test_out_of_order_trade_is_skipped_but_tracked() {
        let mut ledger = quiet("ABC");
        ledger.ingest(&trade("ABC", 100)).unwrap();
        let outcome = ledger.ingest(&trade("ABC", 90)).unwrap();

        let violation = outcome.violation.expect("negative interval must be reported");
        assert_eq!(violation.symbol, "ABC");
        assert_eq!(violation.kind, EventKind::Trade);
        assert_eq!(violation.previous, 100);
        assert_eq!(violation.current, 90);

        assert!(ledger.trade_intervals().is_empty());
        assert_eq!(ledger.last_trade_time(), Some(90));
        assert_eq!(ledger.order_count(), 2);
        assert_eq!(ledger.violation_count(), 1);

        // Next comparison is against the bad timestamp, not the one before it.
        ledger.ingest(&trade("ABC", 95)).unwrap();
        assert_eq!(ledger.trade_intervals(), &[5]);
    }

    #[test]
    fn test_out_of_order_quote_is_skipped_but_tracked() {
        let mut ledger = quiet("XYZ");
        ledger.ingest(&bid("XYZ", 10.0, 50)).unwrap();
        let outcome = ledger.ingest(&bid("XYZ", 10.5, 40)).unwrap();

        let violation = outcome.violation.unwrap();
        assert_eq!(violation.kind, EventKind::BidChange);
        assert_eq!(violation.interval(), -10);
        assert!(ledger.tick_intervals().is_empty());
        assert_eq!(ledger.last_bid(), Some(QuoteMark::new(10.5, 40)));
    }

    #[test]
    fn test_zero_interval_is_valid() {
        let mut ledger = quiet("ABC");
        ledger.ingest(&trade("ABC", 7)).unwrap();
        let outcome = ledger.ingest(&trade("ABC", 7)).unwrap();

        assert!(outcome.violation.is_none());
        assert_eq!(ledger.trade_intervals(), &[0]);
    }

    #[test]
    fn test_symbol_mismatch_leaves_ledger_untouched() {
        let mut ledger = quiet("ABC");
        let result = ledger.ingest(&trade("XYZ", 0));

        assert!(matches!(result, Err(LedgerError::SymbolMismatch { .. })));
        assert_eq!(ledger.order_count(), 0);
        assert!(ledger.spreads().is_empty());
    }

    #[test]
    fn test_invalid_record_rejected() {
        let mut ledger = quiet("ABC");
        let record = trade("ABC", 0).with_bid(-1.0, 100);

        assert!(matches!(
            ledger.ingest(&record),
            Err(LedgerError::InvalidRecord(_))
        ));
        assert_eq!(ledger.order_count(), 0);

        let lenient = LedgerConfig::default()
            .with_logging(false)
            .with_validation(false);
        let mut ledger = SymbolLedger::with_config("ABC", lenient);
        assert!(ledger.ingest(&record).is_ok());
    }

    #[test]
    fn test_on_demand_matches_every_ingest() {
        let records = [
            trade("ABC", 0),
            bid("ABC", 10.0, 1),
            trade("ABC", 12),
            bid("ABC", 10.5, 20),
            ask("ABC", 10.5, 11.0, 21),
            trade("ABC", 19),
            ask("ABC", 10.5, 11.5, 40),
            trade("ABC", 60),
        ];

        let mut eager = quiet("ABC");
        let lazy_config = LedgerConfig::default()
            .with_logging(false)
            .with_stats_mode(StatsMode::OnDemand);
        let mut lazy = SymbolLedger::with_config("ABC", lazy_config);

        for record in &records {
            let a = eager.ingest(record).unwrap();
            let b = lazy.ingest(record).unwrap();
            assert_eq!(a.violation, b.violation);
            assert_eq!(a.snapshot, Some(lazy.snapshot()));
            assert!(b.snapshot.is_none());
        }
        assert_eq!(eager.snapshot(), lazy.snapshot());
    }

    #[test]
    fn test_on_demand_ingest_skips_recomputation() {
        let config = LedgerConfig::default()
            .with_logging(false)
            .with_stats_mode(StatsMode::OnDemand);
        let mut ledger = SymbolLedger::with_config("ABC", config);
        for ts in [0, 10, 25] {
            let outcome = ledger.ingest(&trade("ABC", ts)).unwrap();
            assert!(outcome.snapshot.is_none());
        }

        // The cache is never filled; reads compute from the series.
        assert_eq!(ledger.derived, DerivedStats::default());
        assert_eq!(ledger.snapshot().max_trade_interval, 15.0);
        assert_eq!(ledger.longest_trade_interval(), 15.0);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut ledger = quiet("ABC");
        for ts in [0, 3, 11, 12] {
            ledger.ingest(&trade("ABC", ts)).unwrap();
        }

        let first = ledger.snapshot();
        let second = ledger.snapshot();
        assert_eq!(first, second);
        assert_eq!(ledger.trade_intervals(), &[3, 8, 1]);
    }

    #[test]
    fn test_ingest_outcome_snapshot_reflects_record() {
        let mut ledger = quiet("ABC");
        ledger.ingest(&trade("ABC", 0)).unwrap();
        let outcome = ledger.ingest(&trade("ABC", 30)).unwrap();

        let snap = outcome.snapshot.unwrap();
        assert_eq!(snap.order_count, 2);
        assert_eq!(snap.max_trade_interval, 30.0);
        assert_eq!(ledger.longest_trade_interval(), 30.0);
        assert_eq!(ledger.longest_tick_interval(), 0.0);
    }
}
