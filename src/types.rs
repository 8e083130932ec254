//! Core data types for tick records and ledger output.
//!
//! These types are designed to be:
//! - Small and cheap to clone (records are built once per input line)
//! - Serializable for report exports
//! - Independent of the line format they were decoded from

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, Result};

/// Point in time with second resolution (seconds since the Unix epoch, UTC).
pub type Timestamp = i64;

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS`, falling back to raw seconds.
pub fn format_timestamp(ts: Timestamp) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Kind of market event a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// Trade execution
    Trade = 1,
    /// Change to the bid side of the book
    BidChange = 2,
    /// Change to the ask side of the book
    AskChange = 3,
}

impl EventKind {
    /// Parse the numeric update type used by the tick files.
    pub fn from_update_type(value: u8) -> Option<Self> {
        match value {
            1 => Some(EventKind::Trade),
            2 => Some(EventKind::BidChange),
            3 => Some(EventKind::AskChange),
            _ => None,
        }
    }

    /// Convert back to the numeric update type.
    pub fn update_type(self) -> u8 {
        self as u8
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Trade => "trade",
            EventKind::BidChange => "bid change",
            EventKind::AskChange => "ask change",
        }
    }

    /// Check if this is a quote change on either side.
    #[inline(always)]
    pub fn is_quote(self) -> bool {
        matches!(self, EventKind::BidChange | EventKind::AskChange)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One validated tick record.
///
/// A record describes exactly one kind of market event. Prices are carried for
/// both sides on every record, which is what lets the spread series be driven
/// by every event regardless of kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Instrument identifier
    pub symbol: String,

    /// Best bid price
    pub bid_price: f64,

    /// Best ask price
    pub ask_price: f64,

    /// Last trade price
    pub trade_price: f64,

    /// Volume at the bid
    pub bid_volume: u32,

    /// Volume at the ask
    pub ask_volume: u32,

    /// Trade volume
    pub trade_volume: u32,

    /// What happened
    pub event_kind: EventKind,

    /// Condition code after normalization (may be empty)
    pub condition_code: String,

    /// When it happened
    pub timestamp: Timestamp,
}

impl Record {
    /// Create a record with zero prices and volumes.
    pub fn new(symbol: impl Into<String>, event_kind: EventKind, timestamp: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            bid_price: 0.0,
            ask_price: 0.0,
            trade_price: 0.0,
            bid_volume: 0,
            ask_volume: 0,
            trade_volume: 0,
            event_kind,
            condition_code: String::new(),
            timestamp,
        }
    }

    /// Set bid price and volume.
    pub fn with_bid(mut self, price: f64, volume: u32) -> Self {
        self.bid_price = price;
        self.bid_volume = volume;
        self
    }

    /// Set ask price and volume.
    pub fn with_ask(mut self, price: f64, volume: u32) -> Self {
        self.ask_price = price;
        self.ask_volume = volume;
        self
    }

    /// Set trade price and volume.
    pub fn with_trade(mut self, price: f64, volume: u32) -> Self {
        self.trade_price = price;
        self.trade_volume = volume;
        self
    }

    /// Set the condition code.
    pub fn with_condition_code(mut self, code: impl Into<String>) -> Self {
        self.condition_code = code.into();
        self
    }

    /// Bid/ask spread carried by this record.
    #[inline]
    pub fn spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    /// Validate the record fields.
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(LedgerError::InvalidRecord("empty symbol".to_string()));
        }

        for (name, price) in [
            ("bid price", self.bid_price),
            ("ask price", self.ask_price),
            ("trade price", self.trade_price),
        ] {
            if !price.is_finite() || price < 0.0 {
                return Err(LedgerError::InvalidRecord(format!(
                    "{} {name} {price} is not a non-negative number",
                    self.symbol
                )));
            }
        }

        Ok(())
    }
}

/// Last observed price on one side of the book, with its time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteMark {
    pub price: f64,
    pub timestamp: Timestamp,
}

impl QuoteMark {
    pub fn new(price: f64, timestamp: Timestamp) -> Self {
        Self { price, timestamp }
    }
}

/// A record whose interval against the ledger's prior state came out negative.
///
/// The interval is skipped; the ledger's last-seen state is still updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfOrderEvent {
    /// Symbol of the ledger that saw the event
    pub symbol: String,

    /// Kind of the offending record
    pub kind: EventKind,

    /// Timestamp of the prior event the interval was measured from
    pub previous: Timestamp,

    /// Timestamp of the offending record
    pub current: Timestamp,
}

impl OutOfOrderEvent {
    /// The (negative) interval that was not recorded.
    pub fn interval(&self) -> i64 {
        self.current - self.previous
    }
}

impl fmt::Display for OutOfOrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at {} precedes previous event at {} ({}s)",
            self.symbol,
            self.kind,
            format_timestamp(self.current),
            format_timestamp(self.previous),
            self.interval()
        )
    }
}

/// Symbol holding a cross-symbol extreme, paired with its value in seconds.
///
/// `GapLeader::default()` is the sentinel returned when no symbol qualifies:
/// an empty symbol with a value of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapLeader {
    pub symbol: String,
    pub seconds: f64,
}

impl GapLeader {
    pub fn new(symbol: impl Into<String>, seconds: f64) -> Self {
        Self {
            symbol: symbol.into(),
            seconds,
        }
    }

    /// Check if this is the "no symbol qualifies" sentinel.
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }
}

impl fmt::Display for GapLeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{} seconds", self.symbol, self.seconds)
    }
}

/// Per-symbol summary: symbol, order count and the derived statistics.
///
/// Field order matches the report columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub symbol: String,
    pub order_count: u64,

    pub mean_trade_interval: f64,
    pub median_trade_interval: f64,
    pub max_trade_interval: f64,

    pub mean_tick_interval: f64,
    pub median_tick_interval: f64,
    pub max_tick_interval: f64,

    pub mean_spread: f64,
    pub median_spread: f64,
}

impl LedgerSnapshot {
    /// Empty snapshot for a symbol with no records yet.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            order_count: 0,
            mean_trade_interval: 0.0,
            median_trade_interval: 0.0,
            max_trade_interval: 0.0,
            mean_tick_interval: 0.0,
            median_tick_interval: 0.0,
            max_tick_interval: 0.0,
            mean_spread: 0.0,
            median_spread: 0.0,
        }
    }

    /// The eight statistics in report column order (the symbol is the ninth,
    /// leading, column).
    pub fn values(&self) -> [f64; 8] {
        [
            self.mean_trade_interval,
            self.median_trade_interval,
            self.max_trade_interval,
            self.mean_tick_interval,
            self.median_tick_interval,
            self.max_tick_interval,
            self.mean_spread,
            self.median_spread,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_update_type() {
        assert_eq!(EventKind::from_update_type(1), Some(EventKind::Trade));
        assert_eq!(EventKind::from_update_type(2), Some(EventKind::BidChange));
        assert_eq!(EventKind::from_update_type(3), Some(EventKind::AskChange));
        assert_eq!(EventKind::from_update_type(0), None);
        assert_eq!(EventKind::from_update_type(4), None);
        assert_eq!(EventKind::AskChange.update_type(), 3);
    }

    #[test]
    fn test_record_builder_and_spread() {
        let record = Record::new("ABC", EventKind::BidChange, 100)
            .with_bid(10.0, 500)
            .with_ask(10.25, 300)
            .with_condition_code("XT");

        assert_eq!(record.bid_volume, 500);
        assert_eq!(record.ask_volume, 300);
        assert!((record.spread() - 0.25).abs() < 1e-12);
        assert_eq!(record.condition_code, "XT");
    }

    #[test]
    fn test_record_validation() {
        assert!(Record::new("ABC", EventKind::Trade, 0).validate().is_ok());
        assert!(Record::new("", EventKind::Trade, 0).validate().is_err());

        let negative = Record::new("ABC", EventKind::Trade, 0).with_bid(-1.0, 0);
        assert!(matches!(
            negative.validate(),
            Err(LedgerError::InvalidRecord(_))
        ));

        let nan = Record::new("ABC", EventKind::Trade, 0).with_trade(f64::NAN, 1);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_out_of_order_display() {
        let event = OutOfOrderEvent {
            symbol: "ABC".to_string(),
            kind: EventKind::Trade,
            previous: 1_429_488_010,
            current: 1_429_488_000,
        };
        assert_eq!(event.interval(), -10);
        let text = event.to_string();
        assert!(text.starts_with("ABC trade at 2015-04-20"));
        assert!(text.ends_with("(-10s)"));
    }

    #[test]
    fn test_gap_leader_sentinel() {
        let sentinel = GapLeader::default();
        assert!(sentinel.is_empty());
        assert_eq!(sentinel.seconds, 0.0);
        assert_eq!(GapLeader::new("BBB", 250.0).to_string(), "BBB|250 seconds");
    }

    #[test]
    fn test_snapshot_values_order() {
        let mut snap = LedgerSnapshot::empty("ABC");
        snap.mean_trade_interval = 1.0;
        snap.median_spread = 9.0;
        let values = snap.values();
        assert_eq!(values[0], 1.0);
        assert_eq!(values[7], 9.0);
    }
}
