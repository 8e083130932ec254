//! Warning and issue tracking for tick ingestion.
//!
//! Two kinds of trouble are recoverable during a run and must not abort it:
//! records that arrive out of timestamp order for their symbol, and input
//! lines that cannot be decoded. Both are collected here, categorised and
//! timestamped, so they can be summarised at the end of a run and exported
//! for root cause analysis.
//!
//! # Example
//!
//! ```
//! use tick_ledger::warnings::{WarningCategory, WarningTracker};
//!
//! let mut tracker = WarningTracker::new();
//! tracker.record_simple(WarningCategory::DecodeFailure, "line 12: invalid bid price");
//!
//! let summary = tracker.summary();
//! assert_eq!(summary.total, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::LedgerError;
use crate::types::{OutOfOrderEvent, Record};

/// Category of warning for classification and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCategory {
    /// Negative interval against the ledger's prior state
    OutOfOrderEvent,

    /// Input line could not be decoded
    DecodeFailure,

    /// Decoded record failed validation
    InvalidRecord,

    /// Other/uncategorized warning
    Other,
}

impl WarningCategory {
    /// Get a human-readable name for the category.
    pub fn name(&self) -> &'static str {
        match self {
            WarningCategory::OutOfOrderEvent => "OUT_OF_ORDER_EVENT",
            WarningCategory::DecodeFailure => "DECODE_FAILURE",
            WarningCategory::InvalidRecord => "INVALID_RECORD",
            WarningCategory::Other => "OTHER",
        }
    }

    /// Get severity level (1=low, 2=medium, 3=high).
    pub fn severity(&self) -> u8 {
        match self {
            WarningCategory::OutOfOrderEvent => 2,
            WarningCategory::DecodeFailure => 2,
            WarningCategory::InvalidRecord => 3,
            WarningCategory::Other => 1,
        }
    }
}

/// A single warning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Unique warning ID (auto-incremented)
    pub id: u64,

    /// Warning category
    pub category: WarningCategory,

    /// Human-readable message
    pub message: String,

    /// Related symbol (if known)
    pub symbol: Option<String>,

    /// Data timestamp of the offending record (seconds since epoch)
    pub data_timestamp: Option<i64>,

    /// Wall clock time when warning was recorded (nanoseconds since epoch)
    pub recorded_at: u64,

    /// 1-based input line number (if applicable)
    pub line: Option<u64>,

    /// Additional context as key-value pairs
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub context: HashMap<String, String>,
}

impl Warning {
    /// Create a new warning with minimal information.
    pub fn new(id: u64, category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            id,
            category,
            message: message.into(),
            symbol: None,
            data_timestamp: None,
            recorded_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0),
            line: None,
            context: HashMap::new(),
        }
    }

    /// Set the symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Set the data timestamp.
    pub fn with_data_timestamp(mut self, ts: i64) -> Self {
        self.data_timestamp = Some(ts);
        self
    }

    /// Set the input line number.
    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    /// Add context key-value pair.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Summary statistics for warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarningSummary {
    /// Total number of warnings
    pub total: u64,

    /// Count by category
    pub by_category: HashMap<String, u64>,

    /// Count by severity
    pub by_severity: HashMap<u8, u64>,

    /// First warning data timestamp
    pub first_timestamp: Option<i64>,

    /// Last warning data timestamp
    pub last_timestamp: Option<i64>,

    /// Number of distinct symbols involved
    pub unique_symbols: u64,
}

/// Configuration for warning tracker.
#[derive(Debug, Clone)]
pub struct WarningTrackerConfig {
    /// Maximum number of warnings to keep in memory
    pub max_warnings: usize,

    /// Whether to forward warnings to the `log` facade
    pub log_warnings: bool,

    /// Minimum severity to log (1=all, 2=medium+, 3=high only)
    pub min_log_severity: u8,

    /// Whether to deduplicate identical messages within a window
    pub deduplicate: bool,

    /// Time window for deduplication (nanoseconds)
    pub dedupe_window_ns: u64,
}

impl Default for WarningTrackerConfig {
    fn default() -> Self {
        // Ledgers and loaders log at the point of detection; the tracker
        // only collects.
        Self {
            max_warnings: 100_000,
            log_warnings: false,
            min_log_severity: 1,
            deduplicate: false,
            dedupe_window_ns: 1_000_000_000, // 1 second
        }
    }
}

/// Warning collector for one ingestion run.
#[derive(Debug)]
pub struct WarningTracker {
    /// Configuration
    config: WarningTrackerConfig,

    /// Stored warnings
    warnings: Vec<Warning>,

    /// Counter for unique IDs
    next_id: AtomicU64,

    /// Count by category (for fast summary)
    category_counts: HashMap<WarningCategory, u64>,

    /// Recent warnings for deduplication (category -> (message_hash, timestamp))
    recent: HashMap<WarningCategory, Vec<(u64, u64)>>,

    /// Symbols seen in warnings
    unique_symbols: HashSet<String>,
}

impl WarningTracker {
    /// Create a new warning tracker with default configuration.
    pub fn new() -> Self {
        Self::with_config(WarningTrackerConfig::default())
    }

    /// Create a new warning tracker with custom configuration.
    pub fn with_config(config: WarningTrackerConfig) -> Self {
        Self {
            config,
            warnings: Vec::new(),
            next_id: AtomicU64::new(1),
            category_counts: HashMap::new(),
            recent: HashMap::new(),
            unique_symbols: HashSet::new(),
        }
    }

    /// Allocate the next warning ID.
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Record a warning.
    ///
    /// Returns the warning ID if recorded, or None if deduplicated.
    pub fn record(&mut self, warning: Warning) -> Option<u64> {
        if self.config.deduplicate {
            let msg_hash = hash_message(&warning.message);
            let now = warning.recorded_at;
            let window = self.config.dedupe_window_ns;

            let recent_list = self.recent.entry(warning.category).or_default();
            recent_list.retain(|(_, ts)| now.saturating_sub(*ts) < window);

            if recent_list.iter().any(|(h, _)| *h == msg_hash) {
                return None;
            }
            recent_list.push((msg_hash, now));
        }

        if self.config.log_warnings && warning.category.severity() >= self.config.min_log_severity
        {
            log::warn!(
                "[{}] {}: {}",
                warning.category.name(),
                warning.id,
                warning.message
            );
        }

        if let Some(symbol) = &warning.symbol {
            if !self.unique_symbols.contains(symbol) {
                self.unique_symbols.insert(symbol.clone());
            }
        }

        *self.category_counts.entry(warning.category).or_insert(0) += 1;

        let id = warning.id;

        if self.warnings.len() < self.config.max_warnings {
            self.warnings.push(warning);
        }

        Some(id)
    }

    /// Record a simple warning with just category and message.
    pub fn record_simple(
        &mut self,
        category: WarningCategory,
        message: impl Into<String>,
    ) -> Option<u64> {
        let warning = Warning::new(self.next_id(), category, message);
        self.record(warning)
    }

    /// Record an ordering violation reported by a ledger.
    pub fn record_violation(&mut self, event: &OutOfOrderEvent) -> Option<u64> {
        let warning = Warning::new(self.next_id(), WarningCategory::OutOfOrderEvent, event.to_string())
            .with_symbol(event.symbol.clone())
            .with_data_timestamp(event.current)
            .with_context("kind", event.kind.name())
            .with_context("previous", event.previous.to_string());
        self.record(warning)
    }

    /// Record a line that failed to decode.
    pub fn record_decode_failure(&mut self, line: u64, error: &LedgerError) -> Option<u64> {
        let warning = Warning::new(
            self.next_id(),
            WarningCategory::DecodeFailure,
            format!("line {line}: {error}"),
        )
        .with_line(line);
        self.record(warning)
    }

    /// Record a decoded record that failed validation.
    pub fn record_invalid_record(&mut self, record: &Record, error: &LedgerError) -> Option<u64> {
        let warning = Warning::new(self.next_id(), WarningCategory::InvalidRecord, error.to_string())
            .with_symbol(record.symbol.clone())
            .with_data_timestamp(record.timestamp)
            .with_context("kind", record.event_kind.name());
        self.record(warning)
    }

    /// Move every warning of `other` into this tracker, assigning fresh IDs.
    ///
    /// Category counts are added in full, including warnings `other` counted
    /// but did not store. Stored warnings still respect `max_warnings`.
    pub fn merge_from(&mut self, other: WarningTracker) {
        for (category, count) in other.category_counts {
            *self.category_counts.entry(category).or_insert(0) += count;
        }
        self.unique_symbols.extend(other.unique_symbols);

        for mut warning in other.warnings {
            if self.warnings.len() >= self.config.max_warnings {
                break;
            }
            warning.id = self.next_id();
            self.warnings.push(warning);
        }
    }

    /// Get the number of warnings stored.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Check if no warnings have been recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Get total count including those beyond `max_warnings`.
    pub fn total_count(&self) -> u64 {
        self.category_counts.values().sum()
    }

    /// Get count for a specific category.
    pub fn count_by_category(&self, category: WarningCategory) -> u64 {
        self.category_counts.get(&category).copied().unwrap_or(0)
    }

    /// Get all stored warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Get warnings by category.
    pub fn warnings_by_category(&self, category: WarningCategory) -> Vec<&Warning> {
        self.warnings
            .iter()
            .filter(|w| w.category == category)
            .collect()
    }

    /// Get summary statistics.
    pub fn summary(&self) -> WarningSummary {
        let mut by_category = HashMap::new();
        let mut by_severity = HashMap::new();

        for (cat, count) in &self.category_counts {
            by_category.insert(cat.name().to_string(), *count);
            *by_severity.entry(cat.severity()).or_insert(0) += *count;
        }

        let first_timestamp = self.warnings.iter().find_map(|w| w.data_timestamp);
        let last_timestamp = self.warnings.iter().rev().find_map(|w| w.data_timestamp);

        WarningSummary {
            total: self.total_count(),
            by_category,
            by_severity,
            first_timestamp,
            last_timestamp,
            unique_symbols: self.unique_symbols.len() as u64,
        }
    }

    /// Export warnings to a JSON file.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let document = serde_json::json!({
            "summary": self.summary(),
            "warnings": self.warnings,
        });
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writeln!(writer)?;

        writer.flush()
    }

    /// Export warnings to a CSV file (for spreadsheet analysis).
    pub fn export_to_csv(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "id,category,severity,message,symbol,data_timestamp,recorded_at,line"
        )?;

        for warning in &self.warnings {
            writeln!(
                writer,
                "{},{},{},{:?},{},{},{},{}",
                warning.id,
                warning.category.name(),
                warning.category.severity(),
                warning.message,
                warning.symbol.as_deref().unwrap_or_default(),
                warning
                    .data_timestamp
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
                warning.recorded_at,
                warning.line.map(|l| l.to_string()).unwrap_or_default(),
            )?;
        }

        writer.flush()
    }

    /// Clear all warnings.
    pub fn clear(&mut self) {
        self.warnings.clear();
        self.category_counts.clear();
        self.recent.clear();
        self.unique_symbols.clear();
    }
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple hash for deduplication.
fn hash_message(message: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    message.hash(&mut hasher);
    hasher.finish()
}
