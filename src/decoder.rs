//! Tick line decoding.
//!
//! Each input line is comma-delimited with fifteen positional fields:
//!
//! | # | Field | Used |
//! |---|-------|------|
//! | 0 | symbol | yes |
//! | 1 | - | |
//! | 2 | bid price | yes |
//! | 3 | ask price | yes |
//! | 4 | trade price | yes |
//! | 5 | bid volume | yes |
//! | 6 | ask volume | yes |
//! | 7 | trade volume | yes |
//! | 8 | update type (1 trade, 2 bid, 3 ask) | yes |
//! | 9 | - | |
//! | 10 | date, `YYYYMMDD` | yes |
//! | 11 | seconds past midnight | yes |
//! | 12 | - | |
//! | 13 | - | |
//! | 14 | condition code | yes |
//!
//! Only lines whose condition code contains `XT`, or equals the `@1`
//! placeholder for a missing code, are turned into records.

use chrono::NaiveDate;

use crate::error::{LedgerError, Result};
use crate::types::{EventKind, Record, Timestamp};

/// Number of fields on a complete line.
pub const FIELD_COUNT: usize = 15;

/// Substring that marks a condition code as eligible.
pub const ELIGIBLE_CONDITION: &str = "XT";

/// Placeholder written when the condition code column is missing.
pub const MISSING_CONDITION: &str = "@1";

const SECONDS_PER_DAY: f64 = 86_400.0;

const IDX_SYMBOL: usize = 0;
const IDX_BID_PRICE: usize = 2;
const IDX_ASK_PRICE: usize = 3;
const IDX_TRADE_PRICE: usize = 4;
const IDX_BID_VOLUME: usize = 5;
const IDX_ASK_VOLUME: usize = 6;
const IDX_TRADE_VOLUME: usize = 7;
const IDX_UPDATE_TYPE: usize = 8;
const IDX_DATE: usize = 10;
const IDX_SECONDS: usize = 11;
const IDX_CONDITION: usize = 14;

/// What became of one decoded line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Eligible line, decoded into a record
    Accepted(Record),

    /// Ineligible condition code; the rest of the line was not decoded
    Filtered {
        symbol: String,
        condition_code: String,
    },
}

/// Decide whether a condition code is eligible.
///
/// Returns the normalized code for eligible lines (`@1` becomes empty) and
/// `None` for lines that must be discarded.
pub fn accept_condition(code: &str) -> Option<String> {
    if code == MISSING_CONDITION {
        Some(String::new())
    } else if code.contains(ELIGIBLE_CONDITION) {
        Some(code.to_string())
    } else {
        None
    }
}

/// Parse a compact `YYYYMMDD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|_| LedgerError::InvalidDate(value.to_string()))
}

/// Absolute timestamp for a calendar date plus seconds past midnight (UTC).
///
/// Fractional seconds are truncated; timestamps have second resolution.
pub fn to_timestamp(date: NaiveDate, seconds_past_midnight: f64) -> Result<Timestamp> {
    if !seconds_past_midnight.is_finite()
        || seconds_past_midnight < 0.0
        || seconds_past_midnight >= SECONDS_PER_DAY
    {
        return Err(LedgerError::InvalidField {
            name: "seconds",
            value: seconds_past_midnight.to_string(),
        });
    }

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| LedgerError::InvalidDate(date.to_string()))?;
    Ok(midnight.and_utc().timestamp() + seconds_past_midnight.trunc() as i64)
}

/// Decode one input line.
///
/// Fields are trimmed of surrounding whitespace. A line with fewer than
/// fifteen fields has an empty condition code and is filtered.
pub fn decode_line(line: &str) -> Result<LineOutcome> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').map(str::trim).collect();

    let symbol = field(&fields, IDX_SYMBOL, "symbol")?;
    if symbol.is_empty() {
        return Err(LedgerError::InvalidField {
            name: "symbol",
            value: String::new(),
        });
    }

    let raw_condition = fields.get(IDX_CONDITION).copied().unwrap_or_default();
    let Some(condition_code) = accept_condition(raw_condition) else {
        return Ok(LineOutcome::Filtered {
            symbol: symbol.to_string(),
            condition_code: raw_condition.to_string(),
        });
    };

    let update_type = field(&fields, IDX_UPDATE_TYPE, "update type")?;
    let event_kind = update_type
        .parse::<u8>()
        .ok()
        .and_then(EventKind::from_update_type)
        .ok_or_else(|| LedgerError::InvalidUpdateType(update_type.to_string()))?;

    let date = parse_date(field(&fields, IDX_DATE, "date")?)?;
    let seconds: f64 = parse_field(&fields, IDX_SECONDS, "seconds")?;
    let timestamp = to_timestamp(date, seconds)?;

    let record = Record {
        symbol: symbol.to_string(),
        bid_price: parse_field(&fields, IDX_BID_PRICE, "bid price")?,
        ask_price: parse_field(&fields, IDX_ASK_PRICE, "ask price")?,
        trade_price: parse_field(&fields, IDX_TRADE_PRICE, "trade price")?,
        bid_volume: parse_field(&fields, IDX_BID_VOLUME, "bid volume")?,
        ask_volume: parse_field(&fields, IDX_ASK_VOLUME, "ask volume")?,
        trade_volume: parse_field(&fields, IDX_TRADE_VOLUME, "trade volume")?,
        event_kind,
        condition_code,
        timestamp,
    };

    Ok(LineOutcome::Accepted(record))
}

fn field<'a>(fields: &[&'a str], index: usize, name: &'static str) -> Result<&'a str> {
    fields
        .get(index)
        .copied()
        .ok_or(LedgerError::MissingField { index, name })
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    index: usize,
    name: &'static str,
) -> Result<T> {
    let raw = field(fields, index, name)?;
    raw.parse::<T>().map_err(|_| LedgerError::InvalidField {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const APRIL_20_2015: i64 = 1_429_488_000;

    fn line(update_type: &str, seconds: &str, condition: &str) -> String {
        format!(
            "ABC SS Equity,x,10.5,10.75,10.6,1200,800,300,{update_type},x,20150420,{seconds},x,x,{condition}"
        )
    }

    #[test]
    fn test_accept_condition() {
        assert_eq!(accept_condition("XT"), Some("XT".to_string()));
        assert_eq!(accept_condition("AXTB"), Some("AXTB".to_string()));
        assert_eq!(accept_condition("@1"), Some(String::new()));
        assert_eq!(accept_condition("ZT"), None);
        assert_eq!(accept_condition(""), None);
        assert_eq!(accept_condition("xt"), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("20150420").unwrap(),
            NaiveDate::from_ymd_opt(2015, 4, 20).unwrap()
        );
        assert!(parse_date("20150431").is_err());
        assert!(parse_date("2015042").is_err());
        assert!(parse_date("2015-4-20").is_err());
    }

    #[test]
    fn test_to_timestamp() {
        let date = NaiveDate::from_ymd_opt(2015, 4, 20).unwrap();
        assert_eq!(to_timestamp(date, 0.0).unwrap(), APRIL_20_2015);
        assert_eq!(to_timestamp(date, 32_400.9).unwrap(), APRIL_20_2015 + 32_400);
        assert!(to_timestamp(date, -1.0).is_err());
        assert!(to_timestamp(date, 86_400.0).is_err());
    }

    #[test]
    fn test_timestamps_across_month_boundary() {
        let end_of_march = to_timestamp(parse_date("20150331").unwrap(), 86_399.0).unwrap();
        let start_of_april = to_timestamp(parse_date("20150401").unwrap(), 0.0).unwrap();
        assert_eq!(start_of_april - end_of_march, 1);
    }

    #[test]
    fn test_decode_accepted_trade() {
        let outcome = decode_line(&line("1", "36000", "XT")).unwrap();
        let LineOutcome::Accepted(record) = outcome else {
            panic!("expected accepted record");
        };

        assert_eq!(record.symbol, "ABC SS Equity");
        assert_eq!(record.event_kind, EventKind::Trade);
        assert_eq!(record.bid_price, 10.5);
        assert_eq!(record.ask_price, 10.75);
        assert_eq!(record.trade_price, 10.6);
        assert_eq!(record.bid_volume, 1200);
        assert_eq!(record.ask_volume, 800);
        assert_eq!(record.trade_volume, 300);
        assert_eq!(record.condition_code, "XT");
        assert_eq!(record.timestamp, APRIL_20_2015 + 36_000);
    }

    #[test]
    fn test_decode_missing_condition_placeholder() {
        let outcome = decode_line(&line("2", "100", "@1")).unwrap();
        match outcome {
            LineOutcome::Accepted(record) => {
                assert_eq!(record.condition_code, "");
                assert_eq!(record.event_kind, EventKind::BidChange);
            }
            other => panic!("expected accepted record, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_filtered_condition() {
        let outcome = decode_line(&line("3", "100", "ZT")).unwrap();
        assert_eq!(
            outcome,
            LineOutcome::Filtered {
                symbol: "ABC SS Equity".to_string(),
                condition_code: "ZT".to_string(),
            }
        );
    }

    #[test]
    fn test_filtered_line_is_not_decoded_further() {
        // Garbage update type, but the condition code already rules it out.
        let outcome = decode_line(&line("9", "100", "A")).unwrap();
        assert!(matches!(outcome, LineOutcome::Filtered { .. }));
    }

    #[test]
    fn test_short_line_is_filtered() {
        let outcome = decode_line("ABC,x,1,2,3,4,5,6,1,x,20150420,10").unwrap();
        assert!(matches!(
            outcome,
            LineOutcome::Filtered { ref condition_code, .. } if condition_code.is_empty()
        ));
    }

    #[test]
    fn test_decode_invalid_update_type() {
        let err = decode_line(&line("4", "100", "XT")).unwrap_err();
        assert_eq!(err, LedgerError::InvalidUpdateType("4".to_string()));
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_decode_invalid_numeric_field() {
        let bad = "ABC,x,ten,10.75,10.6,1,1,1,1,x,20150420,5,x,x,XT";
        assert_eq!(
            decode_line(bad).unwrap_err(),
            LedgerError::InvalidField {
                name: "bid price",
                value: "ten".to_string()
            }
        );

        let negative_volume = "ABC,x,1,2,3,-4,1,1,1,x,20150420,5,x,x,XT";
        assert!(matches!(
            decode_line(negative_volume),
            Err(LedgerError::InvalidField { name: "bid volume", .. })
        ));
    }

    #[test]
    fn test_decode_invalid_date() {
        let bad = "ABC,x,1,2,3,4,5,6,1,x,2015O420,5,x,x,XT";
        assert!(matches!(decode_line(bad), Err(LedgerError::InvalidDate(_))));
    }

    #[test]
    fn test_decode_trims_whitespace_and_crlf() {
        let outcome = decode_line(" ABC , x, 1 ,2,3,4,5,6, 1 ,x,20150420, 5 ,x,x, XT \r\n").unwrap();
        let LineOutcome::Accepted(record) = outcome else {
            panic!("expected accepted record");
        };
        assert_eq!(record.symbol, "ABC");
        assert_eq!(record.timestamp, APRIL_20_2015 + 5);
        assert_eq!(record.condition_code, "XT");
    }

    #[test]
    fn test_decode_empty_symbol() {
        assert!(decode_line(",x,1,2,3,4,5,6,1,x,20150420,5,x,x,XT").is_err());
    }
}
