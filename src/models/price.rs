use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single daily price bar.
///
/// `time` and `time_milliseconds` are two representations of the same
/// instant: the ISO timestamp string and its epoch-millisecond value.
/// Individual OHLCV fields may be absent when the upstream source reported
/// a gap for that bar; absence is legitimate data, not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Ticker symbol the bar belongs to
    pub ticker: String,

    /// Opening price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    /// High price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,

    /// Low price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,

    /// Closing price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<Decimal>,

    /// Trading volume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    /// ISO timestamp of the bar (e.g. "2024-01-05T00:00:00Z")
    pub time: String,

    /// Epoch milliseconds of the same instant as `time`
    pub time_milliseconds: i64,
}
