use serde::{Deserialize, Serialize};

use super::Period;

/// One financial statement line item for a ticker and report period.
///
/// The line item name is a free-form string key; multiple records may share
/// a ticker and report period with different names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Ticker symbol
    pub ticker: String,

    /// Line item name as requested by the caller (e.g. "total_revenue")
    pub line_item: String,

    /// Reported value
    pub value: f64,

    /// Fiscal period the value belongs to (`YYYY-MM-DD`)
    pub report_period: String,

    /// Reporting granularity (ttm / annual / quarterly)
    #[serde(default)]
    pub period: Period,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let item = LineItem {
            ticker: "AAPL".to_string(),
            line_item: "total_revenue".to_string(),
            value: 383_285_000_000.0,
            report_period: "2023-09-30".to_string(),
            period: Period::Annual,
        };

        let json = serde_json::to_string(&item).unwrap();
        let back: LineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
