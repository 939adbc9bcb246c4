//! Tabular view of price history.

use rust_decimal::Decimal;

use crate::models::Price;

/// Price bars laid out as parallel columns indexed by time, ascending.
///
/// Each numeric column keeps per-row absence explicit: a bar the upstream
/// reported without an open still occupies its row with `None` rather than
/// being dropped or zero-filled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable {
    /// Row index: bar timestamps, sorted ascending
    pub time: Vec<String>,
    pub open: Vec<Option<Decimal>>,
    pub high: Vec<Option<Decimal>>,
    pub low: Vec<Option<Decimal>>,
    pub close: Vec<Option<Decimal>>,
    pub volume: Vec<Option<Decimal>>,
}

impl PriceTable {
    /// Build a table from price records in any order.
    pub fn from_prices(mut prices: Vec<Price>) -> Self {
        prices.sort_by(|a, b| a.time.cmp(&b.time));

        let mut table = Self::default();
        for price in prices {
            table.time.push(price.time);
            table.open.push(price.open);
            table.high.push(price.high);
            table.low.push(price.low);
            table.close.push(price.close);
            table.volume.push(price.volume);
        }
        table
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn price(time: &str, close: Option<Decimal>) -> Price {
        Price {
            ticker: "AAPL".to_string(),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
            time: time.to_string(),
            time_milliseconds: 0,
        }
    }

    #[test]
    fn test_rows_sorted_ascending() {
        // Providers return bars newest-first; the table flips them.
        let table = PriceTable::from_prices(vec![
            price("2024-01-05", Some(dec!(101))),
            price("2024-01-02", Some(dec!(100))),
            price("2024-01-03", Some(dec!(99))),
        ]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.time, vec!["2024-01-02", "2024-01-03", "2024-01-05"]);
        assert_eq!(table.close, vec![Some(dec!(100)), Some(dec!(99)), Some(dec!(101))]);
    }

    #[test]
    fn test_missing_values_stay_explicit() {
        let table = PriceTable::from_prices(vec![
            price("2024-01-02", Some(dec!(100))),
            price("2024-01-03", None),
        ]);

        assert_eq!(table.close, vec![Some(dec!(100)), None]);
        assert_eq!(table.open, vec![None, None]);
    }

    #[test]
    fn test_empty_input() {
        let table = PriceTable::from_prices(Vec::new());
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }
}
