//! Process-wide in-memory cache of fetched records.
//!
//! One list of records per ticker per record kind. The cache is advisory:
//! a miss silently falls through to the upstream path and no cache
//! operation can fail. There is no eviction, no TTL and no persistence;
//! cache lifetime equals process lifetime.
//!
//! Writes use merge semantics, not replace: new records are combined with
//! whatever is already stored for the ticker and de-duplicated by each
//! kind's natural key, so repeated fetches with overlapping ranges never
//! grow an unbounded duplicate list. When a key collides, the record
//! already in the cache wins.

use dashmap::DashMap;
use std::collections::HashSet;
use std::hash::Hash;

use crate::models::{CompanyNews, FinancialMetrics, InsiderTrade, Price};

/// Shared cache of previously fetched records, keyed by ticker.
///
/// Line items are intentionally not cached; every `search_line_items` call
/// goes upstream.
#[derive(Debug, Default)]
pub struct DataCache {
    prices: DashMap<String, Vec<Price>>,
    financial_metrics: DashMap<String, Vec<FinancialMetrics>>,
    insider_trades: DashMap<String, Vec<InsiderTrade>>,
    company_news: DashMap<String, Vec<CompanyNews>>,
}

/// Append `new` onto `existing`, skipping records whose natural key is
/// already present. Existing records win on collision.
fn merge_by_key<T, K, F>(existing: &mut Vec<T>, new: Vec<T>, key: F)
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen: HashSet<K> = existing.iter().map(&key).collect();
    for record in new {
        if seen.insert(key(&record)) {
            existing.push(record);
        }
    }
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Prices (natural key: time)
    // ------------------------------------------------------------------

    /// All cached price bars for a ticker, unfiltered.
    pub fn get_prices(&self, ticker: &str) -> Option<Vec<Price>> {
        self.prices.get(ticker).map(|entry| entry.clone())
    }

    /// Merge price bars into the cache for a ticker.
    pub fn set_prices(&self, ticker: &str, records: Vec<Price>) {
        let mut entry = self.prices.entry(ticker.to_string()).or_default();
        merge_by_key(&mut entry, records, |p| p.time.clone());
    }

    /// Cached price bars whose timestamp falls lexically within
    /// `[start_date, end_date]`.
    ///
    /// A non-empty result short-circuits the upstream fetch in the
    /// read-through path even when the cache only covers a subset of the
    /// requested range; see [`crate::provider::DataProvider`].
    pub fn prices_in_range(&self, ticker: &str, start_date: &str, end_date: &str) -> Vec<Price> {
        self.get_prices(ticker)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| start_date <= p.time.as_str() && p.time.as_str() <= end_date)
            .collect()
    }

    // ------------------------------------------------------------------
    // Financial metrics (natural key: report_period + period)
    // ------------------------------------------------------------------

    /// All cached financial metrics for a ticker, unfiltered.
    pub fn get_financial_metrics(&self, ticker: &str) -> Option<Vec<FinancialMetrics>> {
        self.financial_metrics.get(ticker).map(|entry| entry.clone())
    }

    /// Merge financial metrics into the cache for a ticker.
    pub fn set_financial_metrics(&self, ticker: &str, records: Vec<FinancialMetrics>) {
        let mut entry = self.financial_metrics.entry(ticker.to_string()).or_default();
        merge_by_key(&mut entry, records, |m| (m.report_period.clone(), m.period));
    }

    /// Cached metrics with `report_period <= end_date`.
    pub fn financial_metrics_until(&self, ticker: &str, end_date: &str) -> Vec<FinancialMetrics> {
        self.get_financial_metrics(ticker)
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.report_period.as_str() <= end_date)
            .collect()
    }

    // ------------------------------------------------------------------
    // Insider trades (natural key: filing_date + insider name)
    // ------------------------------------------------------------------

    /// All cached insider trades for a ticker, unfiltered.
    pub fn get_insider_trades(&self, ticker: &str) -> Option<Vec<InsiderTrade>> {
        self.insider_trades.get(ticker).map(|entry| entry.clone())
    }

    /// Merge insider trades into the cache for a ticker.
    pub fn set_insider_trades(&self, ticker: &str, records: Vec<InsiderTrade>) {
        let mut entry = self.insider_trades.entry(ticker.to_string()).or_default();
        merge_by_key(&mut entry, records, |t| {
            (t.filing_date.clone(), t.insider_name.clone())
        });
    }

    /// Cached trades whose effective date (transaction date, else filing
    /// date) falls within the range. `start_date = None` means no lower
    /// bound.
    pub fn insider_trades_in_range(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
    ) -> Vec<InsiderTrade> {
        self.get_insider_trades(ticker)
            .unwrap_or_default()
            .into_iter()
            .filter(|t| {
                let date = t.effective_date();
                start_date.map_or(true, |s| date >= s) && date <= end_date
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Company news (natural key: date + title)
    // ------------------------------------------------------------------

    /// All cached news items for a ticker, unfiltered.
    pub fn get_company_news(&self, ticker: &str) -> Option<Vec<CompanyNews>> {
        self.company_news.get(ticker).map(|entry| entry.clone())
    }

    /// Merge news items into the cache for a ticker.
    pub fn set_company_news(&self, ticker: &str, records: Vec<CompanyNews>) {
        let mut entry = self.company_news.entry(ticker.to_string()).or_default();
        merge_by_key(&mut entry, records, |n| (n.date.clone(), n.title.clone()));
    }

    /// Cached news items dated within the range. `start_date = None` means
    /// no lower bound.
    pub fn company_news_in_range(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
    ) -> Vec<CompanyNews> {
        self.get_company_news(ticker)
            .unwrap_or_default()
            .into_iter()
            .filter(|n| {
                start_date.map_or(true, |s| n.date.as_str() >= s) && n.date.as_str() <= end_date
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn price(time: &str, close: Decimal) -> Price {
        Price {
            ticker: "AAPL".to_string(),
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
            time: time.to_string(),
            time_milliseconds: 0,
        }
    }

    #[test]
    fn test_miss_returns_none() {
        let cache = DataCache::new();
        assert!(cache.get_prices("AAPL").is_none());
        assert!(cache.prices_in_range("AAPL", "2024-01-01", "2024-12-31").is_empty());
    }

    #[test]
    fn test_disjoint_ranges_merge_without_duplicates() {
        let cache = DataCache::new();
        cache.set_prices(
            "AAPL",
            vec![price("2024-01-02", dec!(100)), price("2024-01-03", dec!(101))],
        );
        cache.set_prices(
            "AAPL",
            vec![price("2024-02-01", dec!(110)), price("2024-02-02", dec!(111))],
        );

        let all = cache.get_prices("AAPL").unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_overlapping_ranges_deduplicate_and_existing_wins() {
        let cache = DataCache::new();
        cache.set_prices("AAPL", vec![price("2024-01-02", dec!(100))]);
        // Refetch of an overlapping range with a different close for the
        // same bar: the record already cached must win.
        cache.set_prices(
            "AAPL",
            vec![price("2024-01-02", dec!(999)), price("2024-01-03", dec!(101))],
        );

        let all = cache.get_prices("AAPL").unwrap();
        assert_eq!(all.len(), 2);
        let jan2 = all.iter().find(|p| p.time == "2024-01-02").unwrap();
        assert_eq!(jan2.close, Some(dec!(100)));
    }

    #[test]
    fn test_repeated_identical_sets_do_not_grow() {
        let cache = DataCache::new();
        for _ in 0..5 {
            cache.set_prices("AAPL", vec![price("2024-01-02", dec!(100))]);
        }
        assert_eq!(cache.get_prices("AAPL").unwrap().len(), 1);
    }

    #[test]
    fn test_prices_in_range_is_lexical() {
        let cache = DataCache::new();
        cache.set_prices(
            "AAPL",
            vec![
                price("2023-12-29", dec!(99)),
                price("2024-01-05", dec!(100)),
                price("2024-01-15", dec!(101)),
            ],
        );

        let hits = cache.prices_in_range("AAPL", "2024-01-01", "2024-01-10");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].time, "2024-01-05");
    }

    #[test]
    fn test_metrics_key_includes_period() {
        let cache = DataCache::new();
        let ttm = FinancialMetrics {
            ticker: "AAPL".to_string(),
            report_period: "2024-06-30".to_string(),
            period: Period::Ttm,
            ..Default::default()
        };
        let annual = FinancialMetrics {
            period: Period::Annual,
            ..ttm.clone()
        };
        cache.set_financial_metrics("AAPL", vec![ttm]);
        cache.set_financial_metrics("AAPL", vec![annual]);

        // Same report period, different granularity: both are kept.
        assert_eq!(cache.get_financial_metrics("AAPL").unwrap().len(), 2);
    }

    #[test]
    fn test_insider_trades_filter_uses_effective_date() {
        let cache = DataCache::new();
        cache.set_insider_trades(
            "NVDA",
            vec![
                InsiderTrade {
                    ticker: "NVDA".to_string(),
                    filing_date: "2024-03-04".to_string(),
                    transaction_date: Some("2024-02-20".to_string()),
                    insider_name: Some("Jane Doe".to_string()),
                    ..Default::default()
                },
                InsiderTrade {
                    ticker: "NVDA".to_string(),
                    filing_date: "2024-03-10".to_string(),
                    transaction_date: None,
                    insider_name: Some("John Roe".to_string()),
                    ..Default::default()
                },
            ],
        );

        // Only the first trade's transaction date falls in February.
        let hits = cache.insider_trades_in_range("NVDA", "2024-02-28", Some("2024-02-01"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].insider_name.as_deref(), Some("Jane Doe"));

        // No lower bound picks up both.
        let hits = cache.insider_trades_in_range("NVDA", "2024-03-31", None);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_news_dedup_by_date_and_title() {
        let cache = DataCache::new();
        let item = CompanyNews {
            ticker: "TSLA".to_string(),
            date: "2024-02-12".to_string(),
            title: "Tesla announces new factory".to_string(),
            ..Default::default()
        };
        cache.set_company_news("TSLA", vec![item.clone()]);
        cache.set_company_news(
            "TSLA",
            vec![
                item,
                CompanyNews {
                    ticker: "TSLA".to_string(),
                    date: "2024-02-12".to_string(),
                    title: "A different headline".to_string(),
                    ..Default::default()
                },
            ],
        );

        assert_eq!(cache.get_company_news("TSLA").unwrap().len(), 2);
    }
}
