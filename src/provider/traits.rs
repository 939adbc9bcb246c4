//! The capability contract every data provider implements.

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{CompanyNews, FinancialMetrics, InsiderTrade, LineItem, Period, Price};

/// Default record cap for financial metrics queries.
pub const DEFAULT_METRICS_LIMIT: usize = 10;
/// Default record cap for line item searches.
pub const DEFAULT_LINE_ITEMS_LIMIT: usize = 10;
/// Default record cap for insider trade queries.
pub const DEFAULT_TRADES_LIMIT: usize = 1000;
/// Default record cap for company news queries.
pub const DEFAULT_NEWS_LIMIT: usize = 1000;

/// A source of market and fundamental data.
///
/// Every fetch operation reads through the shared cache: cached records
/// covering the request are returned without an upstream call, and fresh
/// upstream records are merged back into the cache before returning. The
/// one exception is [`search_line_items`](DataProvider::search_line_items),
/// which always goes upstream.
///
/// All list results come back sorted newest-first and truncated to the
/// requested limit. Dates are `YYYY-MM-DD` strings and ranges are
/// inclusive on both ends.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Stable registry key for this provider (e.g. `"yahoo_finance"`).
    fn id(&self) -> &'static str;

    /// Human-readable display name (e.g. `"Yahoo Finance"`).
    fn name(&self) -> &'static str;

    /// Daily price bars for `ticker` between `start_date` and `end_date`.
    async fn get_prices(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Price>, FetchError>;

    /// Financial metric snapshots with report periods up to `end_date`,
    /// newest first, at most `limit` records.
    async fn get_financial_metrics(
        &self,
        ticker: &str,
        end_date: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<FinancialMetrics>, FetchError>;

    /// Values for the named financial statement line items, newest report
    /// period first. Uncached.
    async fn search_line_items(
        &self,
        ticker: &str,
        line_items: &[String],
        end_date: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<LineItem>, FetchError>;

    /// Insider transaction filings dated up to `end_date` (and from
    /// `start_date` when given), newest first.
    async fn get_insider_trades(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InsiderTrade>, FetchError>;

    /// News items dated up to `end_date` (and from `start_date` when
    /// given), newest first.
    async fn get_company_news(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CompanyNews>, FetchError>;

    /// Market capitalization as of `end_date`, taken from the most recent
    /// metrics snapshot. `Ok(None)` when no snapshot carries one.
    async fn get_market_cap(
        &self,
        ticker: &str,
        end_date: &str,
    ) -> Result<Option<f64>, FetchError> {
        let metrics = self
            .get_financial_metrics(ticker, end_date, Period::Ttm, DEFAULT_METRICS_LIMIT)
            .await?;
        Ok(metrics.first().and_then(|m| m.market_cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticMetricsProvider {
        metrics: Vec<FinancialMetrics>,
    }

    #[async_trait]
    impl DataProvider for StaticMetricsProvider {
        fn id(&self) -> &'static str {
            "static"
        }

        fn name(&self) -> &'static str {
            "Static"
        }

        async fn get_prices(
            &self,
            _ticker: &str,
            _start_date: &str,
            _end_date: &str,
        ) -> Result<Vec<Price>, FetchError> {
            Ok(Vec::new())
        }

        async fn get_financial_metrics(
            &self,
            _ticker: &str,
            _end_date: &str,
            _period: Period,
            _limit: usize,
        ) -> Result<Vec<FinancialMetrics>, FetchError> {
            Ok(self.metrics.clone())
        }

        async fn search_line_items(
            &self,
            _ticker: &str,
            _line_items: &[String],
            _end_date: &str,
            _period: Period,
            _limit: usize,
        ) -> Result<Vec<LineItem>, FetchError> {
            Ok(Vec::new())
        }

        async fn get_insider_trades(
            &self,
            _ticker: &str,
            _end_date: &str,
            _start_date: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<InsiderTrade>, FetchError> {
            Ok(Vec::new())
        }

        async fn get_company_news(
            &self,
            _ticker: &str,
            _end_date: &str,
            _start_date: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<CompanyNews>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_default_market_cap_reads_most_recent_metrics() {
        let provider = StaticMetricsProvider {
            metrics: vec![
                FinancialMetrics {
                    ticker: "AAPL".to_string(),
                    report_period: "2024-06-30".to_string(),
                    market_cap: Some(3.1e12),
                    ..Default::default()
                },
                FinancialMetrics {
                    ticker: "AAPL".to_string(),
                    report_period: "2024-03-31".to_string(),
                    market_cap: Some(2.9e12),
                    ..Default::default()
                },
            ],
        };

        let cap = provider.get_market_cap("AAPL", "2024-07-01").await.unwrap();
        assert_eq!(cap, Some(3.1e12));
    }

    #[tokio::test]
    async fn test_default_market_cap_is_none_without_metrics() {
        let provider = StaticMetricsProvider { metrics: vec![] };
        let cap = provider.get_market_cap("AAPL", "2024-07-01").await.unwrap();
        assert_eq!(cap, None);
    }

    #[tokio::test]
    async fn test_default_market_cap_skips_missing_field() {
        let provider = StaticMetricsProvider {
            metrics: vec![FinancialMetrics {
                ticker: "AAPL".to_string(),
                report_period: "2024-06-30".to_string(),
                market_cap: None,
                ..Default::default()
            }],
        };
        let cap = provider.get_market_cap("AAPL", "2024-07-01").await.unwrap();
        assert_eq!(cap, None);
    }
}
