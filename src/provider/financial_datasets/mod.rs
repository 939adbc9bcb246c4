//! Financial Datasets API provider implementation.
//!
//! This module provides normalized records from the financialdatasets.ai
//! REST API:
//! - Daily price bars via the /prices endpoint
//! - Financial metric snapshots via /financial-metrics
//! - Statement line items via /financials/search/line-items
//! - Insider trades via /insider-trades
//! - Company news via /news
//!
//! Authentication is an `X-API-KEY` header read from the
//! `FINANCIAL_DATASETS_API_KEY` environment variable.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DataCache;
use crate::errors::FetchError;
use crate::models::{CompanyNews, FinancialMetrics, InsiderTrade, LineItem, Period, Price};
use crate::provider::DataProvider;

const BASE_URL: &str = "https://api.financialdatasets.ai";
const PROVIDER_ID: &str = "financial_datasets";
const PROVIDER_NAME: &str = "Financial Datasets API";
/// Environment variable holding the Financial Datasets API key.
pub const API_KEY_ENV: &str = "FINANCIAL_DATASETS_API_KEY";

/// Financial Datasets data provider.
pub struct FinancialDatasetsProvider {
    client: Client,
    cache: Arc<DataCache>,
    api_key: String,
    base_url: String,
}

// ============================================================================
// Response structures for the Financial Datasets API
// ============================================================================

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    prices: Vec<RawPrice>,
}

/// One price bar as the API reports it. The bar carries no ticker and no
/// epoch timestamp; both are filled in during normalization.
#[derive(Debug, Deserialize)]
struct RawPrice {
    #[serde(default)]
    open: Option<Decimal>,
    #[serde(default)]
    high: Option<Decimal>,
    #[serde(default)]
    low: Option<Decimal>,
    #[serde(default)]
    close: Option<Decimal>,
    #[serde(default)]
    volume: Option<Decimal>,
    time: String,
}

impl RawPrice {
    fn into_price(self, ticker: &str) -> Price {
        let time_milliseconds = parse_time_millis(&self.time);
        Price {
            ticker: ticker.to_string(),
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            time: self.time,
            time_milliseconds,
        }
    }
}

/// The metrics, trades and news payloads already use the normalized field
/// names, so they deserialize straight into the record types.
#[derive(Debug, Deserialize)]
struct FinancialMetricsResponse {
    #[serde(default)]
    financial_metrics: Vec<FinancialMetrics>,
}

#[derive(Debug, Deserialize)]
struct LineItemsResponse {
    #[serde(default)]
    search_results: Vec<LineItem>,
}

#[derive(Debug, Deserialize)]
struct InsiderTradesResponse {
    #[serde(default)]
    insider_trades: Vec<InsiderTrade>,
}

#[derive(Debug, Deserialize)]
struct CompanyNewsResponse {
    #[serde(default)]
    news: Vec<CompanyNews>,
}

/// Epoch milliseconds for an ISO timestamp or a bare `YYYY-MM-DD` date
/// (taken as midnight UTC). Zero when the string is unparseable.
fn parse_time_millis(time: &str) -> i64 {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    if let Ok(dt) = DateTime::parse_from_rfc3339(time) {
        return dt.timestamp_millis();
    }
    NaiveDate::parse_from_str(time, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| Utc.from_local_datetime(&dt).single())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

// ============================================================================
// FinancialDatasetsProvider implementation
// ============================================================================

impl FinancialDatasetsProvider {
    /// Create a provider backed by the production API, reading the API key
    /// from the environment.
    pub fn new(cache: Arc<DataCache>) -> Self {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::with_base_url(cache, api_key, BASE_URL.to_string())
    }

    /// Create a provider pointed at an alternate endpoint.
    pub fn with_base_url(cache: Arc<DataCache>, api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            cache,
            api_key,
            base_url,
        }
    }

    /// GET a JSON payload, mapping non-success statuses to fetch errors.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        ticker: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Financial Datasets request: {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        Self::decode(ticker, response).await
    }

    /// POST a JSON body, mapping non-success statuses to fetch errors.
    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        ticker: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Financial Datasets request: POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(body)
            .send()
            .await?;

        Self::decode(ticker, response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        ticker: &str,
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Upstream {
                ticker: ticker.to_string(),
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
            ticker: ticker.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl DataProvider for FinancialDatasetsProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get_prices(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Price>, FetchError> {
        let cached = self.cache.prices_in_range(ticker, start_date, end_date);
        if !cached.is_empty() {
            debug!("prices cache hit for {} ({} bars)", ticker, cached.len());
            return Ok(sort_newest_first(cached, |p| p.time.clone()));
        }

        let query = [
            ("ticker", ticker),
            ("interval", "day"),
            ("interval_multiplier", "1"),
            ("start_date", start_date),
            ("end_date", end_date),
        ];
        let response: PricesResponse = self.get_json(ticker, "/prices/", &query).await?;

        let prices: Vec<Price> = response
            .prices
            .into_iter()
            .map(|raw| raw.into_price(ticker))
            .collect();
        debug!("fetched {} price bars for {}", prices.len(), ticker);

        self.cache.set_prices(ticker, prices.clone());
        Ok(sort_newest_first(prices, |p| p.time.clone()))
    }

    async fn get_financial_metrics(
        &self,
        ticker: &str,
        end_date: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<FinancialMetrics>, FetchError> {
        let cached = self.cache.financial_metrics_until(ticker, end_date);
        if !cached.is_empty() {
            debug!("financial metrics cache hit for {}", ticker);
            let sorted = sort_newest_first(cached, |m| m.report_period.clone());
            return Ok(truncate(sorted, limit));
        }

        let limit_str = limit.to_string();
        let query = [
            ("ticker", ticker),
            ("report_period_lte", end_date),
            ("limit", limit_str.as_str()),
            ("period", period.as_str()),
        ];
        let response: FinancialMetricsResponse =
            self.get_json(ticker, "/financial-metrics/", &query).await?;
        debug!(
            "fetched {} metric snapshots for {}",
            response.financial_metrics.len(),
            ticker
        );

        self.cache
            .set_financial_metrics(ticker, response.financial_metrics.clone());
        let sorted = sort_newest_first(response.financial_metrics, |m| m.report_period.clone());
        Ok(truncate(sorted, limit))
    }

    async fn search_line_items(
        &self,
        ticker: &str,
        line_items: &[String],
        end_date: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<LineItem>, FetchError> {
        let body = json!({
            "tickers": [ticker],
            "line_items": line_items,
            "end_date": end_date,
            "period": period.as_str(),
            "limit": limit,
        });
        let response: LineItemsResponse = self
            .post_json(ticker, "/financials/search/line-items", &body)
            .await?;
        debug!(
            "fetched {} line items for {}",
            response.search_results.len(),
            ticker
        );

        let sorted = sort_newest_first(response.search_results, |i| i.report_period.clone());
        Ok(truncate(sorted, limit))
    }

    async fn get_insider_trades(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InsiderTrade>, FetchError> {
        let cached = self.cache.insider_trades_in_range(ticker, end_date, start_date);
        if !cached.is_empty() {
            debug!("insider trades cache hit for {}", ticker);
            let sorted = sort_newest_first(cached, |t| t.effective_date().to_string());
            return Ok(truncate(sorted, limit));
        }

        let limit_str = limit.to_string();
        let mut query = vec![
            ("ticker", ticker),
            ("filing_date_lte", end_date),
            ("limit", limit_str.as_str()),
        ];
        if let Some(start) = start_date {
            query.push(("filing_date_gte", start));
        }
        let response: InsiderTradesResponse =
            self.get_json(ticker, "/insider-trades/", &query).await?;
        debug!(
            "fetched {} insider trades for {}",
            response.insider_trades.len(),
            ticker
        );

        self.cache
            .set_insider_trades(ticker, response.insider_trades.clone());
        let sorted = sort_newest_first(response.insider_trades, |t| {
            t.effective_date().to_string()
        });
        Ok(truncate(sorted, limit))
    }

    async fn get_company_news(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CompanyNews>, FetchError> {
        let cached = self.cache.company_news_in_range(ticker, end_date, start_date);
        if !cached.is_empty() {
            debug!("company news cache hit for {}", ticker);
            let sorted = sort_newest_first(cached, |n| n.date.clone());
            return Ok(truncate(sorted, limit));
        }

        let limit_str = limit.to_string();
        let mut query = vec![
            ("ticker", ticker),
            ("end_date", end_date),
            ("limit", limit_str.as_str()),
        ];
        if let Some(start) = start_date {
            query.push(("start_date", start));
        }
        let response: CompanyNewsResponse = self.get_json(ticker, "/news/", &query).await?;
        debug!("fetched {} news items for {}", response.news.len(), ticker);

        self.cache.set_company_news(ticker, response.news.clone());
        let sorted = sort_newest_first(response.news, |n| n.date.clone());
        Ok(truncate(sorted, limit))
    }
}

/// Sort records newest-first by their defining date string.
fn sort_newest_first<T, F>(mut records: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    records.sort_by(|a, b| key(b).cmp(&key(a)));
    records
}

fn truncate<T>(mut records: Vec<T>, limit: usize) -> Vec<T> {
    records.truncate(limit);
    records
}
