//! Yahoo Finance provider implementation.
//!
//! This module provides normalized records from the public Yahoo Finance
//! endpoints:
//! - Daily price bars via the v8 chart endpoint
//! - Financial metrics and insider trades via v10 quoteSummary modules
//! - Statement line items via the statement-history quoteSummary modules
//! - Company news via the v2 news endpoint
//!
//! Yahoo wraps most numeric values as `{"raw": ..., "fmt": ...}` objects
//! and reports no separate filing date for insider transactions; the
//! transaction date stands in for both. News sentiment is never provided.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DataCache;
use crate::errors::FetchError;
use crate::models::{CompanyNews, FinancialMetrics, InsiderTrade, LineItem, Period, Price};
use crate::provider::DataProvider;

const CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";
const SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com";
const PROVIDER_ID: &str = "yahoo_finance";
const PROVIDER_NAME: &str = "Yahoo Finance API";
/// Environment variable holding the Yahoo Finance API key.
pub const API_KEY_ENV: &str = "YAHOO_FINANCE_API_KEY";

/// Yahoo Finance data provider.
pub struct YahooFinanceProvider {
    client: Client,
    cache: Arc<DataCache>,
    api_key: String,
    chart_base_url: String,
    summary_base_url: String,
}

// ============================================================================
// Response structures for the Yahoo Finance API
// ============================================================================

/// Yahoo's `{"raw": 1.23, "fmt": "1.23"}` numeric wrapper.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

impl RawValue {
    fn raw(value: &Option<RawValue>) -> Option<f64> {
        value.as_ref().and_then(|v| v.raw)
    }
}

/// `{"fmt": "2024-03-01"}` date wrapper used by statement and transaction
/// payloads.
#[derive(Debug, Default, Deserialize)]
struct FmtDate {
    #[serde(default)]
    fmt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartOuter,
}

#[derive(Debug, Deserialize)]
struct ChartOuter {
    #[serde(default)]
    result: Vec<ChartResult>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

/// Parallel OHLCV arrays aligned with the timestamp array; Yahoo fills
/// holes (halted days) with nulls.
#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<Decimal>>,
    #[serde(default)]
    high: Vec<Option<Decimal>>,
    #[serde(default)]
    low: Vec<Option<Decimal>>,
    #[serde(default)]
    close: Vec<Option<Decimal>>,
    #[serde(default)]
    volume: Vec<Option<Decimal>>,
}

impl ChartQuote {
    fn at(series: &[Option<Decimal>], i: usize) -> Option<Decimal> {
        series.get(i).copied().flatten()
    }
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryOuter,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryOuter {
    #[serde(default)]
    result: Vec<QuoteSummaryModules>,
}

/// Superset of the quoteSummary modules this provider requests. Each call
/// asks for a subset; the rest default to empty.
#[derive(Debug, Default, Deserialize)]
struct QuoteSummaryModules {
    #[serde(rename = "financialData", default)]
    financial_data: FinancialData,
    #[serde(rename = "defaultKeyStatistics", default)]
    key_stats: KeyStatistics,
    #[serde(rename = "summaryDetail", default)]
    summary_detail: SummaryDetail,
    #[serde(rename = "insiderTransactions", default)]
    insider_transactions: InsiderTransactions,
    #[serde(rename = "incomeStatementHistory", default)]
    income_statements: IncomeStatementHistory,
    #[serde(rename = "balanceSheetHistory", default)]
    balance_sheets: BalanceSheetHistory,
    #[serde(rename = "cashflowStatementHistory", default)]
    cashflow_statements: CashflowStatementHistory,
}

#[derive(Debug, Default, Deserialize)]
struct FinancialData {
    #[serde(rename = "totalRevenue", default)]
    total_revenue: Option<RawValue>,
    #[serde(rename = "grossProfits", default)]
    gross_profits: Option<RawValue>,
    #[serde(rename = "operatingIncome", default)]
    operating_income: Option<RawValue>,
    #[serde(rename = "netIncome", default)]
    net_income: Option<RawValue>,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<RawValue>,
    #[serde(rename = "debtToEquity", default)]
    debt_to_equity: Option<RawValue>,
    #[serde(rename = "freeCashflow", default)]
    free_cashflow: Option<RawValue>,
    #[serde(rename = "operatingCashflow", default)]
    operating_cashflow: Option<RawValue>,
    #[serde(default)]
    ebitda: Option<RawValue>,
    #[serde(rename = "totalDebt", default)]
    total_debt: Option<RawValue>,
    #[serde(rename = "returnOnEquity", default)]
    return_on_equity: Option<RawValue>,
    #[serde(rename = "returnOnAssets", default)]
    return_on_assets: Option<RawValue>,
    #[serde(rename = "profitMargins", default)]
    profit_margins: Option<RawValue>,
    #[serde(rename = "operatingMargins", default)]
    operating_margins: Option<RawValue>,
    #[serde(rename = "currentRatio", default)]
    current_ratio: Option<RawValue>,
    #[serde(rename = "quickRatio", default)]
    quick_ratio: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatistics {
    #[serde(rename = "trailingEps", default)]
    trailing_eps: Option<RawValue>,
    #[serde(rename = "bookValue", default)]
    book_value: Option<RawValue>,
    #[serde(rename = "priceToBook", default)]
    price_to_book: Option<RawValue>,
    #[serde(rename = "sharesOutstanding", default)]
    shares_outstanding: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "dividendYield", default)]
    dividend_yield: Option<RawValue>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct InsiderTransactions {
    #[serde(default)]
    transactions: Vec<RawTransaction>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTransaction {
    #[serde(rename = "startDate", default)]
    start_date: Option<FmtDate>,
    #[serde(rename = "filerName", default)]
    filer_name: Option<String>,
    #[serde(rename = "filerRelation", default)]
    filer_relation: Option<String>,
    #[serde(rename = "transactionDescription", default)]
    transaction_description: Option<String>,
    #[serde(default)]
    shares: Option<RawValue>,
    #[serde(default)]
    value: Option<RawValue>,
    #[serde(rename = "filerUrl", default)]
    filer_url: Option<String>,
}

/// Statement entries keep their upstream field names, so they stay as raw
/// JSON maps and line-item lookup matches keys dynamically.
#[derive(Debug, Default, Deserialize)]
struct IncomeStatementHistory {
    #[serde(rename = "incomeStatementHistory", default)]
    statements: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct BalanceSheetHistory {
    #[serde(rename = "balanceSheetStatements", default)]
    statements: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct CashflowStatementHistory {
    #[serde(rename = "cashflowStatements", default)]
    statements: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    items: NewsItems,
}

#[derive(Debug, Default, Deserialize)]
struct NewsItems {
    #[serde(default)]
    result: Vec<RawNewsItem>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNewsItem {
    #[serde(default)]
    published_at: Option<i64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Epoch seconds at UTC midnight for a `YYYY-MM-DD` date.
fn date_to_timestamp(ticker: &str, date: &str) -> Result<i64, FetchError> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| Utc.from_local_datetime(&dt).single())
        .map(|dt| dt.timestamp())
        .ok_or_else(|| FetchError::MalformedResponse {
            ticker: ticker.to_string(),
            message: format!("invalid date: {}", date),
        })
}

/// ISO timestamp string for an epoch-second value.
fn timestamp_to_iso(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// Case- and underscore-insensitive line-item name comparison, so a request
/// for `total_revenue` matches Yahoo's `totalRevenue` key.
fn line_item_key_matches(upstream_key: &str, requested: &str) -> bool {
    let normalize = |s: &str| s.to_lowercase().replace('_', "");
    normalize(upstream_key) == normalize(requested)
}

/// Pull a numeric value out of a statement field, unwrapping the `raw`
/// object form when present.
fn statement_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Object(map) => map.get("raw").and_then(|v| v.as_f64()),
        other => other.as_f64(),
    }
}

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

// ============================================================================
// YahooFinanceProvider implementation
// ============================================================================

impl YahooFinanceProvider {
    /// Create a provider backed by the production endpoints, reading the
    /// API key from the environment.
    pub fn new(cache: Arc<DataCache>) -> Self {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::with_base_urls(
            cache,
            api_key,
            CHART_BASE_URL.to_string(),
            SUMMARY_BASE_URL.to_string(),
        )
    }

    /// Create a provider pointed at alternate endpoints.
    pub fn with_base_urls(
        cache: Arc<DataCache>,
        api_key: String,
        chart_base_url: String,
        summary_base_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            cache,
            api_key,
            chart_base_url,
            summary_base_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        ticker: &str,
        url: &str,
    ) -> Result<T, FetchError> {
        debug!("Yahoo Finance request: {}", url);

        let response = self
            .client
            .get(url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

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

    async fn fetch_quote_summary(
        &self,
        ticker: &str,
        modules: &str,
    ) -> Result<QuoteSummaryModules, FetchError> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.summary_base_url, ticker, modules
        );
        let response: QuoteSummaryResponse = self.get_json(ticker, &url).await?;
        Ok(response
            .quote_summary
            .result
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    fn metrics_from_modules(
        ticker: &str,
        end_date: &str,
        period: Period,
        modules: &QuoteSummaryModules,
    ) -> FinancialMetrics {
        let financial = &modules.financial_data;
        let stats = &modules.key_stats;
        let detail = &modules.summary_detail;

        FinancialMetrics {
            ticker: ticker.to_string(),
            report_period: end_date.to_string(),
            period,
            revenue: RawValue::raw(&financial.total_revenue),
            gross_profit: RawValue::raw(&financial.gross_profits),
            operating_income: RawValue::raw(&financial.operating_income),
            net_income: RawValue::raw(&financial.net_income),
            ebitda: RawValue::raw(&financial.ebitda),
            // Yahoo only reports a trailing EPS figure
            eps_basic: RawValue::raw(&stats.trailing_eps),
            eps_diluted: RawValue::raw(&stats.trailing_eps),
            profit_margin: RawValue::raw(&financial.profit_margins),
            operating_margin: RawValue::raw(&financial.operating_margins),
            return_on_equity: RawValue::raw(&financial.return_on_equity),
            return_on_assets: RawValue::raw(&financial.return_on_assets),
            market_cap: RawValue::raw(&financial.market_cap),
            pe_ratio: RawValue::raw(&detail.trailing_pe),
            price_to_book: RawValue::raw(&stats.price_to_book),
            book_value_per_share: RawValue::raw(&stats.book_value),
            dividend_yield: RawValue::raw(&detail.dividend_yield),
            total_debt: RawValue::raw(&financial.total_debt),
            debt_to_equity: RawValue::raw(&financial.debt_to_equity),
            current_ratio: RawValue::raw(&financial.current_ratio),
            quick_ratio: RawValue::raw(&financial.quick_ratio),
            shares_outstanding: RawValue::raw(&stats.shares_outstanding),
            operating_cash_flow: RawValue::raw(&financial.operating_cashflow),
            free_cash_flow: RawValue::raw(&financial.free_cashflow),
            // Not exposed through these quoteSummary modules
            total_assets: None,
            total_liabilities: None,
        }
    }

    fn trade_from_transaction(ticker: &str, tx: &RawTransaction) -> Option<InsiderTrade> {
        let date = tx.start_date.as_ref().and_then(|d| d.fmt.clone())?;

        let shares = RawValue::raw(&tx.shares);
        let value = RawValue::raw(&tx.value);
        let share_price = match (value, shares) {
            (Some(v), Some(s)) if s != 0.0 => Some(v / s),
            _ => None,
        };
        let sec_form = tx
            .filer_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .and_then(|u| u.rsplit('/').next())
            .map(|s| s.to_string());

        Some(InsiderTrade {
            ticker: ticker.to_string(),
            // Yahoo reports no separate filing date
            filing_date: date.clone(),
            transaction_date: Some(date),
            insider_name: tx.filer_name.clone(),
            insider_title: tx.filer_relation.clone(),
            transaction_type: tx.transaction_description.clone(),
            shares,
            share_price,
            value,
            shares_owned_after: None,
            sec_form,
        })
    }

    /// Merge the three statement histories into one map keyed by statement
    /// end date, so a line item can be found regardless of which statement
    /// it lives on.
    fn statements_by_date(
        modules: &QuoteSummaryModules,
    ) -> BTreeMap<String, serde_json::Map<String, serde_json::Value>> {
        let mut merged: BTreeMap<String, serde_json::Map<String, serde_json::Value>> =
            BTreeMap::new();

        let all = modules
            .income_statements
            .statements
            .iter()
            .chain(modules.balance_sheets.statements.iter())
            .chain(modules.cashflow_statements.statements.iter());

        for statement in all {
            let date = statement
                .get("endDate")
                .and_then(|v| v.get("fmt"))
                .and_then(|v| v.as_str());
            if let Some(date) = date {
                merged
                    .entry(date.to_string())
                    .or_default()
                    .extend(statement.clone());
            }
        }
        merged
    }
}

#[async_trait]
impl DataProvider for YahooFinanceProvider {
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

        let period1 = date_to_timestamp(ticker, start_date)?;
        let period2 = date_to_timestamp(ticker, end_date)?;
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.chart_base_url, ticker, period1, period2
        );
        let response: ChartResponse = self.get_json(ticker, &url).await?;

        let result = response.chart.result.into_iter().next().unwrap_or_default();
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .unwrap_or_default();

        let prices: Vec<Price> = result
            .timestamp
            .iter()
            .enumerate()
            .map(|(i, &secs)| Price {
                ticker: ticker.to_string(),
                open: ChartQuote::at(&quote.open, i),
                high: ChartQuote::at(&quote.high, i),
                low: ChartQuote::at(&quote.low, i),
                close: ChartQuote::at(&quote.close, i),
                volume: ChartQuote::at(&quote.volume, i),
                time: timestamp_to_iso(secs),
                time_milliseconds: secs * 1000,
            })
            .collect();
        debug!("fetched {} price bars for {}", prices.len(), ticker);

        if prices.is_empty() {
            return Ok(prices);
        }
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

        let modules = self
            .fetch_quote_summary(ticker, "financialData,defaultKeyStatistics,summaryDetail")
            .await?;
        let metrics = Self::metrics_from_modules(ticker, end_date, period, &modules);
        debug!("fetched metrics snapshot for {}", ticker);

        self.cache
            .set_financial_metrics(ticker, vec![metrics.clone()]);
        Ok(vec![metrics])
    }

    async fn search_line_items(
        &self,
        ticker: &str,
        line_items: &[String],
        end_date: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<LineItem>, FetchError> {
        // No dedicated line-item endpoint; the statement histories are
        // fetched whole and the requested names matched against their keys.
        let modules = self
            .fetch_quote_summary(
                ticker,
                "incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory",
            )
            .await?;

        let mut results = Vec::new();
        for (date, statement) in Self::statements_by_date(&modules) {
            if date.as_str() > end_date {
                continue;
            }
            for requested in line_items {
                let value = statement
                    .iter()
                    .find(|(key, _)| line_item_key_matches(key, requested))
                    .and_then(|(_, v)| statement_value(v));
                if let Some(value) = value {
                    results.push(LineItem {
                        ticker: ticker.to_string(),
                        line_item: requested.clone(),
                        value,
                        report_period: date.clone(),
                        period,
                    });
                }
            }
        }
        debug!("matched {} line items for {}", results.len(), ticker);

        let sorted = sort_newest_first(results, |i| i.report_period.clone());
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

        let modules = self.fetch_quote_summary(ticker, "insiderTransactions").await?;

        let trades: Vec<InsiderTrade> = modules
            .insider_transactions
            .transactions
            .iter()
            .filter_map(|tx| Self::trade_from_transaction(ticker, tx))
            .filter(|t| {
                let date = t.effective_date();
                start_date.map_or(true, |s| date >= s) && date <= end_date
            })
            .collect();
        debug!("fetched {} insider trades for {}", trades.len(), ticker);

        if trades.is_empty() {
            return Ok(trades);
        }
        self.cache.set_insider_trades(ticker, trades.clone());
        let sorted = sort_newest_first(trades, |t| t.effective_date().to_string());
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

        let url = format!("{}/v2/finance/news?symbol={}", self.summary_base_url, ticker);
        let response: NewsResponse = self.get_json(ticker, &url).await?;

        let news: Vec<CompanyNews> = response
            .items
            .result
            .into_iter()
            .filter_map(|item| {
                let secs = item.published_at?;
                let date = timestamp_to_iso(secs);
                Some(CompanyNews {
                    ticker: ticker.to_string(),
                    date,
                    title: item.title.unwrap_or_default(),
                    summary: item.summary.unwrap_or_default(),
                    url: item.link.unwrap_or_default(),
                    source: item.publisher.unwrap_or_default(),
                    // Yahoo provides no sentiment analysis
                    sentiment: None,
                })
            })
            .filter(|n| {
                let day = &n.date[..n.date.len().min(10)];
                start_date.map_or(true, |s| day >= s) && day <= end_date
            })
            .collect();
        debug!("fetched {} news items for {}", news.len(), ticker);

        if news.is_empty() {
            return Ok(news);
        }
        self.cache.set_company_news(ticker, news.clone());
        let sorted = sort_newest_first(news, |n| n.date.clone());
        Ok(truncate(sorted, limit))
    }
}
