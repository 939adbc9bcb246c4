//! Public data-access facade.
//!
//! `DataService` is the entry point callers use to fetch records and to
//! select providers, without touching the manager or the cache directly.
//! Fetch calls resolve the active provider under a short-lived lock, then
//! run the network call outside it, so one slow upstream request does not
//! serialize every other caller.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::FetchError;
use crate::manager::ProviderManager;
use crate::models::{CompanyNews, FinancialMetrics, InsiderTrade, LineItem, Period, Price};
use crate::provider::DataProvider;
use crate::table::PriceTable;

/// Facade over the provider manager and its shared cache.
pub struct DataService {
    manager: Mutex<ProviderManager>,
}

impl DataService {
    /// A service with the built-in providers registered.
    pub fn new() -> Self {
        Self::with_manager(ProviderManager::new())
    }

    /// A service over a pre-configured manager, e.g. one with extra
    /// providers registered.
    pub fn with_manager(manager: ProviderManager) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }

    async fn provider(&self) -> Result<Arc<dyn DataProvider>, FetchError> {
        self.manager.lock().await.get_provider()
    }

    /// Daily price bars for a ticker between two dates, newest first.
    pub async fn get_prices(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Price>, FetchError> {
        self.provider()
            .await?
            .get_prices(ticker, start_date, end_date)
            .await
    }

    /// Financial metric snapshots up to `end_date`, newest first.
    pub async fn get_financial_metrics(
        &self,
        ticker: &str,
        end_date: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<FinancialMetrics>, FetchError> {
        self.provider()
            .await?
            .get_financial_metrics(ticker, end_date, period, limit)
            .await
    }

    /// Values for the named statement line items, newest first.
    pub async fn search_line_items(
        &self,
        ticker: &str,
        line_items: &[String],
        end_date: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<LineItem>, FetchError> {
        self.provider()
            .await?
            .search_line_items(ticker, line_items, end_date, period, limit)
            .await
    }

    /// Insider transaction filings in the date range, newest first.
    pub async fn get_insider_trades(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
        limit: usize,
    ) -> Result<Vec<InsiderTrade>, FetchError> {
        self.provider()
            .await?
            .get_insider_trades(ticker, end_date, start_date, limit)
            .await
    }

    /// News items in the date range, newest first.
    pub async fn get_company_news(
        &self,
        ticker: &str,
        end_date: &str,
        start_date: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CompanyNews>, FetchError> {
        self.provider()
            .await?
            .get_company_news(ticker, end_date, start_date, limit)
            .await
    }

    /// Market capitalization as of `end_date`, absent when no metrics
    /// snapshot carries one.
    pub async fn get_market_cap(
        &self,
        ticker: &str,
        end_date: &str,
    ) -> Result<Option<f64>, FetchError> {
        self.provider().await?.get_market_cap(ticker, end_date).await
    }

    /// Price bars as a time-indexed table, ascending.
    pub async fn get_price_table(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<PriceTable, FetchError> {
        let prices = self.get_prices(ticker, start_date, end_date).await?;
        Ok(PriceTable::from_prices(prices))
    }

    /// Every registered provider key mapped to its display name.
    pub async fn get_available_providers(&self) -> BTreeMap<String, String> {
        self.manager.lock().await.available_providers()
    }

    /// Key of the active provider, resolving the default if none is
    /// active; `"unknown"` when resolution fails.
    pub async fn get_current_provider(&self) -> String {
        let mut manager = self.manager.lock().await;
        if manager.get_provider().is_err() {
            return "unknown".to_string();
        }
        manager
            .current_key()
            .unwrap_or("unknown")
            .to_string()
    }

    /// Switch the active provider by registry key.
    pub async fn set_provider(&self, name: &str) -> Result<(), FetchError> {
        self.manager.lock().await.set_provider(name)
    }
}

impl Default for DataService {
    fn default() -> Self {
        Self::new()
    }
}
