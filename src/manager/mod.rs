//! Provider registry and active-provider selection.
//!
//! The manager owns the shared [`DataCache`] and a registry mapping
//! provider keys to constructors. Exactly one provider is active at a
//! time; switching providers re-instantiates from the registry and keeps
//! the cache as-is, so records fetched through the previous provider stay
//! visible to the new one.
//!
//! The manager is an explicit context object rather than process-global
//! state. Construct one per process and pass it to callers; `reset`
//! restores the unresolved-default state for test isolation.

use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::DataCache;
use crate::errors::FetchError;
use crate::provider::{financial_datasets, yahoo_finance};
use crate::provider::{DataProvider, FinancialDatasetsProvider, YahooFinanceProvider};

/// Registry key of the provider used when no credential is configured.
pub const FALLBACK_PROVIDER: &str = "financial_datasets";

type ProviderFactory = Box<dyn Fn(Arc<DataCache>) -> Arc<dyn DataProvider> + Send + Sync>;

/// Registry of available providers plus the single active instance.
pub struct ProviderManager {
    cache: Arc<DataCache>,
    registry: BTreeMap<String, ProviderFactory>,
    active: Option<(String, Arc<dyn DataProvider>)>,
}

impl ProviderManager {
    /// A manager with the built-in providers registered and no active
    /// provider resolved yet.
    pub fn new() -> Self {
        let mut manager = Self {
            cache: Arc::new(DataCache::new()),
            registry: BTreeMap::new(),
            active: None,
        };
        manager.register("financial_datasets", |cache| {
            Arc::new(FinancialDatasetsProvider::new(cache))
        });
        manager.register("yahoo_finance", |cache| {
            Arc::new(YahooFinanceProvider::new(cache))
        });
        manager
    }

    /// Register (or replace) a provider constructor under `key`.
    pub fn register<F>(&mut self, key: &str, factory: F)
    where
        F: Fn(Arc<DataCache>) -> Arc<dyn DataProvider> + Send + Sync + 'static,
    {
        self.registry.insert(key.to_string(), Box::new(factory));
    }

    /// The active provider, resolving and instantiating the default on
    /// first use.
    pub fn get_provider(&mut self) -> Result<Arc<dyn DataProvider>, FetchError> {
        if self.active.is_none() {
            let default = resolve_default_key();
            debug!("no active provider, resolving default: {}", default);
            self.set_provider(default)?;
        }
        // set_provider above guarantees an active entry on the Ok path
        match &self.active {
            Some((_, provider)) => Ok(provider.clone()),
            None => Err(self.unknown_provider(resolve_default_key())),
        }
    }

    /// Switch the active provider, re-instantiating from the registry.
    pub fn set_provider(&mut self, key: &str) -> Result<(), FetchError> {
        let factory = self
            .registry
            .get(key)
            .ok_or_else(|| self.unknown_provider(key))?;

        let provider = factory(self.cache.clone());
        info!("active data provider set to {}", key);
        self.active = Some((key.to_string(), provider));
        Ok(())
    }

    /// Every registered key mapped to its provider's display name.
    pub fn available_providers(&self) -> BTreeMap<String, String> {
        self.registry
            .iter()
            .map(|(key, factory)| (key.clone(), factory(self.cache.clone()).name().to_string()))
            .collect()
    }

    /// Registry key of the active provider, if one has been resolved.
    pub fn current_key(&self) -> Option<&str> {
        self.active.as_ref().map(|(key, _)| key.as_str())
    }

    /// Drop the active provider so the next `get_provider` re-resolves the
    /// default. The cache is left intact.
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// The cache shared by every provider this manager constructs.
    pub fn cache(&self) -> Arc<DataCache> {
        self.cache.clone()
    }

    fn unknown_provider(&self, key: &str) -> FetchError {
        FetchError::UnknownProvider {
            name: key.to_string(),
            available: self.registry.keys().cloned().collect(),
        }
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Default provider key for the current environment: first configured
/// credential wins, in a fixed probe order.
fn resolve_default_key() -> &'static str {
    default_provider_key(
        env_is_set(financial_datasets::API_KEY_ENV),
        env_is_set(yahoo_finance::API_KEY_ENV),
    )
}

fn env_is_set(name: &str) -> bool {
    std::env::var(name).map_or(false, |v| !v.is_empty())
}

fn default_provider_key(has_financial_datasets_key: bool, has_yahoo_key: bool) -> &'static str {
    if has_financial_datasets_key {
        "financial_datasets"
    } else if has_yahoo_key {
        "yahoo_finance"
    } else {
        FALLBACK_PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::models::{CompanyNews, FinancialMetrics, InsiderTrade, LineItem, Period, Price};
    use rust_decimal_macros::dec;

    struct MockProvider;

    #[async_trait]
    impl DataProvider for MockProvider {
        fn id(&self) -> &'static str {
            "mock"
        }

        fn name(&self) -> &'static str {
            "Mock Provider"
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
            Ok(Vec::new())
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

    #[test]
    fn test_builtin_providers_registered() {
        let manager = ProviderManager::new();
        let providers = manager.available_providers();
        assert_eq!(
            providers.get("financial_datasets").map(String::as_str),
            Some("Financial Datasets API")
        );
        assert_eq!(
            providers.get("yahoo_finance").map(String::as_str),
            Some("Yahoo Finance API")
        );
    }

    #[test]
    fn test_set_unknown_provider_lists_registered_keys() {
        let mut manager = ProviderManager::new();
        let error = manager.set_provider("nonexistent").unwrap_err();
        match error {
            FetchError::UnknownProvider { name, available } => {
                assert_eq!(name, "nonexistent");
                assert_eq!(available, vec!["financial_datasets", "yahoo_finance"]);
            }
            other => panic!("unexpected error: {}", other),
        }
        // A failed switch leaves no provider active.
        assert_eq!(manager.current_key(), None);
    }

    #[test]
    fn test_set_provider_switches_active() {
        let mut manager = ProviderManager::new();
        manager.set_provider("yahoo_finance").unwrap();
        assert_eq!(manager.current_key(), Some("yahoo_finance"));

        manager.set_provider("financial_datasets").unwrap();
        assert_eq!(manager.current_key(), Some("financial_datasets"));
    }

    #[test]
    fn test_default_provider_key_probe_order() {
        assert_eq!(default_provider_key(true, true), "financial_datasets");
        assert_eq!(default_provider_key(true, false), "financial_datasets");
        assert_eq!(default_provider_key(false, true), "yahoo_finance");
        // No credentials at all still resolves deterministically.
        assert_eq!(default_provider_key(false, false), FALLBACK_PROVIDER);
    }

    #[test]
    fn test_registered_custom_provider_is_selectable() {
        let mut manager = ProviderManager::new();
        manager.register("mock", |_cache| Arc::new(MockProvider));
        manager.set_provider("mock").unwrap();

        let provider = manager.get_provider().unwrap();
        assert_eq!(provider.id(), "mock");
        assert_eq!(
            manager.available_providers().get("mock").map(String::as_str),
            Some("Mock Provider")
        );
    }

    #[test]
    fn test_cache_survives_provider_switch() {
        let mut manager = ProviderManager::new();
        manager.set_provider("financial_datasets").unwrap();
        manager.cache().set_prices(
            "AAPL",
            vec![Price {
                ticker: "AAPL".to_string(),
                open: None,
                high: None,
                low: None,
                close: Some(dec!(185.64)),
                volume: None,
                time: "2024-01-05".to_string(),
                time_milliseconds: 1704412800000,
            }],
        );

        manager.set_provider("yahoo_finance").unwrap();
        // Records fetched through the previous provider remain visible.
        assert_eq!(manager.cache().get_prices("AAPL").unwrap().len(), 1);
    }

    #[test]
    fn test_reset_clears_active_but_keeps_cache() {
        let mut manager = ProviderManager::new();
        manager.set_provider("yahoo_finance").unwrap();
        manager.cache().set_company_news(
            "TSLA",
            vec![CompanyNews {
                ticker: "TSLA".to_string(),
                date: "2024-02-12".to_string(),
                title: "headline".to_string(),
                ..Default::default()
            }],
        );

        manager.reset();
        assert_eq!(manager.current_key(), None);
        assert!(manager.cache().get_company_news("TSLA").is_some());
    }

    #[test]
    fn test_get_provider_resolves_lazily() {
        let mut manager = ProviderManager::new();
        assert_eq!(manager.current_key(), None);

        let provider = manager.get_provider().unwrap();
        // The resolved default is one of the registered builtins.
        assert!(manager.current_key().is_some());
        assert_eq!(provider.id(), manager.current_key().unwrap());
    }
}
