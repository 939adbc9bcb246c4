//! Provider-agnostic financial data fetching with read-through caching.
//!
//! This crate fetches normalized financial records (daily prices,
//! financial metrics, statement line items, insider trades, company news)
//! from interchangeable upstream data sources:
//! - [`DataService`] is the public facade callers use
//! - [`ProviderManager`] maps provider keys to constructors and holds the
//!   single active provider
//! - [`DataProvider`] is the capability contract each backend implements
//! - [`DataCache`] is the shared in-process record cache
//!
//! Every fetch reads through the cache: a non-empty cached subset of the
//! requested range is returned without an upstream call. Results are
//! sorted newest-first and truncated to the requested limit. Dates are
//! `YYYY-MM-DD` strings compared lexically.
//!
//! ```no_run
//! use findata::{DataService, Period};
//!
//! # async fn example() -> Result<(), findata::FetchError> {
//! let service = DataService::new();
//! let prices = service.get_prices("AAPL", "2024-01-01", "2024-06-30").await?;
//! let metrics = service
//!     .get_financial_metrics("AAPL", "2024-06-30", Period::Ttm, 10)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod errors;
pub mod manager;
pub mod models;
pub mod provider;
pub mod service;
pub mod table;

pub use cache::DataCache;
pub use errors::FetchError;
pub use manager::ProviderManager;
pub use models::{CompanyNews, FinancialMetrics, InsiderTrade, LineItem, Period, Price};
pub use provider::{
    DataProvider, FinancialDatasetsProvider, YahooFinanceProvider, DEFAULT_LINE_ITEMS_LIMIT,
    DEFAULT_METRICS_LIMIT, DEFAULT_NEWS_LIMIT, DEFAULT_TRADES_LIMIT,
};
pub use service::DataService;
pub use table::PriceTable;
