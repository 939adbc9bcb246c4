//! Data provider implementations.
//!
//! Each provider pairs an upstream HTTP API with the shared cache and
//! exposes the same set of operations through the [`DataProvider`] trait.

pub mod financial_datasets;
pub mod traits;
pub mod yahoo_finance;

pub use financial_datasets::FinancialDatasetsProvider;
pub use traits::{
    DataProvider, DEFAULT_LINE_ITEMS_LIMIT, DEFAULT_METRICS_LIMIT, DEFAULT_NEWS_LIMIT,
    DEFAULT_TRADES_LIMIT,
};
pub use yahoo_finance::YahooFinanceProvider;
