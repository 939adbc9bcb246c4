//! Normalized financial data records
//!
//! This module contains the shared vocabulary every provider must emit:
//! - `price` - Daily price bars (Price)
//! - `financial_metrics` - Fundamental metrics per report period (FinancialMetrics)
//! - `line_item` - Individual financial statement line items (LineItem)
//! - `insider_trade` - Insider transaction filings (InsiderTrade)
//! - `company_news` - News items with optional sentiment (CompanyNews)
//! - `period` - Reporting period granularity (Period)
//!
//! All records are immutable once constructed, keyed by ticker plus a date
//! dimension, and serialize losslessly through serde (the cache relies on
//! this round-trip being idempotent). Dates are fixed-width `YYYY-MM-DD`
//! ISO strings throughout, so date comparisons are plain lexical string
//! comparisons.

mod company_news;
mod financial_metrics;
mod insider_trade;
mod line_item;
mod period;
mod price;

pub use company_news::CompanyNews;
pub use financial_metrics::FinancialMetrics;
pub use insider_trade::InsiderTrade;
pub use line_item::LineItem;
pub use period::Period;
pub use price::Price;
