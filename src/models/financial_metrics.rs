use serde::{Deserialize, Serialize};

use super::Period;

/// Fundamental metrics for one ticker and report period.
///
/// Every numeric field is optional: an upstream source that does not report
/// a figure simply leaves it absent, permanently. Callers must treat `None`
/// as "not reported", never as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    /// Ticker symbol
    pub ticker: String,

    /// Fiscal period the record describes (`YYYY-MM-DD`)
    pub report_period: String,

    /// Reporting granularity (ttm / annual / quarterly)
    #[serde(default)]
    pub period: Period,

    // Income statement
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub gross_profit: Option<f64>,
    #[serde(default)]
    pub operating_income: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,
    #[serde(default)]
    pub ebitda: Option<f64>,
    #[serde(default)]
    pub eps_basic: Option<f64>,
    #[serde(default)]
    pub eps_diluted: Option<f64>,

    // Margins and returns
    #[serde(default)]
    pub profit_margin: Option<f64>,
    #[serde(default)]
    pub operating_margin: Option<f64>,
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    #[serde(default)]
    pub return_on_assets: Option<f64>,

    // Valuation
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub price_to_book: Option<f64>,
    #[serde(default)]
    pub book_value_per_share: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,

    // Balance sheet
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub total_liabilities: Option<f64>,
    #[serde(default)]
    pub total_debt: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub current_ratio: Option<f64>,
    #[serde(default)]
    pub quick_ratio: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,

    // Cash flow
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
}
