use serde::{Deserialize, Serialize};

/// An insider transaction filing.
///
/// `filing_date` is always present and is the authoritative date when
/// `transaction_date` is absent. Everything else is optional; upstream
/// filings are sparse and absence is a valid permanent state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InsiderTrade {
    /// Ticker symbol
    pub ticker: String,

    /// Date the filing was submitted
    pub filing_date: String,

    /// Date the transaction took place, when reported separately
    #[serde(default)]
    pub transaction_date: Option<String>,

    /// Name of the reporting insider
    #[serde(default)]
    pub insider_name: Option<String>,

    /// Insider's role (e.g. "Chief Executive Officer")
    #[serde(default)]
    pub insider_title: Option<String>,

    /// Transaction description (e.g. "Sale", "Purchase")
    #[serde(default)]
    pub transaction_type: Option<String>,

    /// Number of shares transacted
    #[serde(default)]
    pub shares: Option<f64>,

    /// Price per share
    #[serde(default)]
    pub share_price: Option<f64>,

    /// Total transaction value
    #[serde(default)]
    pub value: Option<f64>,

    /// Shares owned after the transaction
    #[serde(default)]
    pub shares_owned_after: Option<f64>,

    /// SEC form identifier (e.g. "4")
    #[serde(default)]
    pub sec_form: Option<String>,
}

impl InsiderTrade {
    /// The date this trade is filtered and sorted by: the transaction date
    /// when reported, else the filing date.
    pub fn effective_date(&self) -> &str {
        self.transaction_date.as_deref().unwrap_or(&self.filing_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let trade = InsiderTrade {
            ticker: "NVDA".to_string(),
            filing_date: "2024-03-04".to_string(),
            transaction_date: Some("2024-03-01".to_string()),
            insider_name: Some("Jane Doe".to_string()),
            insider_title: Some("Director".to_string()),
            transaction_type: Some("Sale".to_string()),
            shares: Some(10_000.0),
            share_price: Some(850.25),
            value: Some(8_502_500.0),
            shares_owned_after: Some(120_000.0),
            sec_form: Some("4".to_string()),
        };

        let json = serde_json::to_string(&trade).unwrap();
        let back: InsiderTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trade);
    }

    #[test]
    fn test_effective_date_prefers_transaction_date() {
        let mut trade = InsiderTrade {
            ticker: "NVDA".to_string(),
            filing_date: "2024-03-04".to_string(),
            transaction_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        assert_eq!(trade.effective_date(), "2024-03-01");

        trade.transaction_date = None;
        assert_eq!(trade.effective_date(), "2024-03-04");
    }
}
