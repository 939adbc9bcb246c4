use serde::{Deserialize, Serialize};

/// A news item about a company.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyNews {
    /// Ticker symbol the item is about
    pub ticker: String,

    /// Publication date (ISO timestamp or `YYYY-MM-DD`)
    pub date: String,

    /// Headline
    pub title: String,

    /// Short summary, empty when the source provides none
    #[serde(default)]
    pub summary: String,

    /// Link to the article
    #[serde(default)]
    pub url: String,

    /// Publisher name
    #[serde(default)]
    pub source: String,

    /// Sentiment label when the source provides one
    #[serde(default)]
    pub sentiment: Option<String>,
}
