use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting period granularity for fundamentals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Trailing twelve months.
    #[default]
    Ttm,
    /// Full fiscal year.
    Annual,
    /// Fiscal quarter.
    Quarterly,
}

impl Period {
    /// The lowercase wire form used by upstream APIs ("ttm", "annual", "quarterly").
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Ttm => "ttm",
            Period::Annual => "annual",
            Period::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
