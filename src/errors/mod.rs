//! Error types for data fetching operations.

use thiserror::Error;

/// Errors surfaced by the provider manager and the concrete providers.
///
/// Two conditions are deliberately NOT errors: an optional field absent from
/// an otherwise successful upstream response (normalized to `None`), and an
/// empty result set for a ticker/range (returned as an empty `Vec`). The
/// cache is advisory and never produces an error either.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The requested provider key is not registered.
    /// Lists the valid keys so callers can self-correct.
    #[error("Unknown provider: {name}. Available providers: {available:?}")]
    UnknownProvider {
        /// The key that was requested
        name: String,
        /// Every registered provider key
        available: Vec<String>,
    },

    /// The upstream API answered with a non-success status.
    /// Never retried and never cached; propagated to the caller as-is.
    #[error("Error fetching data: {ticker} - {status} - {message}")]
    Upstream {
        /// Ticker the request was for
        ticker: String,
        /// HTTP status code returned by the upstream
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// The upstream answered successfully but the payload could not be
    /// decoded into the expected shape.
    #[error("Malformed response for {ticker}: {message}")]
    MalformedResponse {
        /// Ticker the request was for
        ticker: String,
        /// Decode failure detail
        message: String,
    },

    /// A transport-level failure (connection, DNS, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_display_lists_keys() {
        let error = FetchError::UnknownProvider {
            name: "nonexistent".to_string(),
            available: vec![
                "financial_datasets".to_string(),
                "yahoo_finance".to_string(),
            ],
        };
        let message = format!("{}", error);
        assert!(message.contains("nonexistent"));
        assert!(message.contains("financial_datasets"));
        assert!(message.contains("yahoo_finance"));
    }

    #[test]
    fn test_upstream_display_carries_ticker_and_status() {
        let error = FetchError::Upstream {
            ticker: "AAPL".to_string(),
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Error fetching data: AAPL - 502 - bad gateway"
        );
    }
}
