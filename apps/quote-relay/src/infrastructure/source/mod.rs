//! Quote Source
//!
//! Fetches current quotes for a batch of symbols from the Yahoo Finance
//! v7 quote API. One request per batch, all-or-nothing: any transport,
//! status, or decode failure fails the whole call.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::Quote;

/// Production quote endpoint.
pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

const QUOTE_PATH: &str = "/v7/finance/quote";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network-level failure (DNS, connect, timeout) or client setup.
    #[error("quote request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("quote endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The response body was not the expected envelope.
    #[error("quote response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of quote batches.
///
/// The poll scheduler only sees this trait; tests substitute a stub.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch current quotes for `symbols`, preserving response order.
    async fn fetch(&self, symbols: &[String]) -> Result<Vec<Quote>, FetchError>;
}

// Upstream envelope: { "quoteResponse": { "result": [ ... ] } }

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Vec<Quote>,
}

/// Yahoo Finance quote source.
#[derive(Debug, Clone)]
pub struct YahooSource {
    client: reqwest::Client,
    base_url: String,
}

impl YahooSource {
    /// Create a source against the production endpoint.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a source against a custom endpoint.
    ///
    /// Tests point this at a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl QuoteSource for YahooSource {
    async fn fetch(&self, symbols: &[String]) -> Result<Vec<Quote>, FetchError> {
        let url = format!("{}{QUOTE_PATH}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbols.join(","))])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let envelope: QuoteEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.quote_response.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_in_response_order() {
        let body = r#"{
            "quoteResponse": {
                "result": [
                    {"quoteType":"ETF","currency":"EUR","regularMarketPrice":104.62,"symbol":"VGWL.DE"},
                    {"quoteType":"EQUITY","currency":"USD","regularMarketPrice":27.3,"symbol":"PFE"}
                ]
            }
        }"#;
        let envelope: QuoteEnvelope = serde_json::from_str(body).unwrap();
        let quotes = envelope.quote_response.result;
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].symbol, "VGWL.DE");
        assert_eq!(quotes[1].symbol, "PFE");
    }

    #[test]
    fn envelope_without_result_list_is_rejected() {
        assert!(serde_json::from_str::<QuoteEnvelope>(r#"{"quoteResponse":{}}"#).is_err());
        assert!(serde_json::from_str::<QuoteEnvelope>(r#"{"unexpected":true}"#).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let source = YahooSource::with_base_url("http://localhost:9999/").unwrap();
        assert_eq!(source.base_url, "http://localhost:9999");
    }
}
