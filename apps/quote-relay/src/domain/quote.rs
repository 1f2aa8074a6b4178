//! Quote Payload Types
//!
//! The canonical quote record produced by the quote source and published
//! to the bus, plus the wire-encode seam the forwarder publishes through.

use serde::{Deserialize, Serialize};

// =============================================================================
// Wire Encoding
// =============================================================================

/// Error produced when a payload cannot be rendered to wire bytes.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// JSON encoding failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Payloads the forwarder can publish.
///
/// The forwarder never inspects what it publishes; anything that can
/// render itself to wire bytes qualifies.
pub trait WirePayload {
    /// Encode the payload to its wire representation.
    fn encode(&self) -> Result<Vec<u8>, EncodeError>;
}

// =============================================================================
// Quote
// =============================================================================

/// A single market quote as returned by the upstream endpoint.
///
/// Field names follow the upstream JSON shape (camelCase) so a quote
/// round-trips unchanged between fetch and publish. Fields the upstream
/// omits decode to their empty/zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Quote {
    /// Instrument classification (e.g. `EQUITY`, `ETF`).
    pub quote_type: String,
    /// Currency the price is denominated in.
    pub currency: String,
    /// Last regular-market trade price.
    pub regular_market_price: f64,
    /// Ticker symbol.
    pub symbol: String,
}

impl WirePayload for Quote {
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}
