#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)
)]

//! Quote Relay - Yahoo Finance to MQTT bridge
//!
//! Polls the Yahoo Finance quote API for a configured set of ticker
//! symbols on a fixed period and republishes every quote to an MQTT
//! topic. The command topic doubles as a remote kill switch: a `kill`
//! command shuts the whole relay down gracefully.
//!
//! # Data Flow
//!
//! ```text
//! Yahoo v7 API ──► Poller ──► quote channel ──► Forwarder ──► stock/quote
//!                    ▲                              │
//!                    └── CancellationToken ◄────────┘◄── stock/command ("kill")
//! ```
//!
//! The cancellation token is the only shutdown primitive: the kill
//! command, SIGINT/SIGTERM, and fatal task errors all raise it, and
//! every loop observes it independently.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - payload and control types.
pub mod domain;

/// Infrastructure layer - adapters and task loops.
pub mod infrastructure;

pub use domain::{Command, EncodeError, Quote, WirePayload};
pub use infrastructure::backoff::{Backoff, BackoffConfig};
pub use infrastructure::config::{
    config_path_from_env, load_or_default, ConfigError, CredentialSettings, MqttSettings,
    RelayConfig,
};
pub use infrastructure::mqtt::{BuilderError, Forwarder, ForwarderBuilder, ForwarderError};
pub use infrastructure::poller::{Poller, PollerError};
pub use infrastructure::source::{FetchError, QuoteSource, YahooSource};
