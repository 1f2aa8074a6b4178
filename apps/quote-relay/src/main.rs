//! Quote Relay Binary
//!
//! Starts the poller and the MQTT forwarder.
//!
//! # Usage
//!
//! ```bash
//! CONFIG_FILE=config.yaml cargo run -p quote-relay
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG_FILE`: Path to the YAML config file (default: config.yaml)
//! - `RUST_LOG`: Log filter (default: info)
//!
//! # Exit Status
//!
//! Zero on graceful shutdown (kill command or signal); nonzero when the
//! MQTT settings fail validation, the quote source stays unavailable past
//! its retry budget, or the initial broker connection fails.

use std::sync::Arc;

use anyhow::Context;
use quote_relay::infrastructure::telemetry;
use quote_relay::{
    config_path_from_env, load_or_default, Forwarder, ForwarderBuilder, Poller, Quote, YahooSource,
};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the quote hand-off channel between poller and forwarder.
const QUOTE_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config_path = config_path_from_env();
    let config = load_or_default(&config_path);
    tracing::info!(
        path = %config_path,
        symbols = config.symbols.len(),
        period = %config.requestperiod,
        host = %config.mqtt.host,
        port = config.mqtt.port,
        "configuration loaded"
    );

    let (quote_tx, quote_rx) = mpsc::channel::<Quote>(QUOTE_CHANNEL_CAPACITY);
    let shutdown = CancellationToken::new();

    // The builder is the only integrity gate before concurrency starts;
    // an incomplete configuration must fail here, not mid-flight.
    let forwarder: Forwarder<Quote> = ForwarderBuilder::from_settings(&config.mqtt)
        .quotes(quote_rx)
        .shutdown(shutdown.clone())
        .build()
        .context("invalid MQTT settings")?;

    let source = YahooSource::new().context("unable to build quote source")?;
    let poller = Poller::new(
        Arc::new(source),
        config.symbols.clone(),
        config.request_period(),
        quote_tx,
        shutdown.clone(),
    );

    let poller_shutdown = shutdown.clone();
    let poller_task = tokio::spawn(async move {
        let result = poller.run().await;
        if result.is_err() {
            poller_shutdown.cancel();
        }
        result
    });

    let forwarder_shutdown = shutdown.clone();
    let forwarder_task = tokio::spawn(async move {
        let result = forwarder.run().await;
        if result.is_err() {
            forwarder_shutdown.cancel();
        }
        result
    });

    tracing::info!("quote relay running");

    tokio::select! {
        () = await_signal() => {
            tracing::info!("signal received, shutting down");
            shutdown.cancel();
        }
        () = shutdown.cancelled() => {}
    }

    let poller_result = poller_task
        .await
        .context("poller task panicked")?;
    let forwarder_result = forwarder_task
        .await
        .context("forwarder task panicked")?;

    poller_result.context("quote source failed")?;
    forwarder_result.context("MQTT forwarder failed")?;

    tracing::info!("quote relay stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
#[allow(clippy::expect_used)]
async fn await_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
