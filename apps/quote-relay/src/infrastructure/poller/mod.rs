//! Poll Scheduler
//!
//! Repeats fetch → emit → wait until cancelled. The inter-poll wait is a
//! `tokio::select!` against the cancellation token, so shutdown interrupts
//! the delay immediately and the pending sleep is simply dropped with it.
//!
//! Fetch failures are retried with exponential backoff; once the retry
//! budget is spent the poller gives up and returns an error, which the
//! binary treats as fatal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::Quote;
use crate::infrastructure::backoff::{Backoff, BackoffConfig};
use crate::infrastructure::source::{FetchError, QuoteSource};

/// Errors that end the poll scheduler abnormally.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    /// The fetch retry budget was exhausted.
    #[error("quote source unavailable after {attempts} attempts: {source}")]
    SourceExhausted {
        /// Attempts made before giving up.
        attempts: u32,
        /// The last fetch failure.
        #[source]
        source: FetchError,
    },
}

/// Periodic fetch-and-emit task.
pub struct Poller {
    source: Arc<dyn QuoteSource>,
    symbols: Vec<String>,
    period: Duration,
    retry: BackoffConfig,
    quotes: mpsc::Sender<Quote>,
    cancel: CancellationToken,
}

impl Poller {
    /// Create a poller with the default retry budget.
    #[must_use]
    pub fn new(
        source: Arc<dyn QuoteSource>,
        symbols: Vec<String>,
        period: Duration,
        quotes: mpsc::Sender<Quote>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            symbols,
            period,
            retry: BackoffConfig::default(),
            quotes,
            cancel,
        }
    }

    /// Override the fetch retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: BackoffConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Run until cancelled or the retry budget runs out.
    ///
    /// Returns `Ok(())` on cancellation or when the quote channel closes;
    /// both are normal shutdown paths.
    pub async fn run(self) -> Result<(), PollerError> {
        loop {
            let quotes = tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("poller cancelled");
                    return Ok(());
                }
                result = self.fetch_with_retry() => result?,
            };

            tracing::debug!(count = quotes.len(), "fetched quote batch");

            for quote in quotes {
                // send() blocks when the channel is full; that is the
                // backpressure point between poller and forwarder.
                if self.quotes.send(quote).await.is_err() {
                    tracing::info!("quote channel closed, stopping poller");
                    return Ok(());
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("poller cancelled during poll wait");
                    return Ok(());
                }
                () = tokio::time::sleep(self.period) => {}
            }
        }
    }

    async fn fetch_with_retry(&self) -> Result<Vec<Quote>, PollerError> {
        let mut backoff = Backoff::new(self.retry.clone());
        loop {
            let error = match self.source.fetch(&self.symbols).await {
                Ok(quotes) => return Ok(quotes),
                Err(e) => e,
            };

            match backoff.next_delay() {
                Some(delay) => {
                    tracing::warn!(
                        error = %error,
                        attempt = backoff.attempts(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "quote fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(PollerError::SourceExhausted {
                        attempts: backoff.attempts(),
                        source: error,
                    });
                }
            }
        }
    }
}
