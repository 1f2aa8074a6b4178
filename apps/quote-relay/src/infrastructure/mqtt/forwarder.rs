//! MQTT Forwarder
//!
//! Owns the bus connection. Drains the quote channel onto the publish
//! topic and turns `kill` commands from the command topic into a
//! cancellation, which this loop and the poll scheduler both observe.
//!
//! The event loop, the quote channel, and the shutdown token are raced
//! in a single `tokio::select!`; quote publishing therefore never blocks
//! on command processing and vice versa.

use std::time::Duration;

use rumqttc::{AsyncClient, ConnectionError, Event, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{Command, WirePayload};
use crate::infrastructure::backoff::{Backoff, BackoffConfig};

const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Outstanding-request capacity of the client's internal channel.
const CLIENT_CHANNEL_CAPACITY: usize = 64;

/// How long the event loop may keep flushing after a disconnect request.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Errors that end the forwarder abnormally.
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    /// The initial connection to the broker could not be established.
    #[error("unable to connect to MQTT broker: {0}")]
    Connect(#[source] ConnectionError),

    /// The connection dropped and the reconnect budget ran out.
    #[error("MQTT reconnect budget exhausted: {0}")]
    ReconnectExhausted(#[source] ConnectionError),

    /// A request could not be handed to the client.
    #[error("MQTT client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}

/// Validated connection parameters, produced by the builder.
#[derive(Debug, Clone)]
pub(super) struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub credentials: Option<(String, String)>,
}

/// Bridge between the quote channel and the bus.
///
/// Generic over the payload so the publish path never depends on the
/// concrete quote type. Construct through [`super::ForwarderBuilder`].
#[derive(Debug)]
pub struct Forwarder<P> {
    pub(super) connection: ConnectionSettings,
    pub(super) publish_topic: String,
    pub(super) command_topic: String,
    pub(super) qos: QoS,
    pub(super) quotes: mpsc::Receiver<P>,
    pub(super) cancel: CancellationToken,
    pub(super) reconnect: BackoffConfig,
}

impl<P: WirePayload + Send + 'static> Forwarder<P> {
    /// Run until the shutdown signal fires.
    ///
    /// A connection failure before the first CONNACK is fatal; after
    /// that, transport drops are retried with the configured backoff
    /// while the broker-side session resumes on reconnect.
    pub async fn run(self) -> Result<(), ForwarderError> {
        let Self {
            connection,
            publish_topic,
            command_topic,
            qos,
            mut quotes,
            cancel,
            reconnect,
        } = self;

        let mut options = MqttOptions::new(
            connection.client_id.clone(),
            connection.host.clone(),
            connection.port,
        );
        options.set_keep_alive(KEEP_ALIVE);
        if let Some((username, password)) = connection.credentials.clone() {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, CLIENT_CHANNEL_CAPACITY);

        let mut connected = false;
        let mut backoff = Backoff::new(reconnect);
        let mut quotes_open = true;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("shutdown signal received, disconnecting from broker");
                    break;
                }

                event = eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        connected = true;
                        backoff.reset();
                        tracing::info!(
                            host = %connection.host,
                            port = connection.port,
                            code = ?ack.code,
                            "connected to MQTT broker"
                        );
                        client.subscribe(command_topic.clone(), qos).await?;
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handle_inbound(&command_topic, &cancel, &publish.topic, &publish.payload);
                    }
                    Ok(_) => {}
                    Err(e) if !connected => {
                        tracing::error!(error = %e, "initial MQTT connect failed");
                        return Err(ForwarderError::Connect(e));
                    }
                    Err(e) => match backoff.next_delay() {
                        Some(delay) => {
                            tracing::warn!(
                                error = %e,
                                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                                "MQTT connection lost, reconnecting"
                            );
                            tokio::select! {
                                () = cancel.cancelled() => {
                                    tracing::info!("shutdown during reconnect delay");
                                    break;
                                }
                                () = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => return Err(ForwarderError::ReconnectExhausted(e)),
                    },
                },

                quote = quotes.recv(), if quotes_open => match quote {
                    Some(quote) => match quote.encode() {
                        Ok(payload) => {
                            client.publish(publish_topic.clone(), qos, false, payload).await?;
                            tracing::debug!(topic = %publish_topic, "quote published");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "unable to encode quote, dropping it");
                        }
                    },
                    None => {
                        // Producer is gone; keep serving the command topic
                        // so the kill switch still reaches us.
                        tracing::info!("quote channel closed");
                        quotes_open = false;
                    }
                },
            }
        }

        // Graceful disconnect: the broker sees a clean DISCONNECT rather
        // than a dropped socket, and publishes already handed to the
        // client get flushed on the way out.
        let _ = client.disconnect().await;
        drain_until_disconnect(&mut eventloop).await;
        Ok(())
    }
}

/// Dispatch one inbound message: commands come from the command topic,
/// everything else is noise the broker routed our way.
fn handle_inbound(command_topic: &str, cancel: &CancellationToken, topic: &str, payload: &[u8]) {
    if topic != command_topic {
        tracing::debug!(topic, "ignoring message on non-command topic");
        return;
    }

    let command: Command = match serde_json::from_slice(payload) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!(error = %e, "unable to decode command, ignoring");
            return;
        }
    };

    tracing::info!(command = %command.command, "command received");
    if command.is_kill() {
        cancel.cancel();
    }
}

/// Give the event loop a moment to put the DISCONNECT on the wire so the
/// broker sees a clean shutdown instead of a dropped socket.
async fn drain_until_disconnect(eventloop: &mut rumqttc::EventLoop) {
    let drain = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(DISCONNECT_GRACE, drain).await.is_err() {
        tracing::debug!("disconnect drain timed out");
    }
}
