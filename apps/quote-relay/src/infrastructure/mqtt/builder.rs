//! Forwarder Builder
//!
//! Collects connection parameters, topics, and channel handles, and
//! checks completeness before a forwarder exists at all. Validation is
//! synchronous and touches no network; it is the single integrity gate
//! before the concurrent tasks start.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::forwarder::{ConnectionSettings, Forwarder};
use super::qos_level;
use crate::domain::WirePayload;
use crate::infrastructure::backoff::BackoffConfig;
use crate::infrastructure::config::MqttSettings;

/// Standard MQTT port, used by [`ForwarderBuilder::default_port`].
pub const DEFAULT_MQTT_PORT: u16 = 1883;

const DEFAULT_CLIENT_ID: &str = "quote-relay";

/// Errors from [`ForwarderBuilder::build`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    /// A required setting is absent or empty.
    #[error("builder not ready, missing settings: {0}")]
    Incomplete(&'static str),

    /// A credential pair was given with one half missing or empty.
    #[error("credentials require both username and password")]
    PartialCredentials,
}

/// Builder for [`Forwarder`].
pub struct ForwarderBuilder<P> {
    host: Option<String>,
    port: Option<u16>,
    client_id: Option<String>,
    credentials: Option<(String, String)>,
    publish_topic: Option<String>,
    command_topic: Option<String>,
    quotes: Option<mpsc::Receiver<P>>,
    cancel: Option<CancellationToken>,
    qos: u8,
    reconnect: BackoffConfig,
}

impl<P> Default for ForwarderBuilder<P> {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            client_id: None,
            credentials: None,
            publish_topic: None,
            command_topic: None,
            quotes: None,
            cancel: None,
            qos: 1,
            reconnect: BackoffConfig::unlimited(),
        }
    }
}

impl<P: WirePayload> ForwarderBuilder<P> {
    /// Start an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate connection parameters and topics from config settings.
    #[must_use]
    pub fn from_settings(settings: &MqttSettings) -> Self {
        let mut builder = Self::new()
            .host(settings.host.clone())
            .port(settings.port)
            .publish_topic(settings.publishtopic.clone())
            .command_topic(settings.commandtopic.clone())
            .qos(settings.qos);
        if let Some(client_id) = &settings.clientid {
            builder = builder.client_id(client_id.clone());
        }
        if let Some(credentials) = &settings.credentials {
            builder = builder.credentials(credentials.username.clone(), credentials.password.clone());
        }
        builder
    }

    /// Broker hostname or address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Broker port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Use the standard MQTT port.
    #[must_use]
    pub fn default_port(self) -> Self {
        self.port(DEFAULT_MQTT_PORT)
    }

    /// Client identifier presented to the broker.
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Username/password pair for broker authentication.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Topic quotes are published to.
    #[must_use]
    pub fn publish_topic(mut self, topic: impl Into<String>) -> Self {
        self.publish_topic = Some(topic.into());
        self
    }

    /// Topic subscribed for control commands.
    #[must_use]
    pub fn command_topic(mut self, topic: impl Into<String>) -> Self {
        self.command_topic = Some(topic.into());
        self
    }

    /// Receiving end of the quote channel.
    #[must_use]
    pub fn quotes(mut self, quotes: mpsc::Receiver<P>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    /// Shutdown token raised by the kill switch and observed by every task.
    #[must_use]
    pub fn shutdown(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Delivery guarantee (0-2) for publishes and the command subscription.
    #[must_use]
    pub fn qos(mut self, qos: u8) -> Self {
        self.qos = qos;
        self
    }

    /// Backoff policy for transport-level reconnects.
    #[must_use]
    pub fn reconnect(mut self, reconnect: BackoffConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Validate completeness and produce the forwarder.
    pub fn build(self) -> Result<Forwarder<P>, BuilderError> {
        let host = match self.host {
            Some(host) if !host.is_empty() => host,
            _ => return Err(BuilderError::Incomplete("host")),
        };
        let port = match self.port {
            Some(port) if port != 0 => port,
            _ => return Err(BuilderError::Incomplete("port")),
        };
        let publish_topic = match self.publish_topic {
            Some(topic) if !topic.is_empty() => topic,
            _ => return Err(BuilderError::Incomplete("publish topic")),
        };
        let command_topic = match self.command_topic {
            Some(topic) if !topic.is_empty() => topic,
            _ => return Err(BuilderError::Incomplete("command topic")),
        };
        let quotes = self
            .quotes
            .ok_or(BuilderError::Incomplete("quote channel"))?;
        let cancel = self
            .cancel
            .ok_or(BuilderError::Incomplete("shutdown token"))?;

        if let Some((username, password)) = &self.credentials {
            if username.is_empty() || password.is_empty() {
                return Err(BuilderError::PartialCredentials);
            }
        }

        Ok(Forwarder {
            connection: ConnectionSettings {
                host,
                port,
                client_id: self
                    .client_id
                    .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
                credentials: self.credentials,
            },
            publish_topic,
            command_topic,
            qos: qos_level(self.qos),
            quotes,
            cancel,
            reconnect: self.reconnect,
        })
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::QoS;

    use super::*;
    use crate::domain::Quote;
    use crate::infrastructure::config::CredentialSettings;

    fn complete() -> ForwarderBuilder<Quote> {
        let (_tx, rx) = mpsc::channel(1);
        ForwarderBuilder::new()
            .host("broker.local")
            .default_port()
            .publish_topic("stock/quote")
            .command_topic("stock/command")
            .quotes(rx)
            .shutdown(CancellationToken::new())
    }

    #[test]
    fn complete_builder_succeeds() {
        assert!(complete().build().is_ok());
    }

    #[test]
    fn missing_host_fails() {
        let (_tx, rx) = mpsc::channel::<Quote>(1);
        let err = ForwarderBuilder::new()
            .default_port()
            .publish_topic("a")
            .command_topic("b")
            .quotes(rx)
            .shutdown(CancellationToken::new())
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::Incomplete("host"));
    }

    #[test]
    fn empty_host_fails() {
        let err = complete().host("").build().unwrap_err();
        assert_eq!(err, BuilderError::Incomplete("host"));
    }

    #[test]
    fn zero_port_fails() {
        let err = complete().port(0).build().unwrap_err();
        assert_eq!(err, BuilderError::Incomplete("port"));
    }

    #[test]
    fn missing_topics_fail() {
        let (_tx, rx) = mpsc::channel::<Quote>(1);
        let err = ForwarderBuilder::new()
            .host("broker.local")
            .default_port()
            .command_topic("b")
            .quotes(rx)
            .shutdown(CancellationToken::new())
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::Incomplete("publish topic"));
    }

    #[test]
    fn missing_quote_channel_fails() {
        let err = ForwarderBuilder::<Quote>::new()
            .host("broker.local")
            .default_port()
            .publish_topic("a")
            .command_topic("b")
            .shutdown(CancellationToken::new())
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::Incomplete("quote channel"));
    }

    #[test]
    fn missing_shutdown_token_fails() {
        let (_tx, rx) = mpsc::channel::<Quote>(1);
        let err = ForwarderBuilder::new()
            .host("broker.local")
            .default_port()
            .publish_topic("a")
            .command_topic("b")
            .quotes(rx)
            .build()
            .unwrap_err();
        assert_eq!(err, BuilderError::Incomplete("shutdown token"));
    }

    #[test]
    fn partial_credentials_fail() {
        let err = complete().credentials("user", "").build().unwrap_err();
        assert_eq!(err, BuilderError::PartialCredentials);

        let err = complete().credentials("", "pass").build().unwrap_err();
        assert_eq!(err, BuilderError::PartialCredentials);
    }

    #[test]
    fn full_credentials_succeed() {
        assert!(complete().credentials("user", "pass").build().is_ok());
    }

    #[test]
    fn from_settings_carries_everything_over() {
        let settings = MqttSettings {
            host: "broker.local".to_string(),
            port: 8883,
            clientid: Some("relay-1".to_string()),
            credentials: Some(CredentialSettings {
                username: "user".to_string(),
                password: "pass".to_string(),
            }),
            publishtopic: "quotes/out".to_string(),
            commandtopic: "quotes/ctl".to_string(),
            qos: 2,
        };
        let (_tx, rx) = mpsc::channel::<Quote>(1);
        let forwarder = ForwarderBuilder::from_settings(&settings)
            .quotes(rx)
            .shutdown(CancellationToken::new())
            .build()
            .unwrap();
        assert_eq!(forwarder.qos, QoS::ExactlyOnce);
        assert_eq!(forwarder.publish_topic, "quotes/out");
        assert_eq!(forwarder.command_topic, "quotes/ctl");
    }
}
