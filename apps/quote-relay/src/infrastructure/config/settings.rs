//! Relay Configuration Settings
//!
//! Settings types for the relay, deserialized from the YAML config file.
//! Every field has a default so a partial file still produces a usable
//! configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Poll period used when `requestperiod` is absent or malformed.
pub const DEFAULT_REQUEST_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Topic quotes are published to.
pub const DEFAULT_PUBLISH_TOPIC: &str = "stock/quote";

/// Topic the relay subscribes to for control commands.
pub const DEFAULT_COMMAND_TOPIC: &str = "stock/command";

const DEFAULT_MQTT_HOST: &str = "192.168.1.104";
const DEFAULT_MQTT_PORT: u16 = 1883;

/// Complete relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Human-readable poll period ("5m", "90s").
    pub requestperiod: String,
    /// Ticker symbols to poll, in request order.
    pub symbols: Vec<String>,
    /// MQTT connection settings.
    pub mqtt: MqttSettings,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            requestperiod: "5m".to_string(),
            symbols: vec![
                "VGWL.DE".to_string(),
                "VFEM.DE".to_string(),
                "NLLSF".to_string(),
                "PFE.DE".to_string(),
            ],
            mqtt: MqttSettings::default(),
        }
    }
}

impl RelayConfig {
    /// Poll period parsed from `requestperiod`.
    ///
    /// A malformed or non-positive value falls back to
    /// [`DEFAULT_REQUEST_PERIOD`] rather than failing the whole config.
    #[must_use]
    pub fn request_period(&self) -> Duration {
        match humantime::parse_duration(&self.requestperiod) {
            Ok(period) if period > Duration::ZERO => period,
            Ok(_) => {
                tracing::warn!(
                    value = %self.requestperiod,
                    "requestperiod must be positive, using default"
                );
                DEFAULT_REQUEST_PERIOD
            }
            Err(e) => {
                tracing::warn!(
                    value = %self.requestperiod,
                    error = %e,
                    "unable to parse requestperiod, using default"
                );
                DEFAULT_REQUEST_PERIOD
            }
        }
    }
}

/// MQTT connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    /// Broker hostname or address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Client identifier presented to the broker.
    pub clientid: Option<String>,
    /// Optional username/password pair.
    pub credentials: Option<CredentialSettings>,
    /// Topic quotes are published to.
    pub publishtopic: String,
    /// Topic subscribed for control commands.
    pub commandtopic: String,
    /// Delivery guarantee (0-2) for publishes and the command subscription.
    pub qos: u8,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_MQTT_HOST.to_string(),
            port: DEFAULT_MQTT_PORT,
            clientid: None,
            credentials: None,
            publishtopic: DEFAULT_PUBLISH_TOPIC.to_string(),
            commandtopic: DEFAULT_COMMAND_TOPIC.to_string(),
            qos: 1,
        }
    }
}

/// Username/password pair for broker authentication.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialSettings {
    /// Broker username.
    pub username: String,
    /// Broker password.
    pub password: String,
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
