//! Configuration Module
//!
//! YAML-backed settings with built-in defaults. A missing or unreadable
//! config file is never fatal; the relay falls back to the defaults and
//! keeps going.
//!
//! The file path comes from the `CONFIG_FILE` environment variable,
//! defaulting to `config.yaml`.

mod settings;

pub use settings::{
    CredentialSettings, MqttSettings, RelayConfig, DEFAULT_COMMAND_TOPIC, DEFAULT_PUBLISH_TOPIC,
    DEFAULT_REQUEST_PERIOD,
};

/// Environment variable naming the config file.
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse the YAML content.
    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml_bw::Error),
}

/// Resolve the config file path from the environment.
#[must_use]
pub fn config_path_from_env() -> String {
    std::env::var(CONFIG_FILE_ENV)
        .ok()
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

/// Load configuration from `path`, falling back to defaults on any error.
#[must_use]
pub fn load_or_default(path: &str) -> RelayConfig {
    match try_load(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path, error = %e, "unable to load config, using built-in defaults");
            RelayConfig::default()
        }
    }
}

/// Load configuration from a YAML file.
pub fn try_load(path: &str) -> Result<RelayConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_string(),
        source: e,
    })?;
    Ok(serde_yaml_bw::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    const FULL_CONFIG: &str = r#"
requestperiod: "30s"
symbols:
  - AAA
  - BBB
mqtt:
  host: broker.local
  port: 8883
  clientid: relay-test
  credentials:
    username: relay
    password: secret
  publishtopic: quotes/out
  commandtopic: quotes/ctl
  qos: 2
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_complete_file() {
        let file = write_config(FULL_CONFIG);
        let config = try_load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.request_period(), Duration::from_secs(30));
        assert_eq!(config.symbols, vec!["AAA", "BBB"]);
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.clientid.as_deref(), Some("relay-test"));
        assert_eq!(config.mqtt.publishtopic, "quotes/out");
        assert_eq!(config.mqtt.commandtopic, "quotes/ctl");
        assert_eq!(config.mqtt.qos, 2);

        let credentials = config.mqtt.credentials.unwrap();
        assert_eq!(credentials.username, "relay");
        assert_eq!(credentials.password, "secret");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let file = write_config("symbols:\n  - ONLY\n");
        let config = try_load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.symbols, vec!["ONLY"]);
        assert_eq!(config.request_period(), DEFAULT_REQUEST_PERIOD);
        assert_eq!(config.mqtt.publishtopic, DEFAULT_PUBLISH_TOPIC);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_or_default("/nonexistent/quote-relay.yaml");
        assert_eq!(config.symbols, RelayConfig::default().symbols);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let file = write_config("mqtt: [not, a, mapping\n");
        let config = load_or_default(file.path().to_str().unwrap());
        assert_eq!(config.mqtt.host, RelayConfig::default().mqtt.host);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let err = try_load("/nonexistent/quote-relay.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
