//! Sensor and feed-client configuration.
//!
//! [`SensorConfig`] is what a host supplies when it registers the sensor;
//! [`ClientConfig`] carries the endpoint and credential, injected at
//! construction rather than compiled in.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// GTFS-R trip updates endpoint of the National Transport Authority.
pub const DEFAULT_ENDPOINT: &str = "https://api.nationaltransport.ie/gtfsr/v2/gtfsr/tripUpdates";

/// How many of the soonest arrivals are kept after ranking.
pub const DEFAULT_MAX_ARRIVALS: usize = 2;

pub const DEFAULT_NAME: &str = "Next Bus";

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeStyle {
    /// Nearest arrival plus a one-line summary of the bus after it.
    #[default]
    Summary,
    /// Summary attributes plus the full ranked arrival list.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub stop_id: String,
    #[serde(default = "SensorConfig::default_name")]
    pub name: String,
    #[serde(default = "SensorConfig::default_max_arrivals")]
    pub max_arrivals: usize,
    #[serde(default)]
    pub attributes: AttributeStyle,
    #[serde(default = "SensorConfig::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl SensorConfig {
    pub fn new(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            name: Self::default_name(),
            max_arrivals: Self::default_max_arrivals(),
            attributes: AttributeStyle::default(),
            poll_interval_secs: Self::default_poll_interval_secs(),
        }
    }

    /// Loads a JSON sensor definition, e.g.
    /// `{ "stop_id": "8220DB000334", "name": "Bus to town" }`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_id.trim().is_empty() {
            return Err(ConfigError::Missing("stop_id"));
        }
        if self.max_arrivals == 0 {
            return Err(ConfigError::Invalid {
                name: "max_arrivals",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "poll_interval_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn default_name() -> String {
        DEFAULT_NAME.to_string()
    }
    fn default_max_arrivals() -> usize {
        DEFAULT_MAX_ARRIVALS
    }
    fn default_poll_interval_secs() -> u64 {
        DEFAULT_POLL_INTERVAL_SECS
    }
}

#[derive(Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `GTFSR_API_KEY` (required), `GTFSR_ENDPOINT` and
    /// `GTFSR_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GTFSR_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("GTFSR_API_KEY"))?;

        let mut config = Self::new(api_key);

        if let Some(endpoint) = lookup("GTFSR_ENDPOINT").filter(|e| !e.trim().is_empty()) {
            config.endpoint = endpoint;
        }

        if let Some(raw) = lookup("GTFSR_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "GTFSR_TIMEOUT_SECS",
                reason: format!("'{raw}' is not a whole number of seconds"),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a HashMap<&str, &str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| vars.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_sensor_config_defaults() {
        let config = SensorConfig::from_json(r#"{ "stop_id": "8220DB000334" }"#).unwrap();
        assert_eq!(config.stop_id, "8220DB000334");
        assert_eq!(config.name, "Next Bus");
        assert_eq!(config.max_arrivals, 2);
        assert_eq!(config.attributes, AttributeStyle::Summary);
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_sensor_config_overrides() {
        let config = SensorConfig::from_json(
            r#"{ "stop_id": "1", "name": "Town", "max_arrivals": 5, "attributes": "full", "poll_interval_secs": 30 }"#,
        )
        .unwrap();
        assert_eq!(config.name, "Town");
        assert_eq!(config.max_arrivals, 5);
        assert_eq!(config.attributes, AttributeStyle::Full);
        assert_eq!(config.poll_interval_secs, 30);
    }

    #[test]
    fn test_sensor_config_requires_stop_id() {
        assert!(matches!(
            SensorConfig::from_json(r#"{ "name": "x" }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SensorConfig::from_json(r#"{ "stop_id": "  " }"#),
            Err(ConfigError::Missing("stop_id"))
        ));
    }

    #[test]
    fn test_sensor_config_rejects_zero_values() {
        let mut config = SensorConfig::new("1");
        config.max_arrivals = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "max_arrivals", .. })
        ));

        let mut config = SensorConfig::new("1");
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sensor_config_load_missing_file() {
        let result = SensorConfig::load("/nonexistent/next_bus_sensor.json");
        assert!(matches!(result, Err(ConfigError::Read(_))));
    }

    #[test]
    fn test_client_config_requires_key() {
        let vars = HashMap::new();
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Missing("GTFSR_API_KEY"))
        ));
    }

    #[test]
    fn test_client_config_defaults_and_overrides() {
        let vars = HashMap::from([("GTFSR_API_KEY", "abc")]);
        let config = ClientConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.timeout, Duration::from_secs(30));

        let vars = HashMap::from([
            ("GTFSR_API_KEY", "abc"),
            ("GTFSR_ENDPOINT", "http://localhost:8080/feed"),
            ("GTFSR_TIMEOUT_SECS", "5"),
        ]);
        let config = ClientConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/feed");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_client_config_bad_timeout() {
        let vars = HashMap::from([("GTFSR_API_KEY", "abc"), ("GTFSR_TIMEOUT_SECS", "soon")]);
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "GTFSR_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn test_client_config_debug_hides_key() {
        let config = ClientConfig::new("super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
