//! Broker (event bus) configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::EventBusConfig;
use crate::domain::telemetry::BrokerAddress;

/// MQTT broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Broker URL (`mqtt://`, `mqtts://`, `tcp://` or `ssl://`)
    #[serde(default = "default_url")]
    pub url: String,

    /// First topic segment
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Delay between reconnect attempts in milliseconds
    #[serde(default = "default_reconnect_period")]
    pub reconnect_period_ms: u64,

    /// Reconnect attempts before giving up; 0 retries forever
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// How long a command publish waits for the broker ack
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_ms: u64,
}

impl BrokerConfig {
    /// Event bus settings derived from this section
    pub fn event_bus_config(&self) -> EventBusConfig {
        EventBusConfig {
            namespace: self.namespace.clone(),
            keep_alive: Duration::from_secs(self.keep_alive_secs),
            reconnect_period: Duration::from_millis(self.reconnect_period_ms),
            max_reconnect_attempts: match self.max_reconnect_attempts {
                0 => None,
                n => Some(n),
            },
            publish_timeout: Duration::from_millis(self.publish_timeout_ms),
            ..EventBusConfig::default()
        }
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        BrokerAddress::parse(&self.url)
            .map_err(|e| ValidationError::InvalidBrokerUrl(e.to_string()))?;
        if self.namespace.trim_matches('/').is_empty() {
            return Err(ValidationError::MissingRequired("broker.namespace"));
        }
        if self.keep_alive_secs == 0 {
            return Err(ValidationError::InvalidTimeout("broker.keep_alive_secs"));
        }
        if self.publish_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("broker.publish_timeout_ms"));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            namespace: default_namespace(),
            keep_alive_secs: default_keep_alive(),
            reconnect_period_ms: default_reconnect_period(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            publish_timeout_ms: default_publish_timeout(),
        }
    }
}

fn default_url() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_namespace() -> String {
    "devices".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

fn default_reconnect_period() -> u64 {
    5000
}

fn default_max_reconnect_attempts() -> u32 {
    10
}

fn default_publish_timeout() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_defaults() {
        let config = BrokerConfig::default();
        assert_eq!(config.url, "mqtt://localhost:1883");
        assert!(config.validate().is_ok());

        let bus = config.event_bus_config();
        assert_eq!(bus.namespace, "devices");
        assert_eq!(bus.reconnect_period, Duration::from_secs(5));
        assert_eq!(bus.max_reconnect_attempts, Some(10));
    }

    #[test]
    fn test_zero_attempts_means_unbounded() {
        let config = BrokerConfig {
            max_reconnect_attempts: 0,
            ..BrokerConfig::default()
        };
        assert_eq!(config.event_bus_config().max_reconnect_attempts, None);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = BrokerConfig {
            url: "http://broker".to_string(),
            ..BrokerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBrokerUrl(_))
        ));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let config = BrokerConfig {
            namespace: "/".to_string(),
            ..BrokerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("broker.namespace"))
        );
    }
}
