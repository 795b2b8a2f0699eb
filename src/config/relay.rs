//! Relay backend configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::HttpRelayConfig;

/// Relay control backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Backend base URL, e.g. `https://api.example.com`
    pub base_url: String,

    /// Bearer token for relay calls
    pub api_token: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Path probed during session preflight
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

impl RelayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP relay adapter settings
    pub fn http_config(&self) -> HttpRelayConfig {
        HttpRelayConfig::new(self.base_url.clone()).with_timeout(self.request_timeout())
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("relay.base_url"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidRelayUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("relay.request_timeout_secs"));
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    10
}

fn default_health_path() -> String {
    "/health".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn relay_config(base_url: &str) -> RelayConfig {
        RelayConfig {
            base_url: base_url.to_string(),
            api_token: Some(SecretString::new("token".to_string())),
            request_timeout_secs: default_request_timeout(),
            health_path: default_health_path(),
        }
    }

    #[test]
    fn test_valid_relay_config() {
        let config = relay_config("https://api.example.com/");
        assert!(config.validate().is_ok());
        assert_eq!(config.http_config().base_url, "https://api.example.com");
        assert_eq!(config.api_token.unwrap().expose_secret(), "token");
    }

    #[test]
    fn test_invalid_scheme() {
        let config = relay_config("ftp://api.example.com");
        assert_eq!(config.validate(), Err(ValidationError::InvalidRelayUrl));
    }

    #[test]
    fn test_missing_base_url() {
        let config = relay_config("");
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("relay.base_url"))
        );
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = relay_config("https://api.example.com");
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.request_timeout_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = relay_config("https://api.example.com");
        assert!(!format!("{:?}", config).contains("\"token\""));
    }
}
