//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `CAMLINK` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use camlink::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Broker at {}", config.broker.url);
//! ```

mod broker;
mod error;
mod health;
mod logging;
mod relay;
mod session;

pub use broker::BrokerConfig;
pub use error::{ConfigError, ValidationError};
pub use health::HealthConfig;
pub use logging::LoggingConfig;
pub use relay::RelayConfig;
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Event bus broker
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Relay control backend (required: `base_url`)
    pub relay: RelayConfig,

    /// Session startup tuning
    #[serde(default)]
    pub session: SessionConfig,

    /// Device link health
    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CAMLINK` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `CAMLINK__BROKER__URL=mqtts://broker:8883` -> `broker.url`
    /// - `CAMLINK__RELAY__BASE_URL=...` -> `relay.base_url`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CAMLINK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.broker.validate()?;
        self.relay.validate()?;
        self.session.validate()?;
        self.health.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
