//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifier of a managed device (camera).
///
/// Device ids are embedded verbatim in broker topics and relay URLs, so they
/// must be non-empty and free of MQTT separators and wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a DeviceId, validating its format.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("device_id"));
        }
        if let Some(c) = trimmed.chars().find(|c| matches!(c, '/' | '+' | '#')) {
            return Err(ValidationError::invalid_format(
                "device_id",
                format!("contains reserved character '{}'", c),
            ));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::invalid_format(
                "device_id",
                "contains whitespace",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_accepts_plain_identifier() {
        let id = DeviceId::new("cam-1").unwrap();
        assert_eq!(id.as_str(), "cam-1");
    }

    #[test]
    fn device_id_trims_surrounding_whitespace() {
        let id = DeviceId::new("  cam-1 ").unwrap();
        assert_eq!(id.to_string(), "cam-1");
    }

    #[test]
    fn device_id_rejects_empty() {
        assert_eq!(
            DeviceId::new("   "),
            Err(ValidationError::empty_field("device_id"))
        );
    }

    #[test]
    fn device_id_rejects_topic_separators_and_wildcards() {
        assert!(DeviceId::new("cam/1").is_err());
        assert!(DeviceId::new("cam+").is_err());
        assert!(DeviceId::new("#").is_err());
    }

    #[test]
    fn device_id_rejects_inner_whitespace() {
        assert!(DeviceId::new("cam 1").is_err());
    }

    #[test]
    fn device_id_parses_from_str() {
        let id: DeviceId = "cam-9".parse().unwrap();
        assert_eq!(id.as_str(), "cam-9");
    }

    #[test]
    fn device_id_serde_validates() {
        let id: DeviceId = serde_json::from_str("\"cam-2\"").unwrap();
        assert_eq!(id.as_str(), "cam-2");
        assert!(serde_json::from_str::<DeviceId>("\"a/b\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cam-2\"");
    }
}
