//! Decoded inbound broker messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::BusError;

/// A broker message whose payload decoded as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub topic: String,
    pub payload: Value,
}

impl TelemetryMessage {
    /// Decodes a raw payload. Non-JSON payloads are rejected.
    pub fn decode(topic: &str, payload: &[u8]) -> Result<Self, BusError> {
        let payload = serde_json::from_slice(payload).map_err(|e| BusError::Decode {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            topic: topic.to_string(),
            payload,
        })
    }

    /// Publisher timestamp, if the payload carries one.
    pub fn timestamp(&self) -> Option<i64> {
        self.payload.get("timestamp").and_then(Value::as_i64)
    }
}

/// Attaches a `timestamp` (Unix ms) to an outbound command payload.
///
/// Object payloads get the field added; anything else is wrapped as
/// `{"value": <payload>, "timestamp": ...}`.
pub fn stamp_payload(payload: Value, unix_millis: i64) -> Value {
    match payload {
        Value::Object(mut map) => {
            map.insert("timestamp".to_string(), Value::from(unix_millis));
            Value::Object(map)
        }
        Value::Null => serde_json::json!({ "timestamp": unix_millis }),
        other => serde_json::json!({ "value": other, "timestamp": unix_millis }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_valid_json() {
        let msg = TelemetryMessage::decode("d/cam-1/status", br#"{"online":true,"timestamp":5}"#)
            .unwrap();
        assert_eq!(msg.payload["online"], true);
        assert_eq!(msg.timestamp(), Some(5));
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = TelemetryMessage::decode("d/cam-1/status", b"not json").unwrap_err();
        assert!(matches!(err, BusError::Decode { .. }));
    }

    #[test]
    fn stamp_adds_timestamp_to_objects() {
        let stamped = stamp_payload(json!({"pan": 10}), 42);
        assert_eq!(stamped, json!({"pan": 10, "timestamp": 42}));
    }

    #[test]
    fn stamp_wraps_scalars_and_null() {
        assert_eq!(stamp_payload(json!(3), 1), json!({"value": 3, "timestamp": 1}));
        assert_eq!(stamp_payload(Value::Null, 1), json!({"timestamp": 1}));
    }
}
