//! Broker topic naming and broker address parsing.
//!
//! Topics are namespaced per device:
//!
//! ```text
//! <namespace>/<deviceId>/<channel>          inbound telemetry
//! <namespace>/<deviceId>/<kind>/command     outbound commands
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::DeviceId;

use super::BusError;

/// Reserved topic that receives every inbound message.
pub const WILDCARD_TOPIC: &str = "*";

/// Inbound telemetry channels subscribed for every device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TelemetryChannel {
    Status,
    Motion,
    Sound,
    Recording,
    PtzPosition,
    Error,
}

impl TelemetryChannel {
    /// The fixed set subscribed on every (re)connect.
    pub const ALL: [TelemetryChannel; 6] = [
        TelemetryChannel::Status,
        TelemetryChannel::Motion,
        TelemetryChannel::Sound,
        TelemetryChannel::Recording,
        TelemetryChannel::PtzPosition,
        TelemetryChannel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryChannel::Status => "status",
            TelemetryChannel::Motion => "motion",
            TelemetryChannel::Sound => "sound",
            TelemetryChannel::Recording => "recording",
            TelemetryChannel::PtzPosition => "ptz-position",
            TelemetryChannel::Error => "error",
        }
    }
}

impl fmt::Display for TelemetryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound command kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    /// Pan/tilt movement.
    Ptz,
    Zoom,
    RecordingStart,
    RecordingStop,
    /// Capture a still image.
    Capture,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Ptz => "ptz",
            CommandKind::Zoom => "zoom",
            CommandKind::RecordingStart => "recording-start",
            CommandKind::RecordingStop => "recording-stop",
            CommandKind::Capture => "capture",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds topic names under a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicBuilder {
    namespace: String,
}

impl TopicBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into().trim_matches('/').to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `<namespace>/<deviceId>/<channel>`
    pub fn telemetry(&self, device_id: &DeviceId, channel: TelemetryChannel) -> String {
        format!("{}/{}/{}", self.namespace, device_id, channel)
    }

    /// All inbound topics for a device, in subscription order.
    pub fn telemetry_topics(&self, device_id: &DeviceId) -> Vec<String> {
        TelemetryChannel::ALL
            .iter()
            .map(|channel| self.telemetry(device_id, *channel))
            .collect()
    }

    /// `<namespace>/<deviceId>/<kind>/command`
    pub fn command(&self, device_id: &DeviceId, kind: CommandKind) -> String {
        format!("{}/{}/{}/command", self.namespace, device_id, kind)
    }
}

/// Host, port and transport security parsed from a broker URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl BrokerAddress {
    /// Parses `mqtt://`, `tcp://`, `mqtts://` or `ssl://` URLs.
    ///
    /// The port defaults to 1883 (plain) or 8883 (TLS). Any path or query
    /// suffix is ignored.
    pub fn parse(url: &str) -> Result<Self, BusError> {
        let invalid = |reason: &str| BusError::InvalidBrokerUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme"))?;

        let tls = match scheme.to_ascii_lowercase().as_str() {
            "mqtt" | "tcp" => false,
            "mqtts" | "ssl" => true,
            _ => return Err(invalid("unsupported scheme")),
        };

        let authority = rest
            .split(|c| c == '/' || c == '?')
            .next()
            .unwrap_or_default();
        // Drop credentials if present.
        let authority = authority.rsplit('@').next().unwrap_or(authority);

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
                (host, port)
            }
            None => (authority, if tls { 8883 } else { 1883 }),
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam() -> DeviceId {
        DeviceId::new("cam-1").unwrap()
    }

    #[test]
    fn telemetry_topics_cover_fixed_channel_set() {
        let topics = TopicBuilder::new("devices").telemetry_topics(&cam());
        assert_eq!(
            topics,
            vec![
                "devices/cam-1/status",
                "devices/cam-1/motion",
                "devices/cam-1/sound",
                "devices/cam-1/recording",
                "devices/cam-1/ptz-position",
                "devices/cam-1/error",
            ]
        );
    }

    #[test]
    fn command_topic_mirrors_kind() {
        let builder = TopicBuilder::new("devices/");
        assert_eq!(
            builder.command(&cam(), CommandKind::RecordingStart),
            "devices/cam-1/recording-start/command"
        );
        assert_eq!(builder.command(&cam(), CommandKind::Ptz), "devices/cam-1/ptz/command");
    }

    #[test]
    fn parse_plain_url_with_port() {
        let addr = BrokerAddress::parse("mqtt://broker.local:1884").unwrap();
        assert_eq!(
            addr,
            BrokerAddress {
                host: "broker.local".to_string(),
                port: 1884,
                tls: false
            }
        );
    }

    #[test]
    fn parse_defaults_port_by_scheme() {
        assert_eq!(BrokerAddress::parse("tcp://b").unwrap().port, 1883);
        let tls = BrokerAddress::parse("mqtts://b/path?x=1").unwrap();
        assert_eq!(tls.port, 8883);
        assert!(tls.tls);
    }

    #[test]
    fn parse_strips_credentials() {
        let addr = BrokerAddress::parse("mqtt://user:pw@b.example:1883").unwrap();
        assert_eq!(addr.host, "b.example");
    }

    #[test]
    fn parse_rejects_bad_urls() {
        assert!(BrokerAddress::parse("broker:1883").is_err());
        assert!(BrokerAddress::parse("http://broker").is_err());
        assert!(BrokerAddress::parse("mqtt://:1883").is_err());
        assert!(BrokerAddress::parse("mqtt://b:notaport").is_err());
    }
}
