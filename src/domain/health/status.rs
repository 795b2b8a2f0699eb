//! Link status value objects and quality classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical transport used to reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Bluetooth,
    Hybrid,
}

impl ConnectionType {
    /// Nominal metrics reported right after a successful connect on this
    /// transport, before any real measurement has been taken.
    pub fn nominal_metrics(&self) -> LinkMetrics {
        match self {
            ConnectionType::Wifi => LinkMetrics {
                signal_strength: -45,
                latency_ms: 20,
                bandwidth: "54 Mbps".to_string(),
            },
            ConnectionType::Bluetooth => LinkMetrics {
                signal_strength: -65,
                latency_ms: 120,
                bandwidth: "2 Mbps".to_string(),
            },
            ConnectionType::Hybrid => LinkMetrics {
                signal_strength: -55,
                latency_ms: 60,
                bandwidth: "24 Mbps".to_string(),
            },
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionType::Wifi => "wifi",
            ConnectionType::Bluetooth => "bluetooth",
            ConnectionType::Hybrid => "hybrid",
        };
        write!(f, "{}", s)
    }
}

/// Signal, latency and bandwidth of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetrics {
    /// Received signal strength in dBm (negative; closer to zero is better).
    pub signal_strength: i32,
    /// Round-trip latency in milliseconds.
    pub latency_ms: u32,
    /// Human readable bandwidth descriptor, e.g. "54 Mbps".
    pub bandwidth: String,
}

/// Coarse link quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ConnectionQuality {
    /// Classifies a link from its signal strength and latency.
    ///
    /// Thresholds are strict: a value sitting exactly on a boundary belongs
    /// to the next lower tier.
    pub fn classify(signal_strength: i32, latency_ms: u32) -> Self {
        if signal_strength > -30 && latency_ms < 50 {
            ConnectionQuality::Excellent
        } else if signal_strength > -50 && latency_ms < 100 {
            ConnectionQuality::Good
        } else if signal_strength > -70 && latency_ms < 200 {
            ConnectionQuality::Fair
        } else {
            ConnectionQuality::Poor
        }
    }
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionQuality::Poor => "poor",
            ConnectionQuality::Fair => "fair",
            ConnectionQuality::Good => "good",
            ConnectionQuality::Excellent => "excellent",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of the device link as tracked by the health monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    /// dBm
    pub signal_strength: i32,
    pub bandwidth: String,
    /// ms
    pub latency: u32,
    pub connection_type: ConnectionType,
    pub error: Option<String>,
}

impl ConnectionStatus {
    /// Disconnected status with zeroed metrics.
    pub fn disconnected() -> Self {
        Self {
            is_connected: false,
            signal_strength: 0,
            bandwidth: String::new(),
            latency: 0,
            connection_type: ConnectionType::Wifi,
            error: None,
        }
    }

    /// Connected status using the nominal metrics of `connection_type`.
    pub fn connected_via(connection_type: ConnectionType) -> Self {
        let metrics = connection_type.nominal_metrics();
        Self {
            is_connected: true,
            signal_strength: metrics.signal_strength,
            bandwidth: metrics.bandwidth,
            latency: metrics.latency_ms,
            connection_type,
            error: None,
        }
    }

    /// Quality tier of the current metrics.
    pub fn quality(&self) -> ConnectionQuality {
        ConnectionQuality::classify(self.signal_strength, self.latency)
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Result of a round-trip link measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestResult {
    pub ping_ms: u32,
    pub download_mbps: f64,
    pub upload_mbps: f64,
}
