//! Health module - link status and quality classification.

mod errors;
mod status;

pub use errors::HealthError;
pub use status::{
    ConnectionQuality, ConnectionStatus, ConnectionType, LinkMetrics, SpeedTestResult,
};
