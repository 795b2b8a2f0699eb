//! TCP link transport.
//!
//! A link counts as up once a TCP connection to the device endpoint
//! succeeds. The fallback link is typically a Bluetooth serial gateway that
//! listens on its own port, hence the per-transport port override.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::domain::health::ConnectionType;
use crate::ports::{LinkConfig, LinkTransport, TransportError};

pub struct TcpLinkTransport {
    kind: ConnectionType,
    port_override: Option<u16>,
}

impl TcpLinkTransport {
    pub fn new(kind: ConnectionType) -> Self {
        Self {
            kind,
            port_override: None,
        }
    }

    /// Connect to this port instead of `LinkConfig::port`.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port_override = Some(port);
        self
    }

    fn target(&self, config: &LinkConfig) -> (String, u16) {
        (
            config.host.clone(),
            self.port_override.unwrap_or(config.port),
        )
    }
}

#[async_trait]
impl LinkTransport for TcpLinkTransport {
    fn kind(&self) -> ConnectionType {
        self.kind
    }

    async fn connect(&self, config: &LinkConfig) -> Result<(), TransportError> {
        let (host, port) = self.target(config);
        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| TransportError::ConnectFailed(format!("{}:{}: {}", host, port, e)))?;
        tracing::debug!(kind = %self.kind, peer = ?stream.peer_addr().ok(), "link connected");
        Ok(())
    }
}
