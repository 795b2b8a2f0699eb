//! HTTP Relay Control - Implementation of RelayControl over the backend REST API.
//!
//! # Endpoints
//!
//! ```text
//! POST {base}/relay/{deviceId}/start   body: RelayOptions  -> {hls_url?, message?}
//! POST {base}/relay/{deviceId}/stop
//! GET  {base}/relay/{deviceId}/status                       -> {running}
//! GET  {base}/devices/{deviceId}/stream                     -> {hls_url?}
//! ```
//!
//! Every request carries `Authorization: Bearer <token>` from the
//! configured `TokenProvider`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::DeviceId;
use crate::ports::{
    AuthError, RelayControl, RelayError, RelayOptions, RelayStarted, RelayStatus, TokenProvider,
};

/// Configuration for the HTTP relay adapter.
#[derive(Debug, Clone)]
pub struct HttpRelayConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpRelayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Relay control over HTTP.
pub struct HttpRelayControl {
    config: HttpRelayConfig,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    hls_url: Option<String>,
}

impl HttpRelayControl {
    pub fn new(config: HttpRelayConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    fn relay_url(&self, device_id: &DeviceId, action: &str) -> String {
        format!("{}/relay/{}/{}", self.config.base_url, device_id, action)
    }

    fn stream_url(&self, device_id: &DeviceId) -> String {
        format!("{}/devices/{}/stream", self.config.base_url, device_id)
    }

    /// Attaches the bearer token and sends.
    async fn send(&self, request: RequestBuilder) -> Result<Response, RelayError> {
        let token = self.tokens.bearer_token().await.map_err(|e| match e {
            AuthError::Missing => RelayError::Unauthorized("no bearer token".to_string()),
            other => RelayError::Unauthorized(other.to_string()),
        })?;

        let response = request
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Network(format!(
                        "Request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    RelayError::Network(format!("Connection failed: {}", e))
                } else {
                    RelayError::Network(e.to_string())
                }
            })?;

        Self::check_status(response).await
    }

    /// Maps non-2xx responses to `RelayError`.
    async fn check_status(response: Response) -> Result<Response, RelayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(RelayError::Unauthorized(body)),
            code => Err(RelayError::Rejected {
                status: code,
                message: body,
            }),
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, RelayError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RelayError::Parse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl RelayControl for HttpRelayControl {
    async fn start_relay(
        &self,
        device_id: &DeviceId,
        options: &RelayOptions,
    ) -> Result<RelayStarted, RelayError> {
        let request = self.client.post(self.relay_url(device_id, "start")).json(options);
        let response = self.send(request).await?;

        // Some relays answer 204 with no body.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(RelayStarted::pending());
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::Parse(format!("Failed to parse start response: {}", e)))
    }

    async fn stop_relay(&self, device_id: &DeviceId) -> Result<(), RelayError> {
        let request = self.client.post(self.relay_url(device_id, "stop"));
        self.send(request).await?;
        Ok(())
    }

    async fn relay_status(&self, device_id: &DeviceId) -> Result<RelayStatus, RelayError> {
        let request = self.client.get(self.relay_url(device_id, "status"));
        let response = self.send(request).await?;
        Self::parse(response).await
    }

    async fn stream_descriptor(&self, device_id: &DeviceId) -> Result<Option<String>, RelayError> {
        let request = self.client.get(self.stream_url(device_id));
        let response = self.send(request).await?;
        let body: StreamResponse = Self::parse(response).await?;
        Ok(body.hls_url.filter(|url| !url.is_empty()))
    }
}
