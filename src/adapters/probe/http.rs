//! HTTP Backend Probe - Health GET and stream HEAD checks.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::ports::{BackendProbe, ProbeError};

/// Reachability checks over HTTP.
///
/// Timeouts set here are a backstop; the orchestrator bounds each call
/// itself.
pub struct HttpBackendProbe {
    client: Client,
    health_url: String,
}

impl HttpBackendProbe {
    pub fn new(
        base_url: &str,
        health_path: &str,
        timeout: Duration,
    ) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            health_url: join_url(base_url, health_path),
        })
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn map_reqwest(e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout
    } else {
        ProbeError::Network(e.to_string())
    }
}

#[async_trait]
impl BackendProbe for HttpBackendProbe {
    fn health_endpoint(&self) -> String {
        self.health_url.clone()
    }

    async fn check_health(&self) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }

    async fn stream_available(&self, stream_url: &str) -> Result<bool, ProbeError> {
        let response = self
            .client
            .head(stream_url)
            .send()
            .await
            .map_err(map_reqwest)?;
        Ok(response.status().is_success())
    }
}
