//! Call path through the remote LLM gateway.

use super::ProviderAgent;
use crate::llm::error::TransportError;
use crate::llm::provider::ProviderId;
use crate::llm::types::{GatewayHealth, GenerationRequest, GenerationResult};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Thin HTTP client for the gateway's `/generate` and `/health` endpoints.
///
/// Shared by every [`GatewayAgent`] so they reuse one connection pool.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, client: Client, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /generate` with the request as JSON.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, TransportError> {
        let url = format!("{}/generate", self.base_url);
        let timeout_ms = self.timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to read response body: {}", e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse gateway response: {}", e))
        })
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<GatewayHealth, TransportError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, 5000))?;

        if !response.status().is_success() {
            return Err(TransportError::Upstream {
                status: response.status().as_u16(),
                message: format!("Gateway health check failed: {}", response.status()),
            });
        }

        response.json().await.map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse gateway health: {}", e))
        })
    }
}

/// Routes one provider's requests through the gateway by pinning `provider`
/// in the request body.
pub struct GatewayAgent {
    provider: ProviderId,
    name: String,
    gateway: Arc<GatewayClient>,
}

impl GatewayAgent {
    pub fn new(provider: ProviderId, gateway: Arc<GatewayClient>) -> Self {
        Self {
            provider,
            name: format!("{} via gateway", provider),
            gateway,
        }
    }
}

#[async_trait]
impl ProviderAgent for GatewayAgent {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, TransportError> {
        let mut pinned = request.clone();
        pinned.provider = Some(self.provider);
        self.gateway.generate(&pinned).await
    }

    async fn health_check(&self) -> Result<bool, TransportError> {
        let health = self.gateway.health().await?;
        Ok(health
            .providers
            .get(self.provider.as_str())
            .copied()
            .unwrap_or(false))
    }
}
