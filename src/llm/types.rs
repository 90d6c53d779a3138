//! Request and response types for content generation.

use super::error::LlmError;
use super::provider::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single generation request.
///
/// Serialized as the gateway's `POST /generate` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider: None,
            max_tokens: None,
            temperature: None,
            platform: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderId) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Check field constraints: non-empty prompt, positive token limit,
    /// temperature in `[0, 2]`.
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.prompt.trim().is_empty() {
            return Err(LlmError::InvalidRequest("prompt cannot be empty".to_string()));
        }
        if self.max_tokens == Some(0) {
            return Err(LlmError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(LlmError::InvalidRequest(format!(
                    "temperature must be between 0 and 2, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Generated content and the provider that actually produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    pub provider: ProviderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Gateway `GET /health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayHealth {
    pub status: String,
    #[serde(default)]
    pub providers: BTreeMap<String, bool>,
}

impl GatewayHealth {
    pub fn disconnected() -> Self {
        Self {
            status: "disconnected".to_string(),
            providers: BTreeMap::new(),
        }
    }
}

/// Outcome of a single-provider connectivity test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
