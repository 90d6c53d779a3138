//! Direct call path for Google Gemini.

use super::{ProviderAgent, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::llm::error::TransportError;
use crate::llm::provider::ProviderId;
use crate::llm::types::{GenerationRequest, GenerationResult, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini agent.
///
/// - Generation via POST /v1beta/models/{model}:generateContent?key={key}
/// - Health via GET /v1beta/models?key={key}
pub struct GeminiAgent {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    client: Arc<Client>,
    timeout: Duration,
}

impl GeminiAgent {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        client: Arc<Client>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: "gemini (direct)".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
            timeout,
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Result<String, TransportError> {
        let candidate = self.candidates.first().ok_or_else(|| {
            TransportError::InvalidResponse("Gemini returned no candidates".to_string())
        })?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(TransportError::InvalidResponse(format!(
                "Gemini returned empty content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl ProviderAgent for GeminiAgent {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, TransportError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let timeout_ms = self.timeout.as_millis() as u64;

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_output_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            },
        };

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
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

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        let content = parsed.text()?;
        let usage = parsed.usage_metadata.map(|u| {
            let prompt = u.prompt_token_count.unwrap_or(0);
            let completion = u.candidates_token_count.unwrap_or(0);
            Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: u.total_token_count.unwrap_or(prompt + completion),
            }
        });

        Ok(GenerationResult {
            content,
            provider: ProviderId::Gemini,
            model: Some(self.model.clone()),
            usage,
        })
    }

    async fn health_check(&self) -> Result<bool, TransportError> {
        let url = format!("{}/v1beta/models?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, 5000))?;

        Ok(response.status().is_success())
    }
}
