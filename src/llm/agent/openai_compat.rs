//! Direct call path for OpenAI-compatible providers (Groq, OpenRouter, LM Studio).

use super::{ProviderAgent, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::llm::error::TransportError;
use crate::llm::provider::ProviderId;
use crate::llm::types::{GenerationRequest, GenerationResult, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";
pub const LMSTUDIO_DEFAULT_MODEL: &str = "local-model";

/// Agent for providers speaking the `/chat/completions` dialect.
///
/// - Generation via POST {base}/chat/completions (Bearer token when a key is set)
/// - Health via GET {base}/models
pub struct OpenAiCompatAgent {
    provider: ProviderId,
    name: String,
    base_url: String,
    api_key: Option<String>,
    model: String,
    /// Extra headers sent on every request (OpenRouter attribution)
    extra_headers: Vec<(&'static str, &'static str)>,
    client: Arc<Client>,
    timeout: Duration,
}

impl OpenAiCompatAgent {
    pub fn new(
        provider: ProviderId,
        base_url: String,
        api_key: Option<String>,
        model: String,
        client: Arc<Client>,
        timeout: Duration,
    ) -> Self {
        let extra_headers = match provider {
            ProviderId::OpenRouter => vec![
                ("HTTP-Referer", "https://github.com/autometa"),
                ("X-Title", "AutoMeta"),
            ],
            _ => Vec::new(),
        };

        Self {
            provider,
            name: format!("{} (direct)", provider),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            extra_headers,
            client,
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn authorize(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref key) = self.api_key {
            builder = builder.header("authorization", format!("Bearer {}", key));
        }
        for (name, value) in &self.extra_headers {
            builder = builder.header(*name, *value);
        }
        builder
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl ProviderAgent for OpenAiCompatAgent {
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
        let url = format!("{}/chat/completions", self.base_url);
        let timeout_ms = self.timeout.as_millis() as u64;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        };

        tracing::debug!(
            provider = %self.provider,
            model = %self.model,
            "initiating chat completion"
        );

        let response = self
            .authorize(self.client.post(&url))
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

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            TransportError::InvalidResponse(format!(
                "Failed to parse {} response: {}",
                self.provider, e
            ))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                TransportError::InvalidResponse(format!("{} returned no choices", self.provider))
            })?;

        Ok(GenerationResult {
            content,
            provider: self.provider,
            model: Some(parsed.model.unwrap_or_else(|| self.model.clone())),
            usage: parsed.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }

    async fn health_check(&self) -> Result<bool, TransportError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .authorize(self.client.get(&url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, 5000))?;

        Ok(response.status().is_success())
    }
}
