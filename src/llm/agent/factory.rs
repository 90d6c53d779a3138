//! Builds `ProviderAgent` trait objects from configuration.

use super::gateway::{GatewayAgent, GatewayClient};
use super::gemini::{GeminiAgent, GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL};
use super::openai_compat::{
    OpenAiCompatAgent, GROQ_BASE_URL, GROQ_DEFAULT_MODEL, LMSTUDIO_BASE_URL,
    LMSTUDIO_DEFAULT_MODEL, OPENROUTER_BASE_URL, OPENROUTER_DEFAULT_MODEL,
};
use super::ProviderAgent;
use crate::config::ProviderSettings;
use crate::llm::error::LlmError;
use crate::llm::provider::ProviderId;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Agent that reaches `provider` through the shared gateway client.
pub fn create_gateway_agent(
    provider: ProviderId,
    gateway: Arc<GatewayClient>,
) -> Arc<dyn ProviderAgent> {
    Arc::new(GatewayAgent::new(provider, gateway))
}

/// Agent that calls `provider`'s API directly.
///
/// The API key is taken from `api_key`, then the variable named by
/// `api_key_env`, then the provider's conventional variable
/// (`GROQ_API_KEY`, `GEMINI_API_KEY`, `OPENROUTER_API_KEY`). LM Studio
/// needs no key.
///
/// # Examples
///
/// ```
/// use poster::config::ProviderSettings;
/// use poster::llm::agent::create_direct_agent;
/// use poster::llm::ProviderId;
/// use reqwest::Client;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let agent = create_direct_agent(
///     ProviderId::LmStudio,
///     &ProviderSettings::default(),
///     Arc::new(Client::new()),
///     Duration::from_secs(30),
/// )
/// .unwrap();
///
/// assert_eq!(agent.provider(), ProviderId::LmStudio);
/// ```
pub fn create_direct_agent(
    provider: ProviderId,
    settings: &ProviderSettings,
    client: Arc<Client>,
    timeout: Duration,
) -> Result<Arc<dyn ProviderAgent>, LlmError> {
    let api_key = settings.resolve_api_key(provider);

    let require_key = |key: Option<String>| {
        key.ok_or_else(|| {
            let hint = settings
                .api_key_env
                .as_deref()
                .or_else(|| ProviderSettings::default_key_env(provider))
                .unwrap_or("api_key");
            LlmError::Configuration(format!(
                "{} requires an API key (set '{}' or providers.{}.api_key)",
                provider, hint, provider
            ))
        })
    };

    let base_url = |default: &str| {
        settings
            .base_url
            .clone()
            .unwrap_or_else(|| default.to_string())
    };
    let model = |default: &str| settings.model.clone().unwrap_or_else(|| default.to_string());

    let agent: Arc<dyn ProviderAgent> = match provider {
        ProviderId::Groq => Arc::new(OpenAiCompatAgent::new(
            provider,
            base_url(GROQ_BASE_URL),
            Some(require_key(api_key)?),
            model(GROQ_DEFAULT_MODEL),
            client,
            timeout,
        )),
        ProviderId::OpenRouter => Arc::new(OpenAiCompatAgent::new(
            provider,
            base_url(OPENROUTER_BASE_URL),
            Some(require_key(api_key)?),
            model(OPENROUTER_DEFAULT_MODEL),
            client,
            timeout,
        )),
        ProviderId::LmStudio => Arc::new(OpenAiCompatAgent::new(
            provider,
            base_url(LMSTUDIO_BASE_URL),
            api_key,
            model(LMSTUDIO_DEFAULT_MODEL),
            client,
            timeout,
        )),
        ProviderId::Gemini => Arc::new(GeminiAgent::new(
            base_url(GEMINI_BASE_URL),
            require_key(api_key)?,
            model(GEMINI_DEFAULT_MODEL),
            client,
            timeout,
        )),
    };

    Ok(agent)
}
