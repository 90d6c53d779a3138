//! LLM provider configuration

use crate::llm::{ProviderId, ProviderPriorityList};
use serde::{Deserialize, Serialize};

/// How the client reaches providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LlmMode {
    /// Every provider call goes through the remote gateway's `/generate`.
    #[default]
    Gateway,
    /// Providers are called directly with locally configured API keys.
    Direct,
}

/// Content generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub mode: LlmMode,
    /// Base URL of the LLM gateway (gateway mode)
    pub gateway_url: String,
    /// Fallback order; the head is the default provider
    pub priority: ProviderPriorityList,
    /// Walk the priority list on provider failure
    pub auto_fallback: bool,
    /// Per-attempt request timeout
    pub request_timeout_seconds: u64,
    pub providers: ProvidersConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: LlmMode::Gateway,
            gateway_url: "http://localhost:8000".to_string(),
            priority: ProviderPriorityList::default(),
            auto_fallback: true,
            request_timeout_seconds: 30,
            providers: ProvidersConfig::default(),
        }
    }
}

/// Per-provider settings used in direct mode and by the gateway server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub groq: ProviderSettings,
    pub gemini: ProviderSettings,
    pub openrouter: ProviderSettings,
    pub lmstudio: ProviderSettings,
}

impl ProvidersConfig {
    pub fn get(&self, provider: ProviderId) -> &ProviderSettings {
        match provider {
            ProviderId::Groq => &self.groq,
            ProviderId::Gemini => &self.gemini,
            ProviderId::OpenRouter => &self.openrouter,
            ProviderId::LmStudio => &self.lmstudio,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Inline API key (prefer `api_key_env`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderSettings {
    /// Environment variable consulted when neither `api_key` nor
    /// `api_key_env` is set.
    pub fn default_key_env(provider: ProviderId) -> Option<&'static str> {
        match provider {
            ProviderId::Groq => Some("GROQ_API_KEY"),
            ProviderId::Gemini => Some("GEMINI_API_KEY"),
            ProviderId::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderId::LmStudio => None,
        }
    }

    /// Resolve the API key: inline value, then the named env var, then the
    /// provider's conventional env var. Empty values count as missing.
    pub fn resolve_api_key(&self, provider: ProviderId) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        let env_name = self
            .api_key_env
            .as_deref()
            .or_else(|| Self::default_key_env(provider))?;
        std::env::var(env_name).ok().filter(|k| !k.is_empty())
    }
}
