//! HTTP server configuration

use crate::llm::{ProviderId, ProviderPriorityList};
use serde::{Deserialize, Serialize};

/// Dashboard API server (`poster serve`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies accepted by the API
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// LLM gateway server (`poster gateway`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Order used after the preferred provider
    pub priority: ProviderPriorityList,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            priority: gateway_priority(),
        }
    }
}

fn gateway_priority() -> ProviderPriorityList {
    ProviderPriorityList::new(vec![
        ProviderId::LmStudio,
        ProviderId::Groq,
        ProviderId::Gemini,
        ProviderId::OpenRouter,
    ])
    .unwrap_or_default()
}
