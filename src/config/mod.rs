//! Configuration for the poster binary
//!
//! Layered loading from a TOML file, environment variables and defaults.
//!
//! # Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`POSTER_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! ```rust
//! use poster::config::PosterConfig;
//!
//! let config: PosterConfig = toml::from_str(r#"
//! [llm]
//! priority = ["gemini", "groq"]
//! "#).unwrap();
//! assert_eq!(config.llm.priority.head().as_str(), "gemini");
//! assert_eq!(config.server.port, 3000);
//! ```

pub mod error;
pub mod llm;
pub mod logging;
pub mod server;
pub mod services;

pub use error::ConfigError;
pub use llm::{LlmConfig, LlmMode, ProviderSettings, ProvidersConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use server::{GatewayConfig, ServerConfig};
pub use services::ServicesConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bundled example written by `poster config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../poster.example.toml");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PosterConfig {
    /// Dashboard API server
    pub server: ServerConfig,
    /// LLM gateway server
    pub gateway: GatewayConfig,
    /// Content generation client
    pub llm: LlmConfig,
    /// Backend service endpoints
    pub services: ServicesConfig,
    pub logging: LoggingConfig,
}

impl PosterConfig {
    /// Load configuration from a TOML file.
    ///
    /// `None` yields the defaults; a missing file is `NotFound`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `POSTER_*` environment overrides. Invalid values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("POSTER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("POSTER_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("POSTER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("POSTER_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(url) = std::env::var("POSTER_GATEWAY_URL") {
            self.llm.gateway_url = url;
        }
        if let Ok(fallback) = std::env::var("POSTER_AUTO_FALLBACK") {
            if let Ok(enabled) = fallback.to_lowercase().parse() {
                self.llm.auto_fallback = enabled;
            }
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "port must be non-zero"));
        }
        if self.gateway.port == 0 {
            return Err(ConfigError::invalid("gateway.port", "port must be non-zero"));
        }
        if self.llm.request_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "llm.request_timeout_seconds",
                "timeout must be positive",
            ));
        }
        validate_http_url("llm.gateway_url", &self.llm.gateway_url)?;

        for provider in crate::llm::ProviderId::ALL {
            if let Some(ref base_url) = self.llm.providers.get(provider).base_url {
                validate_http_url(&format!("llm.providers.{}.base_url", provider), base_url)?;
            }
        }

        if self.services.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "services.connect_timeout_ms",
                "timeout must be positive",
            ));
        }
        if self.services.puppeteer_host.trim().is_empty() {
            return Err(ConfigError::invalid(
                "services.puppeteer_host",
                "host cannot be empty",
            ));
        }
        validate_http_url("services.mcp_endpoint", &self.services.mcp_endpoint)?;
        validate_http_url("services.gateway_endpoint", &self.services.gateway_endpoint)?;

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(value).map_err(|e| ConfigError::invalid(field, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(
            field,
            format!("expected http or https URL, got scheme '{}'", other),
        )),
    }
}
