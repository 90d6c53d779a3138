//! # Provider Gateway Client
//!
//! Generates text through an ordered list of LLM providers (Groq, Gemini,
//! OpenRouter, LM Studio), either via the remote gateway or by calling the
//! provider APIs directly.
//!
//! When a provider fails with a [`TransportError`], [`LlmClient::generate`]
//! moves forward through the [`ProviderPriorityList`], trying each remaining
//! provider at most once. Only the final failure reaches the caller, as
//! [`LlmError::GenerationFailed`].
//!
//! ```no_run
//! # async fn demo() -> Result<(), poster::llm::LlmError> {
//! use poster::config::LlmConfig;
//! use poster::llm::{GenerationRequest, LlmClient};
//!
//! let client = LlmClient::from_config(&LlmConfig::default(), reqwest::Client::new())?;
//! let result = client.generate(&GenerationRequest::new("hello")).await?;
//! println!("{} answered: {}", result.provider, result.content);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod client;
pub mod content;
pub mod error;
pub mod provider;
pub mod types;

pub use client::{FallbackOrder, LlmClient, LlmClientBuilder, CONNECTION_TEST_PROMPT};
pub use content::{
    generate_content_ideas, generate_social_post, parse_numbered_lines, Platform,
    SocialPostContext,
};
pub use error::{LlmError, TransportError};
pub use provider::{ProviderId, ProviderPriorityList};
pub use types::{ConnectionTest, GatewayHealth, GenerationRequest, GenerationResult, Usage};
