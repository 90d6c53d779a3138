//! Provider agents: one call path per LLM provider.
//!
//! Each agent hides a provider's HTTP shape (endpoint, auth, request and
//! response bodies) behind the [`ProviderAgent`] trait, so the client can walk
//! its fallback chain without branching on provider type.

use async_trait::async_trait;

pub mod factory;
pub mod gateway;
pub mod gemini;
pub mod openai_compat;

pub use factory::{create_direct_agent, create_gateway_agent};
pub use gateway::{GatewayAgent, GatewayClient};
pub use gemini::GeminiAgent;
pub use openai_compat::OpenAiCompatAgent;

use super::error::TransportError;
use super::provider::ProviderId;
use super::types::{GenerationRequest, GenerationResult};

/// Token limit used when a request does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Sampling temperature used when a request does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Unified interface over provider call paths.
///
/// Object-safe; stored as `Arc<dyn ProviderAgent>`. Dropping a returned
/// future aborts the in-flight HTTP request.
#[async_trait]
pub trait ProviderAgent: Send + Sync + 'static {
    /// Provider this agent talks to.
    fn provider(&self) -> ProviderId;

    /// Human-readable name for logs (e.g. "Groq via gateway").
    fn name(&self) -> &str;

    /// Issue one generation request to this provider only.
    ///
    /// - `Err(TransportError::Upstream)` on a non-2xx response
    /// - `Err(TransportError::Network | Timeout)` when unreachable
    /// - `Err(TransportError::InvalidResponse)` when the body has the wrong shape
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResult, TransportError>;

    /// Whether the provider is currently reachable and usable.
    async fn health_check(&self) -> Result<bool, TransportError>;
}
