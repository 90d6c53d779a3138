//! Error types for content generation.

use super::provider::ProviderId;
use thiserror::Error;

/// Failure of a single provider call.
///
/// Every variant is recoverable: the client moves on to the next provider in
/// the priority list when auto-fallback is enabled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Provider or gateway returned a non-2xx response.
    #[error("API Error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Response body did not match the provider's format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Map a reqwest error, distinguishing timeouts from other failures.
    pub fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(timeout_ms)
        } else if e.is_decode() {
            TransportError::InvalidResponse(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Errors surfaced to callers of [`LlmClient`](super::LlmClient).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Provider identifier is unknown or has no agent registered. Never retried.
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Every provider in the fallback chain failed.
    #[error("Generation failed on provider '{provider}': {source}")]
    GenerationFailed {
        /// Last provider attempted
        provider: ProviderId,
        #[source]
        source: TransportError,
    },

    /// Request rejected before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider cannot be built from configuration (e.g. missing API key).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Provider named by the error, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            LlmError::GenerationFailed { provider, .. } => Some(*provider),
            _ => None,
        }
    }
}
