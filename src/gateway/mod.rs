//! # LLM Gateway Server
//!
//! The HTTP service that [`crate::llm::agent::GatewayClient`] talks to. It
//! owns direct provider agents and applies the preferred-provider-first
//! fallback order.
//!
//! ## Endpoints
//!
//! - `POST /generate` - generate with fallback; 503 once every provider failed
//! - `GET /health` - per-provider reachability
//! - `GET /` - service name, version and configured providers

use crate::api::{ApiError, GenerateBody};
use crate::config::PosterConfig;
use crate::llm::agent::create_direct_agent;
use crate::llm::{
    FallbackOrder, GatewayHealth, GenerationRequest, GenerationResult, LlmClient, LlmError,
    ProviderId, ProviderPriorityList,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;

pub const DEFAULT_PLATFORM: &str = "twitter";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const SERVICE_NAME: &str = "Agentic Poster LLM Gateway";
const MAX_BODY_SIZE: usize = 1024 * 1024;
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Context line placed before the caller's prompt.
pub fn platform_context(platform: &str) -> &'static str {
    match platform {
        "twitter" => "Create a concise, engaging tweet (max 280 characters)",
        "linkedin" => "Create a professional LinkedIn post (max 3000 characters)",
        "facebook" => "Create a friendly, engaging Facebook post",
        _ => "",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub service: String,
    pub version: String,
    pub providers: Vec<ProviderId>,
}

pub struct GatewayState {
    llm: LlmClient,
    configured: Vec<ProviderId>,
    disabled: Vec<ProviderId>,
}

impl GatewayState {
    /// `llm` must contain exactly the enabled providers.
    pub fn new(llm: LlmClient, disabled: Vec<ProviderId>) -> Self {
        let mut configured = llm.providers();
        configured.extend(disabled.iter().copied());
        Self {
            llm,
            configured,
            disabled,
        }
    }

    /// Build direct agents for `[gateway].priority`.
    ///
    /// Providers whose agent cannot be built (usually a missing API key) are
    /// disabled. Fails only when no provider is left.
    pub fn from_config(config: &PosterConfig, http: reqwest::Client) -> Result<Self, LlmError> {
        let client = Arc::new(http);
        let mut agents = Vec::new();
        let mut disabled = Vec::new();

        for provider in config.gateway.priority.as_slice() {
            match create_direct_agent(
                *provider,
                config.llm.providers.get(*provider),
                Arc::clone(&client),
                PROVIDER_TIMEOUT,
            ) {
                Ok(agent) => {
                    tracing::info!(provider = %provider, "provider enabled");
                    agents.push(agent);
                }
                Err(e) => {
                    tracing::info!(provider = %provider, reason = %e, "provider disabled");
                    disabled.push(*provider);
                }
            }
        }

        let enabled: Vec<ProviderId> = agents.iter().map(|a| a.provider()).collect();
        let priority = ProviderPriorityList::new(enabled).map_err(|_| {
            LlmError::Configuration("gateway has no usable provider".to_string())
        })?;

        let llm = agents
            .into_iter()
            .fold(
                LlmClient::builder(priority)
                    .auto_fallback(true)
                    .order(FallbackOrder::PreferredFirst),
                |b, agent| b.agent(agent),
            )
            .build()?;

        Ok(Self::new(llm, disabled))
    }

    pub fn enabled(&self) -> Vec<ProviderId> {
        self.llm.providers()
    }

    pub fn disabled(&self) -> &[ProviderId] {
        &self.disabled
    }

    /// Turn a wire request into a client request, applying defaults.
    ///
    /// A preferred provider without an enabled agent is ignored so the
    /// priority order applies.
    pub fn prepare(&self, body: GenerateBody) -> Result<GenerationRequest, ApiError> {
        let provider = body.provider_id()?.filter(|id| {
            let enabled = self.llm.priority().contains(*id);
            if !enabled {
                tracing::debug!(provider = %id, "preferred provider unavailable");
            }
            enabled
        });

        let platform = body.platform.unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
        let prompt = format!("{}\n\n{}", platform_context(&platform), body.prompt);

        let mut request = GenerationRequest::new(prompt)
            .with_max_tokens(body.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS))
            .with_temperature(body.temperature.unwrap_or(DEFAULT_TEMPERATURE))
            .with_platform(platform);
        request.provider = provider;
        Ok(request)
    }
}

pub fn create_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/health", get(health))
        .route("/", get(info))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .with_state(state)
}

async fn generate(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerationResult>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt cannot be empty"));
    }
    let request = state.prepare(body)?;

    match state.llm.generate(&request).await {
        Ok(result) => Ok(Json(result)),
        Err(LlmError::GenerationFailed { source, .. }) => Err(ApiError::service_unavailable(
            format!("All LLM providers failed. Last error: {}", source),
        )),
        Err(e) => Err(e.into()),
    }
}

async fn health(State(state): State<Arc<GatewayState>>) -> Json<GatewayHealth> {
    let mut health = state.llm.check_health().await;
    for provider in state.disabled() {
        health.providers.insert(provider.to_string(), false);
    }
    Json(health)
}

async fn info(State(state): State<Arc<GatewayState>>) -> Json<GatewayInfo> {
    Json(GatewayInfo {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: state.configured.clone(),
    })
}
