//! Multi-provider generation client with ordered fallback.

use super::agent::{create_direct_agent, create_gateway_agent, GatewayClient, ProviderAgent};
use super::error::{LlmError, TransportError};
use super::provider::{ProviderId, ProviderPriorityList};
use super::types::{ConnectionTest, GatewayHealth, GenerationRequest, GenerationResult};
use crate::config::{LlmConfig, LlmMode};
use crate::metrics::{self, AttemptOutcome};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Prompt used by [`LlmClient::test_connection`].
pub const CONNECTION_TEST_PROMPT: &str = "Say \"OK\" if you can read this.";

/// Order in which the fallback chain visits providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackOrder {
    /// Effective provider, then its successors in the priority list.
    #[default]
    Forward,
    /// Effective provider, then every other provider in priority order.
    PreferredFirst,
}

/// Generates content through a set of provider agents.
///
/// Cheap to clone; clones share agents and configuration.
#[derive(Clone)]
pub struct LlmClient {
    agents: Arc<HashMap<ProviderId, Arc<dyn ProviderAgent>>>,
    priority: Arc<ProviderPriorityList>,
    auto_fallback: bool,
    order: FallbackOrder,
    gateway: Option<Arc<GatewayClient>>,
}

pub struct LlmClientBuilder {
    agents: HashMap<ProviderId, Arc<dyn ProviderAgent>>,
    priority: ProviderPriorityList,
    auto_fallback: bool,
    order: FallbackOrder,
    gateway: Option<Arc<GatewayClient>>,
}

impl LlmClientBuilder {
    pub fn agent(mut self, agent: Arc<dyn ProviderAgent>) -> Self {
        self.agents.insert(agent.provider(), agent);
        self
    }

    pub fn auto_fallback(mut self, enabled: bool) -> Self {
        self.auto_fallback = enabled;
        self
    }

    pub fn order(mut self, order: FallbackOrder) -> Self {
        self.order = order;
        self
    }

    /// Gateway consulted by [`LlmClient::check_health`].
    pub fn gateway(mut self, gateway: Arc<GatewayClient>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Fails when a provider in the priority list has no agent.
    pub fn build(self) -> Result<LlmClient, LlmError> {
        if let Some(missing) = self
            .priority
            .as_slice()
            .iter()
            .find(|p| !self.agents.contains_key(p))
        {
            return Err(LlmError::UnsupportedProvider(missing.to_string()));
        }

        Ok(LlmClient {
            agents: Arc::new(self.agents),
            priority: Arc::new(self.priority),
            auto_fallback: self.auto_fallback,
            order: self.order,
            gateway: self.gateway,
        })
    }
}

impl LlmClient {
    pub fn builder(priority: ProviderPriorityList) -> LlmClientBuilder {
        LlmClientBuilder {
            agents: HashMap::new(),
            priority,
            auto_fallback: true,
            order: FallbackOrder::Forward,
            gateway: None,
        }
    }

    /// Build a client from `[llm]` configuration.
    ///
    /// In gateway mode every provider in the priority list is reached through
    /// the gateway. In direct mode providers whose API key cannot be resolved
    /// are dropped from the priority list with a warning.
    pub fn from_config(config: &LlmConfig, http: reqwest::Client) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(config.request_timeout_seconds);

        match config.mode {
            LlmMode::Gateway => {
                let gateway = Arc::new(GatewayClient::new(
                    config.gateway_url.clone(),
                    http,
                    timeout,
                ));
                let mut builder = Self::builder(config.priority.clone())
                    .auto_fallback(config.auto_fallback)
                    .gateway(Arc::clone(&gateway));
                for provider in config.priority.as_slice() {
                    builder = builder.agent(create_gateway_agent(*provider, Arc::clone(&gateway)));
                }
                builder.build()
            }
            LlmMode::Direct => {
                let client = Arc::new(http);
                let mut agents = Vec::new();
                for provider in config.priority.as_slice() {
                    match create_direct_agent(
                        *provider,
                        config.providers.get(*provider),
                        Arc::clone(&client),
                        timeout,
                    ) {
                        Ok(agent) => agents.push(agent),
                        Err(e) => {
                            tracing::warn!(provider = %provider, error = %e, "provider disabled");
                        }
                    }
                }

                let enabled: Vec<ProviderId> = agents.iter().map(|a| a.provider()).collect();
                let priority = ProviderPriorityList::new(enabled).map_err(|_| {
                    LlmError::Configuration(
                        "no LLM provider could be configured; set at least one API key".to_string(),
                    )
                })?;

                agents
                    .into_iter()
                    .fold(
                        Self::builder(priority).auto_fallback(config.auto_fallback),
                        |b, agent| b.agent(agent),
                    )
                    .build()
            }
        }
    }

    pub fn priority(&self) -> &ProviderPriorityList {
        &self.priority
    }

    pub fn auto_fallback(&self) -> bool {
        self.auto_fallback
    }

    /// Providers with a registered agent, in priority order.
    pub fn providers(&self) -> Vec<ProviderId> {
        self.priority.as_slice().to_vec()
    }

    /// Providers to attempt for a request whose effective provider is `start`.
    pub fn fallback_chain(&self, start: ProviderId) -> Vec<ProviderId> {
        if !self.auto_fallback {
            return vec![start];
        }
        match self.order {
            FallbackOrder::Forward => self.priority.chain_from(start),
            FallbackOrder::PreferredFirst => self.priority.preferred_first(start),
        }
    }

    /// Generate content, walking the fallback chain on transport failure.
    ///
    /// Attempts are strictly sequential and each provider is tried at most
    /// once. Intermediate failures are logged; the caller sees only the last.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, LlmError> {
        request.validate()?;

        let effective = request.provider.unwrap_or_else(|| self.priority.head());
        if !self.agents.contains_key(&effective) {
            return Err(LlmError::UnsupportedProvider(effective.to_string()));
        }

        let chain = self.fallback_chain(effective);
        tracing::debug!(
            provider = %effective,
            chain_len = chain.len(),
            prompt = %crate::logging::truncate_prompt(&request.prompt),
            "generating"
        );
        let mut last_failure: Option<(ProviderId, TransportError)> = None;

        for (attempt, provider) in chain.iter().copied().enumerate() {
            let Some(agent) = self.agents.get(&provider) else {
                continue;
            };

            let mut attempt_request = request.clone();
            attempt_request.provider = Some(provider);

            let started = Instant::now();
            match agent.generate(&attempt_request).await {
                Ok(result) => {
                    metrics::record_attempt(
                        provider.as_str(),
                        AttemptOutcome::Success,
                        started.elapsed(),
                    );
                    if attempt > 0 {
                        metrics::record_fallback(effective.as_str(), provider.as_str());
                        tracing::info!(
                            requested = %effective,
                            provider = %provider,
                            attempt,
                            "generation succeeded after fallback"
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    metrics::record_attempt(
                        provider.as_str(),
                        AttemptOutcome::Failure,
                        started.elapsed(),
                    );
                    tracing::warn!(
                        provider = %provider,
                        attempt,
                        latency_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "provider failed"
                    );
                    last_failure = Some((provider, e));
                }
            }
        }

        let (provider, source) = last_failure.unwrap_or((
            effective,
            TransportError::Network("no provider attempted".to_string()),
        ));
        Err(LlmError::GenerationFailed { provider, source })
    }

    /// Send a minimal prompt to `provider` only and time it. Never fails.
    pub async fn test_connection(&self, provider: &str) -> ConnectionTest {
        let started = Instant::now();

        let outcome = match provider.parse::<ProviderId>() {
            Ok(id) => match self.agents.get(&id) {
                Some(agent) => {
                    let request = GenerationRequest::new(CONNECTION_TEST_PROMPT)
                        .with_provider(id)
                        .with_max_tokens(10);
                    agent.generate(&request).await.map(|_| ()).map_err(|e| e.to_string())
                }
                None => Err(LlmError::UnsupportedProvider(id.to_string()).to_string()),
            },
            Err(e) => Err(e.to_string()),
        };

        let response_time_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(()) => ConnectionTest {
                success: true,
                response_time_ms,
                error: None,
            },
            Err(error) => {
                tracing::debug!(provider, error = %error, "connection test failed");
                ConnectionTest {
                    success: false,
                    response_time_ms,
                    error: Some(error),
                }
            }
        }
    }

    /// Gateway health, or per-provider health in direct mode. Never fails.
    pub async fn check_health(&self) -> GatewayHealth {
        if let Some(ref gateway) = self.gateway {
            return match gateway.health().await {
                Ok(health) => health,
                Err(e) => {
                    tracing::debug!(error = %e, "gateway health check failed");
                    GatewayHealth::disconnected()
                }
            };
        }

        let checks = self.agents.values().map(|agent| async move {
            let ok = agent.health_check().await.unwrap_or(false);
            (agent.provider().to_string(), ok)
        });
        let providers: BTreeMap<String, bool> =
            futures::future::join_all(checks).await.into_iter().collect();

        let status = if providers.values().any(|ok| *ok) {
            "healthy"
        } else {
            "degraded"
        };
        GatewayHealth {
            status: status.to_string(),
            providers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Usage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted agent that records every request it sees.
    struct ScriptedAgent {
        provider: ProviderId,
        reply: Result<String, TransportError>,
        seen: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    #[async_trait]
    impl ProviderAgent for ScriptedAgent {
        fn provider(&self) -> ProviderId {
            self.provider
        }

        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResult, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone().map(|content| GenerationResult {
                content,
                provider: self.provider,
                model: None,
                usage: Some(Usage::default()),
            })
        }

        async fn health_check(&self) -> Result<bool, TransportError> {
            Ok(self.reply.is_ok())
        }
    }

    type Log = Arc<Mutex<Vec<GenerationRequest>>>;

    fn scripted(provider: ProviderId, reply: Result<&str, TransportError>, log: &Log) -> Arc<dyn ProviderAgent> {
        Arc::new(ScriptedAgent {
            provider,
            reply: reply.map(str::to_string),
            seen: Arc::clone(log),
        })
    }

    fn failing(status: u16) -> Result<&'static str, TransportError> {
        Err(TransportError::Upstream {
            status,
            message: "boom".to_string(),
        })
    }

    fn client(providers: &[(ProviderId, Result<&str, TransportError>)], log: &Log) -> LlmClient {
        let priority =
            ProviderPriorityList::new(providers.iter().map(|(p, _)| *p).collect()).unwrap();
        providers
            .iter()
            .fold(LlmClient::builder(priority), |b, (p, reply)| {
                b.agent(scripted(*p, reply.clone(), log))
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_falls_back_to_second_provider() {
        let log = Log::default();
        let client = client(
            &[
                (ProviderId::Groq, failing(500)),
                (ProviderId::Gemini, Ok("Hi there")),
            ],
            &log,
        );

        let result = client.generate(&GenerationRequest::new("hello")).await.unwrap();

        assert_eq!(result.content, "Hi there");
        assert_eq!(result.provider, ProviderId::Gemini);

        let seen = log.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].provider, Some(ProviderId::Groq));
        assert_eq!(seen[1].provider, Some(ProviderId::Gemini));
    }

    #[tokio::test]
    async fn test_fallback_preserves_request_fields() {
        let log = Log::default();
        let client = client(
            &[
                (ProviderId::Groq, failing(502)),
                (ProviderId::OpenRouter, Ok("ok")),
            ],
            &log,
        );
        let request = GenerationRequest::new("write a tweet")
            .with_max_tokens(100)
            .with_temperature(0.8)
            .with_platform("twitter");

        client.generate(&request).await.unwrap();

        let seen = log.lock().unwrap();
        let mut first = seen[0].clone();
        let mut second = seen[1].clone();
        first.provider = None;
        second.provider = None;
        assert_eq!(first, second);
        assert_eq!(second.platform.as_deref(), Some("twitter"));
    }

    #[tokio::test]
    async fn test_all_fail_names_last_provider() {
        let log = Log::default();
        let client = client(
            &[
                (ProviderId::Groq, failing(500)),
                (ProviderId::Gemini, failing(503)),
                (ProviderId::LmStudio, failing(429)),
            ],
            &log,
        );

        let err = client.generate(&GenerationRequest::new("hello")).await.unwrap_err();

        match err {
            LlmError::GenerationFailed { provider, source } => {
                assert_eq!(provider, ProviderId::LmStudio);
                assert!(matches!(source, TransportError::Upstream { status: 429, .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_requested_provider_walks_forward_only() {
        let log = Log::default();
        let client = client(
            &[
                (ProviderId::Groq, Ok("never")),
                (ProviderId::Gemini, failing(500)),
                (ProviderId::OpenRouter, failing(500)),
            ],
            &log,
        );
        let request = GenerationRequest::new("hi").with_provider(ProviderId::Gemini);

        let err = client.generate(&request).await.unwrap_err();

        assert_eq!(err.provider(), Some(ProviderId::OpenRouter));
        let tried: Vec<_> = log.lock().unwrap().iter().map(|r| r.provider).collect();
        assert_eq!(tried, vec![Some(ProviderId::Gemini), Some(ProviderId::OpenRouter)]);
    }

    #[tokio::test]
    async fn test_fallback_disabled_stops_after_first() {
        let log = Log::default();
        let priority = ProviderPriorityList::new(vec![ProviderId::Groq, ProviderId::Gemini]).unwrap();
        let client = LlmClient::builder(priority)
            .agent(scripted(ProviderId::Groq, failing(500), &log))
            .agent(scripted(ProviderId::Gemini, Ok("unused"), &log))
            .auto_fallback(false)
            .build()
            .unwrap();

        let err = client.generate(&GenerationRequest::new("hi")).await.unwrap_err();

        assert_eq!(err.provider(), Some(ProviderId::Groq));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_preferred_first_visits_every_other_provider() {
        let log = Log::default();
        let priority = ProviderPriorityList::new(vec![
            ProviderId::LmStudio,
            ProviderId::Groq,
            ProviderId::Gemini,
        ])
        .unwrap();
        let client = LlmClient::builder(priority)
            .agent(scripted(ProviderId::LmStudio, Ok("local"), &log))
            .agent(scripted(ProviderId::Groq, failing(500), &log))
            .agent(scripted(ProviderId::Gemini, failing(500), &log))
            .order(FallbackOrder::PreferredFirst)
            .build()
            .unwrap();

        let result = client
            .generate(&GenerationRequest::new("hi").with_provider(ProviderId::Gemini))
            .await
            .unwrap();

        assert_eq!(result.provider, ProviderId::LmStudio);
    }

    #[tokio::test]
    async fn test_unregistered_provider_is_unsupported() {
        let log = Log::default();
        let client = client(&[(ProviderId::Groq, Ok("x"))], &log);

        let err = client
            .generate(&GenerationRequest::new("hi").with_provider(ProviderId::Gemini))
            .await
            .unwrap_err();

        assert_eq!(err, LlmError::UnsupportedProvider("gemini".to_string()));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_network() {
        let log = Log::default();
        let client = client(&[(ProviderId::Groq, Ok("x"))], &log);

        let err = client.generate(&GenerationRequest::new("   ")).await.unwrap_err();

        assert!(matches!(err, LlmError::InvalidRequest(_)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_build_requires_agent_for_every_priority_entry() {
        let log = Log::default();
        let priority = ProviderPriorityList::new(vec![ProviderId::Groq, ProviderId::Gemini]).unwrap();
        let result = LlmClient::builder(priority)
            .agent(scripted(ProviderId::Groq, Ok("x"), &log))
            .build();

        assert!(matches!(result, Err(LlmError::UnsupportedProvider(ref p)) if p == "gemini"));
    }

    #[tokio::test]
    async fn test_connection_success_and_failure() {
        let log = Log::default();
        let client = client(
            &[
                (ProviderId::Groq, Ok("OK")),
                (ProviderId::Gemini, failing(401)),
            ],
            &log,
        );

        let ok = client.test_connection("groq").await;
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = client.test_connection("gemini").await;
        assert!(!failed.success);
        assert!(failed.error.unwrap().contains("401"));

        // no fallback from gemini to anyone else
        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(log.lock().unwrap()[0].max_tokens, Some(10));
    }

    #[tokio::test]
    async fn test_connection_unknown_provider_reports_error() {
        let log = Log::default();
        let client = client(&[(ProviderId::Groq, Ok("OK"))], &log);

        let result = client.test_connection("anthropic").await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unsupported provider: anthropic"));
    }

    #[tokio::test]
    async fn test_direct_health_aggregates_agents() {
        let log = Log::default();
        let client = client(
            &[
                (ProviderId::Groq, failing(500)),
                (ProviderId::LmStudio, Ok("x")),
            ],
            &log,
        );

        let health = client.check_health().await;

        assert_eq!(health.status, "healthy");
        assert_eq!(health.providers.get("groq"), Some(&false));
        assert_eq!(health.providers.get("lmstudio"), Some(&true));
    }

    #[tokio::test]
    async fn test_gateway_health_unreachable_is_disconnected() {
        let config = LlmConfig {
            gateway_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = LlmClient::from_config(&config, reqwest::Client::new()).unwrap();

        assert_eq!(client.check_health().await, GatewayHealth::disconnected());
    }

    #[test]
    fn test_direct_mode_drops_providers_without_keys() {
        let mut config = LlmConfig {
            mode: LlmMode::Direct,
            priority: ProviderPriorityList::new(vec![ProviderId::OpenRouter, ProviderId::LmStudio])
                .unwrap(),
            ..Default::default()
        };
        config.providers.openrouter.api_key_env = Some("POSTER_TEST_NO_SUCH_KEY".to_string());

        let client = LlmClient::from_config(&config, reqwest::Client::new()).unwrap();

        assert_eq!(client.providers(), vec![ProviderId::LmStudio]);
    }
}
