//! Fallback chain behaviour against mock provider APIs.

mod common;

use common::{chat_completion_body, client_with, gemini_agent, gemini_body, openai_agent};
use poster::config::{LlmConfig, LlmMode};
use poster::llm::agent::{OpenAiCompatAgent, ProviderAgent};
use poster::llm::{
    GenerationRequest, LlmClient, LlmError, ProviderId, ProviderPriorityList, TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn failing_openai(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;
    server
}

async fn gemini_replying(text: &str, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(text)))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

fn request_json(server_requests: &[wiremock::Request]) -> serde_json::Value {
    assert_eq!(server_requests.len(), 1);
    serde_json::from_slice(&server_requests[0].body).unwrap()
}

#[tokio::test]
async fn test_groq_failure_falls_back_to_gemini() {
    let groq = failing_openai(500).await;
    let gemini = gemini_replying("Hi there", 1).await;

    let client = client_with(vec![
        openai_agent(ProviderId::Groq, &groq.uri()),
        gemini_agent(&gemini.uri()),
    ]);

    let request = GenerationRequest::new("Say hi")
        .with_max_tokens(120)
        .with_temperature(0.4);
    let result = client.generate(&request).await.unwrap();

    assert_eq!(result.content, "Hi there");
    assert_eq!(result.provider, ProviderId::Gemini);
    assert_eq!(result.usage.map(|u| u.total_tokens), Some(8));
}

#[tokio::test]
async fn test_fallback_forwards_identical_payload() {
    let groq = failing_openai(503).await;
    let gemini = gemini_replying("ok", 1).await;

    let client = client_with(vec![
        openai_agent(ProviderId::Groq, &groq.uri()),
        gemini_agent(&gemini.uri()),
    ]);

    let request = GenerationRequest::new("Write about ownership")
        .with_max_tokens(77)
        .with_temperature(0.3);
    client.generate(&request).await.unwrap();

    let groq_body = request_json(&groq.received_requests().await.unwrap());
    let gemini_body = request_json(&gemini.received_requests().await.unwrap());

    assert_eq!(groq_body["messages"][0]["content"], "Write about ownership");
    assert_eq!(groq_body["max_tokens"], 77);
    assert_eq!(
        gemini_body["contents"][0]["parts"][0]["text"],
        "Write about ownership"
    );
    assert_eq!(gemini_body["generationConfig"]["maxOutputTokens"], 77);

    let groq_temp = groq_body["temperature"].as_f64().unwrap();
    let gemini_temp = gemini_body["generationConfig"]["temperature"].as_f64().unwrap();
    assert!((groq_temp - gemini_temp).abs() < 1e-6);
}

#[tokio::test]
async fn test_all_providers_fail_reports_last() {
    let groq = failing_openai(500).await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .expect(1)
        .mount(&gemini)
        .await;

    let client = client_with(vec![
        openai_agent(ProviderId::Groq, &groq.uri()),
        gemini_agent(&gemini.uri()),
    ]);

    let err = client
        .generate(&GenerationRequest::new("hello"))
        .await
        .unwrap_err();

    match err {
        LlmError::GenerationFailed { provider, source } => {
            assert_eq!(provider, ProviderId::Gemini);
            assert!(matches!(source, TransportError::Upstream { status: 429, .. }));
        }
        other => panic!("expected GenerationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_explicit_provider_walks_forward_only() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("groq")))
        .expect(0)
        .mount(&groq)
        .await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&gemini)
        .await;
    let openrouter = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body("routed")))
        .expect(1)
        .mount(&openrouter)
        .await;

    let client = client_with(vec![
        openai_agent(ProviderId::Groq, &groq.uri()),
        gemini_agent(&gemini.uri()),
        openai_agent(ProviderId::OpenRouter, &openrouter.uri()),
    ]);

    let result = client
        .generate(&GenerationRequest::new("hi").with_provider(ProviderId::Gemini))
        .await
        .unwrap();

    assert_eq!(result.provider, ProviderId::OpenRouter);
    assert_eq!(result.content, "routed");
}

#[tokio::test]
async fn test_timeout_counts_as_transport_failure() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion_body("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&groq)
        .await;
    let gemini = gemini_replying("on time", 1).await;

    let slow_groq: Arc<dyn ProviderAgent> = Arc::new(OpenAiCompatAgent::new(
        ProviderId::Groq,
        groq.uri(),
        Some("key".to_string()),
        "m".to_string(),
        Arc::new(reqwest::Client::new()),
        Duration::from_millis(200),
    ));
    let client = client_with(vec![slow_groq, gemini_agent(&gemini.uri())]);

    let result = client.generate(&GenerationRequest::new("hi")).await.unwrap();
    assert_eq!(result.provider, ProviderId::Gemini);
}

#[tokio::test]
async fn test_gateway_mode_posts_snake_case_body() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "from gateway",
            "provider": "groq",
            "model": "llama"
        })))
        .expect(1)
        .mount(&gateway)
        .await;

    let config = LlmConfig {
        mode: LlmMode::Gateway,
        gateway_url: gateway.uri(),
        priority: ProviderPriorityList::new(vec![ProviderId::Groq, ProviderId::Gemini]).unwrap(),
        ..LlmConfig::default()
    };
    let client = LlmClient::from_config(&config, reqwest::Client::new()).unwrap();

    let result = client
        .generate(
            &GenerationRequest::new("hello")
                .with_max_tokens(42)
                .with_platform("twitter"),
        )
        .await
        .unwrap();
    assert_eq!(result.content, "from gateway");

    let body = request_json(&gateway.received_requests().await.unwrap());
    assert_eq!(body["prompt"], "hello");
    assert_eq!(body["provider"], "groq");
    assert_eq!(body["max_tokens"], 42);
    assert_eq!(body["platform"], "twitter");
}

#[tokio::test]
async fn test_gateway_health_disconnected_when_unreachable() {
    let config = LlmConfig {
        mode: LlmMode::Gateway,
        gateway_url: "http://127.0.0.1:1".to_string(),
        ..LlmConfig::default()
    };
    let client = LlmClient::from_config(&config, reqwest::Client::new()).unwrap();

    let health = client.check_health().await;
    assert_eq!(health.status, "disconnected");
    assert!(health.providers.is_empty());
}

#[tokio::test]
async fn test_gateway_health_passthrough() {
    let gateway = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "providers": {"groq": true, "gemini": false}
        })))
        .mount(&gateway)
        .await;

    let config = LlmConfig {
        gateway_url: gateway.uri(),
        ..LlmConfig::default()
    };
    let client = LlmClient::from_config(&config, reqwest::Client::new()).unwrap();

    let health = client.check_health().await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.providers.get("groq"), Some(&true));
    assert_eq!(health.providers.get("gemini"), Some(&false));
}
