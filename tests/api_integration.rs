//! Dashboard API handlers exercised through the router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{
    chat_completion_body, client_with, gemini_agent, gemini_body, openai_agent,
    start_stalled_listener, MockServiceHost,
};
use poster::api::{create_router, AppState};
use poster::config::PosterConfig;
use poster::llm::{LlmClient, ProviderId};
use poster::services::{ServiceDescriptor, ServiceId, ServiceManager, TransportKind};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

fn app(llm: LlmClient, services: ServiceManager) -> Router {
    let state = AppState::new(Arc::new(PosterConfig::default()), llm, services);
    create_router(Arc::new(state))
}

/// Groq always fails, Gemini answers with `text`.
async fn groq_down_gemini_up(text: &str) -> (LlmClient, MockServer, MockServer) {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&groq)
        .await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(text)))
        .mount(&gemini)
        .await;

    let client = client_with(vec![
        openai_agent(ProviderId::Groq, &groq.uri()),
        gemini_agent(&gemini.uri()),
    ]);
    (client, groq, gemini)
}

fn idle_llm() -> LlmClient {
    client_with(vec![openai_agent(ProviderId::Groq, "http://127.0.0.1:1")])
}

fn no_services() -> ServiceManager {
    ServiceManager::new(vec![], CONNECT_TIMEOUT)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Services
// =============================================================================

#[tokio::test]
async fn test_status_lists_every_configured_service() {
    let services = ServiceManager::new(
        ServiceId::ALL
            .into_iter()
            .map(|id| ServiceDescriptor::new(id, "http://127.0.0.1:1", TransportKind::Ws))
            .collect(),
        CONNECT_TIMEOUT,
    );

    let (status, body) = send(app(idle_llm(), services), get("/api/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["initializing"], false);
    assert!(body["started_at"].is_string());
    for id in ["mcp", "puppeteer", "analytics", "social", "activity"] {
        assert_eq!(body["services"][id], "disconnected", "{}", id);
    }
}

#[tokio::test]
async fn test_reconnect_unknown_service_is_404() {
    let (status, body) = send(
        app(idle_llm(), no_services()),
        post_empty("/api/services/telegram/reconnect"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_reconnect_unconfigured_service_is_404() {
    let (status, _) = send(
        app(idle_llm(), no_services()),
        post_empty("/api/services/social/reconnect"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reconnect_failure_reports_error_state() {
    let stalled = start_stalled_listener().await;
    let services = ServiceManager::new(
        vec![ServiceDescriptor::new(ServiceId::Social, stalled, TransportKind::Ws)],
        CONNECT_TIMEOUT,
    );

    let (status, body) = send(
        app(idle_llm(), services),
        post_empty("/api/services/social/reconnect"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["service_id"], "social");
    assert_eq!(body["state"], "error");
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_reconnect_then_disconnect() {
    let host = MockServiceHost::start().await;
    let services = ServiceManager::new(
        vec![ServiceDescriptor::new(
            ServiceId::Analytics,
            host.endpoint.clone(),
            TransportKind::Ws,
        )],
        CONNECT_TIMEOUT,
    );
    let router = app(idle_llm(), services.clone());

    let (status, body) = send(
        router.clone(),
        post_empty("/api/services/analytics/reconnect"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "connected");
    assert!(body.get("error").is_none());

    let (status, body) = send(router, post_empty("/api/services/analytics/disconnect")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service_id"], "analytics");
    assert_eq!(body["state"], "disconnected");
}

#[tokio::test]
async fn test_activity_endpoint_filters_buffer() {
    let host = MockServiceHost::start().await;
    let services = ServiceManager::new(
        vec![ServiceDescriptor::new(
            ServiceId::Activity,
            host.endpoint.clone(),
            TransportKind::Ws,
        )],
        CONNECT_TIMEOUT,
    );
    services.connect(ServiceId::Activity).await.unwrap();
    host.wait_for_sockets(1).await;

    for (id, category) in [("a", "llm"), ("b", "social"), ("c", "llm")] {
        host.push(
            json!({
                "type": "activity",
                "event": {
                    "id": id,
                    "timestamp": 1_700_000_000_000i64,
                    "type": "success",
                    "category": category,
                    "message": format!("event {}", id)
                }
            })
            .to_string(),
        );
    }
    common::wait_until(|| services.activity().len() == 3).await;

    let (status, body) = send(
        app(idle_llm(), services.clone()),
        get("/api/activity?category=llm&limit=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], "c");
    services.shutdown();
}

// =============================================================================
// Content
// =============================================================================

#[tokio::test]
async fn test_generate_falls_back() {
    let (llm, _groq, _gemini) = groq_down_gemini_up("Fallback works").await;

    let (status, body) = send(
        app(llm, no_services()),
        post_json("/api/generate", json!({"prompt": "hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Fallback works");
    assert_eq!(body["provider"], "gemini");
}

#[tokio::test]
async fn test_generate_unknown_provider_is_400() {
    let (status, body) = send(
        app(idle_llm(), no_services()),
        post_json("/api/generate", json!({"prompt": "hello", "provider": "claude"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "unsupported_provider");
    assert_eq!(body["error"]["param"], "provider");
}

#[tokio::test]
async fn test_generate_all_failed_is_502() {
    let (status, body) = send(
        app(idle_llm(), no_services()),
        post_json("/api/generate", json!({"prompt": "hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("groq"));
}

#[tokio::test]
async fn test_social_post_is_trimmed() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_completion_body("  Rust is fun #rust \n")),
        )
        .expect(1)
        .mount(&groq)
        .await;
    let llm = client_with(vec![openai_agent(ProviderId::Groq, &groq.uri())]);

    let (status, body) = send(
        app(llm, no_services()),
        post_json(
            "/api/generate/post",
            json!({"platform": "twitter", "topic": "Rust", "includeHashtags": true}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Rust is fun #rust");

    let sent: Value = serde_json::from_slice(&groq.received_requests().await.unwrap()[0].body).unwrap();
    assert_eq!(sent["max_tokens"], 100);
    let prompt = sent["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("social media post for twitter.\n\nTopic: Rust"));
}

#[tokio::test]
async fn test_ideas_parses_numbered_lines() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body(
            "Here you go:\n1. First idea\n2.Second idea\nnot numbered\n3. Third",
        )))
        .mount(&groq)
        .await;
    let llm = client_with(vec![openai_agent(ProviderId::Groq, &groq.uri())]);

    let (status, body) = send(
        app(llm, no_services()),
        post_json("/api/ideas", json!({"count": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["ideas"],
        json!(["First idea", "Second idea", "Third"])
    );
}

#[tokio::test]
async fn test_ideas_zero_count_is_400() {
    let (status, _) = send(
        app(idle_llm(), no_services()),
        post_json("/api/ideas", json!({"count": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_test_reports_failure_without_fallback() {
    let (llm, _groq, gemini) = groq_down_gemini_up("unused").await;

    let (status, body) = send(app(llm, no_services()), post_empty("/api/providers/groq/test")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("500"));
    assert!(gemini.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_test_unknown_provider() {
    let (status, body) = send(
        app(idle_llm(), no_services()),
        post_empty("/api/providers/claude/test"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("claude"));
}

#[tokio::test]
async fn test_llm_health_direct_mode() {
    let (status, body) = send(app(idle_llm(), no_services()), get("/api/llm/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["providers"]["groq"], false);
}

#[tokio::test]
async fn test_metrics_endpoint_is_prometheus_text() {
    let response = app(idle_llm(), no_services())
        .oneshot(get("/metrics"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let huge = "x".repeat(PosterConfig::default().server.max_body_bytes + 1);

    let response = app(idle_llm(), no_services())
        .oneshot(post_json("/api/generate", json!({"prompt": huge})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
