//! Shared test utilities for poster integration tests.
//!
//! Provides provider agents pointed at mock HTTP servers, a WebSocket
//! service host that can push, close or drop connections on demand, and a
//! listener that accepts TCP but never answers.

#![allow(dead_code)]

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Json, Router,
};
use poster::llm::agent::{GeminiAgent, OpenAiCompatAgent, ProviderAgent};
use poster::llm::{LlmClient, ProviderId, ProviderPriorityList};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

// =============================================================================
// Provider agents
// =============================================================================

pub const AGENT_TIMEOUT: Duration = Duration::from_secs(5);

/// OpenAI-compatible agent (Groq, OpenRouter, LM Studio) at `base_url`.
pub fn openai_agent(provider: ProviderId, base_url: &str) -> Arc<dyn ProviderAgent> {
    Arc::new(OpenAiCompatAgent::new(
        provider,
        base_url.to_string(),
        Some("test-key".to_string()),
        "test-model".to_string(),
        Arc::new(reqwest::Client::new()),
        AGENT_TIMEOUT,
    ))
}

pub fn gemini_agent(base_url: &str) -> Arc<dyn ProviderAgent> {
    Arc::new(GeminiAgent::new(
        base_url.to_string(),
        "test-key".to_string(),
        "gemini-pro".to_string(),
        Arc::new(reqwest::Client::new()),
        AGENT_TIMEOUT,
    ))
}

/// Direct-mode client over `agents`, prioritized in the given order.
pub fn client_with(agents: Vec<Arc<dyn ProviderAgent>>) -> LlmClient {
    let priority =
        ProviderPriorityList::new(agents.iter().map(|a| a.provider()).collect()).unwrap();
    agents
        .into_iter()
        .fold(LlmClient::builder(priority), |b, agent| b.agent(agent))
        .build()
        .unwrap()
}

pub fn chat_completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "model": "test-model",
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
    })
}

pub fn gemini_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}],
        "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 3, "totalTokenCount": 8}
    })
}

// =============================================================================
// WebSocket service host
// =============================================================================

#[derive(Debug, Clone)]
pub enum HostCommand {
    Send(String),
    /// Close with a close frame
    Close,
    /// Drop the socket without a close frame
    Drop,
}

struct HostState {
    commands: broadcast::Sender<HostCommand>,
    received: Mutex<Vec<String>>,
    open: AtomicUsize,
    debugger_url: Mutex<String>,
    upgrade_delay: Duration,
}

/// Axum server answering every service WebSocket path, `/json/version` for
/// browser discovery, and `/health` for HTTP probes.
pub struct MockServiceHost {
    pub endpoint: String,
    state: Arc<HostState>,
}

impl MockServiceHost {
    pub async fn start() -> Self {
        Self::with_upgrade_delay(Duration::ZERO).await
    }

    /// Host whose WebSocket handlers wait `delay` before accepting, so a
    /// handshake stays in flight for that long.
    pub async fn with_upgrade_delay(delay: Duration) -> Self {
        let (commands, _) = broadcast::channel(64);
        let state = Arc::new(HostState {
            commands,
            received: Mutex::new(Vec::new()),
            open: AtomicUsize::new(0),
            debugger_url: Mutex::new(String::new()),
            upgrade_delay: delay,
        });

        let app = Router::new()
            .route("/ws", get(ws_handler))
            .route("/ws/analytics", get(ws_handler))
            .route("/ws/social", get(ws_handler))
            .route("/ws/activity", get(ws_handler))
            .route("/devtools/browser/test", get(ws_handler))
            .route("/json/version", get(json_version))
            .route("/health", get(|| async { "ok" }))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        *state.debugger_url.lock().unwrap() = format!("ws://{}/devtools/browser/test", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoint: format!("http://{}", addr),
            state,
        }
    }

    /// Push a text frame to every open socket.
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.state.commands.send(HostCommand::Send(frame.into()));
    }

    pub fn close_all(&self) {
        let _ = self.state.commands.send(HostCommand::Close);
    }

    pub fn drop_all(&self) {
        let _ = self.state.commands.send(HostCommand::Drop);
    }

    pub fn received(&self) -> Vec<String> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn open_sockets(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Wait until `n` sockets are open and listening for commands.
    pub async fn wait_for_sockets(&self, n: usize) {
        wait_until(|| self.open_sockets() >= n).await;
    }

    /// Wait until at least `n` frames were received from clients.
    pub async fn wait_for_frames(&self, n: usize) {
        wait_until(|| self.received().len() >= n).await;
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<HostState>>) -> Response {
    tokio::time::sleep(state.upgrade_delay).await;
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: Arc<HostState>) {
    let mut commands = state.commands.subscribe();
    state.open.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Ok(HostCommand::Send(text)) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(HostCommand::Close) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Ok(HostCommand::Drop) | Err(_) => break,
            },
            message = socket.recv() => match message {
                Some(Ok(Message::Text(text))) => state.received.lock().unwrap().push(text),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.open.fetch_sub(1, Ordering::SeqCst);
}

async fn json_version(State(state): State<Arc<HostState>>) -> Json<serde_json::Value> {
    let url = state.debugger_url.lock().unwrap().clone();
    Json(serde_json::json!({
        "Browser": "HeadlessChrome/120.0",
        "webSocketDebuggerUrl": url,
    }))
}

// =============================================================================
// Misc
// =============================================================================

/// Accepts TCP connections and holds them open without ever responding, so
/// any handshake against it hangs until the caller's timeout.
pub async fn start_stalled_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{}", addr)
}

/// Poll `condition` every 10ms for up to 5 seconds.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
