//! Handshakes and the per-connection socket task.

use super::error::ServiceError;
use super::message::{decode_frame, ServiceMessage};
use super::types::{ServiceDescriptor, ServiceId, TransportKind};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bound on the Chrome `/json/version` lookup, inside the connect timeout.
pub const CDP_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Result of a successful handshake.
pub enum Handshake {
    /// Live WebSocket to be driven by [`drive_socket`]
    Socket(Box<WsStream>),
    /// HTTP health probe succeeded; nothing to keep open
    Probed,
}

/// Perform the transport-specific handshake for `descriptor`.
///
/// Not bounded by itself; the caller wraps it in the connect timeout and
/// dropping the future closes any half-open socket.
pub async fn handshake(
    http: &reqwest::Client,
    descriptor: &ServiceDescriptor,
) -> Result<Handshake, ServiceError> {
    match descriptor.transport {
        TransportKind::Http => {
            probe_health(http, &descriptor.endpoint).await?;
            Ok(Handshake::Probed)
        }
        TransportKind::Ws => {
            let url = match descriptor.id.ws_path() {
                Some(path) => ws_url(&descriptor.endpoint, path)?,
                None => discover_debugger_url(http, &descriptor.endpoint).await?,
            };
            tracing::debug!(service = %descriptor.id, url = %url, "opening websocket");

            let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| ServiceError::Handshake {
                    service: descriptor.id,
                    message: e.to_string(),
                })?;
            Ok(Handshake::Socket(Box::new(stream)))
        }
    }
}

/// `http://host:port` + `/ws/x` -> `ws://host:port/ws/x` (https -> wss).
pub fn ws_url(endpoint: &str, path: &str) -> Result<String, ServiceError> {
    let invalid = |message: String| ServiceError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        message,
    };

    let mut url = reqwest::Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| invalid("cannot switch to websocket scheme".to_string()))?;

    Ok(format!("{}{}", url.as_str().trim_end_matches('/'), path))
}

#[derive(Deserialize)]
struct BrowserVersion {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Ask a Chrome debug endpoint for its browser WebSocket URL.
pub async fn discover_debugger_url(
    http: &reqwest::Client,
    endpoint: &str,
) -> Result<String, ServiceError> {
    let response = http
        .get(format!("{}/json/version", endpoint))
        .timeout(CDP_DISCOVERY_TIMEOUT)
        .send()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ServiceError::Http(response.status().as_u16()));
    }

    let version: BrowserVersion = response.json().await.map_err(|e| ServiceError::Handshake {
        service: ServiceId::Puppeteer,
        message: format!("invalid /json/version body: {}", e),
    })?;
    Ok(version.web_socket_debugger_url)
}

/// `GET {endpoint}/health`; any 2xx counts as reachable.
pub async fn probe_health(http: &reqwest::Client, endpoint: &str) -> Result<(), ServiceError> {
    let response = http
        .get(format!("{}/health", endpoint))
        .send()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(ServiceError::Http(response.status().as_u16()))
    }
}

/// Why a socket task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEnd {
    /// Transport error after the socket was open
    Failed(String),
    /// Peer closed or the stream ended
    Closed,
    /// Local disconnect
    Cancelled,
}

/// Own `stream` until it ends or `cancel` fires.
///
/// Text frames are decoded and handed to `on_message`; queued outbound frames
/// are written as text.
pub async fn drive_socket<F>(
    service: ServiceId,
    stream: WsStream,
    mut outbound: mpsc::Receiver<String>,
    cancel: CancellationToken,
    mut on_message: F,
) -> SocketEnd
where
    F: FnMut(ServiceMessage) + Send,
{
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return SocketEnd::Cancelled;
            }
            Some(text) = outbound.recv() => {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    return SocketEnd::Failed(e.to_string());
                }
            }
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(message) = decode_frame(service, &text) {
                        on_message(message);
                    }
                }
                Some(Ok(Message::Close(_))) | None => return SocketEnd::Closed,
                Some(Ok(_)) => {}
                Some(Err(e)) => return SocketEnd::Failed(e.to_string()),
            },
        }
    }
}
