//! WebSocket handler for live dashboard updates

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::api::AppState;
use crate::services::{ServiceEvent, ServiceMessage, StatusMap};

/// Frames larger than this are dropped rather than sent truncated.
const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Message pushed to dashboard clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketUpdate {
    pub update_type: UpdateType,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// Full status map, sent once on connect
    StatusSnapshot,
    /// One service changed state
    ServiceStatus,
    Activity,
    /// Any other decoded service frame
    ServiceMessage,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the snapshot so no transition falls in between.
    let mut rx = state.services.subscribe_all();
    let snapshot = create_snapshot_update(&state.services.status());

    let send_task = tokio::spawn(async move {
        if !send_update(&mut sender, &snapshot).await {
            return;
        }
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "dashboard socket lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if !send_update(&mut sender, &create_event_update(&event)).await {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }
}

/// Returns false once the client is gone.
async fn send_update<S>(sender: &mut S, update: &WebSocketUpdate) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(update) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize dashboard update");
            return true;
        }
    };

    if json.len() > MAX_FRAME_BYTES {
        tracing::warn!(bytes = json.len(), "dashboard update too large, skipped");
        return true;
    }

    sender.send(Message::Text(json)).await.is_ok()
}

pub fn create_snapshot_update(status: &StatusMap) -> WebSocketUpdate {
    WebSocketUpdate {
        update_type: UpdateType::StatusSnapshot,
        data: serde_json::to_value(status).unwrap_or(serde_json::Value::Null),
    }
}

pub fn create_event_update(event: &ServiceEvent) -> WebSocketUpdate {
    let (update_type, data) = match event {
        ServiceEvent::Status(status) => (UpdateType::ServiceStatus, serde_json::to_value(status)),
        ServiceEvent::Message {
            message: ServiceMessage::Activity { event },
            ..
        } => (UpdateType::Activity, serde_json::to_value(event)),
        ServiceEvent::Message { service, message } => (
            UpdateType::ServiceMessage,
            Ok(serde_json::json!({
                "service": service,
                "message": message,
            })),
        ),
    };

    WebSocketUpdate {
        update_type,
        data: data.unwrap_or(serde_json::Value::Null),
    }
}
