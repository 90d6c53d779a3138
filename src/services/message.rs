//! Inbound and outbound WebSocket frames.

use super::types::ServiceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of an activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Llm,
    Browser,
    Social,
    System,
    Mcp,
}

/// One entry of the activity stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub level: ActivityLevel,
    pub category: ActivityCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Decoded inbound frame, keyed by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceMessage {
    Activity {
        event: ActivityEvent,
    },
    MetricsUpdate {
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    PostStatus {
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    ToolResult {
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    WorkflowProgress {
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    /// Server-side connection notice
    Connection {
        status: String,
    },
    /// CDP event from the browser
    DevTools {
        method: String,
        #[serde(default)]
        params: Value,
    },
    /// CDP command response
    DevToolsResult {
        id: u64,
        #[serde(default)]
        result: Value,
    },
}

/// Raw CDP frame: an event carries `method`, a response carries `id`.
#[derive(Deserialize)]
struct CdpFrame {
    id: Option<u64>,
    method: Option<String>,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    result: Value,
}

const KNOWN_TYPES: [&str; 6] = [
    "activity",
    "metrics_update",
    "post_status",
    "tool_result",
    "workflow_progress",
    "connection",
];

/// Decode a text frame from `service`.
///
/// Unknown message types are dropped at debug level and malformed frames at
/// warn level; neither is an error for the connection.
pub fn decode_frame(service: ServiceId, text: &str) -> Option<ServiceMessage> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(service = %service, error = %e, "malformed frame");
            return None;
        }
    };

    if service == ServiceId::Puppeteer {
        return decode_cdp(value);
    }

    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        tracing::debug!(service = %service, "frame without type ignored");
        return None;
    };
    if !KNOWN_TYPES.contains(&kind) {
        tracing::debug!(service = %service, message_type = kind, "unknown message type ignored");
        return None;
    }

    match serde_json::from_value(value) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!(service = %service, error = %e, "invalid message payload");
            None
        }
    }
}

fn decode_cdp(value: Value) -> Option<ServiceMessage> {
    let frame: CdpFrame = serde_json::from_value(value).ok()?;
    match (frame.method, frame.id) {
        (Some(method), _) => Some(ServiceMessage::DevTools {
            method,
            params: frame.params,
        }),
        (None, Some(id)) => Some(ServiceMessage::DevToolsResult {
            id,
            result: frame.result,
        }),
        (None, None) => None,
    }
}

/// Outbound frame, serialized as `{type, ...data}`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub kind: String,
    pub data: Map<String, Value>,
}

impl OutboundMessage {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn to_json(&self) -> String {
        let mut object = self.data.clone();
        object.insert("type".to_string(), Value::String(self.kind.clone()));
        Value::Object(object).to_string()
    }
}
