//! Service identifiers, descriptors and connection state.

use super::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the five backend services the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    /// Tool-orchestration (MCP) server
    Mcp,
    /// Browser automation via the Chrome DevTools Protocol
    Puppeteer,
    Analytics,
    Social,
    Activity,
}

impl ServiceId {
    pub const ALL: [ServiceId; 5] = [
        ServiceId::Mcp,
        ServiceId::Puppeteer,
        ServiceId::Analytics,
        ServiceId::Social,
        ServiceId::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Mcp => "mcp",
            ServiceId::Puppeteer => "puppeteer",
            ServiceId::Analytics => "analytics",
            ServiceId::Social => "social",
            ServiceId::Activity => "activity",
        }
    }

    /// WebSocket path relative to the service endpoint. Puppeteer has none:
    /// its socket URL comes from `/json/version`.
    pub fn ws_path(&self) -> Option<&'static str> {
        match self {
            ServiceId::Mcp => Some("/ws"),
            ServiceId::Puppeteer => None,
            ServiceId::Analytics => Some("/ws/analytics"),
            ServiceId::Social => Some("/ws/social"),
            ServiceId::Activity => Some("/ws/activity"),
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceId {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ServiceError::UnknownService(s.to_string()))
    }
}

/// How a service is probed and kept alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// One-shot `GET /health` probe; no live handle
    Http,
    /// Long-lived WebSocket
    #[default]
    Ws,
}

/// Where and how to reach a service. Immutable once configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub id: ServiceId,
    /// Base `http(s)://` endpoint
    pub endpoint: String,
    pub transport: TransportKind,
}

impl ServiceDescriptor {
    pub fn new(id: ServiceId, endpoint: impl Into<String>, transport: TransportKind) -> Self {
        Self {
            id,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            transport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub service_id: ServiceId,
    pub state: ConnectionState,
}

/// Snapshot of every configured service's state.
pub type StatusMap = BTreeMap<ServiceId, ConnectionState>;
