//! Backend service endpoints

use crate::services::{ServiceDescriptor, ServiceId, TransportKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Tool-orchestration server
    pub mcp_endpoint: String,
    /// Bearer token for the MCP REST API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_api_key: Option<String>,
    pub puppeteer_host: String,
    pub puppeteer_debug_port: u16,
    /// Shared by the analytics, social and activity streams
    pub gateway_endpoint: String,
    /// Per-service transport override; services default to `ws`
    pub transport: BTreeMap<ServiceId, TransportKind>,
    pub connect_timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            mcp_endpoint: "http://localhost:3003".to_string(),
            mcp_api_key: None,
            puppeteer_host: "localhost".to_string(),
            puppeteer_debug_port: 9222,
            gateway_endpoint: "http://localhost:8000".to_string(),
            transport: BTreeMap::new(),
            connect_timeout_ms: 5000,
        }
    }
}

impl ServicesConfig {
    pub fn endpoint(&self, id: ServiceId) -> String {
        match id {
            ServiceId::Mcp => self.mcp_endpoint.clone(),
            ServiceId::Puppeteer => {
                format!("http://{}:{}", self.puppeteer_host, self.puppeteer_debug_port)
            }
            ServiceId::Analytics | ServiceId::Social | ServiceId::Activity => {
                self.gateway_endpoint.clone()
            }
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Descriptors for all five services.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        ServiceId::ALL
            .into_iter()
            .map(|id| {
                let transport = self.transport.get(&id).copied().unwrap_or_default();
                ServiceDescriptor::new(id, self.endpoint(id), transport)
            })
            .collect()
    }
}
