//! REST client for the tool-orchestration (MCP) server.

use super::error::ServiceError;
use super::types::ConnectionState;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerStatus {
    pub status: ConnectionState,
    #[serde(default)]
    pub tools: Vec<McpTool>,
    #[serde(default)]
    pub version: String,
    /// Seconds
    #[serde(default)]
    pub uptime: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_id: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub tool_id: String,
    #[serde(default)]
    pub result: Value,
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
}

/// `/api/*` client with optional bearer authentication.
#[derive(Debug, Clone)]
pub struct McpClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

impl McpClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn status(&self) -> Result<McpServerStatus, ServiceError> {
        self.execute(self.client.get(self.url("/api/status"))).await
    }

    pub async fn list_tools(&self) -> Result<Vec<McpTool>, ServiceError> {
        self.execute(self.client.get(self.url("/api/tools"))).await
    }

    pub async fn call_tool(&self, call: &ToolCall) -> Result<ToolResponse, ServiceError> {
        self.execute(self.client.post(self.url("/api/tools/execute")).json(call))
            .await
    }

    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        parameters: Map<String, Value>,
    ) -> Result<Value, ServiceError> {
        let body = serde_json::json!({ "parameters": parameters });
        let path = format!("/api/workflows/{}/execute", workflow_id);
        self.execute(self.client.post(self.url(&path)).json(&body))
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        mut builder: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "MCP request failed");
            return Err(ServiceError::Http(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Transport(format!("invalid MCP response: {}", e)))
    }
}
