//! Request, response and error bodies shared by the HTTP surfaces.

use crate::llm::{GenerationRequest, LlmError, ProviderId};
use crate::services::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// JSON error body: `{"error": {"message", "type", "code"}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    fn new(message: impl Into<String>, r#type: &str, code: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.into(),
                r#type: r#type.to_string(),
                param: None,
                code: Some(code.to_string()),
            },
        }
    }

    /// 400
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, "invalid_request_error", "invalid_request_error")
    }

    /// 400 with `param = "provider"`
    pub fn unsupported_provider(message: impl Into<String>) -> Self {
        let mut err = Self::new(message, "invalid_request_error", "unsupported_provider");
        err.error.param = Some("provider".to_string());
        err
    }

    /// 404
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, "invalid_request_error", "not_found")
    }

    /// 502
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(message, "server_error", "bad_gateway")
    }

    /// 503
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(message, "server_error", "service_unavailable")
    }

    pub fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") | Some("unsupported_provider") => {
                StatusCode::BAD_REQUEST
            }
            Some("not_found") => StatusCode::NOT_FOUND,
            Some("bad_gateway") => StatusCode::BAD_GATEWAY,
            Some("service_unavailable") => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::UnsupportedProvider(_) => ApiError::unsupported_provider(err.to_string()),
            LlmError::InvalidRequest(_) => ApiError::bad_request(err.to_string()),
            LlmError::GenerationFailed { .. } => ApiError::bad_gateway(err.to_string()),
            LlmError::Configuration(_) => ApiError::service_unavailable(err.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UnknownService(_) | ServiceError::NotConfigured(_) => {
                ApiError::not_found(err.to_string())
            }
            _ => ApiError::service_unavailable(err.to_string()),
        }
    }
}

/// `POST /generate` and `POST /api/generate` body.
///
/// `provider` stays a string so an unknown name maps to a 400 error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBody {
    pub prompt: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl GenerateBody {
    /// Empty names count as unset.
    pub fn provider_id(&self) -> Result<Option<ProviderId>, ApiError> {
        match self.provider.as_deref() {
            None | Some("") => Ok(None),
            Some(name) => name.parse().map(Some).map_err(ApiError::from),
        }
    }

    pub fn into_request(self) -> Result<GenerationRequest, ApiError> {
        let provider = self.provider_id()?;
        Ok(GenerationRequest {
            prompt: self.prompt,
            provider,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            platform: self.platform,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub content: String,
}

/// `POST /api/ideas` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdeasBody {
    pub count: usize,
}

impl Default for IdeasBody {
    fn default() -> Self {
        Self { count: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeasResponse {
    pub ideas: Vec<String>,
}
