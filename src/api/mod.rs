//! # Dashboard API
//!
//! HTTP and WebSocket surface served by `poster serve`. The dashboard reads
//! service state and generates content through these endpoints instead of
//! talking to the backends itself.
//!
//! ## Endpoints
//!
//! - `GET /api/status` - Connection state per service
//! - `POST /api/services/:id/reconnect` - Reconnect one service
//! - `POST /api/services/:id/disconnect` - Disconnect one service
//! - `POST /api/generate` - Raw generation with fallback
//! - `POST /api/generate/post` - Social post for a platform
//! - `POST /api/ideas` - Numbered content ideas
//! - `POST /api/providers/:id/test` - Single-provider connectivity test
//! - `GET /api/llm/health` - Gateway health
//! - `GET /api/activity` - Buffered activity events
//! - `GET /ws` - Live status and activity updates
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Example
//!
//! ```no_run
//! use poster::api::{create_router, AppState};
//! use poster::config::PosterConfig;
//! use poster::llm::LlmClient;
//! use poster::services::ServiceManager;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(PosterConfig::default());
//! let llm = LlmClient::from_config(&config.llm, reqwest::Client::new())?;
//! let services = ServiceManager::new(
//!     config.services.descriptors(),
//!     config.services.connect_timeout(),
//! );
//!
//! let state = Arc::new(AppState::new(config, llm, services));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod content;
mod status;
pub mod types;
pub mod websocket;

pub use types::*;

use crate::config::PosterConfig;
use crate::llm::LlmClient;
use crate::services::ServiceManager;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: Arc<PosterConfig>,
    pub llm: LlmClient,
    pub services: ServiceManager,
    pub prometheus: PrometheusHandle,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Arc<PosterConfig>, llm: LlmClient, services: ServiceManager) -> Self {
        Self {
            config,
            llm,
            services,
            prometheus: crate::metrics::prometheus_handle(),
            started_at: Utc::now(),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.server.max_body_bytes;

    Router::new()
        .route("/api/status", get(status::status))
        .route("/api/services/:id/reconnect", post(status::reconnect))
        .route("/api/services/:id/disconnect", post(status::disconnect))
        .route("/api/activity", get(status::activity))
        .route("/api/generate", post(content::generate))
        .route("/api/generate/post", post(content::social_post))
        .route("/api/ideas", post(content::ideas))
        .route("/api/providers/:id/test", post(content::test_provider))
        .route("/api/llm/health", get(content::llm_health))
        .route("/ws", get(websocket::websocket_handler))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .layer(RequestBodyLimitLayer::new(max_body))
        .with_state(state)
}
