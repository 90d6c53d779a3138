//! # Service Connection Manager
//!
//! Tracks five independent backend services (tool orchestration, browser
//! automation, and the analytics, social and activity streams) and exposes a
//! per-service [`ConnectionState`] map.
//!
//! State machine per service:
//!
//! ```text
//!                  connect ok
//!   disconnected ─────────────▶ connected
//!        ▲   ▲                    │   │
//!        │   └── clean close ─────┘   │ transport error
//!        │                            ▼
//!        └──────── disconnect ───── error ◀── reconnect failure
//! ```
//!
//! A failed initial connect stays `disconnected`; a failed
//! [`ServiceManager::reconnect_service`] is `error`.

pub mod activity;
pub mod error;
pub mod manager;
pub mod mcp;
pub mod message;
pub mod transport;
pub mod types;

pub use activity::{ActivityLog, ACTIVITY_CAPACITY};
pub use error::ServiceError;
pub use manager::{ServiceEvent, ServiceManager, ServiceSubscription, DEFAULT_CONNECT_TIMEOUT};
pub use mcp::McpClient;
pub use message::{
    ActivityCategory, ActivityEvent, ActivityLevel, OutboundMessage, ServiceMessage,
};
pub use types::{
    ConnectionState, ServiceDescriptor, ServiceId, ServiceStatus, StatusMap, TransportKind,
};
