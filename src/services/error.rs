//! Service connection errors

use super::types::ServiceId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Handshake exceeded the connect timeout.
    #[error("{service} connection timed out after {timeout_ms}ms")]
    ConnectionTimeout { service: ServiceId, timeout_ms: u64 },

    /// The endpoint answered but the handshake could not complete.
    #[error("{service} handshake failed: {message}")]
    Handshake { service: ServiceId, message: String },

    /// Socket or HTTP transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response from a REST endpoint.
    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("{0} is not connected")]
    NotConnected(ServiceId),

    /// A disconnect arrived while the handshake was in flight.
    #[error("{0} connection attempt was cancelled")]
    Cancelled(ServiceId),

    #[error("{0} is not configured")]
    NotConfigured(ServiceId),

    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("Unknown service: {0}")]
    UnknownService(String),
}
