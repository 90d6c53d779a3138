//! Service status, lifecycle and activity handlers.

use super::{ApiError, AppState};
use crate::services::{
    ActivityCategory, ActivityEvent, ConnectionState, ServiceError, ServiceId, ServiceStatus,
    StatusMap,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub services: StatusMap,
    /// True while the startup connection round is still running
    pub initializing: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectResponse {
    pub service_id: ServiceId,
    pub state: ConnectionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
    pub category: Option<ActivityCategory>,
}

fn parse_service(id: &str) -> Result<ServiceId, ApiError> {
    id.parse::<ServiceId>().map_err(ApiError::from)
}

/// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        services: state.services.status(),
        initializing: state.services.is_initializing(),
        started_at: state.started_at,
    })
}

/// POST /api/services/:id/reconnect
///
/// 200 with the new state when connected, 503 with state `error` otherwise.
pub async fn reconnect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let service = parse_service(&id)?;

    match state.services.reconnect_service(service).await {
        Ok(()) => Ok(Json(ReconnectResponse {
            service_id: service,
            state: state.services.state(service),
            error: None,
        })
        .into_response()),
        Err(e @ ServiceError::NotConfigured(_)) => Err(e.into()),
        Err(e) => Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReconnectResponse {
                service_id: service,
                state: state.services.state(service),
                error: Some(e.to_string()),
            }),
        )
            .into_response()),
    }
}

/// POST /api/services/:id/disconnect
pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServiceStatus>, ApiError> {
    let service = parse_service(&id)?;
    state.services.disconnect(service);
    Ok(Json(ServiceStatus {
        service_id: service,
        state: state.services.state(service),
    }))
}

/// GET /api/activity?limit=&category=
pub async fn activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityQuery>,
) -> Json<Vec<ActivityEvent>> {
    Json(
        state
            .services
            .activity()
            .snapshot(query.limit, query.category),
    )
}
