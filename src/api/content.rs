//! Content generation handlers.

use super::{ApiError, AppState, ContentResponse, GenerateBody, IdeasBody, IdeasResponse};
use crate::llm::{
    generate_content_ideas, generate_social_post, ConnectionTest, GatewayHealth,
    GenerationResult, SocialPostContext,
};
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

/// POST /api/generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerationResult>, ApiError> {
    let request = body.into_request()?;
    let result = state.llm.generate(&request).await?;
    Ok(Json(result))
}

/// POST /api/generate/post
pub async fn social_post(
    State(state): State<Arc<AppState>>,
    Json(context): Json<SocialPostContext>,
) -> Result<Json<ContentResponse>, ApiError> {
    let content = generate_social_post(&state.llm, &context).await?;
    Ok(Json(ContentResponse { content }))
}

/// POST /api/ideas
pub async fn ideas(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IdeasBody>,
) -> Result<Json<IdeasResponse>, ApiError> {
    let ideas = generate_content_ideas(&state.llm, body.count).await?;
    Ok(Json(IdeasResponse { ideas }))
}

/// POST /api/providers/:id/test
pub async fn test_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ConnectionTest> {
    Json(state.llm.test_connection(&id).await)
}

/// GET /api/llm/health
pub async fn llm_health(State(state): State<Arc<AppState>>) -> Json<GatewayHealth> {
    Json(state.llm.check_health().await)
}
