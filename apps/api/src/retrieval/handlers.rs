//! Axum route handlers that expose the portfolio indexes directly.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::profile::reindex::rebuild_user_index;
use crate::retrieval::legacy::DEFAULT_LEGACY_LIMIT;
use crate::retrieval::RebuildSummary;
use crate::state::AppState;
use crate::text::normalize::parse_skills;

#[derive(Deserialize)]
pub struct RebuildRequest {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub user_id: Uuid,
    pub documents: usize,
    /// `None` when stale entries could not be removed before the insert.
    pub removed: Option<usize>,
}

#[derive(Deserialize)]
pub struct LinksQuery {
    pub user_id: Uuid,
    /// Comma- or newline-separated skill keywords.
    #[serde(default)]
    pub skills: String,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct LegacyLinksQuery {
    #[serde(default)]
    pub skills: String,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct LinksResponse {
    pub skills: Vec<String>,
    pub links: Vec<String>,
}

/// POST /api/v1/index/rebuild
///
/// Rebuilds the user's index from the profile store. Unlike the implicit
/// reindex after a mutation, failures surface as errors here.
pub async fn handle_rebuild(
    State(state): State<AppState>,
    Json(req): Json<RebuildRequest>,
) -> Result<Json<RebuildResponse>, AppError> {
    let RebuildSummary { documents, removed } =
        rebuild_user_index(&state.db, &state.index, req.user_id).await?;
    Ok(Json(RebuildResponse {
        user_id: req.user_id,
        documents,
        removed,
    }))
}

/// GET /api/v1/index/links
pub async fn handle_query_links(
    State(state): State<AppState>,
    Query(params): Query<LinksQuery>,
) -> Result<Json<LinksResponse>, AppError> {
    let skills = parse_skills(&params.skills);
    let limit = params.limit.unwrap_or(state.config.link_query_limit);
    let links = state
        .index
        .query_links(&params.user_id.to_string(), &skills, limit)
        .await?;
    Ok(Json(LinksResponse { skills, links }))
}

/// GET /api/v1/portfolio/legacy-links
pub async fn handle_legacy_links(
    State(state): State<AppState>,
    Query(params): Query<LegacyLinksQuery>,
) -> Result<Json<LinksResponse>, AppError> {
    let legacy = state.legacy_index.as_ref().ok_or_else(|| {
        AppError::NotFound("Legacy portfolio index is not configured".to_string())
    })?;

    let skills = parse_skills(&params.skills);
    let links = legacy
        .query_links(&skills, params.limit.unwrap_or(DEFAULT_LEGACY_LIMIT))
        .await?;
    Ok(Json(LinksResponse { skills, links }))
}
