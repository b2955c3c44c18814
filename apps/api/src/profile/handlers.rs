//! Axum route handlers for the profile store. Every mutation reindexes the user.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{CertificationRow, ExperienceRow, PortfolioItemRow, ProfileRow};
use crate::profile::reindex::{reindex_user, IndexOutcome};
use crate::profile::store;
use crate::profile::validation::{
    truncate_resume, CertificationInput, ExperienceInput, PortfolioItemInput, ProfileInput,
};
use crate::state::AppState;
use crate::text::resume::{read_resume_text, save_upload, ResumeFormat};

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// A saved record plus what happened to the user's index.
#[derive(Serialize)]
pub struct SavedResponse<T> {
    pub record: T,
    pub index: IndexOutcome,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: i64,
    pub index: IndexOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Profile
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileRow>, AppError> {
    let profile = store::get_or_create_profile(&state.db, params.user_id).await?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<SavedResponse<ProfileRow>>, AppError> {
    let valid = input.validate()?;
    let record = store::save_profile(&state.db, input.user_id, &valid).await?;
    let index = reindex_user(&state.db, &state.index, input.user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

/// POST /api/v1/profile/resume
///
/// Multipart form with a `user_id` text field and a `file` part (PDF, DOCX or TXT).
/// The original file is kept under the upload directory; its text replaces the
/// stored résumé text.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SavedResponse<ProfileRow>>, AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut upload: Option<(String, Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("user_id") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id field: {e}")))?;
                let parsed = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation("user_id must be a UUID".to_string()))?;
                user_id = Some(parsed);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let mime = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                upload = Some((file_name, mime, bytes));
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let (file_name, mime, bytes) =
        upload.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    let format = ResumeFormat::detect(&file_name, mime.as_deref());
    let text = read_resume_text(format, bytes.clone()).await.ok_or_else(|| {
        AppError::UnprocessableEntity("Couldn't read any text from the uploaded résumé".to_string())
    })?;

    let path = save_upload(&state.config.upload_dir, user_id, &file_name, &bytes).await?;
    info!("Stored résumé for user {user_id} at {}", path.display());

    let resume_text = truncate_resume(&text);
    let record = store::save_resume(
        &state.db,
        user_id,
        resume_text.as_deref(),
        &path.to_string_lossy(),
        &file_name,
        mime.as_deref(),
    )
    .await?;
    let index = reindex_user(&state.db, &state.index, user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

// ────────────────────────────────────────────────────────────────────────────
// Portfolio items
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/portfolio
pub async fn handle_list_portfolio(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<PortfolioItemRow>>, AppError> {
    Ok(Json(store::list_portfolio_items(&state.db, params.user_id).await?))
}

/// POST /api/v1/portfolio
pub async fn handle_create_portfolio(
    State(state): State<AppState>,
    Json(input): Json<PortfolioItemInput>,
) -> Result<Json<SavedResponse<PortfolioItemRow>>, AppError> {
    let valid = input.validate()?;
    let record = store::create_portfolio_item(&state.db, input.user_id, &valid).await?;
    let index = reindex_user(&state.db, &state.index, input.user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

/// PUT /api/v1/portfolio/:id
pub async fn handle_update_portfolio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PortfolioItemInput>,
) -> Result<Json<SavedResponse<PortfolioItemRow>>, AppError> {
    let valid = input.validate()?;
    let record = store::update_portfolio_item(&state.db, input.user_id, id, &valid).await?;
    let index = reindex_user(&state.db, &state.index, input.user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

/// DELETE /api/v1/portfolio/:id
pub async fn handle_delete_portfolio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    store::delete_portfolio_item(&state.db, params.user_id, id).await?;
    let index = reindex_user(&state.db, &state.index, params.user_id).await;
    Ok(Json(DeletedResponse { deleted: id, index }))
}

// ────────────────────────────────────────────────────────────────────────────
// Certifications
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/certifications
pub async fn handle_list_certifications(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CertificationRow>>, AppError> {
    Ok(Json(store::list_certifications(&state.db, params.user_id).await?))
}

/// POST /api/v1/certifications
pub async fn handle_create_certification(
    State(state): State<AppState>,
    Json(input): Json<CertificationInput>,
) -> Result<Json<SavedResponse<CertificationRow>>, AppError> {
    let valid = input.validate()?;
    let record = store::create_certification(&state.db, input.user_id, &valid).await?;
    let index = reindex_user(&state.db, &state.index, input.user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

/// PUT /api/v1/certifications/:id
pub async fn handle_update_certification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CertificationInput>,
) -> Result<Json<SavedResponse<CertificationRow>>, AppError> {
    let valid = input.validate()?;
    let record = store::update_certification(&state.db, input.user_id, id, &valid).await?;
    let index = reindex_user(&state.db, &state.index, input.user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

/// DELETE /api/v1/certifications/:id
pub async fn handle_delete_certification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    store::delete_certification(&state.db, params.user_id, id).await?;
    let index = reindex_user(&state.db, &state.index, params.user_id).await;
    Ok(Json(DeletedResponse { deleted: id, index }))
}

// ────────────────────────────────────────────────────────────────────────────
// Experiences
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/experiences
pub async fn handle_list_experiences(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ExperienceRow>>, AppError> {
    Ok(Json(store::list_experiences(&state.db, params.user_id).await?))
}

/// POST /api/v1/experiences
pub async fn handle_create_experience(
    State(state): State<AppState>,
    Json(input): Json<ExperienceInput>,
) -> Result<Json<SavedResponse<ExperienceRow>>, AppError> {
    let valid = input.validate()?;
    let record = store::create_experience(&state.db, input.user_id, &valid).await?;
    let index = reindex_user(&state.db, &state.index, input.user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

/// PUT /api/v1/experiences/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ExperienceInput>,
) -> Result<Json<SavedResponse<ExperienceRow>>, AppError> {
    let valid = input.validate()?;
    let record = store::update_experience(&state.db, input.user_id, id, &valid).await?;
    let index = reindex_user(&state.db, &state.index, input.user_id).await;
    Ok(Json(SavedResponse { record, index }))
}

/// DELETE /api/v1/experiences/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DeletedResponse>, AppError> {
    store::delete_experience(&state.db, params.user_id, id).await?;
    let index = reindex_user(&state.db, &state.index, params.user_id).await;
    Ok(Json(DeletedResponse { deleted: id, index }))
}
