//! Axum route handlers for job extraction and cover-letter generation.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::cover_letter::{generate_cover_letter, CandidateProfile, Preferences};
use crate::generation::job_extractor::{extract_jobs, ExtractedJob};
use crate::generation::job_source::resolve_job_text;
use crate::models::profile::ProfileRow;
use crate::profile::reindex::{reindex_user, IndexOutcome};
use crate::profile::store::get_or_create_profile;
use crate::profile::validation::truncate_resume;
use crate::state::AppState;
use crate::text::normalize::dedup_skills;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractJobsRequest {
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractJobsResponse {
    pub source_text: String,
    pub jobs: Vec<ExtractedJob>,
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub user_id: Uuid,
    pub url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    /// Nearest documents in the user's portfolio index.
    Index,
    /// The links stored on the profile.
    Profile,
}

/// One generated letter per extracted posting.
#[derive(Debug, Serialize)]
pub struct CoverLetterOption {
    pub option: usize,
    pub job: ExtractedJob,
    pub links: Vec<String>,
    pub link_source: LinkSource,
    pub letter: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub options: Vec<CoverLetterOption>,
    pub index: IndexOutcome,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/extract
///
/// Fetches or cleans the posting text and returns the structured postings,
/// so a caller can preview what a cover-letter request would work from.
pub async fn handle_extract_jobs(
    State(state): State<AppState>,
    Json(request): Json<ExtractJobsRequest>,
) -> Result<Json<ExtractJobsResponse>, AppError> {
    let source_text =
        resolve_job_text(&state.http, request.url.as_deref(), request.description.as_deref())
            .await?;
    let jobs = extract_jobs(&source_text, &state.llm).await?;
    Ok(Json(ExtractJobsResponse { source_text, jobs }))
}

/// POST /api/v1/cover-letters
///
/// Full pipeline: job text → profile check → reindex → job extraction → per
/// posting link lookup and letter generation. A failed letter is reported on
/// its own option and does not fail the others.
pub async fn handle_generate_cover_letters(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let source_text =
        resolve_job_text(&state.http, request.url.as_deref(), request.description.as_deref())
            .await?;

    let profile = get_or_create_profile(&state.db, request.user_id).await?;
    if profile.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Please complete your profile (name) before generating".to_string(),
        ));
    }

    let index = reindex_user(&state.db, &state.index, request.user_id).await;
    let jobs = extract_jobs(&source_text, &state.llm).await?;
    info!(
        "Generating {} cover letter(s) for user {}",
        jobs.len(),
        request.user_id
    );

    let candidate = candidate_profile(&profile);
    let mut options = Vec::with_capacity(jobs.len());

    for (i, job) in jobs.into_iter().enumerate() {
        let (links, link_source) = links_for_job(&state, request.user_id, &profile, &job).await;

        let (letter, error) = match generate_cover_letter(
            &state.llm,
            &candidate,
            &job,
            &request.preferences,
            &links,
        )
        .await
        {
            Ok(letter) => (Some(letter), None),
            Err(e) => {
                warn!("Cover letter generation failed for option {}: {e}", i + 1);
                (None, Some(format!("Generation failed: {e}")))
            }
        };

        options.push(CoverLetterOption {
            option: i + 1,
            job,
            links,
            link_source,
            letter,
            error,
        });
    }

    Ok(Json(CoverLetterResponse { options, index }))
}

/// Index links for the union of profile and job skills, falling back to the
/// profile's stored links when the lookup is empty or fails.
async fn links_for_job(
    state: &AppState,
    user_id: Uuid,
    profile: &ProfileRow,
    job: &ExtractedJob,
) -> (Vec<String>, LinkSource) {
    let skills = search_skills(&profile.skills, &job.skills);
    match state
        .index
        .query_links(&user_id.to_string(), &skills, state.config.link_query_limit)
        .await
    {
        Ok(links) if !links.is_empty() => (links, LinkSource::Index),
        Ok(_) => (profile.links.clone(), LinkSource::Profile),
        Err(e) => {
            warn!("Link lookup for user {user_id} failed, using profile links: {e}");
            (profile.links.clone(), LinkSource::Profile)
        }
    }
}

/// Profile skills first, then job skills, case-insensitively deduplicated.
fn search_skills(profile_skills: &[String], job_skills: &[String]) -> Vec<String> {
    dedup_skills(profile_skills.iter().chain(job_skills).map(String::as_str))
}

fn candidate_profile(profile: &ProfileRow) -> CandidateProfile {
    CandidateProfile {
        name: profile.name.trim().to_string(),
        education: profile.education.clone(),
        email: profile.email.clone(),
        phone: profile.phone.clone(),
        skills: profile.skills.clone(),
        links: profile.links.clone(),
        resume_text: profile.resume_text.as_deref().and_then(truncate_resume),
    }
}
