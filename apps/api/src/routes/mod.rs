pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::generation::handlers as generation;
use crate::profile::handlers as profile;
use crate::retrieval::handlers as retrieval;
use crate::state::AppState;

const MAX_RESUME_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile store
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_save_profile),
        )
        .route(
            "/api/v1/profile/resume",
            post(profile::handle_upload_resume)
                .layer(DefaultBodyLimit::max(MAX_RESUME_UPLOAD_BYTES)),
        )
        .route(
            "/api/v1/portfolio",
            get(profile::handle_list_portfolio).post(profile::handle_create_portfolio),
        )
        .route(
            "/api/v1/portfolio/:id",
            put(profile::handle_update_portfolio).delete(profile::handle_delete_portfolio),
        )
        .route(
            "/api/v1/certifications",
            get(profile::handle_list_certifications).post(profile::handle_create_certification),
        )
        .route(
            "/api/v1/certifications/:id",
            put(profile::handle_update_certification)
                .delete(profile::handle_delete_certification),
        )
        .route(
            "/api/v1/experiences",
            get(profile::handle_list_experiences).post(profile::handle_create_experience),
        )
        .route(
            "/api/v1/experiences/:id",
            put(profile::handle_update_experience).delete(profile::handle_delete_experience),
        )
        // Portfolio index
        .route("/api/v1/index/rebuild", post(retrieval::handle_rebuild))
        .route("/api/v1/index/links", get(retrieval::handle_query_links))
        .route(
            "/api/v1/portfolio/legacy-links",
            get(retrieval::handle_legacy_links),
        )
        // Generation
        .route("/api/v1/jobs/extract", post(generation::handle_extract_jobs))
        .route(
            "/api/v1/cover-letters",
            post(generation::handle_generate_cover_letters),
        )
        .with_state(state)
}
