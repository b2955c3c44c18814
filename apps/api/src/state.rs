use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::retrieval::{PortfolioIndex, UserPortfolioIndex};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Plain HTTP client for fetching job postings.
    pub http: reqwest::Client,
    /// Per-user portfolio index over the process-wide vector store.
    pub index: Arc<UserPortfolioIndex>,
    /// Present only when `LEGACY_PORTFOLIO_CSV` is set.
    pub legacy_index: Option<Arc<PortfolioIndex>>,
    pub config: Config,
}
