//! Keeps a user's portfolio index in step with the profile store.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::profile::store::{
    get_or_create_profile, list_certifications, list_experiences, list_portfolio_items,
};
use crate::retrieval::{RebuildSummary, UserPortfolioIndex, UserRecords};

/// Reported with every mutation so the caller knows whether link lookups are current.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexOutcome {
    pub reindexed: bool,
    pub documents: usize,
    pub message: String,
}

impl IndexOutcome {
    fn from_summary(summary: RebuildSummary) -> Self {
        let message = match summary.removed {
            Some(_) => format!("Portfolio index updated ({} documents)", summary.documents),
            None => format!(
                "Portfolio index updated ({} documents); stale entries could not be cleared",
                summary.documents
            ),
        };
        Self {
            reindexed: true,
            documents: summary.documents,
            message,
        }
    }

    fn failed(err: &AppError) -> Self {
        Self {
            reindexed: false,
            documents: 0,
            message: format!("Saved, but the portfolio index could not be updated: {err}"),
        }
    }
}

/// Reads everything the index is built from for one user.
pub async fn load_index_records(db: &PgPool, user_id: Uuid) -> Result<UserRecords, AppError> {
    let profile = get_or_create_profile(db, user_id).await?;
    let portfolio = list_portfolio_items(db, user_id).await?;
    let certifications = list_certifications(db, user_id).await?;
    let experiences = list_experiences(db, user_id).await?;

    Ok(UserRecords {
        profile: Some(profile.to_record()),
        portfolio_items: Some(portfolio.iter().map(|r| r.to_record()).collect()),
        certifications: Some(certifications.iter().map(|r| r.to_record()).collect()),
        experiences: Some(experiences.iter().map(|r| r.to_record()).collect()),
    })
}

/// Rebuilds the user's index from the profile store, surfacing any failure.
pub async fn rebuild_user_index(
    db: &PgPool,
    index: &UserPortfolioIndex,
    user_id: Uuid,
) -> Result<RebuildSummary, AppError> {
    let records = load_index_records(db, user_id).await?;
    let summary = index.rebuild(&user_id.to_string(), &records).await?;
    info!(
        "Reindexed user {user_id}: {} documents, removed {:?}",
        summary.documents, summary.removed
    );
    Ok(summary)
}

/// Like [`rebuild_user_index`], but a failure is logged and reported, never returned.
pub async fn reindex_user(db: &PgPool, index: &UserPortfolioIndex, user_id: Uuid) -> IndexOutcome {
    outcome_for(user_id, rebuild_user_index(db, index, user_id).await)
}

fn outcome_for(user_id: Uuid, result: Result<RebuildSummary, AppError>) -> IndexOutcome {
    match result {
        Ok(summary) => IndexOutcome::from_summary(summary),
        Err(e) => {
            warn!("Reindex for user {user_id} failed: {e}");
            IndexOutcome::failed(&e)
        }
    }
}
