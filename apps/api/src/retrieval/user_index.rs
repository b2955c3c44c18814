//! Per-user portfolio index.
//!
//! All users share one collection; every document carries a `user_id` metadata
//! field and every read and write is filtered on it. The index is a derived
//! cache of the profile store and is rebuilt wholesale whenever a user's
//! records change.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::retrieval::documents::{
    certification_document, experience_document, portfolio_document, profile_document, Record,
};
use crate::retrieval::store::{Metadata, MetadataFilter, VectorRecord, VectorStore};
use crate::retrieval::IndexError;

/// The records a user's index is rebuilt from. `None` collections are skipped.
#[derive(Debug, Clone, Default)]
pub struct UserRecords {
    pub profile: Option<Record>,
    pub portfolio_items: Option<Vec<Record>>,
    pub certifications: Option<Vec<Record>>,
    pub experiences: Option<Vec<Record>>,
}

/// What a rebuild did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Documents inserted.
    pub documents: usize,
    /// Stale documents removed, or `None` when the delete step failed.
    pub removed: Option<usize>,
}

pub struct UserPortfolioIndex {
    store: Arc<dyn VectorStore>,
    collection: String,
    // Rebuilds take the write side so a query never sees a half-replaced user.
    gate: RwLock<()>,
}

impl UserPortfolioIndex {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            gate: RwLock::new(()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Replaces every document of `user_id` with documents synthesized from `records`.
    ///
    /// The delete step is best-effort: if the store refuses it, the failure is
    /// logged and the insert still runs, which can leave stale duplicates until
    /// the next successful rebuild. Insert failures are returned.
    pub async fn rebuild(
        &self,
        user_id: &str,
        records: &UserRecords,
    ) -> Result<RebuildSummary, IndexError> {
        let user_id = checked_user_id(user_id)?;
        let _guard = self.gate.write().await;

        let removed = match self
            .store
            .delete(&self.collection, &user_filter(user_id))
            .await
        {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("Could not clear index for user {user_id}, continuing with insert: {e}");
                None
            }
        };

        let batch = build_documents(user_id, records);
        let documents = batch.len();
        if !batch.is_empty() {
            self.store.add(&self.collection, batch).await?;
        }

        info!(
            "Rebuilt portfolio index for user {user_id}: {documents} documents, {} stale removed",
            removed.map_or_else(|| "?".to_string(), |n| n.to_string())
        );
        Ok(RebuildSummary { documents, removed })
    }

    /// Returns the URLs of the documents nearest to each skill, in discovery
    /// order and without duplicates. Only documents of `user_id` are searched.
    pub async fn query_links(
        &self,
        user_id: &str,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<String>, IndexError> {
        if skills.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let user_id = checked_user_id(user_id)?;
        let _guard = self.gate.read().await;

        let groups = self
            .store
            .query(&self.collection, skills, Some(&user_filter(user_id)), limit)
            .await?;

        let links = collect_links(&groups, "url");
        debug!(
            "Link query for user {user_id} with {} skills returned {} links",
            skills.len(),
            links.len()
        );
        Ok(links)
    }
}

fn checked_user_id(user_id: &str) -> Result<&str, IndexError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        Err(IndexError::EmptyUserId)
    } else {
        Ok(user_id)
    }
}

fn user_filter(user_id: &str) -> MetadataFilter {
    MetadataFilter::new().eq("user_id", user_id)
}

fn build_documents(user_id: &str, records: &UserRecords) -> Vec<VectorRecord> {
    let profile = records.profile.iter().map(profile_document);
    let portfolio = records.portfolio_items.iter().flatten().map(portfolio_document);
    let certifications = records.certifications.iter().flatten().map(certification_document);
    let experiences = records.experiences.iter().flatten().map(experience_document);

    profile
        .chain(portfolio)
        .chain(certifications)
        .chain(experiences)
        .map(|doc| doc.into_vector_record(user_id))
        .collect()
}

/// Flattens per-term result groups into the distinct values of `key`,
/// first occurrence wins.
pub(crate) fn collect_links(groups: &[Vec<Metadata>], key: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .flatten()
        .filter_map(|metadata| metadata.get(key))
        .filter(|link| !link.is_empty())
        .filter(|link| seen.insert(link.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::retrieval::embedding::{EmbedError, Embedder};
    use crate::retrieval::store::{LanceVectorStore, StoreError};

    /// One dimension per known word, so similarity is exact word overlap.
    struct VocabularyEmbedder;

    const VOCABULARY: &[&str] = &[
        "rust", "python", "go", "kubernetes", "react", "crawler", "dashboard", "cli", "api",
    ];

    #[async_trait]
    impl Embedder for VocabularyEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let lower = text.to_lowercase();
                    let words: Vec<&str> = lower
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|w| !w.is_empty())
                        .collect();
                    VOCABULARY
                        .iter()
                        .map(|v| if words.contains(v) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            VOCABULARY.len()
        }

        fn model_name(&self) -> &str {
            "vocabulary"
        }
    }

    /// Wraps a store, counting calls and optionally refusing deletes or inserts.
    struct RecordingStore {
        inner: LanceVectorStore,
        calls: AtomicUsize,
        refuse_delete: bool,
        refuse_add: bool,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn add(&self, c: &str, records: Vec<VectorRecord>) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.refuse_add {
                return Err(StoreError::Unsupported("insert".to_string()));
            }
            self.inner.add(c, records).await
        }

        async fn delete(&self, c: &str, f: &MetadataFilter) -> Result<usize, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.refuse_delete {
                return Err(StoreError::Unsupported("filter delete".to_string()));
            }
            self.inner.delete(c, f).await
        }

        async fn query(
            &self,
            c: &str,
            texts: &[String],
            f: Option<&MetadataFilter>,
            n: usize,
        ) -> Result<Vec<Vec<Metadata>>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.query(c, texts, f, n).await
        }

        async fn count(&self, c: &str) -> Result<usize, StoreError> {
            self.inner.count(c).await
        }
    }

    async fn recording_store(dir: &std::path::Path, refuse_delete: bool) -> Arc<RecordingStore> {
        recording_store_with(dir, refuse_delete, false).await
    }

    async fn recording_store_with(
        dir: &std::path::Path,
        refuse_delete: bool,
        refuse_add: bool,
    ) -> Arc<RecordingStore> {
        let inner = LanceVectorStore::open(dir, Arc::new(VocabularyEmbedder))
            .await
            .unwrap();
        Arc::new(RecordingStore {
            inner,
            calls: AtomicUsize::new(0),
            refuse_delete,
            refuse_add,
        })
    }

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn item(id: i64, title: &str, url: &str, skills: &[&str]) -> Record {
        rec(json!({"id": id, "title": title, "url": url, "skills": skills, "description": ""}))
    }

    fn portfolio_only(items: Vec<Record>) -> UserRecords {
        UserRecords {
            portfolio_items: Some(items),
            ..UserRecords::default()
        }
    }

    fn skills(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_rebuild_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = recording_store(dir.path(), false).await;
        let index = UserPortfolioIndex::new(store.clone(), "user_portfolio");
        let records = portfolio_only(vec![
            item(1, "Crawler", "https://x.example/crawler", &["Rust"]),
            item(2, "Dashboard", "https://x.example/dash", &["React"]),
        ]);

        index.rebuild("u1", &records).await.unwrap();
        let first = index.query_links("u1", &skills(&["rust", "react"]), 3).await.unwrap();
        let summary = index.rebuild("u1", &records).await.unwrap();
        let second = index.query_links("u1", &skills(&["rust", "react"]), 3).await.unwrap();

        assert_eq!(summary.removed, Some(2));
        assert_eq!(first, second);
        assert_eq!(store.inner.count("user_portfolio").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_users_never_see_each_others_links() {
        let dir = tempfile::tempdir().unwrap();
        let index = UserPortfolioIndex::new(recording_store(dir.path(), false).await, "user_portfolio");
        index
            .rebuild("a", &portfolio_only(vec![item(1, "A", "https://a.example", &["Rust"])]))
            .await
            .unwrap();
        index
            .rebuild("b", &portfolio_only(vec![item(1, "B", "https://b.example", &["Rust"])]))
            .await
            .unwrap();

        let a = index.query_links("a", &skills(&["rust"]), 5).await.unwrap();
        let b = index.query_links("b", &skills(&["rust"]), 5).await.unwrap();
        assert_eq!(a, vec!["https://a.example"]);
        assert_eq!(b, vec!["https://b.example"]);
    }

    #[tokio::test]
    async fn test_empty_skills_never_touch_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = recording_store(dir.path(), false).await;
        let index = UserPortfolioIndex::new(store.clone(), "user_portfolio");

        assert!(index.query_links("anyone", &[], 3).await.unwrap().is_empty());
        assert!(index.query_links("", &[], 0).await.unwrap().is_empty());
        assert!(index.query_links("u", &skills(&["rust"]), 0).await.unwrap().is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shared_url_reported_once_at_first_position() {
        let dir = tempfile::tempdir().unwrap();
        let index = UserPortfolioIndex::new(recording_store(dir.path(), false).await, "user_portfolio");
        index
            .rebuild(
                "u",
                &portfolio_only(vec![
                    item(1, "Crawler", "https://shared.example", &["Rust"]),
                    item(2, "Service", "https://shared.example", &["Go"]),
                    item(3, "Notebook", "https://py.example", &["Python"]),
                ]),
            )
            .await
            .unwrap();

        let links = index
            .query_links("u", &skills(&["python", "rust", "go"]), 1)
            .await
            .unwrap();
        assert_eq!(links, vec!["https://py.example", "https://shared.example"]);

        let reversed = index
            .query_links("u", &skills(&["go", "python", "rust"]), 1)
            .await
            .unwrap();
        assert_eq!(reversed, vec!["https://shared.example", "https://py.example"]);
    }

    #[tokio::test]
    async fn test_profile_only_index_yields_no_links() {
        let dir = tempfile::tempdir().unwrap();
        let index = UserPortfolioIndex::new(recording_store(dir.path(), false).await, "user_portfolio");
        let records = UserRecords {
            profile: Some(rec(json!({
                "name": "Ada",
                "skills": ["Rust", "Python"],
                "links": ["https://ada.example"]
            }))),
            ..UserRecords::default()
        };

        let summary = index.rebuild("u", &records).await.unwrap();
        assert_eq!(summary.documents, 1);
        let links = index.query_links("u", &skills(&["rust", "python"]), 3).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_drops_omitted_records() {
        let dir = tempfile::tempdir().unwrap();
        let index = UserPortfolioIndex::new(recording_store(dir.path(), false).await, "user_portfolio");
        index
            .rebuild("x", &portfolio_only(vec![item(1, "Crawler", "u1", &["Rust"])]))
            .await
            .unwrap();
        index
            .rebuild("x", &portfolio_only(vec![item(2, "Dashboard", "u2", &["React"])]))
            .await
            .unwrap();

        let links = index
            .query_links("x", &skills(&["rust", "crawler"]), 5)
            .await
            .unwrap();
        assert!(!links.contains(&"u1".to_string()));
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_abort_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let store = recording_store(dir.path(), true).await;
        let index = UserPortfolioIndex::new(store.clone(), "user_portfolio");

        let summary = index
            .rebuild("u", &portfolio_only(vec![item(1, "Crawler", "https://c.example", &["Rust"])]))
            .await
            .unwrap();

        assert_eq!(summary.removed, None);
        assert_eq!(summary.documents, 1);
        assert_eq!(
            index.query_links("u", &skills(&["rust"]), 1).await.unwrap(),
            vec!["https://c.example"]
        );
    }

    #[tokio::test]
    async fn test_failed_insert_fails_the_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let store = recording_store_with(dir.path(), false, true).await;
        let index = UserPortfolioIndex::new(store.clone(), "user_portfolio");

        let err = index
            .rebuild("u", &portfolio_only(vec![item(1, "Crawler", "https://c.example", &["Rust"])]))
            .await
            .unwrap_err();

        assert!(matches!(err, IndexError::Store(StoreError::Unsupported(_))));
        assert!(index.query_links("u", &skills(&["rust"]), 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_rebuild_skips_insert() {
        let dir = tempfile::tempdir().unwrap();
        let store = recording_store(dir.path(), false).await;
        let index = UserPortfolioIndex::new(store.clone(), "user_portfolio");

        let summary = index.rebuild("u", &UserRecords::default()).await.unwrap();
        assert_eq!(summary.documents, 0);
        // delete only, no add
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_user_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = UserPortfolioIndex::new(recording_store(dir.path(), false).await, "user_portfolio");
        let err = index.rebuild("  ", &UserRecords::default()).await.unwrap_err();
        assert!(matches!(err, IndexError::EmptyUserId));
    }

    #[tokio::test]
    async fn test_all_record_kinds_are_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let store = recording_store(dir.path(), false).await;
        let index = UserPortfolioIndex::new(store.clone(), "user_portfolio");
        let records = UserRecords {
            profile: Some(rec(json!({"name": "Ada"}))),
            portfolio_items: Some(vec![item(1, "Crawler", "https://c.example", &["Rust"])]),
            certifications: Some(vec![rec(json!({"id": 1, "title": "CKA", "skills": ["Kubernetes"]}))]),
            experiences: Some(vec![rec(json!({"id": 1, "role": "SRE", "skills": ["Go"]}))]),
        };

        let summary = index.rebuild("u", &records).await.unwrap();
        assert_eq!(summary.documents, 4);
        assert_eq!(store.inner.count("user_portfolio").await.unwrap(), 4);
    }

    #[test]
    fn test_collect_links_skips_missing_and_duplicates() {
        let group = |urls: &[Option<&str>]| -> Vec<Metadata> {
            urls.iter()
                .map(|u| {
                    let mut m = Metadata::new();
                    if let Some(u) = u {
                        m.insert("url".to_string(), u.to_string());
                    }
                    m
                })
                .collect()
        };
        let groups = vec![
            group(&[None, Some("b"), Some("a")]),
            group(&[Some("a"), Some("c"), Some("")]),
        ];
        assert_eq!(collect_links(&groups, "url"), vec!["b", "a", "c"]);
    }
}
