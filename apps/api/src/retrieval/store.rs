//! Vector store collaborator: named collections of (id, document, metadata, vector)
//! entries with exact-match metadata filtering and nearest-neighbour queries.
//!
//! `LanceVectorStore` keeps one LanceDB table per collection under its root
//! directory. Every write is a single LanceDB commit, so a failed call leaves the
//! collection as it was.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::retrieval::embedding::{EmbedError, Embedder};

/// Flat string metadata attached to each stored document.
pub type Metadata = BTreeMap<String, String>;

const ID_COLUMN: &str = "id";
const DOCUMENT_COLUMN: &str = "document";
const METADATA_COLUMN: &str = "metadata";
const VECTOR_COLUMN: &str = "vector";
const DISTANCE_COLUMN: &str = "_distance";
/// Metadata keys that also get their own column, and so can be filtered on.
const FILTER_COLUMNS: &[&str] = &["user_id"];
/// Schema metadata key naming the model that produced a table's vectors.
const MODEL_KEY: &str = "embedding_model";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vector database error: {0}")]
    Database(#[from] lancedb::Error),

    #[error("record batch error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("unreadable metadata in collection '{collection}': {source}")]
    Metadata {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected table layout: {0}")]
    Layout(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("embedder returned a {got}-dimensional vector, expected {expected}")]
    Dimension { expected: usize, got: usize },

    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    #[error("operation not supported: {0}")]
    Unsupported(String),
}

/// One document to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
}

/// Exact-match predicate over metadata: every pair must be present and equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pairs: BTreeMap<String, String>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// SQL predicate over the filter columns. Keys without a column are refused.
    fn to_predicate(&self) -> Result<String, StoreError> {
        let clauses = self
            .pairs
            .iter()
            .map(|(key, value)| {
                if FILTER_COLUMNS.contains(&key.as_str()) {
                    Ok(format!("{key} = '{}'", value.replace('\'', "''")))
                } else {
                    Err(StoreError::Unsupported(format!(
                        "cannot filter on metadata key '{key}'"
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clauses.join(" AND "))
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts a batch. An entry whose id already exists is overwritten.
    async fn add(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), StoreError>;

    /// Deletes every entry matching `filter`. Returns the number removed.
    async fn delete(&self, collection: &str, filter: &MetadataFilter) -> Result<usize, StoreError>;

    /// For each query text, returns the metadata of up to `n_results` nearest
    /// entries (most similar first) among those matching `filter`.
    async fn query(
        &self,
        collection: &str,
        query_texts: &[String],
        filter: Option<&MetadataFilter>,
        n_results: usize,
    ) -> Result<Vec<Vec<Metadata>>, StoreError>;

    async fn count(&self, collection: &str) -> Result<usize, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// LanceDB store
// ────────────────────────────────────────────────────────────────────────────

/// Embedded LanceDB store persisted under a directory.
///
/// Construct once per process and share it behind an `Arc`.
pub struct LanceVectorStore {
    connection: Connection,
    embedder: Arc<dyn Embedder>,
    root: PathBuf,
}

impl LanceVectorStore {
    /// Opens (or creates) the store directory and checks every existing table.
    ///
    /// Tables written by another embedding model, or that cannot be read, are
    /// dropped: the index is a cache and is rebuilt from the profile store.
    pub async fn open(
        root: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::Io {
                path: root.clone(),
                source,
            })?;
        let root = tokio::fs::canonicalize(&root)
            .await
            .map_err(|source| StoreError::Io {
                path: root.clone(),
                source,
            })?;

        let uri = format!("file://{}", root.display());
        let connection = lancedb::connect(&uri).execute().await?;
        let store = Self {
            connection,
            embedder,
            root,
        };

        let tables = store.connection.table_names().execute().await?;
        for name in &tables {
            store.check_table(name).await?;
        }

        info!(
            "Vector store opened at {} ({} collections, model {})",
            store.root.display(),
            tables.len(),
            store.embedder.model_name()
        );
        Ok(store)
    }

    async fn check_table(&self, name: &str) -> Result<(), StoreError> {
        let problem = match self.connection.open_table(name).execute().await {
            Ok(table) => match table.schema().await {
                Ok(schema) => self.schema_mismatch(&schema),
                Err(e) => Some(format!("unreadable schema: {e}")),
            },
            Err(e) => Some(format!("unreadable table: {e}")),
        };
        let Some(problem) = problem else {
            debug!("Collection '{name}' matches {}", self.embedder.model_name());
            return Ok(());
        };

        warn!("Discarding collection '{name}': {problem}");
        if let Err(e) = self.connection.drop_table(name).await {
            warn!("Dropping collection '{name}' failed ({e}), removing its files");
            let path = self.root.join(format!("{name}.lance"));
            tokio::fs::remove_dir_all(&path)
                .await
                .map_err(|source| StoreError::Io { path, source })?;
        }
        Ok(())
    }

    fn schema_mismatch(&self, schema: &Schema) -> Option<String> {
        let dimension = match schema.field_with_name(VECTOR_COLUMN).map(Field::data_type) {
            Ok(DataType::FixedSizeList(_, size)) => *size as usize,
            _ => return Some("no vector column".to_string()),
        };
        let columns = [ID_COLUMN, DOCUMENT_COLUMN, METADATA_COLUMN];
        if let Some(column) = columns
            .iter()
            .chain(FILTER_COLUMNS)
            .find(|column| schema.field_with_name(column).is_err())
        {
            return Some(format!("missing column '{column}'"));
        }
        if dimension != self.embedder.dimension() {
            return Some(format!(
                "{dimension}-dimensional vectors, current embedder produces {}",
                self.embedder.dimension()
            ));
        }
        match schema.metadata().get(MODEL_KEY) {
            Some(model) if model != self.embedder.model_name() => Some(format!(
                "embedded with {model}, current model is {}",
                self.embedder.model_name()
            )),
            _ => None,
        }
    }

    fn schema(&self) -> SchemaRef {
        let mut fields = vec![
            Field::new(ID_COLUMN, DataType::Utf8, false),
            Field::new(DOCUMENT_COLUMN, DataType::Utf8, false),
            Field::new(METADATA_COLUMN, DataType::Utf8, false),
        ];
        fields.extend(
            FILTER_COLUMNS
                .iter()
                .map(|column| Field::new(*column, DataType::Utf8, true)),
        );
        fields.push(Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                self.embedder.dimension() as i32,
            ),
            false,
        ));

        let metadata = HashMap::from([(
            MODEL_KEY.to_string(),
            self.embedder.model_name().to_string(),
        )]);
        Arc::new(Schema::new_with_metadata(fields, metadata))
    }

    fn record_batch(
        &self,
        collection: &str,
        records: &[VectorRecord],
        vectors: &[Vec<f32>],
    ) -> Result<RecordBatch, StoreError> {
        let dimension = self.embedder.dimension();
        let mut flat = Vec::with_capacity(records.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(StoreError::Dimension {
                    expected: dimension,
                    got: vector.len(),
                });
            }
            flat.extend_from_slice(vector);
        }

        let metadata = records
            .iter()
            .map(|r| serde_json::to_string(&r.metadata))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| StoreError::Metadata {
                collection: collection.to_string(),
                source,
            })?;

        let mut columns: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from_iter_values(records.iter().map(|r| r.id.as_str()))),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.document.as_str()),
            )),
            Arc::new(StringArray::from(metadata)),
        ];
        for column in FILTER_COLUMNS {
            let values: StringArray = records
                .iter()
                .map(|r| r.metadata.get(*column).map(String::as_str))
                .collect();
            columns.push(Arc::new(values));
        }
        let item = Arc::new(Field::new("item", DataType::Float32, false));
        columns.push(Arc::new(FixedSizeListArray::try_new(
            item,
            dimension as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        )?));

        Ok(RecordBatch::try_new(self.schema(), columns)?)
    }

    async fn existing_table(&self, collection: &str) -> Result<Option<Table>, StoreError> {
        let names = self.connection.table_names().execute().await?;
        if !names.iter().any(|name| name == collection) {
            return Ok(None);
        }
        Ok(Some(self.connection.open_table(collection).execute().await?))
    }

    async fn table_for_write(&self, collection: &str) -> Result<Table, StoreError> {
        if let Some(table) = self.existing_table(collection).await? {
            return Ok(table);
        }
        info!("Creating collection '{collection}'");
        Ok(self
            .connection
            .create_empty_table(collection, self.schema())
            .execute()
            .await?)
    }
}

#[async_trait]
impl VectorStore for LanceVectorStore {
    async fn add(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), StoreError> {
        validate_collection_name(collection)?;
        if records.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = records.iter().map(|r| r.document.clone()).collect();
        let vectors = self.embedder.embed(texts).await?;
        if vectors.len() != records.len() {
            return Err(EmbedError::CountMismatch {
                expected: records.len(),
                got: vectors.len(),
            }
            .into());
        }

        // Built before the table is touched so a bad batch never creates one.
        let batch = self.record_batch(collection, &records, &vectors)?;
        let table = self.table_for_write(collection).await?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        let mut merge = table.merge_insert(&[ID_COLUMN]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge.execute(Box::new(reader)).await?;

        debug!("Upserted {} entries into '{collection}'", records.len());
        Ok(())
    }

    async fn delete(&self, collection: &str, filter: &MetadataFilter) -> Result<usize, StoreError> {
        validate_collection_name(collection)?;
        if filter.is_empty() {
            return Err(StoreError::Unsupported(
                "delete requires a non-empty metadata filter".to_string(),
            ));
        }
        let predicate = filter.to_predicate()?;

        let Some(table) = self.existing_table(collection).await? else {
            return Ok(0);
        };
        // LanceDB does not report how many rows a delete removed.
        let removed = table.count_rows(Some(predicate.clone())).await?;
        if removed > 0 {
            table.delete(&predicate).await?;
        }
        Ok(removed)
    }

    async fn query(
        &self,
        collection: &str,
        query_texts: &[String],
        filter: Option<&MetadataFilter>,
        n_results: usize,
    ) -> Result<Vec<Vec<Metadata>>, StoreError> {
        validate_collection_name(collection)?;
        if query_texts.is_empty() {
            return Ok(Vec::new());
        }
        let predicate = filter
            .filter(|f| !f.is_empty())
            .map(MetadataFilter::to_predicate)
            .transpose()?;

        let table = match self.existing_table(collection).await? {
            Some(table) if n_results > 0 => table,
            _ => return Ok(vec![Vec::new(); query_texts.len()]),
        };

        let vectors = self.embedder.embed(query_texts.to_vec()).await?;
        let mut groups = Vec::with_capacity(vectors.len());
        for vector in &vectors {
            let mut query = table
                .vector_search(vector.as_slice())?
                .column(VECTOR_COLUMN)
                .distance_type(DistanceType::Cosine)
                .limit(n_results);
            if let Some(predicate) = &predicate {
                query = query.only_if(predicate.as_str());
            }

            let batches: Vec<RecordBatch> = query.execute().await?.try_collect().await?;
            groups.push(nearest_metadata(collection, &batches, n_results)?);
        }
        Ok(groups)
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        validate_collection_name(collection)?;
        match self.existing_table(collection).await? {
            Some(table) => Ok(table.count_rows(None).await?),
            None => Ok(0),
        }
    }
}

/// Metadata of the result rows, nearest first; ties keep result order.
fn nearest_metadata(
    collection: &str,
    batches: &[RecordBatch],
    n_results: usize,
) -> Result<Vec<Metadata>, StoreError> {
    let mut hits: Vec<(f32, Metadata)> = Vec::new();
    for batch in batches {
        let metadata = batch
            .column_by_name(METADATA_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| StoreError::Layout(format!("no '{METADATA_COLUMN}' column")))?;
        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        for row in 0..batch.num_rows() {
            let parsed: Metadata =
                serde_json::from_str(metadata.value(row)).map_err(|source| {
                    StoreError::Metadata {
                        collection: collection.to_string(),
                        source,
                    }
                })?;
            // Zero vectors have no cosine distance; rank them last.
            let distance = distances
                .filter(|d| !d.is_null(row))
                .map(|d| d.value(row))
                .filter(|d| !d.is_nan())
                .unwrap_or(f32::MAX);
            hits.push((distance, parsed));
        }
    }

    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    hits.truncate(n_results);
    Ok(hits.into_iter().map(|(_, metadata)| metadata).collect())
}

/// Collection names become table directory names.
fn validate_collection_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::retrieval::embedding::HashingEmbedder;

    fn record(id: &str, document: &str, pairs: &[(&str, &str)]) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            document: document.to_string(),
            metadata: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    async fn open_store(dir: &Path) -> LanceVectorStore {
        LanceVectorStore::open(dir, Arc::new(HashingEmbedder::new(512)))
            .await
            .unwrap()
    }

    /// Hashing embedder that can be taken offline.
    struct SwitchableEmbedder {
        inner: HashingEmbedder,
        offline: AtomicBool,
    }

    #[async_trait]
    impl Embedder for SwitchableEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(EmbedError::Config("embedder offline".to_string()));
            }
            self.inner.embed(texts).await
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }
    }

    /// Claims one dimension and produces another.
    struct MisreportingEmbedder;

    #[async_trait]
    impl Embedder for MisreportingEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(texts.iter().map(|_| vec![1.0; 4]).collect())
        }

        fn dimension(&self) -> usize {
            8
        }

        fn model_name(&self) -> &str {
            "misreporting"
        }
    }

    #[test]
    fn test_filter_predicate() {
        let filter = MetadataFilter::new().eq("user_id", "u1");
        assert_eq!(filter.to_predicate().unwrap(), "user_id = 'u1'");

        let quoted = MetadataFilter::new().eq("user_id", "o'brien");
        assert_eq!(quoted.to_predicate().unwrap(), "user_id = 'o''brien'");

        let unknown = MetadataFilter::new().eq("type", "profile");
        assert!(matches!(unknown.to_predicate(), Err(StoreError::Unsupported(_))));
    }

    #[test]
    fn test_collection_names_are_file_safe() {
        assert!(validate_collection_name("user_portfolio").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("../escape").is_err());
    }

    #[tokio::test]
    async fn test_add_overwrites_existing_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;

        store
            .add("docs", vec![record("a", "rust services", &[("v", "1")])])
            .await
            .unwrap();
        store
            .add("docs", vec![record("a", "rust services", &[("v", "2")])])
            .await
            .unwrap();

        assert_eq!(store.count("docs").await.unwrap(), 1);
        let hits = store
            .query("docs", &["rust".to_string()], None, 5)
            .await
            .unwrap();
        assert_eq!(hits[0][0].get("v").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn test_delete_by_filter_only_touches_matches() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store
            .add(
                "docs",
                vec![
                    record("a", "alpha", &[("user_id", "1")]),
                    record("b", "beta", &[("user_id", "2")]),
                    record("c", "gamma", &[("user_id", "1")]),
                ],
            )
            .await
            .unwrap();

        let removed = store
            .delete("docs", &MetadataFilter::new().eq("user_id", "1"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_rejects_empty_filter() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let err = store.delete("docs", &MetadataFilter::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_query_returns_one_group_per_text_limited() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store
            .add(
                "docs",
                vec![
                    record("a", "rust tokio", &[("n", "a")]),
                    record("b", "python django", &[("n", "b")]),
                    record("c", "rust axum", &[("n", "c")]),
                ],
            )
            .await
            .unwrap();

        let groups = store
            .query(
                "docs",
                &["django".to_string(), "rust".to_string()],
                None,
                1,
            )
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 1);
        assert_eq!(groups[0][0].get("n").map(String::as_str), Some("b"));
        assert_eq!(groups[1].len(), 1);
    }

    #[tokio::test]
    async fn test_query_filter_scopes_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        store
            .add(
                "docs",
                vec![
                    record("a", "rust crawler", &[("user_id", "1"), ("n", "a")]),
                    record("b", "rust crawler", &[("user_id", "2"), ("n", "b")]),
                ],
            )
            .await
            .unwrap();

        let filter = MetadataFilter::new().eq("user_id", "2");
        let groups = store
            .query("docs", &["rust".to_string()], Some(&filter), 5)
            .await
            .unwrap();
        let names: Vec<&str> = groups[0]
            .iter()
            .filter_map(|m| m.get("n").map(String::as_str))
            .collect();
        assert_eq!(names, vec!["b"]);
    }

    #[tokio::test]
    async fn test_query_on_missing_collection_yields_empty_groups() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let groups = store
            .query("nothing", &["rust".to_string()], None, 3)
            .await
            .unwrap();
        assert_eq!(groups, vec![Vec::<Metadata>::new()]);
    }

    #[tokio::test]
    async fn test_failed_add_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(SwitchableEmbedder {
            inner: HashingEmbedder::new(256),
            offline: AtomicBool::new(false),
        });
        let store = LanceVectorStore::open(dir.path(), embedder.clone())
            .await
            .unwrap();
        store
            .add("docs", vec![record("a", "rust", &[("n", "a")])])
            .await
            .unwrap();

        embedder.offline.store(true, Ordering::SeqCst);
        let err = store
            .add("docs", vec![record("b", "rust axum", &[("n", "b")])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Embedding(_)));

        embedder.offline.store(false, Ordering::SeqCst);
        assert_eq!(store.count("docs").await.unwrap(), 1);
        let hits = store
            .query("docs", &["rust".to_string()], None, 5)
            .await
            .unwrap();
        assert_eq!(hits[0].len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_dimension_never_creates_the_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = LanceVectorStore::open(dir.path(), Arc::new(MisreportingEmbedder))
            .await
            .unwrap();
        let err = store
            .add("docs", vec![record("a", "rust", &[])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Dimension { expected: 8, got: 4 }));
        assert_eq!(store.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_collections_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(dir.path()).await;
            store
                .add("docs", vec![record("a", "alpha", &[("k", "v")])])
                .await
                .unwrap();
        }
        let reopened = open_store(dir.path()).await;
        assert_eq!(reopened.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reopen_with_other_model_discards_vectors() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(dir.path()).await;
            store
                .add("docs", vec![record("a", "alpha", &[("k", "v")])])
                .await
                .unwrap();
        }
        let reopened = LanceVectorStore::open(dir.path(), Arc::new(HashingEmbedder::new(64)))
            .await
            .unwrap();
        assert_eq!(reopened.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_collection_is_discarded_on_open() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(dir.path()).await;
            store
                .add("docs", vec![record("a", "alpha", &[("k", "v")])])
                .await
                .unwrap();
        }

        let table_dir = dir.path().join("docs.lance");
        for entry in std::fs::read_dir(table_dir.join("_versions")).unwrap() {
            std::fs::write(entry.unwrap().path(), b"not a manifest").unwrap();
        }
        let latest = table_dir.join("_latest.manifest");
        if latest.exists() {
            std::fs::write(latest, b"not a manifest").unwrap();
        }

        let reopened = open_store(dir.path()).await;
        assert_eq!(reopened.count("docs").await.unwrap(), 0);
        reopened
            .add("docs", vec![record("b", "beta", &[("k", "v")])])
            .await
            .unwrap();
        assert_eq!(reopened.count("docs").await.unwrap(), 1);
    }
}
