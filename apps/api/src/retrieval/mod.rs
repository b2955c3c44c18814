// Retrieval layer: embeddings, a persistent vector store, and the two
// portfolio indexes built on it (per-user and the legacy CSV one).

pub mod documents;
pub mod embedding;
pub mod handlers;
pub mod legacy;
pub mod store;
pub mod user_index;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{Config, EmbeddingProvider};

#[cfg(test)]
pub use embedding::HashingEmbedder;
pub use embedding::{EmbedError, Embedder, FastEmbedder, OpenAiEmbedder};
pub use legacy::PortfolioIndex;
pub use store::{LanceVectorStore, StoreError, VectorStore};
pub use user_index::{RebuildSummary, UserPortfolioIndex, UserRecords};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("user_id must not be empty")]
    EmptyUserId,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("portfolio CSV line {line}: {message}")]
    Csv { line: usize, message: String },
}

/// Builds the embedder selected by `EMBEDDING_PROVIDER`.
///
/// The local provider loads model weights, so call this off the async executor.
pub fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbedError> {
    match config.embedding_provider {
        EmbeddingProvider::Local => Ok(Arc::new(FastEmbedder::new(
            &config.embedding_model,
            config.embedding_cache_dir.clone(),
        )?)),
        EmbeddingProvider::OpenAi => {
            let api_key = config.openai_api_key.as_deref().unwrap_or_default();
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key,
                &config.embedding_base_url,
                config.embedding_model.clone(),
                config.embedding_dimension,
                Duration::from_secs(30),
            )?))
        }
    }
}
