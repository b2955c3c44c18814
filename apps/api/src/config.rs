use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_MODEL;
use crate::retrieval::embedding::DEFAULT_LOCAL_MODEL;

const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Which embedding backend the vector store uses.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingProvider {
    /// Sentence-transformer model run in-process (fastembed).
    Local,
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub llm_max_retries: u32,
    pub port: u16,
    pub rust_log: String,
    pub vector_store_dir: PathBuf,
    pub vector_collection: String,
    pub embedding_provider: EmbeddingProvider,
    pub embedding_dimension: usize,
    pub openai_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_base_url: String,
    /// Where local model weights are downloaded.
    pub embedding_cache_dir: PathBuf,
    pub link_query_limit: usize,
    pub legacy_portfolio_csv: Option<PathBuf>,
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let embedding_provider = match env_or("EMBEDDING_PROVIDER", "local")
            .to_ascii_lowercase()
            .as_str()
        {
            "local" | "fastembed" => EmbeddingProvider::Local,
            "openai" => EmbeddingProvider::OpenAi,
            other => bail!("EMBEDDING_PROVIDER must be 'local' or 'openai', got '{other}'"),
        };
        let default_embedding_model = match embedding_provider {
            EmbeddingProvider::Local => DEFAULT_LOCAL_MODEL,
            EmbeddingProvider::OpenAi => DEFAULT_OPENAI_EMBEDDING_MODEL,
        };

        let openai_api_key = optional_env("OPENAI_API_KEY");
        if embedding_provider == EmbeddingProvider::OpenAi && openai_api_key.is_none() {
            bail!("OPENAI_API_KEY is required when EMBEDDING_PROVIDER=openai");
        }

        let link_query_limit = parse_env("LINK_QUERY_LIMIT", 3usize)?;
        if link_query_limit == 0 {
            bail!("LINK_QUERY_LIMIT must be at least 1");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: env_or("LLM_MODEL", DEFAULT_MODEL),
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 1u32)?.max(1),
            port: parse_env("PORT", 8080u16)?,
            rust_log: env_or("RUST_LOG", "info"),
            vector_store_dir: PathBuf::from(env_or("VECTOR_STORE_DIR", "vectorstore")),
            vector_collection: env_or("VECTOR_COLLECTION", "user_portfolio"),
            embedding_provider,
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", 384usize)?,
            openai_api_key,
            embedding_model: env_or("EMBEDDING_MODEL", default_embedding_model),
            embedding_base_url: env_or("EMBEDDING_BASE_URL", "https://api.openai.com/v1"),
            embedding_cache_dir: PathBuf::from(env_or("EMBEDDING_CACHE_DIR", ".fastembed_cache")),
            link_query_limit,
            legacy_portfolio_csv: optional_env("LEGACY_PORTFOLIO_CSV").map(PathBuf::from),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "data/uploads")),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
