mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod profile;
mod retrieval;
mod routes;
mod state;
mod text;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::retrieval::{
    build_embedder, LanceVectorStore, PortfolioIndex, UserPortfolioIndex, VectorStore,
};
use crate::routes::build_router;
use crate::state::AppState;

const LEGACY_COLLECTION: &str = "portfolio";

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on missing required env vars
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.llm_model.clone(),
        config.llm_max_retries,
    )?;
    info!(
        "LLM client initialized (model: {}, attempts: {})",
        llm.model(),
        config.llm_max_retries
    );

    // Loading a local model reads (and may first download) its weights.
    let embedder = tokio::task::spawn_blocking({
        let config = config.clone();
        move || build_embedder(&config)
    })
    .await
    .context("Embedder initialization task failed")??;
    info!(
        "Embedder: {} ({} dimensions)",
        embedder.model_name(),
        embedder.dimension()
    );

    let store: Arc<dyn VectorStore> = Arc::new(
        LanceVectorStore::open(&config.vector_store_dir, embedder)
            .await
            .with_context(|| {
                format!("Failed to open vector store at {}", config.vector_store_dir.display())
            })?,
    );
    let index = Arc::new(UserPortfolioIndex::new(
        store.clone(),
        config.vector_collection.clone(),
    ));
    info!("Portfolio index ready (collection: {})", index.collection());

    let legacy_index = match &config.legacy_portfolio_csv {
        Some(path) => {
            let legacy = PortfolioIndex::from_csv_path(store.clone(), LEGACY_COLLECTION, path).await?;
            let added = legacy.load().await?;
            info!(
                "Legacy portfolio loaded from {} ({} rows, {added} newly indexed)",
                path.display(),
                legacy.rows().len()
            );
            Some(Arc::new(legacy))
        }
        None => None,
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let state = AppState {
        db,
        llm,
        http,
        index,
        legacy_index,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once a frontend origin is configured

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
