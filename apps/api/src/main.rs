mod analysis;
mod config;
mod db;
mod errors;
mod extraction;
mod history;
mod llm_client;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::narrative::GeminiNarrator;
use crate::analysis::AnalysisPipeline;
use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::ocr::TesseractOcr;
use crate::extraction::ExtractorRegistry;
use crate::history::{DisabledHistory, HistoryRepository, PgHistoryRepository};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting atsmatch API v{}", env!("CARGO_PKG_VERSION"));

    // Extractors; images go through the tesseract CLI
    let ocr = Arc::new(TesseractOcr::new(config.tesseract_cmd.clone()));
    let registry = ExtractorRegistry::new(ocr);
    info!("OCR backend: {}", config.tesseract_cmd);

    // Initialize LLM client
    let llm = LlmClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.narrative_timeout_secs),
    );
    info!("LLM client initialized (model: {})", llm.model());

    // History is optional
    let history: Arc<dyn HistoryRepository> = match &config.database_url {
        Some(url) => Arc::new(PgHistoryRepository::new(create_pool(url).await?)),
        None => Arc::new(DisabledHistory::new()),
    };

    let pipeline = AnalysisPipeline::new(registry, Arc::new(GeminiNarrator(llm)), history);

    // Build app state
    let state = AppState {
        pipeline,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
