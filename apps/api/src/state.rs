use crate::analysis::AnalysisPipeline;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Extraction, narrative, scoring and history, wired at startup.
    pub pipeline: AnalysisPipeline,
    pub config: Config,
}
