//! Résumé-to-job-description match analysis.

pub mod handlers;
pub mod keywords;
pub mod narrative;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod similarity;
pub mod stopwords;

pub use pipeline::AnalysisPipeline;
