use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::document::ExtractionWarning;

/// Characters of the job description kept in a history record.
pub const HISTORY_EXCERPT_CHARS: usize = 100;
/// Missing keywords kept in a history record.
pub const HISTORY_KEYWORDS: usize = 5;

/// Coarse reading of the match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchVerdict {
    NeedsImprovement,
    GoodMatch,
    ExcellentMatch,
}

impl MatchVerdict {
    /// score < 60 → needs improvement, < 80 → good, otherwise excellent.
    pub fn from_score(score: f64) -> Self {
        if score < 60.0 {
            MatchVerdict::NeedsImprovement
        } else if score < 80.0 {
            MatchVerdict::GoodMatch
        } else {
            MatchVerdict::ExcellentMatch
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            MatchVerdict::NeedsImprovement => {
                "Your resume needs significant improvements to match this job description."
            }
            MatchVerdict::GoodMatch => {
                "Your resume is a good match but could be optimized further."
            }
            MatchVerdict::ExcellentMatch => {
                "Excellent match! Your resume aligns well with the job requirements."
            }
        }
    }
}

/// The single output of one successful analysis. Built once by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    /// 0.00 – 100.00, two decimals.
    pub score: f64,
    /// At most 10 distinct lower-case terms, most frequent in the JD first.
    pub missing_keywords: Vec<String>,
    pub narrative: String,
    pub verdict: MatchVerdict,
    pub recommendation: String,
    pub source_filename: String,
    pub extraction_warning: Option<ExtractionWarning>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// JSON document offered to the user as a downloadable analysis report.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadableReport {
    pub job_description: String,
    pub filename: String,
    pub match_percentage: f64,
    pub missing_keywords: Vec<String>,
    pub ai_analysis: String,
    pub timestamp: String,
}

impl DownloadableReport {
    pub fn new(report: &MatchReport, job_description: &str) -> Self {
        Self {
            job_description: job_description.to_string(),
            filename: report.source_filename.clone(),
            match_percentage: report.score,
            missing_keywords: report.missing_keywords.clone(),
            ai_analysis: report.narrative.clone(),
            timestamp: report.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Attachment filename: `ats_analysis_<source>_<unix seconds>.json`.
    pub fn attachment_name(report: &MatchReport) -> String {
        let safe: String = report
            .source_filename
            .chars()
            .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
            .collect();
        format!("ats_analysis_{}_{}.json", safe, report.created_at.timestamp())
    }
}

/// Persisted projection of a `MatchReport`. Written once, never read back by the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub job_description: String,
    pub filename: String,
    pub match_percentage: f64,
    pub missing_keywords: Vec<String>,
    /// Unix seconds.
    pub timestamp: i64,
}

impl HistoryRecord {
    pub fn new(report: &MatchReport, job_description: &str) -> Self {
        Self {
            job_description: excerpt(job_description, HISTORY_EXCERPT_CHARS),
            filename: report.source_filename.clone(),
            match_percentage: report.score,
            missing_keywords: report
                .missing_keywords
                .iter()
                .take(HISTORY_KEYWORDS)
                .cloned()
                .collect(),
            timestamp: report.created_at.timestamp(),
        }
    }
}

/// First `max_chars` characters, with "..." appended when the text was longer.
fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
