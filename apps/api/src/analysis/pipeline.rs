//! Report aggregation. Sequences extraction, the narrative call, scoring and
//! keyword-gap analysis for one request.
//!
//! Stages run strictly in order:
//! `Pending → Extracting → NarrativeRequested → Scoring → Complete`.
//! Any failure moves the request to `Failed` and no report is produced. In
//! particular a narrative failure discards the score and keywords even though
//! they could have been computed. The history write happens only after
//! `Complete` and its failure is logged, never returned.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::keywords::missing_keywords;
use super::narrative::Narrator;
use super::prompts::build_assessment_prompt;
use super::similarity::match_score;
use crate::errors::AppError;
use crate::extraction::ExtractorRegistry;
use crate::history::{sanitize_user_key, HistoryRepository};
use crate::models::context::RequestContext;
use crate::models::document::Document;
use crate::models::report::{HistoryRecord, MatchReport, MatchVerdict};

/// An uploaded file as received, before its content type has been checked.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Raw input of one analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub job_description: String,
    pub upload: Option<Upload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Extracting,
    NarrativeRequested,
    Scoring,
    Complete,
    Failed(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Pending => f.write_str("pending"),
            Stage::Extracting => f.write_str("extracting"),
            Stage::NarrativeRequested => f.write_str("narrative_requested"),
            Stage::Scoring => f.write_str("scoring"),
            Stage::Complete => f.write_str("complete"),
            Stage::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Current stage of one request. Every transition is logged.
struct StageTracker {
    request_id: Uuid,
    stage: Stage,
}

impl StageTracker {
    fn new(request_id: Uuid) -> Self {
        Self {
            request_id,
            stage: Stage::Pending,
        }
    }

    fn advance(&mut self, next: Stage) {
        info!("[{}] analysis {} -> {}", self.request_id, self.stage, next);
        self.stage = next;
    }
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    registry: ExtractorRegistry,
    narrator: Arc<dyn Narrator>,
    history: Arc<dyn HistoryRepository>,
}

impl AnalysisPipeline {
    pub fn new(
        registry: ExtractorRegistry,
        narrator: Arc<dyn Narrator>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            registry,
            narrator,
            history,
        }
    }

    /// Runs one analysis to completion or to the first failure.
    pub async fn run(
        &self,
        ctx: &RequestContext,
        request: &AnalysisRequest,
    ) -> Result<MatchReport, AppError> {
        info!(
            "[{}] analysis requested by {} at {}",
            ctx.request_id, ctx.user_id, ctx.received_at
        );
        let mut tracker = StageTracker::new(ctx.request_id);

        let report = match self.build_report(request, &mut tracker).await {
            Ok(report) => report,
            Err(e) => {
                tracker.advance(Stage::Failed(e.code().to_string()));
                return Err(e);
            }
        };
        tracker.advance(Stage::Complete);

        self.record_history(ctx, &report, &request.job_description).await;
        Ok(report)
    }

    async fn build_report(
        &self,
        request: &AnalysisRequest,
        tracker: &mut StageTracker,
    ) -> Result<MatchReport, AppError> {
        let upload = validate(request)?;
        let jd = request.job_description.as_str();

        let format = ExtractorRegistry::resolve(&upload.content_type)?;
        tracker.advance(Stage::Extracting);
        let document = Document {
            bytes: upload.bytes.clone(),
            format,
        };
        let extracted = self.registry.extract(&document).await?;

        tracker.advance(Stage::NarrativeRequested);
        let prompt = build_assessment_prompt(jd, &extracted.text);
        let narrative = self
            .narrator
            .assess(&prompt)
            .await
            .map_err(|e| AppError::NarrativeService(e.to_string()))?;

        tracker.advance(Stage::Scoring);
        let score = match_score(jd, &extracted.text);
        let missing_keywords = missing_keywords(jd, &extracted.text);
        let verdict = MatchVerdict::from_score(score);

        Ok(MatchReport {
            score,
            missing_keywords,
            narrative,
            verdict,
            recommendation: verdict.recommendation().to_string(),
            source_filename: upload.filename.clone(),
            extraction_warning: extracted.warning,
            created_at: Utc::now(),
        })
    }

    async fn record_history(&self, ctx: &RequestContext, report: &MatchReport, jd: &str) {
        let user_key = sanitize_user_key(&ctx.user_id);
        let record = HistoryRecord::new(report, jd);
        if let Err(e) = self.history.record(&user_key, &record).await {
            warn!(
                "[{}] failed to save analysis history for {}: {}",
                ctx.request_id, user_key, e
            );
        }
    }
}

/// Checked before any dispatch: a non-blank job description and a non-empty upload.
fn validate(request: &AnalysisRequest) -> Result<&Upload, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description is required".to_string(),
        ));
    }
    let upload = request
        .upload
        .as_ref()
        .ok_or_else(|| AppError::Validation("resume document is required".to_string()))?;
    if upload.bytes.is_empty() {
        return Err(AppError::Validation(format!(
            "uploaded document '{}' is empty",
            upload.filename
        )));
    }
    Ok(upload)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;

    /// Narrator returning a fixed result and counting calls.
    pub struct StubNarrator {
        pub result: Result<String, u16>,
        pub calls: AtomicUsize,
    }

    impl StubNarrator {
        pub fn ok(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        /// Fails every call with the given HTTP status.
        pub fn failing(status: u16) -> Self {
            Self {
                result: Err(status),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Narrator for StubNarrator {
        async fn assess(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(|status| LlmError::Api {
                status,
                message: "Resource has been exhausted".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubNarrator;
    use super::*;
    use crate::extraction::test_support::{docx_with_paragraphs, StubOcr};
    use crate::history::test_support::RecordingHistory;
    use crate::models::document::{DocumentFormat, DOCX_MIME};

    const JD_A: &str = "Python Django REST API experience required";
    const CV_A: &str = "Experienced Python developer skilled in REST APIs";

    struct Harness {
        pipeline: AnalysisPipeline,
        narrator: Arc<StubNarrator>,
        history: Arc<RecordingHistory>,
    }

    fn harness(narrator: StubNarrator, history: RecordingHistory) -> Harness {
        let narrator = Arc::new(narrator);
        let history = Arc::new(history);
        let registry = ExtractorRegistry::new(Arc::new(StubOcr(Ok("ocr text".to_string()))));
        Harness {
            pipeline: AnalysisPipeline::new(registry, narrator.clone(), history.clone()),
            narrator,
            history,
        }
    }

    fn docx_request(jd: &str, resume: &str) -> AnalysisRequest {
        AnalysisRequest {
            job_description: jd.to_string(),
            upload: Some(Upload {
                filename: "jane.docx".to_string(),
                content_type: DOCX_MIME.to_string(),
                bytes: Bytes::from(docx_with_paragraphs(&[resume])),
            }),
        }
    }

    fn ctx(user: &str) -> RequestContext {
        RequestContext::new(Some(user.to_string()))
    }

    #[tokio::test]
    async fn test_scenario_a_partial_match() {
        let h = harness(StubNarrator::ok("**MATCH PERCENTAGE:** 55"), RecordingHistory::default());
        let report = h
            .pipeline
            .run(&ctx("jane.doe@example.com"), &docx_request(JD_A, CV_A))
            .await
            .unwrap();

        assert!(report.score > 0.0 && report.score < 100.0);
        assert!(report.missing_keywords.contains(&"django".to_string()));
        assert_eq!(report.narrative, "**MATCH PERCENTAGE:** 55");
        assert_eq!(report.source_filename, "jane.docx");
        assert_eq!(report.verdict, MatchVerdict::NeedsImprovement);
        assert_eq!(h.narrator.calls(), 1);

        let writes = h.history.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "jane_doe@example_com");
        assert_eq!(writes[0].1.filename, "jane.docx");
        assert_eq!(writes[0].1.match_percentage, report.score);
    }

    #[tokio::test]
    async fn test_scenario_b_identical_texts() {
        let text = "Senior Rust engineer building Tokio services on Postgres";
        let h = harness(StubNarrator::ok("great"), RecordingHistory::default());
        let report = h.pipeline.run(&ctx("anonymous"), &docx_request(text, text)).await.unwrap();

        assert_eq!(report.score, 100.0);
        assert!(report.missing_keywords.is_empty());
        assert_eq!(report.verdict, MatchVerdict::ExcellentMatch);
    }

    #[tokio::test]
    async fn test_scenario_c_unsupported_format() {
        let h = harness(StubNarrator::ok("unused"), RecordingHistory::default());
        let request = AnalysisRequest {
            job_description: JD_A.to_string(),
            upload: Some(Upload {
                filename: "cv.txt".to_string(),
                content_type: "text/plain".to_string(),
                bytes: Bytes::from_static(b"Python developer"),
            }),
        };

        let err = h.pipeline.run(&ctx("anonymous"), &request).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(ref t) if t == "text/plain"));
        assert_eq!(h.narrator.calls(), 0);
        assert!(h.history.writes().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_d_narrative_failure_is_all_or_nothing() {
        let h = harness(StubNarrator::failing(429), RecordingHistory::default());
        let err = h
            .pipeline
            .run(&ctx("anonymous"), &docx_request(JD_A, CV_A))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NarrativeService(ref m) if m.contains("429")));
        assert_eq!(h.narrator.calls(), 1);
        assert!(h.history.writes().is_empty());
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_analysis() {
        let h = harness(StubNarrator::ok("fine"), RecordingHistory::failing());
        let report = h.pipeline.run(&ctx("anonymous"), &docx_request(JD_A, CV_A)).await;
        assert!(report.is_ok());
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_narrative() {
        let h = harness(StubNarrator::ok("unused"), RecordingHistory::default());
        let request = AnalysisRequest {
            job_description: JD_A.to_string(),
            upload: Some(Upload {
                filename: "cv.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: Bytes::from_static(b"not a pdf at all"),
            }),
        };

        let err = h.pipeline.run(&ctx("anonymous"), &request).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ExtractionFailed {
                format: DocumentFormat::Pdf,
                ..
            }
        ));
        assert_eq!(h.narrator.calls(), 0);
        assert!(h.history.writes().is_empty());
    }

    #[tokio::test]
    async fn test_validation_happens_before_dispatch() {
        let h = harness(StubNarrator::ok("unused"), RecordingHistory::default());

        let blank_jd = docx_request("   ", CV_A);
        let err = h.pipeline.run(&ctx("anonymous"), &blank_jd).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let no_upload = AnalysisRequest {
            job_description: JD_A.to_string(),
            upload: None,
        };
        let err = h.pipeline.run(&ctx("anonymous"), &no_upload).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // An empty file is a validation error even with an unsupported type.
        let empty = AnalysisRequest {
            job_description: JD_A.to_string(),
            upload: Some(Upload {
                filename: "cv.txt".to_string(),
                content_type: "text/plain".to_string(),
                bytes: Bytes::new(),
            }),
        };
        let err = h.pipeline.run(&ctx("anonymous"), &empty).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(h.narrator.calls(), 0);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::NarrativeRequested.to_string(), "narrative_requested");
        assert_eq!(
            Stage::Failed("EXTRACTION_FAILED".into()).to_string(),
            "failed (EXTRACTION_FAILED)"
        );
    }
}
