use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::analysis::pipeline::{AnalysisRequest, Upload};
use crate::errors::AppError;
use crate::models::context::RequestContext;
use crate::models::report::{DownloadableReport, MatchReport};
use crate::state::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const FALLBACK_FILENAME: &str = "resume";

/// POST /api/v1/analyses
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchReport>, AppError> {
    let (ctx, request) = read_form(multipart).await?;
    let report = state.pipeline.run(&ctx, &request).await?;
    Ok(Json(report))
}

/// POST /api/v1/analyses/report
/// Same input as `handle_analyze`; answers with the downloadable JSON report.
/// Each call is a full, independent analysis: one narrative call and one
/// history row. Reports are not kept between requests, so there is no earlier
/// run to download from.
pub async fn handle_download_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (ctx, request) = read_form(multipart).await?;
    let report = state.pipeline.run(&ctx, &request).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        DownloadableReport::attachment_name(&report)
    );
    let body = DownloadableReport::new(&report, &request.job_description);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(body)))
}

/// Reads `job_description`, `resume` and the optional `user_id` fields.
/// Unknown fields are ignored.
async fn read_form(mut multipart: Multipart) -> Result<(RequestContext, AnalysisRequest), AppError> {
    let mut request = AnalysisRequest::default();
    let mut user_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => {
                request.job_description = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid job_description: {}", e.body_text()))
                })?;
            }
            "user_id" => {
                user_id = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid user_id: {}", e.body_text()))
                })?);
            }
            "resume" => {
                let filename = field.file_name().unwrap_or(FALLBACK_FILENAME).to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read resume upload: {}", e.body_text()))
                })?;
                request.upload = Some(Upload {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok((RequestContext::new(user_id), request))
}
