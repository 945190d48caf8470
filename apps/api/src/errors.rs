use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::models::document::DocumentFormat;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant that can end an analysis maps to a distinct error code, so the
/// caller can tell which pipeline stage failed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to extract text from {format} document: {cause}")]
    ExtractionFailed {
        format: DocumentFormat,
        cause: String,
    },

    #[error("OCR failure: {0}")]
    OcrFailure(String),

    #[error("Narrative service error: {0}")]
    NarrativeService(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            AppError::OcrFailure(_) => "OCR_FAILURE",
            AppError::NarrativeService(_) => "NARRATIVE_SERVICE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedFormat(content_type) => {
                AppError::UnsupportedFormat(content_type)
            }
            ExtractionError::Failed { format, cause } => AppError::ExtractionFailed { format, cause },
            ExtractionError::Ocr(msg) => AppError::OcrFailure(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::UnsupportedFormat(content_type) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Unsupported document type '{content_type}'. Upload a PDF, DOCX, PNG or JPEG file."),
            ),
            AppError::ExtractionFailed { .. } | AppError::OcrFailure(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::NarrativeService(msg) => {
                tracing::error!("Narrative service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "The AI assessment service failed; no report was produced".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
