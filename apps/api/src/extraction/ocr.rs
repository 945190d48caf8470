//! OCR capability used by the image extractor.
//!
//! The pipeline only depends on `ImageToText`. `TesseractOcr` is the default
//! backend; locating the binary is left to configuration (`TESSERACT_CMD`).

use std::io;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to stage image for OCR: {0}")]
    Staging(String),

    #[error("failed to launch OCR engine '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("OCR engine exited with {status}: {stderr}")]
    Engine { status: String, stderr: String },
}

/// Recognizes the text in a decoded image.
#[async_trait]
pub trait ImageToText: Send + Sync {
    async fn image_to_text(&self, image: DynamicImage) -> Result<String, OcrError>;
}

/// Runs the `tesseract` CLI on a temporary PNG copy of the image.
pub struct TesseractOcr {
    command: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl ImageToText for TesseractOcr {
    async fn image_to_text(&self, image: DynamicImage) -> Result<String, OcrError> {
        let staged = tokio::task::spawn_blocking(move || stage_png(&image))
            .await
            .map_err(|e| OcrError::Staging(e.to_string()))??;

        let output = Command::new(&self.command)
            .arg(staged.path())
            .arg("stdout")
            .output()
            .await
            .map_err(|source| OcrError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Engine {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("tesseract produced {} bytes of text", text.len());
        Ok(text)
    }
}

/// Writes the image to a temporary PNG. The file is removed when the handle drops.
fn stage_png(image: &DynamicImage) -> Result<NamedTempFile, OcrError> {
    let staged = tempfile::Builder::new()
        .prefix("atsmatch-ocr-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| OcrError::Staging(e.to_string()))?;
    image
        .save_with_format(staged.path(), ImageFormat::Png)
        .map_err(|e| OcrError::Staging(e.to_string()))?;
    Ok(staged)
}
