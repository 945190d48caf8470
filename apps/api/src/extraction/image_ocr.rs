use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;

use super::ocr::ImageToText;
use super::{run_blocking, ExtractionError, TextExtractor};
use crate::models::document::{DocumentFormat, ExtractedText};

/// Decodes a PNG or JPEG upload and hands it to the OCR capability.
pub struct ImageExtractor {
    format: DocumentFormat,
    ocr: Arc<dyn ImageToText>,
}

impl ImageExtractor {
    pub fn new(format: DocumentFormat, ocr: Arc<dyn ImageToText>) -> Self {
        Self { format, ocr }
    }

    fn image_format(&self) -> ImageFormat {
        match self.format {
            DocumentFormat::Jpeg => ImageFormat::Jpeg,
            _ => ImageFormat::Png,
        }
    }
}

#[async_trait]
impl TextExtractor for ImageExtractor {
    async fn extract(&self, bytes: Bytes) -> Result<ExtractedText, ExtractionError> {
        let format = self.format;
        let image_format = self.image_format();
        let image = run_blocking(format, move || {
            image::load_from_memory_with_format(&bytes, image_format)
                .map_err(|e| ExtractionError::failed(format, format!("Invalid image data: {e}")))
        })
        .await?;

        let text = self
            .ocr
            .image_to_text(image)
            .await
            .map_err(|e| ExtractionError::Ocr(e.to_string()))?;

        Ok(ExtractedText {
            text,
            format,
            warning: None,
        })
    }
}
