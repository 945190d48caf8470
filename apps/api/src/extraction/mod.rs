//! Text extraction. Turns an uploaded document into plain text.
//!
//! `ExtractorRegistry` is the format dispatcher: the declared content type is
//! resolved to a `DocumentFormat` first, and only recognized formats ever reach
//! an extractor. Each format maps to one `TextExtractor` implementation.
//!
//! Extraction never succeeds with empty text. A document that decodes but
//! yields nothing is reported as `ExtractionError::Failed`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::models::document::{Document, DocumentFormat, ExtractedText, ExtractionWarning};

pub mod docx;
pub mod image_ocr;
pub mod ocr;
pub mod pdf;

use self::docx::DocxExtractor;
use self::image_ocr::ImageExtractor;
use self::ocr::ImageToText;
use self::pdf::PdfExtractor;

/// Below this many characters the extracted text is flagged as sparse.
const SPARSE_TEXT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported content type: {0}")]
    UnsupportedFormat(String),

    #[error("{format} extraction failed: {cause}")]
    Failed {
        format: DocumentFormat,
        cause: String,
    },

    #[error("OCR failed: {0}")]
    Ocr(String),
}

impl ExtractionError {
    pub fn failed(format: DocumentFormat, cause: impl ToString) -> Self {
        ExtractionError::Failed {
            format,
            cause: cause.to_string(),
        }
    }
}

/// One format-specific way of turning raw bytes into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Bytes) -> Result<ExtractedText, ExtractionError>;
}

/// Maps each supported format to its extractor.
#[derive(Clone)]
pub struct ExtractorRegistry {
    pdf: Arc<dyn TextExtractor>,
    docx: Arc<dyn TextExtractor>,
    png: Arc<dyn TextExtractor>,
    jpeg: Arc<dyn TextExtractor>,
}

impl ExtractorRegistry {
    /// Builds the default registry. Image formats share the given OCR capability.
    pub fn new(ocr: Arc<dyn ImageToText>) -> Self {
        Self {
            pdf: Arc::new(PdfExtractor),
            docx: Arc::new(DocxExtractor),
            png: Arc::new(ImageExtractor::new(DocumentFormat::Png, ocr.clone())),
            jpeg: Arc::new(ImageExtractor::new(DocumentFormat::Jpeg, ocr)),
        }
    }

    /// Resolves a declared content type. Unknown types are rejected here,
    /// before any bytes are parsed.
    pub fn resolve(content_type: &str) -> Result<DocumentFormat, ExtractionError> {
        DocumentFormat::from_content_type(content_type)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(content_type.to_string()))
    }

    pub fn extractor_for(&self, format: DocumentFormat) -> &dyn TextExtractor {
        match format {
            DocumentFormat::Pdf => self.pdf.as_ref(),
            DocumentFormat::Docx => self.docx.as_ref(),
            DocumentFormat::Png => self.png.as_ref(),
            DocumentFormat::Jpeg => self.jpeg.as_ref(),
        }
    }

    pub async fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractionError> {
        let extracted = self
            .extractor_for(document.format)
            .extract(document.bytes.clone())
            .await?;
        finish(extracted)
    }
}

/// Enforces the non-empty invariant and attaches a sparse-text warning.
fn finish(mut extracted: ExtractedText) -> Result<ExtractedText, ExtractionError> {
    let chars = extracted.text.trim().chars().count();
    if chars == 0 {
        return Err(ExtractionError::failed(
            extracted.format,
            "document contains no extractable text",
        ));
    }

    if extracted.warning.is_none() && chars < SPARSE_TEXT_CHARS {
        extracted.warning = Some(ExtractionWarning::SparseText { chars });
    }

    debug!(
        "Extracted {} chars from {} document (warning: {:?})",
        chars, extracted.format, extracted.warning
    );
    Ok(extracted)
}

/// Runs a CPU-bound decoder off the async runtime. A panicking decoder is
/// reported as a failed extraction.
pub(crate) async fn run_blocking<T, F>(format: DocumentFormat, decode: F) -> Result<T, ExtractionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ExtractionError> + Send + 'static,
{
    match tokio::task::spawn_blocking(decode).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(ExtractionError::failed(format, "decoder panicked on malformed input")),
        Err(e) => Err(ExtractionError::failed(format, e)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Write};

    use ::image::{DynamicImage, ImageFormat, RgbImage};
    use async_trait::async_trait;

    use super::ocr::{ImageToText, OcrError};

    /// OCR stub returning a fixed result.
    pub struct StubOcr(pub Result<String, String>);

    #[async_trait]
    impl ImageToText for StubOcr {
        async fn image_to_text(&self, _image: DynamicImage) -> Result<String, OcrError> {
            self.0.clone().map_err(|stderr| OcrError::Engine {
                status: "exit status: 1".to_string(),
                stderr,
            })
        }
    }

    /// Builds a minimal DOCX container around the given `<w:body>` content.
    pub fn docx_bytes(body_xml: &str) -> Vec<u8> {
        docx_archive(&format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body_xml}</w:body></w:document>"#
        ))
    }

    /// Zips a complete `word/document.xml` into a DOCX container.
    pub fn docx_archive(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// Builds a DOCX with one plain paragraph per string.
    pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        docx_bytes(&body)
    }

    pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }
}
