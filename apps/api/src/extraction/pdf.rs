use async_trait::async_trait;
use bytes::Bytes;

use super::{run_blocking, ExtractionError, TextExtractor};
use crate::models::document::{DocumentFormat, ExtractedText, ExtractionWarning};

/// Extracts PDF text page by page and concatenates the pages in order.
/// A page that fails to decode fails the whole document.
pub struct PdfExtractor;

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, bytes: Bytes) -> Result<ExtractedText, ExtractionError> {
        let pages = run_blocking(DocumentFormat::Pdf, move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| ExtractionError::failed(DocumentFormat::Pdf, e))
        })
        .await?;

        Ok(join_pages(pages))
    }
}

fn join_pages(pages: Vec<String>) -> ExtractedText {
    let total = pages.len();
    let empty = pages.iter().filter(|p| p.trim().is_empty()).count();

    // All-empty documents are rejected by the registry; only flag a partial gap.
    let warning = (empty > 0 && empty < total).then_some(ExtractionWarning::EmptyPages { empty, total });

    ExtractedText {
        text: pages.concat(),
        format: DocumentFormat::Pdf,
        warning,
    }
}
