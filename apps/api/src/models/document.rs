use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Closed set of document formats the extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Png,
    Jpeg,
}

impl DocumentFormat {
    /// Maps a declared MIME content type to a format. Parameters such as
    /// `; charset=...` are ignored and matching is case-insensitive.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PDF_MIME => Some(DocumentFormat::Pdf),
            DOCX_MIME => Some(DocumentFormat::Docx),
            "image/png" => Some(DocumentFormat::Png),
            "image/jpeg" | "image/jpg" => Some(DocumentFormat::Jpeg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Png => "png",
            DocumentFormat::Jpeg => "jpeg",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document. Dropped once text has been extracted.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Bytes,
    pub format: DocumentFormat,
}

/// Non-fatal observations made while extracting text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ExtractionWarning {
    /// Some pages produced no text, often a scanned page inside a text PDF.
    EmptyPages { empty: usize, total: usize },
    /// Very little text came out of the document.
    SparseText { chars: usize },
}

/// Plain text produced by exactly one extractor. Never empty.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub format: DocumentFormat,
    pub warning: Option<ExtractionWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_content_types() {
        assert_eq!(
            DocumentFormat::from_content_type("application/pdf"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_content_type(DOCX_MIME),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_content_type("IMAGE/PNG"),
            Some(DocumentFormat::Png)
        );
        assert_eq!(
            DocumentFormat::from_content_type("image/jpg"),
            Some(DocumentFormat::Jpeg)
        );
        assert_eq!(
            DocumentFormat::from_content_type("application/pdf; name=cv.pdf"),
            Some(DocumentFormat::Pdf)
        );
    }

    #[test]
    fn test_unrecognized_content_types() {
        assert_eq!(DocumentFormat::from_content_type("text/plain"), None);
        assert_eq!(DocumentFormat::from_content_type("application/msword"), None);
        assert_eq!(DocumentFormat::from_content_type(""), None);
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(DocumentFormat::Docx.to_string(), "docx");
        assert_eq!(serde_json::to_string(&DocumentFormat::Jpeg).unwrap(), "\"jpeg\"");
    }
}
