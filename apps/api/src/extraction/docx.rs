//! DOCX extraction of body paragraphs only.
//!
//! Reads `word/document.xml` and emits the text of each top-level `<w:p>` in
//! document order, followed by a line break. Tables, headers, footers and text
//! boxes are not extracted.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use super::{run_blocking, ExtractionError, TextExtractor};
use crate::models::document::{DocumentFormat, ExtractedText};

const DOCUMENT_PART: &str = "word/document.xml";
const WORDML_NS: &[u8] = b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub struct DocxExtractor;

#[async_trait]
impl TextExtractor for DocxExtractor {
    async fn extract(&self, bytes: Bytes) -> Result<ExtractedText, ExtractionError> {
        let text = run_blocking(DocumentFormat::Docx, move || {
            read_document_xml(&bytes)
                .and_then(|xml| paragraph_text(&xml))
                .map_err(|cause| ExtractionError::failed(DocumentFormat::Docx, cause))
        })
        .await?;

        Ok(ExtractedText {
            text,
            format: DocumentFormat::Docx,
            warning: None,
        })
    }
}

fn read_document_xml(bytes: &[u8]) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| format!("Failed to open DOCX container: {e}"))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| format!("Missing {DOCUMENT_PART}: {e}"))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| format!("Failed to read {DOCUMENT_PART}: {e}"))?;
    Ok(xml)
}

fn paragraph_text(xml: &str) -> Result<String, String> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut out = String::new();
    let mut paragraph: Option<String> = None;

    let failure = loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                let element = wordml_name(&ns, e.local_name().as_ref());
                if is_named(&element, b"p") && is_body(&stack) {
                    paragraph = Some(String::new());
                }
                stack.push(element);
            }
            Ok((ns, Event::Empty(e))) => {
                let element = wordml_name(&ns, e.local_name().as_ref());
                if is_named(&element, b"p") && is_body(&stack) {
                    out.push('\n');
                } else if let Some(para) = paragraph.as_mut() {
                    if in_run(&stack) {
                        match element.as_deref() {
                            Some(b"tab") => para.push('\t'),
                            Some(b"br") | Some(b"cr") => para.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Ok((_, Event::Text(t))) => {
                if let Some(para) = paragraph.as_mut() {
                    let in_text = stack
                        .split_last()
                        .is_some_and(|(last, parents)| is_named(last, b"t") && in_run(parents));
                    if in_text {
                        let text = t
                            .unescape()
                            .map_err(|e| format!("Invalid text in {DOCUMENT_PART}: {e}"))?;
                        para.push_str(&text);
                    }
                }
            }
            Ok((_, Event::End(_))) => {
                stack.pop();
                if is_body(&stack) {
                    if let Some(para) = paragraph.take() {
                        out.push_str(&para);
                        out.push('\n');
                    }
                }
            }
            Ok((_, Event::Eof)) => break None,
            Err(e) => break Some(e),
            _ => {}
        }
    };

    match failure {
        Some(e) => Err(format!(
            "Malformed {DOCUMENT_PART} at byte {}: {e}",
            reader.buffer_position()
        )),
        None => Ok(out),
    }
}

/// Local name of a WordprocessingML element; `None` for any other namespace.
/// Matching on the resolved namespace makes the prefix irrelevant.
type Element = Option<Vec<u8>>;

fn wordml_name(ns: &ResolveResult, local: &[u8]) -> Element {
    match ns {
        ResolveResult::Bound(Namespace(uri)) if *uri == WORDML_NS => Some(local.to_vec()),
        _ => None,
    }
}

fn is_named(element: &Element, local: &[u8]) -> bool {
    element.as_deref() == Some(local)
}

/// True when the element stack is exactly `document/body`.
fn is_body(stack: &[Element]) -> bool {
    stack.len() == 2 && is_named(&stack[1], b"body")
}

/// True when the stack ends inside a run of a body paragraph, directly or via a hyperlink.
fn in_run(stack: &[Element]) -> bool {
    if stack.len() < 4 || !is_body(&stack[..2]) || !is_named(&stack[2], b"p") {
        return false;
    }
    match &stack[3..] {
        [run] => is_named(run, b"r"),
        [link, run] => is_named(link, b"hyperlink") && is_named(run, b"r"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::test_support::{docx_archive, docx_bytes};

    async fn extract(body: &str) -> Result<ExtractedText, ExtractionError> {
        DocxExtractor.extract(Bytes::from(docx_bytes(body))).await
    }

    #[tokio::test]
    async fn test_paragraphs_joined_with_line_breaks() {
        let text = extract(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Rust </w:t></w:r><w:r><w:t>engineer</w:t></w:r></w:p>",
        )
        .await
        .unwrap()
        .text;
        assert_eq!(text, "Jane Doe\nRust engineer\n");
    }

    #[tokio::test]
    async fn test_empty_paragraph_keeps_line_break() {
        let text = extract("<w:p><w:r><w:t>A</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>B</w:t></w:r></w:p>")
            .await
            .unwrap()
            .text;
        assert_eq!(text, "A\n\nB\n");
    }

    #[tokio::test]
    async fn test_tables_are_not_extracted() {
        let text = extract(
            "<w:p><w:r><w:t>Skills</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Kubernetes</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        )
        .await
        .unwrap()
        .text;
        assert_eq!(text, "Skills\n");
    }

    #[tokio::test]
    async fn test_hyperlinks_tabs_and_entities() {
        let text = extract(
            "<w:p><w:hyperlink><w:r><w:t>github.com/jane</w:t></w:r></w:hyperlink>\
             <w:r><w:tab/><w:t>R&amp;D</w:t></w:r></w:p>",
        )
        .await
        .unwrap()
        .text;
        assert_eq!(text, "github.com/jane\tR&D\n");
    }

    #[tokio::test]
    async fn test_not_a_zip_fails() {
        let err = DocxExtractor
            .extract(Bytes::from_static(b"plain bytes"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Failed {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_xml_fails() {
        let err = extract("<w:p><w:r><w:t>unterminated</w:r></w:p>")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_namespace_prefix_is_resolved_not_matched_literally() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns0:document xmlns:ns0="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><ns0:body><ns0:p><ns0:r><ns0:t>Senior Rust engineer</ns0:t></ns0:r></ns0:p></ns0:body></ns0:document>"#;
        let text = DocxExtractor
            .extract(Bytes::from(docx_archive(xml)))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "Senior Rust engineer\n");
    }

    #[tokio::test]
    async fn test_default_namespace_is_resolved() {
        let xml = r#"<document xmlns="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><body><p><r><t>Kafka</t></r></p></body></document>"#;
        let text = DocxExtractor
            .extract(Bytes::from(docx_archive(xml)))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "Kafka\n");
    }

    #[tokio::test]
    async fn test_w_prefix_bound_to_other_namespace_is_ignored() {
        let xml = r#"<w:document xmlns:w="urn:example:not-wordml"><w:body><w:p><w:r><w:t>hidden</w:t></w:r></w:p></w:body></w:document>"#;
        let text = DocxExtractor
            .extract(Bytes::from(docx_archive(xml)))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "");
    }
}
