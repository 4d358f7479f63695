//! CV file parsing: PDF / DOCX / plain text → normalized, content-addressed `ParsedCv`.

pub mod clean;
pub mod docx;

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::truncate_chars;
use crate::models::cv::ParsedCv;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unsupported file format: {0}. Upload a PDF, DOCX or TXT file")]
    Unsupported(String),

    #[error("Could not read document: {0}")]
    Corrupt(String),

    #[error("Document contains no readable text")]
    Empty,
}

/// The document formats the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Resolves the format from the upload's file name, falling back to its content type.
    /// Uploads without any hint are read as plain text.
    pub fn detect(file_name: Option<&str>, content_type: Option<&str>) -> Result<Self, ParseError> {
        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        if let Some(ext) = extension {
            return match ext.as_str() {
                "pdf" => Ok(DocumentKind::Pdf),
                "docx" => Ok(DocumentKind::Docx),
                "txt" | "text" | "md" => Ok(DocumentKind::Text),
                _ => Err(ParseError::Unsupported(
                    file_name.unwrap_or_default().to_string(),
                )),
            };
        }

        match content_type.map(|ct| ct.to_ascii_lowercase()) {
            Some(ct) if ct == "application/pdf" => Ok(DocumentKind::Pdf),
            Some(ct) if ct.contains("wordprocessingml.document") => Ok(DocumentKind::Docx),
            Some(ct) if ct.starts_with("text/") || ct == "application/octet-stream" => {
                Ok(DocumentKind::Text)
            }
            Some(ct) => Err(ParseError::Unsupported(ct)),
            None => Ok(DocumentKind::Text),
        }
    }
}

/// Extracts, normalizes and truncates the text of a document.
///
/// CPU-bound and may run third-party format code; callers on the async runtime
/// should run it via `spawn_blocking`.
pub fn parse(bytes: &[u8], kind: DocumentKind, max_chars: usize) -> Result<ParsedCv, ParseError> {
    let raw = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ParseError::Corrupt(format!("invalid PDF: {e}")))?,
        DocumentKind::Docx => docx::extract_text(bytes)?,
        DocumentKind::Text => String::from_utf8_lossy(bytes).into_owned(),
    };

    let cleaned = clean::clean_text(&raw);
    let text = truncate_chars(&cleaned, max_chars).trim_end().to_string();
    debug!(
        "Parsed {:?} document: raw_len={} normalized_len={}",
        kind,
        raw.len(),
        text.len()
    );

    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    Ok(ParsedCv::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(DocumentKind::detect(Some("cv.PDF"), None).unwrap(), DocumentKind::Pdf);
        assert_eq!(
            DocumentKind::detect(Some("cv.docx"), Some("application/octet-stream")).unwrap(),
            DocumentKind::Docx
        );
        assert_eq!(DocumentKind::detect(Some("cv.txt"), None).unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::detect(Some("cv.md"), None).unwrap(), DocumentKind::Text);
    }

    #[test]
    fn test_detect_rejects_unknown_extension() {
        let err = DocumentKind::detect(Some("photo.png"), Some("image/png")).unwrap_err();
        assert!(matches!(err, ParseError::Unsupported(name) if name == "photo.png"));
        assert!(DocumentKind::detect(Some("legacy.doc"), None).is_err());
    }

    #[test]
    fn test_detect_falls_back_to_content_type() {
        assert_eq!(
            DocumentKind::detect(None, Some("application/pdf")).unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::detect(
                Some("resume"),
                Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
            )
            .unwrap(),
            DocumentKind::Docx
        );
        assert_eq!(
            DocumentKind::detect(None, Some("text/plain; charset=utf-8")).unwrap(),
            DocumentKind::Text
        );
        assert!(DocumentKind::detect(None, Some("image/jpeg")).is_err());
        assert_eq!(DocumentKind::detect(None, None).unwrap(), DocumentKind::Text);
    }

    #[test]
    fn test_parse_text_normalizes_and_hashes() {
        let cv = parse(b"  Jane Doe\n\nSkills: Python, SQL  ", DocumentKind::Text, 1000).unwrap();
        assert_eq!(cv.text, "Jane Doe Skills: Python, SQL");
        assert_eq!(cv.id, crate::models::cv::content_id("Jane Doe Skills: Python, SQL"));
    }

    #[test]
    fn test_same_normalized_content_same_id() {
        let a = parse(b"Python   SQL", DocumentKind::Text, 1000).unwrap();
        let b = parse(b"Python\nSQL\n", DocumentKind::Text, 1000).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_parse_truncates_to_max_chars() {
        let cv = parse(b"abcdefghij", DocumentKind::Text, 4).unwrap();
        assert_eq!(cv.text, "abcd");
    }

    #[test]
    fn test_parse_empty_content_is_error() {
        assert!(matches!(parse(b"   \n\t ", DocumentKind::Text, 1000), Err(ParseError::Empty)));
        assert!(matches!(parse(b"", DocumentKind::Text, 1000), Err(ParseError::Empty)));
    }

    #[test]
    fn test_parse_garbage_pdf_is_corrupt() {
        let err = parse(b"this is not a pdf", DocumentKind::Pdf, 1000).unwrap_err();
        assert!(matches!(err, ParseError::Corrupt(_)));
    }

    #[test]
    fn test_parse_docx() {
        let bytes = docx::tests::docx_with_paragraphs(&["Data Engineer", "Spark, Airflow"]);
        let cv = parse(&bytes, DocumentKind::Docx, 1000).unwrap();
        assert_eq!(cv.text, "Data Engineer Spark, Airflow");
    }
}
