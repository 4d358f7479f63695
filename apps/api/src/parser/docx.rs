//! Minimal DOCX text extraction: reads `word/document.xml` out of the zip container.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;

use super::ParseError;

const DOCUMENT_XML: &str = "word/document.xml";

static PARAGRAPH_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"</w:p>|<w:br\s*/>").expect("valid regex"));
static TAB: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:tab\s*/>").expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

pub fn extract_text(bytes: &[u8]) -> Result<String, ParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParseError::Corrupt(format!("invalid DOCX container: {e}")))?;

    let mut entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|_| ParseError::Corrupt(format!("DOCX is missing {DOCUMENT_XML}")))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ParseError::Corrupt(format!("unreadable {DOCUMENT_XML}: {e}")))?;

    Ok(xml_to_text(&xml))
}

fn xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = TAB.replace_all(&text, " ");
    let text = TAG.replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Builds an in-memory DOCX whose body contains one paragraph per entry.
    pub(crate) fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(DOCUMENT_XML, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extracts_paragraphs_as_lines() {
        let bytes = docx_with_paragraphs(&["Jane Doe", "Skills: Rust &amp; Python"]);
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text.trim(), "Jane Doe\nSkills: Rust & Python");
    }

    #[test]
    fn test_tabs_become_spaces() {
        assert_eq!(
            xml_to_text("<w:p><w:r><w:t>SQL</w:t><w:tab/><w:t>Docker</w:t></w:r></w:p>"),
            "SQL Docker\n"
        );
    }

    #[test]
    fn test_non_zip_bytes_are_corrupt() {
        let err = extract_text(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ParseError::Corrupt(_)));
    }

    #[test]
    fn test_zip_without_document_is_corrupt() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hello").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_text(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::Corrupt(msg) if msg.contains(DOCUMENT_XML)));
    }
}
