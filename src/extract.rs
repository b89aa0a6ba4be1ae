//! Text extraction
//!
//! Pure functions over uploaded bytes: PDFs are parsed page by page with
//! lopdf, transcripts are decoded as UTF-8 with a permissive single-byte
//! fallback. No I/O happens here.

use crate::errors::AppError;
use serde::Serialize;
use tracing::{debug, warn};

/// Declared kind of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Transcript,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Transcript => "transcript",
        }
    }

    /// Map a declared media type to a kind
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "application/pdf" => Some(FileKind::Pdf),
            "text/plain" => Some(FileKind::Transcript),
            _ => None,
        }
    }

    /// Resolve the kind of an upload from its filename and declared media
    /// type. Used for the quiz results file, which may be either format.
    pub fn detect(filename: &str, media_type: &str) -> Result<Self, AppError> {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".pdf") || media_type == "application/pdf" {
            Ok(FileKind::Pdf)
        } else if lower.ends_with(".txt") || media_type == "text/plain" {
            Ok(FileKind::Transcript)
        } else {
            Err(AppError::UnsupportedType(format!(
                "{} ({}): only .pdf and .txt are allowed",
                filename, media_type
            )))
        }
    }
}

/// Extract plain text from raw upload bytes according to the declared kind
pub fn extract(bytes: &[u8], kind: FileKind) -> Result<String, AppError> {
    match kind {
        FileKind::Pdf => extract_pdf(bytes),
        FileKind::Transcript => Ok(decode_text(bytes)),
    }
}

/// Extract text from a PDF, concatenating per-page text in page order.
/// Pages that yield nothing are skipped; a document that yields nothing at
/// all is an extraction error (commonly a scanned, image-only PDF).
fn extract_pdf(bytes: &[u8]) -> Result<String, AppError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("Failed to parse PDF: {}", e)))?;

    let pages = doc.get_pages();
    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut text = String::new();
    for (&page_num, _) in pages.iter() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                let page_text = page_text.trim_end();
                if !page_text.is_empty() {
                    text.push_str(page_text);
                    text.push('\n');
                }
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    if text.trim().is_empty() {
        return Err(AppError::Extraction(
            "No extractable text found in PDF".to_string(),
        ));
    }

    Ok(text)
}

/// Decode transcript bytes: UTF-8, falling back to a Latin-1 decode that
/// substitutes rather than fails, so extraction never errors on encoding
/// alone.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a minimal text-bearing PDF with one page per entry in `pages`.
    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save pdf");
        buf
    }

    #[test]
    fn test_transcript_utf8() {
        let text = extract("Hello world".as_bytes(), FileKind::Transcript).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_transcript_latin1_fallback() {
        // 0xE9 is 'é' in Latin-1 and invalid as a standalone UTF-8 byte
        let bytes = [b'c', b'a', b'f', 0xE9];
        let text = extract(&bytes, FileKind::Transcript).unwrap();
        assert_eq!(text, "café");
    }

    #[test]
    fn test_pdf_pages_concatenate_in_order() {
        let bytes = build_pdf(&["First page text", "Second page text"]);
        let text = extract(&bytes, FileKind::Pdf).unwrap();

        let first = text.find("First page text").expect("first page present");
        let second = text.find("Second page text").expect("second page present");
        assert!(first < second, "pages must appear in page order");
    }

    #[test]
    fn test_pdf_with_no_text_is_extraction_error() {
        let bytes = build_pdf(&[""]);
        let err = extract(&bytes, FileKind::Pdf).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_garbage_bytes_are_not_a_pdf() {
        let err = extract(b"this is not a pdf", FileKind::Pdf).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_kind_detection() {
        assert_eq!(
            FileKind::detect("quiz.PDF", "application/octet-stream").unwrap(),
            FileKind::Pdf
        );
        assert_eq!(
            FileKind::detect("results", "text/plain").unwrap(),
            FileKind::Transcript
        );
        assert!(matches!(
            FileKind::detect("notes.docx", "application/msword"),
            Err(AppError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_media_type_mapping() {
        assert_eq!(
            FileKind::from_media_type("application/pdf"),
            Some(FileKind::Pdf)
        );
        assert_eq!(
            FileKind::from_media_type("text/plain"),
            Some(FileKind::Transcript)
        );
        assert_eq!(FileKind::from_media_type("image/png"), None);
    }
}
