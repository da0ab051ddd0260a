//! File-to-text extraction seam.
//!
//! The engine never inspects file bytes itself: an extractor turns an
//! uploaded blob into plain text before ingestion. Only the plain-text
//! family ships here; PDF/DOCX/XLSX extractors live with the host
//! application and plug in through the same trait.

use crate::errors::{RagError, RagResult};

pub trait TextExtractor: Send + Sync {
    /// Turn a raw file blob into plain text, or fail with
    /// `UnsupportedFormat` / `ExtractionFailed`.
    fn extract(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> RagResult<String>;
}

/// Extractor for plain-text files (txt, markdown, csv).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> RagResult<String> {
        let by_mime = matches!(mime_type, "text/plain" | "text/markdown" | "text/csv");
        let by_extension = matches!(
            extension(file_name),
            Some("txt" | "md" | "markdown" | "csv")
        );
        if !by_mime && !by_extension {
            return Err(RagError::UnsupportedFormat(format!(
                "{file_name} ({mime_type})"
            )));
        }

        String::from_utf8(bytes.to_vec())
            .map_err(|_| RagError::ExtractionFailed(format!("{file_name} is not valid UTF-8")))
    }
}

fn extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}
