//! Text acquisition: turning document bytes into [`RawText`].

#[cfg(feature = "pdf")]
mod pdf;

use std::path::Path;

use tracing::debug;

use crate::error::AcquisitionError;
use crate::models::config::AcquisitionConfig;
use crate::models::document::RawText;

#[cfg(feature = "pdf")]
pub use pdf::PdfTextExtractor;

/// Result type for acquisition.
pub type Result<T> = std::result::Result<T, AcquisitionError>;

pub const MIME_PLAIN: &str = "text/plain";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_MARKDOWN: &str = "text/markdown";
pub const MIME_PDF: &str = "application/pdf";

/// Converts document bytes into text.
pub trait TextSource: Send + Sync {
    /// Decode `bytes` of the given mime type.
    fn acquire(&self, bytes: &[u8], mime_type: &str, file_name: Option<&str>) -> Result<RawText>;
}

/// Built-in source for plain text formats and (with the `pdf` feature) PDF.
#[derive(Debug, Clone, Default)]
pub struct DocumentTextSource {
    config: AcquisitionConfig,
}

impl DocumentTextSource {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self { config }
    }

    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AcquisitionError::Corrupt(format!("invalid UTF-8: {e}")))?;
        // strip a byte order mark left by spreadsheet exports
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    #[cfg(feature = "pdf")]
    fn decode_pdf(&self, bytes: &[u8]) -> Result<String> {
        let mut extractor = PdfTextExtractor::new();
        extractor.load(bytes)?;
        let text = extractor.extract_text()?;
        if text.trim().chars().count() < self.config.min_text_length {
            return Err(AcquisitionError::NoText);
        }
        Ok(text)
    }

    #[cfg(not(feature = "pdf"))]
    fn decode_pdf(&self, _bytes: &[u8]) -> Result<String> {
        Err(AcquisitionError::UnsupportedFormat(MIME_PDF.to_string()))
    }
}

impl TextSource for DocumentTextSource {
    fn acquire(&self, bytes: &[u8], mime_type: &str, file_name: Option<&str>) -> Result<RawText> {
        if bytes.len() > self.config.max_document_bytes {
            return Err(AcquisitionError::Corrupt(format!(
                "document is {} bytes, limit is {}",
                bytes.len(),
                self.config.max_document_bytes
            )));
        }

        // ignore parameters such as `; charset=utf-8`
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let text = match essence.as_str() {
            MIME_PLAIN | MIME_CSV | MIME_MARKDOWN => self.decode_text(bytes)?,
            MIME_PDF => self.decode_pdf(bytes)?,
            other => return Err(AcquisitionError::UnsupportedFormat(other.to_string())),
        };

        debug!("Acquired {} characters from {} document", text.len(), essence);

        let mut raw = RawText::new(text).with_mime_type(essence);
        if let Some(name) = file_name {
            raw = raw.with_file_name(name);
        }
        Ok(raw)
    }
}

/// Mime type for a file path, by extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "txt" | "text" => Some(MIME_PLAIN),
        "csv" | "tsv" => Some(MIME_CSV),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        "pdf" => Some(MIME_PDF),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let source = DocumentTextSource::default();
        let raw = source
            .acquire("\u{feff}Jane Doe".as_bytes(), "text/plain; charset=utf-8", Some("a.txt"))
            .unwrap();
        assert_eq!(raw.text(), "Jane Doe");
        assert_eq!(raw.mime_type(), Some("text/plain"));
        assert_eq!(raw.file_name(), Some("a.txt"));
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let source = DocumentTextSource::default();
        let err = source.acquire(&[0xff, 0xfe, 0x00], MIME_CSV, None).unwrap_err();
        assert!(matches!(err, AcquisitionError::Corrupt(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let source = DocumentTextSource::default();
        let err = source.acquire(b"PK", "application/zip", None).unwrap_err();
        assert_eq!(err, AcquisitionError::UnsupportedFormat("application/zip".to_string()));
    }

    #[test]
    fn test_size_limit() {
        let source = DocumentTextSource::new(AcquisitionConfig {
            max_document_bytes: 4,
            ..AcquisitionConfig::default()
        });
        assert!(source.acquire(b"hello", MIME_PLAIN, None).is_err());
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_garbage_pdf_is_corrupt() {
        let source = DocumentTextSource::default();
        let err = source.acquire(b"not a pdf", MIME_PDF, None).unwrap_err();
        assert!(matches!(err, AcquisitionError::Corrupt(_)));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("call.PDF")), Some(MIME_PDF));
        assert_eq!(mime_for_path(Path::new("crew.csv")), Some(MIME_CSV));
        assert_eq!(mime_for_path(Path::new("notes")), None);
        assert_eq!(mime_for_path(Path::new("photo.jpg")), None);
    }
}
