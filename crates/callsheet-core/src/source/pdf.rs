//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::Result;
use crate::error::AcquisitionError;

/// Loads a PDF with lopdf (decrypting empty-password files) and extracts
/// its text with pdf-extract.
#[derive(Default)]
pub struct PdfTextExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the document and check it has pages.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc =
            Document::load_mem(data).map_err(|e| AcquisitionError::Corrupt(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(AcquisitionError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| AcquisitionError::Corrupt(format!("failed to save decrypted PDF: {e}")))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(AcquisitionError::NoText);
        }
        debug!("Loaded PDF with {} pages", page_count);

        self.document = Some(doc);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len())
            .unwrap_or(0)
    }

    /// Text of the whole document.
    pub fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(AcquisitionError::Corrupt("no document loaded".to_string()));
        }
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| AcquisitionError::Corrupt(e.to_string()))
    }
}
