//! Source text and document classification types.

use serde::{Deserialize, Serialize};

/// Text acquired from a document, plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    text: String,
    file_name: Option<String>,
    mime_type: Option<String>,
}

impl RawText {
    /// Wrap plain text with no origin metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_name: None,
            mime_type: None,
        }
    }

    /// Set the originating file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the originating mime type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True when the text holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Kind of document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Shoot schedule with call times and contacts.
    CallSheet,
    /// Crew roster grouped under a crew header.
    CrewList,
    /// Plain list of contacts.
    ContactList,
    #[default]
    Unknown,
}

/// Industry the production belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionType {
    Fashion,
    Film,
    Commercial,
    MusicVideo,
    Event,
    #[default]
    Unknown,
}

/// Output of the document analyzer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub production_type: ProductionType,
    pub estimated_contacts: usize,
    /// Score of the winning production type (0.0 - 1.0).
    pub confidence: f32,
}
