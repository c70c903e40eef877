//! Error types for the callsheet-core library.

use thiserror::Error;

/// Main error type for the callsheet library.
#[derive(Error, Debug)]
pub enum CallsheetError {
    /// Input text is empty or unusable.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// A single pattern failed to compile or apply.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// The AI enhancement collaborator failed.
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Text acquisition from a document failed.
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors for input that cannot be processed at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The text is empty or whitespace only.
    #[error("no usable text in document")]
    Empty,

    /// Text acquisition failed before extraction could start.
    #[error("text acquisition failed: {0}")]
    Unreadable(String),
}

/// Errors raised by a single pattern. Never fatal to a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The matcher source failed to compile (or exceeded the size limit).
    #[error("pattern {pattern} failed to compile: {reason}")]
    Compile { pattern: String, reason: String },

    /// Capture group count does not match the field mapping.
    #[error("pattern {pattern} has {groups} capture groups but maps {fields} fields")]
    MappingMismatch {
        pattern: String,
        groups: usize,
        fields: usize,
    },
}

impl PatternError {
    /// Name of the pattern that failed.
    pub fn pattern(&self) -> &str {
        match self {
            Self::Compile { pattern, .. } | Self::MappingMismatch { pattern, .. } => pattern,
        }
    }
}

/// Errors from the AI enhancement collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AiError {
    /// The call did not complete within the allowed time.
    #[error("AI call timed out after {0}ms")]
    Timeout(u64),

    /// The call was cancelled by the caller.
    #[error("AI call cancelled")]
    Cancelled,

    /// Credentials were missing or rejected.
    #[error("AI authentication failed: {0}")]
    Auth(String),

    /// The response could not be interpreted.
    #[error("malformed AI response: {0}")]
    Malformed(String),

    /// Transport-level or HTTP status failure.
    #[error("AI request failed: {0}")]
    Http(String),
}

/// Errors related to turning document bytes into text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    /// The mime type is not handled.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The bytes could not be decoded.
    #[error("corrupt input: {0}")]
    Corrupt(String),

    /// The document is encrypted and cannot be read.
    #[error("document is encrypted")]
    Encrypted,

    /// The document decoded but contained no text.
    #[error("document contains no text")]
    NoText,
}

/// Result type for the callsheet library.
pub type Result<T> = std::result::Result<T, CallsheetError>;
