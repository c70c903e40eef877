//! Core library for call sheet contact extraction.
//!
//! This crate provides:
//! - Field normalization for names, roles, emails and phone numbers
//! - A prioritized pattern library and a budgeted extraction engine
//! - Validation, deduplication and confidence scoring of contacts
//! - Hybrid strategy with one-shot AI escalation under a shared budget
//! - Text acquisition from plain text, CSV, Markdown and PDF documents

pub mod ai;
pub mod contacts;
pub mod error;
pub mod extractor;
pub mod models;
pub mod source;
pub mod strategy;
pub mod testing;

pub use ai::{AiBudget, AiContact, AiEnhancer, EnhancementRequest, EnhancementResponse, OpenAiEnhancer};
pub use contacts::{ContactValidator, DocumentAnalyzer, PatternEngine, PatternLibrary};
pub use error::{AcquisitionError, AiError, CallsheetError, InputError, PatternError, Result};
pub use extractor::ContactExtractor;
pub use models::{
    AcquisitionConfig, AiConfig, CallsheetConfig, Contact, DocumentAnalysis, DocumentType,
    ExtractOptions, ExtractionMetadata, ExtractionResult, ProductionType, RawText, Section,
    StrategyUsed,
};
pub use source::{DocumentTextSource, TextSource, mime_for_path};
pub use strategy::{HybridOrchestrator, StrategyState};

/// Re-exported so callers can cancel requests without a direct dependency.
pub use tokio_util::sync::CancellationToken;
