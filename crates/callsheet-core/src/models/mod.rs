//! Data models for contact extraction.

pub mod config;
pub mod contact;
pub mod document;
pub mod result;

pub use config::{AcquisitionConfig, AiConfig, CallsheetConfig, ExtractOptions};
pub use contact::{AI_SOURCE, CandidateContact, Contact, GENERIC_ROLE, Section};
pub use document::{DocumentAnalysis, DocumentType, ProductionType, RawText};
pub use result::{ExtractionMetadata, ExtractionResult, StrategyUsed};
