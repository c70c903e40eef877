//! Contact extraction: field rules, pattern library, engine, validation.

pub mod analyzer;
pub mod engine;
pub mod library;
pub mod rules;
pub mod scoring;
pub mod validator;

pub use analyzer::DocumentAnalyzer;
pub use engine::{EngineOutput, PatternEngine};
pub use library::{
    CompiledPattern, DEFINITIONS, FieldTag, PatternDefinition, PatternLibrary, default_library,
    shared_default_library,
};
pub use scoring::{aggregate_confidence, score_contact};
pub use validator::{ContactValidator, dedup_key};
