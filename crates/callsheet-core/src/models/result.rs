//! Extraction result returned by the facade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contact::Contact;
use super::document::DocumentAnalysis;

/// Strategy that produced the final contact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyUsed {
    /// Pattern library only.
    #[default]
    PatternOnly,
    /// Pattern library plus one AI enhancement call.
    Hybrid,
    /// AI was attempted, failed, and the pattern result was kept.
    PatternFallback,
}

/// Metadata describing how a result was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMetadata {
    pub extraction_id: Uuid,
    pub strategy_used: StrategyUsed,
    pub processing_time_ms: u64,
    /// Patterns that produced at least one candidate, in application order.
    pub patterns_used: Vec<String>,
    /// Count-weighted mean confidence of the returned contacts.
    pub confidence: f32,
    pub ai_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    pub ai_skipped_due_to_budget: bool,
    /// Extraction stopped because `maxContacts` was reached.
    pub early_exit: bool,
    /// Extraction stopped because `maxProcessingTimeMs` elapsed.
    pub time_budget_exceeded: bool,
    /// Patterns that failed and were skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pattern_failures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
    pub document: DocumentAnalysis,
    pub extracted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractionMetadata {
    /// Fresh metadata with a new extraction id.
    pub fn new() -> Self {
        Self {
            extraction_id: Uuid::new_v4(),
            strategy_used: StrategyUsed::PatternOnly,
            processing_time_ms: 0,
            patterns_used: Vec::new(),
            confidence: 0.0,
            ai_used: false,
            tokens_used: None,
            ai_skipped_due_to_budget: false,
            early_exit: false,
            time_budget_exceeded: false,
            pattern_failures: Vec::new(),
            ai_error: None,
            document: DocumentAnalysis::default(),
            extracted_at: Utc::now(),
            warnings: Vec::new(),
        }
    }
}

impl Default for ExtractionMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Final outcome of one extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub success: bool,
    pub contacts: Vec<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// A failed result with no contacts.
    pub fn failure(error: impl Into<String>, metadata: ExtractionMetadata) -> Self {
        Self {
            success: false,
            contacts: Vec::new(),
            error: Some(error.into()),
            metadata,
        }
    }
}
