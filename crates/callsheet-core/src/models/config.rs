//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{CallsheetError, Result};

/// Main configuration for the callsheet pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallsheetConfig {
    /// Per-request extraction options.
    pub extraction: ExtractOptions,

    /// AI escalation configuration.
    pub ai: AiConfig,

    /// Document text acquisition configuration.
    pub acquisition: AcquisitionConfig,
}

/// Options recognized by a single extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Stop collecting candidates once this many have been found.
    pub max_contacts: usize,

    /// Time budget for the whole request, checked between steps.
    pub max_processing_time_ms: u64,

    /// Role keywords to look for when a pattern captured no role.
    pub role_preferences: Vec<String>,

    /// Aggregate confidence below which AI escalation is considered.
    pub confidence_threshold: f32,

    /// Never call the AI collaborator.
    #[serde(rename = "disableAI")]
    pub disable_ai: bool,

    /// Drop contacts scoring below `confidence_threshold`.
    pub require_high_confidence: bool,

    /// Order contacts by completeness instead of extraction order.
    pub sort_by_quality: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_contacts: 1000,
            max_processing_time_ms: 15_000,
            role_preferences: Vec::new(),
            confidence_threshold: 0.7,
            disable_ai: false,
            require_high_confidence: false,
            sort_by_quality: false,
        }
    }
}

impl ExtractOptions {
    /// Set the contact cap.
    pub fn with_max_contacts(mut self, max_contacts: usize) -> Self {
        self.max_contacts = max_contacts;
        self
    }

    /// Set the time budget.
    pub fn with_max_processing_time_ms(mut self, ms: u64) -> Self {
        self.max_processing_time_ms = ms;
        self
    }

    /// Set preferred role keywords.
    pub fn with_role_preferences<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_preferences = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the escalation threshold.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Disable or enable AI escalation.
    pub fn with_ai_disabled(mut self, disabled: bool) -> Self {
        self.disable_ai = disabled;
        self
    }

    /// Keep only contacts at or above the threshold.
    pub fn with_high_confidence(mut self, required: bool) -> Self {
        self.require_high_confidence = required;
        self
    }

    /// Sort by completeness.
    pub fn with_quality_sort(mut self, sort: bool) -> Self {
        self.sort_by_quality = sort;
        self
    }
}

/// AI escalation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,

    /// Model identifier.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Upper bound for one AI call; the remaining request time may shorten it.
    pub request_timeout_ms: u64,

    /// Maximum characters of document text sent in the prompt.
    pub sample_chars: usize,

    /// Token cap for a single call.
    pub max_tokens_per_call: u64,

    /// Process-wide token budget shared across requests.
    pub token_budget: u64,

    /// Process-wide call budget shared across requests.
    pub call_budget: u64,

    /// Escalation is skipped when less request time than this remains.
    pub min_remaining_ms: u64,

    /// Reliability prior for AI-sourced records.
    pub ai_reliability: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_ms: 10_000,
            sample_chars: 1200,
            max_tokens_per_call: 2000,
            token_budget: 200_000,
            call_budget: 500,
            min_remaining_ms: 250,
            ai_reliability: 0.8,
        }
    }
}

impl AiConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Text acquisition configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Minimum extracted text length to treat a PDF as text-bearing.
    pub min_text_length: usize,

    /// Maximum document size accepted, in bytes.
    pub max_document_bytes: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            min_text_length: 20,
            max_document_bytes: 25 * 1024 * 1024,
        }
    }
}

impl CallsheetConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.extraction.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CallsheetError::Config(format!(
                "confidenceThreshold must be within 0..=1, got {threshold}"
            )));
        }
        if !(0.0..=1.0).contains(&self.ai.ai_reliability) {
            return Err(CallsheetError::Config(format!(
                "ai_reliability must be within 0..=1, got {}",
                self.ai.ai_reliability
            )));
        }
        if self.ai.sample_chars == 0 {
            return Err(CallsheetError::Config(
                "sample_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
