//! Extraction facade: runs analyzer, engine, validator and strategy for one
//! request and folds everything into an [`ExtractionResult`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ai::{AiBudget, AiEnhancer, OpenAiEnhancer};
use crate::contacts::analyzer::DocumentAnalyzer;
use crate::contacts::engine::PatternEngine;
use crate::contacts::library::{PatternLibrary, shared_default_library};
use crate::contacts::scoring::aggregate_confidence;
use crate::contacts::validator::ContactValidator;
use crate::error::InputError;
use crate::models::config::{AiConfig, CallsheetConfig, ExtractOptions};
use crate::models::document::RawText;
use crate::models::result::{ExtractionMetadata, ExtractionResult};
use crate::source::{DocumentTextSource, TextSource};
use crate::strategy::{HybridOrchestrator, StrategyContext};

/// Entry point for contact extraction.
///
/// One extractor can serve many concurrent requests: the pattern library is
/// read-only and the AI budget is shared atomically.
pub struct ContactExtractor {
    library: Arc<PatternLibrary>,
    analyzer: DocumentAnalyzer,
    orchestrator: HybridOrchestrator,
    source: Arc<dyn TextSource>,
    defaults: ExtractOptions,
}

impl ContactExtractor {
    /// Pattern-only extractor with default settings.
    pub fn new() -> Self {
        let ai = AiConfig::default();
        Self {
            library: shared_default_library(),
            analyzer: DocumentAnalyzer::new(),
            orchestrator: HybridOrchestrator::new(Arc::new(AiBudget::from_config(&ai)), ai),
            source: Arc::new(DocumentTextSource::default()),
            defaults: ExtractOptions::default(),
        }
    }

    /// Extractor configured from a [`CallsheetConfig`].
    ///
    /// An OpenAI enhancer is attached when the configured API key variable
    /// is set; otherwise extraction stays pattern-only.
    pub fn from_config(config: &CallsheetConfig) -> Self {
        let mut orchestrator = HybridOrchestrator::new(
            Arc::new(AiBudget::from_config(&config.ai)),
            config.ai.clone(),
        );

        if config.extraction.disable_ai {
            info!("AI escalation disabled by configuration");
        } else {
            match OpenAiEnhancer::from_config(&config.ai) {
                Ok(enhancer) => orchestrator = orchestrator.with_enhancer(Arc::new(enhancer)),
                Err(e) => info!("AI escalation unavailable: {}", e),
            }
        }

        Self {
            library: shared_default_library(),
            analyzer: DocumentAnalyzer::new(),
            orchestrator,
            source: Arc::new(DocumentTextSource::new(config.acquisition.clone())),
            defaults: config.extraction.clone(),
        }
    }

    /// Attach an AI collaborator.
    pub fn with_enhancer(mut self, enhancer: Arc<dyn AiEnhancer>) -> Self {
        self.orchestrator = self.orchestrator.with_enhancer(enhancer);
        self
    }

    /// Share an AI budget with other extractors.
    pub fn with_budget(mut self, budget: Arc<AiBudget>) -> Self {
        self.orchestrator = self.orchestrator.with_budget(budget);
        self
    }

    pub fn with_ai_config(mut self, config: AiConfig) -> Self {
        self.orchestrator = self.orchestrator.with_config(config);
        self
    }

    /// Use a custom pattern library.
    pub fn with_library(mut self, library: Arc<PatternLibrary>) -> Self {
        self.library = library;
        self
    }

    /// Use a custom text acquisition collaborator.
    pub fn with_text_source(mut self, source: Arc<dyn TextSource>) -> Self {
        self.source = source;
        self
    }

    /// Options used by callers that have none of their own.
    pub fn default_options(&self) -> &ExtractOptions {
        &self.defaults
    }

    pub fn budget(&self) -> &Arc<AiBudget> {
        self.orchestrator.budget()
    }

    /// Extract contacts from acquired text.
    pub async fn extract(&self, raw: &RawText, options: &ExtractOptions) -> ExtractionResult {
        self.extract_with_cancel(raw, options, CancellationToken::new())
            .await
    }

    /// Decode a document and extract contacts from it. Acquisition failure
    /// yields an unsuccessful result.
    pub async fn extract_document(
        &self,
        bytes: &[u8],
        mime_type: &str,
        file_name: Option<&str>,
        options: &ExtractOptions,
    ) -> ExtractionResult {
        let started = Instant::now();
        match self.source.acquire(bytes, mime_type, file_name) {
            Ok(raw) => {
                self.run(&raw, options, CancellationToken::new(), started)
                    .await
            }
            Err(e) => {
                warn!("Text acquisition failed for {:?}: {}", file_name, e);
                let mut metadata = ExtractionMetadata::new();
                metadata.processing_time_ms = elapsed_ms(started);
                ExtractionResult::failure(InputError::Unreadable(e.to_string()).to_string(), metadata)
            }
        }
    }

    /// Extract contacts; cancelling `cancel` aborts a pending AI call.
    pub async fn extract_with_cancel(
        &self,
        raw: &RawText,
        options: &ExtractOptions,
        cancel: CancellationToken,
    ) -> ExtractionResult {
        self.run(raw, options, cancel, Instant::now()).await
    }

    async fn run(
        &self,
        raw: &RawText,
        options: &ExtractOptions,
        cancel: CancellationToken,
        started: Instant,
    ) -> ExtractionResult {
        let mut metadata = ExtractionMetadata::new();
        info!(
            extraction_id = %metadata.extraction_id,
            "Extracting contacts from {} characters",
            raw.len()
        );

        if raw.is_blank() {
            warn!(extraction_id = %metadata.extraction_id, "Rejecting empty input");
            metadata.processing_time_ms = elapsed_ms(started);
            return ExtractionResult::failure(InputError::Empty.to_string(), metadata);
        }

        metadata.document = self.analyzer.analyze(raw);

        let output = PatternEngine::new(&self.library).extract_since(raw.text(), options, started);
        metadata.patterns_used = output.patterns_used;
        metadata.early_exit = output.early_exit;
        metadata.time_budget_exceeded = output.time_budget_exceeded;
        metadata.pattern_failures = output.failures.iter().map(ToString::to_string).collect();
        metadata.warnings.extend(
            output
                .ceiling_hits
                .iter()
                .map(|name| format!("pattern {name} hit the match ceiling")),
        );

        let contacts = ContactValidator::new(&self.library)
            .with_ai_reliability(self.orchestrator.config().ai_reliability)
            .with_quality_sort(options.sort_by_quality)
            .validate(output.candidates);

        let context = StrategyContext {
            text: raw.text(),
            analysis: &metadata.document,
            options,
            library: &self.library,
            deadline: started + Duration::from_millis(options.max_processing_time_ms),
            cancel,
        };
        let outcome = self.orchestrator.run(context, contacts).await;

        let mut contacts = outcome.contacts;
        if options.require_high_confidence {
            contacts.retain(|c| c.confidence >= options.confidence_threshold);
        }
        contacts.truncate(options.max_contacts);

        metadata.strategy_used = outcome.strategy_used;
        metadata.ai_used = outcome.ai_used;
        metadata.tokens_used = outcome.tokens_used;
        metadata.ai_skipped_due_to_budget = outcome.ai_skipped_due_to_budget;
        metadata.ai_error = outcome.ai_error.as_ref().map(ToString::to_string);
        metadata.warnings.extend(outcome.warnings);
        metadata.confidence = aggregate_confidence(&contacts);
        metadata.processing_time_ms = elapsed_ms(started);

        info!(
            extraction_id = %metadata.extraction_id,
            "Extracted {} contacts in {}ms (strategy {:?}, confidence {:.3})",
            contacts.len(),
            metadata.processing_time_ms,
            metadata.strategy_used,
            metadata.confidence
        );

        match outcome.ai_error {
            Some(e) if contacts.is_empty() => ExtractionResult {
                success: false,
                contacts,
                error: Some(format!("no pattern contacts and AI enhancement failed: {e}")),
                metadata,
            },
            _ => ExtractionResult {
                success: true,
                contacts,
                error: None,
                metadata,
            },
        }
    }
}

impl Default for ContactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::StrategyUsed;

    #[tokio::test]
    async fn test_blank_input_fails() {
        let extractor = ContactExtractor::new();
        let result = extractor
            .extract(&RawText::new(" \n\t"), &ExtractOptions::default())
            .await;

        assert!(!result.success);
        assert!(result.contacts.is_empty());
        assert_eq!(result.error.as_deref(), Some("no usable text in document"));
    }

    #[tokio::test]
    async fn test_pattern_only_extraction() {
        let extractor = ContactExtractor::new();
        let result = extractor
            .extract(
                &RawText::new("PRODUCER: Jo Bell / jo@bell.tv / 212 555 0100"),
                &ExtractOptions::default(),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.contacts.len(), 1);
        assert_eq!(result.metadata.strategy_used, StrategyUsed::PatternOnly);
        assert_eq!(result.metadata.patterns_used[0], "role_name_email_phone");
        assert!(result.metadata.confidence > 0.9);
    }

    #[tokio::test]
    async fn test_acquisition_failure() {
        let extractor = ContactExtractor::new();
        let result = extractor
            .extract_document(b"PK\x03\x04", "application/zip", Some("a.zip"), &ExtractOptions::default())
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("unsupported format"));
    }

    #[tokio::test]
    async fn test_high_confidence_filter() {
        let extractor = ContactExtractor::new();
        let text = "DIRECTOR: Jane Doe / jane@x.com / 555-123-4567\nSam Lee / sam@x.com\n";

        let all = extractor.extract(&RawText::new(text), &ExtractOptions::default()).await;
        assert_eq!(all.contacts.len(), 2);

        let options = ExtractOptions::default().with_high_confidence(true);
        let strict = extractor.extract(&RawText::new(text), &options).await;
        assert_eq!(strict.contacts.len(), 1);
        assert_eq!(strict.contacts[0].name, "Jane Doe");
    }
}
