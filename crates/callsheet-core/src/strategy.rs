//! Hybrid strategy: decide whether pattern output is good enough, escalate
//! to the AI collaborator once if not, and merge its answer back.
//!
//! A run is a small state machine:
//!
//! ```text
//! PatternOnly ──(escalate)──> AiEscalated ──> Done
//!      └──────────(skip)──────────────────────┘
//! ```
//!
//! Every path ends in `Done`; advancing a finished run does nothing.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::{AiBudget, AiEnhancer, EnhancementRequest, Reservation, build_prompt, truncate_sample};
use crate::contacts::library::PatternLibrary;
use crate::contacts::scoring::aggregate_confidence;
use crate::contacts::validator::ContactValidator;
use crate::error::AiError;
use crate::models::config::{AiConfig, ExtractOptions};
use crate::models::contact::{CandidateContact, Contact};
use crate::models::document::DocumentAnalysis;
use crate::models::result::StrategyUsed;

/// State of one strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    /// Pattern results are in; escalation not yet decided.
    PatternOnly,
    /// One AI call is reserved and pending.
    AiEscalated,
    /// Final contacts are settled.
    Done,
}

/// What a finished run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutcome {
    pub contacts: Vec<Contact>,
    pub strategy_used: StrategyUsed,
    pub ai_used: bool,
    pub tokens_used: Option<u64>,
    pub ai_skipped_due_to_budget: bool,
    pub ai_error: Option<AiError>,
    pub warnings: Vec<String>,
}

/// Per-request inputs the orchestrator needs besides the contacts.
pub struct StrategyContext<'a> {
    pub text: &'a str,
    pub analysis: &'a DocumentAnalysis,
    pub options: &'a ExtractOptions,
    pub library: &'a PatternLibrary,
    /// When the request's time budget runs out.
    pub deadline: Instant,
    pub cancel: CancellationToken,
}

/// Decides on and performs AI escalation. Shared by all requests of an
/// extractor; only the budget is mutable, and it is atomic.
#[derive(Clone)]
pub struct HybridOrchestrator {
    enhancer: Option<Arc<dyn AiEnhancer>>,
    budget: Arc<AiBudget>,
    config: AiConfig,
}

impl fmt::Debug for HybridOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridOrchestrator")
            .field("enhancer", &self.enhancer.as_ref().map(|e| e.name().to_string()))
            .field("budget", &self.budget)
            .field("config", &self.config)
            .finish()
    }
}

impl HybridOrchestrator {
    /// An orchestrator with no enhancer: always pattern-only.
    pub fn new(budget: Arc<AiBudget>, config: AiConfig) -> Self {
        Self {
            enhancer: None,
            budget,
            config,
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn AiEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_budget(mut self, budget: Arc<AiBudget>) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_config(mut self, config: AiConfig) -> Self {
        self.config = config;
        self
    }

    pub fn budget(&self) -> &Arc<AiBudget> {
        &self.budget
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn has_enhancer(&self) -> bool {
        self.enhancer.is_some()
    }

    /// Start a run over validated pattern contacts.
    pub fn begin<'a>(&'a self, context: StrategyContext<'a>, contacts: Vec<Contact>) -> StrategyRun<'a> {
        StrategyRun {
            orchestrator: self,
            context,
            state: StrategyState::PatternOnly,
            reservation: None,
            outcome: StrategyOutcome {
                contacts,
                ..StrategyOutcome::default()
            },
        }
    }

    /// Run the state machine to completion.
    pub async fn run(&self, context: StrategyContext<'_>, contacts: Vec<Contact>) -> StrategyOutcome {
        self.begin(context, contacts).finish().await
    }
}

/// One in-flight strategy decision.
pub struct StrategyRun<'a> {
    orchestrator: &'a HybridOrchestrator,
    context: StrategyContext<'a>,
    state: StrategyState,
    reservation: Option<Reservation>,
    outcome: StrategyOutcome,
}

impl<'a> StrategyRun<'a> {
    pub fn state(&self) -> StrategyState {
        self.state
    }

    /// Contacts as they currently stand.
    pub fn contacts(&self) -> &[Contact] {
        &self.outcome.contacts
    }

    /// Take one transition. Returns the new state.
    pub async fn advance(&mut self) -> StrategyState {
        self.state = match self.state {
            StrategyState::PatternOnly => self.decide(),
            StrategyState::AiEscalated => {
                self.escalate().await;
                StrategyState::Done
            }
            StrategyState::Done => StrategyState::Done,
        };
        self.state
    }

    /// Advance until `Done` and return the outcome.
    pub async fn finish(mut self) -> StrategyOutcome {
        while self.state != StrategyState::Done {
            self.advance().await;
        }
        self.outcome
    }

    fn decide(&mut self) -> StrategyState {
        let options = self.context.options;
        let confidence = aggregate_confidence(&self.outcome.contacts);

        if confidence >= options.confidence_threshold {
            debug!(
                "Pattern confidence {:.3} meets threshold {:.3}",
                confidence, options.confidence_threshold
            );
            return StrategyState::Done;
        }
        if options.disable_ai || !self.orchestrator.has_enhancer() {
            debug!("Pattern confidence {:.3} is low but AI is not available", confidence);
            return StrategyState::Done;
        }

        let remaining = self.remaining_time();
        if remaining < Duration::from_millis(self.orchestrator.config.min_remaining_ms) {
            warn!("Skipping AI: only {}ms left in the time budget", remaining.as_millis());
            self.outcome.ai_skipped_due_to_budget = true;
            self.outcome
                .warnings
                .push("AI escalation skipped: time budget nearly exhausted".to_string());
            return StrategyState::Done;
        }

        let budget = &self.orchestrator.budget;
        if budget.is_exhausted() {
            warn!(
                "Skipping AI: shared AI budget exhausted ({} calls, {} tokens used)",
                budget.calls_used(),
                budget.tokens_used()
            );
            self.outcome.ai_skipped_due_to_budget = true;
            return StrategyState::Done;
        }

        match budget.try_reserve(self.orchestrator.config.max_tokens_per_call) {
            Some(reservation) => {
                info!(
                    "Escalating to AI: confidence {:.3} below {:.3}, {} tokens reserved",
                    confidence,
                    options.confidence_threshold,
                    reservation.tokens()
                );
                self.reservation = Some(reservation);
                StrategyState::AiEscalated
            }
            None => {
                warn!("Skipping AI: a concurrent request took the remaining AI budget");
                self.outcome.ai_skipped_due_to_budget = true;
                StrategyState::Done
            }
        }
    }

    async fn escalate(&mut self) {
        let (Some(enhancer), Some(reservation)) =
            (self.orchestrator.enhancer.as_ref(), self.reservation.take())
        else {
            return;
        };
        let config = &self.orchestrator.config;

        let sample = truncate_sample(self.context.text, config.sample_chars);
        let request = EnhancementRequest {
            prompt: build_prompt(sample, self.context.analysis, &self.outcome.contacts),
            candidates: self.outcome.contacts.clone(),
            budget_remaining: reservation.tokens(),
        };

        let timeout_ms = (self.remaining_time().as_millis() as u64).min(config.request_timeout_ms);
        let cancel = self.context.cancel.clone();
        let call = tokio::time::timeout(Duration::from_millis(timeout_ms), enhancer.enhance(&request));

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AiError::Cancelled),
            response = call => response.unwrap_or(Err(AiError::Timeout(timeout_ms))),
        };

        match result {
            Ok(response) => {
                self.orchestrator.budget.commit(reservation, response.tokens_used);
                let returned = response.contacts.len();
                self.outcome.contacts = self.merge(response.contacts.into_iter().map(|c| c.into_candidate()));
                self.outcome.ai_used = true;
                self.outcome.tokens_used = Some(response.tokens_used);
                self.outcome.strategy_used = StrategyUsed::Hybrid;
                info!(
                    "AI returned {} contacts using {} tokens; {} contacts after merge, {} new from AI",
                    returned,
                    response.tokens_used,
                    self.outcome.contacts.len(),
                    self.outcome.contacts.iter().filter(|c| c.is_ai_sourced()).count()
                );
            }
            Err(e) => {
                self.orchestrator.budget.release(reservation);
                warn!("AI enhancement failed, keeping pattern results: {}", e);
                self.outcome.strategy_used = StrategyUsed::PatternFallback;
                self.outcome.ai_error = Some(e);
            }
        }
    }

    /// Pattern contacts first, then AI records: AI values only fill empty
    /// fields, and records new to the list keep the AI source.
    fn merge(&self, ai: impl Iterator<Item = CandidateContact>) -> Vec<Contact> {
        let candidates: Vec<CandidateContact> = self
            .outcome
            .contacts
            .iter()
            .cloned()
            .map(CandidateContact::from)
            .chain(ai)
            .collect();

        ContactValidator::new(self.context.library)
            .with_ai_reliability(self.orchestrator.config.ai_reliability)
            .with_quality_sort(self.context.options.sort_by_quality)
            .validate(candidates)
    }

    fn remaining_time(&self) -> Duration {
        self.context.deadline.saturating_duration_since(Instant::now())
    }
}
