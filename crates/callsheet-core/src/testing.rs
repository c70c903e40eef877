//! Testing utilities including a mock AI collaborator.
//!
//! Useful for exercising the hybrid strategy without network calls.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::ai::{AiContact, AiEnhancer, AiResult, EnhancementRequest, EnhancementResponse};
use crate::error::AiError;

/// Tokens reported per call unless overridden.
const DEFAULT_TOKENS_PER_CALL: u64 = 100;

/// A deterministic [`AiEnhancer`] that records every request.
#[derive(Default)]
pub struct MockEnhancer {
    /// Contacts returned on success
    contacts: Vec<AiContact>,

    /// Failure returned instead of contacts
    error: Option<AiError>,

    /// Sleep before answering
    delay: Option<Duration>,

    /// Tokens reported per call
    tokens_per_call: Option<u64>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<EnhancementRequest>>>,
}

impl MockEnhancer {
    /// A mock that returns no contacts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these contacts on every call.
    pub fn with_contacts(mut self, contacts: Vec<AiContact>) -> Self {
        self.contacts = contacts;
        self
    }

    /// Fail every call with `error`.
    pub fn with_error(mut self, error: AiError) -> Self {
        self.error = Some(error);
        self
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report this many tokens per call.
    pub fn with_tokens_per_call(mut self, tokens: u64) -> Self {
        self.tokens_per_call = Some(tokens);
        self
    }

    /// All requests made to this mock.
    pub fn calls(&self) -> Vec<EnhancementRequest> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl AiEnhancer for MockEnhancer {
    async fn enhance(&self, request: &EnhancementRequest) -> AiResult<EnhancementResponse> {
        self.calls.write().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        Ok(EnhancementResponse {
            contacts: self.contacts.clone(),
            tokens_used: self
                .tokens_per_call
                .unwrap_or(DEFAULT_TOKENS_PER_CALL)
                .min(request.budget_remaining),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
