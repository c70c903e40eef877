//! AI enhancement: the collaborator trait, its shared budget, prompts, and
//! the OpenAI-compatible client.
//!
//! The pattern engine handles most documents on its own. When its output is
//! not confident enough, the orchestrator makes one consolidated call through
//! an [`AiEnhancer`] to classify, clean up, and complete the contact list.

pub mod budget;
pub mod openai;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AiError;
use crate::models::contact::{AI_SOURCE, CandidateContact, Contact, Section};

pub use budget::{AiBudget, Reservation};
pub use openai::OpenAiEnhancer;
pub use prompt::{build_prompt, parse_response, truncate_sample};

/// Result type for AI operations.
pub type AiResult<T> = std::result::Result<T, AiError>;

/// One consolidated enhancement request.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementRequest {
    /// Full prompt text, sample included.
    pub prompt: String,
    /// Contacts found by the pattern engine so far.
    pub candidates: Vec<Contact>,
    /// Tokens this call may spend.
    pub budget_remaining: u64,
}

/// What the collaborator returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancementResponse {
    pub contacts: Vec<AiContact>,
    pub tokens_used: u64,
}

/// A contact as reported by the AI service. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiContact {
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub section: Option<String>,
}

impl AiContact {
    /// Convert into a candidate attributed to the AI source.
    pub fn into_candidate(self) -> CandidateContact {
        CandidateContact {
            section: self.section.as_deref().and_then(Section::from_label),
            name: self.name,
            role: self.role.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            source_pattern: AI_SOURCE.to_string(),
            ..CandidateContact::default()
        }
    }
}

/// The AI enhancement collaborator.
///
/// Implementations make one request per call and report tokens spent.
/// Timeouts and cancellation are applied by the caller.
#[async_trait]
pub trait AiEnhancer: Send + Sync {
    /// Run one enhancement request.
    async fn enhance(&self, request: &EnhancementRequest) -> AiResult<EnhancementResponse>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "ai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_contact_into_candidate() {
        let contact: AiContact = serde_json::from_str(
            r#"{"name": "Ava Stone", "role": "Model", "email": "ava@x.com", "section": "talent"}"#,
        )
        .unwrap();
        let candidate = contact.into_candidate();

        assert_eq!(candidate.name, "Ava Stone");
        assert_eq!(candidate.role, "Model");
        assert_eq!(candidate.phone, "");
        assert_eq!(candidate.section, Some(Section::Talent));
        assert_eq!(candidate.source_pattern, AI_SOURCE);
    }
}
