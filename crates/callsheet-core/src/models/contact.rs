//! Contact records produced by extraction.

use serde::{Deserialize, Serialize};

/// Role assigned when nothing better is known.
pub const GENERIC_ROLE: &str = "CONTACT";

/// Source name for records that originate from the AI collaborator.
pub const AI_SOURCE: &str = "ai";

/// Section of a call sheet a contact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Section {
    Production,
    Client,
    Talent,
    Crew,
    Agency,
}

impl Section {
    /// Header keyword for this section.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Production => "PRODUCTION",
            Self::Client => "CLIENT",
            Self::Talent => "TALENT",
            Self::Crew => "CREW",
            Self::Agency => "AGENCY",
        }
    }

    /// All sections in header-scan order.
    pub fn all() -> [Section; 5] {
        [
            Self::Production,
            Self::Client,
            Self::Talent,
            Self::Crew,
            Self::Agency,
        ]
    }

    /// Parse from a free-form label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        let upper = label.trim().to_uppercase();
        Self::all().into_iter().find(|s| upper.contains(s.keyword()))
    }
}

/// An unvalidated, possibly duplicate record from one pattern match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateContact {
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub section: Option<Section>,
    /// Name of the pattern that produced this record, or `"ai"`.
    pub source_pattern: String,
    /// Text the match covered.
    pub raw_span: String,
    /// Nearest preceding section header line, if one was found.
    pub context: Option<String>,
    pub confidence: f32,
}

impl CandidateContact {
    /// Check for at least one contact channel.
    pub fn has_channel(&self) -> bool {
        !self.email.trim().is_empty() || !self.phone.trim().is_empty()
    }
}

/// A validated contact. Always has a name and at least one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Person's name.
    pub name: String,

    /// Role on the production (upper case).
    pub role: String,

    /// Email address (lower case).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Phone number, canonical format where possible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Company or agency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Call sheet section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,

    /// Pattern (or `"ai"`) the record came from.
    pub source: String,

    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl Contact {
    /// Number of non-empty fields, used for quality ordering.
    pub fn completeness(&self) -> usize {
        let mut count = 0;
        if !self.name.is_empty() {
            count += 1;
        }
        if !self.role.is_empty() && self.role != GENERIC_ROLE {
            count += 1;
        }
        count += [&self.email, &self.phone, &self.company]
            .iter()
            .filter(|f| f.is_some())
            .count();
        if self.section.is_some() {
            count += 1;
        }
        count
    }

    /// Whether the record came from the AI collaborator only.
    pub fn is_ai_sourced(&self) -> bool {
        self.source == AI_SOURCE
    }
}

impl From<Contact> for CandidateContact {
    fn from(contact: Contact) -> Self {
        Self {
            name: contact.name,
            role: contact.role,
            email: contact.email.unwrap_or_default(),
            phone: contact.phone.unwrap_or_default(),
            company: contact.company.unwrap_or_default(),
            section: contact.section,
            source_pattern: contact.source,
            raw_span: String::new(),
            context: None,
            confidence: contact.confidence,
        }
    }
}
