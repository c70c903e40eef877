//! Candidate validation: normalize, section, deduplicate, filter, score.

use std::collections::HashMap;

use tracing::debug;

use crate::models::contact::{AI_SOURCE, CandidateContact, Contact, Section};

use super::library::PatternLibrary;
use super::rules::{
    clean_company, clean_name, is_generic_role, is_plausible_name, normalize_email,
    normalize_phone, normalize_role, phone_digits, section_for_role,
};
use super::scoring::score_contact;

/// Reliability prior used when a source is unknown to the library.
const UNKNOWN_SOURCE_RELIABILITY: f32 = 0.5;

/// Turns candidates into final contacts.
///
/// Steps run in a fixed order: normalize fields, assign sections,
/// deduplicate, drop invalid records, score, optionally sort by quality.
/// Running the validator on its own output returns it unchanged.
#[derive(Debug, Clone)]
pub struct ContactValidator<'a> {
    library: &'a PatternLibrary,
    ai_reliability: f32,
    sort_by_quality: bool,
}

impl<'a> ContactValidator<'a> {
    /// Create a validator that scores against `library` reliabilities.
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            library,
            ai_reliability: 0.8,
            sort_by_quality: false,
        }
    }

    /// Reliability prior for records from the AI collaborator.
    pub fn with_ai_reliability(mut self, reliability: f32) -> Self {
        self.ai_reliability = reliability;
        self
    }

    /// Sort the output by completeness, most complete first.
    pub fn with_quality_sort(mut self, sort: bool) -> Self {
        self.sort_by_quality = sort;
        self
    }

    /// Validate candidates. Output order follows first appearance unless
    /// quality sorting is on.
    pub fn validate(&self, candidates: Vec<CandidateContact>) -> Vec<Contact> {
        let total = candidates.len();

        let normalized = candidates.into_iter().map(|c| self.normalize(c));
        let unique = deduplicate(normalized);
        let deduplicated = unique.len();

        let mut contacts: Vec<Contact> = unique
            .into_iter()
            .filter(is_valid)
            .map(|mut contact| {
                contact.confidence = score_contact(&contact, contact.confidence);
                contact
            })
            .collect();

        if self.sort_by_quality {
            contacts.sort_by(|a, b| b.completeness().cmp(&a.completeness()));
        }

        debug!(
            "Validated {} candidates: {} unique, {} kept",
            total,
            deduplicated,
            contacts.len()
        );

        contacts
    }

    /// Normalize fields and assign a section. `confidence` carries the
    /// source's reliability prior until scoring.
    fn normalize(&self, candidate: CandidateContact) -> Contact {
        let role = normalize_role(&candidate.role);
        let section = candidate
            .section
            .or_else(|| candidate.context.as_deref().and_then(Section::from_label))
            .or_else(|| section_for_role(&role));

        Contact {
            name: clean_name(&candidate.name),
            email: normalize_email(&candidate.email),
            phone: normalize_phone(&candidate.phone),
            company: clean_company(&candidate.company),
            section,
            confidence: self.reliability(&candidate),
            role,
            source: candidate.source_pattern,
        }
    }

    fn reliability(&self, candidate: &CandidateContact) -> f32 {
        if candidate.source_pattern == AI_SOURCE {
            return self.ai_reliability;
        }
        self.library
            .reliability(&candidate.source_pattern)
            .unwrap_or(if candidate.confidence > 0.0 {
                candidate.confidence
            } else {
                UNKNOWN_SOURCE_RELIABILITY
            })
    }
}

/// Identity of a contact: email, else phone digits, else name and company.
pub fn dedup_key(contact: &Contact) -> String {
    if let Some(email) = &contact.email {
        return format!("email:{}", email.to_lowercase());
    }
    if let Some(phone) = &contact.phone {
        return format!("phone:{}", phone_digits(phone));
    }
    format!(
        "name:{}|{}",
        contact.name.to_lowercase(),
        contact.company.as_deref().unwrap_or_default().to_lowercase()
    )
}

/// Keep the first record per key. Later duplicates only fill fields the
/// first record lacks, so the earliest source of a field wins.
fn deduplicate(contacts: impl Iterator<Item = Contact>) -> Vec<Contact> {
    let mut unique: Vec<Contact> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for contact in contacts {
        let key = dedup_key(&contact);
        match index.get(&key) {
            Some(&position) => fill_missing(&mut unique[position], contact),
            None => {
                index.insert(key, unique.len());
                unique.push(contact);
            }
        }
    }

    unique
}

/// Copy fields from `other` into the empty slots of `target`. A generic
/// role and an implausible name count as empty.
fn fill_missing(target: &mut Contact, other: Contact) {
    if !is_plausible_name(&target.name) && is_plausible_name(&other.name) {
        target.name = other.name;
    }
    if is_generic_role(&target.role) && !is_generic_role(&other.role) {
        target.role = other.role;
    }
    if target.email.is_none() {
        target.email = other.email;
    }
    if target.phone.is_none() {
        target.phone = other.phone;
    }
    if target.company.is_none() {
        target.company = other.company;
    }
    if target.section.is_none() {
        target.section = other.section;
    }
}

/// Non-empty plausible name and at least one channel.
fn is_valid(contact: &Contact) -> bool {
    is_plausible_name(&contact.name) && (contact.email.is_some() || contact.phone.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::library::default_library;
    use crate::models::contact::GENERIC_ROLE;
    use pretty_assertions::assert_eq;

    fn candidate(name: &str, role: &str, email: &str, phone: &str) -> CandidateContact {
        CandidateContact {
            name: name.to_string(),
            role: role.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            source_pattern: "role_name_email_phone".to_string(),
            confidence: 0.95,
            ..CandidateContact::default()
        }
    }

    fn validator() -> ContactValidator<'static> {
        ContactValidator::new(default_library())
    }

    #[test]
    fn test_normalizes_scenario_line() {
        let contacts = validator().validate(vec![candidate(
            "Jane Doe",
            "Director",
            " Jane@X.com ",
            "555-123-4567",
        )]);

        assert_eq!(contacts.len(), 1);
        let jane = &contacts[0];
        assert_eq!(jane.name, "Jane Doe");
        assert_eq!(jane.role, "DIRECTOR");
        assert_eq!(jane.email.as_deref(), Some("jane@x.com"));
        assert_eq!(jane.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(jane.section, Some(Section::Crew));
        assert!((jane.confidence - 0.95).abs() < 1e-4);
    }

    #[test]
    fn test_case_insensitive_email_dedup() {
        let contacts = validator().validate(vec![
            candidate("Jane Doe", "", "A@B.COM", ""),
            candidate("Jane Doe", "Producer", "a@b.com", "5551234567"),
        ]);

        assert_eq!(contacts.len(), 1);
        // the first record keeps its fields; empty ones are filled
        assert_eq!(contacts[0].role, "PRODUCER");
        assert_eq!(contacts[0].phone.as_deref(), Some("(555) 123-4567"));
    }

    #[test]
    fn test_first_source_wins_on_conflict() {
        let mut second = candidate("Janet Doe", "Stylist", "jane@x.com", "");
        second.source_pattern = "name_email".to_string();
        let contacts = validator().validate(vec![candidate("Jane Doe", "Director", "jane@x.com", ""), second]);

        assert_eq!(contacts[0].name, "Jane Doe");
        assert_eq!(contacts[0].role, "DIRECTOR");
        assert_eq!(contacts[0].source, "role_name_email_phone");
    }

    #[test]
    fn test_phone_key_uses_digits() {
        let contacts = validator().validate(vec![
            candidate("Tom Hill", "", "", "(555) 123-4567"),
            candidate("Tom Hill", "", "", "+1 555.123.4567"),
        ]);
        assert_eq!(contacts.len(), 1);
    }

    #[test]
    fn test_drops_invalid_records() {
        let contacts = validator().validate(vec![
            candidate("Jane Doe", "", "not-an-email", ""),
            candidate("", "", "x@y.com", ""),
            candidate("Email Contact", "", "z@y.com", ""),
            candidate("Sam Lee", "", "", "12"),
        ]);
        assert!(contacts.is_empty());
    }

    #[test]
    fn test_section_from_context_then_role() {
        let mut in_talent = candidate("Ava Stone", "Stylist", "ava@x.com", "");
        in_talent.context = Some("TALENT".to_string());
        let by_role = candidate("Jo Bell", "Line Producer", "jo@x.com", "");
        let generic = candidate("Kim Park", "", "kim@x.com", "");

        let contacts = validator().validate(vec![in_talent, by_role, generic]);
        assert_eq!(contacts[0].section, Some(Section::Talent));
        assert_eq!(contacts[1].section, Some(Section::Production));
        assert_eq!(contacts[2].section, None);
        assert_eq!(contacts[2].role, GENERIC_ROLE);
    }

    #[test]
    fn test_ai_records_use_ai_reliability() {
        let mut ai = candidate("Ava Stone", "Model", "ava@x.com", "");
        ai.source_pattern = AI_SOURCE.to_string();
        ai.confidence = 0.0;

        let low = validator().with_ai_reliability(0.0).validate(vec![ai.clone()]);
        let high = validator().with_ai_reliability(1.0).validate(vec![ai]);
        assert!(high[0].confidence > low[0].confidence);
    }

    #[test]
    fn test_quality_sort() {
        let sparse = candidate("Kim Park", "", "kim@x.com", "");
        let full = candidate("Jane Doe", "Director", "jane@x.com", "555-123-4567");

        let contacts = validator()
            .with_quality_sort(true)
            .validate(vec![sparse, full]);
        assert_eq!(contacts[0].name, "Jane Doe");
    }

    #[test]
    fn test_quality_sort_counts_filled_fields() {
        // Ann outweighs Bob on channels but has fewer fields
        let ann = candidate("Ann Lee", "", "ann@x.com", "555-123-4567");
        let mut bob = candidate("Bob Ray", "Gaffer", "", "555-987-6543");
        bob.company = "Lights Inc".to_string();

        let contacts = validator().with_quality_sort(true).validate(vec![ann, bob]);
        assert_eq!(contacts[0].name, "Bob Ray");
        assert_eq!(contacts[0].completeness(), 5);
        assert_eq!(contacts[1].completeness(), 3);
    }

    #[test]
    fn test_label_name_does_not_swallow_real_contact() {
        let contacts = validator().validate(vec![
            candidate("Email Contact", "", "jane@x.com", ""),
            candidate("Jane Doe", "Producer", "jane@x.com", ""),
        ]);

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Jane Doe");
        assert_eq!(contacts[0].role, "PRODUCER");
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut talent = candidate("Ava  Stone*", "model", "AVA@x.com.", "+44 20 7946 0958");
        talent.context = Some("CREW".to_string());
        let input = vec![
            talent,
            candidate("Jane Doe", "Director", "jane@x.com", "1-555-123-4567"),
            candidate("Jane Doe", "", "JANE@x.com", ""),
            candidate("Sam Lee", "", "", "555 010 2000"),
        ];

        for sort in [false, true] {
            let validator = validator().with_quality_sort(sort);
            let once = validator.validate(input.clone());
            let twice = validator.validate(once.iter().cloned().map(CandidateContact::from).collect());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_output_bounded_by_distinct_keys() {
        let input: Vec<_> = (0..30)
            .map(|i| candidate("Alex Smith", "", &format!("alex{}@x.com", i % 7), ""))
            .collect();
        let contacts = validator().validate(input);
        assert_eq!(contacts.len(), 7);
    }
}
