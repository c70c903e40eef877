//! Confidence scoring for contacts.

use crate::models::contact::Contact;

use super::rules::is_generic_role;

/// Weight of each populated field in the completeness score. Sums to 1.0.
const NAME_WEIGHT: f32 = 0.30;
const EMAIL_WEIGHT: f32 = 0.30;
const PHONE_WEIGHT: f32 = 0.25;
const ROLE_WEIGHT: f32 = 0.10;
const COMPANY_WEIGHT: f32 = 0.05;

/// Share of the final score taken by completeness; the rest is the pattern
/// reliability prior.
const COMPLETENESS_SHARE: f32 = 0.75;

/// Weighted share of populated fields (0.0 - 1.0).
pub fn completeness(contact: &Contact) -> f32 {
    let mut score = 0.0;
    if !contact.name.trim().is_empty() {
        score += NAME_WEIGHT;
    }
    if contact.email.is_some() {
        score += EMAIL_WEIGHT;
    }
    if contact.phone.is_some() {
        score += PHONE_WEIGHT;
    }
    if !is_generic_role(&contact.role) {
        score += ROLE_WEIGHT;
    }
    if contact.company.is_some() {
        score += COMPANY_WEIGHT;
    }
    score
}

/// Per-contact confidence from field completeness and pattern reliability.
///
/// Adding a field never lowers the score.
pub fn score_contact(contact: &Contact, reliability: f32) -> f32 {
    let reliability = reliability.clamp(0.0, 1.0);
    let score = COMPLETENESS_SHARE * completeness(contact) + (1.0 - COMPLETENESS_SHARE) * reliability;
    round(score.clamp(0.0, 1.0))
}

/// Count-weighted mean confidence: each contact counts once.
/// An empty list scores 0.
pub fn aggregate_confidence(contacts: &[Contact]) -> f32 {
    if contacts.is_empty() {
        return 0.0;
    }
    let total: f32 = contacts.iter().map(|c| c.confidence).sum();
    round(total / contacts.len() as f32)
}

/// Round to 4 decimals so repeated scoring is stable.
fn round(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
