//! Email normalization and validation.

use super::patterns::{EMAIL, EMAIL_SHAPE};

const WRAPPING: &[char] = &['<', '>', '(', ')', '[', ']', '"', '\'', ',', ';', ':'];

/// Normalize an email address: trim, strip wrapping punctuation, lower case.
///
/// Returns `None` when the result does not have an `x@y.z` shape.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw
        .trim()
        .trim_matches(|c: char| WRAPPING.contains(&c) || c.is_whitespace())
        .trim_end_matches('.')
        .to_lowercase();

    if is_valid_email(&email) { Some(email) } else { None }
}

/// Check that a string has the `x@y.z` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// All distinct email addresses in `text`, normalized, in first-seen order.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for m in EMAIL.find_iter(text) {
        if let Some(email) = normalize_email(m.as_str()) {
            if !emails.contains(&email) {
                emails.push(email);
            }
        }
    }
    emails
}
