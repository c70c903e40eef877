//! Consolidated enhancement prompt and response parsing.

use serde::Serialize;
use serde_json::Value;

use crate::error::AiError;
use crate::models::contact::Contact;
use crate::models::document::DocumentAnalysis;

use super::{AiContact, AiResult};

/// System message for chat-style endpoints.
pub const SYSTEM_PROMPT: &str = "You extract contact details from film, fashion, \
commercial, music video and event call sheets. Reply with JSON only.";

const INSTRUCTIONS: &str = "\
Review the call sheet excerpt and the contacts already found.
1. Classify each person into a section: PRODUCTION, CLIENT, TALENT, CREW or AGENCY.
2. Clean the data: fix names, roles, emails and phone numbers that were split or garbled.
3. Link people to the company or agency they work for when the document says so.
4. Add people who have an email or phone in the excerpt but are missing from the list.
Never invent contact details that are not in the excerpt.

Reply with a JSON object of the form
{\"contacts\": [{\"name\": \"\", \"role\": \"\", \"email\": \"\", \"phone\": \"\", \"company\": \"\", \"section\": \"\"}]}";

/// Candidate as shown to the model.
#[derive(Serialize)]
struct PromptContact<'a> {
    name: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<&'a str>,
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_sample(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Build the single consolidated prompt.
pub fn build_prompt(sample: &str, analysis: &DocumentAnalysis, candidates: &[Contact]) -> String {
    let shown: Vec<PromptContact<'_>> = candidates
        .iter()
        .map(|c| PromptContact {
            name: &c.name,
            role: &c.role,
            email: c.email.as_deref(),
            phone: c.phone.as_deref(),
            company: c.company.as_deref(),
        })
        .collect();
    let candidates_json = serde_json::to_string_pretty(&shown).unwrap_or_else(|_| "[]".to_string());

    format!(
        "{INSTRUCTIONS}\n\nDocument type: {:?}\nProduction type: {:?}\n\n\
         Contacts found so far:\n{candidates_json}\n\n\
         Call sheet excerpt:\n\"\"\"\n{sample}\n\"\"\"\n",
        analysis.document_type, analysis.production_type
    )
}

/// Parse a model reply into contacts.
///
/// Accepts a bare array, an object with a `contacts` array, or either one
/// inside a fenced code block.
pub fn parse_response(body: &str) -> AiResult<Vec<AiContact>> {
    let json = strip_code_fence(body.trim());
    let value: Value =
        serde_json::from_str(json).map_err(|e| AiError::Malformed(e.to_string()))?;

    let contacts = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut object) => object
            .remove("contacts")
            .filter(Value::is_array)
            .ok_or_else(|| AiError::Malformed("missing \"contacts\" array".to_string()))?,
        other => {
            return Err(AiError::Malformed(format!(
                "expected an array or object, got {other}"
            )));
        }
    };

    let contacts: Vec<AiContact> =
        serde_json::from_value(contacts).map_err(|e| AiError::Malformed(e.to_string()))?;

    Ok(contacts
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .collect())
}

/// Inner text of a ```` ``` ```` fenced block, or the input unchanged.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // skip the info string (`json`) up to the first newline
    let body = rest.find('\n').map_or(rest, |i| &rest[i + 1..]);
    body.rfind("```").map_or(body, |end| &body[..end]).trim()
}
