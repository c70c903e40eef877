//! Role normalization, preference matching, and role → section inference.

use crate::models::contact::{GENERIC_ROLE, Section};

use super::name::collapse_whitespace;

/// Role keywords per section, checked in this order.
///
/// Agency and client come first so that `MODEL AGENT` or `CREATIVE DIRECTOR`
/// are not claimed by the talent or crew tables.
const SECTION_ROLES: &[(Section, &[&str])] = &[
    (
        Section::Agency,
        &["AGENT", "AGENCY", "BOOKER", "BOOKING", "REPRESENTATIVE", "REP"],
    ),
    (
        Section::Client,
        &[
            "CLIENT", "BRAND", "MARKETING", "ACCOUNT", "CREATIVE DIRECTOR", "ART BUYER",
        ],
    ),
    (
        Section::Talent,
        &[
            "MODEL", "TALENT", "ACTOR", "ACTRESS", "CAST", "ARTIST", "DANCER", "MUSICIAN",
            "HOST", "PERFORMER", "INFLUENCER",
        ],
    ),
    (
        Section::Production,
        &[
            "PRODUCER", "PRODUCTION", "COORDINATOR", "PA", "LOCATION MANAGER", "LOCATIONS",
            "UPM", "LINE PRODUCER",
        ],
    ),
    (
        Section::Crew,
        &[
            "DIRECTOR", "PHOTOGRAPHER", "DP", "DOP", "CINEMATOGRAPHER", "CAMERA", "GAFFER",
            "GRIP", "STYLIST", "HAIR", "MAKEUP", "MUA", "ASSISTANT", "AD", "EDITOR", "SOUND",
            "DIT", "DIGITECH", "DESIGNER", "RETOUCHER", "LIGHTING", "ELECTRIC", "WARDROBE",
            "CHOREOGRAPHER", "VIDEOGRAPHER", "OPERATOR", "TECH", "CREW", "MANICURIST",
        ],
    ),
];

/// Normalize a role label: collapse whitespace, strip trailing delimiters,
/// upper case. Empty input yields the generic role.
pub fn normalize_role(raw: &str) -> String {
    let role = collapse_whitespace(raw)
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | ',' | '/'))
        .to_uppercase();

    if role.is_empty() { GENERIC_ROLE.to_string() } else { role }
}

/// Whether `role` is the placeholder assigned when nothing was found.
pub fn is_generic_role(role: &str) -> bool {
    role.trim().is_empty() || role.trim().eq_ignore_ascii_case(GENERIC_ROLE)
}

/// Find the first preferred role mentioned in `span` (whole words,
/// case-insensitive). Returns it upper-cased.
pub fn match_role_preference(span: &str, preferences: &[String]) -> Option<String> {
    let span = span.to_uppercase();
    let words = words(&span);

    preferences.iter().find_map(|pref| {
        let pref = collapse_whitespace(pref).to_uppercase();
        (!pref.is_empty() && contains_keyword(&span, &words, &pref)).then_some(pref)
    })
}

/// Infer a section from role keywords.
pub fn section_for_role(role: &str) -> Option<Section> {
    if is_generic_role(role) {
        return None;
    }

    let role = role.to_uppercase();
    let words = words(&role);

    SECTION_ROLES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&role, &words, k)))
        .map(|(section, _)| *section)
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Single words must match a whole word; phrases match as substrings.
fn contains_keyword(text: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.contains(' ') {
        text.contains(keyword)
    } else {
        words.contains(&keyword)
    }
}
