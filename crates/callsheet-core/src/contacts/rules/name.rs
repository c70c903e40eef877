//! Person and company name cleanup.

/// Words that show up in the name slot but are labels, not names.
const LABEL_WORDS: &[&str] = &[
    "NAME", "EMAIL", "E-MAIL", "PHONE", "TEL", "MOBILE", "CELL", "CONTACT", "CONTACTS", "ROLE",
    "TITLE", "CALL", "TIME", "LOCATION", "ADDRESS", "NOTES", "TBD", "TBC", "N/A",
];

/// Strip noise characters from a name, keeping letters, blanks, hyphens,
/// periods and apostrophes. Whitespace is collapsed.
pub fn clean_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .map(|c| if c == '’' { '\'' } else { c })
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '.' | '\''))
        .collect();

    collapse_whitespace(&kept)
        .trim_matches(|c: char| c.is_whitespace() || c == '-' || c == '\'')
        .to_string()
}

/// A cleaned name worth keeping: more than one character, some letters,
/// and not made of label words.
pub fn is_plausible_name(name: &str) -> bool {
    if name.chars().count() <= 1 || !name.chars().any(char::is_alphabetic) {
        return false;
    }
    !name
        .split_whitespace()
        .all(|word| LABEL_WORDS.contains(&word.trim_end_matches(['.', ':']).to_uppercase().as_str()))
}

/// Collapse runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim and collapse a company name; empty input yields `None`.
pub fn clean_company(raw: &str) -> Option<String> {
    let company = collapse_whitespace(raw.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | '(' | ')' | '/' | '|' | '-')
    }));
    if company.chars().count() < 2 { None } else { Some(company) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_keeps_punctuation() {
        assert_eq!(clean_name("  Mary-Jane  O’Neil "), "Mary-Jane O'Neil");
        assert_eq!(clean_name("J. R. Smith"), "J. R. Smith");
        assert_eq!(clean_name("*Jane Doe*:"), "Jane Doe");
        assert_eq!(clean_name("Jane Doe (2)"), "Jane Doe");
    }

    #[test]
    fn test_clean_name_is_idempotent() {
        for raw in ["- Jane  Doe -", "- -Jane", "José María", "  O'Brien, Pat "] {
            let once = clean_name(raw);
            assert_eq!(clean_name(&once), once);
        }
    }

    #[test]
    fn test_plausible_name() {
        assert!(is_plausible_name("Jane Doe"));
        assert!(!is_plausible_name("J"));
        assert!(!is_plausible_name("Email Contact"));
        assert!(!is_plausible_name(""));
    }

    #[test]
    fn test_clean_company() {
        assert_eq!(clean_company(" Acme  Films, "), Some("Acme Films".to_string()));
        assert_eq!(clean_company(" , "), None);
    }
}
