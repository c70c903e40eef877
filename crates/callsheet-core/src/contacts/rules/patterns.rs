//! Common regex patterns for call sheet contact extraction.
//!
//! The `*_re!` macros expand to string literals so the pattern library can
//! compose full matchers with `concat!` and keep them `&'static str`.

use lazy_static::lazy_static;
use regex::Regex;

/// Start of a line, allowing a bullet or list number.
macro_rules! line_start_re {
    () => {
        r"(?m)^[ \t]*(?:[-*•·][ \t]*|\d{1,3}[.)][ \t]+)?"
    };
}

/// A role label such as `DIRECTOR` or `Hair & Makeup`.
macro_rules! role_re {
    () => {
        r"([A-Za-z0-9][A-Za-z0-9&'.()\- ]{0,38}?)"
    };
}

/// Delimiter between a leading role and the name.
macro_rules! role_delim_re {
    () => {
        r"(?:[ \t]*:[ \t]*|[ \t]+[-–][ \t]+)"
    };
}

/// Two to four capitalized words.
macro_rules! name_re {
    () => {
        r"(\p{Lu}[\p{L}'’.\-]*(?:[ \t]+\p{Lu}[\p{L}'’.\-]*){1,3})"
    };
}

/// Company name following a name.
macro_rules! company_re {
    () => {
        r"([\p{L}0-9&'.\- ]{2,40}?)"
    };
}

macro_rules! email_re {
    () => {
        r"([A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,})"
    };
}

macro_rules! phone_re {
    () => {
        r"(\+?\(?\d[\d \t().\-]{5,18}\d)"
    };
}

/// Loose separator: the shortest run of blanks and punctuation that lets
/// the next field match, so an opening `(` stays with a phone number.
macro_rules! sep_re {
    () => {
        r"[ \t/|,;:•·<>()\[\]–-]+?"
    };
}

/// Column separator for tabular rows.
macro_rules! column_sep_re {
    () => {
        r"(?:[ \t]*[|/•·\t][ \t]*|[ \t]{2,}|[ \t]+[-–][ \t]+)"
    };
}

/// Line break inside a stacked contact block.
macro_rules! line_break_re {
    () => {
        r"[ \t]*\r?\n[ \t]*"
    };
}

macro_rules! email_label_re {
    () => {
        r"(?:(?i:e-?mail|e)[ \t]*:[ \t]*)?"
    };
}

macro_rules! phone_label_re {
    () => {
        r"(?:(?i:phone|tel|mobile|cell|m|t|p)[ \t]*[:.][ \t]*)?"
    };
}

pub(crate) use {
    column_sep_re, company_re, email_label_re, email_re, line_break_re, line_start_re, name_re,
    phone_label_re, phone_re, role_delim_re, role_re, sep_re,
};

lazy_static! {
    /// Any email address.
    pub static ref EMAIL: Regex = Regex::new(
        r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}"
    ).unwrap();

    /// Normalized email shape: `x@y.z`.
    pub static ref EMAIL_SHAPE: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();

    /// Any phone-like digit run.
    pub static ref PHONE: Regex = Regex::new(
        r"\+?\(?\d[\d \t().\-]{5,18}\d"
    ).unwrap();

    /// Scheduling cues that mark a call sheet.
    pub static ref CALL_SHEET_CUE: Regex = Regex::new(
        r"(?i)\b(?:call\s*sheet|call\s*time|crew\s*call|general\s*call|shoot\s*date|wrap\s*time|first\s*shot)\b"
    ).unwrap();

    /// A crew roster heading.
    pub static ref CREW_LIST_CUE: Regex = Regex::new(
        r"(?im)^[ \t]*(?:crew\s*list|crew\s*contacts|crew)[ \t]*:?[ \t]*$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL.is_match("reach me at jane.doe+set@studio.co.uk today"));
        assert!(!EMAIL.is_match("jane at studio dot com"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE.is_match("555-123-4567"));
        assert!(PHONE.is_match("(555) 123-4567"));
        assert!(PHONE.is_match("+44 20 7946 0958"));
        assert!(!PHONE.is_match("Call 7"));
    }

    #[test]
    fn test_call_sheet_cue() {
        assert!(CALL_SHEET_CUE.is_match("GENERAL CALL: 7:00 AM"));
        assert!(CALL_SHEET_CUE.is_match("Callsheet - Day 2"));
        assert!(!CALL_SHEET_CUE.is_match("Please call me"));
    }

    #[test]
    fn test_composed_name_requires_two_words() {
        let re = Regex::new(concat!("^", name_re!(), "$")).unwrap();
        assert!(re.is_match("Jane Doe"));
        assert!(re.is_match("José María O'Neil"));
        assert!(!re.is_match("Phone"));
    }
}
