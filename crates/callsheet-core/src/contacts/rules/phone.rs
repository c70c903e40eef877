//! Phone number normalization.

/// Fewer digits than this is not treated as a phone number.
pub const MIN_PHONE_DIGITS: usize = 7;

/// More digits than this is not treated as a phone number (E.164 max).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Digits of a phone string, nothing else.
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize a phone number.
///
/// - 10 digits: `(AAA) BBB-CCCC`
/// - 11 digits with a leading `1`: the `1` is dropped, then as above
/// - anything else in range: the bare digits, keeping a leading `+`
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits = phone_digits(trimmed);

    if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
        return None;
    }

    match digits.len() {
        10 => Some(format_north_american(&digits)),
        11 if digits.starts_with('1') => Some(format_north_american(&digits[1..])),
        _ if trimmed.starts_with('+') => Some(format!("+{digits}")),
        _ => Some(digits),
    }
}

/// Format exactly ten digits as `(AAA) BBB-CCCC`.
fn format_north_american(digits: &str) -> String {
    format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..10])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_digits() {
        for raw in ["555-123-4567", "(555) 123-4567", "555.123.4567", "5551234567"] {
            assert_eq!(normalize_phone(raw), Some("(555) 123-4567".to_string()), "{raw}");
        }
    }

    #[test]
    fn test_eleven_digits_leading_one() {
        assert_eq!(
            normalize_phone("1-555-123-4567"),
            Some("(555) 123-4567".to_string())
        );
        assert_eq!(
            normalize_phone("+1 (555) 123 4567"),
            Some("(555) 123-4567".to_string())
        );
    }

    #[test]
    fn test_international_keeps_plus() {
        assert_eq!(
            normalize_phone("+44 20 7946 0958"),
            Some("+442079460958".to_string())
        );
        assert_eq!(normalize_phone("44 20 7946 0958"), Some("442079460958".to_string()));
    }

    #[test]
    fn test_rejects_short_and_long() {
        assert_eq!(normalize_phone("123"), None);
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("1234567890123456"), None);
    }

    #[test]
    fn test_every_ten_digit_string_formats() {
        for n in [0u64, 1_234_567_890, 5_551_234_567, 9_999_999_999] {
            let raw = format!("{n:010}");
            let out = normalize_phone(&raw).unwrap();
            assert_eq!(out, format!("({}) {}-{}", &raw[0..3], &raw[3..6], &raw[6..10]));
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["555-123-4567", "+44 20 7946 0958", "1 555 123 4567", "12345678"] {
            let once = normalize_phone(raw).unwrap();
            assert_eq!(normalize_phone(&once), Some(once.clone()));
        }
    }
}
