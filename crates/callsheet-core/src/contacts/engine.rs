//! Pattern extraction engine: applies the library to text under a budget.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use regex::Captures;
use tracing::{debug, info, warn};

use crate::error::PatternError;
use crate::models::config::ExtractOptions;
use crate::models::contact::{CandidateContact, GENERIC_ROLE, Section};

use super::library::{CompiledPattern, FieldTag, PatternLibrary};
use super::rules::{
    clean_name, is_plausible_name, match_role_preference, normalize_email, normalize_phone,
    phone_digits,
};

/// Default cap on matches consumed from one pattern.
pub const DEFAULT_MATCH_CEILING: usize = 500;

/// Longest line considered as a section header.
const MAX_HEADER_CHARS: usize = 48;

/// Most words a section header may have.
const MAX_HEADER_WORDS: usize = 4;

/// Output of one engine run.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// Candidates in pattern-priority order, then match order.
    pub candidates: Vec<CandidateContact>,
    /// Patterns that produced at least one candidate.
    pub patterns_used: Vec<String>,
    /// Patterns that failed and were skipped.
    pub failures: Vec<PatternError>,
    /// Patterns whose matches were cut at the ceiling.
    pub ceiling_hits: Vec<String>,
    /// Stopped because `max_contacts` distinct contacts were collected.
    pub early_exit: bool,
    /// Stopped because the time budget ran out.
    pub time_budget_exceeded: bool,
}

/// Candidates produced by one pattern.
struct PatternRun {
    candidates: Vec<CandidateContact>,
    ceiling_hit: bool,
}

/// Applies a [`PatternLibrary`] to raw text.
pub struct PatternEngine<'a> {
    library: &'a PatternLibrary,
    match_ceiling: usize,
}

impl<'a> PatternEngine<'a> {
    /// Create an engine over a library.
    pub fn new(library: &'a PatternLibrary) -> Self {
        Self {
            library,
            match_ceiling: DEFAULT_MATCH_CEILING,
        }
    }

    /// Set the per-pattern match ceiling.
    pub fn with_match_ceiling(mut self, ceiling: usize) -> Self {
        self.match_ceiling = ceiling;
        self
    }

    /// Extract candidates, timing the budget from now.
    pub fn extract(&self, text: &str, options: &ExtractOptions) -> EngineOutput {
        self.extract_since(text, options, Instant::now())
    }

    /// Extract candidates, timing the budget from `started`.
    ///
    /// The budget is checked before each pattern; a pattern already running
    /// is allowed to finish.
    pub fn extract_since(
        &self,
        text: &str,
        options: &ExtractOptions,
        started: Instant,
    ) -> EngineOutput {
        let budget = Duration::from_millis(options.max_processing_time_ms);
        let headers = section_headers(text);
        let mut output = EngineOutput::default();
        // lower-priority patterns re-read lines already matched; only new
        // contacts count toward `max_contacts`
        let mut seen: HashSet<String> = HashSet::new();

        info!(
            "Applying {} patterns to {} characters ({} section headers)",
            self.library.len(),
            text.len(),
            headers.len()
        );

        for pattern in self.library.patterns() {
            if seen.len() >= options.max_contacts {
                output.early_exit = true;
                break;
            }
            if started.elapsed() >= budget {
                warn!(
                    "Time budget of {}ms exhausted before pattern {}",
                    options.max_processing_time_ms,
                    pattern.name()
                );
                output.time_budget_exceeded = true;
                break;
            }

            match self.apply(pattern, text, &headers, &mut seen, options) {
                Ok(run) => {
                    debug!(
                        pattern = pattern.name(),
                        matches = run.candidates.len(),
                        "Applied pattern"
                    );
                    if run.ceiling_hit {
                        output.ceiling_hits.push(pattern.name().to_string());
                    }
                    if !run.candidates.is_empty() {
                        output.patterns_used.push(pattern.name().to_string());
                    }
                    output.candidates.extend(run.candidates);
                }
                Err(e) => {
                    warn!("Skipping pattern {}: {}", pattern.name(), e);
                    output.failures.push(e);
                }
            }
        }

        if !output.early_exit && seen.len() >= options.max_contacts {
            output.early_exit = true;
        }

        debug!(
            "Engine produced {} candidates ({} distinct) from {} patterns",
            output.candidates.len(),
            seen.len(),
            output.patterns_used.len()
        );

        output
    }

    /// Run one pattern. Stops at the first new contact past `max_contacts`;
    /// repeats of contacts in `seen` are always kept.
    fn apply(
        &self,
        pattern: &CompiledPattern,
        text: &str,
        headers: &[(usize, String)],
        seen: &mut HashSet<String>,
        options: &ExtractOptions,
    ) -> Result<PatternRun, PatternError> {
        let matcher = pattern.matcher.as_ref().map_err(Clone::clone)?;

        let mut run = PatternRun {
            candidates: Vec::new(),
            ceiling_hit: false,
        };

        for (consumed, caps) in matcher.captures_iter(text).enumerate() {
            if consumed >= self.match_ceiling {
                run.ceiling_hit = true;
                break;
            }
            let Some(candidate) = build_candidate(pattern, &caps, headers, &options.role_preferences)
            else {
                continue;
            };
            if let Some(key) = contact_key(&candidate) {
                if !seen.contains(&key) {
                    if seen.len() >= options.max_contacts {
                        break;
                    }
                    seen.insert(key);
                }
            }
            run.candidates.push(candidate);
        }

        Ok(run)
    }
}

/// Map capture groups onto a candidate. Returns `None` when the match fails
/// minimal validation (name longer than one character, some channel).
fn build_candidate(
    pattern: &CompiledPattern,
    caps: &Captures<'_>,
    headers: &[(usize, String)],
    role_preferences: &[String],
) -> Option<CandidateContact> {
    let whole = caps.get(0)?;
    let mut candidate = CandidateContact {
        source_pattern: pattern.name().to_string(),
        raw_span: whole.as_str().trim().to_string(),
        context: header_before(headers, whole.start()),
        confidence: pattern.definition.reliability,
        ..CandidateContact::default()
    };

    for (index, tag) in pattern.definition.fields.iter().enumerate() {
        let value = caps.get(index + 1).map(|m| m.as_str().trim()).unwrap_or("");
        if value.is_empty() {
            continue;
        }
        let slot = match tag {
            FieldTag::Name => &mut candidate.name,
            FieldTag::Role => &mut candidate.role,
            FieldTag::Email => &mut candidate.email,
            FieldTag::Phone => &mut candidate.phone,
            FieldTag::Company => &mut candidate.company,
        };
        // first capture for a repeated tag wins
        if slot.is_empty() {
            *slot = value.to_string();
        }
    }

    if candidate.name.chars().count() <= 1 || !candidate.has_channel() {
        return None;
    }

    if candidate.role.is_empty() {
        candidate.role = match_role_preference(&candidate.raw_span, role_preferences)
            .unwrap_or_else(|| GENERIC_ROLE.to_string());
    }

    Some(candidate)
}

/// Identity the validator will give this candidate, or `None` when it
/// would be dropped as invalid.
fn contact_key(candidate: &CandidateContact) -> Option<String> {
    if !is_plausible_name(&clean_name(&candidate.name)) {
        return None;
    }
    if let Some(email) = normalize_email(&candidate.email) {
        return Some(format!("email:{}", email.to_lowercase()));
    }
    normalize_phone(&candidate.phone).map(|phone| format!("phone:{}", phone_digits(&phone)))
}

/// Byte offsets and text of lines that look like section headers
/// (`CREW`, `Talent:`, `== CLIENT CONTACTS ==`), in document order.
pub fn section_headers(text: &str) -> Vec<(usize, String)> {
    let mut headers = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if is_section_header(line) {
            headers.push((offset, line.trim().to_string()));
        }
        offset += line.len();
    }

    headers
}

fn is_section_header(line: &str) -> bool {
    let label = line.trim().trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '#' | '*' | '=' | '-' | '_' | ':' | '[' | ']')
    });

    if label.is_empty()
        || label.chars().count() > MAX_HEADER_CHARS
        || label.split_whitespace().count() > MAX_HEADER_WORDS
        || label.contains('@')
        || label.contains(':')
        || label.chars().any(|c| c.is_ascii_digit())
    {
        return false;
    }

    Section::from_label(label).is_some()
}

/// Nearest header starting at or before `offset`.
fn header_before(headers: &[(usize, String)], offset: usize) -> Option<String> {
    let index = headers.partition_point(|(start, _)| *start <= offset);
    index.checked_sub(1).map(|i| headers[i].1.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::library::{PatternDefinition, default_library};

    fn options() -> ExtractOptions {
        ExtractOptions::default()
    }

    #[test]
    fn test_role_line_yields_candidates_in_priority_order() {
        let engine = PatternEngine::new(default_library());
        let output = engine.extract("DIRECTOR: Jane Doe / jane@x.com / 555-123-4567", &options());

        assert!(!output.candidates.is_empty());
        let first = &output.candidates[0];
        assert_eq!(first.source_pattern, "role_name_email_phone");
        assert_eq!(first.name, "Jane Doe");
        assert_eq!(first.role, "DIRECTOR");
        assert_eq!(first.email, "jane@x.com");
        assert_eq!(first.phone, "555-123-4567");
        assert_eq!(output.patterns_used[0], "role_name_email_phone");
    }

    #[test]
    fn test_max_contacts_early_exit() {
        let text: String = (0..600)
            .map(|i| format!("Alex Smith / alex{i}@x.com\n"))
            .collect();
        let engine = PatternEngine::new(default_library());
        let output = engine.extract(&text, &options().with_max_contacts(50));

        assert_eq!(output.candidates.len(), 50);
        assert!(output.early_exit);
    }

    #[test]
    fn test_repeated_matches_do_not_count_toward_max_contacts() {
        let mut text: String = (0..30)
            .map(|i| format!("DIRECTOR: Jane Doe / jane{i}@x.com / 555-123-{i:04}\n"))
            .collect();
        text.extend((0..100).map(|i| format!("Alex Smith / alex{i}@x.com\n")));

        let engine = PatternEngine::new(default_library());
        let output = engine.extract(&text, &options().with_max_contacts(50));

        let emails: HashSet<&str> = output.candidates.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails.len(), 50);
        assert_eq!(emails.iter().filter(|e| e.starts_with("alex")).count(), 20);
        assert!(output.candidates.len() > 50);
        assert!(output.early_exit);
    }

    #[test]
    fn test_implausible_names_do_not_count_toward_max_contacts() {
        let text = "Email Contact / a@x.com\nJane Doe / jane@x.com\n";
        let engine = PatternEngine::new(default_library());
        let output = engine.extract(text, &options().with_max_contacts(1));

        assert!(output.candidates.iter().any(|c| c.name == "Jane Doe"));
    }

    #[test]
    fn test_match_ceiling() {
        let text: String = (0..20)
            .map(|i| format!("Alex Smith / alex{i}@x.com\n"))
            .collect();
        let engine = PatternEngine::new(default_library()).with_match_ceiling(5);
        let output = engine.extract(&text, &options());

        assert_eq!(output.candidates.len(), 5);
        assert_eq!(output.ceiling_hits, vec!["name_email".to_string()]);
        assert!(!output.early_exit);
    }

    #[test]
    fn test_zero_time_budget_returns_partial() {
        let engine = PatternEngine::new(default_library());
        let output = engine.extract(
            "DIRECTOR: Jane Doe / jane@x.com",
            &options().with_max_processing_time_ms(0),
        );

        assert!(output.time_budget_exceeded);
        assert!(output.candidates.is_empty());
    }

    #[test]
    fn test_failing_pattern_is_skipped() {
        let library = PatternLibrary::new(&[
            PatternDefinition {
                name: "broken",
                priority: 1,
                matcher: r"(unclosed",
                fields: &[FieldTag::Name],
                reliability: 0.5,
            },
            PatternDefinition {
                name: "simple",
                priority: 2,
                matcher: r"(?m)^(\w+ \w+) <([^>]+)>",
                fields: &[FieldTag::Name, FieldTag::Email],
                reliability: 0.5,
            },
        ]);
        let output = PatternEngine::new(&library).extract("Jane Doe <jane@x.com>", &options());

        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].pattern(), "broken");
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].source_pattern, "simple");
    }

    #[test]
    fn test_role_preferences_and_generic_role() {
        let engine = PatternEngine::new(default_library());
        let prefs = options().with_role_preferences(["Stylist"]);

        let output = engine.extract("Jane Doe Stylist / jane@x.com", &prefs);
        assert_eq!(output.candidates[0].role, "STYLIST");

        let output = engine.extract("Jane Doe / jane@x.com", &prefs);
        assert_eq!(output.candidates[0].role, GENERIC_ROLE);
    }

    #[test]
    fn test_minimal_validation_rejects_channel_less_matches() {
        let library = PatternLibrary::new(&[PatternDefinition {
            name: "name_only",
            priority: 1,
            matcher: r"(?m)^(\w+ \w+)()$",
            fields: &[FieldTag::Name, FieldTag::Email],
            reliability: 0.5,
        }]);
        let output = PatternEngine::new(&library).extract("Jane Doe", &options());
        assert!(output.candidates.is_empty());
    }

    #[test]
    fn test_section_context_is_threaded() {
        let text = "\
CREW
Gaffer: Tom Hill / tom@light.com

TALENT
Model: Ava Stone / ava@agency.com
";
        let engine = PatternEngine::new(default_library());
        let output = engine.extract(text, &options());

        let tom = output.candidates.iter().find(|c| c.name == "Tom Hill").unwrap();
        assert_eq!(tom.context.as_deref(), Some("CREW"));
        let ava = output.candidates.iter().find(|c| c.name == "Ava Stone").unwrap();
        assert_eq!(ava.context.as_deref(), Some("TALENT"));
    }

    #[test]
    fn test_section_headers() {
        let text = "== PRODUCTION ==\nProducer: Jo Bell / jo@x.com\nThe crew will meet at base camp early\nClient Contacts:\n";
        let headers = section_headers(text);
        let labels: Vec<_> = headers.iter().map(|(_, l)| l.as_str()).collect();
        assert_eq!(labels, vec!["== PRODUCTION ==", "Client Contacts:"]);
        assert_eq!(headers[0].0, 0);
    }
}
