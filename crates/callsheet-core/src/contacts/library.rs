//! The pattern library: ordered matcher definitions with field mappings.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::rules::patterns::{
    column_sep_re, company_re, email_label_re, email_re, line_break_re, line_start_re, name_re,
    phone_label_re, phone_re, role_delim_re, role_re, sep_re,
};
use crate::error::PatternError;

/// Compiled program size cap per matcher.
const REGEX_SIZE_LIMIT: usize = 1 << 24;

/// Semantic field a capture group maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    Name,
    Role,
    Email,
    Phone,
    Company,
}

/// One entry of the pattern library.
///
/// `fields[i]` names what capture group `i + 1` of `matcher` holds.
#[derive(Debug, Clone, Copy)]
pub struct PatternDefinition {
    pub name: &'static str,
    /// Lower runs first.
    pub priority: u8,
    pub matcher: &'static str,
    pub fields: &'static [FieldTag],
    /// Prior for how often a match of this pattern is a real contact.
    pub reliability: f32,
}

use FieldTag::*;

/// Built-in definitions, most specific first.
pub static DEFINITIONS: &[PatternDefinition] = &[
    PatternDefinition {
        name: "role_name_email_phone",
        priority: 10,
        matcher: concat!(
            line_start_re!(), role_re!(), role_delim_re!(), name_re!(), sep_re!(),
            email_label_re!(), email_re!(), sep_re!(), phone_label_re!(), phone_re!()
        ),
        fields: &[Role, Name, Email, Phone],
        reliability: 0.95,
    },
    PatternDefinition {
        name: "role_name_phone_email",
        priority: 10,
        matcher: concat!(
            line_start_re!(), role_re!(), role_delim_re!(), name_re!(), sep_re!(),
            phone_label_re!(), phone_re!(), sep_re!(), email_label_re!(), email_re!()
        ),
        fields: &[Role, Name, Phone, Email],
        reliability: 0.95,
    },
    PatternDefinition {
        name: "role_name_company_contact",
        priority: 20,
        matcher: concat!(
            line_start_re!(), role_re!(), role_delim_re!(), name_re!(),
            r"[ \t]*(?:,|\(|[ \t][-–][ \t]|[ \t]@[ \t]|[ \t](?i:at)[ \t])[ \t]*",
            company_re!(), r"\)?", sep_re!(), email_label_re!(), email_re!(),
            "(?:", sep_re!(), phone_label_re!(), phone_re!(), ")?"
        ),
        fields: &[Role, Name, Company, Email, Phone],
        reliability: 0.9,
    },
    PatternDefinition {
        name: "name_role_table_row",
        // after the role-first patterns: "Production Coordinator - Max Green"
        // must not read as name "Production Coordinator"
        priority: 45,
        matcher: concat!(
            line_start_re!(), name_re!(), column_sep_re!(), role_re!(), column_sep_re!(),
            email_label_re!(), email_re!(),
            "(?:", sep_re!(), phone_label_re!(), phone_re!(), ")?"
        ),
        fields: &[Name, Role, Email, Phone],
        reliability: 0.9,
    },
    PatternDefinition {
        name: "name_paren_role_contact",
        priority: 30,
        matcher: concat!(
            line_start_re!(), name_re!(),
            r"[ \t]*\([ \t]*([A-Za-z0-9][A-Za-z0-9&'./\- ]{0,38}?)[ \t]*\)", sep_re!(),
            email_label_re!(), email_re!(),
            "(?:", sep_re!(), phone_label_re!(), phone_re!(), ")?"
        ),
        fields: &[Name, Role, Email, Phone],
        reliability: 0.85,
    },
    PatternDefinition {
        name: "role_name_email",
        priority: 40,
        matcher: concat!(
            line_start_re!(), role_re!(), role_delim_re!(), name_re!(), sep_re!(),
            email_label_re!(), email_re!()
        ),
        fields: &[Role, Name, Email],
        reliability: 0.85,
    },
    PatternDefinition {
        name: "role_name_phone",
        priority: 40,
        matcher: concat!(
            line_start_re!(), role_re!(), role_delim_re!(), name_re!(), sep_re!(),
            phone_label_re!(), phone_re!()
        ),
        fields: &[Role, Name, Phone],
        reliability: 0.8,
    },
    PatternDefinition {
        name: "labeled_block",
        priority: 50,
        matcher: concat!(
            r"(?m)^[ \t]*(?i:name)[ \t]*:[ \t]*", name_re!(), line_break_re!(),
            r"(?:(?i:role|title|position)[ \t]*:[ \t]*", role_re!(), line_break_re!(), ")?",
            r"(?i:e-?mail)[ \t]*:[ \t]*", email_re!(),
            "(?:", line_break_re!(), r"(?i:phone|tel|mobile|cell)[ \t]*:[ \t]*", phone_re!(), ")?"
        ),
        fields: &[Name, Role, Email, Phone],
        reliability: 0.85,
    },
    PatternDefinition {
        name: "stacked_block",
        priority: 60,
        matcher: concat!(
            line_start_re!(), name_re!(), line_break_re!(),
            r"([A-Za-z0-9][A-Za-z0-9&'.()/\- ]{1,40}?)", line_break_re!(),
            email_label_re!(), email_re!(),
            "(?:", line_break_re!(), phone_label_re!(), phone_re!(), ")?"
        ),
        fields: &[Name, Role, Email, Phone],
        reliability: 0.7,
    },
    PatternDefinition {
        name: "stacked_name_contact",
        priority: 60,
        matcher: concat!(
            line_start_re!(), name_re!(), line_break_re!(), email_label_re!(), email_re!(),
            "(?:", line_break_re!(), phone_label_re!(), phone_re!(), ")?"
        ),
        fields: &[Name, Email, Phone],
        reliability: 0.65,
    },
    PatternDefinition {
        name: "name_email_phone",
        priority: 70,
        matcher: concat!(
            line_start_re!(), name_re!(), sep_re!(), email_label_re!(), email_re!(), sep_re!(),
            phone_label_re!(), phone_re!()
        ),
        fields: &[Name, Email, Phone],
        reliability: 0.75,
    },
    PatternDefinition {
        name: "name_phone_email",
        priority: 70,
        matcher: concat!(
            line_start_re!(), name_re!(), sep_re!(), phone_label_re!(), phone_re!(), sep_re!(),
            email_label_re!(), email_re!()
        ),
        fields: &[Name, Phone, Email],
        reliability: 0.75,
    },
    PatternDefinition {
        name: "name_email",
        priority: 80,
        matcher: concat!(line_start_re!(), name_re!(), sep_re!(), email_label_re!(), email_re!()),
        fields: &[Name, Email],
        reliability: 0.65,
    },
    PatternDefinition {
        name: "name_phone",
        priority: 90,
        matcher: concat!(line_start_re!(), name_re!(), sep_re!(), phone_label_re!(), phone_re!()),
        fields: &[Name, Phone],
        reliability: 0.6,
    },
];

/// A definition together with its compiled matcher, or why it failed.
#[derive(Debug)]
pub struct CompiledPattern {
    pub definition: PatternDefinition,
    pub matcher: Result<Regex, PatternError>,
}

impl CompiledPattern {
    fn compile(definition: PatternDefinition) -> Self {
        let matcher = RegexBuilder::new(definition.matcher)
            .size_limit(REGEX_SIZE_LIMIT)
            .dfa_size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|e| PatternError::Compile {
                pattern: definition.name.to_string(),
                reason: e.to_string(),
            })
            .and_then(|regex| {
                let groups = regex.captures_len() - 1;
                if groups == definition.fields.len() {
                    Ok(regex)
                } else {
                    Err(PatternError::MappingMismatch {
                        pattern: definition.name.to_string(),
                        groups,
                        fields: definition.fields.len(),
                    })
                }
            });

        Self { definition, matcher }
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }
}

/// The ordered, compiled pattern set. Read-only after construction.
#[derive(Debug)]
pub struct PatternLibrary {
    patterns: Vec<CompiledPattern>,
}

impl PatternLibrary {
    /// Compile definitions and order them by priority.
    ///
    /// Declaration order breaks priority ties. A definition whose name repeats
    /// an earlier one is kept as a compile failure so the engine skips it.
    pub fn new(definitions: &[PatternDefinition]) -> Self {
        let mut ordered: Vec<PatternDefinition> = definitions.to_vec();
        ordered.sort_by_key(|d| d.priority);

        let mut seen: Vec<&'static str> = Vec::with_capacity(ordered.len());
        let patterns = ordered
            .into_iter()
            .map(|definition| {
                if seen.contains(&definition.name) {
                    return CompiledPattern {
                        definition,
                        matcher: Err(PatternError::Compile {
                            pattern: definition.name.to_string(),
                            reason: "duplicate pattern name".to_string(),
                        }),
                    };
                }
                seen.push(definition.name);
                CompiledPattern::compile(definition)
            })
            .collect::<Vec<_>>();

        for pattern in &patterns {
            if let Err(e) = &pattern.matcher {
                warn!("Pattern {} unavailable: {}", pattern.name(), e);
            }
        }

        Self { patterns }
    }

    /// Patterns in application order.
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Reliability prior of a pattern by name.
    pub fn reliability(&self, name: &str) -> Option<f32> {
        self.patterns
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.definition.reliability)
    }
}

lazy_static! {
    static ref DEFAULT_LIBRARY: Arc<PatternLibrary> = Arc::new(PatternLibrary::new(DEFINITIONS));
}

/// The built-in library, compiled once per process.
pub fn default_library() -> &'static PatternLibrary {
    &DEFAULT_LIBRARY
}

/// Shared handle to the built-in library.
pub fn shared_default_library() -> Arc<PatternLibrary> {
    Arc::clone(&DEFAULT_LIBRARY)
}
