//! Document classification: document kind, production type, contact estimate.

use tracing::debug;

use crate::models::document::{DocumentAnalysis, DocumentType, ProductionType, RawText};

use super::rules::extract_emails;
use super::rules::patterns::{CALL_SHEET_CUE, CREW_LIST_CUE, EMAIL, PHONE};

/// Keyword sets per production type. Declaration order breaks score ties.
const PRODUCTION_KEYWORDS: &[(ProductionType, &[&str])] = &[
    (
        ProductionType::Fashion,
        &[
            "FASHION", "MODEL", "STYLIST", "WARDROBE", "LOOKBOOK", "EDITORIAL", "CAMPAIGN",
            "HAIR", "MAKEUP", "MUA", "RUNWAY", "BOOKER", "FITTING", "COLLECTION",
        ],
    ),
    (
        ProductionType::Film,
        &[
            "FILM", "SCENE", "SCRIPT", "CAST", "ACTOR", "ACTRESS", "GAFFER", "GRIP", "DP",
            "1ST AD", "CONTINUITY", "SHOOTING SCHEDULE", "LOCATION MANAGER", "EXTRAS",
        ],
    ),
    (
        ProductionType::Commercial,
        &[
            "COMMERCIAL", "SPOT", "AGENCY", "CLIENT", "BRAND", "ACCOUNT", "CREATIVE DIRECTOR",
            "ART BUYER", "PRODUCT", "TVC", "BROADCAST",
        ],
    ),
    (
        ProductionType::MusicVideo,
        &[
            "MUSIC VIDEO", "ARTIST", "BAND", "LABEL", "TRACK", "SONG", "PLAYBACK", "CHOREOGRAPHER",
            "DANCER", "DANCERS", "RECORDS",
        ],
    ),
    (
        ProductionType::Event,
        &[
            "EVENT", "VENUE", "GUEST", "GUESTS", "RSVP", "CATERING", "DOORS", "STAGE",
            "RUN OF SHOW", "SPEAKER", "REGISTRATION",
        ],
    ),
];

/// File name fragments that hint at a document type.
const FILE_NAME_HINTS: &[(&str, DocumentType)] = &[
    ("callsheet", DocumentType::CallSheet),
    ("call_sheet", DocumentType::CallSheet),
    ("call-sheet", DocumentType::CallSheet),
    ("call sheet", DocumentType::CallSheet),
    ("crew", DocumentType::CrewList),
    ("contact", DocumentType::ContactList),
];

/// Number of distinct addresses that makes a plain contact list.
const CONTACT_LIST_MIN_EMAILS: usize = 2;

/// Classifies documents before extraction. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAnalyzer;

impl DocumentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze acquired text, using its file name as a hint.
    pub fn analyze(&self, raw: &RawText) -> DocumentAnalysis {
        self.analyze_text(raw.text(), raw.file_name())
    }

    /// Analyze text with an optional file name.
    pub fn analyze_text(&self, text: &str, file_name: Option<&str>) -> DocumentAnalysis {
        if text.trim().is_empty() {
            return DocumentAnalysis::default();
        }

        let (production_type, confidence) = classify_production(text);
        let analysis = DocumentAnalysis {
            document_type: classify_document(text, file_name),
            production_type,
            estimated_contacts: estimate_contacts(text),
            confidence,
        };

        debug!(
            "Document analysis: {:?} / {:?} ({:.2}), ~{} contacts",
            analysis.document_type,
            analysis.production_type,
            analysis.confidence,
            analysis.estimated_contacts
        );

        analysis
    }
}

/// Highest-scoring production type and its score.
fn classify_production(text: &str) -> (ProductionType, f32) {
    let upper = text.to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut best = (ProductionType::Unknown, 0.0_f32);
    for (production_type, keywords) in PRODUCTION_KEYWORDS {
        let hits = keywords
            .iter()
            .filter(|k| {
                if k.contains(' ') {
                    upper.contains(*k)
                } else {
                    words.contains(k)
                }
            })
            .count();
        let score = hits as f32 / keywords.len() as f32;
        // strict comparison keeps the earlier type on ties
        if score > best.1 {
            best = (*production_type, score);
        }
    }

    best
}

fn classify_document(text: &str, file_name: Option<&str>) -> DocumentType {
    if CALL_SHEET_CUE.is_match(text) {
        return DocumentType::CallSheet;
    }
    if CREW_LIST_CUE.is_match(text) {
        return DocumentType::CrewList;
    }
    if extract_emails(text).len() >= CONTACT_LIST_MIN_EMAILS {
        return DocumentType::ContactList;
    }

    file_name
        .map(str::to_lowercase)
        .and_then(|name| {
            FILE_NAME_HINTS
                .iter()
                .find(|(hint, _)| name.contains(hint))
                .map(|(_, document_type)| *document_type)
        })
        .unwrap_or_default()
}

/// Lines carrying an email address or a phone number.
fn estimate_contacts(text: &str) -> usize {
    text.lines()
        .filter(|line| EMAIL.is_match(line) || PHONE.is_match(line))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_text_is_unknown() {
        let analysis = DocumentAnalyzer::new().analyze_text("   \n", Some("callsheet.pdf"));
        assert_eq!(analysis, DocumentAnalysis::default());
        assert_eq!(analysis.confidence, 0.0);
    }

    #[test]
    fn test_fashion_call_sheet() {
        let text = "\
SPRING CAMPAIGN CALL SHEET
General Call: 7:00 AM
Photographer: Kim Park / kim@lens.com
Stylist: Rita Moreno / rita@style.io
Model: Ava Stone / 555-010-2000
Hair & Makeup: Ana Silva";
        let analysis = DocumentAnalyzer::new().analyze_text(text, None);

        assert_eq!(analysis.document_type, DocumentType::CallSheet);
        assert_eq!(analysis.production_type, ProductionType::Fashion);
        assert_eq!(analysis.estimated_contacts, 3);
        assert!(analysis.confidence > 0.0 && analysis.confidence <= 1.0);
    }

    #[test]
    fn test_production_scores_are_normalized() {
        // one hit out of 14 loses to one hit out of 11
        let (kind, _) = classify_production("MODEL and SPOT");
        assert_eq!(kind, ProductionType::Commercial);

        // equal set sizes tie; the earlier type wins
        let (kind, _) = classify_production("gaffer and model");
        assert_eq!(kind, ProductionType::Fashion);

        let (kind, score) = classify_production("nothing relevant here");
        assert_eq!(kind, ProductionType::Unknown);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_document_type_cues() {
        let analyzer = DocumentAnalyzer::new();

        let crew = analyzer.analyze_text("CREW\nGaffer: Tom Hill", None);
        assert_eq!(crew.document_type, DocumentType::CrewList);

        let list = analyzer.analyze_text("a@x.com\nb@y.com", None);
        assert_eq!(list.document_type, DocumentType::ContactList);

        let hinted = analyzer.analyze_text("Tom Hill 555-123-4567", Some("Day2_CallSheet.pdf"));
        assert_eq!(hinted.document_type, DocumentType::CallSheet);

        let unknown = analyzer.analyze_text("Tom Hill 555-123-4567", Some("notes.txt"));
        assert_eq!(unknown.document_type, DocumentType::Unknown);
    }

    #[test]
    fn test_analyze_raw_text_uses_file_name() {
        let raw = RawText::new("Tom Hill 555-123-4567").with_file_name("crew_contacts.txt");
        let analysis = DocumentAnalyzer::new().analyze(&raw);
        assert_eq!(analysis.document_type, DocumentType::CrewList);
    }
}
