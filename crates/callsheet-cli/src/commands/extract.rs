//! Extract command - pull contacts out of a single call sheet.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use callsheet_core::{CallsheetConfig, ContactExtractor, ExtractionResult, mime_for_path};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (txt, csv, md or pdf)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show extraction confidence and strategy
    #[arg(long)]
    show_confidence: bool,

    #[command(flatten)]
    tuning: TuningArgs,
}

/// Per-request options shared by `extract` and `batch`.
#[derive(Args, Clone)]
pub struct TuningArgs {
    /// Stop once this many contacts were found
    #[arg(long)]
    max_contacts: Option<usize>,

    /// Processing time budget in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Role to look for on lines without a labeled role (repeatable)
    #[arg(long = "role")]
    roles: Vec<String>,

    /// Aggregate confidence needed to skip AI escalation
    #[arg(long)]
    threshold: Option<f32>,

    /// Never call the AI collaborator
    #[arg(long)]
    no_ai: bool,

    /// Drop contacts below the confidence threshold
    #[arg(long)]
    high_confidence: bool,

    /// Order contacts by completeness instead of document order
    #[arg(long)]
    sort_quality: bool,
}

impl TuningArgs {
    /// Fold the flags into the loaded configuration.
    pub fn apply(&self, config: &mut CallsheetConfig) {
        let options = &mut config.extraction;
        if let Some(max) = self.max_contacts {
            options.max_contacts = max;
        }
        if let Some(ms) = self.timeout_ms {
            options.max_processing_time_ms = ms;
        }
        if !self.roles.is_empty() {
            options.role_preferences = self.roles.clone();
        }
        if let Some(threshold) = self.threshold {
            options.confidence_threshold = threshold;
        }
        options.disable_ai |= self.no_ai;
        options.require_high_confidence |= self.high_confidence;
        options.sort_by_quality |= self.sort_quality;
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per contact
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Load the config file if one was given, then apply command-line tuning.
pub fn load_config(config_path: Option<&str>, tuning: &TuningArgs) -> anyhow::Result<CallsheetConfig> {
    let mut config = if let Some(path) = config_path {
        CallsheetConfig::from_file(Path::new(path))?
    } else {
        CallsheetConfig::default()
    };
    tuning.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Read a document and run extraction on it.
pub async fn extract_file(extractor: &ContactExtractor, path: &Path) -> anyhow::Result<ExtractionResult> {
    let Some(mime_type) = mime_for_path(path) else {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        anyhow::bail!("Unsupported file format: {}", extension);
    };

    let data = fs::read(path)?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    debug!("Read {} bytes as {}", data.len(), mime_type);

    Ok(extractor
        .extract_document(&data, mime_type, file_name, extractor.default_options())
        .await)
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path, &args.tuning)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Extracting contacts from {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Extracting contacts...");

    let extractor = ContactExtractor::from_config(&config);
    let result = extract_file(&extractor, &args.input).await;
    pb.finish_and_clear();
    let result = result?;

    if !result.success {
        anyhow::bail!(
            "Extraction failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} contacts written to {}",
            style("✓").green(),
            result.contacts.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        let metadata = &result.metadata;
        eprintln!();
        eprintln!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            metadata.confidence * 100.0
        );
        eprintln!(
            "{} Strategy: {:?}, processing time: {}ms",
            style("ℹ").blue(),
            metadata.strategy_used,
            metadata.processing_time_ms
        );
        if let Some(tokens) = metadata.tokens_used {
            eprintln!("{} AI tokens used: {}", style("ℹ").blue(), tokens);
        }
        for warning in &metadata.warnings {
            eprintln!("{} {}", style("!").yellow(), warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "name",
        "role",
        "email",
        "phone",
        "company",
        "section",
        "source",
        "confidence",
    ])?;

    for contact in &result.contacts {
        wtr.write_record([
            contact.name.as_str(),
            contact.role.as_str(),
            contact.email.as_deref().unwrap_or(""),
            contact.phone.as_deref().unwrap_or(""),
            contact.company.as_deref().unwrap_or(""),
            contact.section.map(|s| s.keyword()).unwrap_or(""),
            contact.source.as_str(),
            &format!("{:.3}", contact.confidence),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();
    let document = &result.metadata.document;

    output.push_str(&format!(
        "Document: {:?} ({:?})\n",
        document.document_type, document.production_type
    ));
    output.push_str(&format!("Contacts: {}\n", result.contacts.len()));

    for contact in &result.contacts {
        output.push('\n');
        output.push_str(&format!("{} - {}\n", contact.name, contact.role));
        if let Some(section) = contact.section {
            output.push_str(&format!("  Section: {}\n", section.keyword()));
        }
        if let Some(email) = &contact.email {
            output.push_str(&format!("  Email:   {}\n", email));
        }
        if let Some(phone) = &contact.phone {
            output.push_str(&format!("  Phone:   {}\n", phone));
        }
        if let Some(company) = &contact.company {
            output.push_str(&format!("  Company: {}\n", company));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsheet_core::{Contact, ExtractionMetadata, Section};

    fn sample() -> ExtractionResult {
        ExtractionResult {
            success: true,
            contacts: vec![Contact {
                name: "Jane Doe".to_string(),
                role: "DIRECTOR".to_string(),
                email: Some("jane@x.com".to_string()),
                phone: None,
                company: Some("Doe, Inc".to_string()),
                section: Some(Section::Production),
                source: "role_name_email".to_string(),
                confidence: 0.9,
            }],
            error: None,
            metadata: ExtractionMetadata::new(),
        }
    }

    #[test]
    fn test_csv_quotes_fields() {
        let csv = format_result(&sample(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("name,role,email,phone,company,section,source,confidence")
        );
        assert_eq!(
            lines.next(),
            Some("Jane Doe,DIRECTOR,jane@x.com,,\"Doe, Inc\",PRODUCTION,role_name_email,0.900")
        );
    }

    #[test]
    fn test_text_lists_contacts() {
        let text = format_result(&sample(), OutputFormat::Text).unwrap();
        assert!(text.contains("Contacts: 1"));
        assert!(text.contains("Jane Doe - DIRECTOR"));
        assert!(text.contains("Section: PRODUCTION"));
        assert!(!text.contains("Phone:"));
    }

    #[test]
    fn test_tuning_overrides_config() {
        let tuning = TuningArgs {
            max_contacts: Some(5),
            timeout_ms: None,
            roles: vec!["Gaffer".to_string()],
            threshold: Some(0.5),
            no_ai: true,
            high_confidence: false,
            sort_quality: true,
        };
        let config = load_config(None, &tuning).unwrap();
        assert_eq!(config.extraction.max_contacts, 5);
        assert_eq!(config.extraction.role_preferences, vec!["Gaffer".to_string()]);
        assert_eq!(config.extraction.confidence_threshold, 0.5);
        assert!(config.extraction.disable_ai);
        assert!(config.extraction.sort_by_quality);
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let tuning = TuningArgs {
            max_contacts: None,
            timeout_ms: None,
            roles: Vec::new(),
            threshold: Some(1.5),
            no_ai: false,
            high_confidence: false,
            sort_quality: false,
        };
        assert!(load_config(None, &tuning).is_err());
    }
}
