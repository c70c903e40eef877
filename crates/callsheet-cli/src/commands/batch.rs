//! Batch command - extract contacts from many call sheets with one shared
//! extractor and AI budget.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use callsheet_core::{ContactExtractor, ExtractionResult, mime_for_path};

use super::extract::{OutputFormat, TuningArgs, extract_file, format_result, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    tuning: TuningArgs,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path, &args.tuning)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| mime_for_path(p).is_some())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Arc::new(ContactExtractor::from_config(&config));
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let extractor = Arc::clone(&extractor);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let file_start = Instant::now();
            let outcome = extract_file(&extractor, &path).await;
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            let file_result = match outcome {
                Ok(result) if result.success => FileResult {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                },
                Ok(result) => FileResult {
                    path,
                    error: result.error.clone(),
                    result: Some(result),
                    processing_time_ms,
                },
                Err(e) => FileResult {
                    path,
                    result: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            };
            (index, file_result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, file_result) = joined?;
        overall_pb.inc(1);

        if let Some(error_msg) = &file_result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", file_result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", file_result.path.display(), error_msg);
                tasks.abort_all();
                overall_pb.abandon();
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }
        results.push((index, file_result));
    }

    overall_pb.finish_with_message("Complete");
    results.sort_by_key(|(index, _)| *index);
    let results: Vec<FileResult> = results.into_iter().map(|(_, r)| r).collect();

    let successful: Vec<_> = results.iter().filter(|r| r.error.is_none()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for file_result in &successful {
            let Some(result) = &file_result.result else {
                continue;
            };
            let output_name = file_result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_result(result, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let contact_count: usize = successful
        .iter()
        .filter_map(|r| r.result.as_ref())
        .map(|r| r.contacts.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} contacts",
        style(successful.len()).green(),
        style(failed.len()).red(),
        contact_count
    );

    let budget = extractor.budget();
    if budget.calls_used() > 0 {
        println!(
            "   AI: {} calls, {} tokens",
            budget.calls_used(),
            budget.tokens_used()
        );
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for file_result in &failed {
            println!(
                "  - {}: {}",
                file_result.path.display(),
                file_result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "contacts",
        "confidence",
        "strategy",
        "ai_used",
        "tokens_used",
        "processing_time_ms",
        "error",
    ])?;

    for file_result in results {
        let filename = file_result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let status = if file_result.error.is_none() { "success" } else { "failed" };
        let error = file_result.error.as_deref().unwrap_or("");
        let time = file_result.processing_time_ms.to_string();

        match &file_result.result {
            Some(result) => {
                let metadata = &result.metadata;
                wtr.write_record([
                    filename,
                    status,
                    &result.contacts.len().to_string(),
                    &format!("{:.3}", metadata.confidence),
                    &format!("{:?}", metadata.strategy_used),
                    &metadata.ai_used.to_string(),
                    &metadata.tokens_used.unwrap_or(0).to_string(),
                    &time,
                    error,
                ])?;
            }
            None => {
                wtr.write_record([filename, status, "0", "", "", "false", "0", &time, error])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
