//! Batch processing command for multiple address tables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use cepx_core::{Summary, TableFormat};

use super::process::{parent_dir, print_summary, process_file, ColumnArgs, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    columns: ColumnArgs,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    summary: Option<Summary>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| TableFormat::from_path(p).is_ok())
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

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| parent_dir(&path));

        let result = process_file(
            &path,
            &output_dir,
            args.format.into(),
            None,
            &args.columns,
            &config,
            None,
        );
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(outcome) => results.push(ProcessResult {
                path,
                summary: Some(outcome.summary),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        summary: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let total = results
        .iter()
        .filter_map(|r| r.summary)
        .fold(Summary::default(), |acc, s| Summary {
            total: acc.total + s.total,
            ok: acc.ok + s.ok,
            missing_postal_code: acc.missing_postal_code + s.missing_postal_code,
            missing_house_number: acc.missing_house_number + s.missing_house_number,
            no_number: acc.no_number + s.no_number,
        });
    let failed = results.iter().filter(|r| r.error.is_some()).count();

    println!();
    println!(
        "{} Processed {} files successfully",
        style("✓").green(),
        results.len() - failed
    );
    if failed > 0 {
        println!("{} {} files failed", style("✗").red(), failed);
        for result in results.iter().filter(|r| r.error.is_some()) {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("")
            );
        }
    }
    print_summary(&total);

    if args.summary {
        let summary_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let summary_path = summary_dir.join("batch_summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!(
        "{} Total time: {:.2}s",
        style("ℹ").blue(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "rows",
        "ok",
        "missing_postal_code",
        "missing_house_number",
        "no_number",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.summary {
            Some(summary) => wtr.write_record([
                filename,
                "success",
                &summary.total.to_string(),
                &summary.ok.to_string(),
                &summary.missing_postal_code.to_string(),
                &summary.missing_house_number.to_string(),
                &summary.no_number.to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
