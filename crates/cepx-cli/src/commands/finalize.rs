//! Finalize command - write an edited triage/final CSV in final order.

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use cepx_core::models::config::ExportConfig;
use cepx_core::table::read_edited_records;
use cepx_core::{Arrangement, ExportFormat, TableWriter};

use super::process::parent_dir;

/// Arguments for the finalize command.
#[derive(Args)]
pub struct FinalizeArgs {
    /// Edited triage or final CSV
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: `<stem>_final.csv` next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: FinalizeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let set = read_edited_records(&args.input)?;
    info!("Finalizing {} records", set.len());

    let output = args
        .output
        .unwrap_or_else(|| default_output(&args.input, &config.export));

    TableWriter::new(config.export.clone()).write_file(
        &set,
        Arrangement::Final,
        ExportFormat::Csv,
        &output,
    )?;

    println!(
        "{} {} records written in final order to {}",
        style("✓").green(),
        set.len(),
        output.display()
    );

    Ok(())
}

/// `data_triage.csv` becomes `data_final.csv`; other names just gain the suffix.
fn default_output(input: &Path, export: &ExportConfig) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("addresses");
    let base = stem
        .strip_suffix(export.triage_suffix.as_str())
        .or_else(|| stem.strip_suffix(export.final_suffix.as_str()))
        .unwrap_or(stem);

    TableWriter::new(export.clone()).output_path(
        &parent_dir(input),
        base,
        Arrangement::Final,
        ExportFormat::Csv,
    )
}
