//! Process command - sanitize the address column of one table.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use cepx_core::models::config::{CepxConfig, ColumnHints};
use cepx_core::{AddressProcessor, ColumnMapping, ColumnRole, ExportFormat, Summary, TableReader, TableWriter};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input table (CSV, TSV, XLSX, XLS or ODS)
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory (default: next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Worksheet to read (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    #[command(flatten)]
    columns: ColumnArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV with the fixed column labels
    Csv,
    /// JSON array of records
    Json,
    /// Excel workbook, one sheet per arrangement
    Xlsx,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Xlsx => ExportFormat::Xlsx,
        }
    }
}

/// Column mapping overrides. Unset roles are guessed from the headers.
#[derive(Args, Clone, Default)]
pub struct ColumnArgs {
    /// Column holding the free-text address
    #[arg(long)]
    address_column: Option<String>,

    /// Column holding the recipient name
    #[arg(long)]
    name_column: Option<String>,

    /// Column holding the city
    #[arg(long)]
    city_column: Option<String>,

    /// Column holding the state code
    #[arg(long)]
    state_column: Option<String>,

    /// Column holding the region
    #[arg(long)]
    region_column: Option<String>,

    /// Column holding the neighborhood
    #[arg(long)]
    neighborhood_column: Option<String>,

    /// Column holding the care-of (aos cuidados) name
    #[arg(long)]
    care_of_column: Option<String>,
}

impl ColumnArgs {
    /// Explicit columns first, header guesses for the rest.
    pub fn resolve(&self, headers: &[String], hints: &ColumnHints) -> ColumnMapping {
        let explicit = [
            (ColumnRole::Address, &self.address_column),
            (ColumnRole::Name, &self.name_column),
            (ColumnRole::City, &self.city_column),
            (ColumnRole::State, &self.state_column),
            (ColumnRole::Region, &self.region_column),
            (ColumnRole::Neighborhood, &self.neighborhood_column),
            (ColumnRole::CareOf, &self.care_of_column),
        ];

        let mut mapping = ColumnMapping::new();
        for (role, column) in explicit {
            if let Some(column) = column {
                mapping.set(role, column.clone());
            }
        }

        mapping.or(&ColumnMapping::guess(headers, hints))
    }
}

/// Outcome of processing one table.
pub struct FileOutcome {
    pub summary: Summary,
    pub triage_path: PathBuf,
    pub final_path: PathBuf,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows {msg}")?
            .progress_chars("##-"),
    );

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => parent_dir(&args.input),
    };

    let outcome = process_file(
        &args.input,
        &output_dir,
        args.format.into(),
        args.sheet.clone(),
        &args.columns,
        &config,
        Some(&pb),
    )?;

    pb.finish_with_message("Done");

    print_summary(&outcome.summary);
    println!(
        "{} Triage output written to {}",
        style("✓").green(),
        outcome.triage_path.display()
    );
    println!(
        "{} Final output written to {}",
        style("✓").green(),
        outcome.final_path.display()
    );

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Read, process and export one table.
pub fn process_file(
    input: &Path,
    output_dir: &Path,
    format: ExportFormat,
    sheet: Option<String>,
    columns: &ColumnArgs,
    config: &CepxConfig,
    pb: Option<&ProgressBar>,
) -> anyhow::Result<FileOutcome> {
    let table = TableReader::new(config.table.clone())
        .with_sheet(sheet)
        .read(input)?;

    let mapping = columns.resolve(&table.headers, &config.columns);
    mapping.validate(&table.headers)?;
    for (role, column) in mapping.iter() {
        debug!("Column {} -> '{}'", role, column);
    }

    let processor = AddressProcessor::from_config(&config.extraction)?;
    if let Some(pb) = pb {
        pb.set_length(table.len() as u64);
    }
    let set = processor.process_with_progress(&table.rows, &mapping, |done| {
        if let Some(pb) = pb {
            pb.set_position(done as u64);
        }
    });

    fs::create_dir_all(output_dir)?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("addresses");

    let (triage_path, final_path) =
        TableWriter::new(config.export.clone()).write_both(&set, output_dir, stem, format)?;

    Ok(FileOutcome {
        summary: set.summary(),
        triage_path,
        final_path,
    })
}

pub fn print_summary(summary: &Summary) {
    println!(
        "{} {} rows processed: {} OK, {} need review",
        style("ℹ").blue(),
        summary.total,
        summary.ok,
        summary.flagged()
    );
    if summary.flagged() > 0 {
        println!(
            "{} {} without CEP, {} without number, {} marked S/N",
            style("⚠").yellow(),
            summary.missing_postal_code,
            summary.missing_house_number,
            summary.no_number
        );
    }
}

/// Directory of `path`, `.` for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
