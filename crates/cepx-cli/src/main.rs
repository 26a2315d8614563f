//! CLI application for sanitizing Brazilian address spreadsheets.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, finalize, parse, process};

/// cepx - Split free-text Brazilian addresses into CEP, number, street and geography
#[derive(Parser)]
#[command(name = "cepx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single address table
    Process(process::ProcessArgs),

    /// Process multiple address tables
    Batch(batch::BatchArgs),

    /// Parse a single address and show every extracted field
    Parse(parse::ParseArgs),

    /// Write an edited triage/final CSV back in final order
    Finalize(finalize::FinalizeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Process(args) => process::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Parse(args) => parse::run(args, config_path).await,
        Commands::Finalize(args) => finalize::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
