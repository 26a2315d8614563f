//! Parse command - decompose a single address, for tuning the rules.

use clap::Args;

use cepx_core::{AddressParser, AddressProcessor, ParsedAddress};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Address text
    #[arg(required = true)]
    text: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ParseFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ParseFormat {
    /// JSON output
    Json,
    /// Plain text listing
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let processor = AddressProcessor::from_config(&config.extraction)?;
    let parsed = processor.parse_address(&args.text);

    match args.format {
        ParseFormat::Json => println!("{}", serde_json::to_string_pretty(&parsed)?),
        ParseFormat::Text => print!("{}", format_parsed_text(&args.text, &parsed)),
    }

    Ok(())
}

fn format_parsed_text(input: &str, parsed: &ParsedAddress) -> String {
    let mut output = String::new();
    let strategy = |name: &Option<String>| {
        name.as_deref()
            .map(|s| format!("  ({s})"))
            .unwrap_or_default()
    };

    output.push_str(&format!("Input:        {}\n", input));
    output.push_str(&format!("Status:       {}\n", parsed.status));
    output.push_str(&format!(
        "Postal Code:  {}{}\n",
        parsed.postal_code.as_ref().map(|c| c.formatted()).unwrap_or_default(),
        strategy(&parsed.audit.postal_code)
    ));
    output.push_str(&format!(
        "House Number: {}{}\n",
        parsed.house_number,
        strategy(&parsed.audit.house_number)
    ));
    output.push_str(&format!("Street:       {}\n", parsed.street));
    output.push_str(&format!("Complement:   {}\n", parsed.complement));
    output.push_str(&format!("Neighborhood: {}\n", parsed.geography.neighborhood));
    output.push_str(&format!("City:         {}\n", parsed.geography.city));
    output.push_str(&format!(
        "State:        {}\n",
        parsed.geography.state.as_deref().unwrap_or_default()
    ));
    output.push_str(&format!(
        "Region:       {}\n",
        parsed.geography.region.map(|r| r.to_string()).unwrap_or_default()
    ));

    output
}
