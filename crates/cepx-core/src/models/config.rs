//! Configuration structures for the sanitizing pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for cepx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CepxConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Table loading configuration.
    pub table: TableConfig,

    /// Export configuration.
    pub export: ExportConfig,

    /// Header keywords used to guess the column mapping.
    pub columns: ColumnHints,
}

/// Address field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Complement markers (apartment, block, lot...) whose following number
    /// is never a house number. Matched case-insensitively, optional trailing dot.
    pub complement_keywords: Vec<String>,

    /// Words scrubbed from the street text, with an optional trailing `:` or `.`.
    pub noise_words: Vec<String>,

    /// Longest digit run accepted as a house number.
    pub max_house_number_digits: usize,

    /// Digit runs at least this long are discarded before the house number
    /// search (phones, document numbers, postal codes).
    pub long_digit_run: usize,

    /// Accept a bare 7-digit run as a postal code that lost its leading zero.
    pub assume_leading_zero: bool,
}

/// Default complement vocabulary.
pub const COMPLEMENT_KEYWORDS: &[&str] = &[
    "APARTAMENTO", "APTO", "APT", "AP",
    "LOTE", "LT",
    "CASA", "CS",
    "BLOCO", "BL",
    "SALA", "SL",
    "CONJUNTO", "CJ",
    "UNIDADE", "UN",
    "FUNDOS", "FRENTE",
    "QUADRA", "QD", "Q",
    "BOX", "GARAGEM",
    "KM",
];

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            complement_keywords: COMPLEMENT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            noise_words: vec!["CEP".to_string()],
            max_house_number_digits: 6,
            long_digit_run: 7,
            assume_leading_zero: true,
        }
    }
}

/// Table loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// CSV field delimiter.
    pub delimiter: char,

    /// Worksheet to read from spreadsheets (first sheet when unset).
    pub sheet: Option<String>,

    /// Trim whitespace around CSV fields.
    pub trim: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            sheet: None,
            trim: true,
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write postal codes as `NNNNN-NNN`.
    pub format_postal_code: bool,

    /// File name suffix of the triage arrangement.
    pub triage_suffix: String,

    /// File name suffix of the final arrangement.
    pub final_suffix: String,

    /// Worksheet name of the triage arrangement in XLSX output.
    pub triage_sheet: String,

    /// Worksheet name of the final arrangement in XLSX output.
    pub final_sheet: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format_postal_code: true,
            triage_suffix: "_triage".to_string(),
            final_suffix: "_final".to_string(),
            triage_sheet: "Triagem".to_string(),
            final_sheet: "Envio".to_string(),
        }
    }
}

/// Lower-case header keywords per column role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnHints {
    pub address: Vec<String>,
    pub name: Vec<String>,
    pub city: Vec<String>,
    pub state: Vec<String>,
    pub region: Vec<String>,
    pub neighborhood: Vec<String>,
    pub care_of: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnHints {
    fn default() -> Self {
        Self {
            address: words(&["endereço", "endereco", "address"]),
            name: words(&["nome", "clube", "loja", "name"]),
            city: words(&["cidade", "city"]),
            state: words(&["uf", "estado", "state"]),
            region: words(&["regiao", "região", "region"]),
            neighborhood: words(&["bairro", "neighborhood"]),
            care_of: words(&["aos cuidados", "a/c", "care of", "care-of"]),
        }
    }
}

impl CepxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
