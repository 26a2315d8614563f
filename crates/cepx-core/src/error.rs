//! Error types for the cepx-core library.
//!
//! Row-level extraction never fails: every extractor has a "not found" value.
//! The errors here cover whole-table problems (unreadable file, bad column
//! mapping) and configuration.

use thiserror::Error;

/// Main error type for the cepx library.
#[derive(Error, Debug)]
pub enum CepxError {
    /// Table loading or mapping error.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to reading, mapping and writing address tables.
#[derive(Error, Debug)]
pub enum TableError {
    /// The file extension is not a supported table format.
    #[error("unsupported table format: {0}")]
    UnsupportedFormat(String),

    /// Failed to open the table file.
    #[error("failed to open table: {0}")]
    Open(String),

    /// The workbook has no readable worksheet.
    #[error("no worksheet found: {0}")]
    NoWorksheet(String),

    /// The table has no header row.
    #[error("table is empty")]
    Empty,

    /// CSV parsing or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet parsing failed.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// A mapped column does not exist in the table.
    #[error("column '{column}' mapped to {role} not found in table")]
    UnknownColumn { role: String, column: String },

    /// No column was chosen for the address text.
    #[error("no address column mapped")]
    MissingAddressColumn,

    /// A required column is missing from an edited file.
    #[error("required column '{0}' not found")]
    MissingColumn(String),

    /// A status cell could not be parsed.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// A record identifier could not be parsed.
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),
}

/// Result type for the cepx library.
pub type Result<T> = std::result::Result<T, CepxError>;
