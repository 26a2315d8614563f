//! Table loading from CSV and spreadsheet files.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use super::{FieldValue, Table};
use crate::error::TableError;
use crate::models::config::TableConfig;

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl TableFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => Ok(TableFormat::Csv),
            "tsv" | "tab" => Ok(TableFormat::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(TableFormat::Spreadsheet),
            _ => Err(TableError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads a table whose first row is the header.
#[derive(Debug, Clone, Default)]
pub struct TableReader {
    config: TableConfig,
}

impl TableReader {
    pub fn new(config: TableConfig) -> Self {
        Self { config }
    }

    /// Read worksheet `sheet` instead of the configured one.
    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        if sheet.is_some() {
            self.config.sheet = sheet;
        }
        self
    }

    /// Load a table from a file, choosing the parser by extension.
    pub fn read(&self, path: &Path) -> Result<Table, TableError> {
        let format = TableFormat::from_path(path)?;
        info!("Reading {:?} table from {}", format, path.display());

        let table = match format {
            TableFormat::Csv | TableFormat::Tsv => {
                let file = std::fs::File::open(path)
                    .map_err(|e| TableError::Open(format!("{}: {}", path.display(), e)))?;
                let delimiter = if format == TableFormat::Tsv {
                    b'\t'
                } else {
                    self.delimiter()?
                };
                self.read_csv_with(file, delimiter)?
            }
            TableFormat::Spreadsheet => self.read_spreadsheet(path)?,
        };

        debug!("Loaded {} rows, headers: {:?}", table.len(), table.headers);
        Ok(table)
    }

    /// Load CSV from any reader using the configured delimiter.
    pub fn read_csv<R: Read>(&self, reader: R) -> Result<Table, TableError> {
        self.read_csv_with(reader, self.delimiter()?)
    }

    fn delimiter(&self) -> Result<u8, TableError> {
        u8::try_from(self.config.delimiter)
            .map_err(|_| TableError::Open(format!("delimiter '{}' is not a single byte", self.config.delimiter)))
    }

    fn read_csv_with<R: Read>(&self, reader: R, delimiter: u8) -> Result<Table, TableError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.config.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim_start_matches('\u{feff}').to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TableError::Empty);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(FieldValue::from).collect());
        }

        Ok(Table::from_cells(headers, rows))
    }

    #[cfg(feature = "native")]
    fn read_spreadsheet(&self, path: &Path) -> Result<Table, TableError> {
        use calamine::{open_workbook_auto, Data, Reader};

        let mut workbook = open_workbook_auto(path)
            .map_err(|e| TableError::Open(format!("{}: {}", path.display(), e)))?;

        let sheet = match &self.config.sheet {
            Some(name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| TableError::NoWorksheet(path.display().to_string()))?,
        };

        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| TableError::Spreadsheet(format!("{sheet}: {e}")))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or(TableError::Empty)?
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows = rows
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Data::Empty => FieldValue::Empty,
                        Data::String(s) if s.trim().is_empty() => FieldValue::Empty,
                        Data::String(s) => FieldValue::Text(s.clone()),
                        other => FieldValue::Other(other.to_string()),
                    })
                    .collect()
            })
            .collect();

        Ok(Table::from_cells(headers, rows))
    }

    #[cfg(not(feature = "native"))]
    fn read_spreadsheet(&self, path: &Path) -> Result<Table, TableError> {
        Err(TableError::UnsupportedFormat(path.display().to_string()))
    }
}
