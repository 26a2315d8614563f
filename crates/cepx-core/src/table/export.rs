//! Triage and final exports.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::address::RecordSet;
use crate::error::{Result, TableError};
use crate::models::config::ExportConfig;
use crate::models::{AddressRecord, HouseNumber, PostalCode, Region};

/// Exported columns with their fixed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportColumn {
    Status,
    Id,
    OriginalAddress,
    Name,
    PostalCode,
    Street,
    HouseNumber,
    Complement,
    Neighborhood,
    City,
    State,
    Region,
    CareOf,
}

impl ExportColumn {
    /// Columns of the final arrangement.
    pub const FINAL: [ExportColumn; 12] = [
        ExportColumn::Id,
        ExportColumn::OriginalAddress,
        ExportColumn::Name,
        ExportColumn::PostalCode,
        ExportColumn::Street,
        ExportColumn::HouseNumber,
        ExportColumn::Complement,
        ExportColumn::Neighborhood,
        ExportColumn::City,
        ExportColumn::State,
        ExportColumn::Region,
        ExportColumn::CareOf,
    ];

    /// Columns of the triage arrangement: status first.
    pub const TRIAGE: [ExportColumn; 13] = [
        ExportColumn::Status,
        ExportColumn::Id,
        ExportColumn::OriginalAddress,
        ExportColumn::Name,
        ExportColumn::PostalCode,
        ExportColumn::Street,
        ExportColumn::HouseNumber,
        ExportColumn::Complement,
        ExportColumn::Neighborhood,
        ExportColumn::City,
        ExportColumn::State,
        ExportColumn::Region,
        ExportColumn::CareOf,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExportColumn::Status => "Status",
            ExportColumn::Id => "ID",
            ExportColumn::OriginalAddress => "Original Address",
            ExportColumn::Name => "Name",
            ExportColumn::PostalCode => "Postal Code",
            ExportColumn::Street => "Street",
            ExportColumn::HouseNumber => "House Number",
            ExportColumn::Complement => "Complement",
            ExportColumn::Neighborhood => "Neighborhood",
            ExportColumn::City => "City",
            ExportColumn::State => "State",
            ExportColumn::Region => "Region",
            ExportColumn::CareOf => "Care-of",
        }
    }

    /// Column for a header label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::TRIAGE
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Cell text for `record`.
    pub fn value(&self, record: &AddressRecord, format_postal_code: bool) -> String {
        match self {
            ExportColumn::Status => record.status.to_string(),
            ExportColumn::Id => record.id.to_string(),
            ExportColumn::OriginalAddress => record.original_address.clone(),
            ExportColumn::Name => record.name.clone(),
            ExportColumn::PostalCode => match &record.postal_code {
                Some(code) if format_postal_code => code.formatted(),
                Some(code) => code.as_str().to_string(),
                None => record.postal_code_text.clone().unwrap_or_default(),
            },
            ExportColumn::Street => record.street.clone(),
            ExportColumn::HouseNumber => record.house_number.to_string(),
            ExportColumn::Complement => record.complement.clone(),
            ExportColumn::Neighborhood => record.neighborhood.clone(),
            ExportColumn::City => record.city.clone(),
            ExportColumn::State => record.state.clone().unwrap_or_default(),
            ExportColumn::Region => match (record.region, &record.region_text) {
                (Some(region), _) => region.to_string(),
                (None, text) => text.clone().unwrap_or_default(),
            },
            ExportColumn::CareOf => record.care_of.clone(),
        }
    }

    /// Overwrite the field of `record` with a human-edited value.
    ///
    /// Values are taken as-is. A postal code or region that cannot be read
    /// is kept verbatim as text. Only the ID and status must parse.
    pub fn set(&self, record: &mut AddressRecord, value: &str) -> std::result::Result<(), TableError> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());

        match self {
            ExportColumn::Status => {
                record.status = value
                    .parse()
                    .map_err(|_| TableError::InvalidStatus(value.to_string()))?;
            }
            ExportColumn::Id => record.id = value.parse()?,
            ExportColumn::OriginalAddress => record.original_address = value.to_string(),
            ExportColumn::Name => record.name = value.to_string(),
            ExportColumn::PostalCode => {
                record.postal_code = PostalCode::parse(value);
                record.postal_code_text = match record.postal_code {
                    None if !value.is_empty() => {
                        debug!("{}: '{}' is not a CEP, kept as text", record.id, value);
                        optional()
                    }
                    _ => None,
                };
            }
            ExportColumn::Street => record.street = value.to_string(),
            ExportColumn::HouseNumber => record.house_number = HouseNumber::from(value),
            ExportColumn::Complement => record.complement = value.to_string(),
            ExportColumn::Neighborhood => record.neighborhood = value.to_string(),
            ExportColumn::City => record.city = value.to_string(),
            ExportColumn::State => record.state = optional(),
            ExportColumn::Region => {
                record.region = Region::from_name(value);
                record.region_text = match record.region {
                    None if !value.is_empty() => {
                        debug!("{}: unknown region '{}', kept as text", record.id, value);
                        optional()
                    }
                    _ => None,
                };
            }
            ExportColumn::CareOf => record.care_of = value.to_string(),
        }
        Ok(())
    }
}

impl fmt::Display for ExportColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Export file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Which arrangement to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    Triage,
    Final,
}

impl Arrangement {
    pub fn columns(&self) -> &'static [ExportColumn] {
        match self {
            Arrangement::Triage => &ExportColumn::TRIAGE,
            Arrangement::Final => &ExportColumn::FINAL,
        }
    }

    fn order<'a>(&self, set: &'a RecordSet) -> Vec<&'a AddressRecord> {
        match self {
            Arrangement::Triage => set.triage_order(),
            Arrangement::Final => set.final_order(),
        }
    }
}

/// Writes record sets in the triage and final arrangements.
#[derive(Debug, Clone, Default)]
pub struct TableWriter {
    config: ExportConfig,
}

impl TableWriter {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Write one arrangement as CSV.
    pub fn write_csv<W: Write>(
        &self,
        set: &RecordSet,
        arrangement: Arrangement,
        writer: W,
    ) -> std::result::Result<(), TableError> {
        let columns = arrangement.columns();
        let mut writer = csv::Writer::from_writer(writer);

        writer.write_record(columns.iter().map(|c| c.label()))?;
        for record in arrangement.order(set) {
            writer.write_record(
                columns
                    .iter()
                    .map(|c| c.value(record, self.config.format_postal_code)),
            )?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write one arrangement as a JSON array of records.
    pub fn write_json<W: Write>(&self, set: &RecordSet, arrangement: Arrangement, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &arrangement.order(set))?;
        Ok(())
    }

    /// Write one arrangement as a single-sheet workbook with a bold header row.
    ///
    /// Every cell is written as text so postal codes keep their leading zero.
    #[cfg(feature = "native")]
    pub fn write_xlsx(
        &self,
        set: &RecordSet,
        arrangement: Arrangement,
        path: &Path,
    ) -> std::result::Result<(), TableError> {
        use rust_xlsxwriter::{Format, Workbook, XlsxError};

        let spreadsheet = |e: XlsxError| TableError::Spreadsheet(format!("{}: {e}", path.display()));
        let sheet_name = match arrangement {
            Arrangement::Triage => &self.config.triage_sheet,
            Arrangement::Final => &self.config.final_sheet,
        };
        let columns = arrangement.columns();
        let header = Format::new().set_bold();

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name).map_err(spreadsheet)?;

        for (col, column) in columns.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, column.label(), &header)
                .map_err(spreadsheet)?;
        }
        for (row, record) in arrangement.order(set).into_iter().enumerate() {
            for (col, column) in columns.iter().enumerate() {
                let value = column.value(record, self.config.format_postal_code);
                if !value.is_empty() {
                    sheet
                        .write_string(row as u32 + 1, col as u16, value)
                        .map_err(spreadsheet)?;
                }
            }
        }

        workbook.save(path).map_err(spreadsheet)?;
        Ok(())
    }

    #[cfg(not(feature = "native"))]
    pub fn write_xlsx(
        &self,
        _set: &RecordSet,
        _arrangement: Arrangement,
        path: &Path,
    ) -> std::result::Result<(), TableError> {
        Err(TableError::UnsupportedFormat(path.display().to_string()))
    }

    /// Write one arrangement to `path`.
    pub fn write_file(
        &self,
        set: &RecordSet,
        arrangement: Arrangement,
        format: ExportFormat,
        path: &Path,
    ) -> Result<()> {
        match format {
            ExportFormat::Csv => {
                let mut writer = BufWriter::new(File::create(path)?);
                self.write_csv(set, arrangement, &mut writer)?;
                writer.flush()?;
            }
            ExportFormat::Json => {
                let mut writer = BufWriter::new(File::create(path)?);
                self.write_json(set, arrangement, &mut writer)?;
                writer.flush()?;
            }
            ExportFormat::Xlsx => self.write_xlsx(set, arrangement, path)?,
        }
        info!("Wrote {:?} arrangement to {}", arrangement, path.display());
        Ok(())
    }

    /// Output path for `stem` in `dir`.
    pub fn output_path(&self, dir: &Path, stem: &str, arrangement: Arrangement, format: ExportFormat) -> PathBuf {
        let suffix = match arrangement {
            Arrangement::Triage => &self.config.triage_suffix,
            Arrangement::Final => &self.config.final_suffix,
        };
        dir.join(format!("{stem}{suffix}.{}", format.extension()))
    }

    /// Write both arrangements; returns the triage and final paths.
    pub fn write_both(
        &self,
        set: &RecordSet,
        dir: &Path,
        stem: &str,
        format: ExportFormat,
    ) -> Result<(PathBuf, PathBuf)> {
        let triage = self.output_path(dir, stem, Arrangement::Triage, format);
        let final_path = self.output_path(dir, stem, Arrangement::Final, format);
        self.write_file(set, Arrangement::Triage, format, &triage)?;
        self.write_file(set, Arrangement::Final, format, &final_path)?;
        Ok((triage, final_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressParser, AddressProcessor};
    use crate::table::{ColumnMapping, RawAddressRow};
    use pretty_assertions::assert_eq;

    fn sample() -> RecordSet {
        let rows: Vec<RawAddressRow> = ["Rua A, 10 - 01310-100", "Rua B 2", "Av. C S/N 80010000"]
            .iter()
            .map(|a| RawAddressRow::from_pairs([("Endereço", *a)]))
            .collect();
        AddressProcessor::new().process(&rows, &ColumnMapping::address("Endereço"))
    }

    fn csv_lines(set: &RecordSet, arrangement: Arrangement, config: ExportConfig) -> Vec<String> {
        let mut out = Vec::new();
        TableWriter::new(config).write_csv(set, arrangement, &mut out).unwrap();
        String::from_utf8(out).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_final_arrangement() {
        let lines = csv_lines(&sample(), Arrangement::Final, ExportConfig::default());
        assert_eq!(
            lines[0],
            "ID,Original Address,Name,Postal Code,Street,House Number,Complement,Neighborhood,City,State,Region,Care-of"
        );
        assert!(lines[1].starts_with("ID_1,\"Rua A, 10 - 01310-100\",,01310-100,Rua A,10,"));
        assert!(lines[2].starts_with("ID_2,"));
        assert!(lines[3].starts_with("ID_3,"));
    }

    #[test]
    fn test_triage_arrangement() {
        let lines = csv_lines(&sample(), Arrangement::Triage, ExportConfig::default());
        assert!(lines[0].starts_with("Status,ID,"));
        assert!(lines[1].starts_with("CEP?,ID_2,"));
        assert!(lines[2].starts_with("S/N,ID_3,"));
        assert!(lines[3].starts_with("OK,ID_1,"));
    }

    #[test]
    fn test_bare_postal_code_option() {
        let config = ExportConfig {
            format_postal_code: false,
            ..ExportConfig::default()
        };
        let lines = csv_lines(&sample(), Arrangement::Final, config);
        assert!(lines[1].contains(",01310100,"));
    }

    #[test]
    fn test_write_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TableWriter::default();
        let (triage, final_path) = writer
            .write_both(&sample(), dir.path(), "clubes", ExportFormat::Json)
            .unwrap();

        assert_eq!(triage.file_name().unwrap(), "clubes_triage.json");
        assert_eq!(final_path.file_name().unwrap(), "clubes_final.json");

        let records: Vec<AddressRecord> =
            serde_json::from_str(&std::fs::read_to_string(&final_path).unwrap()).unwrap();
        let ids: Vec<usize> = records.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_xlsx_sheets_read_back() {
        use calamine::{open_workbook_auto, Reader};

        let dir = tempfile::tempdir().unwrap();
        let (triage, final_path) = TableWriter::default()
            .write_both(&sample(), dir.path(), "clubes", ExportFormat::Xlsx)
            .unwrap();
        assert_eq!(final_path.file_name().unwrap(), "clubes_final.xlsx");

        let cells = |path: &Path, sheet: &str| -> Vec<Vec<String>> {
            let mut workbook = open_workbook_auto(path).unwrap();
            assert_eq!(workbook.sheet_names(), vec![sheet.to_string()]);
            workbook
                .worksheet_range(sheet)
                .unwrap()
                .rows()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect()
        };

        let final_rows = cells(final_path.as_path(), "Envio");
        assert_eq!(final_rows.len(), 4);
        assert_eq!(final_rows[0][0], "ID");
        assert_eq!(final_rows[0][3], "Postal Code");
        assert_eq!(final_rows[1][0], "ID_1");
        assert_eq!(final_rows[1][3], "01310-100");
        assert_eq!(final_rows[1][4], "Rua A");
        assert_eq!(final_rows[3][0], "ID_3");

        let triage_rows = cells(triage.as_path(), "Triagem");
        assert_eq!(triage_rows[0][0], "Status");
        assert_eq!(triage_rows[1][0], "CEP?");
        assert_eq!(triage_rows[1][1], "ID_2");
        assert_eq!(triage_rows[3][0], "OK");
        assert_eq!(triage_rows[3][1], "ID_1");
    }

    #[test]
    fn test_labels_round_trip() {
        for column in ExportColumn::TRIAGE {
            assert_eq!(ExportColumn::from_label(column.label()), Some(column));
        }
        assert_eq!(ExportColumn::from_label(" postal code "), Some(ExportColumn::PostalCode));
        assert_eq!(ExportColumn::from_label("Telefone"), None);
    }
}
