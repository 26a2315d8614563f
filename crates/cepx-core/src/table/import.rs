//! Re-import of exported files after human editing.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use super::ExportColumn;
use crate::address::RecordSet;
use crate::error::TableError;
use crate::models::{AddressRecord, RecordId};

/// Read an edited triage or final CSV back into records.
///
/// Columns are matched by label in any order; unknown columns are ignored.
/// The ID column is required and every ID must parse and be unique.
pub fn read_edited_csv<R: Read>(reader: R) -> Result<RecordSet, TableError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<Option<ExportColumn>> = reader
        .headers()?
        .iter()
        .map(|h| ExportColumn::from_label(h.trim_start_matches('\u{feff}')))
        .collect();

    let id_index = columns
        .iter()
        .position(|c| *c == Some(ExportColumn::Id))
        .ok_or_else(|| TableError::MissingColumn(ExportColumn::Id.label().to_string()))?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let id: RecordId = row.get(id_index).unwrap_or_default().parse()?;
        if !seen.insert(id) {
            return Err(TableError::InvalidRecordId(format!("duplicate {id}")));
        }

        let mut record = AddressRecord::new(id);
        for (column, value) in columns.iter().zip(row.iter()) {
            if let Some(column) = column {
                column.set(&mut record, value)?;
            }
        }
        debug!("re-imported {}", record.id);
        records.push(record);
    }

    Ok(RecordSet::new(records))
}

/// Read an edited CSV file.
pub fn read_edited_records(path: &Path) -> Result<RecordSet, TableError> {
    let file = std::fs::File::open(path)
        .map_err(|e| TableError::Open(format!("{}: {}", path.display(), e)))?;
    let set = read_edited_csv(file)?;
    info!("Re-imported {} records from {}", set.len(), path.display());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressParser, AddressProcessor};
    use crate::models::{HouseNumber, Region};
    use crate::table::{Arrangement, ColumnMapping, RawAddressRow, TableWriter};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_triage_export_reimports_in_final_order() {
        let rows: Vec<RawAddressRow> = ["Rua A 1 01310-100", "Rua B 2", "sem número"]
            .iter()
            .map(|a| RawAddressRow::from_pairs([("End", *a)]))
            .collect();
        let set = AddressProcessor::new().process(&rows, &ColumnMapping::address("End"));

        let mut triage = Vec::new();
        TableWriter::default()
            .write_csv(&set, Arrangement::Triage, &mut triage)
            .unwrap();

        let reimported = read_edited_csv(triage.as_slice()).unwrap();
        let ids: Vec<usize> = reimported.final_order().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(reimported.get(RecordId(2)).unwrap().status.to_string(), "CEP?");
        assert_eq!(
            reimported.get(RecordId(1)).unwrap().postal_code,
            set.get(RecordId(1)).unwrap().postal_code
        );
    }

    #[test]
    fn test_human_edits_are_taken_as_is() {
        let data = "ID,Status,House Number,City,Region,Telefone\n\
                    ID_2,CEP?,S/N,Recife,Nordeste,5555\n\
                    ID_1,OK,12A,,,\n";
        let set = read_edited_csv(data.as_bytes()).unwrap();

        let first = set.get(RecordId(1)).unwrap();
        assert_eq!(first.house_number, HouseNumber::Number("12A".to_string()));
        assert!(first.status.is_ok());
        assert_eq!(first.state, None);

        let second = set.get(RecordId(2)).unwrap();
        assert_eq!(second.house_number, HouseNumber::NoNumber);
        assert_eq!(second.city, "Recife");
        assert_eq!(second.region, Some(Region::Northeast));
    }

    #[test]
    fn test_unreadable_postal_code_and_region_kept_verbatim() {
        let data = "ID,Postal Code,Region\nID_1,0131010,Sudeste/Sul\nID_2,01310-100,Sudeste\n";
        let set = read_edited_csv(data.as_bytes()).unwrap();

        let first = set.get(RecordId(1)).unwrap();
        assert_eq!(first.postal_code, None);
        assert_eq!(first.postal_code_text.as_deref(), Some("0131010"));
        assert_eq!(first.region, None);
        assert_eq!(first.region_text.as_deref(), Some("Sudeste/Sul"));

        let second = set.get(RecordId(2)).unwrap();
        assert_eq!(second.postal_code_text, None);
        assert_eq!(second.region, Some(Region::Southeast));
        assert_eq!(second.region_text, None);

        let mut out = Vec::new();
        TableWriter::default()
            .write_csv(&set, Arrangement::Final, &mut out)
            .unwrap();
        let lines: Vec<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(lines[1], "ID_1,,,0131010,,,,,,,Sudeste/Sul,");
        assert_eq!(lines[2], "ID_2,,,01310-100,,,,,,,Southeast,");
    }

    #[test]
    fn test_malformed_id_fails_whole_file() {
        let data = "ID,City\nID_1,Recife\nlinha 2,Natal\n";
        assert!(matches!(
            read_edited_csv(data.as_bytes()),
            Err(TableError::InvalidRecordId(_))
        ));
    }

    #[test]
    fn test_duplicate_id_fails() {
        let data = "ID\nID_1\nID_1\n";
        assert!(read_edited_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_id_column() {
        let data = "City\nRecife\n";
        assert!(matches!(
            read_edited_csv(data.as_bytes()),
            Err(TableError::MissingColumn(_))
        ));
    }
}
