//! Row orchestrator: runs the extractors per row, derives the status and
//! keeps both output orderings available.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::normalize::normalize;
use super::rules::{
    classify_region, FieldExtractor, GeographyExtractor, HouseNumberExtractor,
    PostalCodeExtractor, StreetCleaner,
};
use super::rules::postal_code::BARE_SEVEN;
use super::AddressParser;
use crate::error::{Result, TableError};
use crate::models::config::ExtractionConfig;
use crate::models::{
    AddressRecord, ExtractionAudit, Geography, HouseNumber, PostalCode, RecordId, Region, Status,
    StatusFlag,
};
use crate::table::{ColumnMapping, ColumnRole, ExportColumn, FieldValue, RawAddressRow, Table};

/// Fields decomposed from a single address text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<PostalCode>,
    pub house_number: HouseNumber,
    pub street: String,
    pub complement: String,
    pub geography: Geography,
    pub status: Status,
    pub audit: ExtractionAudit,
}

/// Derive the row status from the two extracted fields.
///
/// `MissingHouseNumber` and `NoNumberMarker` are mutually exclusive.
pub fn generate_status(postal_code: Option<&PostalCode>, house_number: &HouseNumber) -> Status {
    let mut flags = Vec::new();
    if postal_code.is_none() {
        flags.push(StatusFlag::MissingPostalCode);
    }
    match house_number {
        HouseNumber::Missing => flags.push(StatusFlag::MissingHouseNumber),
        HouseNumber::NoNumber => flags.push(StatusFlag::NoNumberMarker),
        HouseNumber::Number(_) => {}
    }
    Status::from_flags(flags)
}

/// The full address pipeline.
pub struct AddressProcessor {
    postal_code: PostalCodeExtractor,
    house_number: HouseNumberExtractor,
    geography: GeographyExtractor,
    street: StreetCleaner,
}

impl AddressProcessor {
    /// Create a processor with the default vocabulary.
    pub fn new() -> Self {
        Self {
            postal_code: PostalCodeExtractor::new(),
            house_number: HouseNumberExtractor::new(),
            geography: GeographyExtractor::new(),
            street: StreetCleaner::new(),
        }
    }

    /// Create a processor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            postal_code: PostalCodeExtractor::from_config(config),
            house_number: HouseNumberExtractor::from_config(config)?,
            geography: GeographyExtractor::new(),
            street: StreetCleaner::from_config(config)?,
        })
    }

    /// Process one row into a record with the given id.
    pub fn process_row(&self, id: RecordId, row: &RawAddressRow, mapping: &ColumnMapping) -> AddressRecord {
        let mut record = AddressRecord::new(id);

        let text = match mapping.get(ColumnRole::Address).map(|column| row.get(column)) {
            Some(FieldValue::Text(text)) => {
                record.original_address = text.clone();
                text.as_str()
            }
            Some(FieldValue::Other(value)) => {
                warn!("{}: address cell is not text ({}), treated as empty", id, value);
                record.original_address = value.clone();
                ""
            }
            Some(FieldValue::Empty) | None => "",
        };

        let parsed = self.parse_address(text);

        let supplied = |role| {
            mapping
                .get(role)
                .map(|column| row.text(column))
                .filter(|value| !value.is_empty())
        };

        record.name = supplied(ColumnRole::Name).unwrap_or_default().to_string();
        record.care_of = supplied(ColumnRole::CareOf).unwrap_or_default().to_string();
        record.neighborhood = supplied(ColumnRole::Neighborhood)
            .map(str::to_string)
            .unwrap_or(parsed.geography.neighborhood);
        record.city = supplied(ColumnRole::City)
            .map(str::to_string)
            .unwrap_or(parsed.geography.city);
        record.state = supplied(ColumnRole::State)
            .map(str::to_string)
            .or(parsed.geography.state);

        match supplied(ColumnRole::Region) {
            Some(text) => {
                record.region = Region::from_name(text);
                if record.region.is_none() {
                    warn!("{}: unknown region '{}', kept as text", id, text);
                    record.region_text = Some(text.to_string());
                }
            }
            None => record.region = record.state.as_deref().and_then(classify_region),
        }

        record.postal_code = parsed.postal_code;
        record.house_number = parsed.house_number;
        record.street = parsed.street;
        record.complement = parsed.complement;
        record.status = parsed.status;
        record.audit = parsed.audit;

        debug!(
            id = %record.id,
            status = %record.status,
            postal_code = ?record.audit.postal_code,
            house_number = ?record.audit.house_number,
            "row processed"
        );

        record
    }

    /// Process rows, calling `on_row` after each one.
    pub fn process_with_progress<F>(
        &self,
        rows: &[RawAddressRow],
        mapping: &ColumnMapping,
        mut on_row: F,
    ) -> RecordSet
    where
        F: FnMut(usize),
    {
        info!("Processing {} rows", rows.len());

        let records = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let record = self.process_row(RecordId::from_index(index), row, mapping);
                on_row(index + 1);
                record
            })
            .collect();

        let set = RecordSet::new(records);
        info!("Processed {} rows: {}", set.len(), set.summary());
        set
    }

    /// Validate the mapping against the table headers, then process every row.
    ///
    /// A mapping naming a column the table does not have fails the whole table.
    pub fn process_table(&self, table: &Table, mapping: &ColumnMapping) -> Result<RecordSet> {
        mapping.validate(&table.headers)?;
        Ok(self.process(&table.rows, mapping))
    }
}

impl Default for AddressProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressParser for AddressProcessor {
    fn parse_address(&self, text: &str) -> ParsedAddress {
        let text = normalize(text).display;

        let postal_code = self.postal_code.extract(&text);
        let house_number = self.house_number.extract(&text);

        let audit = ExtractionAudit {
            postal_code: postal_code.as_ref().map(|m| m.strategy.to_string()),
            house_number: house_number.as_ref().map(|m| m.strategy.to_string()),
        };

        let postal_code = postal_code.map(|m| m.value);
        let house_number = house_number.map(|m| m.value).unwrap_or_default();

        let geography = self.geography.extract(&text).unwrap_or_default();
        let leading_zero_assumed = audit.postal_code.as_deref() == Some(BARE_SEVEN);
        let street = self.street.clean(
            &text,
            postal_code.as_ref(),
            leading_zero_assumed,
            &house_number,
        );
        let complement = self.house_number.complement(&text);
        let status = generate_status(postal_code.as_ref(), &house_number);

        ParsedAddress {
            postal_code,
            house_number,
            street,
            complement,
            geography,
            status,
            audit,
        }
    }

    fn process(&self, rows: &[RawAddressRow], mapping: &ColumnMapping) -> RecordSet {
        self.process_with_progress(rows, mapping, |_| {})
    }
}

/// Processed records, kept in input order.
///
/// Triage and final arrangements are derived on demand, so either can be
/// produced at any time, including after edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<AddressRecord>,
}

impl RecordSet {
    pub fn new(records: Vec<AddressRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AddressRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AddressRecord> {
        self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&AddressRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut AddressRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Overwrite one field of one record with a human edit. No
    /// re-extraction or status recomputation happens.
    pub fn edit(&mut self, id: RecordId, column: ExportColumn, value: &str) -> std::result::Result<(), TableError> {
        let record = self
            .get_mut(id)
            .ok_or_else(|| TableError::InvalidRecordId(id.to_string()))?;
        column.set(record, value)
    }

    /// Problem rows first: severity descending, then ID ascending.
    pub fn triage_order(&self) -> Vec<&AddressRecord> {
        let mut ordered: Vec<&AddressRecord> = self.records.iter().collect();
        ordered.sort_by(|a, b| {
            b.status
                .severity()
                .cmp(&a.status.severity())
                .then(a.id.cmp(&b.id))
        });
        ordered
    }

    /// Input order restored from the stable IDs.
    pub fn final_order(&self) -> Vec<&AddressRecord> {
        let mut ordered: Vec<&AddressRecord> = self.records.iter().collect();
        ordered.sort_by_key(|r| r.id);
        ordered
    }

    /// Counts per status flag.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.records.len(),
            ..Summary::default()
        };
        for record in &self.records {
            let status = &record.status;
            if status.is_ok() {
                summary.ok += 1;
            }
            if status.contains(StatusFlag::MissingPostalCode) {
                summary.missing_postal_code += 1;
            }
            if status.contains(StatusFlag::MissingHouseNumber) {
                summary.missing_house_number += 1;
            }
            if status.contains(StatusFlag::NoNumberMarker) {
                summary.no_number += 1;
            }
        }
        summary
    }
}

impl FromIterator<AddressRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = AddressRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Row counts of a processed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub missing_postal_code: usize,
    pub missing_house_number: usize,
    pub no_number: usize,
}

impl Summary {
    /// Rows needing attention.
    pub fn flagged(&self) -> usize {
        self.total - self.ok
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} OK, {} without CEP, {} without number, {} S/N",
            self.ok, self.missing_postal_code, self.missing_house_number, self.no_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(addresses: &[&str]) -> Vec<RawAddressRow> {
        addresses
            .iter()
            .map(|a| RawAddressRow::from_pairs([("Endereço", *a)]))
            .collect()
    }

    fn mapping() -> ColumnMapping {
        ColumnMapping::address("Endereço")
    }

    #[test]
    fn test_parse_full_address() {
        let parsed = AddressProcessor::new()
            .parse_address("Rua das Flores, 177 - Apto 302, Centro - SP, CEP 01310-100");

        assert_eq!(parsed.postal_code, PostalCode::parse("01310100"));
        assert_eq!(parsed.house_number, HouseNumber::from("177"));
        assert_eq!(parsed.complement, "Apto 302");
        assert!(parsed.status.is_ok());
        assert_eq!(parsed.audit.postal_code.as_deref(), Some("cep_keyword"));
        assert_eq!(parsed.audit.house_number.as_deref(), Some("comma_delimited"));
        assert!(!parsed.street.contains("177"));
        assert!(!parsed.street.contains("01310"));
        assert!(parsed.street.starts_with("Rua das Flores"));
    }

    #[test]
    fn test_generate_status() {
        let code = PostalCode::parse("01310100");
        assert_eq!(
            generate_status(code.as_ref(), &HouseNumber::NoNumber),
            Status::from_flags([StatusFlag::NoNumberMarker])
        );
        assert_eq!(
            generate_status(None, &HouseNumber::Missing),
            Status::from_flags([StatusFlag::MissingPostalCode, StatusFlag::MissingHouseNumber])
        );
        assert!(generate_status(code.as_ref(), &HouseNumber::from("12")).is_ok());
        assert_eq!(generate_status(None, &HouseNumber::from("12")).to_string(), "CEP?");
    }

    #[test]
    fn test_no_number_row_status() {
        let parsed = AddressProcessor::new().parse_address("Avenida Brasil S/N, Zona Rural, 70040-010");
        assert_eq!(parsed.house_number, HouseNumber::NoNumber);
        assert_eq!(parsed.status.to_string(), "S/N");
    }

    #[test]
    fn test_ids_follow_input_order() {
        let input = rows(&["Rua A 1 01310-100", "sem endereço", "Rua C S/N 01310-100", "Rua D 4"]);
        let set = AddressProcessor::new().process(&input, &mapping());

        let ids: Vec<String> = set.records().iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["ID_1", "ID_2", "ID_3", "ID_4"]);

        // final order restores the input order
        let originals: Vec<&str> = set
            .final_order()
            .iter()
            .map(|r| r.original_address.as_str())
            .collect();
        assert_eq!(originals, vec!["Rua A 1 01310-100", "sem endereço", "Rua C S/N 01310-100", "Rua D 4"]);
    }

    #[test]
    fn test_triage_order_puts_problems_first() {
        let input = rows(&[
            "Rua A 1 01310-100",   // OK
            "Rua B 2",             // CEP?
            "sem endereço",        // CEP? NUMBER?
            "Rua C S/N 01310-100", // S/N
            "Rua E 5 01310-100",   // OK
            "Rua F",               // CEP? NUMBER?
        ]);
        let set = AddressProcessor::new().process(&input, &mapping());

        let order: Vec<usize> = set.triage_order().iter().map(|r| r.id.0).collect();
        assert_eq!(order, vec![3, 6, 2, 4, 1, 5]);

        let triage = set.triage_order();
        let first_ok = triage.iter().position(|r| r.status.is_ok()).unwrap();
        assert!(triage[..first_ok].iter().all(|r| !r.status.is_ok()));
        assert!(triage[first_ok..].iter().all(|r| r.status.is_ok()));
    }

    #[test]
    fn test_supplied_columns_take_precedence() {
        let row = RawAddressRow::from_pairs([
            ("Endereço", "CEP 01310-100, Rua Augusta, 500 - Consolação, São Paulo - SP"),
            ("Nome", "Clube Centro"),
            ("Cidade", "Sampa"),
            ("Região", "Sudeste"),
            ("A/C", "Maria"),
            ("Bairro", ""),
        ]);
        let mapping = mapping()
            .with(ColumnRole::Name, "Nome")
            .with(ColumnRole::City, "Cidade")
            .with(ColumnRole::Region, "Região")
            .with(ColumnRole::CareOf, "A/C")
            .with(ColumnRole::Neighborhood, "Bairro");

        let record = AddressProcessor::new().process_row(RecordId(1), &row, &mapping);
        assert_eq!(record.name, "Clube Centro");
        assert_eq!(record.city, "Sampa");
        assert_eq!(record.care_of, "Maria");
        // blank supplied value falls back to the parsed one
        assert_eq!(record.neighborhood, "Consolação");
        assert_eq!(record.state.as_deref(), Some("SP"));
        assert_eq!(record.region, Some(Region::Southeast));
    }

    #[test]
    fn test_region_classified_from_supplied_state() {
        let row = RawAddressRow::from_pairs([("Endereço", "Rua X 10"), ("UF", "pe"), ("Região", "")]);
        let mapping = mapping()
            .with(ColumnRole::State, "UF")
            .with(ColumnRole::Region, "Região");
        let record = AddressProcessor::new().process_row(RecordId(1), &row, &mapping);
        assert_eq!(record.state.as_deref(), Some("pe"));
        assert_eq!(record.region, Some(Region::Northeast));
        assert_eq!(record.region_text, None);
    }

    #[test]
    fn test_unknown_supplied_region_kept_verbatim() {
        let row = RawAddressRow::from_pairs([
            ("Endereço", "Rua X 10"),
            ("UF", "PE"),
            ("Região", "Nordeste/Norte"),
        ]);
        let mapping = mapping()
            .with(ColumnRole::State, "UF")
            .with(ColumnRole::Region, "Região");
        let record = AddressProcessor::new().process_row(RecordId(1), &row, &mapping);
        assert_eq!(record.region, None);
        assert_eq!(record.region_text.as_deref(), Some("Nordeste/Norte"));
        assert_eq!(
            ExportColumn::Region.value(&record, true),
            "Nordeste/Norte"
        );
    }

    #[test]
    fn test_non_text_address_degrades_to_empty() {
        let mut row = RawAddressRow::new();
        row.insert("Endereço", FieldValue::Other("12345678".to_string()));
        let record = AddressProcessor::new().process_row(RecordId(1), &row, &mapping());

        assert_eq!(record.original_address, "12345678");
        assert_eq!(record.postal_code, None);
        assert_eq!(record.status.to_string(), "CEP? NUMBER?");
    }

    #[test]
    fn test_process_table_rejects_unknown_column() {
        let table = Table::from_cells(vec!["Endereço".to_string()], vec![vec!["Rua A 1".into()]]);
        let result = AddressProcessor::new().process_table(&table, &ColumnMapping::address("Address"));
        assert!(result.is_err());

        let set = AddressProcessor::new()
            .process_table(&table, &ColumnMapping::address("Endereço"))
            .unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_edit_overwrites_in_place() {
        let mut set = AddressProcessor::new().process(&rows(&["Rua B 2"]), &mapping());
        set.edit(RecordId(1), ExportColumn::PostalCode, "04538-133").unwrap();

        let record = set.get(RecordId(1)).unwrap();
        assert_eq!(record.postal_code, PostalCode::parse("04538133"));
        // no re-validation after a manual edit
        assert_eq!(record.status.to_string(), "CEP?");
        assert!(set.edit(RecordId(9), ExportColumn::City, "X").is_err());
    }

    #[test]
    fn test_summary() {
        let set = AddressProcessor::new().process(
            &rows(&["Rua A 1 01310-100", "Rua B 2", "sem endereço", "Rua C S/N 01310-100"]),
            &mapping(),
        );
        let summary = set.summary();
        assert_eq!(
            summary,
            Summary {
                total: 4,
                ok: 1,
                missing_postal_code: 2,
                missing_house_number: 1,
                no_number: 1,
            }
        );
        assert_eq!(summary.flagged(), 3);
    }
}
