//! Tabular input and output around the address engine.
//!
//! Loading, column mapping, export arrangements and re-import of edited
//! files. The engine itself only sees [`RawAddressRow`]s and a
//! [`ColumnMapping`].

pub mod export;
pub mod import;
pub mod reader;

pub use export::{Arrangement, ExportColumn, ExportFormat, TableWriter};
pub use import::{read_edited_csv, read_edited_records};
pub use reader::{TableFormat, TableReader};

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::models::config::ColumnHints;

/// One cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Text cell.
    Text(String),
    /// Any non-text cell (number, date, boolean, error), in display form.
    Other(String),
    /// Missing or blank cell.
    #[default]
    Empty,
}

impl FieldValue {
    /// The text of a `Text` cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Display form of any cell; empty for `Empty`.
    pub fn display(&self) -> &str {
        match self {
            FieldValue::Text(s) | FieldValue::Other(s) => s,
            FieldValue::Empty => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display().trim().is_empty()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::from(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(value)
        }
    }
}

/// One input row: column name to cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAddressRow {
    fields: BTreeMap<String, FieldValue>,
}

impl RawAddressRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) {
        self.fields.insert(column.into(), value);
    }

    /// Cell for `column`; absent columns read as `Empty`.
    pub fn get(&self, column: &str) -> &FieldValue {
        const EMPTY: &FieldValue = &FieldValue::Empty;
        self.fields.get(column).unwrap_or(EMPTY)
    }

    /// Display text for `column`, trimmed; empty when absent.
    pub fn text(&self, column: &str) -> &str {
        self.get(column).display().trim()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// A loaded table: header row and data rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawAddressRow>,
}

impl Table {
    /// Build a table from positional cells. Blank headers become
    /// `column_<n>` and repeated headers get a `_<n>` suffix.
    pub fn from_cells(headers: Vec<String>, rows: Vec<Vec<FieldValue>>) -> Self {
        let mut seen = HashSet::new();
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let base = match h.trim() {
                    "" => format!("column_{}", i + 1),
                    name => name.to_string(),
                };
                let mut name = base.clone();
                let mut n = 2;
                while !seen.insert(name.clone()) {
                    name = format!("{base}_{n}");
                    n += 1;
                }
                name
            })
            .collect();

        let rows = rows
            .into_iter()
            .map(|cells| {
                RawAddressRow::from_pairs(headers.iter().cloned().zip(cells))
            })
            .collect();

        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Logical role of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Address,
    Name,
    City,
    State,
    Region,
    Neighborhood,
    CareOf,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 7] = [
        ColumnRole::Address,
        ColumnRole::Name,
        ColumnRole::City,
        ColumnRole::State,
        ColumnRole::Region,
        ColumnRole::Neighborhood,
        ColumnRole::CareOf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Address => "address",
            ColumnRole::Name => "name",
            ColumnRole::City => "city",
            ColumnRole::State => "state",
            ColumnRole::Region => "region",
            ColumnRole::Neighborhood => "neighborhood",
            ColumnRole::CareOf => "care_of",
        }
    }

    fn hints<'a>(&self, hints: &'a ColumnHints) -> &'a [String] {
        match self {
            ColumnRole::Address => &hints.address,
            ColumnRole::Name => &hints.name,
            ColumnRole::City => &hints.city,
            ColumnRole::State => &hints.state,
            ColumnRole::Region => &hints.region,
            ColumnRole::Neighborhood => &hints.neighborhood,
            ColumnRole::CareOf => &hints.care_of,
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role to column-name mapping. Only the address role is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    columns: BTreeMap<ColumnRole, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping with only the address column set.
    pub fn address(column: impl Into<String>) -> Self {
        Self::new().with(ColumnRole::Address, column)
    }

    pub fn with(mut self, role: ColumnRole, column: impl Into<String>) -> Self {
        self.set(role, column);
        self
    }

    /// Map `role` to `column`; a blank column name unmaps the role.
    pub fn set(&mut self, role: ColumnRole, column: impl Into<String>) {
        let column = column.into();
        if column.trim().is_empty() {
            self.columns.remove(&role);
        } else {
            self.columns.insert(role, column);
        }
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnRole, &str)> {
        self.columns.iter().map(|(role, column)| (*role, column.as_str()))
    }

    /// Guess a mapping from header names: per role, the first unused header
    /// containing one of the role's hint keywords (case-insensitive).
    pub fn guess(headers: &[String], hints: &ColumnHints) -> Self {
        let mut mapping = Self::new();
        let mut used = HashSet::new();

        for role in ColumnRole::ALL {
            let keywords: Vec<String> = role
                .hints(hints)
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();

            let found = headers.iter().find(|header| {
                let header_lower = header.to_lowercase();
                !used.contains(header.as_str())
                    && keywords.iter().any(|k| header_lower.contains(k.as_str()))
            });

            if let Some(header) = found {
                used.insert(header.as_str());
                mapping.columns.insert(role, header.clone());
            }
        }

        mapping
    }

    /// Fill roles this mapping leaves unset from `fallback`.
    pub fn or(mut self, fallback: &ColumnMapping) -> Self {
        for (role, column) in fallback.iter() {
            self.columns.entry(role).or_insert_with(|| column.to_string());
        }
        self
    }

    /// Check that an address column is mapped and every mapped column exists.
    pub fn validate(&self, headers: &[String]) -> Result<(), TableError> {
        if self.get(ColumnRole::Address).is_none() {
            return Err(TableError::MissingAddressColumn);
        }
        for (role, column) in self.iter() {
            if !headers.iter().any(|h| h == column) {
                return Err(TableError::UnknownColumn {
                    role: role.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_guess_mapping_from_portuguese_headers() {
        let headers = headers(&["Nome do Clube", "Endereço Completo", "Cidade", "UF", "Aos Cuidados"]);
        let mapping = ColumnMapping::guess(&headers, &ColumnHints::default());

        assert_eq!(mapping.get(ColumnRole::Address), Some("Endereço Completo"));
        assert_eq!(mapping.get(ColumnRole::Name), Some("Nome do Clube"));
        assert_eq!(mapping.get(ColumnRole::City), Some("Cidade"));
        assert_eq!(mapping.get(ColumnRole::State), Some("UF"));
        assert_eq!(mapping.get(ColumnRole::CareOf), Some("Aos Cuidados"));
        assert_eq!(mapping.get(ColumnRole::Region), None);
        assert_eq!(mapping.get(ColumnRole::Neighborhood), None);
    }

    #[test]
    fn test_explicit_mapping_wins_over_guess() {
        let headers = headers(&["Endereço", "Logradouro"]);
        let guessed = ColumnMapping::guess(&headers, &ColumnHints::default());
        let mapping = ColumnMapping::address("Logradouro").or(&guessed);
        assert_eq!(mapping.get(ColumnRole::Address), Some("Logradouro"));
    }

    #[test]
    fn test_validate_mapping() {
        let headers = headers(&["Endereço", "Nome"]);
        assert!(ColumnMapping::address("Endereço").validate(&headers).is_ok());
        assert!(matches!(
            ColumnMapping::new().validate(&headers),
            Err(TableError::MissingAddressColumn)
        ));
        assert!(matches!(
            ColumnMapping::address("Endereço")
                .with(ColumnRole::City, "Cidade")
                .validate(&headers),
            Err(TableError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_mapping_deserializes_from_role_names() {
        let mapping: ColumnMapping =
            serde_json::from_str(r#"{"address": "End", "care_of": "A/C"}"#).unwrap();
        assert_eq!(mapping.get(ColumnRole::Address), Some("End"));
        assert_eq!(mapping.get(ColumnRole::CareOf), Some("A/C"));
    }

    #[test]
    fn test_table_from_cells_names_blank_and_repeated_headers() {
        let table = Table::from_cells(
            headers(&["Endereço", "", "Endereço"]),
            vec![vec!["Rua A".into(), FieldValue::Other("12".into()), FieldValue::Empty]],
        );
        assert_eq!(table.headers, headers(&["Endereço", "column_2", "Endereço_2"]));
        assert_eq!(table.rows[0].get("Endereço").as_text(), Some("Rua A"));
        assert_eq!(table.rows[0].get("column_2").as_text(), None);
        assert_eq!(table.rows[0].text("column_2"), "12");
        assert!(table.rows[0].get("missing").is_empty());
    }
}
