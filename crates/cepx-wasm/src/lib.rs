//! WASM bindings for Brazilian address sanitizing.
//!
//! This crate provides WebAssembly bindings for an in-browser grid UI: the
//! page loads the spreadsheet itself and hands rows over as plain objects.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use cepx_core::models::config::ColumnHints;
use cepx_core::{
    AddressParser, AddressProcessor, AddressRecord, CepxConfig, ColumnMapping, FieldValue,
    PostalCode, RawAddressRow, RecordSet, Summary,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Decompose one address; returns every extracted field with its audit.
#[wasm_bindgen]
pub fn parse_address(text: &str) -> Result<JsValue, JsValue> {
    to_js(&AddressProcessor::new().parse_address(text))
}

/// Process rows (array of `{column: value}` objects).
///
/// `mapping` maps roles (`address`, `name`, `city`, ...) to column names;
/// when absent it is guessed from the row keys. Returns the triage and
/// final arrangements plus row counts.
#[wasm_bindgen]
pub fn process_rows(rows: JsValue, mapping: JsValue) -> Result<JsValue, JsValue> {
    AddressSanitizer::new(None)?.process_rows(rows, mapping)
}

/// First postal code in `text`, as 8 digits.
#[wasm_bindgen]
pub fn extract_postal_code(text: &str) -> Option<String> {
    cepx_core::extract_postal_code(text)
}

/// House number of `text`: digits, `S/N`, or empty.
#[wasm_bindgen]
pub fn extract_house_number(text: &str) -> String {
    cepx_core::extract_house_number(text).as_str().to_string()
}

/// Macro-region of a state code (e.g. `SP` gives `Southeast`).
#[wasm_bindgen]
pub fn classify_region(state: &str) -> Option<String> {
    cepx_core::classify_region(state).map(|r| r.name().to_string())
}

/// Format a postal code as `NNNNN-NNN`; unparseable input is returned as-is.
#[wasm_bindgen]
pub fn format_postal_code(code: &str) -> String {
    PostalCode::parse(code)
        .map(|c| c.formatted())
        .unwrap_or_else(|| code.to_string())
}

#[derive(Serialize)]
struct ProcessOutput<'a> {
    triage: Vec<&'a AddressRecord>,
    #[serde(rename = "final")]
    final_order: Vec<&'a AddressRecord>,
    summary: Summary,
}

/// Address sanitizer class for browser use.
#[wasm_bindgen]
pub struct AddressSanitizer {
    processor: AddressProcessor,
    hints: ColumnHints,
}

#[wasm_bindgen]
impl AddressSanitizer {
    /// Create a sanitizer, optionally from a JSON configuration string.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<AddressSanitizer, JsValue> {
        let config = match config_json.as_deref() {
            Some(json) if !json.trim().is_empty() => serde_json::from_str::<CepxConfig>(json)
                .map_err(|e| JsValue::from_str(&format!("Invalid configuration: {e}")))?,
            _ => CepxConfig::default(),
        };

        let processor = AddressProcessor::from_config(&config.extraction)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self {
            processor,
            hints: config.columns,
        })
    }

    /// Decompose one address.
    #[wasm_bindgen]
    pub fn parse(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.processor.parse_address(text))
    }

    /// Process rows; see [`process_rows`].
    #[wasm_bindgen]
    pub fn process_rows(&self, rows: JsValue, mapping: JsValue) -> Result<JsValue, JsValue> {
        let rows: Vec<BTreeMap<String, Value>> = serde_wasm_bindgen::from_value(rows)
            .map_err(|e| JsValue::from_str(&format!("Invalid rows: {e}")))?;

        let mapping = if mapping.is_undefined() || mapping.is_null() {
            None
        } else {
            Some(
                serde_wasm_bindgen::from_value::<ColumnMapping>(mapping)
                    .map_err(|e| JsValue::from_str(&format!("Invalid column mapping: {e}")))?,
            )
        };

        let set = self
            .run(&rows, mapping)
            .map_err(|e| JsValue::from_str(&e))?;

        to_js(&ProcessOutput {
            triage: set.triage_order(),
            final_order: set.final_order(),
            summary: set.summary(),
        })
    }
}

impl AddressSanitizer {
    fn run(
        &self,
        rows: &[BTreeMap<String, Value>],
        mapping: Option<ColumnMapping>,
    ) -> Result<RecordSet, String> {
        let headers: Vec<String> = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mapping = match mapping {
            Some(mapping) => mapping.or(&ColumnMapping::guess(&headers, &self.hints)),
            None => ColumnMapping::guess(&headers, &self.hints),
        };
        if !rows.is_empty() {
            mapping.validate(&headers).map_err(|e| e.to_string())?;
        }

        let rows: Vec<RawAddressRow> = rows.iter().map(row_from_json).collect();
        Ok(self.processor.process(&rows, &mapping))
    }
}

/// Strings are text cells; numbers and booleans are non-text cells.
fn row_from_json(row: &BTreeMap<String, Value>) -> RawAddressRow {
    let mut raw = RawAddressRow::new();
    for (column, value) in row {
        let cell = match value {
            Value::String(s) => FieldValue::from(s.as_str()),
            Value::Null => FieldValue::Empty,
            other => FieldValue::Other(other.to_string()),
        };
        raw.insert(column.clone(), cell);
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Value) -> Vec<BTreeMap<String, Value>> {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn test_format_postal_code() {
        assert_eq!(format_postal_code("01310100"), "01310-100");
        assert_eq!(format_postal_code("abc"), "abc");
    }

    #[test]
    fn test_classify_region() {
        assert_eq!(classify_region("sp").as_deref(), Some("Southeast"));
        assert_eq!(classify_region("XX"), None);
    }

    #[test]
    fn test_extract_helpers() {
        assert_eq!(
            extract_postal_code("Rua A, 10 - CEP 01310-100").as_deref(),
            Some("01310100")
        );
        assert_eq!(extract_house_number("Rua das Flores, 123"), "123");
        assert_eq!(extract_house_number("Rua sem nada"), "");
    }

    #[test]
    fn test_non_string_cells_are_not_text() {
        let row = row_from_json(&rows(json!([{"Endereço": 12345, "Nome": "Loja"}]))[0]);
        assert_eq!(row.get("Endereço"), &FieldValue::Other("12345".to_string()));
        assert_eq!(row.get("Nome"), &FieldValue::Text("Loja".to_string()));
    }

    #[test]
    fn test_run_guesses_mapping() {
        let sanitizer = AddressSanitizer::new(None).unwrap();
        let set = sanitizer
            .run(
                &rows(json!([
                    {"Endereço": "Rua A, 10 - 01310-100", "Cidade": ""},
                    {"Endereço": "Rua B", "Cidade": "Recife"}
                ])),
                None,
            )
            .unwrap();

        assert_eq!(set.len(), 2);
        let triage = set.triage_order();
        assert_eq!(triage[0].id.to_string(), "ID_2");
        assert_eq!(triage[0].city, "Recife");
        assert!(triage[1].status.is_ok());
    }

    #[test]
    fn test_run_rejects_unknown_column() {
        let sanitizer = AddressSanitizer::new(None).unwrap();
        let result = sanitizer.run(
            &rows(json!([{"Endereço": "Rua A, 10"}])),
            Some(ColumnMapping::address("Address")),
        );
        assert!(result.is_err());
    }
}
