//! Core library for Brazilian address sanitizing.
//!
//! This crate provides:
//! - Text normalization for free-text address cells
//! - Rule-based extraction of CEP (postal code), house number and complement
//! - Neighborhood/city/state split and macro-region classification
//! - Street residual cleanup
//! - Row processing with status tags, triage and final orderings
//! - Table loading (CSV, spreadsheets), export and re-import of edited files

pub mod error;
pub mod models;
pub mod address;
pub mod table;

pub use error::{CepxError, Result, TableError};
pub use models::{
    AddressRecord, CepxConfig, ExtractionAudit, Geography, HouseNumber, PostalCode, RecordId,
    Region, Status, StatusFlag, NO_NUMBER_MARKER,
};
pub use address::{generate_status, AddressParser, AddressProcessor, ParsedAddress, RecordSet, Summary};
pub use address::rules::{
    classify_region, clean_street_text, extract_complement, extract_house_number,
    extract_postal_code, extract_state, split_geography,
};
pub use table::{
    Arrangement, ColumnMapping, ColumnRole, ExportColumn, ExportFormat, FieldValue,
    RawAddressRow, Table, TableFormat, TableReader, TableWriter,
};
