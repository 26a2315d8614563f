//! Address decomposition engine.

pub mod normalize;
mod processor;
pub mod rules;

pub use normalize::{normalize, NormalizedText};
pub use processor::{generate_status, AddressProcessor, ParsedAddress, RecordSet, Summary};

use crate::models::AddressRecord;
use crate::table::{ColumnMapping, RawAddressRow};

/// Trait for address parsing.
pub trait AddressParser {
    /// Decompose one free-text address. Never fails: fields that cannot be
    /// found are left empty and reported in the status.
    fn parse_address(&self, text: &str) -> ParsedAddress;

    /// Process rows in input order, assigning stable IDs.
    fn process(&self, rows: &[RawAddressRow], mapping: &ColumnMapping) -> RecordSet;
}

/// Convenience: process rows with the default configuration and return
/// records in input order.
pub fn process(rows: &[RawAddressRow], mapping: &ColumnMapping) -> Vec<AddressRecord> {
    AddressProcessor::new().process(rows, mapping).into_records()
}
