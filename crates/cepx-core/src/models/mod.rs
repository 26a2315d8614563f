//! Data models: address records and configuration.

pub mod address;
pub mod config;

pub use address::{
    AddressRecord, ExtractionAudit, Geography, HouseNumber, PostalCode, RecordId, Region, Status,
    StatusFlag, NO_NUMBER_MARKER,
};
pub use config::CepxConfig;
