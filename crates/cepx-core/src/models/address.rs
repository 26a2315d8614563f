//! Address record data models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// An 8-digit CEP (Brazilian postal code), digits only.
///
/// Leading zeros are kept; the `NNNNN-NNN` form is only produced by
/// [`PostalCode::formatted`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Build a postal code from any text holding exactly 8 digits once
    /// punctuation is stripped.
    pub fn parse(text: &str) -> Option<Self> {
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != 8 || text.chars().any(|c| c.is_alphabetic()) {
            return None;
        }
        Some(Self(digits))
    }

    /// The bare 8 digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Format as `NNNNN-NNN`.
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not an 8-digit CEP: {value}"))
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}

/// Sentinel written for addresses explicitly marked as having no number.
pub const NO_NUMBER_MARKER: &str = "S/N";

/// House number extracted from an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HouseNumber {
    /// A numeric house number (digits only).
    Number(String),
    /// The address is explicitly marked "S/N" (sem número).
    NoNumber,
    /// Nothing usable was found.
    #[default]
    Missing,
}

impl HouseNumber {
    /// Text form: the digits, `"S/N"`, or an empty string.
    pub fn as_str(&self) -> &str {
        match self {
            HouseNumber::Number(n) => n,
            HouseNumber::NoNumber => NO_NUMBER_MARKER,
            HouseNumber::Missing => "",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, HouseNumber::Missing)
    }

    pub fn is_no_number(&self) -> bool {
        matches!(self, HouseNumber::NoNumber)
    }
}

impl fmt::Display for HouseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for HouseNumber {
    /// Human-edited values are taken as-is, only trimmed.
    fn from(value: String) -> Self {
        let value = value.trim();
        if value.is_empty() {
            HouseNumber::Missing
        } else if value.eq_ignore_ascii_case(NO_NUMBER_MARKER) {
            HouseNumber::NoNumber
        } else {
            HouseNumber::Number(value.to_string())
        }
    }
}

impl From<&str> for HouseNumber {
    fn from(value: &str) -> Self {
        HouseNumber::from(value.to_string())
    }
}

impl From<HouseNumber> for String {
    fn from(number: HouseNumber) -> Self {
        number.as_str().to_string()
    }
}

/// Brazilian macro-regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "North")]
    North,
    #[serde(rename = "Northeast")]
    Northeast,
    #[serde(rename = "Central-West")]
    CentralWest,
    #[serde(rename = "Southeast")]
    Southeast,
    #[serde(rename = "South")]
    South,
}

impl Region {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::Northeast => "Northeast",
            Region::CentralWest => "Central-West",
            Region::Southeast => "Southeast",
            Region::South => "South",
        }
    }

    /// Parse a region name, English or Portuguese, ignoring case and accents.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded: String = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'ã' | 'á' | 'â' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' => 'o',
                'ú' => 'u',
                '_' | ' ' => '-',
                other => other,
            })
            .collect();

        match folded.as_str() {
            "north" | "norte" | "n" => Some(Region::North),
            "northeast" | "nordeste" | "ne" => Some(Region::Northeast),
            "central-west" | "centro-oeste" | "centrooeste" | "co" => Some(Region::CentralWest),
            "southeast" | "sudeste" | "se" => Some(Region::Southeast),
            "south" | "sul" | "s" => Some(Region::South),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Neighborhood, city, state and region split out of the address text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geography {
    /// Neighborhood (bairro).
    pub neighborhood: String,

    /// City name.
    pub city: String,

    /// Two-letter state code (UF).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Macro-region derived from the state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

/// One problem flag of a processed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    /// No postal code could be found.
    MissingPostalCode,
    /// No house number could be found.
    MissingHouseNumber,
    /// The address is marked "S/N".
    NoNumberMarker,
}

impl StatusFlag {
    pub fn label(&self) -> &'static str {
        match self {
            StatusFlag::MissingPostalCode => "CEP?",
            StatusFlag::MissingHouseNumber => "NUMBER?",
            StatusFlag::NoNumberMarker => NO_NUMBER_MARKER,
        }
    }

    fn weight(&self) -> u8 {
        match self {
            StatusFlag::MissingPostalCode => 4,
            StatusFlag::MissingHouseNumber => 2,
            StatusFlag::NoNumberMarker => 1,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        [
            StatusFlag::MissingPostalCode,
            StatusFlag::MissingHouseNumber,
            StatusFlag::NoNumberMarker,
        ]
        .into_iter()
        .find(|flag| flag.label().eq_ignore_ascii_case(label))
    }
}

/// Row status: a set of [`StatusFlag`]s, `OK` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(Vec<StatusFlag>);

impl Status {
    /// Status with no flags.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Build from flags; duplicates are dropped and order is canonical.
    pub fn from_flags(flags: impl IntoIterator<Item = StatusFlag>) -> Self {
        let mut flags: Vec<StatusFlag> = flags.into_iter().collect();
        flags.sort();
        flags.dedup();
        Self(flags)
    }

    pub fn is_ok(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, flag: StatusFlag) -> bool {
        self.0.contains(&flag)
    }

    pub fn flags(&self) -> &[StatusFlag] {
        &self.0
    }

    /// Triage weight: higher needs attention sooner, `0` only for `OK`.
    pub fn severity(&self) -> u8 {
        self.0.iter().map(StatusFlag::weight).sum()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("OK");
        }
        let labels: Vec<&str> = self.0.iter().map(StatusFlag::label).collect();
        f.write_str(&labels.join(" "))
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("OK") {
            return Ok(Status::ok());
        }
        let flags = s
            .split_whitespace()
            .map(|label| StatusFlag::from_label(label).ok_or_else(|| format!("unknown status: {label}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Status::from_flags(flags))
    }
}

/// Stable per-row identifier, 1-based, displayed as `ID_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(pub usize);

impl RecordId {
    /// Identifier for the row at zero-based input position `index`.
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// Zero-based input position.
    pub fn index(&self) -> usize {
        self.0.saturating_sub(1)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_prefix("ID_")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .map(RecordId)
            .ok_or_else(|| TableError::InvalidRecordId(s.to_string()))
    }
}

impl TryFrom<String> for RecordId {
    type Error = TableError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

/// Names of the strategies that produced each extracted field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionAudit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
}

/// One processed row, ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Stable identifier assigned in input order.
    pub id: RecordId,

    /// Address text exactly as supplied.
    pub original_address: String,

    /// Recipient name (passthrough).
    #[serde(default)]
    pub name: String,

    /// Extracted postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<PostalCode>,

    /// Postal code cell as entered, when it is not an 8-digit CEP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code_text: Option<String>,

    /// Street text left after removing extracted fields.
    #[serde(default)]
    pub street: String,

    /// Extracted house number.
    #[serde(default)]
    pub house_number: HouseNumber,

    /// Apartment/block/lot spans found in the address.
    #[serde(default)]
    pub complement: String,

    #[serde(default)]
    pub neighborhood: String,

    #[serde(default)]
    pub city: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,

    /// Region text as supplied or entered, when it names no known region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_text: Option<String>,

    /// "Aos cuidados" (care-of) field (passthrough).
    #[serde(default)]
    pub care_of: String,

    /// Row status derived from postal code and house number.
    #[serde(default)]
    pub status: Status,

    /// Which strategies matched.
    #[serde(default)]
    pub audit: ExtractionAudit,
}

impl AddressRecord {
    /// Empty record for the given id.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            original_address: String::new(),
            name: String::new(),
            postal_code: None,
            postal_code_text: None,
            street: String::new(),
            house_number: HouseNumber::Missing,
            complement: String::new(),
            neighborhood: String::new(),
            city: String::new(),
            state: None,
            region: None,
            region_text: None,
            care_of: String::new(),
            status: Status::ok(),
            audit: ExtractionAudit::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_postal_code_parse() {
        assert_eq!(PostalCode::parse("01310-100").unwrap().as_str(), "01310100");
        assert_eq!(PostalCode::parse("12.345-678").unwrap().formatted(), "12345-678");
        assert!(PostalCode::parse("1234567").is_none());
        assert!(PostalCode::parse("CEP 12345678").is_none());
    }

    #[test]
    fn test_house_number_from_text() {
        assert_eq!(HouseNumber::from("177"), HouseNumber::Number("177".to_string()));
        assert_eq!(HouseNumber::from("s/n"), HouseNumber::NoNumber);
        assert_eq!(HouseNumber::from("  "), HouseNumber::Missing);
        assert_eq!(HouseNumber::NoNumber.as_str(), "S/N");
    }

    #[test]
    fn test_region_from_name() {
        assert_eq!(Region::from_name("Sudeste"), Some(Region::Southeast));
        assert_eq!(Region::from_name("centro oeste"), Some(Region::CentralWest));
        assert_eq!(Region::from_name("Central-West"), Some(Region::CentralWest));
        assert_eq!(Region::from_name("Região X"), None);
    }

    #[test]
    fn test_status_display_and_parse() {
        let status = Status::from_flags([StatusFlag::MissingHouseNumber, StatusFlag::MissingPostalCode]);
        assert_eq!(status.to_string(), "CEP? NUMBER?");
        assert_eq!("CEP? NUMBER?".parse::<Status>().unwrap(), status);
        assert_eq!(Status::ok().to_string(), "OK");
        assert_eq!("OK".parse::<Status>().unwrap(), Status::ok());
        assert!("BROKEN".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_severity_orders_problems_first() {
        let both = Status::from_flags([StatusFlag::MissingPostalCode, StatusFlag::MissingHouseNumber]);
        let cep = Status::from_flags([StatusFlag::MissingPostalCode]);
        let number = Status::from_flags([StatusFlag::MissingHouseNumber]);
        let marker = Status::from_flags([StatusFlag::NoNumberMarker]);

        assert!(both.severity() > cep.severity());
        assert!(cep.severity() > number.severity());
        assert!(number.severity() > marker.severity());
        assert!(marker.severity() > Status::ok().severity());
    }

    #[test]
    fn test_record_id_round_trip() {
        let id = RecordId::from_index(0);
        assert_eq!(id.to_string(), "ID_1");
        assert_eq!("ID_12".parse::<RecordId>().unwrap(), RecordId(12));
        assert!("ID_0".parse::<RecordId>().is_err());
        assert!("12".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_serializes_plain_strings() {
        let mut record = AddressRecord::new(RecordId(3));
        record.postal_code = PostalCode::parse("01310100");
        record.house_number = HouseNumber::NoNumber;

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "ID_3");
        assert_eq!(json["postal_code"], "01310100");
        assert_eq!(json["house_number"], "S/N");
        assert_eq!(json["status"], serde_json::json!([]));
    }
}
