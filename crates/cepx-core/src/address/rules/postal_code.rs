//! CEP (Brazilian postal code) extraction.

use super::patterns::{digits_only, CEP_BARE, CEP_FORMATTED, CEP_KEYWORD, CEP_SEVEN_DIGITS};
use super::{ExtractionMatch, FieldExtractor, RegexStrategy, StrategyCascade};
use crate::address::normalize::strip_quotes;
use crate::models::config::ExtractionConfig;
use crate::models::PostalCode;

/// Strategy names, in precedence order.
pub const KEYWORD: &str = "cep_keyword";
pub const FORMATTED: &str = "cep_formatted";
pub const BARE_EIGHT: &str = "cep_bare_8";
pub const BARE_SEVEN: &str = "cep_bare_7";

/// CEP field extractor.
///
/// Keyword-anchored and formatted patterns run before the bare digit scans
/// so that an unformatted CEP next to other digit runs is not misread.
pub struct PostalCodeExtractor {
    cascade: StrategyCascade,
}

impl PostalCodeExtractor {
    /// Create a new extractor with every strategy enabled.
    pub fn new() -> Self {
        Self::with_leading_zero(true)
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::with_leading_zero(config.assume_leading_zero)
    }

    fn with_leading_zero(assume_leading_zero: bool) -> Self {
        let mut cascade = StrategyCascade::new("postal_code")
            .with(RegexStrategy::new(KEYWORD, &CEP_KEYWORD, 0.95).with_transform(digits_only))
            .with(RegexStrategy::new(FORMATTED, &CEP_FORMATTED, 0.9).with_transform(digits_only))
            .with(RegexStrategy::new(BARE_EIGHT, &CEP_BARE, 0.7));

        if assume_leading_zero {
            cascade = cascade.with(
                RegexStrategy::new(BARE_SEVEN, &CEP_SEVEN_DIGITS, 0.4)
                    .with_transform(|digits| format!("0{digits}")),
            );
        }

        Self { cascade }
    }

    /// Strategy names in precedence order.
    pub fn strategies(&self) -> Vec<&'static str> {
        self.cascade.names()
    }
}

impl Default for PostalCodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PostalCodeExtractor {
    type Output = ExtractionMatch<PostalCode>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let text = strip_quotes(text);
        let found = self.cascade.run(&text)?;
        let code = PostalCode::parse(&found.value)?;
        Some(found.map(|_| code))
    }
}

/// Extract a CEP from text as 8 bare digits.
pub fn extract_postal_code(text: &str) -> Option<String> {
    PostalCodeExtractor::new()
        .extract(text)
        .map(|m| m.value.as_str().to_string())
}
