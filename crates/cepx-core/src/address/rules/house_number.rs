//! House number extraction.
//!
//! The search runs over a copy of the text where complement spans
//! (`APTO 302`, `LOTE 12`), postal codes, phone numbers and long digit runs
//! have been blanked out, so their digits can never be picked up.

use regex::Regex;

use super::patterns::{
    complement_pattern, long_digit_run_pattern, ANY_NUMBER, CEP_TOKEN_BARE, CEP_TOKEN_FORMATTED,
    DEFAULT_COMPLEMENT, LONG_DIGIT_RUN, NO_NUMBER, NUMBER_AFTER_COMMA, NUMBER_AT_END,
    NUMBER_BEFORE_COMMA, NUMBER_BETWEEN_DASHES, NUMBER_COMMA_DELIMITED, NUMBER_LABELED, PHONE,
};
use super::{ExtractionMatch, FieldExtractor, RegexStrategy, StrategyCascade};
use crate::address::normalize::{collapse_whitespace, normalize};
use crate::error::{CepxError, Result};
use crate::models::config::ExtractionConfig;
use crate::models::{HouseNumber, NO_NUMBER_MARKER};

pub const NO_NUMBER_STRATEGY: &str = "no_number_marker";
pub const BEFORE_COMMA: &str = "before_comma";
pub const BETWEEN_DASHES: &str = "between_dashes";
pub const COMMA_DELIMITED: &str = "comma_delimited";
pub const LABELED: &str = "labeled";
pub const AFTER_COMMA: &str = "after_comma";
pub const AT_END: &str = "at_end";
pub const ANY_DIGITS: &str = "any_digits";

const DEFAULT_MAX_DIGITS: usize = 6;

/// House number field extractor.
pub struct HouseNumberExtractor {
    complement: Option<Regex>,
    long_digit_run: Regex,
    cascade: StrategyCascade,
}

impl HouseNumberExtractor {
    /// Create an extractor with the default complement vocabulary.
    pub fn new() -> Self {
        Self::build(DEFAULT_COMPLEMENT.clone(), LONG_DIGIT_RUN.clone(), DEFAULT_MAX_DIGITS)
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let complement = complement_pattern(&config.complement_keywords)
            .map_err(|e| CepxError::Config(format!("invalid complement keyword: {e}")))?;
        let long_digit_run = long_digit_run_pattern(config.long_digit_run)
            .map_err(|e| CepxError::Config(format!("invalid long_digit_run: {e}")))?;

        Ok(Self::build(complement, long_digit_run, config.max_house_number_digits))
    }

    fn build(complement: Option<Regex>, long_digit_run: Regex, max_digits: usize) -> Self {
        let numeric = move |name, pattern: &Regex, confidence| {
            RegexStrategy::new(name, pattern, confidence)
                .with_acceptor(move |digits| !digits.is_empty() && digits.len() <= max_digits)
        };

        let cascade = StrategyCascade::new("house_number")
            .with(
                RegexStrategy::new(NO_NUMBER_STRATEGY, &NO_NUMBER, 0.95)
                    .with_group(0)
                    .with_transform(|_| NO_NUMBER_MARKER.to_string()),
            )
            .with(numeric(BEFORE_COMMA, &NUMBER_BEFORE_COMMA, 0.9))
            .with(numeric(BETWEEN_DASHES, &NUMBER_BETWEEN_DASHES, 0.85))
            .with(numeric(COMMA_DELIMITED, &NUMBER_COMMA_DELIMITED, 0.85))
            .with(numeric(LABELED, &NUMBER_LABELED, 0.8))
            .with(numeric(AFTER_COMMA, &NUMBER_AFTER_COMMA, 0.7))
            .with(numeric(AT_END, &NUMBER_AT_END, 0.6))
            .with(numeric(ANY_DIGITS, &ANY_NUMBER, 0.3));

        Self {
            complement,
            long_digit_run,
            cascade,
        }
    }

    /// Strategy names in precedence order.
    pub fn strategies(&self) -> Vec<&'static str> {
        self.cascade.names()
    }

    /// Upper-case the text and blank out every token that must not be read
    /// as a house number.
    pub fn suppress_noise(&self, text: &str) -> String {
        let mut text = normalize(text).matching;

        if let Some(complement) = &self.complement {
            text = complement.replace_all(&text, " ").into_owned();
        }
        for pattern in [&*CEP_TOKEN_FORMATTED, &*CEP_TOKEN_BARE, &*PHONE, &self.long_digit_run] {
            text = pattern.replace_all(&text, " ").into_owned();
        }

        collapse_whitespace(&text)
    }

    /// Complement spans of `text` in their original casing, joined by `", "`.
    pub fn complement(&self, text: &str) -> String {
        let Some(complement) = &self.complement else {
            return String::new();
        };
        let display = normalize(text).display;
        complement
            .find_iter(&display)
            .map(|m| collapse_whitespace(m.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for HouseNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for HouseNumberExtractor {
    type Output = ExtractionMatch<HouseNumber>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let cleaned = self.suppress_noise(text);
        if cleaned.is_empty() {
            return None;
        }
        let found = self.cascade.run(&cleaned)?;
        let is_marker = found.strategy == NO_NUMBER_STRATEGY;
        Some(found.map(|value| {
            if is_marker {
                HouseNumber::NoNumber
            } else {
                HouseNumber::Number(value)
            }
        }))
    }
}

/// Extract a house number: digits, `S/N`, or [`HouseNumber::Missing`].
pub fn extract_house_number(text: &str) -> HouseNumber {
    HouseNumberExtractor::new()
        .extract(text)
        .map(|m| m.value)
        .unwrap_or_default()
}

/// Extract complement spans (`Apto 302, Bloco B2`), empty when none.
pub fn extract_complement(text: &str) -> String {
    HouseNumberExtractor::new().complement(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn number(text: &str) -> String {
        extract_house_number(text).as_str().to_string()
    }

    fn strategy_for(text: &str) -> Option<&'static str> {
        HouseNumberExtractor::new().extract(text).map(|m| m.strategy)
    }

    #[test]
    fn test_apartment_number_is_suppressed() {
        let text = "Rua das Flores, 177 - Apto 302, Centro - SP";
        assert_eq!(number(text), "177");
        assert_eq!(extract_complement(text), "Apto 302");
    }

    #[test]
    fn test_no_number_marker_short_circuits() {
        assert_eq!(extract_house_number("Avenida Brasil S/N, Zona Rural"), HouseNumber::NoNumber);
        assert_eq!(number("Rua 7 de Setembro, s/n"), "S/N");
        assert_eq!(number("Travessa B sem número 12"), "S/N");
        assert_eq!(strategy_for("Rua X SN"), Some(NO_NUMBER_STRATEGY));
    }

    #[test]
    fn test_strategy_precedence() {
        assert_eq!(number("Rua Augusta 1500, Consolação"), "1500");
        assert_eq!(strategy_for("Rua Augusta 1500, Consolação"), Some(BEFORE_COMMA));

        assert_eq!(number("Rua Bahia - 45 - Centro"), "45");
        assert_eq!(strategy_for("Rua Bahia - 45 - Centro"), Some(BETWEEN_DASHES));

        assert_eq!(number("Rua A, nº 45"), "45");
        assert_eq!(strategy_for("Rua A nº 45 Centro"), Some(LABELED));

        assert_eq!(number("Rua 25 de Março, 300"), "300");
        assert_eq!(strategy_for("Rua 25 de Março, 300"), Some(AFTER_COMMA));

        assert_eq!(number("Rua Augusta 1500"), "1500");
        assert_eq!(strategy_for("Rua Augusta 1500"), Some(AT_END));

        assert_eq!(number("Rua 10 Centro"), "10");
        assert_eq!(strategy_for("Rua 10 Centro"), Some(ANY_DIGITS));
    }

    #[test]
    fn test_postal_code_and_phone_are_suppressed() {
        assert_eq!(number("Rua X 10 CEP 01310-100 Tel (11) 98765-4321"), "10");
        assert_eq!(number("Rua Y, 22 - 04538133"), "22");
        assert_eq!(number("Fone 11987654321"), "");
    }

    #[test]
    fn test_number_next_to_phone_is_kept() {
        assert_eq!(number("Rua Bahia, 45 98765-4321"), "45");
        assert_eq!(number("Rua X, 12 3333-4444, Centro"), "12");
        assert_eq!(number("Rua X, 12 (11) 3333-4444"), "12");
    }

    #[test]
    fn test_only_complement_numbers_means_missing() {
        assert_eq!(extract_house_number("Quadra 5 Lote 12, Setor Sul"), HouseNumber::Missing);
        assert_eq!(extract_complement("Quadra 5 Lote 12, Setor Sul"), "Quadra 5, Lote 12");
    }

    #[test]
    fn test_empty_and_wordless_input() {
        assert_eq!(extract_house_number(""), HouseNumber::Missing);
        assert_eq!(extract_house_number("   \"\"  "), HouseNumber::Missing);
        assert_eq!(extract_house_number("Rua sem saída"), HouseNumber::Missing);
    }

    #[test]
    fn test_configured_digit_limit() {
        let config = ExtractionConfig {
            max_house_number_digits: 3,
            ..ExtractionConfig::default()
        };
        let extractor = HouseNumberExtractor::from_config(&config).unwrap();
        assert!(extractor.extract("Rodovia 1234").is_none());
        assert_eq!(extractor.extract("Rodovia 123").unwrap().value, HouseNumber::from("123"));
    }

    #[test]
    fn test_result_shape_over_noisy_corpus() {
        let corpus = [
            "",
            "S/N",
            "Rua 1234567 89",
            "Av. Brasil, 1000000",
            "Rua X, 12B",
            "\"Rua\" \u{201C}Y\u{201D} 5",
            "CEP 12345-678",
            "Rua A, 10, Apto 5, Bloco 3, Lote 9",
            "KM 23 Rodovia SP 330",
            "Estrada Velha - 987654 - Zona Rural",
        ];
        for text in corpus {
            let value = number(text);
            assert!(
                value.is_empty()
                    || value == "S/N"
                    || (value.len() <= 6 && value.chars().all(|c| c.is_ascii_digit())),
                "{text} -> {value}"
            );
        }
    }
}
