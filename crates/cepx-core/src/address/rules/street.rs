//! Street (logradouro) residual cleanup.
//!
//! Only text identified as an extracted field or a configured noise word is
//! removed. Running the cleaner again on its own output removes nothing.

use regex::Regex;

use super::patterns::{
    noise_word_pattern, CEP_NOISE, DANGLING_DASH, REPEATED_COMMA, SPACE_BEFORE_COMMA,
};
use super::postal_code::{PostalCodeExtractor, BARE_SEVEN};
use super::FieldExtractor;
use crate::address::normalize::{collapse_whitespace, strip_quotes};
use crate::error::{CepxError, Result};
use crate::models::config::ExtractionConfig;
use crate::models::{HouseNumber, PostalCode};

const BOUNDARY_CHARS: &[char] = &[',', ';', '-', '–', '.'];

/// Removes extracted fields and noise words from address text.
pub struct StreetCleaner {
    noise: Vec<Regex>,
}

impl StreetCleaner {
    /// Cleaner that scrubs the word `CEP`.
    pub fn new() -> Self {
        Self {
            noise: vec![CEP_NOISE.clone()],
        }
    }

    /// Cleaner scrubbing the configured noise words.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let noise = config
            .noise_words
            .iter()
            .filter(|w| !w.trim().is_empty())
            .map(|w| {
                noise_word_pattern(w)
                    .map_err(|e| CepxError::Config(format!("invalid noise word '{w}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { noise })
    }

    /// Remove the postal code, the house number and noise words from `text`.
    ///
    /// `leading_zero_assumed` marks a code read from a 7-digit run; only then
    /// is the 7-digit form removed as well.
    pub fn clean(
        &self,
        text: &str,
        postal_code: Option<&PostalCode>,
        leading_zero_assumed: bool,
        house_number: &HouseNumber,
    ) -> String {
        let mut text = collapse_whitespace(&strip_quotes(text));

        if let Some(code) = postal_code {
            for pattern in postal_code_patterns(code, leading_zero_assumed) {
                // A match consumes its trailing boundary, so adjacent copies
                // need another pass.
                loop {
                    let replaced = pattern.replace_all(&text, "${1}${2}").into_owned();
                    if replaced == text {
                        break;
                    }
                    text = replaced;
                }
            }
        }

        // S/N describes the street, it is not excised.
        if let HouseNumber::Number(number) = house_number {
            if let Ok(pattern) = Regex::new(&format!(r"\b{}\b", regex::escape(number))) {
                text = pattern.replace_all(&text, "").into_owned();
            }
        }

        for pattern in &self.noise {
            text = pattern.replace_all(&text, "").into_owned();
        }

        text = DANGLING_DASH.replace(&text, "").into_owned();
        tidy(&text)
    }
}

impl Default for StreetCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Formatted-or-bare pattern for `code`, plus the 7-digit form when the
/// leading zero was assumed. Groups 1 and 2 hold the surrounding boundary chars.
fn postal_code_patterns(code: &PostalCode, leading_zero_assumed: bool) -> Vec<Regex> {
    let d = code.as_str();
    let mut sources = vec![format!(
        r"(^|[^0-9]){}[. ]?{}[-. ]?{}([^0-9]|$)",
        &d[..2],
        &d[2..5],
        &d[5..]
    )];
    if let Some(short) = d.strip_prefix('0').filter(|_| leading_zero_assumed) {
        sources.push(format!(r"(^|[^0-9]){short}([^0-9]|$)"));
    }
    sources.iter().filter_map(|s| Regex::new(s).ok()).collect()
}

fn tidy(text: &str) -> String {
    let text = collapse_whitespace(text);
    let text = SPACE_BEFORE_COMMA.replace_all(&text, ",");
    let text = REPEATED_COMMA.replace_all(&text, ",");
    text.trim_matches(|c: char| c.is_whitespace() || BOUNDARY_CHARS.contains(&c))
        .to_string()
}

/// Street text left after removing `postal_code` (8 digits) and `house_number`.
///
/// The 7-digit form of the code is only removed when the code is what the
/// postal-code extractor reads from `text` through its leading-zero strategy.
pub fn clean_street_text(text: &str, postal_code: Option<&str>, house_number: &str) -> String {
    let code = postal_code.and_then(PostalCode::parse);
    let leading_zero_assumed = code.as_ref().is_some_and(|code| {
        PostalCodeExtractor::new()
            .extract(text)
            .is_some_and(|found| found.strategy == BARE_SEVEN && &found.value == code)
    });
    StreetCleaner::new().clean(
        text,
        code.as_ref(),
        leading_zero_assumed,
        &HouseNumber::from(house_number),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removes_postal_code_and_number() {
        assert_eq!(
            clean_street_text("Rua das Flores, 177 - CEP: 01310-100", Some("01310100"), "177"),
            "Rua das Flores"
        );
        assert_eq!(
            clean_street_text("\"Av. Paulista\" 1578 01310100", Some("01310100"), "1578"),
            "Av. Paulista"
        );
    }

    #[test]
    fn test_removes_seven_digit_form() {
        assert_eq!(
            clean_street_text("Rua Augusta 500 1310100", Some("01310100"), "500"),
            "Rua Augusta"
        );
    }

    #[test]
    fn test_adjacent_postal_code_copies_removed_in_one_run() {
        assert_eq!(
            clean_street_text("Rua X 5 01310-100 01310100", Some("01310100"), "5"),
            "Rua X"
        );
    }

    #[test]
    fn test_seven_digit_form_kept_unless_leading_zero_assumed() {
        // code found formatted, so the 7-digit run is something else
        assert_eq!(
            clean_street_text("Rua 1310100, 10 - 01310-100", Some("01310100"), "10"),
            "Rua 1310100"
        );
        let cleaner = StreetCleaner::new();
        let code = PostalCode::parse("01310100");
        assert_eq!(
            cleaner.clean("Rua Augusta 500 1310100", code.as_ref(), false, &HouseNumber::from("500")),
            "Rua Augusta 1310100"
        );
        assert_eq!(
            cleaner.clean("Rua Augusta 500 1310100", code.as_ref(), true, &HouseNumber::from("500")),
            "Rua Augusta"
        );
    }

    #[test]
    fn test_no_number_marker_is_kept() {
        assert_eq!(
            clean_street_text("Avenida Brasil S/N, Zona Rural", None, "S/N"),
            "Avenida Brasil S/N, Zona Rural"
        );
    }

    #[test]
    fn test_number_only_removed_as_whole_word() {
        assert_eq!(
            clean_street_text("Rua 1770, 17", None, "17"),
            "Rua 1770"
        );
    }

    #[test]
    fn test_other_digits_untouched() {
        // neither a postal code nor the house number
        assert_eq!(
            clean_street_text("Rua 25 de Março, 300, 12345678", Some("87654321"), "300"),
            "Rua 25 de Março, 12345678"
        );
    }

    #[test]
    fn test_configured_noise_words() {
        let config = ExtractionConfig {
            noise_words: vec!["CEP".to_string(), "Endereço".to_string()],
            ..ExtractionConfig::default()
        };
        let cleaner = StreetCleaner::from_config(&config).unwrap();
        assert_eq!(
            cleaner.clean("Endereço: Rua A, 5 cep.", None, false, &HouseNumber::from("5")),
            "Rua A"
        );
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let cases = [
            ("Rua das Flores, 177 - Apto 302, Centro - SP", Some("01310100"), "177"),
            ("Rua 10 de Maio, 10 - CEP 04538-133", Some("04538133"), "10"),
            ("CEP: 12.345-678 Rua X, 5 - ", Some("12345678"), "5"),
            ("Avenida Brasil S/N, Zona Rural", None, "S/N"),
            (" , ; - ", None, ""),
            ("Rua 1310100 100", Some("01310100"), "100"),
            ("Rua X 5 01310-100 01310100", Some("01310100"), "5"),
            ("CEP 01310100,01310100;01310-100", Some("01310100"), ""),
        ];
        for (text, code, number) in cases {
            let once = clean_street_text(text, code, number);
            let twice = clean_street_text(&once, code, number);
            assert_eq!(once, twice, "{text}");
        }
    }
}
