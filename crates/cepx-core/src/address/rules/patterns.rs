//! Common regex patterns for Brazilian address extraction.
//!
//! House-number and suppression patterns expect upper-cased text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::config::COMPLEMENT_KEYWORDS;

lazy_static! {
    // CEP (postal code) patterns
    pub static ref CEP_KEYWORD: Regex = Regex::new(
        r"(?i)\bC\.?E\.?P\.?[^0-9]{0,5}(\d{2}[. ]?\d{3}[-. ]?\d{3})(?:[^0-9]|$)"
    ).unwrap();

    pub static ref CEP_FORMATTED: Regex = Regex::new(
        r"(?:^|[^0-9])(\d{2}[. ]?\d{3}-\d{3})(?:[^0-9]|$)"
    ).unwrap();

    pub static ref CEP_BARE: Regex = Regex::new(
        r"(?:^|[^0-9])(\d{8})(?:[^0-9]|$)"
    ).unwrap();

    pub static ref CEP_SEVEN_DIGITS: Regex = Regex::new(
        r"(?:^|[^0-9])(\d{7})(?:[^0-9]|$)"
    ).unwrap();

    // Tokens removed before the house number search
    pub static ref CEP_TOKEN_FORMATTED: Regex = Regex::new(
        r"\b\d{2}[. ]?\d{3}-\d{3}\b"
    ).unwrap();

    pub static ref CEP_TOKEN_BARE: Regex = Regex::new(
        r"\b\d{8}\b"
    ).unwrap();

    pub static ref LONG_DIGIT_RUN: Regex = long_digit_run_pattern(7).unwrap();

    pub static ref DEFAULT_COMPLEMENT: Option<Regex> = complement_pattern(COMPLEMENT_KEYWORDS).unwrap();

    // Area code only when parenthesized
    pub static ref PHONE: Regex = Regex::new(
        r"(?:\(\d{2}\)\s*)?\b\d{4,5}-\d{4}\b"
    ).unwrap();

    // House number patterns
    pub static ref NO_NUMBER: Regex = Regex::new(
        r"\b(?:S/N[º°]?|S\.N\.?|SN|S-N|SEM\s+N(?:[º°O]|UMERO|ÚMERO)?)\b"
    ).unwrap();

    pub static ref NUMBER_BEFORE_COMMA: Regex = Regex::new(
        r"\b(\d+),"
    ).unwrap();

    pub static ref NUMBER_BETWEEN_DASHES: Regex = Regex::new(
        r"\s[-–]\s*(\d+)\s*(?:[-–]|$)"
    ).unwrap();

    pub static ref NUMBER_COMMA_DELIMITED: Regex = Regex::new(
        r",\s*(\d+)\s*(?:[-,;/]|\bAP|\bBL)"
    ).unwrap();

    pub static ref NUMBER_LABELED: Regex = Regex::new(
        r"\b(?:NÚMERO|NUMERO|NUM|NRO|NR|Nº|N°|N)\.?\s*(\d+)"
    ).unwrap();

    pub static ref NUMBER_AFTER_COMMA: Regex = Regex::new(
        r",\s*(\d+)"
    ).unwrap();

    pub static ref NUMBER_AT_END: Regex = Regex::new(
        r"(?:^|\s)(\d+)$"
    ).unwrap();

    pub static ref ANY_NUMBER: Regex = Regex::new(
        r"(\d+)"
    ).unwrap();

    // Geography
    pub static ref TRAILING_STATE: Regex = Regex::new(
        r"(?:^|[^A-Za-z])([A-Z]{2})$"
    ).unwrap();

    pub static ref GEOGRAPHY_DELIMITER: Regex = Regex::new(
        r"[,\-–/]"
    ).unwrap();

    // Street cleanup
    pub static ref CEP_NOISE: Regex = noise_word_pattern("CEP").unwrap();

    pub static ref DANGLING_DASH: Regex = Regex::new(
        r"\s[-–]\s*$"
    ).unwrap();

    pub static ref SPACE_BEFORE_COMMA: Regex = Regex::new(
        r"\s+,"
    ).unwrap();

    pub static ref REPEATED_COMMA: Regex = Regex::new(
        r",(?:\s*,)+"
    ).unwrap();
}

/// Build the complement pattern: a marker keyword, optional `Nº`, a number
/// and an optional single trailing letter (`APTO 302`, `BL. 4B`, `QD 12`).
///
/// Case-insensitive so spans can be read from display text as well.
/// `None` when the vocabulary is empty.
pub fn complement_pattern<S: AsRef<str>>(keywords: &[S]) -> Result<Option<Regex>, regex::Error> {
    let mut keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect();
    // Longest first so APTO wins over AP.
    keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    keywords.dedup();

    if keywords.is_empty() {
        return Ok(None);
    }

    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(
        r"(?i)\b(?:{alternation})\.?\s*(?:N[º°O]?\.?\s*)?\d+[A-Z]?\b"
    ))
    .map(Some)
}

/// Build the pattern for digit runs of `min_len` or more.
pub fn long_digit_run_pattern(min_len: usize) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\d{{{},}}", min_len.max(1)))
}

/// Build the pattern for a noise word with an optional trailing `:` or `.`.
pub fn noise_word_pattern(word: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?i)\b{}\b[:.]?", regex::escape(word.trim())))
}

/// Keep only ASCII digits.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}
