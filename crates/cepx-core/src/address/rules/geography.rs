//! Neighborhood / city / state split.
//!
//! Anchored on a trailing two-letter state code. Without one, nothing is
//! split: the heuristic is only trusted when the address ends like
//! `..., Centro - São Paulo/SP`.

use super::patterns::{GEOGRAPHY_DELIMITER, TRAILING_STATE};
use super::region::classify_region;
use super::FieldExtractor;
use crate::address::normalize::normalize;
use crate::models::Geography;

const BOUNDARY_PUNCTUATION: &[char] = &['.', ',', ';'];

/// Geography field extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeographyExtractor;

impl GeographyExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for GeographyExtractor {
    type Output = Geography;

    /// `None` when no state code anchors the split.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let display = normalize(text).display;
        let state = extract_state(&display)?;

        let mut segments: Vec<&str> = GEOGRAPHY_DELIMITER
            .split(&display)
            .map(|s| s.trim().trim_matches(BOUNDARY_PUNCTUATION).trim())
            .filter(|s| !s.is_empty())
            .collect();

        match segments.last().copied() {
            Some(last) if last == state => {
                segments.pop();
            }
            Some(last) => {
                // "Campinas SP" as one segment
                let stripped = last
                    .strip_suffix(state.as_str())
                    .map(str::trim_end)
                    .unwrap_or(last);
                if let Some(slot) = segments.last_mut() {
                    *slot = stripped;
                }
                if stripped.is_empty() {
                    segments.pop();
                }
            }
            None => {}
        }

        let city = segments.pop().unwrap_or_default().to_string();
        let neighborhood = segments.pop().unwrap_or_default().to_string();
        let region = classify_region(&state);

        Some(Geography {
            neighborhood,
            city,
            state: Some(state),
            region,
        })
    }
}

/// Trailing two-letter upper-case state code of the trimmed text.
pub fn extract_state(text: &str) -> Option<String> {
    let trimmed = text
        .trim()
        .trim_end_matches(|c: char| BOUNDARY_PUNCTUATION.contains(&c) || c.is_whitespace());
    TRAILING_STATE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split `text` into neighborhood, city and state; all empty without a state.
pub fn split_geography(text: &str) -> Geography {
    GeographyExtractor::new().extract(text).unwrap_or_default()
}
