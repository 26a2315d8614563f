//! Text normalization shared by all extractors.

/// Quote characters stripped from address text.
pub const QUOTE_CHARS: &[char] = &[
    '"', '\'', '`', '\u{00B4}', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201C}', '\u{201D}',
    '\u{201E}', '\u{00AB}', '\u{00BB}',
];

/// Address text in two forms: clean-cased for output, upper-cased for matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    /// Quote-free, whitespace-collapsed, original casing.
    pub display: String,
    /// `display` upper-cased.
    pub matching: String,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }
}

/// Normalize raw address text.
pub fn normalize(raw: &str) -> NormalizedText {
    let display = collapse_whitespace(&strip_quotes(raw));
    let matching = display.to_uppercase();
    NormalizedText { display, matching }
}

/// Normalize a cell that may be absent or non-text; both degrade to empty.
pub fn normalize_cell(raw: Option<&str>) -> NormalizedText {
    raw.map(normalize).unwrap_or_default()
}

/// Remove straight and curly quote characters.
pub fn strip_quotes(text: &str) -> String {
    text.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

/// Collapse whitespace runs (newlines included) to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
