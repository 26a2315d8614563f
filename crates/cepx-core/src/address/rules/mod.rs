//! Rule-based field extractors for Brazilian addresses.
//!
//! Each field is extracted by a [`StrategyCascade`]: an ordered list of
//! [`ExtractionStrategy`] objects tried in turn, first success wins. The
//! order is data, so every strategy can be tested on its own.

pub mod geography;
pub mod house_number;
pub mod patterns;
pub mod postal_code;
pub mod region;
pub mod street;

pub use geography::{extract_state, split_geography, GeographyExtractor};
pub use house_number::{extract_complement, extract_house_number, HouseNumberExtractor};
pub use postal_code::{extract_postal_code, PostalCodeExtractor};
pub use region::{classify_region, STATE_REGIONS};
pub use street::{clean_street_text, StreetCleaner};

use regex::Regex;
use tracing::{debug, trace};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
    /// Name of the strategy that produced the value.
    pub strategy: &'static str,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
            strategy: "",
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn with_strategy(mut self, strategy: &'static str) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the value, keeping the match context.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionMatch<U> {
        ExtractionMatch {
            value: f(self.value),
            confidence: self.confidence,
            position: self.position,
            source: self.source,
            strategy: self.strategy,
        }
    }
}

/// One step of an extraction cascade.
pub trait ExtractionStrategy: Send + Sync {
    /// Stable name, reported in logs and in the record audit.
    fn name(&self) -> &'static str;

    /// Confidence attached to values this strategy produces.
    fn confidence(&self) -> f32;

    /// Try to extract a value; `None` means "not found", never an error.
    fn try_extract(&self, text: &str) -> Option<ExtractionMatch<String>>;
}

type Transform = Box<dyn Fn(&str) -> String + Send + Sync>;
type Acceptor = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// A strategy backed by a single regex capture group.
///
/// Captures are scanned left to right; the first one passing `accept` is
/// transformed and returned.
pub struct RegexStrategy {
    name: &'static str,
    pattern: Regex,
    group: usize,
    confidence: f32,
    accept: Acceptor,
    transform: Transform,
}

impl RegexStrategy {
    /// Create a strategy returning capture group 1 unchanged.
    pub fn new(name: &'static str, pattern: &Regex, confidence: f32) -> Self {
        Self {
            name,
            pattern: pattern.clone(),
            group: 1,
            confidence,
            accept: Box::new(|_| true),
            transform: Box::new(str::to_string),
        }
    }

    /// Use a different capture group.
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// Only accept captures for which `accept` holds.
    pub fn with_acceptor(mut self, accept: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.accept = Box::new(accept);
        self
    }

    /// Transform the accepted capture.
    pub fn with_transform(mut self, transform: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }
}

impl ExtractionStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn try_extract(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.pattern.captures_iter(text).find_map(|caps| {
            let m = caps.get(self.group)?;
            if !(self.accept)(m.as_str()) {
                return None;
            }
            Some(
                ExtractionMatch::new((self.transform)(m.as_str()), self.confidence, m.as_str())
                    .with_position(m.start(), m.end())
                    .with_strategy(self.name),
            )
        })
    }
}

/// Ordered list of strategies for one field.
pub struct StrategyCascade {
    field: &'static str,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StrategyCascade {
    /// Create an empty cascade for `field`.
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy (lowest precedence so far).
    pub fn with(mut self, strategy: impl ExtractionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in precedence order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Look up a single strategy by name.
    pub fn strategy(&self, name: &str) -> Option<&dyn ExtractionStrategy> {
        self.strategies
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Run strategies in order and return the first match.
    pub fn run(&self, text: &str) -> Option<ExtractionMatch<String>> {
        for strategy in &self.strategies {
            if let Some(found) = strategy.try_extract(text) {
                debug!(
                    field = self.field,
                    strategy = strategy.name(),
                    value = %found.value,
                    "strategy matched"
                );
                return Some(found);
            }
        }
        trace!(field = self.field, "no strategy matched");
        None
    }
}
