//! Rule-based field extractors for immigration forms.

pub mod a_number;
pub mod form_fields;
pub mod form_number;
pub mod names;
pub mod patterns;

pub use a_number::{ANumberExtractor, extract_a_number};
pub use form_fields::{field_for_widget, widget_values};
pub use form_number::{FormNumberExtractor, extract_form_number};
pub use names::{NameExtractor, NameParts, extract_names};

/// Trait for field extractors.
///
/// `text` is the page's cleaned text and `lines` its normalized lines.
/// Extractors never fail; a miss is an empty result.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the highest-precedence match.
    fn extract(&self, text: &str, lines: &[String]) -> Option<Self::Output> {
        self.extract_all(text, lines).into_iter().next()
    }

    /// Extract every candidate, highest precedence first.
    fn extract_all(&self, text: &str, lines: &[String]) -> Vec<Self::Output>;
}

/// Heuristic that produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Found after a descriptive label.
    Labeled,
    /// Found by the value's own shape.
    Standalone,
    /// Positional tokens under a composite name header.
    GroupedHeader,
    /// Value on the same line as its label.
    Inline,
    /// First value line after a separate label line.
    PerLabel,
}

/// An extracted value with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Heuristic that matched.
    pub strategy: Strategy,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, strategy: Strategy, source: impl Into<String>) -> Self {
        Self {
            value,
            strategy,
            source: source.into(),
        }
    }
}

/// Fold text for label comparison: lowercase, punctuation to spaces,
/// whitespace collapsed.
pub fn fold(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `text` contains `word` as a whole word after folding.
pub fn has_word(text: &str, word: &str) -> bool {
    fold(text).split(' ').any(|w| w == word)
}

/// Keep only ASCII digits.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Strip stray punctuation around a token.
pub fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_ascii_alphanumeric())
}
