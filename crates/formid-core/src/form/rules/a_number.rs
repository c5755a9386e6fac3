//! A-Number (Alien Registration Number) extraction.

use super::patterns::{A_NUMBER_LABELED, A_NUMBER_TOKEN};
use super::{ExtractionMatch, FieldExtractor, Strategy, digits_only};

/// Digit counts accepted after a label.
const LABELED_DIGITS: std::ops::RangeInclusive<usize> = 7..=10;

/// A-Number field extractor.
///
/// Label-anchored matches come first; `A` prefixed tokens are the fallback.
/// Values are digits only.
#[derive(Debug)]
pub struct ANumberExtractor {
    standalone: bool,
}

impl ANumberExtractor {
    /// Create a new A-Number extractor.
    pub fn new() -> Self {
        Self { standalone: true }
    }

    /// Set whether unlabeled `A` tokens are accepted.
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }
}

impl Default for ANumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ANumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract_all(&self, text: &str, _lines: &[String]) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        for caps in A_NUMBER_LABELED.captures_iter(text) {
            let value = digits_only(&caps[1]);
            if LABELED_DIGITS.contains(&value.len()) && !results.iter().any(|r| r.value == value) {
                results.push(ExtractionMatch::new(value, Strategy::Labeled, &caps[0]));
            }
        }

        if !self.standalone {
            return results;
        }

        for caps in A_NUMBER_TOKEN.captures_iter(text) {
            let value = digits_only(&caps[1]);
            if !results.iter().any(|r| r.value == value) {
                results.push(ExtractionMatch::new(value, Strategy::Standalone, &caps[0]));
            }
        }

        results
    }
}

/// Extract the A-Number from text.
pub fn extract_a_number(text: &str) -> Option<String> {
    ANumberExtractor::new().extract(text, &[]).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labeled_with_spaces() {
        assert_eq!(extract_a_number("A-Number: 123 456 789"), Some("123456789".to_string()));
    }

    #[test]
    fn test_label_variants() {
        assert_eq!(
            extract_a_number("Alien Registration A Number (if any) A- 012-345-678"),
            Some("012345678".to_string())
        );
        assert_eq!(extract_a_number("a number 98765432"), Some("98765432".to_string()));
        assert_eq!(extract_a_number("A No. 1234 5678 9"), Some("123456789".to_string()));
    }

    #[test]
    fn test_label_does_not_cross_lines() {
        let text = "A-Number (if any)\nDate of Birth 01/02/1990\nA098765432";
        let result = ANumberExtractor::new().extract(text, &[]).unwrap();
        assert_eq!(result.value, "098765432");
        assert_eq!(result.strategy, Strategy::Standalone);
    }

    #[test]
    fn test_labeled_takes_precedence() {
        let text = "Receipt A111111111\nA-Number: 222 222 222";
        let results = ANumberExtractor::new().extract_all(text, &[]);

        assert_eq!(results[0].value, "222222222");
        assert_eq!(results[0].strategy, Strategy::Labeled);
        assert_eq!(results[1].value, "111111111");
    }

    #[test]
    fn test_token_variants() {
        assert_eq!(extract_a_number("ID A12345678 issued"), Some("12345678".to_string()));
        assert_eq!(extract_a_number("ID A-123-456-789"), Some("123456789".to_string()));
        assert_eq!(extract_a_number("A1234567"), None);
        assert_eq!(extract_a_number("A12345678901"), None);
        assert_eq!(extract_a_number("XA123456789"), None);
    }

    #[test]
    fn test_standalone_disabled() {
        let extractor = ANumberExtractor::new().with_standalone(false);
        assert!(extractor.extract("A123456789", &[]).is_none());
    }

    #[test]
    fn test_no_match_and_digits_only() {
        assert_eq!(extract_a_number("a notice dated 12/2020"), None);
        assert_eq!(extract_a_number(""), None);

        let text = "A-Number 1-2-3 4-5-6 7-8-9\nA 99";
        for m in ANumberExtractor::new().extract_all(text, &[]) {
            assert!(m.value.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
