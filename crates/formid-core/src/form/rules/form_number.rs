//! Form identifier extraction ("I-485", "I-130A").

use super::patterns::{FORM_NUMBER_LABELED, FORM_NUMBER_STANDALONE};
use super::{ExtractionMatch, FieldExtractor, Strategy};

/// Form number field extractor.
#[derive(Debug, Default)]
pub struct FormNumberExtractor;

impl FormNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn canonical(code: &str) -> String {
    format!("I-{}", code.to_ascii_uppercase())
}

impl FieldExtractor for FormNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract_all(&self, text: &str, _lines: &[String]) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        // "Form I-485" first
        for caps in FORM_NUMBER_LABELED.captures_iter(text) {
            let value = canonical(&caps[1]);
            if !results.iter().any(|r| r.value == value) {
                results.push(ExtractionMatch::new(value, Strategy::Labeled, &caps[0]));
            }
        }

        for caps in FORM_NUMBER_STANDALONE.captures_iter(text) {
            let value = canonical(&caps[1]);
            if !results.iter().any(|r| r.value == value) {
                results.push(ExtractionMatch::new(value, Strategy::Standalone, &caps[0]));
            }
        }

        results
    }
}

/// Extract the form number from text.
pub fn extract_form_number(text: &str) -> Option<String> {
    FormNumberExtractor::new().extract(text, &[]).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labeled_with_suffix() {
        assert_eq!(
            extract_form_number("USCIS\nForm I-485A\nSupplement A"),
            Some("I-485A".to_string())
        );
    }

    #[test]
    fn test_case_and_spacing_variants() {
        assert_eq!(extract_form_number("form i-130"), Some("I-130".to_string()));
        assert_eq!(extract_form_number("Form I - 765"), Some("I-765".to_string()));
        assert_eq!(extract_form_number("Form 1-485 Edition 01/20/25"), Some("I-485".to_string()));
    }

    #[test]
    fn test_labeled_beats_earlier_standalone() {
        let text = "Attach Form I-94 copy\nsee instructions\nForm I-864";
        let results = FormNumberExtractor::new().extract_all(text, &[]);

        assert_eq!(results[0].value, "I-94");
        assert_eq!(results[0].strategy, Strategy::Labeled);

        let text = "I-94 arrival record\nForm I-864 Affidavit";
        assert_eq!(extract_form_number(text), Some("I-864".to_string()));
    }

    #[test]
    fn test_standalone_fallback() {
        assert_eq!(
            extract_form_number("Edition 04/01/24 I-485 Page 1 of 20"),
            Some("I-485".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_form_number("Application to Adjust Status"), None);
        assert_eq!(extract_form_number("FI-485 12345"), None);
        assert_eq!(extract_form_number(""), None);
    }
}
