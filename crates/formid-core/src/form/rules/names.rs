//! Applicant name extraction (family, given, middle).

use regex::Regex;

use crate::models::config::NamePrecedence;

use super::patterns::{
    FIELD_LABEL_WORDS, FIRST_NAME_INLINE, FIRST_NAME_LABELS, GROUPED_HEADER_FOLLOW,
    GROUPED_HEADER_LEAD, LAST_NAME_INLINE, LAST_NAME_LABELS, MIDDLE_NAME_INLINE,
    MIDDLE_NAME_LABELS, NAME_LABEL_WORDS,
};
use super::{ExtractionMatch, FieldExtractor, Strategy, fold, has_word, trim_token};

/// Name parts recovered from a page. Missing parts are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub last: String,
    pub first: String,
    pub middle: String,
}

impl NameParts {
    pub fn is_empty(&self) -> bool {
        self.last.is_empty() && self.first.is_empty() && self.middle.is_empty()
    }

    /// Fill empty parts from `other`.
    pub fn fill_from(&mut self, other: &NameParts) {
        for (slot, value) in [
            (&mut self.last, &other.last),
            (&mut self.first, &other.first),
            (&mut self.middle, &other.middle),
        ] {
            if slot.is_empty() && !value.is_empty() {
                slot.clone_from(value);
            }
        }
    }
}

/// Name field extractor combining the grouped-header, inline, and
/// per-label strategies.
#[derive(Debug, Default)]
pub struct NameExtractor {
    precedence: NamePrecedence,
}

impl NameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which strategy family is tried first.
    pub fn with_precedence(mut self, precedence: NamePrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Combine candidates into one set of parts.
    ///
    /// A grouped-header candidate is positionally correlated, so once it is
    /// applied no later candidate contributes. Other candidates only fill
    /// parts that are still empty.
    pub fn resolve(&self, lines: &[String]) -> NameParts {
        let mut parts = NameParts::default();
        for candidate in self.extract_all("", lines) {
            parts.fill_from(&candidate.value);
            if candidate.strategy == Strategy::GroupedHeader {
                break;
            }
        }
        parts
    }
}

impl FieldExtractor for NameExtractor {
    type Output = ExtractionMatch<NameParts>;

    fn extract_all(&self, _text: &str, lines: &[String]) -> Vec<Self::Output> {
        let grouped = grouped_header(lines);
        let fallbacks = [inline_labels(lines), per_label(lines)];

        let ordered: Vec<Option<Self::Output>> = match self.precedence {
            NamePrecedence::GroupedFirst => std::iter::once(grouped).chain(fallbacks).collect(),
            NamePrecedence::PerLabelFirst => fallbacks.into_iter().chain(std::iter::once(grouped)).collect(),
        };
        ordered.into_iter().flatten().collect()
    }
}

/// Extract names with the default precedence.
pub fn extract_names(lines: &[String]) -> NameParts {
    NameExtractor::new().resolve(lines)
}

fn is_grouped_header(line: &str) -> bool {
    let folded = fold(line);
    folded
        .find(GROUPED_HEADER_LEAD)
        .is_some_and(|pos| folded[pos + GROUPED_HEADER_LEAD.len()..].contains(GROUPED_HEADER_FOLLOW))
}

/// Split a value line into last, first, and the remaining tokens as middle.
fn split_positional(line: &str) -> NameParts {
    let tokens: Vec<&str> = line
        .split_whitespace()
        .map(trim_token)
        .filter(|t| !t.is_empty())
        .collect();

    NameParts {
        last: tokens.first().map(|s| s.to_string()).unwrap_or_default(),
        first: tokens.get(1).map(|s| s.to_string()).unwrap_or_default(),
        middle: tokens.get(2..).map(|rest| rest.join(" ")).unwrap_or_default(),
    }
}

/// Composite header followed by a line of positional values.
pub fn grouped_header(lines: &[String]) -> Option<ExtractionMatch<NameParts>> {
    let index = lines.iter().position(|line| is_grouped_header(line))?;
    let value_line = lines.get(index + 1)?;

    // A second label row means the values are laid out elsewhere
    if has_word(value_line, "name") {
        return None;
    }

    let parts = split_positional(value_line);
    if parts.is_empty() {
        return None;
    }
    Some(ExtractionMatch::new(parts, Strategy::GroupedHeader, value_line.as_str()))
}

/// Whether `tokens[i]` starts the label of a different field.
fn starts_label(tokens: &[&str], i: usize) -> bool {
    let lower = tokens[i].to_ascii_lowercase();
    let next = tokens.get(i + 1).map(|t| t.to_ascii_lowercase()).unwrap_or_default();

    if NAME_LABEL_WORDS.contains(&lower.as_str()) && next.starts_with("name") {
        return true;
    }
    // A lone "A" is a middle initial unless "Number", "No." or "#" follows
    if lower == "a" {
        return next.starts_with("number") || next.starts_with("no") || next.starts_with('#');
    }
    FIELD_LABEL_WORDS.contains(&lower.as_str())
}

/// Cut an inline capture where the next label on the same line starts.
///
/// When no known label is found but the capture runs into a colon, its
/// last token is the unknown label and is dropped.
fn inline_value(capture: &str, followed_by_colon: bool) -> String {
    let tokens: Vec<&str> = capture.split_whitespace().collect();
    let end = (0..tokens.len())
        .find(|&i| starts_label(&tokens, i))
        .unwrap_or_else(|| {
            if followed_by_colon {
                tokens.len().saturating_sub(1)
            } else {
                tokens.len()
            }
        });

    let kept: Vec<&str> = tokens[..end]
        .iter()
        .map(|t| trim_token(t))
        .filter(|t| !t.is_empty())
        .collect();

    if kept.iter().any(|t| t.eq_ignore_ascii_case("name")) {
        return String::new();
    }
    kept.join(" ")
}

fn first_inline(lines: &[String], pattern: &Regex) -> Option<(String, String)> {
    lines.iter().find_map(|line| {
        let capture = pattern.captures(line)?.get(1)?;
        let followed_by_colon = line[capture.end()..].trim_start().starts_with(':');
        let value = inline_value(capture.as_str(), followed_by_colon);
        (!value.is_empty()).then(|| (value, line.clone()))
    })
}

/// Values on the same line as their labels ("Last Name: Garcia").
pub fn inline_labels(lines: &[String]) -> Option<ExtractionMatch<NameParts>> {
    let mut parts = NameParts::default();
    let mut sources = Vec::new();

    for (slot, pattern) in [
        (&mut parts.last, &*LAST_NAME_INLINE),
        (&mut parts.first, &*FIRST_NAME_INLINE),
        (&mut parts.middle, &*MIDDLE_NAME_INLINE),
    ] {
        if let Some((value, source)) = first_inline(lines, pattern) {
            *slot = value;
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(ExtractionMatch::new(parts, Strategy::Inline, sources.join("\n")))
}

/// Value for the first line carrying one of `labels`.
///
/// Scans forward from the label line and returns the first line that does
/// not itself contain the word "name"; empty when the text ends first.
fn nearest_value(lines: &[String], labels: &[&str]) -> Option<String> {
    let index = lines.iter().position(|line| {
        let folded = fold(line);
        labels.iter().any(|label| folded.contains(label))
    })?;

    let value = lines[index + 1..]
        .iter()
        .find(|line| !has_word(line, "name"))
        .map(|line| {
            line.split_whitespace()
                .map(trim_token)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    Some(value)
}

/// Separate label lines, each followed by its value line.
pub fn per_label(lines: &[String]) -> Option<ExtractionMatch<NameParts>> {
    let last = nearest_value(lines, &LAST_NAME_LABELS);
    let first = nearest_value(lines, &FIRST_NAME_LABELS);
    let middle = nearest_value(lines, &MIDDLE_NAME_LABELS);

    if last.is_none() && first.is_none() && middle.is_none() {
        return None;
    }

    let parts = NameParts {
        last: last.unwrap_or_default(),
        first: first.unwrap_or_default(),
        middle: middle.unwrap_or_default(),
    };
    if parts.is_empty() {
        return None;
    }
    Some(ExtractionMatch::new(parts, Strategy::PerLabel, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn parts(last: &str, first: &str, middle: &str) -> NameParts {
        NameParts {
            last: last.to_string(),
            first: first.to_string(),
            middle: middle.to_string(),
        }
    }

    #[test]
    fn test_grouped_header() {
        let page = lines(&[
            "Part 1. Information About You",
            "Family Name (Last Name)    Given Name    Middle Name",
            "Garcia Maria Elena",
            "Other Names Used",
        ]);
        let found = grouped_header(&page).unwrap();

        assert_eq!(found.value, parts("Garcia", "Maria", "Elena"));
        assert_eq!(found.strategy, Strategy::GroupedHeader);
        assert_eq!(extract_names(&page), parts("Garcia", "Maria", "Elena"));
    }

    #[test]
    fn test_grouped_header_missing_tokens() {
        let page = lines(&["Family Name (Last Name) Given Name (First Name)", "Nguyen,"]);
        assert_eq!(extract_names(&page), parts("Nguyen", "", ""));
    }

    #[test]
    fn test_grouped_header_extra_tokens_join_middle() {
        let page = lines(&["FAMILY NAME (LAST NAME) GIVEN NAME MIDDLE NAME", "de Souza Ana Clara"]);
        assert_eq!(grouped_header(&page).unwrap().value, parts("de", "Souza", "Ana Clara"));
    }

    #[test]
    fn test_grouped_header_needs_both_labels_in_order() {
        assert!(grouped_header(&lines(&["Given Name Family Name (Last Name)", "Maria Garcia"])).is_none());
        assert!(grouped_header(&lines(&["Family Name (Last Name)", "Garcia"])).is_none());
        assert!(grouped_header(&lines(&["Family Name (Last Name) Given Name"])).is_none());
    }

    #[test]
    fn test_inline_labels() {
        let page = lines(&["Last Name: Garcia First Name: Maria", "Middle Name - Elena"]);
        let found = inline_labels(&page).unwrap();

        assert_eq!(found.value, parts("Garcia", "Maria", "Elena"));
        assert_eq!(found.strategy, Strategy::Inline);
    }

    #[test]
    fn test_inline_stops_at_other_field_labels() {
        let page = lines(&["Last Name: Garcia    Date of Birth: 01/02/1990"]);
        assert_eq!(extract_names(&page).last, "Garcia");

        let page = lines(&["Last Name: GARCIA    A-Number: 123456789"]);
        assert_eq!(extract_names(&page).last, "GARCIA");

        let page = lines(&["Last Name: Garcia Date of Birth: 01/02/1990"]);
        assert_eq!(extract_names(&page).last, "Garcia");

        let page = lines(&["Last Name: Garcia\tSex: F"]);
        assert_eq!(extract_names(&page).last, "Garcia");
    }

    #[test]
    fn test_inline_drops_unknown_label_before_colon() {
        let page = lines(&["Last Name: Garcia Lopez Occupation: Teacher"]);
        assert_eq!(inline_labels(&page).unwrap().value.last, "Garcia Lopez");
    }

    #[test]
    fn test_inline_keeps_middle_initial() {
        let page = lines(&["Given Name: Maria Middle Name: A"]);
        let found = inline_labels(&page).unwrap();
        assert_eq!(found.value.first, "Maria");
        assert_eq!(found.value.middle, "A");
    }

    #[test]
    fn test_inline_with_parenthetical() {
        let page = lines(&["Family Name (Last Name): O'Brien"]);
        assert_eq!(inline_labels(&page).unwrap().value.last, "O'Brien");
    }

    #[test]
    fn test_per_label_nearest_value() {
        let page = lines(&[
            "Family Name",
            "(Last Name)",
            "Garcia",
            "Given Name",
            "Maria",
            "Middle Name",
        ]);
        let found = per_label(&page).unwrap();

        assert_eq!(found.value, parts("Garcia", "Maria", ""));
        assert_eq!(found.strategy, Strategy::PerLabel);
        assert_eq!(extract_names(&page), parts("Garcia", "Maria", ""));
    }

    #[test]
    fn test_grouped_preferred_over_per_label() {
        let page = lines(&[
            "Family Name (Last Name)    Given Name    Middle Name",
            "Garcia Maria Elena",
            "Given Name",
            "Rosa",
        ]);
        assert_eq!(extract_names(&page), parts("Garcia", "Maria", "Elena"));

        let per_label_first = NameExtractor::new().with_precedence(NamePrecedence::PerLabelFirst);
        let resolved = per_label_first.resolve(&page);
        assert_eq!(resolved.last, "Garcia Maria Elena");
    }

    #[test]
    fn test_fallback_fills_missing_parts() {
        let page = lines(&["Last Name: Garcia", "Given Name", "Maria"]);
        assert_eq!(extract_names(&page), parts("Garcia", "Maria", ""));
    }

    #[test]
    fn test_no_labels() {
        let page = lines(&["Department of Homeland Security", "Garcia Maria Elena"]);
        assert!(NameExtractor::new().extract_all("", &page).is_empty());
        assert_eq!(extract_names(&page), NameParts::default());
        assert_eq!(extract_names(&[]), NameParts::default());
    }
}
