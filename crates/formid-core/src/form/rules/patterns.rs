//! Common regex patterns for immigration form extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Form identifiers ("Form I-485", OCR often reads the I as 1 or l)
    pub static ref FORM_NUMBER_LABELED: Regex = Regex::new(
        r"(?i)\bForm\s+[Il1|]\s?-\s?(\d{1,4}[A-Z]?)\b"
    ).unwrap();

    pub static ref FORM_NUMBER_STANDALONE: Regex = Regex::new(
        r"(?i)\bI\s?-\s?(\d{1,4}[A-Z]?)\b"
    ).unwrap();

    // A-Number after its label; the digit run may contain spaces and hyphens
    pub static ref A_NUMBER_LABELED: Regex = Regex::new(
        r"(?i)\bA[\s-]?(?:Number|No\b\.?|#)[^\d\n]{0,40}?(\d[\d \t-]*\d)"
    ).unwrap();

    // A-Number token without a label ("A123456789", "A-123-456-789")
    pub static ref A_NUMBER_TOKEN: Regex = Regex::new(
        r"(?i)\bA-?(\d{8,10}|\d{3}-\d{3}-\d{3})\b"
    ).unwrap();

    // "Last Name: Garcia", "Family Name (Last Name) - Garcia"; the value ends
    // at a column gap (two spaces or a tab) or at the next colon
    pub static ref LAST_NAME_INLINE: Regex = Regex::new(
        r"(?i)\b(?:family|last)\s+name(?:\s*\([^)]*\))?\s*[:\-]\s*([A-Za-z][A-Za-z'\-]*(?: [A-Za-z'\-]+)*)"
    ).unwrap();

    pub static ref FIRST_NAME_INLINE: Regex = Regex::new(
        r"(?i)\b(?:given|first)\s+name(?:\s*\([^)]*\))?\s*[:\-]\s*([A-Za-z][A-Za-z'\-]*(?: [A-Za-z'\-]+)*)"
    ).unwrap();

    pub static ref MIDDLE_NAME_INLINE: Regex = Regex::new(
        r"(?i)\bmiddle\s+name(?:\s*\([^)]*\))?\s*[:\-]\s*([A-Za-z][A-Za-z'\-]*(?: [A-Za-z'\-]+)*)"
    ).unwrap();

    // Array indices in qualified widget names ("Line1_FamilyName[0]")
    pub static ref WIDGET_INDEX: Regex = Regex::new(r"\[\d+\]").unwrap();
}

/// Labels in folded form.
pub const LAST_NAME_LABELS: [&str; 2] = ["family name", "last name"];
pub const FIRST_NAME_LABELS: [&str; 2] = ["given name", "first name"];
pub const MIDDLE_NAME_LABELS: [&str; 1] = ["middle name"];

/// Composite header "Family Name (Last Name) Given Name ..." in folded form.
pub const GROUPED_HEADER_LEAD: &str = "family name last name";
pub const GROUPED_HEADER_FOLLOW: &str = "given name";

/// Words that start a name label.
pub const NAME_LABEL_WORDS: [&str; 5] = ["family", "last", "given", "first", "middle"];

/// Words that start another field's label on a name row.
pub const FIELD_LABEL_WORDS: [&str; 20] = [
    "date", "dob", "birth", "sex", "gender", "uscis", "alien", "a-number", "anumber", "ssn",
    "social", "country", "city", "address", "phone", "email", "signature", "citizenship",
    "nationality", "receipt",
];
