//! Output record written for every processed document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the identity fields recovered from a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FormNumber,
    ANumber,
    LastName,
    FirstName,
    MiddleName,
}

impl Field {
    /// All fields in output order.
    pub const ALL: [Field; 5] = [
        Field::FormNumber,
        Field::ANumber,
        Field::LastName,
        Field::FirstName,
        Field::MiddleName,
    ];

    /// Key used in the JSON record.
    pub fn key(self) -> &'static str {
        match self {
            Field::FormNumber => "FormNumber",
            Field::ANumber => "A-Number",
            Field::LastName => "LastName",
            Field::FirstName => "FirstName",
            Field::MiddleName => "MiddleName",
        }
    }
}

/// Extracted identity fields. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(rename = "FormNumber", default)]
    pub form_number: String,
    #[serde(rename = "A-Number", default)]
    pub a_number: String,
    #[serde(rename = "LastName", default)]
    pub last_name: String,
    #[serde(rename = "FirstName", default)]
    pub first_name: String,
    #[serde(rename = "MiddleName", default)]
    pub middle_name: String,
}

impl FieldRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FormNumber => &self.form_number,
            Field::ANumber => &self.a_number,
            Field::LastName => &self.last_name,
            Field::FirstName => &self.first_name,
            Field::MiddleName => &self.middle_name,
        }
    }

    pub(crate) fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::FormNumber => &mut self.form_number,
            Field::ANumber => &mut self.a_number,
            Field::LastName => &mut self.last_name,
            Field::FirstName => &mut self.first_name,
            Field::MiddleName => &mut self.middle_name,
        }
    }

    /// Number of fields holding a value.
    pub fn filled(&self) -> usize {
        Field::ALL.iter().filter(|f| !self.get(**f).is_empty()).count()
    }

    /// Fields with no value.
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_empty())
            .collect()
    }
}

/// Pipeline outcome reported in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Processed,
    Error,
}

/// Closed set of fatal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The object could not be fetched or opened as a PDF, or has no pages.
    InputUnreadable,
    /// OCR was required but no engine or renderer could run.
    OcrUnavailable,
    /// The OCR engine returned an error.
    OcrFailed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::InputUnreadable => "input_unreadable",
            FailureKind::OcrUnavailable => "ocr_unavailable",
            FailureKind::OcrFailed => "ocr_failed",
        };
        f.write_str(name)
    }
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(flatten)]
    pub fields: FieldRecord,

    #[serde(rename = "Status")]
    pub status: Status,

    /// Whether the text came from OCR rather than the embedded layer.
    #[serde(rename = "UsedOCR", default)]
    pub used_ocr: bool,

    /// Identifier of the processed object.
    #[serde(rename = "Source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(rename = "ErrorKind", default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(rename = "ProcessedAt")]
    pub processed_at: DateTime<Utc>,
}

impl ExtractionResult {
    /// A successful result.
    pub fn processed(fields: FieldRecord, used_ocr: bool, source: Option<String>) -> Self {
        Self {
            fields,
            status: Status::Processed,
            used_ocr,
            source,
            failure: None,
            error: None,
            processed_at: Utc::now(),
        }
    }

    /// A failure result with every field empty.
    pub fn failed(
        kind: FailureKind,
        message: impl Into<String>,
        used_ocr: bool,
        source: Option<String>,
    ) -> Self {
        Self {
            fields: FieldRecord::default(),
            status: Status::Error,
            used_ocr,
            source,
            failure: Some(kind),
            error: Some(message.into()),
            processed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Processed
    }

    /// Serialize as the pretty JSON document written to the store.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
