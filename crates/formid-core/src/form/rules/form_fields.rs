//! Mapping of fillable widget values onto record fields.

use crate::models::record::Field;
use crate::pdf::FormField;

use super::patterns::WIDGET_INDEX;
use super::{digits_only, trim_token};

/// Folded name suffixes and the field each one fills.
const WIDGET_SUFFIXES: [(&str, Field); 9] = [
    ("aliennumber", Field::ANumber),
    ("anumber", Field::ANumber),
    ("familyname", Field::LastName),
    ("lastname", Field::LastName),
    ("givenname", Field::FirstName),
    ("firstname", Field::FirstName),
    ("middlename", Field::MiddleName),
    ("formnumber", Field::FormNumber),
    ("formno", Field::FormNumber),
];

/// Suffixes that look like an A-Number but are not.
const NOT_A_NUMBER: [&str; 2] = ["visanumber", "ssanumber"];

/// Field filled by a widget, judged by the last segment of its name.
///
/// `form1[0].#subform[0].Pt1Line1_FamilyName[0]` folds to
/// `pt1line1familyname` and maps to [`Field::LastName`].
pub fn field_for_widget(name: &str) -> Option<Field> {
    let stripped = WIDGET_INDEX.replace_all(name, "");
    let segment = stripped.rsplit('.').next().unwrap_or_default();
    let folded: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if NOT_A_NUMBER.iter().any(|s| folded.ends_with(s)) {
        return None;
    }

    WIDGET_SUFFIXES
        .iter()
        .find(|(suffix, _)| folded.ends_with(suffix))
        .map(|(_, field)| *field)
}

fn clean_value(field: Field, value: &str) -> String {
    match field {
        Field::ANumber => digits_only(value),
        Field::FormNumber => {
            let code = trim_token(value).to_ascii_uppercase();
            if code.is_empty() || code.starts_with("I-") {
                code
            } else {
                format!("I-{}", code.trim_start_matches('I'))
            }
        }
        _ => value
            .split_whitespace()
            .map(trim_token)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Values from recognized widgets, first widget per field.
pub fn widget_values(fields: &[FormField]) -> Vec<(Field, String)> {
    let mut values: Vec<(Field, String)> = Vec::new();

    for form_field in fields {
        let Some(field) = field_for_widget(&form_field.name) else {
            continue;
        };
        if values.iter().any(|(f, _)| *f == field) {
            continue;
        }

        let value = clean_value(field, &form_field.value);
        if !value.is_empty() {
            values.push((field, value));
        }
    }

    values
}
