//! Interactive form field values from widget annotations.

use lopdf::{Dictionary, Document, Object};
use tracing::{debug, trace};

use super::{PdfDocument, Result};
use crate::error::PdfError;

/// A filled form field found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// Fully qualified field name (`parent.child`).
    pub name: String,
    /// Field value as text.
    pub value: String,
}

// Field hierarchies are shallow; the bound guards against /Parent cycles.
const MAX_FIELD_DEPTH: usize = 16;

impl PdfDocument {
    /// Collect non-empty widget values of a 1-indexed page.
    ///
    /// Flattened PDFs have no widgets and yield an empty list.
    pub fn form_fields(&self, page: u32) -> Result<Vec<FormField>> {
        let page_id = self.page_id(page)?;
        let doc = self.inner();

        let page_dict = doc
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| PdfError::Parse(format!("failed to get page dictionary: {}", e)))?;

        let annots = match page_dict.get(b"Annots") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };
        let annots = match doc.dereference(annots) {
            Ok((_, Object::Array(arr))) => arr,
            _ => return Ok(Vec::new()),
        };

        let mut fields = Vec::new();
        for entry in annots {
            let Ok((_, Object::Dictionary(annot))) = doc.dereference(entry) else {
                continue;
            };

            let is_widget = matches!(annot.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Widget");
            if !is_widget {
                continue;
            }

            let name = qualified_name(doc, annot);
            let Some(value) = inherited_value(doc, annot) else {
                continue;
            };

            trace!("Widget field {:?} = {:?}", name, value);
            if !name.is_empty() && !value.trim().is_empty() {
                fields.push(FormField {
                    name,
                    value: value.trim().to_string(),
                });
            }
        }

        debug!("Found {} filled form fields on page {}", fields.len(), page);
        Ok(fields)
    }
}

fn parent<'a>(doc: &'a Document, dict: &Dictionary) -> Option<&'a Dictionary> {
    match dict.get(b"Parent") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok()?.as_dict().ok(),
        _ => None,
    }
}

fn qualified_name(doc: &Document, widget: &Dictionary) -> String {
    let mut parts = Vec::new();
    if let Some(t) = text_entry(doc, widget, b"T") {
        parts.push(t);
    }

    let mut node = parent(doc, widget);
    for _ in 0..MAX_FIELD_DEPTH {
        let Some(dict) = node else { break };
        if let Some(t) = text_entry(doc, dict, b"T") {
            parts.push(t);
        }
        node = parent(doc, dict);
    }

    parts.reverse();
    parts.join(".")
}

fn inherited_value(doc: &Document, widget: &Dictionary) -> Option<String> {
    if let Some(v) = text_entry(doc, widget, b"V") {
        return Some(v);
    }

    let mut node = parent(doc, widget);
    for _ in 0..MAX_FIELD_DEPTH {
        let dict = node?;
        if let Some(v) = text_entry(doc, dict, b"V") {
            return Some(v);
        }
        node = parent(doc, dict);
    }
    None
}

fn text_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = dict.get(key).ok()?;
    let (_, obj) = doc.dereference(obj).ok()?;

    match obj {
        Object::String(..) => match lopdf::decode_text_string(obj) {
            Ok(text) => Some(text.trim_start_matches('\u{feff}').to_string()),
            Err(e) => {
                trace!("Undecodable /{} text string: {}", String::from_utf8_lossy(key), e);
                None
            }
        },
        // Checkbox and radio states; "Off" means unset.
        Object::Name(name) if name.as_slice() != b"Off" => {
            Some(String::from_utf8_lossy(name).into_owned())
        }
        _ => None,
    }
}
