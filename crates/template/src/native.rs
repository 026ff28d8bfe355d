//! Native form filling
//!
//! Fills the background's own interactive form instead of drawing an
//! overlay. Template fields are matched to form fields by exact name.

use crate::parser::{lookup, value_to_string};
use crate::renderer::{format_date, is_checked};
use crate::schema::{FieldKind, Template};
use crate::Result;
use log::debug;
use pdf_core::{FieldValue, FormFieldKind, PdfDocument, PdfError};
use serde_json::Value;
use std::collections::HashMap;

/// Fill the background's native form fields from `data`
///
/// Returns `None` when this approach does not apply: the background has no
/// interactive form, no template field with a data entry matches a form
/// field, or the document cannot be read or written. Unmatched form fields
/// keep their existing values and nothing is flattened. The result keeps
/// only the background's first page.
pub fn fill_native_fields(background: &[u8], template: &Template, data: &Value) -> Option<Vec<u8>> {
    match try_fill(background, template, data) {
        Ok(filled) => filled,
        Err(e) => {
            debug!("Native fill not applicable: {e}");
            None
        }
    }
}

fn try_fill(background: &[u8], template: &Template, data: &Value) -> Result<Option<Vec<u8>>> {
    let mut doc = PdfDocument::open_from_bytes(background)?;
    let form_fields = match doc.form_fields() {
        Ok(fields) => fields,
        Err(PdfError::NoForm) => {
            debug!("Background has no interactive form");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let native_kinds: HashMap<&str, FormFieldKind> = form_fields
        .iter()
        .map(|f| (f.name.as_str(), f.kind))
        .collect();

    let mut values = HashMap::new();
    for field in &template.fields {
        if matches!(field.kind, FieldKind::Label | FieldKind::Table) {
            continue;
        }
        let Some(kind) = native_kinds.get(field.name.as_str()) else {
            continue;
        };
        let Some(value) = lookup(data, &field.name) else {
            continue;
        };

        let value = match (kind, field.kind) {
            (FormFieldKind::Button, _) | (_, FieldKind::Checkbox) => {
                FieldValue::Checked(is_checked(Some(value)))
            }
            (_, FieldKind::Date) => FieldValue::Text(format_date(&value_to_string(value))),
            _ => FieldValue::Text(value_to_string(value)),
        };
        values.insert(field.name.clone(), value);
    }

    if values.is_empty() {
        debug!("No template field matches a native form field");
        return Ok(None);
    }

    let filled = doc.fill_form(&values)?;
    if filled == 0 {
        return Ok(None);
    }
    debug!("Filled {filled} native form fields");
    doc.trim_to_first_page()?;
    Ok(Some(doc.to_bytes()?))
}
