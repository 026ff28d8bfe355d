//! Template import from fillable PDFs

use crate::schema::{Field, FieldKind, FontWeight, Template};
use crate::Result;
use log::debug;
use pdf_core::coords::to_editor_y;
use pdf_core::{FormField, FormFieldKind, PdfDocument};

/// Name given to imported templates
const IMPORTED_NAME: &str = "Imported PDF Template";

/// Build a template from the interactive form of a PDF
///
/// Widgets on the first page become fields positioned where the widgets
/// sit. If none of them carry a usable rectangle, the text fields are
/// stacked down the left margin instead.
///
/// # Errors
/// Fails if the PDF cannot be parsed or has no interactive form.
pub fn import_template(pdf: &[u8]) -> Result<Template> {
    let doc = PdfDocument::open_from_bytes(pdf)?;
    let form_fields = doc.form_fields()?;
    let (page_width, page_height) = doc.page_size(1)?;

    let mut fields: Vec<Field> = form_fields
        .iter()
        .filter(|f| f.page == Some(1))
        .filter_map(|f| positioned_field(f, page_height))
        .collect();

    if fields.is_empty() {
        fields = form_fields
            .iter()
            .filter(|f| f.kind == FormFieldKind::Text)
            .enumerate()
            .map(|(i, f)| stacked_field(f, i))
            .collect();
    }

    debug!("Imported {} fields from fillable PDF", fields.len());

    Ok(Template {
        name: IMPORTED_NAME.to_string(),
        description: Some(format!("Imported from PDF with {} fields", fields.len())),
        fields,
        page_width: page_width.round(),
        page_height: page_height.round(),
        background_path: None,
    })
}

/// `Customer Name` becomes `customer_name`
fn field_key(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

fn field_kind(kind: FormFieldKind) -> FieldKind {
    match kind {
        FormFieldKind::Choice => FieldKind::Select,
        FormFieldKind::Button => FieldKind::Checkbox,
        _ => FieldKind::Text,
    }
}

fn positioned_field(form_field: &FormField, page_height: f64) -> Option<Field> {
    let [llx, lly, urx, ury] = form_field.rect?;
    let (width, height) = (urx - llx, ury - lly);
    let y = to_editor_y(lly, height, page_height);

    Some(
        Field::new(
            field_key(&form_field.name),
            field_kind(form_field.kind),
            llx.round(),
            y.round(),
            width.round(),
            height.round(),
        )
        .with_label(form_field.name.as_str())
        .with_font(
            "Helvetica",
            form_field.font_size.unwrap_or(12.0).round(),
            FontWeight::Normal,
        ),
    )
}

fn stacked_field(form_field: &FormField, index: usize) -> Field {
    Field::new(
        field_key(&form_field.name),
        FieldKind::Text,
        50.0,
        100.0 + 40.0 * index as f64,
        200.0,
        20.0,
    )
    .with_label(form_field.name.as_str())
}
