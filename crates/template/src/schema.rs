//! Template JSON schema types

use pdf_core::BuiltinFont;
use serde::{Deserialize, Serialize};

/// Root template structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Template name, unique within a store
    pub name: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Fields in visual order
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Page width in points
    #[serde(default = "default_page_width")]
    pub page_width: f64,

    /// Page height in points
    #[serde(default = "default_page_height")]
    pub page_height: f64,

    /// Background PDF this template was designed against
    #[serde(rename = "pdfFilePath")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_path: Option<String>,
}

fn default_page_width() -> f64 {
    612.0
}

fn default_page_height() -> f64 {
    792.0
}

impl Default for Template {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            fields: Vec::new(),
            page_width: default_page_width(),
            page_height: default_page_height(),
            background_path: None,
        }
    }
}

impl Template {
    /// Create an empty US Letter template
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the page size in points
    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Look up a field by name; the last field wins on duplicates
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().rev().find(|f| f.name == name)
    }
}

/// Kind of a template field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Date,
    Checkbox,
    Select,
    Label,
    Table,
}

/// Font weight
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// A positioned field
///
/// Geometry is in editor coordinates: points from the top-left corner of
/// the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Data key and native form-field name
    pub name: String,

    #[serde(rename = "type")]
    #[serde(default)]
    pub kind: FieldKind,

    /// Display text; falls back to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    #[serde(default = "default_font_size")]
    pub font_size: f64,

    #[serde(default)]
    pub font_weight: FontWeight,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Data rows of a table (header excluded)
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,

    #[serde(default = "default_table_columns")]
    pub table_columns: usize,

    /// Column headers of a table; an empty list means no header row
    #[serde(default)]
    pub table_headers: Vec<String>,

    #[serde(default = "default_cell_width")]
    pub cell_width: f64,

    #[serde(default = "default_cell_height")]
    pub cell_height: f64,
}

fn default_font_size() -> f64 {
    12.0
}

fn default_font_family() -> String {
    "Helvetica".to_string()
}

fn default_table_rows() -> usize {
    3
}

fn default_table_columns() -> usize {
    3
}

fn default_cell_width() -> f64 {
    100.0
}

fn default_cell_height() -> f64 {
    25.0
}

impl Field {
    /// Create a field with default font and table settings
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            x,
            y,
            width,
            height,
            font_size: default_font_size(),
            font_weight: FontWeight::Normal,
            font_family: default_font_family(),
            table_rows: default_table_rows(),
            table_columns: default_table_columns(),
            table_headers: Vec::new(),
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f64, weight: FontWeight) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self.font_weight = weight;
        self
    }

    /// Configure table dimensions and headers
    pub fn with_table(
        mut self,
        rows: usize,
        columns: usize,
        headers: Vec<String>,
        cell_width: f64,
        cell_height: f64,
    ) -> Self {
        self.table_rows = rows;
        self.table_columns = columns;
        self.table_headers = headers;
        self.cell_width = cell_width;
        self.cell_height = cell_height;
        self
    }

    /// Display label
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Built-in font for the field's family and weight
    pub fn font(&self) -> BuiltinFont {
        BuiltinFont::resolve(&self.font_family, self.font_weight == FontWeight::Bold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_defaults() {
        let json = r#"{ "name": "total", "type": "number", "x": 100, "y": 200, "width": 150, "height": 20 }"#;
        let field: Field = serde_json::from_str(json).unwrap();

        assert_eq!(field.kind, FieldKind::Number);
        assert_eq!(field.label(), "total");
        assert_eq!(field.font_size, 12.0);
        assert_eq!(field.font_weight, FontWeight::Normal);
        assert_eq!(field.font(), BuiltinFont::Helvetica);
        assert_eq!(field.table_rows, 3);
        assert_eq!(field.table_columns, 3);
        assert_eq!(field.cell_width, 100.0);
        assert_eq!(field.cell_height, 25.0);
    }

    #[test]
    fn test_table_field_wire_names() {
        let json = r#"{
            "name": "items", "type": "table", "x": 50, "y": 300, "width": 300, "height": 100,
            "tableRows": 2, "tableColumns": 3, "tableHeaders": ["Item", "Qty", "Price"],
            "cellWidth": 120, "cellHeight": 20, "fontWeight": "bold", "fontFamily": "Courier"
        }"#;
        let field: Field = serde_json::from_str(json).unwrap();

        assert_eq!(field.kind, FieldKind::Table);
        assert_eq!(field.table_rows, 2);
        assert_eq!(field.table_headers, vec!["Item", "Qty", "Price"]);
        assert_eq!(field.cell_width, 120.0);
        assert_eq!(field.font(), BuiltinFont::CourierBold);
    }

    #[test]
    fn test_template_defaults_and_background() {
        let json = r#"{ "name": "Invoice", "fields": [], "pdfFilePath": "/forms/invoice.pdf" }"#;
        let template: Template = serde_json::from_str(json).unwrap();

        assert_eq!(template.page_width, 612.0);
        assert_eq!(template.page_height, 792.0);
        assert_eq!(template.background_path.as_deref(), Some("/forms/invoice.pdf"));

        let out = serde_json::to_value(&template).unwrap();
        assert_eq!(out["pdfFilePath"], "/forms/invoice.pdf");
        assert_eq!(out["pageWidth"], 612.0);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let json = r#"{ "name": "sig", "type": "signature", "x": 0, "y": 0, "width": 10, "height": 10 }"#;
        assert!(serde_json::from_str::<Field>(json).is_err());
    }

    #[test]
    fn test_field_lookup_last_wins() {
        let template = Template::new("dup")
            .with_field(Field::new("a", FieldKind::Text, 0.0, 0.0, 10.0, 10.0))
            .with_field(Field::new("a", FieldKind::Number, 5.0, 5.0, 10.0, 10.0));
        assert_eq!(template.field("a").unwrap().kind, FieldKind::Number);
        assert!(template.field("b").is_none());
    }
}
