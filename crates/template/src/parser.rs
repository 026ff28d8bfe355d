//! Template JSON parsing and data lookup

use crate::{Result, Template, TemplateError};
use serde_json::Value;

/// Parse a template from JSON string
pub fn parse_template(json: &str) -> Result<Template> {
    serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))
}

/// Look up a field's value in the data map
///
/// Data that is not a JSON object has no entries.
pub fn lookup<'a>(data: &'a Value, name: &str) -> Option<&'a Value> {
    data.as_object()?.get(name)
}

/// Convert a JSON value to string for rendering
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let data = json!({ "name": "John", "total": 42.5 });
        assert_eq!(lookup(&data, "name"), Some(&json!("John")));
        assert_eq!(lookup(&data, "missing"), None);
        assert_eq!(lookup(&json!(["name"]), "name"), None);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("hello")), "hello");
        assert_eq!(value_to_string(&json!("42.50")), "42.50");
        assert_eq!(value_to_string(&json!(42)), "42");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&json!(null)), "");
    }

    #[test]
    fn test_parse_template() {
        let json = r#"{
            "name": "Invoice",
            "pageWidth": 612,
            "pageHeight": 792,
            "fields": [
                { "name": "total", "type": "number", "x": 100, "y": 200, "width": 150, "height": 20 }
            ]
        }"#;

        let template = parse_template(json).unwrap();
        assert_eq!(template.name, "Invoice");
        assert_eq!(template.fields.len(), 1);
        assert_eq!(template.fields[0].name, "total");
    }

    #[test]
    fn test_parse_template_invalid() {
        let result = parse_template("{ \"fields\": [] }");
        assert!(matches!(result, Err(TemplateError::ParseError(_))));
    }
}
