//! WASM bindings for pdfill
//!
//! This crate provides JavaScript-friendly API for:
//! - Loading templates and background PDFs
//! - Rendering PDFs with data (native fill, overlay merge or stand-alone)
//! - Importing templates from fillable PDFs
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { PdfTemplate, importTemplate } from 'pdfill-wasm';
//!
//! await init();
//!
//! // Load template
//! const template = PdfTemplate.fromJson(templateJson);
//! template.loadBasePdf(pdfBytes);
//!
//! // Render
//! const output = template.render({ total: "42.50" });
//! console.log(template.lastStrategy);
//!
//! // Or start from a fillable PDF
//! const imported = importTemplate(pdfBytes);
//! ```

use log::{Level, LevelFilter, Log, Metadata, Record};
use serde::Serialize;
use template::{EngineConfig, FillEngine, Strategy, Template};
use wasm_bindgen::prelude::*;

/// Forwards `log` records to the browser console
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&message),
            Level::Warn => web_sys::console::warn_1(&message),
            Level::Info => web_sys::console::info_1(&message),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
}

/// Set console log verbosity
///
/// @param level - One of "off", "error", "warn", "info", "debug", "trace"
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter: LevelFilter = level.parse().map_err(to_js)?;
    log::set_max_level(filter);
    Ok(())
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// PDF Template renderer
#[wasm_bindgen]
pub struct PdfTemplate {
    template: Template,
    background: Option<Vec<u8>>,
    config: EngineConfig,
    last_strategy: Option<Strategy>,
}

#[wasm_bindgen]
impl PdfTemplate {
    /// Create template from JSON
    ///
    /// @param json - Template JSON string
    /// @returns PdfTemplate instance
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<PdfTemplate, JsValue> {
        let template = template::parse_template(json).map_err(to_js)?;
        Ok(PdfTemplate {
            template,
            background: None,
            config: EngineConfig::default(),
            last_strategy: None,
        })
    }

    /// Load background PDF
    ///
    /// @param data - PDF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadBasePdf)]
    pub fn load_base_pdf(&mut self, data: &[u8]) {
        self.background = Some(data.to_vec());
    }

    /// Drop the background PDF; later renders are stand-alone
    #[wasm_bindgen(js_name = clearBasePdf)]
    pub fn clear_base_pdf(&mut self) {
        self.background = None;
    }

    /// Set engine options
    ///
    /// @param config - `{ nativeFill, compressStreams, timestampFormat }`, all optional
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        self.config = serde_wasm_bindgen::from_value(config)?;
        Ok(())
    }

    /// Render PDF with data
    ///
    /// @param data - Data object keyed by field name
    /// @returns PDF bytes (Uint8Array)
    pub fn render(&mut self, data: JsValue) -> Result<Vec<u8>, JsValue> {
        let data_value: serde_json::Value = serde_wasm_bindgen::from_value(data)?;

        let engine = FillEngine::new().with_config(self.config.clone());
        let rendered = engine
            .render_with_background(&self.template, &data_value, self.background.as_deref())
            .map_err(to_js)?;

        self.last_strategy = Some(rendered.strategy);
        Ok(rendered.bytes)
    }

    /// Strategy used by the last successful render
    #[wasm_bindgen(getter, js_name = lastStrategy)]
    pub fn last_strategy(&self) -> Option<String> {
        self.last_strategy.map(|s| s.to_string())
    }

    /// Template as JSON
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.template).map_err(to_js)
    }
}

/// Build a template from a fillable PDF
///
/// @param pdf - PDF file bytes (Uint8Array)
/// @returns Template JSON string
#[wasm_bindgen(js_name = importTemplate)]
pub fn import_template(pdf: &[u8]) -> Result<String, JsValue> {
    let template = template::import_template(pdf).map_err(to_js)?;
    serde_json::to_string(&template).map_err(to_js)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormFieldInfo {
    name: String,
    kind: &'static str,
    value: Option<String>,
    rect: Option<[f64; 4]>,
    page: Option<usize>,
    font_size: Option<f64>,
}

impl From<pdf_core::FormField> for FormFieldInfo {
    fn from(field: pdf_core::FormField) -> Self {
        let kind = match field.kind {
            pdf_core::FormFieldKind::Text => "text",
            pdf_core::FormFieldKind::Button => "button",
            pdf_core::FormFieldKind::Choice => "choice",
            pdf_core::FormFieldKind::Signature => "signature",
            pdf_core::FormFieldKind::Unknown => "unknown",
        };
        Self {
            name: field.name,
            kind,
            value: field.value,
            rect: field.rect,
            page: field.page,
            font_size: field.font_size,
        }
    }
}

/// List the interactive form fields of a PDF
///
/// @param pdf - PDF file bytes (Uint8Array)
/// @returns Array of `{ name, kind, value, rect, page, fontSize }`
#[wasm_bindgen(js_name = listFormFields)]
pub fn list_form_fields(pdf: &[u8]) -> Result<js_sys::Array, JsValue> {
    let doc = pdf_core::PdfDocument::open_from_bytes(pdf).map_err(to_js)?;
    let fields = doc.form_fields().map_err(to_js)?;

    let list = js_sys::Array::new();
    for field in fields {
        list.push(&serde_wasm_bindgen::to_value(&FormFieldInfo::from(field))?);
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    const INVOICE: &str = r#"{
        "name": "Invoice",
        "fields": [
            { "name": "total", "type": "number", "x": 100, "y": 200, "width": 150, "height": 20 }
        ]
    }"#;

    #[wasm_bindgen_test]
    fn test_render_without_background() {
        let mut template = PdfTemplate::from_json(INVOICE).unwrap();
        let bytes = template.render(JsValue::NULL).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(template.last_strategy().as_deref(), Some("standalone"));
    }

    #[wasm_bindgen_test]
    fn test_import_requires_form() {
        let mut template = PdfTemplate::from_json(INVOICE).unwrap();
        let plain = template.render(JsValue::NULL).unwrap();
        assert!(import_template(&plain).is_err());
    }
}
