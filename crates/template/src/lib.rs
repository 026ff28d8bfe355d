//! Template Engine - JSON template rendering and PDF filling
//!
//! This crate provides:
//! - Template JSON schema types
//! - Field and table rendering into drawing primitives
//! - Page composition (stand-alone pages and transparent overlays)
//! - Native form filling and template import from fillable PDFs
//! - The fill engine, which falls back through native fill, two overlay
//!   merge techniques and a stand-alone render
//!
//! # Example
//!
//! ```ignore
//! use template::{parse_template, FillEngine};
//!
//! let template = parse_template(template_json)?;
//! let data: serde_json::Value = serde_json::from_str(data_json)?;
//! let rendered = FillEngine::new().render(&template, &data, Some(Path::new("form.pdf")))?;
//! std::fs::write("out.pdf", &rendered.bytes)?;
//! ```

mod compositor;
mod config;
mod engine;
mod import;
mod native;
pub mod parser;
mod renderer;
mod schema;
mod table;

pub use compositor::PageCompositor;
pub use config::{Clock, EngineConfig, FixedClock, SystemClock};
pub use engine::{FillEngine, Rendered, Strategy};
pub use import::import_template;
pub use native::fill_native_fields;
pub use parser::parse_template;
pub use renderer::{format_date, is_checked, render_field, truncate, RenderMode};
pub use schema::*;
pub use table::render_table;

use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template: {0}")]
    ParseError(String),

    #[error("PDF generation failed: {0}")]
    Generation(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
