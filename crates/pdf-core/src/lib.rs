//! PDF Core - Low-level PDF manipulation
//!
//! This crate provides functionality for:
//! - Converting editor (top-left origin) coordinates to page content space
//! - Encoding drawing primitives (rectangles, lines, text) as content streams
//! - Assembling single-page documents with the built-in font set
//! - Merging an overlay page onto an existing PDF (two interchangeable back-ends)
//! - Flattening interactive forms and filling native form fields
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{BuiltinFont, Color, DrawOp, PageSpec, PdfDocument};
//!
//! let ops = vec![DrawOp::text(100.0, 578.0, "42.50", BuiltinFont::Helvetica, 12.0, Color::black())];
//! let mut doc = PdfDocument::single_page(&PageSpec::new(612.0, 792.0), &ops)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod content;
pub mod coords;
mod document;
mod flatten;
mod font;
mod form;
mod overlay;

pub use content::{encode_ops, escape_literal, Color, DrawOp, Point, Stroke};
pub use document::{PageSpec, PdfDocument};
pub use flatten::flatten;
pub use font::BuiltinFont;
pub use form::{FieldValue, FormField, FormFieldKind};
pub use overlay::{ContentAppendMerge, FormXObjectMerge, MergeBackend};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("Document has no interactive form")]
    NoForm,

    #[error("Merge failed: {0}")]
    MergeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
