//! Page composition

use crate::config::{Clock, EngineConfig, SystemClock};
use crate::parser::lookup;
use crate::renderer::{render_field, RenderMode};
use crate::schema::Template;
use crate::Result;
use log::debug;
use pdf_core::{BuiltinFont, Color, DrawOp, PageSpec, PdfDocument};
use serde_json::Value;
use std::fmt::Write;

/// Renders a whole template onto a single page
pub struct PageCompositor<'a> {
    /// The template to render
    template: &'a Template,
    /// Time source for the stand-alone header
    clock: &'a dyn Clock,
    timestamp_format: &'a str,
    compress: bool,
}

impl<'a> PageCompositor<'a> {
    /// Create a compositor using the system clock and default settings
    pub fn new(template: &'a Template) -> Self {
        Self {
            template,
            clock: &SystemClock,
            timestamp_format: "%Y-%m-%d %H:%M:%S",
            compress: true,
        }
    }

    /// Use another time source for the stand-alone header
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Apply timestamp format and compression settings
    pub fn with_config(mut self, config: &'a EngineConfig) -> Self {
        self.timestamp_format = &config.timestamp_format;
        self.compress = config.compress_streams;
        self
    }

    /// Drawing primitives for the whole page, in template field order
    ///
    /// Stand-alone pages start with a header naming the template and the
    /// generation time.
    pub fn draw_ops(&self, data: &Value, mode: RenderMode) -> Vec<DrawOp> {
        let page_height = self.template.page_height;
        let mut ops = Vec::new();

        if mode == RenderMode::Standalone {
            let generated = self.timestamp();
            ops.push(DrawOp::text(
                40.0,
                page_height - 30.0,
                format!("Template: {}", self.template.name),
                BuiltinFont::HelveticaBold,
                10.0,
                Color::black(),
            ));
            ops.push(DrawOp::text(
                40.0,
                page_height - 45.0,
                format!("Generated: {generated}"),
                BuiltinFont::Helvetica,
                8.0,
                Color::black(),
            ));
        }

        for field in &self.template.fields {
            let value = lookup(data, &field.name);
            ops.extend(render_field(field, value, page_height, mode));
        }

        ops
    }

    /// Header timestamp; an unusable format falls back to the default one
    fn timestamp(&self) -> String {
        let now = self.clock.now();
        let mut formatted = String::new();
        if write!(formatted, "{}", now.format(self.timestamp_format)).is_err() {
            formatted = now.format("%Y-%m-%d %H:%M:%S").to_string();
        }
        formatted
    }

    /// Render the page to a complete single-page PDF
    pub fn composite(&self, data: &Value, mode: RenderMode) -> Result<Vec<u8>> {
        let ops = self.draw_ops(data, mode);
        debug!(
            "Compositing '{}' ({:?}): {} fields, {} drawing ops",
            self.template.name,
            mode,
            self.template.fields.len(),
            ops.len()
        );

        let spec = PageSpec::new(self.template.page_width, self.template.page_height)
            .with_title(self.template.name.as_str())
            .compressed(self.compress);
        let mut doc = PdfDocument::single_page(&spec, &ops)?;
        Ok(doc.to_bytes()?)
    }
}
