//! Field rendering
//!
//! Turns one field plus its data value into drawing primitives. Geometry is
//! converted from editor coordinates exactly once, here, via
//! [`pdf_core::coords::to_content_y`].

use crate::parser::value_to_string;
use crate::schema::{Field, FieldKind};
use crate::table::render_table;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pdf_core::coords::to_content_y;
use pdf_core::{BuiltinFont, Color, DrawOp, Point, Stroke};
use serde_json::Value;

/// Values that leave a checkbox unchecked (compared case-insensitively)
const UNCHECKED_VALUES: [&str; 6] = ["false", "no", "0", "unchecked", "off", ""];

/// Estimated glyph width as a fraction of the font size
const CHAR_WIDTH_FACTOR: f64 = 0.6;

/// Left inset of a value inside its box
const TEXT_INSET: f64 = 5.0;

/// How a page is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Self-contained page: boxes, captions and labels are drawn
    Standalone,
    /// Values only, for merging over a background that has the layout
    OverlayTransparent,
}

pub(crate) fn box_stroke() -> Stroke {
    Stroke::new(Color::rgb(0.2, 0.4, 0.8), 1.0)
}

pub(crate) fn box_fill() -> Color {
    Color::rgb(0.9, 0.95, 1.0)
}

/// Render one field
///
/// `value` is the field's entry in the data map; a missing entry or `null`
/// renders as empty. Numbers and booleans render as written, so `0` and
/// `false` stay visible.
pub fn render_field(
    field: &Field,
    value: Option<&Value>,
    page_height: f64,
    mode: RenderMode,
) -> Vec<DrawOp> {
    match field.kind {
        FieldKind::Label => render_label(field, page_height, mode),
        FieldKind::Text | FieldKind::Number | FieldKind::Select => {
            let text = value.map(value_to_string).unwrap_or_default();
            render_text_box(field, &text, page_height, mode)
        }
        FieldKind::Date => {
            let text = value.map(value_to_string).unwrap_or_default();
            render_text_box(field, &format_date(&text), page_height, mode)
        }
        FieldKind::Checkbox => render_checkbox(field, is_checked(value), page_height, mode),
        FieldKind::Table => render_table(field, value, page_height, mode),
    }
}

fn render_label(field: &Field, page_height: f64, mode: RenderMode) -> Vec<DrawOp> {
    if mode == RenderMode::OverlayTransparent {
        return Vec::new();
    }
    let y = to_content_y(field.y, field.height, page_height);
    vec![DrawOp::text(
        field.x,
        y + field.height / 2.0 - field.font_size / 3.0,
        field.label(),
        field.font(),
        field.font_size,
        Color::black(),
    )]
}

fn render_text_box(field: &Field, text: &str, page_height: f64, mode: RenderMode) -> Vec<DrawOp> {
    let y = to_content_y(field.y, field.height, page_height);
    let mut ops = Vec::new();

    if mode == RenderMode::Standalone {
        ops.push(DrawOp::Rect {
            x: field.x,
            y,
            width: field.width,
            height: field.height,
            fill: Some(box_fill()),
            stroke: Some(box_stroke()),
        });
        ops.push(DrawOp::text(
            field.x,
            y + field.height + 3.0,
            format!("{}:", field.label()),
            BuiltinFont::Helvetica,
            8.0,
            Color::rgb(0.4, 0.4, 0.4),
        ));
    }

    if !text.is_empty() {
        ops.push(DrawOp::text(
            field.x + TEXT_INSET,
            y + field.height / 2.0 - field.font_size / 3.0,
            truncate(text, text_capacity(field.width, field.font_size)),
            field.font(),
            field.font_size,
            Color::black(),
        ));
    }

    ops
}

fn render_checkbox(
    field: &Field,
    checked: bool,
    page_height: f64,
    mode: RenderMode,
) -> Vec<DrawOp> {
    let y = to_content_y(field.y, field.height, page_height);
    let (w, h) = (field.width, field.height);
    let mut ops = Vec::new();

    if mode == RenderMode::Standalone {
        ops.push(DrawOp::Rect {
            x: field.x,
            y,
            width: w,
            height: h,
            fill: None,
            stroke: Some(Stroke::new(Color::rgb(0.2, 0.4, 0.8), 1.5)),
        });
        ops.push(DrawOp::text(
            field.x + w + 5.0,
            y + h / 2.0 - 3.0,
            field.label(),
            BuiltinFont::Helvetica,
            10.0,
            Color::black(),
        ));
    }

    if checked {
        let at = |fx: f64, fy: f64| Point::new(field.x + fx * w, y + fy * h);
        ops.push(DrawOp::Path {
            points: vec![at(0.2, 0.4), at(0.4, 0.2), at(0.8, 0.8)],
            stroke: Stroke::new(Color::rgb(0.0, 0.5, 0.0), 2.0),
        });
    }

    ops
}

/// Checkbox truthiness
///
/// Unchecked for a missing value and for `false`, `no`, `0`, `unchecked`,
/// `off` or the empty string in any case; checked for everything else,
/// including whitespace-only text.
pub fn is_checked(value: Option<&Value>) -> bool {
    let text = value.map(value_to_string).unwrap_or_default();
    !UNCHECKED_VALUES.contains(&text.to_lowercase().as_str())
}

/// Character capacity of a box: `floor(width / (font_size * 0.6))`
pub(crate) fn text_capacity(width: f64, font_size: f64) -> usize {
    if font_size <= 0.0 || width <= 0.0 {
        return 0;
    }
    (width / (font_size * CHAR_WIDTH_FACTOR)).floor() as usize
}

/// Fit text into `capacity` characters, ending truncated text with `...`
pub fn truncate(text: &str, capacity: usize) -> String {
    if text.chars().count() <= capacity {
        return text.to_string();
    }
    let mut fitted: String = text.chars().take(capacity.saturating_sub(3)).collect();
    fitted.push_str("...");
    fitted
}

/// Normalize an ISO date (optionally with a time part) to `YYYY-MM-DD`
///
/// Anything that does not parse is returned unchanged.
pub fn format_date(text: &str) -> String {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return datetime.format("%Y-%m-%d").to_string();
    }
    for pattern in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return datetime.format("%Y-%m-%d").to_string();
        }
    }
    text.to_string()
}
