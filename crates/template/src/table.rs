//! Table rendering
//!
//! A table is anchored at the bottom edge of its field box and grows
//! upwards: `columns × cellWidth` wide and `(rows + header) × cellHeight`
//! tall. Rows are counted from the top, the header (if any) first.

use crate::parser::value_to_string;
use crate::renderer::{box_fill, truncate, RenderMode};
use crate::schema::Field;
use pdf_core::coords::to_content_y;
use pdf_core::{BuiltinFont, Color, DrawOp, Stroke};
use serde_json::Value;

/// Largest page side PDF viewers accept, in points
const MAX_PAGE_EXTENT: f64 = 14_400.0;

/// Upper bound on drawn rows and on drawn columns
const MAX_TRACKS: usize = 1_000;

/// Number of `size`-long cells that fit along `extent`
fn tracks_within(extent: f64, size: f64) -> usize {
    if size.is_nan() || size <= 0.0 || extent.is_nan() {
        return 0;
    }
    let fit = (extent.clamp(0.0, MAX_PAGE_EXTENT) / size).floor() as usize;
    fit.min(MAX_TRACKS)
}

/// Cell capacity in characters: `floor((cellWidth - 10) / 5)`
fn cell_capacity(cell_width: f64) -> usize {
    ((cell_width - 10.0) / 5.0).floor().max(0.0) as usize
}

/// Render a table field
///
/// `value` should be a sequence of rows. Each row is either a positional
/// sequence of cells or an object keyed by header text. Rows beyond
/// `table_rows`, cells beyond `table_columns` and rows of any other shape
/// are skipped. Rows that do not fit the page height and columns that do
/// not fit the largest PDF page are not drawn.
///
/// Overlay mode deliberately draws cell text only: the grid, header tint
/// and header text are left to the background document, which already
/// prints them. Stand-alone mode draws everything.
pub fn render_table(
    field: &Field,
    value: Option<&Value>,
    page_height: f64,
    mode: RenderMode,
) -> Vec<DrawOp> {
    let (cell_width, cell_height) = (field.cell_width, field.cell_height);
    let columns = field.table_columns.min(tracks_within(MAX_PAGE_EXTENT, cell_width));
    let rows = field.table_rows.min(tracks_within(page_height, cell_height));

    let headers: Vec<&str> = field
        .table_headers
        .iter()
        .take(columns)
        .map(String::as_str)
        .collect();
    let header_rows = usize::from(!field.table_headers.is_empty());
    let total_rows = rows.saturating_add(header_rows);

    let x = field.x;
    let y = to_content_y(field.y, field.height, page_height);
    let table_width = cell_width * columns as f64;
    let table_height = cell_height * total_rows as f64;
    let top = y + table_height;

    let mut ops = Vec::new();

    if mode == RenderMode::Standalone {
        if header_rows > 0 {
            ops.push(DrawOp::Rect {
                x,
                y: top - cell_height,
                width: table_width,
                height: cell_height,
                fill: Some(box_fill()),
                stroke: None,
            });
        }

        ops.push(DrawOp::Rect {
            x,
            y,
            width: table_width,
            height: table_height,
            fill: None,
            stroke: Some(Stroke::new(Color::black(), 2.0)),
        });

        for i in 1..total_rows {
            let line_y = y + i as f64 * cell_height;
            // The boundary just below the header row
            let width = if header_rows > 0 && i == total_rows - 1 {
                2.0
            } else {
                1.0
            };
            ops.push(DrawOp::line(
                x,
                line_y,
                x + table_width,
                line_y,
                Stroke::new(Color::black(), width),
            ));
        }

        for i in 1..columns {
            let line_x = x + i as f64 * cell_width;
            ops.push(DrawOp::line(
                line_x,
                y,
                line_x,
                top,
                Stroke::new(Color::black(), 1.0),
            ));
        }

        for (col, header) in headers.iter().enumerate() {
            ops.push(DrawOp::text(
                x + col as f64 * cell_width + 5.0,
                top - cell_height + cell_height / 2.0 - 3.0,
                *header,
                BuiltinFont::HelveticaBold,
                10.0,
                Color::black(),
            ));
        }
    }

    let data_rows = value.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
    let capacity = cell_capacity(cell_width);

    for (row_index, row) in data_rows.iter().take(rows).enumerate() {
        let cells: Vec<Option<&Value>> = match row {
            Value::Array(items) => items.iter().take(columns).map(Some).collect(),
            Value::Object(map) => headers.iter().map(|h| map.get(*h)).collect(),
            _ => continue,
        };

        let visual_row = row_index + header_rows;
        let cell_y = top - (visual_row + 1) as f64 * cell_height + cell_height / 2.0 - 3.0;

        for (col, cell) in cells.into_iter().enumerate() {
            let text = cell.map(value_to_string).unwrap_or_default();
            if text.is_empty() {
                continue;
            }
            ops.push(DrawOp::text(
                x + col as f64 * cell_width + 5.0,
                cell_y,
                truncate(&text, capacity),
                BuiltinFont::Helvetica,
                9.0,
                Color::black(),
            ));
        }
    }

    ops
}
