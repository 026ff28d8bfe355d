//! Drawing primitives and content-stream encoding

use crate::font::BuiltinFont;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    fn operands(&self) -> String {
        format!(
            "{} {} {}",
            fmt_num(self.r as f64),
            fmt_num(self.g as f64),
            fmt_num(self.b as f64)
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// A point in content space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Stroke paint: color and line width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// A single drawing primitive in content space (bottom-left origin)
///
/// Each primitive carries its own paint, so a sequence of ops can be
/// reordered or merged without graphics state leaking between them.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Axis-aligned rectangle with optional fill and stroke
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    /// Open polyline through two or more points
    Path { points: Vec<Point>, stroke: Stroke },
    /// Single line of text with its baseline starting at (x, y)
    Text {
        x: f64,
        y: f64,
        text: String,
        font: BuiltinFont,
        size: f64,
        color: Color,
    },
}

impl DrawOp {
    /// Text run shorthand
    pub fn text(
        x: f64,
        y: f64,
        text: impl Into<String>,
        font: BuiltinFont,
        size: f64,
        color: Color,
    ) -> Self {
        Self::Text {
            x,
            y,
            text: text.into(),
            font,
            size,
            color,
        }
    }

    /// Straight line segment shorthand
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) -> Self {
        Self::Path {
            points: vec![Point::new(x1, y1), Point::new(x2, y2)],
            stroke,
        }
    }

    /// The text shown by this op, if it is a text run
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The font used by this op, if any
    pub fn font(&self) -> Option<BuiltinFont> {
        match self {
            Self::Text { font, .. } => Some(*font),
            _ => None,
        }
    }
}

/// Format a number for a content stream: at most three decimals, no
/// trailing zeros, no negative zero.
pub(crate) fn fmt_num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let s = format!("{rounded:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Encode a string as a PDF literal string in WinAnsiEncoding
///
/// Characters outside the encoding are replaced with `?`.
pub fn escape_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            '\n' => out.extend_from_slice(b"\\n"),
            '\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(win_ansi_byte(c)),
        }
    }
    out.push(b')');
    out
}

fn win_ansi_byte(c: char) -> u8 {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => b'?',
    }
}

/// Generate PDF operators for a sequence of drawing primitives
///
/// Shapes are wrapped in `q`/`Q` so their paint never leaks into the ops
/// that follow; text runs use a `BT`/`ET` pair each.
pub fn encode_ops(ops: &[DrawOp]) -> Vec<u8> {
    let mut out = Vec::new();
    for op in ops {
        encode_op(op, &mut out);
    }
    out
}

fn encode_op(op: &DrawOp, out: &mut Vec<u8>) {
    match op {
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let mut ops = String::from("q\n");
            if let Some(stroke) = stroke {
                ops.push_str(&format!("{} RG\n", stroke.color.operands()));
                ops.push_str(&format!("{} w\n", fmt_num(stroke.width)));
            }
            if let Some(fill) = fill {
                ops.push_str(&format!("{} rg\n", fill.operands()));
            }
            ops.push_str(&format!(
                "{} {} {} {} re\n",
                fmt_num(*x),
                fmt_num(*y),
                fmt_num(*width),
                fmt_num(*height)
            ));
            let paint = match (fill.is_some(), stroke.is_some()) {
                (true, true) => "B",
                (true, false) => "f",
                (false, true) => "S",
                (false, false) => "n",
            };
            ops.push_str(paint);
            ops.push_str("\nQ\n");
            out.extend_from_slice(ops.as_bytes());
        }
        DrawOp::Path { points, stroke } => {
            let Some((first, rest)) = points.split_first() else {
                return;
            };
            let mut ops = String::from("q\n");
            ops.push_str(&format!("{} RG\n", stroke.color.operands()));
            ops.push_str(&format!("{} w\n", fmt_num(stroke.width)));
            ops.push_str(&format!("{} {} m\n", fmt_num(first.x), fmt_num(first.y)));
            for point in rest {
                ops.push_str(&format!("{} {} l\n", fmt_num(point.x), fmt_num(point.y)));
            }
            ops.push_str("S\nQ\n");
            out.extend_from_slice(ops.as_bytes());
        }
        DrawOp::Text {
            x,
            y,
            text,
            font,
            size,
            color,
        } => {
            if text.is_empty() {
                return;
            }
            // Begin Text, set color, font and position
            let head = format!(
                "BT\n{} rg\n/{} {} Tf\n{} {} Td\n",
                color.operands(),
                font.resource_name(),
                fmt_num(*size),
                fmt_num(*x),
                fmt_num(*y)
            );
            out.extend_from_slice(head.as_bytes());
            out.extend_from_slice(&escape_literal(text));
            out.extend_from_slice(b" Tj\nET\n");
        }
    }
}

/// Flate-compress a content stream body
pub(crate) fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_str(ops: &[DrawOp]) -> String {
        String::from_utf8_lossy(&encode_ops(ops)).into_owned()
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(100.0), "100");
        assert_eq!(fmt_num(572.5), "572.5");
        assert_eq!(fmt_num(0.8999999761581421), "0.9");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(-12.25), "-12.25");
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("abc"), b"(abc)".to_vec());
        assert_eq!(escape_literal("a(b)c\\"), b"(a\\(b\\)c\\\\)".to_vec());
        assert_eq!(escape_literal("caf\u{e9}"), b"(caf\xe9)".to_vec());
        assert_eq!(escape_literal("\u{20ac}5"), b"(\x805)".to_vec());
        assert_eq!(escape_literal("\u{0e01}"), b"(?)".to_vec());
    }

    #[test]
    fn test_text_operators() {
        let ops = [DrawOp::text(
            105.0,
            578.0,
            "42.50",
            BuiltinFont::Helvetica,
            12.0,
            Color::black(),
        )];
        let s = encode_str(&ops);

        assert!(s.contains("BT"));
        assert!(s.contains("0 0 0 rg"));
        assert!(s.contains("/Helv 12 Tf"));
        assert!(s.contains("105 578 Td"));
        assert!(s.contains("(42.50) Tj"));
        assert!(s.contains("ET"));
    }

    #[test]
    fn test_empty_text_emits_nothing() {
        let ops = [DrawOp::text(0.0, 0.0, "", BuiltinFont::Courier, 9.0, Color::black())];
        assert!(encode_ops(&ops).is_empty());
    }

    #[test]
    fn test_rect_fill_and_stroke() {
        let ops = [DrawOp::Rect {
            x: 100.0,
            y: 572.0,
            width: 150.0,
            height: 20.0,
            fill: Some(Color::rgb(0.9, 0.95, 1.0)),
            stroke: Some(Stroke::new(Color::rgb(0.2, 0.4, 0.8), 1.0)),
        }];
        let s = encode_str(&ops);

        assert!(s.starts_with("q\n"));
        assert!(s.contains("0.2 0.4 0.8 RG"));
        assert!(s.contains("1 w"));
        assert!(s.contains("0.9 0.95 1 rg"));
        assert!(s.contains("100 572 150 20 re\nB\n"));
        assert!(s.ends_with("Q\n"));
    }

    #[test]
    fn test_rect_stroke_only() {
        let ops = [DrawOp::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            fill: None,
            stroke: Some(Stroke::new(Color::black(), 2.0)),
        }];
        assert!(encode_str(&ops).contains("0 0 10 10 re\nS\n"));
    }

    #[test]
    fn test_path() {
        let ops = [DrawOp::Path {
            points: vec![Point::new(2.0, 4.0), Point::new(4.0, 2.0), Point::new(8.0, 8.0)],
            stroke: Stroke::new(Color::black(), 2.0),
        }];
        let s = encode_str(&ops);
        assert!(s.contains("2 4 m\n4 2 l\n8 8 l\nS\n"));
    }

    #[test]
    fn test_compress_round_trip() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let data = b"BT /Helv 12 Tf (x) Tj ET".repeat(8);
        let packed = compress(&data).unwrap();
        let mut unpacked = Vec::new();
        ZlibDecoder::new(&packed[..])
            .read_to_end(&mut unpacked)
            .unwrap();
        assert_eq!(unpacked, data);
    }
}
