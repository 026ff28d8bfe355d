//! Coordinate model
//!
//! Templates are laid out in editor space: origin at the top-left corner of
//! the page, Y growing downwards. Page content streams use PDF user space:
//! origin at the bottom-left corner, Y growing upwards. Every drawing
//! primitive crosses this boundary exactly once, through [`to_content_y`].

/// Convert the top edge of a box in editor space to the bottom edge of the
/// same box in content space.
///
/// `page_height - editor_y - height`
pub fn to_content_y(editor_y: f64, height: f64, page_height: f64) -> f64 {
    page_height - editor_y - height
}

/// Inverse of [`to_content_y`]: recover the editor-space top edge from a
/// content-space bottom edge.
pub fn to_editor_y(content_y: f64, height: f64, page_height: f64) -> f64 {
    page_height - content_y - height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_content_y() {
        assert_eq!(to_content_y(200.0, 20.0, 792.0), 572.0);
        assert_eq!(to_content_y(0.0, 792.0, 792.0), 0.0);
    }

    #[test]
    fn test_round_trip() {
        let samples = [
            (0.0, 10.0, 792.0),
            (200.0, 20.0, 792.0),
            (37.0, 13.0, 841.0),
            (900.0, 50.0, 612.0), // out of page bounds is still invertible
        ];
        for (y, h, ph) in samples {
            assert_eq!(to_editor_y(to_content_y(y, h, ph), h, ph), y);
        }
    }
}
