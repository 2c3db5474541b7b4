//! Layout primitives shared by the certificate and card composers
//!
//! All coordinates are PDF points with the origin at the bottom-left corner.

use crate::Result;
use pdf_core::{wrap_to_width, Align, FontStyle, FontWeight, PdfDocument};
use std::path::Path;

/// Line spacing used when a caller does not pick one
pub const DEFAULT_LEADING: f64 = 14.0;

/// Background image looked up in the assets directory
pub const BACKGROUND_FILE: &str = "fondo.png";

/// Indent of bullet text relative to the bullet glyph
const BULLET_INDENT: f64 = 14.0;

/// Font selection for one run of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    pub style: FontStyle,
    pub size: f32,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        Self {
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
            size,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            weight: FontWeight::Bold,
            style: FontStyle::Normal,
            size,
        }
    }

    pub const fn italic(size: f32) -> Self {
        Self {
            weight: FontWeight::Regular,
            style: FontStyle::Italic,
            size,
        }
    }

    pub(crate) fn apply(&self, doc: &mut PdfDocument) {
        doc.set_font(self.weight, self.style, self.size);
    }
}

/// Draw a word-wrapped, left-aligned paragraph
///
/// # Arguments
/// * `text` - Paragraph text; runs of whitespace collapse to one space
/// * `x` - Left margin
/// * `y` - Baseline of the first line
/// * `max_width` - Available width in points
/// * `style` - Font for every line
/// * `leading` - Distance between baselines
///
/// # Returns
/// The baseline just below the last drawn line.
pub fn draw_paragraph(
    doc: &mut PdfDocument,
    text: &str,
    x: f64,
    y: f64,
    max_width: f64,
    style: TextStyle,
    leading: f64,
) -> f64 {
    style.apply(doc);
    let font = doc.current_font();

    let mut cursor = y;
    for line in wrap_to_width(text, font, style.size, max_width) {
        doc.insert_text(&line, x, cursor, Align::Left);
        cursor -= leading;
    }
    cursor
}

/// Draw a bulleted list, wrapping each item under its own text column
///
/// # Returns
/// The baseline just below the last drawn line.
pub fn draw_bullets(
    doc: &mut PdfDocument,
    items: &[&str],
    x: f64,
    y: f64,
    max_width: f64,
    style: TextStyle,
    leading: f64,
) -> f64 {
    let mut cursor = y;
    for item in items {
        style.apply(doc);
        doc.insert_text("•", x, cursor, Align::Left);
        cursor = draw_paragraph(
            doc,
            item,
            x + BULLET_INDENT,
            cursor,
            max_width - BULLET_INDENT,
            style,
            leading,
        );
    }
    cursor
}

/// Draw a single line of text with the given alignment
pub fn draw_text(doc: &mut PdfDocument, text: &str, x: f64, y: f64, style: TextStyle, align: Align) {
    style.apply(doc);
    doc.insert_text(text, x, y, align);
}

/// Draw text centered on `x`
pub fn draw_centered(doc: &mut PdfDocument, text: &str, x: f64, y: f64, style: TextStyle) {
    draw_text(doc, text, x, y, style, Align::Center);
}

/// Draw text ending at `x`
pub fn draw_right(doc: &mut PdfDocument, text: &str, x: f64, y: f64, style: TextStyle) {
    draw_text(doc, text, x, y, style, Align::Right);
}

/// Draw a thin horizontal rule from `x1` to `x2`
pub fn draw_hrule(doc: &mut PdfDocument, x1: f64, x2: f64, y: f64) {
    doc.set_line_width(0.8);
    doc.draw_line(x1, y, x2, y);
}

/// Fill the whole page with `fondo.png` from `assets_dir`
///
/// A missing file is not an error.
///
/// # Returns
/// Whether the background was drawn.
pub fn draw_background(doc: &mut PdfDocument, assets_dir: &Path) -> Result<bool> {
    let path = assets_dir.join(BACKGROUND_FILE);
    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "no background image, skipping");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let (width, height) = (doc.width(), doc.height());
    doc.insert_image(&data, 0.0, 0.0, width, height)?;
    Ok(true)
}
