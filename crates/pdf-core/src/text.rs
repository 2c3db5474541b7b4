//! Text rendering utilities

use crate::document::Color;
use crate::StandardFont;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text color (RGB)
    pub color: Color,
}

/// Escape WinAnsi bytes for a PDF literal string
fn escape_literal(encoded: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded.len() + 2);
    out.push(b'(');
    for &b in encoded {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(b),
        }
    }
    out.push(b')');
    out
}

/// Generate PDF operators for text insertion
///
/// Creates the PDF text operators (BT, rg, Tf, Td, Tj, ET) to render text
/// whose left edge starts at `x`. Alignment is resolved by the caller.
///
/// # Arguments
/// * `encoded` - WinAnsi-encoded text
/// * `x` - X coordinate in points (from left)
/// * `y` - Baseline Y coordinate in points (from bottom)
/// * `ctx` - Text rendering context
pub fn generate_text_operators(encoded: &[u8], x: f64, y: f64, ctx: &TextRenderContext) -> Vec<u8> {
    let mut ops = Vec::new();

    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(
        format!("{} {} {} rg\n", ctx.color.r, ctx.color.g, ctx.color.b).as_bytes(),
    );
    ops.extend_from_slice(format!("/{} {} Tf\n", ctx.font_name, ctx.font_size).as_bytes());
    ops.extend_from_slice(format!("{x} {y} Td\n").as_bytes());
    ops.extend_from_slice(&escape_literal(encoded));
    ops.extend_from_slice(b" Tj\nET\n");

    ops
}

/// Split text into lines that fit within `max_width` points
///
/// Greedy wrap on whitespace using the font's metrics. A single word wider
/// than the limit is kept on its own line rather than broken.
pub fn wrap_to_width(text: &str, font: StandardFont, font_size: f32, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
            continue;
        }

        let candidate = format!("{current_line} {word}");
        if font.text_width_points(&candidate, font_size) <= max_width {
            current_line = candidate;
        } else {
            lines.push(std::mem::replace(&mut current_line, word.to_string()));
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}
