//! PDF Core - Single-page PDF writer
//!
//! This crate provides functionality for:
//! - Creating blank single-page documents of any size (A4, ID card)
//! - Drawing text with the standard Helvetica family (no font files needed)
//! - Drawing lines and rectangles in RGB colors
//! - Inserting images (JPEG, PNG)
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, FontWeight, PdfDocument};
//!
//! let mut doc = PdfDocument::a4();
//! doc.set_font_weight(FontWeight::Bold);
//! doc.set_font_size(16.0);
//! doc.insert_text("CONSTANCIA DE ESTUDIOS", 297.5, 730.0, Align::Center);
//! doc.draw_line(100.0, 727.0, 495.0, 727.0);
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod image;
mod text;

pub use document::{Color, PaintMode, PdfDocument, A4_HEIGHT, A4_WIDTH};
pub use font::{encode_win_ansi, FontStyle, FontWeight, StandardFont};
pub use image::{detect_format, generate_image_operators, ImageFormat, ImageXObject};
pub use text::{generate_text_operators, wrap_to_width, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page size: {0} x {1}")]
    InvalidPageSize(f64, f64),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options, relative to the anchor x coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
