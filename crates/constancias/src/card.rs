//! Student ID card composer (241x155 pt)

use crate::codes::{generate_qr_png, BarcodeEncoder, Code128Encoder};
use crate::layout::{draw_centered, draw_text, TextStyle};
use crate::validator::validation_url;
use crate::{
    sanitize_filename_part, DocumentError, GeneratedDocument, Result, StudentRecord,
    INSTITUTION_NAME,
};
use pdf_core::{Align, Color, PaintMode, PdfDocument};

/// Card width in points
pub const CARD_WIDTH: f64 = 241.0;

/// Card height in points
pub const CARD_HEIGHT: f64 = 155.0;

/// Left edge of the name and field column
const FIELD_X: f64 = 90.0;

/// Widest the student name may grow; keeps it clear of the QR at x=185
const NAME_MAX_WIDTH: f64 = 90.0;
const NAME_MAX_SIZE: f32 = 11.0;
const NAME_MIN_SIZE: f32 = 7.0;

const BARCODE_X: f64 = 90.0;
const BARCODE_Y: f64 = 10.0;
const BARCODE_WIDTH: f64 = 130.0;
const BARCODE_HEIGHT: f64 = 35.0;

fn card_blue() -> Color {
    Color::from_rgb(0, 51, 102)
}

/// Text drawn in place of the barcode when it cannot be encoded
pub fn barcode_surrogate(dni: &str) -> String {
    format!("||| {} |||", dni.trim())
}

/// Renders student ID cards
pub struct CardComposer {
    anio: i32,
    validation_host: String,
    encoder: Box<dyn BarcodeEncoder>,
}

impl CardComposer {
    /// Card composer using the built-in Code-128 encoder
    ///
    /// # Arguments
    /// * `anio` - Validity year printed on the card
    /// * `validation_host` - Host encoded in the QR
    pub fn new(anio: i32, validation_host: impl Into<String>) -> Self {
        Self {
            anio,
            validation_host: validation_host.into(),
            encoder: Box::new(Code128Encoder::default()),
        }
    }

    /// Swap the barcode encoder
    pub fn with_encoder(mut self, encoder: impl BarcodeEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Render the card for `student`
    ///
    /// A barcode failure does not fail the card; the DNI is printed as text
    /// between bars instead.
    pub fn compose(&self, student: &StudentRecord) -> Result<GeneratedDocument> {
        if !student.is_complete() {
            return Err(DocumentError::InputIncomplete(
                "student name and DNI are required".to_string(),
            ));
        }

        let dni = student.dni.trim();
        let mut doc = PdfDocument::new(CARD_WIDTH, CARD_HEIGHT)?;

        draw_frame(&mut doc);
        draw_photo_placeholder(&mut doc);
        self.draw_fields(&mut doc, student);

        let qr = generate_qr_png(&validation_url(&self.validation_host, dni))?;
        doc.insert_image(&qr, 185.0, 55.0, 45.0, 45.0)?;
        draw_centered(&mut doc, "ESCANEAR", 207.0, 50.0, TextStyle::regular(5.0));

        self.draw_barcode(&mut doc, dni);

        let pdf = doc.to_bytes()?;
        tracing::info!(dni, bytes = pdf.len(), "ID card rendered");

        Ok(GeneratedDocument {
            filename: format!("Carnet_{}.pdf", sanitize_filename_part(dni, "SIN_DNI")),
            pdf,
        })
    }

    fn draw_fields(&self, doc: &mut PdfDocument, student: &StudentRecord) {
        let (name, size) = fit_name(doc, &student.alumno.trim().to_uppercase());
        draw_text(doc, &name, FIELD_X, 105.0, TextStyle::bold(size), Align::Left);

        let label = TextStyle::regular(8.0);
        let lines = [
            (88.0, format!("DNI: {}", student.dni.trim())),
            (73.0, format!("GRADO: {}", student.grado.trim().to_uppercase())),
            (58.0, format!("VIGENCIA: {}", self.anio)),
        ];
        for (y, text) in &lines {
            draw_text(doc, text, FIELD_X, *y, label, Align::Left);
        }
    }

    /// Code-128 image, or the textual surrogate on failure
    fn draw_barcode(&self, doc: &mut PdfDocument, dni: &str) {
        let placed = self.encoder.encode_png(dni).and_then(|png| {
            doc.insert_image(&png, BARCODE_X, BARCODE_Y, BARCODE_WIDTH, BARCODE_HEIGHT)
                .map_err(|e| DocumentError::BarcodeEncoderFailure(e.to_string()))
        });

        if let Err(e) = placed {
            tracing::warn!(dni, error = %e, "barcode unavailable, printing DNI instead");
            draw_text(
                doc,
                &barcode_surrogate(dni),
                BARCODE_X,
                BARCODE_Y + 10.0,
                TextStyle::bold(10.0),
                Align::Left,
            );
        }
    }
}

/// Border and header band with the institution name
fn draw_frame(doc: &mut PdfDocument) {
    doc.set_line_width(2.0);
    doc.set_stroke_color(card_blue());
    doc.draw_rect(2.0, 2.0, CARD_WIDTH - 4.0, CARD_HEIGHT - 4.0, PaintMode::Stroke);

    doc.set_fill_color(card_blue());
    doc.draw_rect(2.0, 125.0, CARD_WIDTH - 4.0, 28.0, PaintMode::Fill);

    doc.set_text_color(Color::white());
    draw_centered(
        doc,
        INSTITUTION_NAME,
        CARD_WIDTH / 2.0,
        135.0,
        TextStyle::bold(12.0),
    );
    doc.set_text_color(Color::black());
    doc.set_stroke_color(Color::black());
}

fn draw_photo_placeholder(doc: &mut PdfDocument) {
    doc.set_fill_color(Color::gray(0.85));
    doc.draw_rect(10.0, 35.0, 70.0, 80.0, PaintMode::Fill);
    draw_centered(doc, "FOTO", 45.0, 75.0, TextStyle::regular(6.0));
}

/// Largest bold size in half points that keeps `name` within the name column
fn fit_font_size(doc: &mut PdfDocument, name: &str) -> f32 {
    let mut size = NAME_MAX_SIZE;
    while size > NAME_MIN_SIZE {
        TextStyle::bold(size).apply(doc);
        if doc.text_width(name) <= NAME_MAX_WIDTH {
            break;
        }
        size -= 0.5;
    }
    size
}

/// Name and size to draw; names too wide even at the minimum size are cut
fn fit_name(doc: &mut PdfDocument, name: &str) -> (String, f32) {
    let size = fit_font_size(doc, name);
    TextStyle::bold(size).apply(doc);

    let mut fitted = name.to_string();
    while doc.text_width(&fitted) > NAME_MAX_WIDTH {
        fitted.pop();
    }
    let fitted = fitted.trim_end().to_string();
    if fitted.len() < name.len() {
        tracing::debug!(name, fitted = fitted.as_str(), "student name truncated on card");
    }
    (fitted, size)
}
