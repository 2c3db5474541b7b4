//! A4 certificate composer
//!
//! Every certificate is drawn in the same order: background, slogan and
//! date, title, body, signature block and validation QR. The commitment
//! letter skips the slogan, the date and the signature block and draws its
//! own three-column footer instead.

use crate::bodies::draw_body;
use crate::codes::generate_qr_png;
use crate::fecha::format_fecha;
use crate::layout::{draw_background, draw_centered, draw_hrule, draw_right, TextStyle};
use crate::validator::validation_url;
use crate::{DocumentError, DocumentRequest, GeneratedDocument, RenderConfig, Result};
use chrono::NaiveDate;
use pdf_core::PdfDocument;
use std::path::PathBuf;

/// Side of the validation QR, in points
pub const QR_SIZE: f64 = 70.0;

/// Caption under the validation QR
pub const QR_CAPTION: &str = "ESCANEAR PARA VALIDAR";

/// Baseline of the director signature line
const SIGNATURE_Y: f64 = 140.0;

/// Renders [`DocumentRequest`]s into A4 PDFs
#[derive(Debug, Clone)]
pub struct DocumentComposer {
    config: RenderConfig,
    validation_host: String,
    assets_dir: PathBuf,
    today: Option<NaiveDate>,
}

impl DocumentComposer {
    /// Create a composer
    ///
    /// # Arguments
    /// * `config` - Year, slogan, anchor points and signatory names
    /// * `validation_host` - Host encoded in the validation QR
    /// * `assets_dir` - Directory searched for `fondo.png`
    pub fn new(
        config: RenderConfig,
        validation_host: impl Into<String>,
        assets_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            validation_host: validation_host.into(),
            assets_dir: assets_dir.into(),
            today: None,
        }
    }

    /// Pin the date printed on certificates instead of using the local clock
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a certificate
    ///
    /// Fails with [`DocumentError::InputIncomplete`] when the student has no
    /// name or DNI and with [`DocumentError::YearOutOfRange`] when the
    /// configured year is not allowed. Nothing is drawn in either case.
    pub fn compose(&self, request: &DocumentRequest) -> Result<GeneratedDocument> {
        let student = &request.student;
        if !student.is_complete() {
            return Err(DocumentError::InputIncomplete(
                "student name and DNI are required".to_string(),
            ));
        }
        self.config.validate()?;

        let template = request.template;
        let dni = student.dni.trim();
        let mut doc = PdfDocument::a4();

        draw_background(&mut doc, &self.assets_dir)?;
        if !template.omit_common_chrome() {
            self.draw_header(&mut doc);
        }
        self.draw_title(&mut doc, template.title());
        draw_body(&mut doc, request, &self.config);
        if !template.omit_common_chrome() {
            self.draw_footer(&mut doc, dni)?;
        }

        let pdf = doc.to_bytes()?;
        tracing::info!(
            template = template.as_str(),
            dni,
            anio = self.config.anio,
            bytes = pdf.len(),
            "certificate rendered"
        );

        Ok(GeneratedDocument {
            filename: template.filename(dni),
            pdf,
        })
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Slogan and place-and-date line
    fn draw_header(&self, doc: &mut PdfDocument) {
        let y_frase = self.config.y_frase as f64;
        let frase = self.config.frase.trim();
        if !frase.is_empty() {
            let center = doc.width() / 2.0;
            draw_centered(
                doc,
                &format!("\"{frase}\""),
                center,
                y_frase,
                TextStyle::italic(8.0),
            );
        }

        let fecha = format_fecha(self.today(), self.config.anio);
        let right = doc.width() - 60.0;
        draw_right(doc, &fecha, right, y_frase - 20.0, TextStyle::regular(11.0));
    }

    fn draw_title(&self, doc: &mut PdfDocument, title: &str) {
        let y = self.config.y_titulo as f64;
        let width = doc.width();
        draw_centered(doc, title, width / 2.0, y, TextStyle::bold(16.0));
        draw_hrule(doc, 100.0, width - 100.0, y - 3.0);
    }

    /// Director signature block and validation QR
    fn draw_footer(&self, doc: &mut PdfDocument, dni: &str) -> Result<()> {
        let center = doc.width() / 2.0;
        draw_hrule(doc, center - 97.5, center + 97.5, SIGNATURE_Y);
        draw_centered(
            doc,
            self.config.directora.trim(),
            center,
            SIGNATURE_Y - 15.0,
            TextStyle::bold(10.0),
        );
        draw_centered(
            doc,
            "DIRECTORA",
            center,
            SIGNATURE_Y - 28.0,
            TextStyle::regular(9.0),
        );

        let qr = generate_qr_png(&validation_url(&self.validation_host, dni))?;
        let (qr_x, qr_y) = (self.config.qr_x as f64, self.config.qr_y as f64);
        doc.insert_image(&qr, qr_x, qr_y, QR_SIZE, QR_SIZE)?;
        draw_centered(
            doc,
            QR_CAPTION,
            qr_x + QR_SIZE / 2.0,
            qr_y - 8.0,
            TextStyle::regular(6.0),
        );
        Ok(())
    }
}
