//! Constancias - certificate rendering and validation for I.E. Alternativo Yachay
//!
//! This crate provides:
//! - The student directory read from `base_datos.xlsx`
//! - The six certificate templates and their A4 composer
//! - The student ID card composer (QR + Code-128 barcode)
//! - The public validator view reached through the QR code
//! - Render configuration, calibration and deployment settings
//! - The per-session request state machine
//!
//! # Example
//!
//! ```ignore
//! use constancias::{DocumentComposer, DocumentRequest, RenderConfig, StudentDirectory, TemplateId};
//!
//! let directory = StudentDirectory::new("data");
//! let student = directory.lookup("73840561")?.ok_or(DocumentError::DirectoryLookupMiss("73840561".into()))?;
//! let composer = DocumentComposer::new(RenderConfig::default(), "constancias.yachay.edu.pe", "assets");
//! let document = composer.compose(&DocumentRequest::new(TemplateId::Estudios, student))?;
//! std::fs::write(&document.filename, &document.pdf)?;
//! ```

mod bodies;
pub mod card;
pub mod codes;
pub mod composer;
pub mod config;
pub mod directory;
pub mod fecha;
pub mod layout;
mod record;
pub mod session;
pub mod templates;
pub mod validator;

pub use bodies::{
    COMPROMISO_CLAUSES, COMPROMISO_CLOSING, CONDUCTA_GRADES, SIN_INFORMACION, VACANTE_DOCUMENTS,
};
pub use card::{barcode_surrogate, CardComposer, CARD_HEIGHT, CARD_WIDTH};
pub use codes::{generate_qr_png, BarcodeEncoder, Code128Encoder};
pub use composer::DocumentComposer;
pub use config::{Calibration, RenderConfig, Settings, DEFAULT_FRASE, MAX_YEAR, MIN_YEAR};
pub use directory::{StudentDirectory, DIRECTORY_FILE};
pub use fecha::{format_fecha, month_es};
pub use record::{ConductaEntry, DocumentRequest, StudentRecord, CONDUCTA_ROWS};
pub use session::{DocumentSession, SessionState};
pub use templates::TemplateId;
pub use validator::{validation_url, ValidatorView};

use thiserror::Error;

/// Institution name printed on cards and on the validator view
pub const INSTITUTION_NAME: &str = "I.E. ALTERNATIVO YACHAY";

/// Errors that can occur while looking up, composing or validating documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Student directory not found: {0}")]
    DirectoryMissing(String),

    #[error("No student with DNI {0}")]
    DirectoryLookupMiss(String),

    #[error("Incomplete input: {0}")]
    InputIncomplete(String),

    #[error("Barcode encoder failed: {0}")]
    BarcodeEncoderFailure(String),

    #[error("Render error: {0}")]
    RenderFailure(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Year {0} outside {min}..={max}", min = MIN_YEAR, max = MAX_YEAR)]
    YearOutOfRange(i32),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Invalid transition: cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A rendered PDF ready to be handed to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    /// Download filename (e.g. `VACANTE_73840561.pdf`)
    pub filename: String,
    /// PDF bytes
    pub pdf: Vec<u8>,
}

/// Keep only characters that are safe in a download filename
pub(crate) fn sanitize_filename_part(value: &str, fallback: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}
