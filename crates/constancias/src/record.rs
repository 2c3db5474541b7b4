//! Student records and document requests

use crate::templates::TemplateId;
use serde::{Deserialize, Serialize};

/// Number of rows in the CONDUCTA grade table
pub const CONDUCTA_ROWS: usize = 5;

/// One student row from the directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Full name
    pub alumno: String,
    /// National identity number, the lookup key
    pub dni: String,
    /// Grade or level
    pub grado: String,
    /// Guardian name
    #[serde(default)]
    pub apoderado: String,
    /// Guardian identity number
    #[serde(default)]
    pub dni_apo: String,
}

impl StudentRecord {
    /// Whether the fields every render needs are present
    pub fn is_complete(&self) -> bool {
        !self.alumno.trim().is_empty() && !self.dni.trim().is_empty()
    }
}

/// A `{anio, nota}` pair of the CONDUCTA table
///
/// Both fields may be empty; a row is drawn when either one has text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductaEntry {
    #[serde(default)]
    pub anio: String,
    #[serde(default)]
    pub nota: String,
}

impl ConductaEntry {
    pub fn new(anio: impl Into<String>, nota: impl Into<String>) -> Self {
        Self {
            anio: anio.into(),
            nota: nota.into(),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.anio.trim().is_empty() || !self.nota.trim().is_empty()
    }
}

/// Everything needed to render one certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub template: TemplateId,
    pub student: StudentRecord,
    /// Only read by the CONDUCTA template
    pub conducta: [ConductaEntry; CONDUCTA_ROWS],
}

impl DocumentRequest {
    /// Create a request with an empty CONDUCTA table
    pub fn new(template: TemplateId, student: StudentRecord) -> Self {
        Self {
            template,
            student,
            conducta: Default::default(),
        }
    }

    /// Set the CONDUCTA table
    ///
    /// Extra entries are ignored and missing ones are left empty.
    pub fn with_conducta<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = ConductaEntry>,
    {
        let mut table: [ConductaEntry; CONDUCTA_ROWS] = Default::default();
        for (slot, entry) in table.iter_mut().zip(entries) {
            *slot = entry;
        }
        self.conducta = table;
        self
    }
}
