//! Per-session document request lifecycle
//!
//! `Empty -> Populated -> Rendered -> Downloaded`. A failed step leaves the
//! session where it was. `Downloaded` is terminal until [`DocumentSession::reset`].

use crate::{
    CardComposer, ConductaEntry, DocumentComposer, DocumentError, DocumentRequest,
    GeneratedDocument, Result, StudentDirectory, StudentRecord, TemplateId,
};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No student selected
    #[default]
    Empty,
    /// Student fields filled in
    Populated { record: StudentRecord },
    /// A document is ready to be downloaded
    Rendered {
        record: StudentRecord,
        document: GeneratedDocument,
    },
    /// The document was handed to the user
    Downloaded,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Empty => "Empty",
            SessionState::Populated { .. } => "Populated",
            SessionState::Rendered { .. } => "Rendered",
            SessionState::Downloaded => "Downloaded",
        }
    }
}

/// The form state of one authenticated admin session
#[derive(Debug, Default)]
pub struct DocumentSession {
    state: SessionState,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Student currently filled in, if any
    pub fn record(&self) -> Option<&StudentRecord> {
        match &self.state {
            SessionState::Populated { record } | SessionState::Rendered { record, .. } => {
                Some(record)
            }
            _ => None,
        }
    }

    /// Document waiting to be downloaded, if any
    pub fn document(&self) -> Option<&GeneratedDocument> {
        match &self.state {
            SessionState::Rendered { document, .. } => Some(document),
            _ => None,
        }
    }

    /// Fill the form from the directory
    ///
    /// A missing spreadsheet fails with [`DocumentError::DirectoryMissing`]
    /// and an unknown DNI with [`DocumentError::DirectoryLookupMiss`]; the
    /// state is kept in both cases.
    pub fn populate(&mut self, directory: &StudentDirectory, dni: &str) -> Result<()> {
        self.ensure_editable("populate")?;

        if !directory.exists() {
            return Err(DocumentError::DirectoryMissing(
                directory.path().display().to_string(),
            ));
        }

        let record = directory
            .lookup(dni)?
            .ok_or_else(|| DocumentError::DirectoryLookupMiss(dni.trim().to_string()))?;

        tracing::debug!(dni = record.dni.as_str(), "session populated from directory");
        self.state = SessionState::Populated { record };
        Ok(())
    }

    /// Fill the form by hand
    pub fn populate_record(&mut self, record: StudentRecord) -> Result<()> {
        self.ensure_editable("populate")?;

        if !record.is_complete() {
            return Err(DocumentError::InputIncomplete(
                "student name and DNI are required".to_string(),
            ));
        }
        self.state = SessionState::Populated { record };
        Ok(())
    }

    /// Render a certificate for the current student
    pub fn render<I>(
        &mut self,
        composer: &DocumentComposer,
        template: TemplateId,
        conducta: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = ConductaEntry>,
    {
        let record = self.renderable_record("render")?;
        let request = DocumentRequest::new(template, record.clone()).with_conducta(conducta);
        let document = composer.compose(&request)?;
        self.state = SessionState::Rendered {
            record: request.student,
            document,
        };
        Ok(())
    }

    /// Render the ID card for the current student
    pub fn render_card(&mut self, composer: &CardComposer) -> Result<()> {
        let record = self.renderable_record("render card")?.clone();
        let document = composer.compose(&record)?;
        self.state = SessionState::Rendered { record, document };
        Ok(())
    }

    /// Hand out the rendered document and close the session
    pub fn mark_downloaded(&mut self) -> Result<GeneratedDocument> {
        match std::mem::take(&mut self.state) {
            SessionState::Rendered { document, .. } => {
                self.state = SessionState::Downloaded;
                tracing::info!(filename = document.filename.as_str(), "document downloaded");
                Ok(document)
            }
            other => {
                let state = other.name();
                self.state = other;
                Err(DocumentError::InvalidTransition {
                    action: "download",
                    state,
                })
            }
        }
    }

    /// Back to `Empty`
    pub fn reset(&mut self) {
        self.state = SessionState::Empty;
    }

    fn ensure_editable(&self, action: &'static str) -> Result<()> {
        match self.state {
            SessionState::Downloaded => Err(DocumentError::InvalidTransition {
                action,
                state: self.state.name(),
            }),
            _ => Ok(()),
        }
    }

    fn renderable_record(&self, action: &'static str) -> Result<&StudentRecord> {
        match &self.state {
            SessionState::Populated { record } | SessionState::Rendered { record, .. } => {
                Ok(record)
            }
            other => Err(DocumentError::InvalidTransition {
                action,
                state: other.name(),
            }),
        }
    }
}
