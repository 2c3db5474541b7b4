//! Registry of the six certificate templates

use crate::DocumentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Certificate template identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateId {
    Vacante,
    NoDeudor,
    Estudios,
    Conducta,
    Trabajo,
    Compromiso,
}

impl TemplateId {
    /// All templates in menu order
    pub const ALL: [TemplateId; 6] = [
        TemplateId::Vacante,
        TemplateId::NoDeudor,
        TemplateId::Estudios,
        TemplateId::Conducta,
        TemplateId::Trabajo,
        TemplateId::Compromiso,
    ];

    /// Identifier as used in filenames and requests
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Vacante => "VACANTE",
            TemplateId::NoDeudor => "NO_DEUDOR",
            TemplateId::Estudios => "ESTUDIOS",
            TemplateId::Conducta => "CONDUCTA",
            TemplateId::Trabajo => "TRABAJO",
            TemplateId::Compromiso => "COMPROMISO",
        }
    }

    /// Title drawn under the header
    pub fn title(&self) -> &'static str {
        match self {
            TemplateId::Vacante => "CONSTANCIA DE VACANTE",
            TemplateId::NoDeudor => "CONSTANCIA DE NO ADEUDO",
            TemplateId::Estudios => "CONSTANCIA DE ESTUDIOS",
            TemplateId::Conducta => "CONSTANCIA DE CONDUCTA",
            TemplateId::Trabajo => "CONSTANCIA DE TRABAJO",
            TemplateId::Compromiso => "CARTA DE COMPROMISO",
        }
    }

    /// Whether the slogan, date, signature block and validation QR are skipped
    ///
    /// The commitment letter carries its own three-column signature footer.
    pub fn omit_common_chrome(&self) -> bool {
        matches!(self, TemplateId::Compromiso)
    }

    /// Download filename for a given DNI
    pub fn filename(&self, dni: &str) -> String {
        format!(
            "{}_{}.pdf",
            self.as_str(),
            crate::sanitize_filename_part(dni, "SIN_DNI")
        )
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TemplateId::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DocumentError::UnknownTemplate(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_only_compromiso_omits_chrome() {
        let omitted: Vec<_> = TemplateId::ALL
            .into_iter()
            .filter(|t| t.omit_common_chrome())
            .collect();
        assert_eq!(omitted, vec![TemplateId::Compromiso]);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("VACANTE".parse::<TemplateId>().unwrap(), TemplateId::Vacante);
        assert_eq!(" no_deudor ".parse::<TemplateId>().unwrap(), TemplateId::NoDeudor);
        assert!(matches!(
            "CERTIFICADO".parse::<TemplateId>(),
            Err(DocumentError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for template in TemplateId::ALL {
            assert_eq!(template.to_string().parse::<TemplateId>().unwrap(), template);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&TemplateId::NoDeudor).unwrap();
        assert_eq!(json, "\"NO_DEUDOR\"");
        let parsed: TemplateId = serde_json::from_str("\"COMPROMISO\"").unwrap();
        assert_eq!(parsed, TemplateId::Compromiso);
    }

    #[test]
    fn test_filename() {
        assert_eq!(TemplateId::Trabajo.filename("73840561"), "TRABAJO_73840561.pdf");
        assert_eq!(TemplateId::Vacante.filename(" 7384/0561 "), "VACANTE_73840561.pdf");
    }

    #[test]
    fn test_titles() {
        assert_eq!(TemplateId::Vacante.title(), "CONSTANCIA DE VACANTE");
        assert_eq!(TemplateId::Compromiso.title(), "CARTA DE COMPROMISO");
    }
}
