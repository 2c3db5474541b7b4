//! Render configuration, calibration and deployment settings

use crate::{DocumentError, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Earliest document year
pub const MIN_YEAR: i32 = 2024;

/// Latest document year
pub const MAX_YEAR: i32 = 2030;

/// Institution slogan used when none is configured
pub const DEFAULT_FRASE: &str = "AÑO DE LA ESPERANZA Y EL FORTALECIMIENTO DE LA DEMOCRACIA";

/// Per-render configuration of the certificate composer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Institution slogan drawn above the date
    pub frase: String,
    /// Document year
    pub anio: i32,
    /// Slogan baseline
    pub y_frase: i32,
    /// Title baseline
    pub y_titulo: i32,
    /// Left edge of the validation QR
    pub qr_x: i32,
    /// Bottom edge of the validation QR
    pub qr_y: i32,
    /// Director display name
    pub directora: String,
    /// Promoter display name
    pub promotor: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let calibration = Calibration::default();
        Self {
            frase: DEFAULT_FRASE.to_string(),
            anio: current_year().clamp(MIN_YEAR, MAX_YEAR),
            y_frase: calibration.y_frase,
            y_titulo: calibration.y_titulo,
            qr_x: calibration.qr_x,
            qr_y: calibration.qr_y,
            directora: String::new(),
            promotor: String::new(),
        }
    }
}

impl RenderConfig {
    /// Reject document years outside the supported range
    pub fn validate(&self) -> Result<()> {
        validate_year(self.anio)
    }

    /// Replace the anchor points with calibrated ones
    pub fn with_calibration(mut self, calibration: &Calibration) -> Self {
        self.y_frase = calibration.y_frase;
        self.y_titulo = calibration.y_titulo;
        self.qr_x = calibration.qr_x;
        self.qr_y = calibration.qr_y;
        self
    }

    /// Current anchor points
    pub fn calibration(&self) -> Calibration {
        Calibration {
            y_frase: self.y_frase,
            y_titulo: self.y_titulo,
            qr_x: self.qr_x,
            qr_y: self.qr_y,
        }
    }
}

/// Check a document year against [`MIN_YEAR`]..=[`MAX_YEAR`]
pub fn validate_year(anio: i32) -> Result<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&anio) {
        Ok(())
    } else {
        Err(DocumentError::YearOutOfRange(anio))
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Deployment-tuned anchor points of the certificate layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub y_frase: i32,
    pub y_titulo: i32,
    pub qr_x: i32,
    pub qr_y: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            y_frase: 790,
            y_titulo: 730,
            qr_x: 480,
            qr_y: 50,
        }
    }
}

impl Calibration {
    /// Load calibration from a JSON file
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no calibration file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&data).map_err(|e| {
            DocumentError::Config(format!("invalid calibration file {}: {e}", path.display()))
        })
    }

    /// Persist calibration as JSON
    ///
    /// Written to a temporary file in the same directory and renamed over the
    /// target, so readers never see a partial file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| DocumentError::Config(format!("cannot serialize calibration: {e}")))?;
        write_atomic(path, &json)?;
        tracing::info!(path = %path.display(), "calibration saved");
        Ok(())
    }
}

/// Replace `path` with `data` through a sibling temporary file
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| DocumentError::Io(e.error))?;
    Ok(())
}

/// Deployment settings read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    /// Host part of the validation URL
    pub validation_host: String,
    /// Passphrase required by the admin endpoints
    pub admin_passphrase: String,
    /// Directory holding `base_datos.xlsx`
    pub data_dir: PathBuf,
    /// Directory searched for `fondo.png`
    pub assets_dir: PathBuf,
    pub directora: String,
    pub promotor: String,
    /// Persisted calibration, if any
    pub calibration_file: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Read settings from the process environment
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| DocumentError::Config(format!("{key} must be set")))
        };

        let validation_host = required("VALIDATION_HOST")?;
        let admin_passphrase = required("ADMIN_PASSPHRASE")?;

        let data_dir = PathBuf::from(var("DATA_DIR").unwrap_or_else(|| ".".to_string()));
        let assets_dir = PathBuf::from(var("ASSETS_DIR").unwrap_or_else(|| ".".to_string()));
        let directora = var("DIRECTORA").unwrap_or_default();
        let promotor = var("PROMOTOR").unwrap_or_default();
        let calibration_file = var("CALIBRATION_FILE").map(PathBuf::from);

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|_| DocumentError::Config(format!("PORT is not a valid port: {port}")))?,
            None => 8080,
        };

        Ok(Self {
            validation_host,
            admin_passphrase,
            data_dir,
            assets_dir,
            directora,
            promotor,
            calibration_file,
            host,
            port,
        })
    }

    /// Stored calibration, or the defaults when none is configured
    pub fn calibration(&self) -> Result<Calibration> {
        match &self.calibration_file {
            Some(path) => Calibration::load(path),
            None => Ok(Calibration::default()),
        }
    }

    /// Default render configuration for this deployment
    pub fn render_config(&self) -> Result<RenderConfig> {
        let config = RenderConfig {
            directora: self.directora.clone(),
            promotor: self.promotor.clone(),
            ..RenderConfig::default()
        };
        Ok(config.with_calibration(&self.calibration()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_render_config_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.frase, DEFAULT_FRASE);
        assert_eq!(config.y_frase, 790);
        assert_eq!(config.y_titulo, 730);
        assert_eq!(config.qr_x, 480);
        assert_eq!(config.qr_y, 50);
        assert!((MIN_YEAR..=MAX_YEAR).contains(&config.anio));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_year_bounds() {
        assert!(validate_year(2024).is_ok());
        assert!(validate_year(2030).is_ok());
        assert!(matches!(validate_year(2023), Err(DocumentError::YearOutOfRange(2023))));
        assert!(matches!(validate_year(2031), Err(DocumentError::YearOutOfRange(2031))));
    }

    #[test]
    fn test_render_config_partial_json() {
        let config: RenderConfig = serde_json::from_str(r#"{"anio": 2026, "qr_x": 400}"#).unwrap();
        assert_eq!(config.anio, 2026);
        assert_eq!(config.qr_x, 400);
        assert_eq!(config.y_titulo, 730);
    }

    #[test]
    fn test_with_calibration() {
        let calibration = Calibration {
            y_frase: 800,
            y_titulo: 720,
            qr_x: 470,
            qr_y: 40,
        };
        let config = RenderConfig::default().with_calibration(&calibration);
        assert_eq!(config.calibration(), calibration);
    }

    #[test]
    fn test_calibration_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let calibration = Calibration::load(&dir.path().join("calibracion.json")).unwrap();
        assert_eq!(calibration, Calibration::default());
    }

    #[test]
    fn test_calibration_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibracion.json");
        let calibration = Calibration {
            y_frase: 795,
            y_titulo: 725,
            qr_x: 470,
            qr_y: 45,
        };

        calibration.save(&path).unwrap();
        assert_eq!(Calibration::load(&path).unwrap(), calibration);

        // Only the target remains in the directory
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_calibration_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibracion.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(Calibration::load(&path), Err(DocumentError::Config(_))));
    }

    #[test]
    fn test_settings_requires_passphrase() {
        let result = Settings::from_lookup(lookup_from(&[("VALIDATION_HOST", "yachay.edu.pe")]));
        match result {
            Err(DocumentError::Config(msg)) => assert!(msg.contains("ADMIN_PASSPHRASE")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("VALIDATION_HOST", "yachay.edu.pe"),
            ("ADMIN_PASSPHRASE", "clave-de-prueba"),
        ]))
        .unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("."));
        assert_eq!(settings.assets_dir, PathBuf::from("."));
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.calibration_file, None);
        assert_eq!(settings.calibration().unwrap(), Calibration::default());
    }

    #[test]
    fn test_settings_full() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("VALIDATION_HOST", "yachay.edu.pe"),
            ("ADMIN_PASSPHRASE", "clave-de-prueba"),
            ("DATA_DIR", "/srv/yachay/data"),
            ("DIRECTORA", "Lic. ROSA CCAHUANA"),
            ("PROMOTOR", "Prof. JULIO HUAMAN"),
            ("PORT", "3000"),
        ]))
        .unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("/srv/yachay/data"));
        assert_eq!(settings.port, 3000);

        let config = settings.render_config().unwrap();
        assert_eq!(config.directora, "Lic. ROSA CCAHUANA");
        assert_eq!(config.promotor, "Prof. JULIO HUAMAN");
    }

    #[test]
    fn test_settings_invalid_port() {
        let result = Settings::from_lookup(lookup_from(&[
            ("VALIDATION_HOST", "yachay.edu.pe"),
            ("ADMIN_PASSPHRASE", "x"),
            ("PORT", "ochenta"),
        ]));
        assert!(matches!(result, Err(DocumentError::Config(_))));
    }
}
