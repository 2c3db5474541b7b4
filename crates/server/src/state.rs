use constancias::{
    Calibration, CardComposer, DocumentComposer, RenderConfig, Settings, StudentDirectory,
    ValidatorView,
};
use tokio::sync::RwLock;

/// Shared state of the HTTP shell
pub struct AppState {
    pub settings: Settings,
    pub directory: StudentDirectory,
    pub validator: ValidatorView,
    /// Anchor points in effect; persisted to `settings.calibration_file`
    pub calibration: RwLock<Calibration>,
}

impl AppState {
    pub fn new(settings: Settings) -> constancias::Result<Self> {
        let calibration = settings.calibration()?;
        Ok(Self {
            directory: StudentDirectory::new(&settings.data_dir),
            validator: ValidatorView::new()?,
            calibration: RwLock::new(calibration),
            settings,
        })
    }

    /// Render configuration with the current calibration and signatory names
    pub async fn render_config(&self) -> RenderConfig {
        let calibration = *self.calibration.read().await;
        RenderConfig {
            directora: self.settings.directora.clone(),
            promotor: self.settings.promotor.clone(),
            ..RenderConfig::default()
        }
        .with_calibration(&calibration)
    }

    pub fn document_composer(&self, config: RenderConfig) -> DocumentComposer {
        DocumentComposer::new(
            config,
            self.settings.validation_host.clone(),
            self.settings.assets_dir.clone(),
        )
    }

    pub fn card_composer(&self, anio: i32) -> CardComposer {
        CardComposer::new(anio, self.settings.validation_host.clone())
    }
}
