use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use constancias::{
    config::validate_year, Calibration, ConductaEntry, DocumentError, DocumentSession,
    GeneratedDocument, StudentRecord, TemplateId,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;

/// Header carrying the admin passphrase
pub const PASSPHRASE_HEADER: &str = "x-admin-passphrase";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(validar))
        .route("/api/alumnos/:dni", get(alumno))
        .route("/api/constancias", post(constancia))
        .route("/api/carnets", post(carnet))
        .route("/api/directorio", put(replace_directorio))
        .route("/api/calibracion", get(get_calibracion).put(put_calibracion))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let given = headers
        .get(PASSPHRASE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if passphrase_matches(given, &state.settings.admin_passphrase) {
        Ok(())
    } else {
        tracing::warn!("rejected admin request with wrong passphrase");
        Err(ApiError::Unauthorized)
    }
}

/// Constant-time comparison; only the length may leak
fn passphrase_matches(given: &str, expected: &str) -> bool {
    bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

/// Run spreadsheet, filesystem and PDF work off the async workers
async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> constancias::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(task).await??)
}

fn pdf_response(document: GeneratedDocument) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.filename),
            ),
        ],
        document.pdf,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ValidarQuery {
    validar: Option<String>,
}

/// Public validation page reached from the certificate QR code
pub async fn validar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ValidarQuery>,
) -> Result<Html<String>, ApiError> {
    let now = chrono::Local::now().naive_local();
    let page = state.validator.render_query(query.validar.as_deref(), now)?;
    Ok(Html(page))
}

pub async fn alumno(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(dni): Path<String>,
) -> Result<Json<StudentRecord>, ApiError> {
    require_admin(&state, &headers)?;

    let record = run_blocking(move || {
        if !state.directory.exists() {
            return Err(DocumentError::DirectoryMissing(
                state.directory.path().display().to_string(),
            ));
        }
        state
            .directory
            .lookup(&dni)?
            .ok_or_else(|| DocumentError::DirectoryLookupMiss(dni.trim().to_string()))
    })
    .await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ConstanciaRequest {
    template: TemplateId,
    dni: String,
    #[serde(default)]
    conducta: Vec<ConductaEntry>,
    anio: Option<i32>,
    frase: Option<String>,
}

pub async fn constancia(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ConstanciaRequest>,
) -> Result<Response, ApiError> {
    require_admin(&state, &headers)?;

    let mut config = state.render_config().await;
    if let Some(anio) = request.anio {
        config.anio = anio;
    }
    if let Some(frase) = request.frase {
        config.frase = frase;
    }
    config.validate()?;

    let document = run_blocking(move || {
        let composer = state.document_composer(config);
        let mut session = DocumentSession::new();
        session.populate(&state.directory, &request.dni)?;
        session.render(&composer, request.template, request.conducta)?;
        session.mark_downloaded()
    })
    .await?;

    Ok(pdf_response(document))
}

#[derive(Debug, Deserialize)]
pub struct CarnetRequest {
    dni: String,
    anio: Option<i32>,
}

pub async fn carnet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CarnetRequest>,
) -> Result<Response, ApiError> {
    require_admin(&state, &headers)?;

    let anio = match request.anio {
        Some(anio) => anio,
        None => state.render_config().await.anio,
    };
    validate_year(anio)?;

    let document = run_blocking(move || {
        let mut session = DocumentSession::new();
        session.populate(&state.directory, &request.dni)?;
        session.render_card(&state.card_composer(anio))?;
        session.mark_downloaded()
    })
    .await?;

    Ok(pdf_response(document))
}

/// Replace `base_datos.xlsx` with the raw request body
pub async fn replace_directorio(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&state, &headers)?;

    let alumnos = tokio::task::spawn_blocking(move || state.directory.replace(&body))
        .await?
        .map_err(|e| match e {
            DocumentError::Spreadsheet(msg) => ApiError::BadRequest(msg),
            other => other.into(),
        })?;
    Ok(Json(json!({ "alumnos": alumnos })))
}

pub async fn get_calibracion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Calibration>, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(*state.calibration.read().await))
}

/// Persist new anchors, then swap them in
pub async fn put_calibracion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(calibration): Json<Calibration>,
) -> Result<Json<Calibration>, ApiError> {
    require_admin(&state, &headers)?;

    if let Some(path) = state.settings.calibration_file.clone() {
        run_blocking(move || calibration.save(&path)).await?;
    }
    *state.calibration.write().await = calibration;
    tracing::info!(?calibration, "calibration updated");

    Ok(Json(calibration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};
    use constancias::{Settings, DIRECTORY_FILE};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::PathBuf;

    const PASSPHRASE: &str = "clave-de-prueba";

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../constancias/tests/fixtures")
            .join(name)
    }

    fn test_state(dir: &tempfile::TempDir, with_directory: bool) -> Arc<AppState> {
        if with_directory {
            std::fs::copy(fixture("base_datos.xlsx"), dir.path().join(DIRECTORY_FILE)).unwrap();
        }

        let vars: HashMap<&str, String> = HashMap::from([
            ("VALIDATION_HOST", "yachay.edu.pe".to_string()),
            ("ADMIN_PASSPHRASE", PASSPHRASE.to_string()),
            ("DATA_DIR", dir.path().display().to_string()),
            ("ASSETS_DIR", dir.path().display().to_string()),
            ("DIRECTORA", "Lic. ROSA CCAHUANA".to_string()),
            (
                "CALIBRATION_FILE",
                dir.path().join("calibracion.json").display().to_string(),
            ),
        ]);
        let settings = Settings::from_lookup(|key| vars.get(key).cloned()).unwrap();
        Arc::new(AppState::new(settings).unwrap())
    }

    fn admin() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(PASSPHRASE_HEADER, HeaderValue::from_static(PASSPHRASE));
        headers
    }

    fn status_of<T>(result: Result<T, ApiError>) -> StatusCode {
        match result {
            Ok(_) => StatusCode::OK,
            Err(e) => e.status_code(),
        }
    }

    fn constancia_request(template: TemplateId, dni: &str) -> ConstanciaRequest {
        ConstanciaRequest {
            template,
            dni: dni.to_string(),
            conducta: Vec::new(),
            anio: Some(2026),
            frase: None,
        }
    }

    #[tokio::test]
    async fn test_validar_page() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, false);

        let Html(page) = validar(
            State(state.clone()),
            Query(ValidarQuery {
                validar: Some("73840561".to_string()),
            }),
        )
        .await
        .unwrap();
        assert!(page.contains("DOCUMENTO VÁLIDO"));
        assert!(page.contains("73840561"));

        let Html(landing) = validar(State(state), Query(ValidarQuery { validar: None }))
            .await
            .unwrap();
        assert!(!landing.contains("DOCUMENTO VÁLIDO"));
    }

    #[tokio::test]
    async fn test_admin_routes_require_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, true);

        let missing = alumno(State(state.clone()), HeaderMap::new(), Path("73840561".into())).await;
        assert_eq!(status_of(missing), StatusCode::UNAUTHORIZED);

        let mut wrong = HeaderMap::new();
        wrong.insert(PASSPHRASE_HEADER, HeaderValue::from_static("otra"));
        let rejected = alumno(State(state), wrong, Path("73840561".into())).await;
        assert_eq!(status_of(rejected), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_passphrase_comparison() {
        assert!(passphrase_matches(PASSPHRASE, PASSPHRASE));
        // Same length, last byte differs
        assert!(!passphrase_matches("clave-de-pruebo", PASSPHRASE));
        assert!(!passphrase_matches("clave-de-prueba-2", PASSPHRASE));
        assert!(!passphrase_matches("clave", PASSPHRASE));
        assert!(!passphrase_matches("", PASSPHRASE));
    }

    #[tokio::test]
    async fn test_wrong_passphrase_of_equal_length() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, true);

        let mut wrong = HeaderMap::new();
        wrong.insert(PASSPHRASE_HEADER, HeaderValue::from_static("clave-de-pruebo"));
        assert_eq!(wrong[PASSPHRASE_HEADER].len(), PASSPHRASE.len());

        let rejected = get_calibracion(State(state), wrong).await;
        assert_eq!(status_of(rejected), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_alumno_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, true);

        let Json(record) = alumno(State(state.clone()), admin(), Path(" 73840561 ".into()))
            .await
            .unwrap();
        assert_eq!(record.alumno, "JUAN PEREZ");

        let miss = alumno(State(state), admin(), Path("00000000".into())).await;
        assert_eq!(status_of(miss), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_constancia_download() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, true);

        let response = constancia(
            State(state),
            admin(),
            Json(constancia_request(TemplateId::Vacante, "73840561")),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"VACANTE_73840561.pdf\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_constancia_errors() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, true);

        let miss = constancia(
            State(state.clone()),
            admin(),
            Json(constancia_request(TemplateId::Estudios, "99999999")),
        )
        .await;
        assert_eq!(status_of(miss), StatusCode::NOT_FOUND);

        let mut request = constancia_request(TemplateId::Estudios, "73840561");
        request.anio = Some(2031);
        let bad_year = constancia(State(state), admin(), Json(request)).await;
        assert_eq!(status_of(bad_year), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_constancia_without_directory() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, false);

        let result = constancia(
            State(state.clone()),
            admin(),
            Json(constancia_request(TemplateId::Vacante, "73840561")),
        )
        .await;
        assert_eq!(status_of(result), StatusCode::SERVICE_UNAVAILABLE);

        let response = alumno(State(state), admin(), Path("73840561".into()))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Student directory not found:"), "{message}");
        assert!(message.contains("base_datos.xlsx"), "{message}");
    }

    #[tokio::test]
    async fn test_carnet_download() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, true);

        let response = carnet(
            State(state),
            admin(),
            Json(CarnetRequest {
                dni: "73840561".to_string(),
                anio: Some(2026),
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Carnet_73840561.pdf\""
        );
    }

    #[tokio::test]
    async fn test_replace_directorio() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, false);

        let garbage = replace_directorio(
            State(state.clone()),
            admin(),
            Bytes::from_static(b"not a workbook"),
        )
        .await;
        assert_eq!(status_of(garbage), StatusCode::BAD_REQUEST);

        let upload = Bytes::from(std::fs::read(fixture("base_datos.xlsx")).unwrap());
        let Json(summary) = replace_directorio(State(state.clone()), admin(), upload)
            .await
            .unwrap();
        assert_eq!(summary["alumnos"], 4);

        assert!(alumno(State(state), admin(), Path("71234567".into())).await.is_ok());
    }

    #[tokio::test]
    async fn test_calibration_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, false);

        let Json(initial) = get_calibracion(State(state.clone()), admin()).await.unwrap();
        assert_eq!(initial, Calibration::default());

        let updated = Calibration {
            y_frase: 800,
            y_titulo: 720,
            qr_x: 470,
            qr_y: 45,
        };
        put_calibracion(State(state.clone()), admin(), Json(updated))
            .await
            .unwrap();

        let Json(current) = get_calibracion(State(state.clone()), admin()).await.unwrap();
        assert_eq!(current, updated);
        assert_eq!(state.render_config().await.y_titulo, 720);

        let persisted = Calibration::load(&dir.path().join("calibracion.json")).unwrap();
        assert_eq!(persisted, updated);
    }
}
