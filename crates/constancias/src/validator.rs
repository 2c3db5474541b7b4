//! Public validation page reached through the certificate QR code
//!
//! The view is stateless: it confirms that the DNI in the URL belongs to a
//! document issued by the institution and shows when the check happened.

use crate::{DocumentError, Result, INSTITUTION_NAME};
use chrono::NaiveDateTime;
use tera::{Context, Tera};

const VALIDAR_TEMPLATE: &str = "validar.html";
const INICIO_TEMPLATE: &str = "inicio.html";

const VALIDAR_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Validación de documento - {{ institucion }}</title>
<style>
body { font-family: Helvetica, Arial, sans-serif; background: #f4f6f8; margin: 0; }
.card { max-width: 420px; margin: 48px auto; background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,.12); overflow: hidden; }
.banner { background: #1e8e3e; color: #fff; text-align: center; padding: 20px; font-size: 22px; font-weight: bold; }
.body { padding: 20px 24px; }
.label { color: #666; font-size: 12px; text-transform: uppercase; }
.value { font-size: 18px; margin-bottom: 14px; }
</style>
</head>
<body>
<div class="card">
  <div class="banner">DOCUMENTO VÁLIDO</div>
  <div class="body">
    <div class="label">Institución</div>
    <div class="value">{{ institucion }}</div>
    <div class="label">DNI</div>
    <div class="value" id="dni">{{ dni }}</div>
    <div class="label">Fecha de consulta</div>
    <div class="value">{{ consultado }}</div>
  </div>
</div>
</body>
</html>
"#;

const INICIO_HTML: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ institucion }}</title>
</head>
<body style="font-family: Helvetica, Arial, sans-serif; text-align: center; margin-top: 64px;">
<h1>{{ institucion }}</h1>
<p>Escanee el código QR de una constancia para validarla.</p>
</body>
</html>
"#;

/// Timestamp format shown on the validation page
const CONSULTA_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Build the URL encoded in a certificate QR code
///
/// The scheme is always `https`; any scheme or trailing slash on `host` is
/// dropped. The DNI is trimmed and every non-alphanumeric byte is
/// percent-encoded.
///
/// # Example
///
/// ```
/// use constancias::validation_url;
/// assert_eq!(
///     validation_url("https://yachay.edu.pe/", "73840561"),
///     "https://yachay.edu.pe/?validar=73840561"
/// );
/// ```
pub fn validation_url(host: &str, dni: &str) -> String {
    let host = host.trim();
    let host = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .unwrap_or(host)
        .trim_end_matches('/');

    format!("https://{host}/?validar={}", percent_encode(dni.trim()))
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Renders the validation and landing pages
pub struct ValidatorView {
    tera: Tera,
}

impl ValidatorView {
    /// Compile the page templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (VALIDAR_TEMPLATE, VALIDAR_HTML),
            (INICIO_TEMPLATE, INICIO_HTML),
        ])
        .map_err(render_error)?;
        Ok(Self { tera })
    }

    /// Page confirming the document for `dni`
    ///
    /// # Arguments
    /// * `dni` - Value of the `validar` query parameter, HTML-escaped on output
    /// * `consulted_at` - Local time of the check
    pub fn render_valid(&self, dni: &str, consulted_at: NaiveDateTime) -> Result<String> {
        let mut context = Context::new();
        context.insert("institucion", INSTITUTION_NAME);
        context.insert("dni", dni.trim());
        context.insert(
            "consultado",
            &consulted_at.format(CONSULTA_FORMAT).to_string(),
        );
        self.tera
            .render(VALIDAR_TEMPLATE, &context)
            .map_err(render_error)
    }

    /// Page shown when no DNI was given
    pub fn render_landing(&self) -> Result<String> {
        let mut context = Context::new();
        context.insert("institucion", INSTITUTION_NAME);
        self.tera
            .render(INICIO_TEMPLATE, &context)
            .map_err(render_error)
    }

    /// Dispatch on the `validar` query parameter
    ///
    /// A missing or blank value renders the landing page.
    pub fn render_query(&self, validar: Option<&str>, now: NaiveDateTime) -> Result<String> {
        match validar.map(str::trim).filter(|dni| !dni.is_empty()) {
            Some(dni) => {
                tracing::info!(dni, "document validation requested");
                self.render_valid(dni, now)
            }
            None => self.render_landing(),
        }
    }
}

fn render_error(e: tera::Error) -> DocumentError {
    DocumentError::RenderFailure(format!("validator page: {e}"))
}
