//! Spanish date formatting

use chrono::{Datelike, NaiveDate};

/// Spanish month names
const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish month name for a month number (1-12)
///
/// Out-of-range months yield an empty string.
pub fn month_es(month: u32) -> &'static str {
    let month_idx = month.saturating_sub(1) as usize;
    MONTHS_ES.get(month_idx).copied().unwrap_or("")
}

/// Place-and-date line of a certificate (e.g. "Chinchero, 18 de Octubre del 2026")
///
/// Day and month come from `today`; the year is the document year, which may
/// differ from the calendar year.
///
/// # Arguments
/// * `today` - Wall-clock date
/// * `anio` - Document year
pub fn format_fecha(today: NaiveDate, anio: i32) -> String {
    format!(
        "Chinchero, {} de {} del {}",
        today.day(),
        month_es(today.month()),
        anio
    )
}
