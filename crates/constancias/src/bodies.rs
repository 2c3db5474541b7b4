//! Per-template certificate bodies

use crate::layout::{
    draw_bullets, draw_centered, draw_hrule, draw_paragraph, draw_text, TextStyle,
};
use crate::record::{ConductaEntry, CONDUCTA_ROWS};
use crate::{DocumentRequest, RenderConfig, TemplateId};
use pdf_core::{Align, PdfDocument};

/// Left margin of every body
pub(crate) const BODY_X: f64 = 60.0;

/// Distance from the title baseline to the first body line
pub(crate) const BODY_OFFSET: f64 = 45.0;

const BODY: TextStyle = TextStyle::regular(12.0);
const BODY_LEADING: f64 = 18.0;
const PARAGRAPH_GAP: f64 = 10.0;

const PREAMBLE: &str = "La Directora de la Institución Educativa Particular Alternativo Yachay, \
del distrito de Chinchero, provincia de Urubamba, región Cusco, que suscribe:";

/// Documents a family must bring to claim a vacancy
pub const VACANTE_DOCUMENTS: [&str; 6] = [
    "Certificado de Estudios original.",
    "Resolución de traslado.",
    "Libreta de SIAGIE.",
    "Ficha única de matrícula.",
    "Copia DNI (Alumno y Padres).",
    "Constancia de no Deudor.",
];

/// Grade labels of the CONDUCTA table rows
pub const CONDUCTA_GRADES: [&str; CONDUCTA_ROWS] =
    ["PRIMERO", "SEGUNDO", "TERCERO", "CUARTO", "QUINTO"];

/// Placeholder row of an empty CONDUCTA table
pub const SIN_INFORMACION: &str = "-- Sin información --";

/// Clauses of the parental commitment letter
pub const COMPROMISO_CLAUSES: [&str; 14] = [
    "Enviar a mi menor hijo(a) puntualmente a la institución, respetando el horario de ingreso y salida.",
    "Velar por la correcta presentación personal de mi menor hijo(a) y el uso adecuado del uniforme escolar.",
    "Asistir a las reuniones, asambleas y citaciones convocadas por la Dirección, los tutores o los docentes.",
    "Cumplir puntualmente con el pago de las pensiones de enseñanza dentro de los plazos establecidos.",
    "Supervisar diariamente el cumplimiento de las tareas y responsabilidades académicas de mi menor hijo(a).",
    "Justificar por escrito las inasistencias y tardanzas de mi menor hijo(a) dentro de las 48 horas.",
    "Respetar y hacer respetar el Reglamento Interno de la institución.",
    "Mantener un trato respetuoso con el personal directivo, docente y administrativo, y con los demás padres de familia.",
    "Asumir la reparación de los daños que mi menor hijo(a) ocasione a la infraestructura o al mobiliario de la institución.",
    "Participar en las actividades cívicas, culturales, deportivas y de proyección a la comunidad.",
    "Controlar que mi menor hijo(a) no utilice celulares ni otros dispositivos electrónicos durante las clases.",
    "Informar oportunamente sobre cualquier problema de salud o situación familiar que afecte el aprendizaje.",
    "Recoger personalmente a mi menor hijo(a) o autorizar por escrito a la persona que lo hará.",
    "Aceptar las medidas formativas que disponga la institución ante las faltas de conducta.",
];

/// Closing line of the commitment letter
pub const COMPROMISO_CLOSING: &str = "La mejor herencia es la educación.";

/// Baseline of the commitment letter signature lines
pub(crate) const COMPROMISO_SIGNATURE_Y: f64 = 90.0;

/// Student fields as printed in the body
struct Fields {
    alumno: String,
    dni: String,
    grado: String,
    apoderado: String,
    dni_apo: String,
}

impl Fields {
    fn from_request(request: &DocumentRequest) -> Self {
        let student = &request.student;
        Self {
            alumno: student.alumno.trim().to_uppercase(),
            dni: student.dni.trim().to_string(),
            grado: student.grado.trim().to_uppercase(),
            apoderado: student.apoderado.trim().to_uppercase(),
            dni_apo: student.dni_apo.trim().to_string(),
        }
    }
}

/// Draw the template-specific body below the title
pub(crate) fn draw_body(doc: &mut PdfDocument, request: &DocumentRequest, config: &RenderConfig) {
    let fields = Fields::from_request(request);
    let y = config.y_titulo as f64 - BODY_OFFSET;

    match request.template {
        TemplateId::Vacante => vacante(doc, &fields, config.anio, y),
        TemplateId::NoDeudor => no_deudor(doc, &fields, y),
        TemplateId::Estudios => estudios(doc, &fields, config.anio, y),
        TemplateId::Conducta => conducta(doc, &fields, &request.conducta, y),
        TemplateId::Trabajo => trabajo(doc, &fields, config.anio, y),
        TemplateId::Compromiso => compromiso(doc, &fields, config, y),
    }
}

fn text_width(doc: &PdfDocument) -> f64 {
    doc.width() - 2.0 * BODY_X
}

/// Body paragraph followed by the paragraph gap
fn paragraph(doc: &mut PdfDocument, text: &str, y: f64) -> f64 {
    let width = text_width(doc);
    draw_paragraph(doc, text, BODY_X, y, width, BODY, BODY_LEADING) - PARAGRAPH_GAP
}

fn hace_constar(doc: &mut PdfDocument, y: f64) -> f64 {
    draw_text(doc, "HACE CONSTAR:", BODY_X, y, TextStyle::bold(12.0), Align::Left);
    y - BODY_LEADING - PARAGRAPH_GAP
}

fn vacante(doc: &mut PdfDocument, f: &Fields, anio: i32, y: f64) {
    let mut y = paragraph(doc, PREAMBLE, y);
    y = hace_constar(doc, y);
    y = paragraph(
        doc,
        &format!(
            "Que, existe vacante disponible en el NIVEL {} - Para el/la alumno(a) {} CON DNI {}. \
             Para el año escolar {anio}.",
            f.grado, f.alumno, f.dni
        ),
        y,
    );
    y = paragraph(doc, "Por lo que se debe consignar los siguientes documentos:", y);

    let width = text_width(doc);
    y = draw_bullets(
        doc,
        &VACANTE_DOCUMENTS,
        BODY_X + 20.0,
        y,
        width - 20.0,
        TextStyle::regular(11.0),
        15.0,
    ) - PARAGRAPH_GAP;

    y = paragraph(doc, "Se expide a solicitud del Padre/Madre:", y);
    let center = doc.width() / 2.0;
    draw_centered(
        doc,
        &format!("{} CON DNI {}", f.apoderado, f.dni_apo),
        center,
        y,
        TextStyle::bold(12.0),
    );
}

fn no_deudor(doc: &mut PdfDocument, f: &Fields, y: f64) {
    let mut y = paragraph(doc, PREAMBLE, y);
    y = hace_constar(doc, y);
    y = paragraph(
        doc,
        &format!(
            "Que el (la) estudiante: {} CON DNI {}. No presenta ninguna deuda ni por matrícula \
             ni por mensualidades.",
            f.alumno, f.dni
        ),
        y,
    );
    paragraph(doc, "Se expide a petición escrita del apoderado.", y);
}

fn estudios(doc: &mut PdfDocument, f: &Fields, anio: i32, y: f64) {
    let mut y = paragraph(doc, PREAMBLE, y);
    y = hace_constar(doc, y);
    y = paragraph(
        doc,
        &format!(
            "Que, la alumna(o), {} CON DNI {}. Se encuentra matriculado en esta institución \
             para este año escolar {anio} en el NIVEL {}.",
            f.alumno, f.dni, f.grado
        ),
        y,
    );
    paragraph(
        doc,
        &format!(
            "Demostrando puntualidad y responsabilidad. Se expide a solicitud del Apoderado {} DNI {}.",
            f.apoderado, f.dni_apo
        ),
        y,
    );
}

fn conducta(
    doc: &mut PdfDocument,
    f: &Fields,
    entries: &[ConductaEntry; CONDUCTA_ROWS],
    y: f64,
) {
    let mut y = paragraph(
        doc,
        &format!(
            "Que, {} CON DNI {}, ha cursado estudios obteniendo las siguientes calificaciones:",
            f.alumno, f.dni
        ),
        y,
    );

    let tx = doc.width() / 2.0 - 120.0;
    let header = TextStyle::bold(11.0);
    let cell = TextStyle::regular(11.0);

    y -= 6.0;
    for (offset, label) in [(0.0, "GRADO"), (100.0, "AÑO"), (200.0, "NOTA")] {
        draw_text(doc, label, tx + offset, y, header, Align::Left);
    }
    draw_hrule(doc, tx - 10.0, tx + 250.0, y - 5.0);
    y -= 22.0;

    let mut drawn = 0;
    for (grade, entry) in CONDUCTA_GRADES.iter().zip(entries) {
        if !entry.has_data() {
            continue;
        }
        draw_text(doc, grade, tx, y, cell, Align::Left);
        draw_text(doc, entry.anio.trim(), tx + 100.0, y, cell, Align::Left);
        draw_text(doc, entry.nota.trim(), tx + 200.0, y, cell, Align::Left);
        y -= BODY_LEADING;
        drawn += 1;
    }

    if drawn == 0 {
        draw_text(doc, SIN_INFORMACION, tx, y, cell, Align::Left);
        y -= BODY_LEADING;
    }

    paragraph(doc, "Se expide a solicitud del interesado.", y - PARAGRAPH_GAP);
}

fn trabajo(doc: &mut PdfDocument, f: &Fields, anio: i32, y: f64) {
    let mut y = hace_constar(doc, y);
    y = paragraph(
        doc,
        &format!(
            "Que, el/la Docente: {} CON DNI {}, ha laborado en el nivel {}, durante el año \
             escolar {}.",
            f.alumno,
            f.dni,
            f.grado,
            anio - 1
        ),
        y,
    );
    y = paragraph(doc, "Demostrando puntualidad, liderazgo y responsabilidad.", y);
    paragraph(doc, "Se expide a solicitud del interesado.", y);
}

fn compromiso(doc: &mut PdfDocument, f: &Fields, config: &RenderConfig, y: f64) {
    let width = text_width(doc);
    let mut y = draw_paragraph(
        doc,
        &format!(
            "Yo {} con DNI N° {}, padre/madre de {}.",
            f.apoderado, f.dni_apo, f.alumno
        ),
        BODY_X,
        y,
        width,
        BODY,
        16.0,
    ) - 4.0;
    y = draw_paragraph(
        doc,
        "Me comprometo a cumplir las siguientes disposiciones:",
        BODY_X,
        y,
        width,
        BODY,
        16.0,
    ) - 4.0;

    let clause = TextStyle::regular(10.0);
    for (i, text) in COMPROMISO_CLAUSES.iter().enumerate() {
        draw_text(doc, &format!("{}.", i + 1), BODY_X, y, clause, Align::Left);
        y = draw_paragraph(doc, text, BODY_X + 18.0, y, width - 18.0, clause, 13.0) - 3.0;
    }

    let center = doc.width() / 2.0;
    draw_centered(doc, COMPROMISO_CLOSING, center, y - 10.0, TextStyle::italic(11.0));

    compromiso_signatures(doc, config);
}

/// Three-column signature footer of the commitment letter
fn compromiso_signatures(doc: &mut PdfDocument, config: &RenderConfig) {
    let line_y = COMPROMISO_SIGNATURE_Y;
    let caption_y = line_y - 15.0;
    let label_y = caption_y - 10.0;
    let name = TextStyle::bold(9.0);
    let label = TextStyle::regular(8.0);

    for (x1, x2) in [(80.0, 220.0), (240.0, 380.0), (400.0, 540.0)] {
        draw_hrule(doc, x1, x2, line_y);
    }

    draw_centered(doc, "PADRE/MADRE", 150.0, caption_y, name);
    draw_centered(doc, config.directora.trim(), 310.0, caption_y, name);
    draw_centered(doc, "DIRECTORA", 310.0, label_y, label);
    draw_centered(doc, config.promotor.trim(), 470.0, caption_y, name);
    draw_centered(doc, "PROMOTOR", 470.0, label_y, label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StudentRecord;

    fn request(template: TemplateId) -> DocumentRequest {
        DocumentRequest::new(
            template,
            StudentRecord {
                alumno: "juan perez".to_string(),
                dni: " 73840561 ".to_string(),
                grado: "Tercero".to_string(),
                apoderado: "María López".to_string(),
                dni_apo: "11112222".to_string(),
            },
        )
    }

    fn config() -> RenderConfig {
        RenderConfig {
            anio: 2026,
            ..RenderConfig::default()
        }
    }

    fn body_text(template: TemplateId) -> String {
        let mut doc = PdfDocument::a4();
        draw_body(&mut doc, &request(template), &config());
        String::from_utf8_lossy(doc.content()).into_owned()
    }

    #[test]
    fn test_fields_are_normalized() {
        let fields = Fields::from_request(&request(TemplateId::Vacante));
        assert_eq!(fields.alumno, "JUAN PEREZ");
        assert_eq!(fields.dni, "73840561");
        assert_eq!(fields.grado, "TERCERO");
        assert_eq!(fields.apoderado, "MARÍA LÓPEZ");
    }

    #[test]
    fn test_body_starts_below_title() {
        let content = body_text(TemplateId::Trabajo);
        // y_titulo 730 - 45
        assert!(content.contains("60 685 Td\n(HACE CONSTAR:) Tj"));
    }

    #[test]
    fn test_vacante_lists_documents() {
        let content = body_text(TemplateId::Vacante);
        assert!(content.contains("(Libreta de SIAGIE.) Tj"));
        assert!(content.contains("(Constancia de no Deudor.) Tj"));
    }

    #[test]
    fn test_compromiso_numbers_every_clause() {
        let content = body_text(TemplateId::Compromiso);
        for n in 1..=14 {
            assert!(content.contains(&format!("({n}.) Tj")), "clause {n}");
        }
        assert!(content.contains("80 90 m\n220 90 l"));
        assert!(content.contains("400 90 m\n540 90 l"));
    }

    #[test]
    fn test_clause_count_and_text() {
        assert_eq!(COMPROMISO_CLAUSES.len(), 14);
        assert!(COMPROMISO_CLAUSES.iter().all(|c| c.ends_with('.')));
    }
}
