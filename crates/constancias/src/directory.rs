//! Student directory backed by `base_datos.xlsx`
//!
//! The first worksheet is read with its first row as the header. Columns are
//! matched by name: `Alumno` and `DNI` are required, `Grado`, `Apoderado` and
//! `DNI_Apoderado` are optional. Any other column (e.g. `Observaciones`) is
//! ignored.

use crate::config::write_atomic;
use crate::{DocumentError, Result, StudentRecord};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

/// Spreadsheet file name inside the data directory
pub const DIRECTORY_FILE: &str = "base_datos.xlsx";

const COL_ALUMNO: &str = "Alumno";
const COL_DNI: &str = "DNI";
const COL_GRADO: &str = "Grado";
const COL_APODERADO: &str = "Apoderado";
const COL_DNI_APO: &str = "DNI_Apoderado";

/// Read-only view of the student spreadsheet
///
/// Every call re-reads the file, so an upload through [`replace`] is seen by
/// the next lookup without a restart.
///
/// [`replace`]: StudentDirectory::replace
#[derive(Debug, Clone)]
pub struct StudentDirectory {
    path: PathBuf,
}

impl StudentDirectory {
    /// Directory stored as `base_datos.xlsx` under `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(DIRECTORY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the spreadsheet file is present
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// All student rows, or `None` when the spreadsheet is missing
    pub fn load(&self) -> Result<Option<Vec<StudentRecord>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "student directory not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let records = parse_workbook(BufReader::new(file))?;
        tracing::debug!(rows = records.len(), "student directory loaded");
        Ok(Some(records))
    }

    /// First record whose DNI equals `dni`, both sides trimmed
    ///
    /// A missing spreadsheet and an unknown DNI both yield `None`.
    pub fn lookup(&self, dni: &str) -> Result<Option<StudentRecord>> {
        let query = dni.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let Some(records) = self.load()? else {
            return Ok(None);
        };

        Ok(records.into_iter().find(|r| r.dni.trim() == query))
    }

    /// Replace the spreadsheet with an uploaded one
    ///
    /// The upload is parsed before anything is written; a workbook without
    /// the required columns leaves the current file untouched.
    ///
    /// # Returns
    /// The number of student rows in the new spreadsheet.
    pub fn replace(&self, bytes: &[u8]) -> Result<usize> {
        let records = parse_workbook(Cursor::new(bytes))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        write_atomic(&self.path, bytes)?;

        tracing::info!(
            path = %self.path.display(),
            rows = records.len(),
            "student directory replaced"
        );
        Ok(records.len())
    }
}

/// Header positions of the known columns
struct Columns {
    alumno: usize,
    dni: usize,
    grado: Option<usize>,
    apoderado: Option<usize>,
    dni_apo: Option<usize>,
}

impl Columns {
    fn from_header(header: &[Data]) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|cell| cell_to_string(cell).trim() == name)
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                DocumentError::Spreadsheet(format!("missing required column {name:?}"))
            })
        };

        Ok(Self {
            alumno: require(COL_ALUMNO)?,
            dni: require(COL_DNI)?,
            grado: find(COL_GRADO),
            apoderado: find(COL_APODERADO),
            dni_apo: find(COL_DNI_APO),
        })
    }

    fn record(&self, row: &[Data]) -> StudentRecord {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(|c| cell_to_string(c).trim().to_string())
                .unwrap_or_default()
        };

        StudentRecord {
            alumno: cell(Some(self.alumno)),
            dni: cell(Some(self.dni)),
            grado: cell(self.grado),
            apoderado: cell(self.apoderado),
            dni_apo: cell(self.dni_apo),
        }
    }
}

fn parse_workbook<RS: Read + Seek>(reader: RS) -> Result<Vec<StudentRecord>> {
    let mut workbook: Xlsx<RS> = open_workbook_from_rs(reader)
        .map_err(|e| DocumentError::Spreadsheet(format!("cannot open workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DocumentError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| DocumentError::Spreadsheet(format!("cannot read worksheet: {e}")))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| DocumentError::Spreadsheet("worksheet is empty".to_string()))?;
    let columns = Columns::from_header(header)?;

    Ok(rows
        .map(|row| columns.record(row))
        .filter(|r| {
            !(r.alumno.is_empty()
                && r.dni.is_empty()
                && r.grado.is_empty()
                && r.apoderado.is_empty()
                && r.dni_apo.is_empty())
        })
        .collect())
}

/// Cell text as a user would read it in the spreadsheet
///
/// Whole numbers lose their `.0` so numeric DNIs compare as text.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(73840561.0)), "73840561");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Int(40506070)), "40506070");
        assert_eq!(cell_to_string(&Data::String(" 701 ".into())), " 701 ");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn test_columns_from_header() {
        let header = vec![
            Data::String("Alumno".into()),
            Data::String(" DNI ".into()),
            Data::String("Observaciones".into()),
            Data::String("Grado".into()),
        ];
        let columns = Columns::from_header(&header).unwrap();
        assert_eq!(columns.alumno, 0);
        assert_eq!(columns.dni, 1);
        assert_eq!(columns.grado, Some(3));
        assert_eq!(columns.apoderado, None);

        let record = columns.record(&[
            Data::String("ANA".into()),
            Data::Float(70112233.0),
        ]);
        assert_eq!(record.dni, "70112233");
        assert_eq!(record.grado, "");
    }

    #[test]
    fn test_columns_require_dni() {
        let header = vec![Data::String("Alumno".into()), Data::String("dni".into())];
        assert!(matches!(
            Columns::from_header(&header),
            Err(DocumentError::Spreadsheet(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let directory = StudentDirectory::new(dir.path());
        assert!(!directory.exists());
        assert_eq!(directory.load().unwrap(), None);
        assert_eq!(directory.lookup("73840561").unwrap(), None);
    }

    #[test]
    fn test_replace_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let directory = StudentDirectory::new(dir.path());
        assert!(matches!(
            directory.replace(b"not a workbook"),
            Err(DocumentError::Spreadsheet(_))
        ));
        assert!(!directory.exists());
    }
}
