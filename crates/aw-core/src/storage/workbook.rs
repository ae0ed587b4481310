//! In-memory view of the submissions workbook and its xlsx encoding.

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use serde_json::{Number, Value};
use std::path::Path;

use super::{Record, StorageError};
use crate::submission::{
    ID_COLUMN, MATERIAL_COLUMNS, SUBMISSION_COLUMNS, VALIDATION_SOURCE_COLUMNS,
};

pub const SUBMISSIONS_SHEET: &str = "Submissions";
pub const MATERIALS_SHEET: &str = "Materials";
pub const VALIDATION_SOURCES_SHEET: &str = "Validation Sources";

/// One worksheet: a header row and value rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    fn empty(name: &'static str, headers: &[&str]) -> Self {
        Self {
            name,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn id_index(&self) -> Option<usize> {
        self.headers.iter().position(|h| h == ID_COLUMN)
    }

    /// Whether `row` belongs to the submission `id`.
    pub fn row_has_id(&self, row: &[Value], id: &str) -> bool {
        self.id_index()
            .and_then(|index| row.get(index))
            .map(|cell| cell.as_str() == Some(id))
            .unwrap_or(false)
    }

    /// Removes every row of the submission, returning how many went.
    pub fn remove_id(&mut self, id: &str) -> usize {
        let before = self.rows.len();
        let Some(index) = self.id_index() else {
            return 0;
        };
        self.rows
            .retain(|row| row.get(index).and_then(Value::as_str) != Some(id));
        before - self.rows.len()
    }

    /// Converts a row into a header-keyed record, omitting empty cells.
    pub fn record(&self, row: &[Value]) -> Record {
        self.headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.is_null())
            .map(|(header, cell)| (header.clone(), cell.clone()))
            .collect()
    }

    pub fn records(&self) -> Vec<Record> {
        self.rows.iter().map(|row| self.record(row)).collect()
    }
}

/// The three sheets of the submissions workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetBook {
    pub submissions: Sheet,
    pub materials: Sheet,
    pub validation_sources: Sheet,
}

impl Default for SheetBook {
    fn default() -> Self {
        Self {
            submissions: Sheet::empty(SUBMISSIONS_SHEET, &SUBMISSION_COLUMNS),
            materials: Sheet::empty(MATERIALS_SHEET, &MATERIAL_COLUMNS),
            validation_sources: Sheet::empty(VALIDATION_SOURCES_SHEET, &VALIDATION_SOURCE_COLUMNS),
        }
    }
}

impl SheetBook {
    /// Parses an xlsx file. Missing sheets are treated as empty.
    pub fn read(path: &Path) -> Result<Self, StorageError> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let names = workbook.sheet_names();

        let mut book = SheetBook::default();
        for sheet in book.sheets_mut() {
            if !names.iter().any(|n| n == sheet.name) {
                continue;
            }
            let range = workbook.worksheet_range(sheet.name)?;
            let mut rows = range.rows();
            let Some(header_row) = rows.next() else {
                continue;
            };
            let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();
            if headers.iter().all(|h| h.is_empty()) {
                continue;
            }
            sheet.headers = headers;
            sheet.rows = rows
                .map(|row| {
                    let mut values: Vec<Value> = row.iter().map(cell_to_value).collect();
                    values.resize(sheet.headers.len(), Value::Null);
                    values
                })
                .filter(|values| values.iter().any(|v| !v.is_null()))
                .collect();
        }
        Ok(book)
    }

    /// Encodes the workbook as xlsx bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        Ok(self.build()?.save_to_buffer()?)
    }

    /// Writes the workbook to `path`.
    pub fn write(&self, path: &Path) -> Result<(), StorageError> {
        self.build()?.save(path)?;
        Ok(())
    }

    fn build(&self) -> Result<Workbook, StorageError> {
        let mut workbook = Workbook::new();
        for sheet in self.sheets() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name)?;

            for (col, header) in sheet.headers.iter().enumerate() {
                worksheet.write_string(0, col as u16, header)?;
            }
            for (r, row) in sheet.rows.iter().enumerate() {
                let row_num = (r + 1) as u32;
                for (col, cell) in row.iter().enumerate() {
                    let col = col as u16;
                    match cell {
                        Value::Null => {}
                        Value::Bool(b) => {
                            worksheet.write_boolean(row_num, col, *b)?;
                        }
                        Value::Number(n) => {
                            worksheet.write_number(row_num, col, n.as_f64().unwrap_or_default())?;
                        }
                        Value::String(s) => {
                            worksheet.write_string(row_num, col, s)?;
                        }
                        nested => {
                            worksheet.write_string(row_num, col, nested.to_string())?;
                        }
                    }
                }
            }
        }
        Ok(workbook)
    }

    pub fn sheets(&self) -> [&Sheet; 3] {
        [&self.submissions, &self.materials, &self.validation_sources]
    }

    pub fn sheets_mut(&mut self) -> [&mut Sheet; 3] {
        [
            &mut self.submissions,
            &mut self.materials,
            &mut self.validation_sources,
        ]
    }
}

/// Converts a parsed cell. Whole floats come back as integers.
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_to_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

fn float_to_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Renders a cell as CSV text.
pub fn cell_to_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
