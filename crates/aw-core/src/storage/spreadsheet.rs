//! Whole-file xlsx storage.
//!
//! Every write loads the workbook, changes it in memory and rewrites the
//! file through a temporary sibling. Writers in this process are serialized;
//! writers in other processes are not coordinated.

use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::{debug, info, instrument};

use super::workbook::{cell_to_text, SheetBook};
use super::{Record, StorageError};
use crate::submission::Submission;

struct CachedBook {
    modified: SystemTime,
    book: Arc<SheetBook>,
}

/// Submission store backed by a single xlsx file.
pub struct SpreadsheetStorage {
    path: PathBuf,
    cache: Mutex<Option<CachedBook>>,
    write_lock: Mutex<()>,
}

impl SpreadsheetStorage {
    /// Opens storage at `path`, creating the parent directory.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            cache: Mutex::new(None),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the workbook, reusing the cached copy while the file's
    /// modification time is unchanged. A missing file is an empty workbook.
    fn load(&self) -> Result<Arc<SheetBook>, StorageError> {
        let modified = match fs::metadata(&self.path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Arc::new(SheetBook::default()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut cache = self.cache.lock().map_err(|_| StorageError::Poisoned)?;
        if let Some(cached) = cache.as_ref() {
            if cached.modified == modified {
                return Ok(Arc::clone(&cached.book));
            }
        }

        debug!(path = %self.path.display(), "Reading workbook");
        let book = Arc::new(SheetBook::read(&self.path)?);
        *cache = Some(CachedBook {
            modified,
            book: Arc::clone(&book),
        });
        Ok(book)
    }

    fn invalidate(&self) -> Result<(), StorageError> {
        *self.cache.lock().map_err(|_| StorageError::Poisoned)? = None;
        Ok(())
    }

    fn persist(&self, book: &SheetBook) -> Result<(), StorageError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        book.write(&tmp)?;
        fs::rename(&tmp, &self.path)?;
        self.invalidate()
    }

    /// Runs a read-modify-write cycle under the write lock.
    fn modify<T, F>(&self, apply: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut SheetBook) -> Result<T, StorageError>,
    {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut book = (*self.load()?).clone();
        let result = apply(&mut book)?;
        self.persist(&book)?;
        Ok(result)
    }

    /// Appends a submission, assigning an id when it has none.
    #[instrument(skip(self, submission))]
    pub fn save_submission(&self, mut submission: Submission) -> Result<String, StorageError> {
        let id = submission.assign_id(Utc::now());

        self.modify(|book| {
            if book.submissions.rows.iter().any(|row| book.submissions.row_has_id(row, &id)) {
                return Err(StorageError::Duplicate(id.clone()));
            }
            append(book, &submission);
            Ok(())
        })?;

        info!(submission_id = %id, "Submission saved");
        Ok(id)
    }

    pub fn list_submissions(&self) -> Result<Vec<Record>, StorageError> {
        Ok(self.load()?.submissions.records())
    }

    pub fn get_submission(&self, id: &str) -> Result<Option<Record>, StorageError> {
        let book = self.load()?;
        let sheet = &book.submissions;
        Ok(sheet
            .rows
            .iter()
            .find(|row| sheet.row_has_id(row, id))
            .map(|row| sheet.record(row)))
    }

    /// Returns the records matching every non-null criterion.
    pub fn search_submissions(&self, criteria: &Record) -> Result<Vec<Record>, StorageError> {
        Ok(self
            .list_submissions()?
            .into_iter()
            .filter(|record| {
                criteria
                    .iter()
                    .filter(|(_, wanted)| !wanted.is_null())
                    .all(|(column, wanted)| {
                        record
                            .get(column)
                            .map(|cell| cells_equal(cell, wanted))
                            .unwrap_or(false)
                    })
            })
            .collect())
    }

    /// Replaces every row of submission `id` with the new content.
    #[instrument(skip(self, submission))]
    pub fn update_submission(
        &self,
        id: &str,
        mut submission: Submission,
    ) -> Result<(), StorageError> {
        submission.id = Some(id.to_string());

        self.modify(|book| {
            let position = book
                .submissions
                .rows
                .iter()
                .position(|row| book.submissions.row_has_id(row, id))
                .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

            if submission.submission_date.is_none() {
                let record = book.submissions.record(&book.submissions.rows[position]);
                submission.submission_date = record
                    .get("Submission Date")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            submission.assign_id(Utc::now());

            book.submissions.rows[position] = submission.to_row();
            book.materials.remove_id(id);
            book.validation_sources.remove_id(id);
            book.materials.rows.extend(submission.material_rows());
            book.validation_sources
                .rows
                .extend(submission.validation_source_rows());
            Ok(())
        })?;

        info!(submission_id = %id, "Submission updated");
        Ok(())
    }

    /// Removes submission `id` from every sheet.
    #[instrument(skip(self))]
    pub fn delete_submission(&self, id: &str) -> Result<(), StorageError> {
        self.modify(|book| {
            if book.submissions.remove_id(id) == 0 {
                return Err(StorageError::NotFound(id.to_string()));
            }
            book.materials.remove_id(id);
            book.validation_sources.remove_id(id);
            Ok(())
        })?;

        info!(submission_id = %id, "Submission deleted");
        Ok(())
    }

    /// Renders the `Submissions` sheet as CSV.
    pub fn export_csv(&self) -> Result<String, StorageError> {
        let book = self.load()?;
        let sheet = &book.submissions;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&sheet.headers)?;
        for row in &sheet.rows {
            writer.write_record(row.iter().map(cell_to_text))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StorageError::Csv(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Encodes the whole workbook as xlsx bytes.
    pub fn export_xlsx(&self) -> Result<Vec<u8>, StorageError> {
        self.load()?.to_bytes()
    }
}

fn append(book: &mut SheetBook, submission: &Submission) {
    book.submissions.rows.push(submission.to_row());
    book.materials.rows.extend(submission.material_rows());
    book.validation_sources
        .rows
        .extend(submission.validation_source_rows());
}

/// Numbers compare by value, everything else structurally.
fn cells_equal(cell: &Value, wanted: &Value) -> bool {
    match (cell, wanted) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => cell == wanted,
    }
}

impl std::fmt::Debug for SpreadsheetStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadsheetStorage")
            .field("path", &self.path)
            .finish()
    }
}
