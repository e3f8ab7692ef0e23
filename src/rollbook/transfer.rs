//! # Import and Export
//!
//! Exports read the persisted collection straight from the table (not the
//! store's cached state) and hand a finished file to a [`DownloadSink`].
//!
//! Imports are all-or-nothing. The whole document is parsed and every
//! element checked before anything is written; then the collection is
//! replaced in one write and the store reloads, so subscribers see the new
//! baseline.
//!
//! ## CSV
//!
//! Six columns: `Name,Branch,Class,Roll No,Honours Degree,Email`, rows joined
//! with `\n`, no trailing newline. Fields are quoted only when they contain a
//! comma, quote or line break, so ordinary data comes out as plain
//! comma-joined text while a name like `Doe, John` cannot shift columns.

use crate::error::{RecordsError, Result};
use crate::model::StudentRecord;
use crate::notify::{Notifier, ToastSpec};
use crate::records::RecordStore;
use crate::store::StorageBackend;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{info, warn};

pub const JSON_EXPORT_NAME: &str = "student_records.json";
pub const JSON_MIME: &str = "application/json;charset=utf-8";
pub const CSV_EXPORT_NAME: &str = "student_records.csv";
pub const CSV_MIME: &str = "text/csv;charset=utf-8";
pub const CSV_HEADERS: [&str; 6] = ["Name", "Branch", "Class", "Roll No", "Honours Degree", "Email"];

/// A finished export, ready to be saved by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime: String,
    pub contents: String,
}

/// Where finished exports go.
pub trait DownloadSink {
    fn deliver(&self, file: &ExportFile) -> Result<()>;
}

/// Saves exports into a directory under their default file name.
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, file: &ExportFile) -> PathBuf {
        self.dir.join(&file.filename)
    }
}

impl DownloadSink for DirSink {
    fn deliver(&self, file: &ExportFile) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(RecordsError::Io)?;
        }
        fs::write(self.path_for(file), &file.contents).map_err(RecordsError::Io)?;
        Ok(())
    }
}

/// Keeps exports in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Rc<RefCell<Vec<ExportFile>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<ExportFile> {
        self.files.borrow().clone()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, file: &ExportFile) -> Result<()> {
        self.files.borrow_mut().push(file.clone());
        Ok(())
    }
}

/// An uploaded file: its name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read(path).map_err(RecordsError::Io)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, contents })
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

/// The checks a caller runs before handing a file to [`TransferManager::import_json`]:
/// at most `max_bytes`, and a `.json` name.
pub fn check_import_file(name: &str, size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        return Err(RecordsError::Import(format!(
            "File size exceeds the limit ({})",
            human_size(max_bytes)
        )));
    }
    if !name.to_lowercase().ends_with(".json") {
        return Err(RecordsError::Import(
            "Only JSON files are supported".to_string(),
        ));
    }
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}

pub fn records_to_json(records: &[StudentRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(RecordsError::Serialization)
}

pub fn records_to_csv(records: &[StudentRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS)?;
    for r in records {
        let roll_no = r.roll_no.to_string();
        writer.write_record([
            r.name.as_str(),
            r.branch.as_str(),
            r.class.as_str(),
            roll_no.as_str(),
            r.honours_degree.as_str(),
            r.email.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RecordsError::Io(e.into_error()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| RecordsError::Store(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

enum Kind {
    Str,
    Num,
}

const RECORD_SHAPE: [(&str, Kind); 9] = [
    ("id", Kind::Str),
    ("name", Kind::Str),
    ("branch", Kind::Str),
    ("class", Kind::Str),
    ("rollNo", Kind::Num),
    ("honoursDegree", Kind::Str),
    ("email", Kind::Str),
    ("createdAt", Kind::Str),
    ("updatedAt", Kind::Str),
];

fn check_shape(value: &Value) -> std::result::Result<(), String> {
    let Some(obj) = value.as_object() else {
        return Err("is not an object".to_string());
    };
    for (field, kind) in RECORD_SHAPE.iter() {
        let Some(v) = obj.get(*field) else {
            return Err(format!("is missing \"{}\"", field));
        };
        let ok = match kind {
            Kind::Str => v.is_string(),
            Kind::Num => v.is_number(),
        };
        if !ok {
            let expected = match kind {
                Kind::Str => "a string",
                Kind::Num => "a number",
            };
            return Err(format!("has \"{}\" that is not {}", field, expected));
        }
    }
    Ok(())
}

fn invalid(detail: String) -> RecordsError {
    RecordsError::Import(format!("Invalid student data format. {}", detail))
}

/// Parses and validates an import document without touching storage.
///
/// Every element must carry all nine fields with the right JSON types and
/// decode into a [`StudentRecord`]. Duplicate ids or roll numbers inside the
/// document are rejected too, since they could never be stored.
pub fn parse_import(text: &str) -> Result<Vec<StudentRecord>> {
    let doc: Value = serde_json::from_str(text).map_err(RecordsError::Serialization)?;
    let Value::Array(items) = doc else {
        return Err(RecordsError::Import(
            "Invalid data format. Expected an array of students.".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(items.len());
    let mut ids = HashSet::new();
    let mut rolls = HashSet::new();
    for (i, item) in items.into_iter().enumerate() {
        let n = i + 1;
        check_shape(&item).map_err(|why| invalid(format!("Record #{} {}.", n, why)))?;
        let record: StudentRecord = serde_json::from_value(item)
            .map_err(|e| invalid(format!("Record #{}: {}.", n, e)))?;
        if record.roll_no == 0 {
            return Err(invalid(format!(
                "Record #{} has a roll number that is not positive.",
                n
            )));
        }
        if !ids.insert(record.id.clone()) {
            return Err(invalid(format!("Record #{} repeats id {}.", n, record.id)));
        }
        if !rolls.insert(record.roll_no) {
            return Err(invalid(format!(
                "Record #{} repeats roll number {}.",
                n, record.roll_no
            )));
        }
        records.push(record);
    }
    Ok(records)
}

pub struct TransferManager<K: DownloadSink> {
    sink: K,
    notifier: Box<dyn Notifier>,
}

impl<K: DownloadSink> TransferManager<K> {
    pub fn new(sink: K, notifier: impl Notifier + 'static) -> Self {
        Self {
            sink,
            notifier: Box::new(notifier),
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Exports the full persisted collection as pretty-printed JSON.
    pub fn export_json<B: StorageBackend>(&self, store: &RecordStore<B>) -> bool {
        let outcome = store
            .table()
            .try_get_all()
            .and_then(|records| records_to_json(&records))
            .and_then(|contents| self.deliver(JSON_EXPORT_NAME, JSON_MIME, contents));

        match outcome {
            Ok(()) => {
                self.notifier.show(ToastSpec::success(
                    "Data Exported",
                    "All student records have been exported to JSON",
                ));
                true
            }
            Err(e) => {
                warn!(error = %e, "JSON export failed");
                self.notifier.show(ToastSpec::error(
                    "Export Failed",
                    "Could not export student records",
                ));
                false
            }
        }
    }

    /// Exports the full persisted collection as CSV.
    pub fn export_csv<B: StorageBackend>(&self, store: &RecordStore<B>) -> bool {
        let outcome = store
            .table()
            .try_get_all()
            .and_then(|records| records_to_csv(&records))
            .and_then(|contents| self.deliver(CSV_EXPORT_NAME, CSV_MIME, contents));

        match outcome {
            Ok(()) => {
                self.notifier.show(ToastSpec::success(
                    "CSV Exported",
                    "Student records exported to CSV format",
                ));
                true
            }
            Err(e) => {
                warn!(error = %e, "CSV export failed");
                self.notifier.show(ToastSpec::error(
                    "Export Failed",
                    "Could not export student records to CSV",
                ));
                false
            }
        }
    }

    /// Exports exactly the given rows as CSV, e.g. a filtered and sorted listing.
    pub fn export_view_csv(&self, records: &[StudentRecord]) -> bool {
        let outcome = records_to_csv(records)
            .and_then(|contents| self.deliver(CSV_EXPORT_NAME, CSV_MIME, contents));

        match outcome {
            Ok(()) => {
                self.notifier.show(ToastSpec::success(
                    "Data Exported",
                    "All student records have been exported to CSV",
                ));
                true
            }
            Err(e) => {
                warn!(error = %e, "CSV export failed");
                self.notifier.show(ToastSpec::error(
                    "Export Failed",
                    "Could not export student records to CSV",
                ));
                false
            }
        }
    }

    /// Replaces the whole collection with the records in `file`.
    ///
    /// Returns false, and leaves storage untouched, if anything about the
    /// document is wrong. Never panics or returns an error.
    pub fn import_json<B: StorageBackend>(
        &self,
        store: &mut RecordStore<B>,
        file: &ImportFile,
    ) -> bool {
        let parsed = std::str::from_utf8(&file.contents)
            .map_err(|e| RecordsError::Store(e.to_string()))
            .and_then(parse_import);

        let records = match parsed {
            Ok(records) => records,
            Err(RecordsError::Import(description)) => {
                warn!(file = %file.name, reason = %description, "Import rejected");
                self.notifier.show(ToastSpec::error("Import Failed", description));
                return false;
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "Import failed");
                self.import_failed();
                return false;
            }
        };

        if let Err(e) = store.table().save_all(&records) {
            warn!(file = %file.name, error = %e, "Import failed");
            self.import_failed();
            return false;
        }

        if let Err(e) = store.reload() {
            warn!(file = %file.name, error = %e, "Imported records could not be reloaded");
            self.notifier.show(ToastSpec::error(
                "Import Failed",
                "Student records were saved but could not be reloaded",
            ));
            return false;
        }
        info!(file = %file.name, count = records.len(), "Imported student records");
        self.notifier.show(ToastSpec::success(
            "Import Successful",
            format!("{} student records imported", records.len()),
        ));
        true
    }

    /// Runs the caller-side checks on a file on disk, then imports it.
    pub fn import_path<B: StorageBackend>(
        &self,
        store: &mut RecordStore<B>,
        path: &Path,
        max_bytes: u64,
    ) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot stat import file");
                self.notifier
                    .show(ToastSpec::error("Import Failed", "Error reading the file"));
                return false;
            }
        };

        if let Err(e) = check_import_file(&name, size, max_bytes) {
            let description = match e {
                RecordsError::Import(msg) => msg,
                other => other.to_string(),
            };
            self.notifier.show(ToastSpec::error("Error", description));
            return false;
        }

        match ImportFile::read(path) {
            Ok(file) => self.import_json(store, &file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read import file");
                self.notifier
                    .show(ToastSpec::error("Import Failed", "Error reading the file"));
                false
            }
        }
    }

    fn deliver(&self, filename: &str, mime: &str, contents: String) -> Result<()> {
        self.sink.deliver(&ExportFile {
            filename: filename.to_string(),
            mime: mime.to_string(),
            contents,
        })
    }

    fn import_failed(&self) {
        self.notifier.show(ToastSpec::error(
            "Import Failed",
            "Could not import student records",
        ));
    }
}
