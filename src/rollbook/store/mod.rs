//! # Storage Layer
//!
//! Records live as **one JSON array under one key** of a key-value store.
//! The [`StorageBackend`] trait abstracts that store; [`RecordTable`] is the
//! persistence adapter on top of it.
//!
//! ## Whole-Collection Semantics
//!
//! Every write is a read-modify-write of the full array: load, change, save.
//! There are no partial writes, and no locking either. A second process
//! writing the same key between our read and our write wins silently.
//! This is fine for a single-user, low-volume data set.
//!
//! ## Recovery
//!
//! - Missing key: an empty collection.
//! - Malformed JSON: logged and treated as an empty collection. The next
//!   successful write replaces the corrupt blob.
//! - Backend I/O failure: surfaces as an error from [`RecordTable::try_get_all`]
//!   and from every write. [`RecordTable::get_all`] swallows it into an empty list.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one `<key>.json` file per key in a data directory.
//! - [`mem_backend::MemBackend`]: in-memory, for tests and embedding.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── student-records.json   # JSON array of StudentRecord
//! ├── theme.json             # "light" | "dark"
//! └── config.json            # RollbookConfig
//! ```

use crate::error::{RecordsError, Result};
use crate::model::StudentRecord;
use tracing::{debug, warn};

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;

pub use backend::StorageBackend;

/// Key the record collection is stored under unless configured otherwise.
pub const DEFAULT_RECORDS_KEY: &str = "student-records";

/// The persistence adapter: a single logical table of student records.
pub struct RecordTable<B: StorageBackend> {
    backend: B,
    key: String,
}

impl<B: StorageBackend> RecordTable<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_RECORDS_KEY)
    }

    pub fn with_key(backend: B, key: &str) -> Self {
        Self {
            backend,
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads the collection, failing only when the backend itself fails.
    /// A blob that is not a JSON array is logged and read as empty; single
    /// elements that do not decode are logged and skipped.
    pub fn try_get_all(&self) -> Result<Vec<StudentRecord>> {
        let Some(raw) = self.backend.get_item(&self.key)? else {
            return Ok(Vec::new());
        };
        let items = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored records are malformed, starting empty");
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<StudentRecord>(item) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(key = %self.key, index, error = %e, "Skipping undecodable stored record")
                }
            }
        }
        Ok(records)
    }

    /// Reads the collection; any failure yields an empty list.
    pub fn get_all(&self) -> Vec<StudentRecord> {
        self.try_get_all().unwrap_or_else(|e| {
            warn!(key = %self.key, error = %e, "Failed to read stored records");
            Vec::new()
        })
    }

    pub fn get_by_id(&self, id: &str) -> Option<StudentRecord> {
        self.get_all().into_iter().find(|r| r.id == id)
    }

    /// Overwrites the whole collection.
    pub fn save_all(&self, records: &[StudentRecord]) -> Result<()> {
        let content = serde_json::to_string(records).map_err(RecordsError::Serialization)?;
        self.backend.set_item(&self.key, &content)?;
        debug!(key = %self.key, count = records.len(), "Saved records");
        Ok(())
    }

    pub fn add(&self, record: &StudentRecord) -> Result<()> {
        let mut records = self.try_get_all()?;
        records.push(record.clone());
        self.save_all(&records)
    }

    /// Replaces the entry with the same id. Returns false, without writing,
    /// when there is none.
    pub fn update(&self, record: &StudentRecord) -> Result<bool> {
        let mut records = self.try_get_all()?;
        let Some(slot) = records.iter_mut().find(|r| r.id == record.id) else {
            return Ok(false);
        };
        *slot = record.clone();
        self.save_all(&records)?;
        Ok(true)
    }

    /// Removes the entry with `id`. Returns false, without writing, when there is none.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let records = self.try_get_all()?;
        let before = records.len();
        let remaining: Vec<StudentRecord> = records.into_iter().filter(|r| r.id != id).collect();
        if remaining.len() == before {
            return Ok(false);
        }
        self.save_all(&remaining)?;
        Ok(true)
    }

    /// Case-insensitive substring search over name, email, roll number,
    /// branch and class. A blank query returns everything. Storage order is kept.
    pub fn search(&self, query: &str) -> Vec<StudentRecord> {
        let records = self.get_all();
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return records;
        }
        records
            .into_iter()
            .filter(|r| matches_query(r, &needle))
            .collect()
    }

    /// True iff no record other than `exclude_id` holds `roll_no`.
    pub fn is_roll_no_unique(&self, roll_no: u32, exclude_id: Option<&str>) -> bool {
        !self
            .get_all()
            .iter()
            .any(|r| r.roll_no == roll_no && exclude_id != Some(r.id.as_str()))
    }

    pub fn ensure_roll_no_unique(&self, roll_no: u32, exclude_id: Option<&str>) -> Result<()> {
        if self.is_roll_no_unique(roll_no, exclude_id) {
            Ok(())
        } else {
            Err(RecordsError::DuplicateRollNo(roll_no))
        }
    }

    /// Removes the storage key entirely.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove_item(&self.key)?;
        debug!(key = %self.key, "Cleared records");
        Ok(())
    }
}

// `needle` is already trimmed and lowercased.
fn matches_query(record: &StudentRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle)
        || record.email.to_lowercase().contains(needle)
        || record.roll_no.to_string().contains(needle)
        || record.branch.as_str().to_lowercase().contains(needle)
        || record.class.as_str().to_lowercase().contains(needle)
}
