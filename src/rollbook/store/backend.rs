use crate::error::Result;
use std::rc::Rc;

/// Abstract interface for raw key-value storage.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// [`RecordTable`](super::RecordTable) handles the "what" (the record
/// collection, search, uniqueness).
///
/// Values are opaque strings. Methods take `&self`; implementations use
/// interior mutability where they need it.
pub trait StorageBackend {
    /// Read the value stored under `key`.
    /// Returns Ok(None) if the key has never been written or was removed.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    /// MUST NOT leave a partially written value behind on failure.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

// Lets the record table and the theme setting share one backend.
impl<B: StorageBackend + ?Sized> StorageBackend for Rc<B> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}
