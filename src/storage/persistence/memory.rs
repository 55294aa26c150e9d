//! Volatile persistence backend.

use crate::Result;
use crate::models::Record;
use crate::storage::sqlite::acquire_lock;
use crate::storage::traits::PersistenceBackend;
use std::sync::Mutex;

/// Keeps records in process memory. Everything is lost on drop.
///
/// Used by tests and by `backend = "memory"` in configuration.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<Record>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-loaded with `records`.
    #[must_use]
    pub const fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl PersistenceBackend for MemoryBackend {
    fn append(&self, record: &Record) -> Result<()> {
        acquire_lock(&self.records).push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Record>> {
        let mut records = acquire_lock(&self.records).clone();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    fn count(&self) -> Result<u64> {
        Ok(acquire_lock(&self.records).len() as u64)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
