//! Identifier-keyed record storage.

use crate::models::{Record, RecordId};
use crate::{Error, Result};

/// Owns every admitted record, keyed by identifier.
///
/// Identifiers are dense, so records live in a vector at `id - 1`.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier the next admission will receive.
    #[must_use]
    pub fn next_id(&self) -> RecordId {
        RecordId::new(self.count() + 1)
    }

    /// Stores `record`, which must carry [`Self::next_id`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the identifier would leave a gap
    /// or reuse an existing one. The store is unchanged on error.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        self.check_next(record.id)?;
        self.records.push(record);
        Ok(())
    }

    /// Verifies that `id` is the next identifier to assign.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] otherwise.
    pub fn check_next(&self, id: RecordId) -> Result<()> {
        let expected = self.next_id();
        if id == expected {
            Ok(())
        } else {
            Err(Error::OperationFailed {
                operation: "insert_record".to_string(),
                cause: format!("expected record id {expected}, got {id}"),
            })
        }
    }

    /// Looks up a record.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        id.index().and_then(|i| self.records.get(i))
    }

    /// Number of stored records, which is also the highest assigned identifier.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    /// The most recently stored record.
    #[must_use]
    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }
}
