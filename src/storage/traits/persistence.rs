//! Persistence backend trait.

use crate::Result;
use crate::models::Record;

/// Trait for durable substrates beneath the ledger.
///
/// Backends only store and replay records; the in-memory indices are
/// rebuilt from [`PersistenceBackend::load_all`] on open. Errors are
/// surfaced as [`crate::Error::OperationFailed`] and propagated unchanged.
pub trait PersistenceBackend: Send + Sync {
    /// Durably appends a record.
    ///
    /// Called while the registry write lock is held, before any index is
    /// touched. A failure here aborts the admission.
    fn append(&self, record: &Record) -> Result<()>;

    /// Loads every stored record in ascending identifier order.
    fn load_all(&self) -> Result<Vec<Record>>;

    /// Returns the number of stored records.
    fn count(&self) -> Result<u64> {
        Ok(self.load_all()?.len() as u64)
    }

    /// Short backend name for logs and status output.
    fn name(&self) -> &'static str;
}
