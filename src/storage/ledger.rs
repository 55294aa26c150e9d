//! The record store and its indices, updated as one unit.

use super::index::{DuplicateIndex, PublisherIndex, RecencySequence};
use super::record_store::RecordStore;
use crate::Result;
use crate::models::{ContentFingerprint, Publisher, Record, RecordId};

/// In-memory ledger state: records plus every secondary index.
///
/// [`LedgerState::commit`] is the only mutation. It validates before it
/// writes, so on error nothing has changed. Callers serialize access (the
/// registry keeps the state behind one `RwLock`).
#[derive(Debug, Default)]
pub struct LedgerState {
    records: RecordStore,
    duplicates: DuplicateIndex,
    publishers: PublisherIndex,
    recency: RecencySequence,
}

impl LedgerState {
    /// Creates an empty ledger (counter 0, empty indices).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier the next admission will receive.
    #[must_use]
    pub fn next_id(&self) -> RecordId {
        self.records.next_id()
    }

    /// Owner of a content fingerprint.
    #[must_use]
    pub fn lookup(&self, fingerprint: &ContentFingerprint) -> Option<RecordId> {
        self.duplicates.lookup(fingerprint)
    }

    /// Appends `record` to the store and all indices.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OperationFailed`] if the identifier is not the
    /// next one or the content fingerprint is already owned. No index is
    /// modified in that case.
    pub fn commit(&mut self, record: Record) -> Result<()> {
        self.records.check_next(record.id)?;
        self.duplicates
            .reserve(record.content_fingerprint, record.id)?;

        self.publishers.record_for(&record.publisher, record.id);
        self.recency.append(record.id);
        self.records.insert(record)
    }

    /// Looks up a record.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    /// Number of admitted records.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.records.count()
    }

    /// Identifiers admitted under `publisher`, ascending.
    #[must_use]
    pub fn list_for(&self, publisher: &Publisher) -> &[RecordId] {
        self.publishers.list_for(publisher)
    }

    /// Timestamp of the most recent admission.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<u64> {
        self.records.last().map(|r| r.timestamp)
    }

    /// Read access to the record store.
    #[must_use]
    pub const fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Read access to the duplicate index.
    #[must_use]
    pub const fn duplicates(&self) -> &DuplicateIndex {
        &self.duplicates
    }

    /// Read access to the publisher index.
    #[must_use]
    pub const fn publishers(&self) -> &PublisherIndex {
        &self.publishers
    }

    /// Read access to the recency sequence.
    #[must_use]
    pub const fn recency(&self) -> &RecencySequence {
        &self.recency
    }
}
