//! Publisher to record identifier mapping.

use crate::models::{Publisher, RecordId};
use std::collections::HashMap;

/// Per-publisher list of identifiers, in admission order.
///
/// Lists are maintained incrementally, so a query never scans the whole
/// ledger. A publisher's count is the length of its list.
#[derive(Debug, Default)]
pub struct PublisherIndex {
    by_publisher: HashMap<Publisher, Vec<RecordId>>,
}

impl PublisherIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `id` with `publisher` and bumps its count.
    ///
    /// Called exactly once per admission, after the identifier is assigned.
    pub fn record_for(&mut self, publisher: &Publisher, id: RecordId) {
        if let Some(ids) = self.by_publisher.get_mut(publisher) {
            ids.push(id);
        } else {
            self.by_publisher.insert(publisher.clone(), vec![id]);
        }
    }

    /// All identifiers admitted under `publisher`, ascending.
    ///
    /// Unknown publishers yield an empty slice.
    #[must_use]
    pub fn list_for(&self, publisher: &Publisher) -> &[RecordId] {
        self.by_publisher
            .get(publisher)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of records admitted under `publisher`.
    #[must_use]
    pub fn count_for(&self, publisher: &Publisher) -> usize {
        self.list_for(publisher).len()
    }

    /// Up to `limit` identifiers for `publisher`, skipping the first `offset`.
    #[must_use]
    pub fn page(&self, publisher: &Publisher, offset: usize, limit: usize) -> &[RecordId] {
        let ids = self.list_for(publisher);
        let start = offset.min(ids.len());
        let end = start.saturating_add(limit).min(ids.len());
        &ids[start..end]
    }

    /// Number of distinct publishers.
    #[must_use]
    pub fn publisher_count(&self) -> usize {
        self.by_publisher.len()
    }
}
