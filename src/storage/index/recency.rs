//! Append-only admission-order sequence.

use crate::models::RecordId;

/// Identifiers in admission order. Never shrinks.
#[derive(Debug, Default)]
pub struct RecencySequence {
    ids: Vec<RecordId>,
}

impl RecencySequence {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` at the tail.
    pub fn append(&mut self, id: RecordId) {
        self.ids.push(id);
    }

    /// Up to `n` most recent identifiers, newest first.
    ///
    /// `n` larger than the sequence returns everything; `n == 0` returns nothing.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<RecordId> {
        self.ids.iter().rev().take(n).copied().collect()
    }

    /// The most recently appended identifier.
    #[must_use]
    pub fn latest(&self) -> Option<RecordId> {
        self.ids.last().copied()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
