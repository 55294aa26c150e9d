//! Content fingerprint to record identifier mapping.

use crate::models::{ContentFingerprint, RecordId};
use crate::{Error, Result};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Gatekeeper for admission: maps each content fingerprint to its owner.
///
/// The index only grows. There is no update or removal.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    owners: HashMap<ContentFingerprint, RecordId>,
}

impl DuplicateIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier owning `fingerprint`, if any.
    #[must_use]
    pub fn lookup(&self, fingerprint: &ContentFingerprint) -> Option<RecordId> {
        self.owners.get(fingerprint).copied()
    }

    /// Returns true if `fingerprint` is owned by a record.
    #[must_use]
    pub fn contains(&self, fingerprint: &ContentFingerprint) -> bool {
        self.owners.contains_key(fingerprint)
    }

    /// Registers `fingerprint` as owned by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the fingerprint is already owned.
    /// Callers must check [`Self::lookup`] first; reaching this error means
    /// the admission protocol was violated.
    pub fn reserve(&mut self, fingerprint: ContentFingerprint, id: RecordId) -> Result<()> {
        match self.owners.entry(fingerprint) {
            Entry::Occupied(existing) => Err(Error::OperationFailed {
                operation: "reserve_fingerprint".to_string(),
                cause: format!(
                    "fingerprint {fingerprint} already owned by record {}",
                    existing.get()
                ),
            }),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            },
        }
    }

    /// Number of registered fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if no fingerprint has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(byte: u8) -> ContentFingerprint {
        ContentFingerprint::from_bytes([byte; 32])
    }

    #[test]
    fn test_lookup_missing() {
        let index = DuplicateIndex::new();
        assert_eq!(index.lookup(&fp(1)), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_reserve_then_lookup() {
        let mut index = DuplicateIndex::new();
        index.reserve(fp(1), RecordId::new(1)).unwrap();

        assert_eq!(index.lookup(&fp(1)), Some(RecordId::new(1)));
        assert!(index.contains(&fp(1)));
        assert!(!index.contains(&fp(2)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_reserve_existing_fails_and_keeps_owner() {
        let mut index = DuplicateIndex::new();
        index.reserve(fp(1), RecordId::new(1)).unwrap();

        let err = index.reserve(fp(1), RecordId::new(2)).unwrap_err();
        assert!(matches!(
            err,
            Error::OperationFailed { ref operation, .. } if operation == "reserve_fingerprint"
        ));
        assert_eq!(index.lookup(&fp(1)), Some(RecordId::new(1)));
        assert_eq!(index.len(), 1);
    }
}
