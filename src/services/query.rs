//! Read-only query façade.
//!
//! Every method takes one read guard on the ledger, so a batch answer is a
//! single consistent snapshot.

use super::RegistryService;
use crate::models::{ContentFingerprint, Publisher, Record, RecordId};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Snapshot of registry health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryStatus {
    /// Number of admitted records.
    pub total_records: u64,
    /// Number of distinct publishers.
    pub publishers: usize,
    /// Durable substrate name.
    pub backend: &'static str,
    /// Most recently assigned identifier (0 when empty).
    pub latest_id: RecordId,
    /// Timestamp of the latest record.
    pub latest_timestamp: Option<u64>,
}

/// One page of a publisher listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Records on this page, ascending by id.
    pub records: Vec<Record>,
    /// Total identifiers held by the publisher.
    pub total: usize,
    /// Offset of the first record.
    pub offset: usize,
}

/// Answers existence checks, lookups and listings.
#[derive(Clone)]
pub struct QueryService {
    registry: Arc<RegistryService>,
}

impl QueryService {
    /// Creates a query façade over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<RegistryService>) -> Self {
        Self { registry }
    }

    /// Returns `(true, id)` if the content is registered, `(false, 0)`
    /// otherwise.
    #[must_use]
    #[instrument(skip(self), fields(operation = "verify", fingerprint = %fingerprint))]
    pub fn verify(&self, fingerprint: &ContentFingerprint) -> (bool, RecordId) {
        let owner = self.registry.read(|state| state.lookup(fingerprint));
        let found = owner.is_some();
        metrics::counter!("registry_verify_total", "found" => if found { "true" } else { "false" })
            .increment(1);
        (found, owner.unwrap_or(RecordId::NONE))
    }

    /// Existence of each fingerprint, in input order.
    #[must_use]
    #[instrument(skip(self, fingerprints), fields(operation = "batch_verify", count = fingerprints.len()))]
    pub fn batch_verify(&self, fingerprints: &[ContentFingerprint]) -> Vec<bool> {
        let results: Vec<bool> = self.registry.read(|state| {
            fingerprints
                .iter()
                .map(|fp| state.lookup(fp).is_some())
                .collect()
        });
        let found = results.iter().filter(|&&hit| hit).count();
        metrics::counter!("registry_verify_total", "found" => "true").increment(found as u64);
        metrics::counter!("registry_verify_total", "found" => "false")
            .increment((results.len() - found) as u64);
        results
    }

    /// Number of admitted records.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.registry.count()
    }

    /// Looks up one record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if `id` was never assigned.
    pub fn get(&self, id: RecordId) -> Result<Record> {
        self.registry.get(id)
    }

    /// Every identifier admitted under `publisher`, ascending.
    #[must_use]
    pub fn list_for(&self, publisher: &Publisher) -> Vec<RecordId> {
        self.registry.read(|state| state.list_for(publisher).to_vec())
    }

    /// Number of records admitted under `publisher`.
    #[must_use]
    pub fn count_for(&self, publisher: &Publisher) -> usize {
        self.registry
            .read(|state| state.publishers().count_for(publisher))
    }

    /// Up to `n` identifiers, newest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<RecordId> {
        self.registry.read(|state| state.recency().recent(n))
    }

    /// A page of full records admitted under `publisher`.
    #[must_use]
    #[instrument(skip(self), fields(operation = "publisher_page"))]
    pub fn publisher_page(&self, publisher: &Publisher, offset: usize, limit: usize) -> Page {
        self.registry.read(|state| {
            let records = state
                .publishers()
                .page(publisher, offset, limit)
                .iter()
                .filter_map(|&id| state.get(id).cloned())
                .collect();
            Page {
                records,
                total: state.publishers().count_for(publisher),
                offset,
            }
        })
    }

    /// Up to `n` full records, newest first.
    #[must_use]
    pub fn recent_records(&self, n: usize) -> Vec<Record> {
        self.registry.read(|state| {
            state
                .recency()
                .recent(n)
                .into_iter()
                .filter_map(|id| state.get(id).cloned())
                .collect()
        })
    }

    /// Current registry status.
    #[must_use]
    pub fn status(&self) -> RegistryStatus {
        let backend = self.registry.backend_name();
        self.registry.read(|state| RegistryStatus {
            total_records: state.count(),
            publishers: state.publishers().publisher_count(),
            backend,
            latest_id: state.recency().latest().unwrap_or(RecordId::NONE),
            latest_timestamp: state.last_timestamp(),
        })
    }
}
