//! Article admission service.
//!
//! Owns the ledger state and the durable substrate. Every admission runs in
//! one critical section:
//!
//! 1. Look up the content fingerprint in the duplicate index
//! 2. On a hit, publish `DuplicateDetected` and return `Duplicate`
//! 3. On a miss, append the record to the backend, commit it to the record
//!    store and all indices, then publish `Admitted`
//!
//! The backend write comes first, so a substrate failure leaves the
//! in-memory state untouched.

use super::FingerprintEngine;
use crate::config::FieldLimits;
use crate::models::{Admission, ArticleHashes, ArticleSubmission, EventMeta, Publisher, Record, RecordId, RegistryEvent};
use crate::observability::EventBus;
use crate::storage::{LedgerState, MemoryBackend, PersistenceBackend};
use crate::{Error, Result, current_timestamp};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::instrument;

const EVENT_SOURCE: &str = "registry";

/// Source of admission timestamps (Unix seconds).
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        current_timestamp()
    }
}

/// The registry: admission, lookup and count over a replayed ledger.
///
/// Readers share an `RwLock` read guard, so a query never observes a record
/// that the duplicate index does not know about, or the reverse.
pub struct RegistryService {
    state: RwLock<LedgerState>,
    backend: Box<dyn PersistenceBackend>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    limits: FieldLimits,
}

impl RegistryService {
    /// Opens a registry over `backend`, replaying every persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read, or if the persisted
    /// records do not form a dense ledger (an identifier gap or a repeated
    /// content fingerprint), or if their number disagrees with the backend's
    /// own count.
    #[instrument(skip(backend), fields(operation = "open", backend = backend.name()))]
    pub fn open(backend: Box<dyn PersistenceBackend>) -> Result<Self> {
        let start = Instant::now();
        let mut state = LedgerState::new();

        for record in backend.load_all()? {
            let id = record.id;
            state.commit(record).map_err(|e| Error::OperationFailed {
                operation: "replay_ledger".to_string(),
                cause: format!("corrupt ledger at record {id}: {e}"),
            })?;
        }

        let count = state.count();
        let stored = backend.count()?;
        if stored != count {
            return Err(Error::OperationFailed {
                operation: "replay_ledger".to_string(),
                cause: format!("corrupt ledger: backend holds {stored} records, replayed {count}"),
            });
        }
        tracing::info!(
            records = count,
            elapsed_ms = start.elapsed().as_millis(),
            "Ledger replayed"
        );
        metrics::gauge!("registry_records_total").set(count as f64);

        Ok(Self {
            state: RwLock::new(state),
            backend,
            events: EventBus::default(),
            clock: Arc::new(SystemClock),
            limits: FieldLimits::default(),
        })
    }

    /// Creates an empty registry over a volatile backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(LedgerState::new()),
            backend: Box::new(MemoryBackend::new()),
            events: EventBus::default(),
            clock: Arc::new(SystemClock),
            limits: FieldLimits::default(),
        }
    }

    /// Replaces the event bus.
    #[must_use]
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets field truncation limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: FieldLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Admits a submission from `publisher`.
    ///
    /// Returns [`Admission::Duplicate`] without writing anything if the
    /// content fingerprint is already owned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the publisher, title or content is
    /// blank, or the backend's error if persisting fails. Nothing is
    /// recorded in either case.
    #[instrument(skip(self, submission), fields(operation = "admit", publisher = %publisher))]
    pub fn admit(&self, publisher: &Publisher, submission: ArticleSubmission) -> Result<Admission> {
        let start = Instant::now();
        let result = self.admit_inner(publisher, submission);

        let outcome = match &result {
            Ok(Admission::Admitted { .. }) => "admitted",
            Ok(Admission::Duplicate { .. }) => "duplicate",
            Err(_) => "error",
        };
        metrics::counter!("registry_admissions_total", "outcome" => outcome).increment(1);
        metrics::histogram!("registry_admit_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }

    /// Fingerprints `submission` exactly as admission would, after field limits.
    #[must_use]
    pub fn article_hashes(&self, submission: ArticleSubmission) -> ArticleHashes {
        self.limits.article_hashes(submission)
    }

    fn admit_inner(&self, publisher: &Publisher, submission: ArticleSubmission) -> Result<Admission> {
        validate(publisher, &submission)?;
        let submission = self.limits.apply(submission);

        let content_fingerprint = FingerprintEngine::content_of(&submission);
        let metadata_fingerprint = FingerprintEngine::metadata_of(&submission);

        let mut state = self.write_state();

        if let Some(existing_id) = state.lookup(&content_fingerprint) {
            tracing::debug!(existing_id = %existing_id, "Duplicate submission");
            self.events.publish(RegistryEvent::DuplicateDetected {
                meta: EventMeta::new(EVENT_SOURCE),
                existing_id,
                content_fingerprint,
                attempted_publisher: publisher.clone(),
            });
            return Ok(Admission::Duplicate {
                existing_id,
                content_fingerprint,
            });
        }

        let id = state.next_id();
        let timestamp = self
            .clock
            .now()
            .max(state.last_timestamp().unwrap_or(0));

        let record = Record {
            id,
            content_fingerprint,
            metadata_fingerprint,
            publisher: publisher.clone(),
            timestamp,
            source: submission.source,
        };

        self.backend.append(&record)?;
        let event = RegistryEvent::Admitted {
            meta: EventMeta::with_timestamp(EVENT_SOURCE, timestamp),
            id,
            content_fingerprint,
            metadata_fingerprint,
            publisher: publisher.clone(),
            source: record.source.clone(),
            timestamp,
        };
        state.commit(record)?;

        metrics::gauge!("registry_records_total").set(state.count() as f64);
        tracing::info!(id = %id, "Article admitted");

        self.events.publish(event);
        drop(state);

        Ok(Admission::Admitted {
            id,
            content_fingerprint,
            metadata_fingerprint,
            timestamp,
        })
    }

    /// Returns the record with identifier `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `id` was never assigned (including 0).
    #[instrument(skip(self), fields(operation = "get"))]
    pub fn get(&self, id: RecordId) -> Result<Record> {
        self.read(|state| state.get(id).cloned())
            .ok_or(Error::NotFound { id: id.get() })
    }

    /// Number of admitted records.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.read(LedgerState::count)
    }

    /// Runs `f` against a consistent snapshot of the ledger.
    pub fn read<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        f(&self.read_state())
    }

    /// The bus admission outcomes are published on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Name of the durable substrate.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(|poisoned| {
            log_poison_recovery();
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(|poisoned| {
            log_poison_recovery();
            PoisonError::into_inner(poisoned)
        })
    }
}

impl Default for RegistryService {
    fn default() -> Self {
        Self::in_memory()
    }
}

// LedgerState::commit validates before mutating, so a panic mid-admission
// cannot leave the indices half-updated.
fn log_poison_recovery() {
    tracing::warn!("Ledger lock was poisoned, recovering");
    metrics::counter!("registry_lock_poison_recovery_total").increment(1);
}

fn validate(publisher: &Publisher, submission: &ArticleSubmission) -> Result<()> {
    if publisher.is_blank() {
        return Err(Error::InvalidInput("publisher cannot be empty".to_string()));
    }
    if submission.title.trim().is_empty() {
        return Err(Error::InvalidInput("title cannot be empty".to_string()));
    }
    if submission.content.trim().is_empty() {
        return Err(Error::InvalidInput("content cannot be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentFingerprint;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ManualClock(AtomicU64);

    impl ManualClock {
        fn at(t: u64) -> Arc<Self> {
            Arc::new(Self(AtomicU64::new(t)))
        }

        fn set(&self, t: u64) {
            self.0.store(t, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Backend whose writes always fail.
    struct FailingBackend;

    impl PersistenceBackend for FailingBackend {
        fn append(&self, _record: &Record) -> Result<()> {
            Err(Error::OperationFailed {
                operation: "insert_record".to_string(),
                cause: "disk full".to_string(),
            })
        }

        fn load_all(&self) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    /// Backend that loses track of its own row count.
    struct MiscountingBackend(MemoryBackend);

    impl PersistenceBackend for MiscountingBackend {
        fn append(&self, record: &Record) -> Result<()> {
            self.0.append(record)
        }

        fn load_all(&self) -> Result<Vec<Record>> {
            self.0.load_all()
        }

        fn count(&self) -> Result<u64> {
            Ok(self.0.count()? + 1)
        }

        fn name(&self) -> &'static str {
            "miscounting"
        }
    }

    fn publisher() -> Publisher {
        Publisher::new("0xb72e8049e0ee6018e49e9b3995e70b8faf705897")
    }

    fn article(title: &str) -> ArticleSubmission {
        ArticleSubmission::new(title, format!("{title} body"), "summary").with_source("Reuters")
    }

    #[test]
    fn test_admit_assigns_dense_ids() {
        let registry = RegistryService::in_memory();
        let a = registry.admit(&publisher(), article("a")).unwrap();
        let b = registry.admit(&publisher(), article("b")).unwrap();

        assert_eq!(a.id(), RecordId::new(1));
        assert_eq!(b.id(), RecordId::new(2));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_duplicate_is_side_effect_free() {
        let registry = RegistryService::in_memory();
        registry.admit(&publisher(), article("a")).unwrap();

        // Same content, different metadata and publisher.
        let again = article("a").with_source("AP").with_tags("other");
        let outcome = registry.admit(&Publisher::new("mallory"), again).unwrap();

        assert_eq!(
            outcome,
            Admission::Duplicate {
                existing_id: RecordId::new(1),
                content_fingerprint: FingerprintEngine::content("a", "a body", "summary"),
            }
        );
        assert_eq!(registry.count(), 1);
        assert!(registry.read(|s| s.list_for(&Publisher::new("mallory")).is_empty()));
        assert_eq!(registry.read(|s| s.recency().len()), 1);
    }

    #[test]
    fn test_get_roundtrip_and_not_found() {
        let registry = RegistryService::in_memory();
        registry.admit(&publisher(), article("a")).unwrap();

        let record = registry.get(RecordId::new(1)).unwrap();
        assert_eq!(record.publisher, publisher());
        assert_eq!(record.source, "Reuters");
        assert_eq!(
            record.content_fingerprint,
            FingerprintEngine::content("a", "a body", "summary")
        );

        assert!(matches!(
            registry.get(RecordId::NONE),
            Err(Error::NotFound { id: 0 })
        ));
        assert!(matches!(
            registry.get(RecordId::new(2)),
            Err(Error::NotFound { id: 2 })
        ));
    }

    #[test]
    fn test_validation_rejects_blank_fields() {
        let registry = RegistryService::in_memory();

        let err = registry.admit(&Publisher::new(" "), article("a")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = registry
            .admit(&publisher(), ArticleSubmission::new("", "body", ""))
            .unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = registry
            .admit(&publisher(), ArticleSubmission::new("t", "  ", ""))
            .unwrap_err();
        assert!(err.to_string().contains("content"));

        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_timestamps_are_monotonic() {
        let clock = ManualClock::at(1_000);
        let registry = RegistryService::in_memory().with_clock(clock.clone());

        registry.admit(&publisher(), article("a")).unwrap();
        clock.set(500);
        let second = registry.admit(&publisher(), article("b")).unwrap();
        clock.set(2_000);
        let third = registry.admit(&publisher(), article("c")).unwrap();

        assert!(matches!(second, Admission::Admitted { timestamp: 1_000, .. }));
        assert!(matches!(third, Admission::Admitted { timestamp: 2_000, .. }));
    }

    #[test]
    fn test_backend_failure_leaves_state_untouched() {
        let registry = RegistryService::open(Box::new(FailingBackend)).unwrap();

        let err = registry.admit(&publisher(), article("a")).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(registry.count(), 0);
        assert!(
            registry
                .read(|s| s.lookup(&FingerprintEngine::content("a", "a body", "summary")))
                .is_none()
        );
        assert_eq!(registry.backend_name(), "failing");
    }

    #[test]
    fn test_open_replays_backend() {
        let backend = MemoryBackend::new();
        let registry = RegistryService::open(Box::new(MemoryBackend::new())).unwrap();
        registry.admit(&publisher(), article("a")).unwrap();
        registry.admit(&publisher(), article("b")).unwrap();
        for id in 1..=2 {
            backend.append(&registry.get(RecordId::new(id)).unwrap()).unwrap();
        }

        let reopened = RegistryService::open(Box::new(backend)).unwrap();
        assert_eq!(reopened.count(), 2);
        assert_eq!(
            reopened.admit(&publisher(), article("a")).unwrap().id(),
            RecordId::new(1)
        );
        assert_eq!(
            reopened.admit(&publisher(), article("c")).unwrap().id(),
            RecordId::new(3)
        );
    }

    #[test]
    fn test_open_rejects_gap() {
        let registry = RegistryService::in_memory();
        registry.admit(&publisher(), article("a")).unwrap();
        let mut record = registry.get(RecordId::new(1)).unwrap();
        record.id = RecordId::new(2);

        let err = RegistryService::open(Box::new(MemoryBackend::with_records(vec![record])))
            .err()
            .unwrap();
        assert!(err.to_string().contains("corrupt ledger"));
    }

    #[test]
    fn test_open_rejects_repeated_fingerprint() {
        let fp = ContentFingerprint::from_bytes([7; 32]);
        let registry = RegistryService::in_memory();
        registry.admit(&publisher(), article("a")).unwrap();
        let mut first = registry.get(RecordId::new(1)).unwrap();
        first.content_fingerprint = fp;
        let mut second = first.clone();
        second.id = RecordId::new(2);

        let result = RegistryService::open(Box::new(MemoryBackend::with_records(vec![
            first, second,
        ])));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_rejects_count_mismatch() {
        let inner = MemoryBackend::new();
        let registry = RegistryService::in_memory();
        registry.admit(&publisher(), article("a")).unwrap();
        inner.append(&registry.get(RecordId::new(1)).unwrap()).unwrap();

        let err = RegistryService::open(Box::new(MiscountingBackend(inner)))
            .err()
            .unwrap();
        assert!(matches!(err, Error::OperationFailed { ref operation, .. } if operation == "replay_ledger"));
        assert!(err.to_string().contains("backend holds 2 records, replayed 1"));
    }

    #[test]
    fn test_article_hashes_match_stored_fingerprints() {
        let limits = FieldLimits {
            content: 8,
            ..FieldLimits::enabled()
        };
        let registry = RegistryService::in_memory().with_limits(limits);
        let submission = ArticleSubmission::new("T", "0123456789abcdef", "");

        let outcome = registry.admit(&publisher(), submission.clone()).unwrap();
        let hashes = registry.article_hashes(submission.clone());

        assert_eq!(&hashes.content, outcome.content_fingerprint());
        assert_eq!(hashes.content, FingerprintEngine::content("T", "01234567", ""));
        assert_ne!(hashes.content, FingerprintEngine::content_of(&submission));
        assert_eq!(registry.read(|s| s.lookup(&hashes.content)), Some(outcome.id()));
    }

    #[test]
    fn test_limits_make_long_tails_duplicates() {
        let limits = FieldLimits {
            content: 4,
            ..FieldLimits::enabled()
        };
        let registry = RegistryService::in_memory().with_limits(limits);

        registry
            .admit(&publisher(), ArticleSubmission::new("t", "bodyAAAA", ""))
            .unwrap();
        let outcome = registry
            .admit(&publisher(), ArticleSubmission::new("t", "bodyBBBB", ""))
            .unwrap();
        assert!(outcome.is_duplicate());
    }

    #[tokio::test]
    async fn test_events_follow_commit_order() {
        let registry = RegistryService::in_memory().with_event_bus(EventBus::new(16));
        let mut rx = registry.events().subscribe();

        registry.admit(&publisher(), article("a")).unwrap();
        registry.admit(&Publisher::new("bob"), article("a")).unwrap();
        registry.admit(&publisher(), article("b")).unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, RegistryEvent::Admitted { ref source, .. } if source == "Reuters"));
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second,
            RegistryEvent::DuplicateDetected { ref attempted_publisher, existing_id, .. }
                if attempted_publisher.as_str() == "bob" && existing_id == RecordId::new(1)
        ));
        let third = rx.recv().await.unwrap();
        assert_eq!(third.record_id(), RecordId::new(2));
    }
}
