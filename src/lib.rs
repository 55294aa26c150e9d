//! # Newsledger
//!
//! A content-addressable, dedup-aware article registry.
//!
//! Newsledger accepts article submissions, derives deterministic fingerprints
//! from their content and metadata, rejects duplicates by content
//! fingerprint, and persists accepted records under a dense, monotonically
//! increasing identifier. Secondary indices answer publisher-scoped and
//! recency-scoped queries plus batch existence checks.
//!
//! ## Features
//!
//! - SHA-256 fingerprints over length-prefixed fields
//! - Append-only record store with identifiers `1..=count` (0 means "none")
//! - Publisher and recency indices maintained incrementally
//! - Pluggable durable substrate (in-memory, `SQLite`)
//! - Ordered `Admitted` / `DuplicateDetected` notifications over a broadcast bus
//!
//! ## Example
//!
//! ```rust
//! use newsledger::{ArticleSubmission, Publisher, RegistryService};
//!
//! let registry = RegistryService::in_memory();
//! let publisher = Publisher::new("0xb72e8049e0ee6018e49e9b3995e70b8faf705897");
//! let submission = ArticleSubmission::new("T1", "Body text", "Summary");
//!
//! let first = registry.admit(&publisher, submission.clone())?;
//! let second = registry.admit(&publisher, submission)?;
//!
//! assert_eq!(first.id().get(), 1);
//! assert!(second.is_duplicate());
//! assert_eq!(registry.count(), 1);
//! # Ok::<(), newsledger::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

// Re-exports for convenience
pub use config::{BackendKind, FieldLimits, LedgerConfig};
pub use models::{
    Admission, ArticleHashes, ArticleSubmission, AuthenticityScore, CombinedFingerprint,
    ContentFingerprint, MetadataFingerprint, Publisher, Record, RecordId, RegistryEvent,
};
pub use observability::EventBus;
pub use services::{
    Clock, FingerprintEngine, Page, QueryService, RegistryService, RegistryStatus, SystemClock,
};
pub use storage::{MemoryBackend, PersistenceBackend, SqliteBackend};

/// Error type for newsledger operations.
///
/// Duplicate submissions are not errors: [`RegistryService::admit`] reports
/// them as [`Admission::Duplicate`].
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty title/content/publisher, malformed fingerprint hex |
/// | `NotFound` | Lookup of an identifier that was never assigned (including `0`) |
/// | `OperationFailed` | Storage substrate, config file or observability failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A required submission field is empty
    /// - The publisher identity is empty
    /// - A fingerprint string is not 64 hex characters (optionally `0x`-prefixed)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No record has been assigned the requested identifier.
    #[error("record {id} not found")]
    NotFound {
        /// The identifier that was looked up.
        id: u64,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` operations fail
    /// - Persisted rows do not form a dense ledger on replay
    /// - Configuration files cannot be read or parsed
    /// - Observability components fail to initialize
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for newsledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use newsledger::current_timestamp;
///
/// let ts = current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
