//! Registry event types emitted on admission outcomes.

use super::{ContentFingerprint, MetadataFingerprint, Publisher, RecordId};
use crate::current_timestamp;
use serde::Serialize;
use uuid::Uuid;

/// Shared event metadata required for observability.
#[derive(Debug, Clone, Serialize)]
pub struct EventMeta {
    /// Unique identifier for this event.
    pub event_id: String,
    /// Event source component.
    pub source: &'static str,
    /// Timestamp (Unix epoch seconds).
    pub timestamp: u64,
}

impl EventMeta {
    /// Creates new event metadata using the current timestamp.
    #[must_use]
    pub fn new(source: &'static str) -> Self {
        Self::with_timestamp(source, current_timestamp())
    }

    /// Creates new event metadata with a specified timestamp.
    #[must_use]
    pub fn with_timestamp(source: &'static str, timestamp: u64) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            source,
            timestamp,
        }
    }
}

/// Events emitted by the registry, in commit order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A submission was admitted and assigned an identifier.
    Admitted {
        /// Event metadata.
        meta: EventMeta,
        /// The assigned identifier.
        id: RecordId,
        /// Content fingerprint of the record.
        content_fingerprint: ContentFingerprint,
        /// Metadata fingerprint of the record.
        metadata_fingerprint: MetadataFingerprint,
        /// Submitter identity.
        publisher: Publisher,
        /// Originating outlet.
        source: String,
        /// Admission timestamp stored on the record.
        timestamp: u64,
    },
    /// A submission matched an existing record's content fingerprint.
    DuplicateDetected {
        /// Event metadata.
        meta: EventMeta,
        /// The identifier that already owns the content.
        existing_id: RecordId,
        /// Content fingerprint of the rejected submission.
        content_fingerprint: ContentFingerprint,
        /// Identity that attempted the submission.
        attempted_publisher: Publisher,
    },
}

impl RegistryEvent {
    /// Returns the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Admitted { .. } => "admitted",
            Self::DuplicateDetected { .. } => "duplicate_detected",
        }
    }

    /// Returns the event metadata.
    #[must_use]
    pub const fn meta(&self) -> &EventMeta {
        match self {
            Self::Admitted { meta, .. } | Self::DuplicateDetected { meta, .. } => meta,
        }
    }

    /// Returns the record identifier the event refers to.
    #[must_use]
    pub const fn record_id(&self) -> RecordId {
        match self {
            Self::Admitted { id, .. } => *id,
            Self::DuplicateDetected { existing_id, .. } => *existing_id,
        }
    }
}
