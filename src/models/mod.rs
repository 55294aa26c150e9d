//! Data models for newsledger.
//!
//! This module contains the core data structures used throughout the system.

mod events;
mod fingerprint;
mod record;

pub use events::{EventMeta, RegistryEvent};
pub use fingerprint::{
    CombinedFingerprint, ContentFingerprint, FINGERPRINT_LEN, MetadataFingerprint,
};
pub use record::{
    Admission, ArticleHashes, ArticleSubmission, AuthenticityScore, Publisher, Record, RecordId,
};
