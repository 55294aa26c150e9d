//! Secondary indices over the record store.
//!
//! Indices hold identifiers only, never copies of records.

mod duplicate;
mod publisher;
mod recency;

pub use duplicate::DuplicateIndex;
pub use publisher::PublisherIndex;
pub use recency::RecencySequence;
