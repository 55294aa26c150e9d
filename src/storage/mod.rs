//! Storage layer.
//!
//! Two layers:
//! - **Ledger**: the in-memory record store plus the duplicate, publisher
//!   and recency indices, mutated as one unit by [`LedgerState::commit`]
//! - **Persistence**: the durable substrate records are appended to and
//!   replayed from (`SQLite`, or volatile memory)

pub mod index;
pub mod ledger;
pub mod persistence;
pub mod record_store;
pub mod sqlite;
pub mod traits;

pub use index::{DuplicateIndex, PublisherIndex, RecencySequence};
pub use ledger::LedgerState;
pub use persistence::{MemoryBackend, SqliteBackend};
pub use record_store::RecordStore;
pub use traits::PersistenceBackend;
