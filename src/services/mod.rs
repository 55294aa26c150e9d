//! Business logic services.
//!
//! Services own the ledger state and provide high-level operations.

mod fingerprint;
mod query;
mod registry;

pub use fingerprint::FingerprintEngine;
pub use query::{Page, QueryService, RegistryStatus};
pub use registry::{Clock, RegistryService, SystemClock};
