//! Shared `SQLite` infrastructure.
//!
//! - [`connection`]: mutex handling with poison recovery, pragma setup
//! - [`metrics`]: storage operation metrics

mod connection;
mod metrics;

pub use connection::{acquire_lock, configure_connection};
pub use metrics::{record_operation_metrics, status_label};
