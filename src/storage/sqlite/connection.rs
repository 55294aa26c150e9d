//! Connection handling for the `SQLite` backend.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Acquires a mutex, recovering the inner value if it was poisoned.
///
/// A panic inside a previous critical section leaves the connection usable,
/// so the guard is recovered and a warning is logged instead of cascading
/// the panic.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Applies connection pragmas.
///
/// - **WAL mode**: concurrent readers with a single writer
/// - **FULL synchronous**: an admitted record survives power loss
/// - **`busy_timeout`**: waits up to 5 seconds on lock contention
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the synchronous or busy-timeout
/// pragma cannot be applied.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    // journal_mode returns a row ("wal", or "memory" for in-memory databases),
    // which is why the result is ignored rather than checked.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");

    conn.pragma_update(None, "synchronous", "FULL")
        .map_err(|e| Error::OperationFailed {
            operation: "configure_sqlite".to_string(),
            cause: e.to_string(),
        })?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| Error::OperationFailed {
            operation: "configure_sqlite".to_string(),
            cause: e.to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_lock_concurrent() {
        let mutex = Arc::new(Mutex::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                thread::spawn(move || {
                    *acquire_lock(&mutex) += 1;
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*acquire_lock(&mutex), 8);
    }

    #[test]
    fn test_acquire_lock_recovers_poison() {
        let mutex = Arc::new(Mutex::new(5));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the mutex");
        })
        .join();

        assert!(mutex.is_poisoned());
        assert_eq!(*acquire_lock(&mutex), 5);
    }

    #[test]
    fn test_configure_connection() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        // FULL = 2
        let synchronous: i32 = conn
            .pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap();
        assert_eq!(synchronous, 2);

        let busy_timeout: i32 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(busy_timeout, 5000);
    }
}
