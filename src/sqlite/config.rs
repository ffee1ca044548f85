use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::datasource::PoolConfig;
use crate::error::OrmError;

/// Shared handle to a `rusqlite` connection; blocking work locks it inside `spawn_blocking`.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

const DEFAULT_MAX_SIZE: u32 = 10;

/// How often a pending interrupt is re-issued while the blocking task winds down.
const INTERRUPT_RETRY: Duration = Duration::from_millis(10);

/// bb8 manager opening `SQLite` connections for one database path or `file:` URI.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    dsn: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(dsn: String) -> Self {
        Self { dsn }
    }

    /// Build a pool from this manager, applying the configured limits.
    ///
    /// # Errors
    /// Returns `OrmError::ConnectionError` if the first connections cannot be opened.
    pub async fn build_pool(self, config: &PoolConfig) -> Result<SqlitePool, OrmError> {
        // bb8 rejects a zero-sized pool and min_idle above max_size
        let max_size = config
            .max_open_conns
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_SIZE);
        let builder = Pool::builder()
            .max_size(max_size)
            .min_idle(config.min_idle_conns.map(|n| n.min(max_size)))
            .max_lifetime(config.conn_max_lifetime)
            .idle_timeout(config.conn_max_idle_time);

        let dsn = self.dsn.clone();
        let pool = builder
            .build(self)
            .await
            .map_err(|e| OrmError::ConnectionError(format!("sqlite pool error for {dsn}: {e}")))?;
        Ok(SqlitePool {
            slot: Arc::new(RwLock::new(Some(pool))),
        })
    }
}

/// The bb8 pool behind every session of one database handle.
///
/// [`close`](Self::close) releases the pool for all clones at once. Connections that are
/// checked out at that moment are closed when they are returned.
#[derive(Clone)]
pub struct SqlitePool {
    slot: Arc<RwLock<Option<Pool<SqliteManager>>>>,
}

impl SqlitePool {
    /// The live pool.
    ///
    /// # Errors
    /// Returns `OrmError::PoolClosed` after [`close`](Self::close).
    pub fn get(&self) -> Result<Pool<SqliteManager>, OrmError> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(OrmError::PoolClosed)
    }

    pub fn close(&self) {
        let released = self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            tracing::debug!("sqlite pool released");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Pool occupancy, or `None` once closed.
    #[must_use]
    pub fn state(&self) -> Option<bb8::State> {
        self.get().ok().map(|pool| pool.state())
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let dsn = self.dsn.clone();
        async move {
            let conn = tokio::task::spawn_blocking(move || rusqlite::Connection::open(dsn))
                .await
                .map_err(|e| {
                    rusqlite::Error::InvalidParameterName(format!(
                        "sqlite spawn_blocking join error: {e}"
                    ))
                })??;
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let conn = Arc::clone(conn);
        async move {
            tokio::task::spawn_blocking(move || {
                let guard = conn.blocking_lock();
                guard.execute_batch("SELECT 1")
            })
            .await
            .map_err(|e| {
                rusqlite::Error::InvalidParameterName(format!(
                    "sqlite spawn_blocking join error: {e}"
                ))
            })?
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

fn join_error(e: tokio::task::JoinError) -> OrmError {
    OrmError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
}

/// Run `func` against the connection on the blocking thread pool.
///
/// # Errors
/// Returns whatever `func` returns, or `OrmError::ExecutionError` if the blocking task
/// panicked or was cancelled.
pub(crate) async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, OrmError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, OrmError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(join_error)?
}

/// Like [`run_blocking`], but interrupts the running statement once `cancel` fires.
///
/// The blocking task is always awaited, so on return the connection is idle again. A
/// statement stopped by the interrupt is rolled back and reported as
/// `OrmError::Cancelled`; one that completed before the interrupt landed keeps its result.
///
/// # Errors
/// Returns whatever `func` returns, `OrmError::Cancelled`, or `OrmError::ExecutionError`
/// if the blocking task panicked.
pub(crate) async fn run_interruptible<F, R>(
    conn: SharedSqliteConnection,
    cancel: Option<&CancellationToken>,
    func: F,
) -> Result<R, OrmError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, OrmError> + Send + 'static,
    R: Send + 'static,
{
    let Some(token) = cancel else {
        return run_blocking(conn, func).await;
    };
    if token.is_cancelled() {
        return Err(OrmError::Cancelled);
    }

    let interrupt = conn.lock().await.get_interrupt_handle();
    let mut task = tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    });

    let finished = tokio::select! {
        biased;
        joined = &mut task => Some(joined),
        () = token.cancelled() => None,
    };
    let joined = match finished {
        Some(joined) => joined,
        None => loop {
            // sqlite drops an interrupt that arrives before the statement starts stepping
            interrupt.interrupt();
            if let Ok(joined) = tokio::time::timeout(INTERRUPT_RETRY, &mut task).await {
                break joined;
            }
        },
    };
    joined.map_err(join_error)?.map_err(interrupted_as_cancelled)
}

fn interrupted_as_cancelled(err: OrmError) -> OrmError {
    match err {
        OrmError::SqliteError(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::OperationInterrupted =>
        {
            OrmError::Cancelled
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_failures_become_cancelled() {
        let interrupted = OrmError::SqliteError(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
            Some("interrupted".into()),
        ));
        assert!(matches!(
            interrupted_as_cancelled(interrupted),
            OrmError::Cancelled
        ));

        let busy = OrmError::SqliteError(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        ));
        assert!(matches!(
            interrupted_as_cancelled(busy),
            OrmError::SqliteError(_)
        ));
    }
}
