//! Backend-agnostic connection pool.

use tokio_util::sync::CancellationToken;

#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteManager, SqlitePool};

use crate::datasource::DataSource;
use crate::error::OrmError;
use crate::results::{ExecResult, ResultSet};
use crate::types::{Driver, SqlValue};

/// Connection pool for one of the enabled backends.
#[derive(Clone)]
pub enum DbPool {
    /// MySQL pool (sqlx)
    #[cfg(feature = "mysql")]
    Mysql(sqlx::MySqlPool),
    /// `SQLite` pool (bb8 + rusqlite)
    #[cfg(feature = "sqlite")]
    Sqlite(SqlitePool),
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Open connections, idle or in use
    pub connections: u32,
    pub idle_connections: u32,
}

impl std::fmt::Debug for DbPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "mysql")]
            Self::Mysql(pool) => f.debug_tuple("Mysql").field(pool).finish(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => f
                .debug_struct("Sqlite")
                .field("closed", &pool.is_closed())
                .finish_non_exhaustive(),
            #[allow(unreachable_patterns)]
            _ => f.write_str("DbPool"),
        }
    }
}

fn not_enabled(driver: &str) -> OrmError {
    OrmError::Unimplemented(format!(
        "The {driver} driver is not enabled in the current build"
    ))
}

impl DbPool {
    /// Open a pool for `ds` using its driver and pool limits.
    ///
    /// # Errors
    /// Returns the driver's connection error, or `OrmError::Unimplemented` when the driver's
    /// feature is disabled.
    pub async fn connect(ds: &DataSource) -> Result<Self, OrmError> {
        match ds.driver {
            #[cfg(feature = "mysql")]
            Driver::Mysql => Ok(DbPool::Mysql(crate::mysql::connect(ds).await?)),
            #[cfg(feature = "sqlite")]
            Driver::Sqlite => {
                let pool = SqliteManager::new(ds.dsn()).build_pool(&ds.pool).await?;
                Ok(DbPool::Sqlite(pool))
            }
            #[allow(unreachable_patterns)]
            other => Err(not_enabled(other.as_str())),
        }
    }

    #[must_use]
    pub fn driver(&self) -> Driver {
        match self {
            #[cfg(feature = "mysql")]
            DbPool::Mysql(_) => Driver::Mysql,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(_) => Driver::Sqlite,
            #[allow(unreachable_patterns)]
            _ => Driver::default(),
        }
    }

    /// Verify a connection can be obtained and is alive.
    ///
    /// # Errors
    /// Returns the driver error when the database is unreachable.
    pub async fn ping(&self) -> Result<(), OrmError> {
        match self {
            #[cfg(feature = "mysql")]
            DbPool::Mysql(pool) => crate::mysql::ping(pool).await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => crate::sqlite::ping(pool).await,
            #[allow(unreachable_patterns)]
            _ => Err(not_enabled("requested")),
        }
    }

    /// Execute a statement that returns no rows.
    ///
    /// When `cancel` fires the running statement is stopped on the server, not merely
    /// abandoned.
    ///
    /// # Errors
    /// Returns the driver error on failure, `OrmError::Cancelled` once `cancel` stops the
    /// statement, and `OrmError::PoolClosed` after [`close`](Self::close).
    pub async fn execute(
        &self,
        sql: &str,
        args: &[SqlValue],
        cancel: Option<&CancellationToken>,
    ) -> Result<ExecResult, OrmError> {
        match self {
            #[cfg(feature = "mysql")]
            DbPool::Mysql(pool) => crate::mysql::execute_dml(pool, sql, args, cancel).await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => crate::sqlite::execute_dml(pool, sql, args, cancel).await,
            #[allow(unreachable_patterns)]
            _ => Err(not_enabled("requested")),
        }
    }

    /// Run a query and collect all rows.
    ///
    /// # Errors
    /// As for [`execute`](Self::execute).
    pub async fn select(
        &self,
        sql: &str,
        args: &[SqlValue],
        cancel: Option<&CancellationToken>,
    ) -> Result<ResultSet, OrmError> {
        match self {
            #[cfg(feature = "mysql")]
            DbPool::Mysql(pool) => crate::mysql::execute_select(pool, sql, args, cancel).await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => crate::sqlite::execute_select(pool, sql, args, cancel).await,
            #[allow(unreachable_patterns)]
            _ => Err(not_enabled("requested")),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            #[cfg(feature = "mysql")]
            DbPool::Mysql(pool) => pool.is_closed(),
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => pool.is_closed(),
            #[allow(unreachable_patterns)]
            _ => true,
        }
    }

    /// Occupancy snapshot; all zero once closed.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        match self {
            #[cfg(feature = "mysql")]
            DbPool::Mysql(pool) => PoolStats {
                connections: pool.size(),
                idle_connections: u32::try_from(pool.num_idle()).unwrap_or(u32::MAX),
            },
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => pool
                .state()
                .map(|state| PoolStats {
                    connections: state.connections,
                    idle_connections: state.idle_connections,
                })
                .unwrap_or_default(),
            #[allow(unreachable_patterns)]
            _ => PoolStats::default(),
        }
    }

    /// Close the pool for every clone. Later calls fail with `OrmError::PoolClosed`.
    ///
    /// MySQL waits for checked-out connections to be returned; `SQLite` closes them as
    /// they come back.
    pub async fn close(&self) {
        match self {
            #[cfg(feature = "mysql")]
            DbPool::Mysql(pool) => pool.close().await,
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => pool.close(),
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }
}
