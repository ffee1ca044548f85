//! The database facade.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::datasource::{DataSource, PoolConfig};
use crate::dialect::{Dialect, DialectRegistry};
use crate::error::OrmError;
use crate::pool::{DbPool, PoolStats};
use crate::results::{ExecResult, ResultSet, Row};
use crate::schema::Schema;
use crate::session::Session;
use crate::types::SqlValue;

/// An open, pinged connection pool paired with the dialect for its driver.
///
/// `Db` is `Send + Sync`; share it behind an `Arc` and give each task its own
/// [`Session`].
pub struct Db {
    pool: DbPool,
    dialect: Arc<dyn Dialect>,
    data_source: DataSource,
    dsn: String,
    debug: Arc<AtomicBool>,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("driver", &self.data_source.driver)
            .field("host", &self.data_source.host)
            .field("db_name", &self.data_source.db_name)
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

impl Db {
    /// Open `data_source`, resolving its dialect from [`DialectRegistry::global`].
    ///
    /// # Errors
    /// See [`open_with_registry`](Self::open_with_registry).
    pub async fn open(data_source: DataSource) -> Result<Self, OrmError> {
        Self::open_with_registry(data_source, DialectRegistry::global()).await
    }

    /// Open the pool, ping it, then resolve the dialect named after the driver.
    ///
    /// # Errors
    /// Returns the driver error if the pool cannot be opened or pinged, and
    /// `OrmError::DialectNotFound` if `registry` has no dialect for the driver.
    pub async fn open_with_registry(
        data_source: DataSource,
        registry: &DialectRegistry,
    ) -> Result<Self, OrmError> {
        let dsn = data_source.dsn();
        let driver = data_source.driver;

        let pool = DbPool::connect(&data_source).await.inspect_err(|e| {
            tracing::error!(driver = %driver, error = %e, "failed to open database");
        })?;
        if let Err(e) = pool.ping().await {
            tracing::error!(driver = %driver, error = %e, "failed to ping database");
            pool.close().await;
            return Err(e);
        }

        let Some(dialect) = registry.get(driver.as_str()) else {
            tracing::error!(driver = %driver, "dialect not found");
            pool.close().await;
            return Err(OrmError::DialectNotFound(driver.as_str().to_string()));
        };

        tracing::info!(driver = %driver, db = %data_source.db_name, "connected to database");
        Ok(Self {
            pool,
            dialect,
            data_source,
            dsn,
            debug: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A fresh, empty session on this pool.
    #[must_use]
    pub fn new_session(&self) -> Session {
        Session::with_debug_flag(self.pool.clone(), Arc::clone(&self.debug))
    }

    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    #[must_use]
    pub fn data_source_name(&self) -> &str {
        &self.dsn
    }

    #[must_use]
    pub fn driver_name(&self) -> &'static str {
        self.data_source.driver.as_str()
    }

    #[must_use]
    pub fn pool_config(&self) -> &PoolConfig {
        &self.data_source.pool
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// # Errors
    /// Returns the driver error when no live connection is available.
    pub async fn ping(&self) -> Result<(), OrmError> {
        self.pool.ping().await
    }

    /// # Errors
    /// Returns the driver error or `OrmError::Cancelled`.
    pub async fn ping_with_cancel(&self, token: &CancellationToken) -> Result<(), OrmError> {
        tokio::select! {
            biased;
            () = token.cancelled() => Err(OrmError::Cancelled),
            result = self.pool.ping() => result,
        }
    }

    /// Close the pool. Every later call, including those on sessions created earlier,
    /// fails with `OrmError::PoolClosed`.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!(driver = self.driver_name(), "database closed");
    }

    /// Log statements at `info` instead of `debug`.
    pub fn enable_debug(&self) {
        self.debug.store(true, Ordering::Relaxed);
    }

    pub fn disable_debug(&self) {
        self.debug.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// # Errors
    /// Returns the driver error.
    pub async fn exec(&self, sql: &str, args: &[SqlValue]) -> Result<ExecResult, OrmError> {
        self.new_session().raw(sql, args).exec().await
    }

    /// The statement is stopped on the engine when `token` fires; see
    /// [`Session::exec_with_cancel`].
    ///
    /// # Errors
    /// Returns the driver error or `OrmError::Cancelled`.
    pub async fn exec_with_cancel(
        &self,
        token: &CancellationToken,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<ExecResult, OrmError> {
        self.new_session()
            .raw(sql, args)
            .exec_with_cancel(token)
            .await
    }

    /// # Errors
    /// Returns the driver error.
    pub async fn query(&self, sql: &str, args: &[SqlValue]) -> Result<ResultSet, OrmError> {
        self.new_session().raw(sql, args).query().await
    }

    /// # Errors
    /// Returns the driver error or `OrmError::Cancelled`.
    pub async fn query_with_cancel(
        &self,
        token: &CancellationToken,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<ResultSet, OrmError> {
        self.new_session()
            .raw(sql, args)
            .query_with_cancel(token)
            .await
    }

    /// # Errors
    /// Returns the driver error; no row is `Ok(None)`.
    pub async fn query_row(&self, sql: &str, args: &[SqlValue]) -> Result<Option<Row>, OrmError> {
        self.new_session().raw(sql, args).query_row().await
    }

    /// # Errors
    /// Returns the driver error or `OrmError::Cancelled`.
    pub async fn query_row_with_cancel(
        &self,
        token: &CancellationToken,
        sql: &str,
        args: &[SqlValue],
    ) -> Result<Option<Row>, OrmError> {
        self.new_session()
            .raw(sql, args)
            .query_row_with_cancel(token)
            .await
    }

    /// Whether `table_name` exists. Any failure reads as absent.
    pub async fn table_exists(&self, table_name: &str) -> bool {
        if table_name.is_empty() {
            return false;
        }
        let sql = self.dialect.table_exists_query(table_name);
        match self.query_row(&sql, &[]).await {
            Ok(Some(row)) => match row.scan_text() {
                Ok(found) => found == table_name,
                Err(e) => {
                    tracing::warn!(table = table_name, error = %e, "unexpected existence check result");
                    false
                }
            },
            Ok(None) => false,
            Err(e) => {
                tracing::debug!(table = table_name, error = %e, "existence check failed");
                false
            }
        }
    }

    /// Drop `table_name` if present; `false` on an empty name or any failure.
    pub async fn drop_table(&self, table_name: &str) -> bool {
        if table_name.is_empty() {
            return false;
        }
        let sql = self.dialect.drop_table_query(table_name);
        match self.exec(&sql, &[]).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(table = table_name, error = %e, "drop table failed");
                false
            }
        }
    }

    /// Engine version string; empty when the engine returns no row.
    ///
    /// # Errors
    /// Returns the driver error, or `OrmError::ConversionError` for a non-text scalar.
    pub async fn version(&self) -> Result<String, OrmError> {
        let sql = self.dialect.version_query();
        match self.query_row(&sql, &[]).await? {
            Some(row) => row.scan_text(),
            None => Ok(String::new()),
        }
    }

    /// Create the table described by `schema`.
    ///
    /// # Errors
    /// Returns the driver error, e.g. when the table already exists.
    pub async fn create_table<M>(&self, schema: &Schema<'_, M>) -> Result<ExecResult, OrmError> {
        let sql = schema.create_table_sql(self.dialect());
        self.exec(&sql, &[]).await
    }
}
