//! One-shot raw SQL sessions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::error::OrmError;
use crate::pool::DbPool;
use crate::results::{ExecResult, ResultSet, Row};
use crate::types::SqlValue;

/// Accumulates raw SQL fragments and their bind arguments until a terminal call runs them.
///
/// Every terminal call ([`exec`](Self::exec), [`query`](Self::query),
/// [`query_row`](Self::query_row) and their `_with_cancel` forms) resets the session before
/// executing, so a session is reusable whatever the outcome.
///
/// ```rust,no_run
/// # use sql_orm::prelude::*;
/// # async fn demo(db: &Db) -> Result<(), OrmError> {
/// let mut session = db.new_session();
/// session
///     .raw("INSERT INTO users (name, age)", &[])
///     .raw("VALUES (?, ?)", &["alice".into(), 30.into()]);
/// let done = session.exec().await?;
/// assert_eq!(done.rows_affected, 1);
/// assert!(session.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    pool: DbPool,
    sql: String,
    args: Vec<SqlValue>,
    debug: Arc<AtomicBool>,
}

impl Session {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self::with_debug_flag(pool, Arc::new(AtomicBool::new(false)))
    }

    pub(crate) fn with_debug_flag(pool: DbPool, debug: Arc<AtomicBool>) -> Self {
        Self {
            pool,
            sql: String::new(),
            args: Vec::new(),
            debug,
        }
    }

    /// Append a fragment followed by one space, and its arguments.
    pub fn raw(&mut self, sql: &str, args: &[SqlValue]) -> &mut Self {
        self.sql.push_str(sql);
        self.sql.push(' ');
        self.args.extend_from_slice(args);
        self
    }

    /// Take the staged statement and arguments, leaving the session empty.
    pub fn finish(&mut self) -> (String, Vec<SqlValue>) {
        (
            std::mem::take(&mut self.sql),
            std::mem::take(&mut self.args),
        )
    }

    pub fn clear(&mut self) {
        self.sql.clear();
        self.args.clear();
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty() && self.args.is_empty()
    }

    /// Execute the staged statement.
    ///
    /// # Errors
    /// Returns the driver error; the session is reset either way.
    pub async fn exec(&mut self) -> Result<ExecResult, OrmError> {
        let (sql, args) = self.stage();
        let result = self.pool.execute(&sql, &args, None).await;
        log_failure(&sql, result)
    }

    /// Like [`exec`](Self::exec), but stops the statement once `token` fires.
    ///
    /// A stopped statement has no effect and yields `OrmError::Cancelled`. If it had
    /// already completed when the token fired, its result is returned as usual.
    ///
    /// # Errors
    /// Returns the driver error or `OrmError::Cancelled`.
    pub async fn exec_with_cancel(
        &mut self,
        token: &CancellationToken,
    ) -> Result<ExecResult, OrmError> {
        let (sql, args) = self.stage();
        let result = self.pool.execute(&sql, &args, Some(token)).await;
        log_failure(&sql, result)
    }

    /// Run the staged statement and collect every row.
    ///
    /// # Errors
    /// Returns the driver error; the session is reset either way.
    pub async fn query(&mut self) -> Result<ResultSet, OrmError> {
        let (sql, args) = self.stage();
        let result = self.pool.select(&sql, &args, None).await;
        log_failure(&sql, result)
    }

    /// # Errors
    /// Returns the driver error or `OrmError::Cancelled`.
    pub async fn query_with_cancel(
        &mut self,
        token: &CancellationToken,
    ) -> Result<ResultSet, OrmError> {
        let (sql, args) = self.stage();
        let result = self.pool.select(&sql, &args, Some(token)).await;
        log_failure(&sql, result)
    }

    /// Run the staged statement and keep only the first row, if any.
    ///
    /// # Errors
    /// Returns the driver error; an empty result is `Ok(None)`.
    pub async fn query_row(&mut self) -> Result<Option<Row>, OrmError> {
        self.query().await.map(ResultSet::into_first)
    }

    /// # Errors
    /// Returns the driver error or `OrmError::Cancelled`.
    pub async fn query_row_with_cancel(
        &mut self,
        token: &CancellationToken,
    ) -> Result<Option<Row>, OrmError> {
        self.query_with_cancel(token)
            .await
            .map(ResultSet::into_first)
    }

    fn stage(&mut self) -> (String, Vec<SqlValue>) {
        let (sql, args) = self.finish();
        if self.debug.load(Ordering::Relaxed) {
            tracing::info!(sql = %sql.trim_end(), args = ?args, "executing statement");
        } else {
            tracing::debug!(sql = %sql.trim_end(), args = ?args, "executing statement");
        }
        (sql, args)
    }
}

fn log_failure<T>(sql: &str, result: Result<T, OrmError>) -> Result<T, OrmError> {
    match &result {
        Err(OrmError::Cancelled) => tracing::warn!(sql = %sql.trim_end(), "statement cancelled"),
        Err(e) => tracing::error!(sql = %sql.trim_end(), error = %e, "statement failed"),
        Ok(_) => {}
    }
    result
}
