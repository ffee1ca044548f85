use std::sync::Arc;

use bb8::PooledConnection;
use tokio_util::sync::CancellationToken;

use super::config::{SqliteManager, SqlitePool, run_interruptible};
use super::params::Params;
use super::query::build_result_set;
use crate::error::OrmError;
use crate::results::{ExecResult, ResultSet};
use crate::types::SqlValue;

async fn checkout(
    pool: &SqlitePool,
    cancel: Option<&CancellationToken>,
) -> Result<PooledConnection<'static, SqliteManager>, OrmError> {
    let pool = pool.get()?;
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(OrmError::Cancelled),
            conn = pool.get_owned() => Ok(conn?),
        },
        None => Ok(pool.get_owned().await?),
    }
}

fn is_insert(sql: &str) -> bool {
    sql.split_whitespace()
        .next()
        .is_some_and(|w| w.eq_ignore_ascii_case("insert") || w.eq_ignore_ascii_case("replace"))
}

/// Execute one statement that returns no rows.
///
/// `last_insert_id` is only reported when this statement inserted a row, since
/// `SQLite` keeps the last rowid per connection.
///
/// # Errors
/// Returns `OrmError` if checkout, preparation or execution fails, and
/// `OrmError::Cancelled` if `cancel` interrupts it.
pub async fn execute_dml(
    pool: &SqlitePool,
    sql: &str,
    args: &[SqlValue],
    cancel: Option<&CancellationToken>,
) -> Result<ExecResult, OrmError> {
    let conn = checkout(pool, cancel).await?;
    let sql = sql.to_owned();
    let params = Params::convert(args);
    run_interruptible(Arc::clone(&*conn), cancel, move |guard| {
        let before = guard.last_insert_rowid();
        let mut stmt = guard.prepare(&sql)?;
        let refs = params.as_refs();
        let rows_affected = stmt.execute(&refs[..])?;
        let rowid = guard.last_insert_rowid();
        let inserted = rowid != before || (rows_affected > 0 && is_insert(&sql));
        Ok(ExecResult {
            rows_affected: rows_affected as u64,
            last_insert_id: (inserted && rowid != 0).then_some(rowid),
        })
    })
    .await
}

/// Run a query and collect its rows.
///
/// # Errors
/// Returns `OrmError` if checkout, preparation or row extraction fails, and
/// `OrmError::Cancelled` if `cancel` interrupts it.
pub async fn execute_select(
    pool: &SqlitePool,
    sql: &str,
    args: &[SqlValue],
    cancel: Option<&CancellationToken>,
) -> Result<ResultSet, OrmError> {
    let conn = checkout(pool, cancel).await?;
    let sql = sql.to_owned();
    let params = Params::convert(args);
    run_interruptible(Arc::clone(&*conn), cancel, move |guard| {
        let mut stmt = guard.prepare(&sql)?;
        build_result_set(&mut stmt, &params)
    })
    .await
}

/// Check out a connection and run a trivial statement on it.
///
/// # Errors
/// Returns `OrmError` if no live connection can be obtained.
pub async fn ping(pool: &SqlitePool) -> Result<(), OrmError> {
    let conn = checkout(pool, None).await?;
    run_interruptible(Arc::clone(&*conn), None, |guard| {
        guard.execute_batch("SELECT 1")?;
        Ok(())
    })
    .await
}
