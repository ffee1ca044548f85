use std::future::Future;
use std::time::Duration;

use sqlx::mysql::{MySql, MySqlConnection, MySqlDatabaseError, MySqlPool};
use sqlx::pool::PoolConnection;
use sqlx::{ConnectOptions, Connection};
use tokio_util::sync::CancellationToken;

use super::params::bind_values;
use super::query::build_result_set;
use crate::error::OrmError;
use crate::results::{ExecResult, ResultSet};
use crate::types::SqlValue;

/// ER_QUERY_INTERRUPTED
const QUERY_INTERRUPTED: u16 = 1317;

/// How often `KILL QUERY` is re-sent while a cancelled statement is still running.
const KILL_RETRY: Duration = Duration::from_millis(50);

async fn acquire(
    pool: &MySqlPool,
    cancel: Option<&CancellationToken>,
) -> Result<PoolConnection<MySql>, OrmError> {
    let acquired = match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => return Err(OrmError::Cancelled),
            conn = pool.acquire() => conn,
        },
        None => pool.acquire().await,
    };
    acquired.map_err(|e| match e {
        sqlx::Error::PoolClosed => OrmError::PoolClosed,
        other => other.into(),
    })
}

async fn connection_id(conn: &mut MySqlConnection) -> Result<u64, OrmError> {
    Ok(sqlx::query_scalar::<_, u64>("SELECT CONNECTION_ID()")
        .fetch_one(conn)
        .await?)
}

/// Stop whatever `connection_id` is running, over a connection of its own so a full pool
/// cannot block it.
async fn kill_query(pool: &MySqlPool, connection_id: u64) -> Result<(), sqlx::Error> {
    let mut conn = pool.connect_options().connect().await?;
    sqlx::raw_sql(&format!("KILL QUERY {connection_id}"))
        .execute(&mut conn)
        .await?;
    conn.close().await
}

fn is_interrupted(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| e.number() == QUERY_INTERRUPTED),
        _ => false,
    }
}

/// Drive `fut` to completion, killing it server-side once `token` fires.
///
/// The statement future is always awaited, so the connection is clean when it goes back
/// to the pool. A statement the server aborted is reported as `OrmError::Cancelled`.
async fn killable<T>(
    pool: &MySqlPool,
    connection_id: u64,
    token: &CancellationToken,
    fut: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, OrmError> {
    tokio::pin!(fut);
    let finished = tokio::select! {
        biased;
        result = &mut fut => Some(result),
        () = token.cancelled() => None,
    };
    let result = match finished {
        Some(result) => result,
        None => loop {
            if let Err(e) = kill_query(pool, connection_id).await {
                tracing::warn!(connection_id, error = %e, "failed to kill cancelled query");
            }
            if let Ok(result) = tokio::time::timeout(KILL_RETRY, &mut fut).await {
                break result;
            }
        },
    };
    result.map_err(|e| {
        if is_interrupted(&e) {
            OrmError::Cancelled
        } else {
            e.into()
        }
    })
}

/// Execute one statement that returns no rows.
///
/// # Errors
/// Returns `OrmError::MysqlError` on any driver failure, and `OrmError::Cancelled` if
/// `cancel` stops it.
pub async fn execute_dml(
    pool: &MySqlPool,
    sql: &str,
    args: &[SqlValue],
    cancel: Option<&CancellationToken>,
) -> Result<ExecResult, OrmError> {
    let mut conn = acquire(pool, cancel).await?;
    let result = match cancel {
        Some(token) => {
            let id = connection_id(&mut conn).await?;
            let fut = bind_values(sqlx::query(sql), args).execute(&mut *conn);
            killable(pool, id, token, fut).await?
        }
        None => bind_values(sqlx::query(sql), args).execute(&mut *conn).await?,
    };
    let last_insert_id = i64::try_from(result.last_insert_id())
        .ok()
        .filter(|&id| id != 0);
    Ok(ExecResult {
        rows_affected: result.rows_affected(),
        last_insert_id,
    })
}

/// Run a query and collect its rows.
///
/// # Errors
/// Returns `OrmError::MysqlError` on any driver or decode failure, and
/// `OrmError::Cancelled` if `cancel` stops it.
pub async fn execute_select(
    pool: &MySqlPool,
    sql: &str,
    args: &[SqlValue],
    cancel: Option<&CancellationToken>,
) -> Result<ResultSet, OrmError> {
    let mut conn = acquire(pool, cancel).await?;
    let rows = match cancel {
        Some(token) => {
            let id = connection_id(&mut conn).await?;
            let fut = bind_values(sqlx::query(sql), args).fetch_all(&mut *conn);
            killable(pool, id, token, fut).await?
        }
        None => bind_values(sqlx::query(sql), args).fetch_all(&mut *conn).await?,
    };
    build_result_set(&rows)
}

/// Check out a connection and ping the server over it.
///
/// # Errors
/// Returns `OrmError::MysqlError` if no live connection can be obtained, and
/// `OrmError::PoolClosed` once the pool is closed.
pub async fn ping(pool: &MySqlPool) -> Result<(), OrmError> {
    let mut conn = acquire(pool, None).await?;
    conn.ping().await?;
    Ok(())
}
