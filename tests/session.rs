#![cfg(feature = "sqlite")]

use std::error::Error;
use std::time::{Duration, Instant};

use sql_orm::prelude::*;
use tokio::runtime::Runtime;

async fn open_temp(dir: &tempfile::TempDir) -> Result<Db, OrmError> {
    let ds = DataSource::builder()
        .driver(Driver::Sqlite)
        .db_name(dir.path().join("session.db").to_string_lossy().into_owned())
        .build();
    Db::open(ds).await
}

#[test]
fn raw_appends_fragments_and_args() -> Result<(), Box<dyn Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;

    rt.block_on(async {
        let db = open_temp(&dir).await?;
        let mut session = db.new_session();
        assert!(session.is_empty());

        session
            .raw("SELECT * FROM t", &[])
            .raw("WHERE a = ?", &[1.into()])
            .raw("AND b = ?", &["x".into()]);
        assert_eq!(session.sql(), "SELECT * FROM t WHERE a = ? AND b = ? ");
        assert_eq!(session.args(), &[SqlValue::Int(1), SqlValue::Text("x".into())]);

        let (sql, args) = session.finish();
        assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND b = ? ");
        assert_eq!(args.len(), 2);
        assert!(session.is_empty());

        session.raw("DELETE FROM t", &[]);
        session.clear();
        assert!(session.is_empty());
        Ok::<(), Box<dyn Error>>(())
    })?;

    Ok(())
}

#[test]
fn failures_propagate_and_reset() -> Result<(), Box<dyn Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;

    rt.block_on(async {
        let db = open_temp(&dir).await?;
        let mut session = db.new_session();

        let err = session
            .raw("INSERT INTO missing_table VALUES (?)", &[1.into()])
            .exec()
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::SqliteError(_)), "got {err:?}");
        assert!(session.is_empty());

        assert!(session.raw("SELEC nonsense", &[]).query().await.is_err());
        assert!(session.is_empty());

        assert!(
            session
                .raw("SELECT * FROM missing_table", &[])
                .query_row()
                .await
                .is_err()
        );

        // the same session keeps working after failures
        session.raw("CREATE TABLE t (v INT)", &[]).exec().await?;
        session.raw("INSERT INTO t VALUES (?), (?)", &[1.into(), 2.into()]).exec().await?;
        let first = session.raw("SELECT v FROM t ORDER BY v", &[]).query_row().await?;
        assert_eq!(first.and_then(|r| r.get("v").cloned()), Some(SqlValue::Int(1)));
        Ok::<(), Box<dyn Error>>(())
    })?;

    Ok(())
}

#[test]
fn cancelled_token_stops_execution() -> Result<(), Box<dyn Error>> {
    let rt = Runtime::new()?;
    let dir = tempfile::tempdir()?;

    rt.block_on(async {
        let db = open_temp(&dir).await?;
        db.exec("CREATE TABLE t (v INT)", &[]).await?;

        let token = CancellationToken::new();
        let done = db
            .exec_with_cancel(&token, "INSERT INTO t VALUES (?)", &[1.into()])
            .await?;
        assert_eq!(done.rows_affected, 1);
        let rows = db.query_with_cancel(&token, "SELECT v FROM t", &[]).await?;
        assert_eq!(rows.len(), 1);

        token.cancel();
        let mut session = db.new_session();
        let err = session
            .raw("INSERT INTO t VALUES (?)", &[2.into()])
            .exec_with_cancel(&token)
            .await
            .unwrap_err();
        assert!(matches!(err, OrmError::Cancelled));
        assert!(session.is_empty());

        assert!(matches!(
            db.query_row_with_cancel(&token, "SELECT v FROM t", &[]).await,
            Err(OrmError::Cancelled)
        ));

        let rows = db.query("SELECT v FROM t", &[]).await?;
        assert_eq!(rows.len(), 1, "cancelled insert must not run");
        Ok::<(), Box<dyn Error>>(())
    })?;

    Ok(())
}

/// Inserts five million rows; far longer than the cancellation delays below.
const SLOW_INSERT: &str = "INSERT INTO t WITH RECURSIVE c(x) AS \
    (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 5000000) SELECT x FROM c";

const SLOW_COUNT: &str = "WITH RECURSIVE c(x) AS \
    (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 50000000) SELECT COUNT(*) FROM c";

fn cancel_after(delay: Duration) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        trigger.cancel();
    });
    token
}

#[tokio::test]
async fn cancelling_a_running_insert_rolls_it_back() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let db = open_temp(&dir).await?;
    db.exec("CREATE TABLE t (v INT)", &[]).await?;

    let token = cancel_after(Duration::from_millis(20));
    let mut session = db.new_session();
    let result = session.raw(SLOW_INSERT, &[]).exec_with_cancel(&token).await;
    assert!(matches!(result, Err(OrmError::Cancelled)), "got {result:?}");
    assert!(session.is_empty());

    let count = db.query_row("SELECT COUNT(*) AS n FROM t", &[]).await?;
    assert_eq!(count.and_then(|r| r.get("n").cloned()), Some(SqlValue::Int(0)));

    // the interrupted connection is usable again
    let done = db.exec("INSERT INTO t VALUES (?)", &[7.into()]).await?;
    assert_eq!(done.rows_affected, 1);
    Ok(())
}

#[tokio::test]
async fn cancelling_a_running_query_stops_it() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let db = open_temp(&dir).await?;

    let token = cancel_after(Duration::from_millis(20));
    let started = Instant::now();
    let result = db.query_with_cancel(&token, SLOW_COUNT, &[]).await;
    assert!(matches!(result, Err(OrmError::Cancelled)), "got {result:?}");
    assert!(started.elapsed() < Duration::from_secs(5));

    let version = db.version().await?;
    assert!(!version.is_empty());
    Ok(())
}
