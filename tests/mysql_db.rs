#![cfg(feature = "mysql")]

use std::error::Error;
use std::time::{Duration, Instant};

use sql_orm::prelude::*;
use tokio::runtime::Runtime;

model! {
    #[derive(Debug, Default)]
    pub struct OrmTestUsers {
        pub id: i64 => "PRIMARY KEY",
        pub name: String,
        pub age: i32,
    }
}

/// Data source from `ORM_TEST_MYSQL_*`, or `None` when no server is configured.
fn mysql_source() -> Option<DataSource> {
    let host = std::env::var("ORM_TEST_MYSQL_HOST").ok()?;
    let env = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
    Some(
        DataSource::builder()
            .host(host)
            .port(env("ORM_TEST_MYSQL_PORT", "3306").parse().unwrap_or(3306))
            .user(env("ORM_TEST_MYSQL_USER", "root"))
            .password(env("ORM_TEST_MYSQL_PASSWORD", ""))
            .db_name(env("ORM_TEST_MYSQL_DB", "orm"))
            .param("charset", "utf8mb4")
            .build(),
    )
}

#[test]
fn mysql_facade_roundtrip() -> Result<(), Box<dyn Error>> {
    let Some(ds) = mysql_source() else {
        eprintln!("ORM_TEST_MYSQL_HOST not set; skipping mysql test");
        return Ok(());
    };
    let rt = Runtime::new()?;

    rt.block_on(async {
        let db = Db::open(ds).await?;
        assert_eq!(db.driver_name(), "mysql");
        assert!(db.data_source_name().contains("@tcp("));
        assert!(!db.version().await?.is_empty());

        let table = "OrmTestUsers";
        db.drop_table(table).await;
        assert!(!db.table_exists(table).await);

        let model = OrmTestUsers::default();
        let schema = Schema::parse(&model, db.dialect())?;
        db.create_table(&schema).await?;
        assert!(db.table_exists(table).await);

        let done = db
            .exec(
                "INSERT INTO OrmTestUsers (id, name, age) VALUES (?, ?, ?), (?, ?, ?)",
                &[1.into(), "tom".into(), 18.into(), 2.into(), "sam".into(), 25.into()],
            )
            .await?;
        assert_eq!(done.rows_affected, 2);

        let rows = db
            .query("SELECT name, age FROM OrmTestUsers ORDER BY id", &[])
            .await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.results[1].get("name").and_then(SqlValue::as_text), Some("sam"));
        assert_eq!(rows.results[1].get("age").and_then(SqlValue::as_int), Some(&25));

        assert!(db.drop_table(table).await);
        assert!(!db.table_exists(table).await);

        // a killed SLEEP returns early, with or without an error
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });
        let started = Instant::now();
        let result = db.query_with_cancel(&token, "SELECT SLEEP(5)", &[]).await;
        assert!(matches!(result, Ok(_) | Err(OrmError::Cancelled)), "got {result:?}");
        assert!(started.elapsed() < Duration::from_secs(4));

        db.close().await;
        assert!(matches!(db.exec("SELECT 1", &[]).await, Err(OrmError::PoolClosed)));
        Ok::<(), Box<dyn Error>>(())
    })?;

    Ok(())
}
