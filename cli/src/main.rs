mod args;

use clap::Parser;
use sql_orm::prelude::*;
use tracing::Level;

use crate::args::{Args, Command};

model! {
    #[derive(Debug, Default)]
    pub struct User {
        pub id: i64 => "PRIMARY KEY",
        pub name: String,
        pub email: String => "UNIQUE",
        pub password: String,
        pub created_at: i64,
        pub updated_at: i64,
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if args.debug { Level::DEBUG } else { Level::INFO })
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = rt.block_on(run(args)) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), OrmError> {
    let ds = args.data_source()?;

    if let Command::Schema { apply: false } = args.command {
        let dialect = DialectRegistry::global()
            .get(ds.driver.as_str())
            .ok_or_else(|| OrmError::DialectNotFound(ds.driver.to_string()))?;
        print_schema(&User::default(), dialect.as_ref())?;
        return Ok(());
    }

    let db = Db::open(ds).await?;
    if args.debug {
        db.enable_debug();
    }

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = dispatch(&db, args.command, &token).await;
    db.close().await;
    result
}

async fn dispatch(db: &Db, command: Command, token: &CancellationToken) -> Result<(), OrmError> {
    match command {
        Command::Version => println!("{}", db.version().await?),
        Command::Exists { table } => println!("{}", db.table_exists(&table).await),
        Command::Drop { table } => println!("{}", db.drop_table(&table).await),
        Command::Exec { sql, args } => {
            let done = db.exec_with_cancel(token, &sql, &bind_args(args)).await?;
            println!("rows affected: {}", done.rows_affected);
            if let Some(id) = done.last_insert_id {
                println!("last insert id: {id}");
            }
        }
        Command::Query { sql, args } => {
            let rows = db.query_with_cancel(token, &sql, &bind_args(args)).await?;
            for row in &rows.results {
                println!("{}", row_to_json(row));
            }
        }
        Command::Schema { apply } => {
            let user = User::default();
            let schema = print_schema(&user, db.dialect())?;
            if apply {
                db.create_table(&schema).await?;
                tracing::info!(table = %schema.name, "table created");
            }
        }
    }
    Ok(())
}

fn print_schema<'a>(user: &'a User, dialect: &dyn Dialect) -> Result<Schema<'a, User>, OrmError> {
    let schema = Schema::parse(user, dialect)?
        .with_name(sql_orm::helpers::to_snake_case(User::model_name()));
    for field in &schema.fields {
        println!("{:<12} {:<8} {}", field.name, field.sql_type, field.tag);
    }
    println!("{}", schema.create_table_sql(dialect));
    Ok(schema)
}

/// Command-line arguments bind as integers when they parse as one, text otherwise.
fn bind_args(args: Vec<String>) -> Vec<SqlValue> {
    args.into_iter()
        .map(|arg| match arg.parse::<i64>() {
            Ok(i) => SqlValue::Int(i),
            Err(_) => SqlValue::Text(arg),
        })
        .collect()
}

fn row_to_json(row: &Row) -> serde_json::Value {
    let object = row
        .column_names
        .iter()
        .zip(&row.values)
        .map(|(name, value)| {
            let json = match value {
                SqlValue::Int(i) => serde_json::Value::from(*i),
                SqlValue::Float(f) => serde_json::Value::from(*f),
                SqlValue::Text(s) => serde_json::Value::from(s.as_str()),
                SqlValue::Bool(b) => serde_json::Value::from(*b),
                SqlValue::Timestamp(dt) => serde_json::Value::from(dt.to_string()),
                SqlValue::Null => serde_json::Value::Null,
                SqlValue::JSON(v) => v.clone(),
                SqlValue::Blob(bytes) => serde_json::Value::from(String::from_utf8_lossy(bytes)),
            };
            (name.clone(), json)
        })
        .collect();
    serde_json::Value::Object(object)
}
