#![doc = include_str!("../README.md")]

pub mod prelude;

pub mod datasource;
pub mod db;
pub mod dialect;
pub mod error;
pub mod helpers;
pub mod pool;
pub mod results;
pub mod schema;
pub mod session;
pub mod types;
pub mod value_kind;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use datasource::{DataSource, DataSourceBuilder, PoolConfig};
pub use db::Db;
pub use dialect::{Dialect, DialectRegistry, MysqlDialect, SqliteDialect};
pub use error::OrmError;
pub use pool::{DbPool, PoolStats};
pub use results::{ExecResult, ResultSet, Row};
pub use schema::{Field, FieldDescriptor, Model, Schema, SqlType};
pub use session::Session;
pub use types::{Driver, SqlValue};
pub use value_kind::{Shape, ValueKind};

pub use tokio_util::sync::CancellationToken;
