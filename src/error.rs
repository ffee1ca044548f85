use thiserror::Error;

use crate::value_kind::Shape;

#[derive(Debug, Error)]
pub enum OrmError {
    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MysqlError(#[from] sqlx::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    PoolErrorSqlite(#[from] bb8::RunError<rusqlite::Error>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Connection pool is closed")]
    PoolClosed,

    #[error("dialect {0} not found")]
    DialectNotFound(String),

    #[error("invalid sql type {type_name} ({shape})")]
    UnsupportedType { type_name: String, shape: Shape },

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Value conversion error: {0}")]
    ConversionError(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}
