//! Convenient imports for common functionality.
//!
//! ```rust
//! use sql_orm::prelude::*;
//! ```

pub use crate::datasource::{DataSource, DataSourceBuilder, PoolConfig};
pub use crate::db::Db;
pub use crate::dialect::{Dialect, DialectRegistry};
pub use crate::error::OrmError;
pub use crate::model;
pub use crate::pool::PoolStats;
pub use crate::results::{ExecResult, ResultSet, Row};
pub use crate::schema::{Field, FieldDescriptor, Model, Schema, SqlType};
pub use crate::session::Session;
pub use crate::types::{Driver, SqlValue};

pub use tokio_util::sync::CancellationToken;
