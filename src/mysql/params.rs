use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;

use crate::types::SqlValue;

/// Bind positional arguments onto a sqlx query, in order.
pub fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    args: &[SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for arg in args {
        query = match arg {
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Timestamp(dt) => query.bind(*dt),
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::JSON(json) => query.bind(json.to_string()),
            SqlValue::Blob(bytes) => query.bind(bytes.clone()),
        };
    }
    query
}
