use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::error::OrmError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Extract one cell of a MySQL row, choosing the Rust type from the column type name.
///
/// # Errors
/// Returns `OrmError::MysqlError` if the value cannot be decoded.
pub fn mysql_extract_value(row: &MySqlRow, idx: usize) -> Result<SqlValue, OrmError> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(SqlValue::Null);
    }

    let type_name = row.columns()[idx].type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "BOOLEAN" => SqlValue::Bool(row.try_get::<bool, _>(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            SqlValue::Int(row.try_get::<i64, _>(idx)?)
        }
        "YEAR" => SqlValue::Int(i64::from(row.try_get_unchecked::<u16, _>(idx)?)),
        t if t.ends_with("UNSIGNED") => {
            let v = row.try_get::<u64, _>(idx)?;
            match i64::try_from(v) {
                Ok(i) => SqlValue::Int(i),
                Err(_) => SqlValue::Text(v.to_string()),
            }
        }
        "FLOAT" => SqlValue::Float(f64::from(row.try_get::<f32, _>(idx)?)),
        "DOUBLE" => SqlValue::Float(row.try_get::<f64, _>(idx)?),
        "DECIMAL" => SqlValue::Text(row.try_get_unchecked::<String, _>(idx)?),
        "DATETIME" | "TIMESTAMP" => SqlValue::Timestamp(row.try_get::<NaiveDateTime, _>(idx)?),
        "DATE" => SqlValue::Text(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        "JSON" => {
            let text = row.try_get_unchecked::<String, _>(idx)?;
            serde_json::from_str(&text).map_or(SqlValue::Text(text), SqlValue::JSON)
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => SqlValue::Blob(row.try_get::<Vec<u8>, _>(idx)?),
        _ => match row.try_get::<String, _>(idx) {
            Ok(s) => SqlValue::Text(s),
            Err(_) => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        },
    };
    Ok(value)
}

/// Convert fetched rows into a [`ResultSet`].
///
/// # Errors
/// Returns `OrmError` if any cell fails to decode.
pub fn build_result_set(rows: &[MySqlRow]) -> Result<ResultSet, OrmError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    let Some(first) = rows.first() else {
        result_set.set_column_names(Arc::new(Vec::new()));
        return Ok(result_set);
    };

    let column_names: Vec<String> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let col_count = column_names.len();
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(mysql_extract_value(row, i)?);
        }
        result_set.add_row_values(values);
    }
    Ok(result_set)
}
