use std::collections::HashMap;
use std::sync::Arc;

use crate::error::OrmError;
use crate::types::SqlValue;

/// A row from a database query result
///
/// Column names and the name→index lookup are shared by every row of the same
/// [`ResultSet`](super::ResultSet).
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<SqlValue>,
    #[doc(hidden)]
    pub(crate) column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Create a new database row, building its own column lookup.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index.get(column_name) {
            return Some(idx);
        }
        // MySQL catalog columns come back upper-cased
        self.column_names
            .iter()
            .position(|col| col.eq_ignore_ascii_case(column_name))
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Scan the first column as text.
    ///
    /// # Errors
    /// Returns `OrmError::ConversionError` when the row is empty or the first column is not
    /// text (NULL included).
    pub fn scan_text(&self) -> Result<String, OrmError> {
        match self.values.first() {
            Some(value) => value.scan_text().map(str::to_string).ok_or_else(|| {
                OrmError::ConversionError(format!("cannot scan {value:?} into a string"))
            }),
            None => Err(OrmError::ConversionError(
                "cannot scan an empty row".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
