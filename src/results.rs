//! Rows and statement outcomes returned by sessions.

pub mod result_set;
pub mod row;

pub use result_set::ResultSet;
pub use row::Row;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Number of rows changed by the statement
    pub rows_affected: u64,
    /// Auto-increment id generated by the statement, when the engine reports one
    pub last_insert_id: Option<i64>,
}
