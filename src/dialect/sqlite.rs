use super::{Dialect, quote_literal};

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn table_exists_query(&self, table_name: &str) -> String {
        format!(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = {}",
            quote_literal(table_name)
        )
    }

    fn drop_table_query(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_ident(table_name))
    }

    fn version_query(&self) -> String {
        "SELECT sqlite_version()".to_string()
    }
}
