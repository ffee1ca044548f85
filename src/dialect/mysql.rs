use super::{Dialect, quote_literal};

/// MySQL / MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn table_exists_query(&self, table_name: &str) -> String {
        format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = {}",
            quote_literal(table_name)
        )
    }

    fn drop_table_query(&self, table_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_ident(table_name))
    }

    fn version_query(&self) -> String {
        "SELECT VERSION()".to_string()
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_kind::{Shape, ValueKind};

    #[test]
    fn statements() {
        let d = MysqlDialect::new();
        assert_eq!(
            d.table_exists_query("users"),
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = 'users'"
        );
        assert_eq!(
            d.table_exists_query("x' OR '1'='1"),
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = 'x'' OR ''1''=''1'"
        );
        assert_eq!(d.drop_table_query("users"), "DROP TABLE IF EXISTS `users`");
        assert_eq!(d.version_query(), "SELECT VERSION()");
    }

    #[test]
    fn backtick_quoting() {
        let d = MysqlDialect::new();
        assert_eq!(d.quote_ident("order"), "`order`");
        assert_eq!(d.quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn column_types() {
        let d = MysqlDialect::new();
        assert_eq!(d.column_type(&ValueKind::Int { bits: 32, signed: true }).unwrap(), "INT");
        assert_eq!(d.column_type(&ValueKind::Text).unwrap(), "TEXT");
        assert!(d.column_type(&ValueKind::unsupported("fn()", Shape::Func)).is_err());
    }
}
