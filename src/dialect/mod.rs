//! SQL dialects and the registry they are looked up from.
//!
//! A [`Dialect`] turns a [`ValueKind`] into a column type and renders the few fixed
//! statements the facade needs. Dialects live in a [`DialectRegistry`]; the facade resolves
//! one by driver name when it opens a pool.

mod mysql;
mod sqlite;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::error::OrmError;
use crate::value_kind::{Shape, ValueKind};

pub use mysql::MysqlDialect;
pub use sqlite::SqliteDialect;

/// Engine-specific SQL strategy.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Registry name, matching the driver name.
    fn name(&self) -> &str;

    /// SQL column type for a value shape.
    ///
    /// # Errors
    /// Returns `OrmError::UnsupportedType` for shapes with no column mapping; never falls back
    /// to a default type.
    fn column_type(&self, kind: &ValueKind) -> Result<String, OrmError> {
        standard_column_type(kind).map(str::to_string)
    }

    /// Statement yielding one row whose single column equals `table_name` iff it exists.
    fn table_exists_query(&self, table_name: &str) -> String;

    fn drop_table_query(&self, table_name: &str) -> String;

    /// Statement yielding the engine version as a single scalar.
    fn version_query(&self) -> String;

    /// Quote an identifier for use in DDL.
    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Column type table shared by the built-in dialects.
///
/// # Errors
/// Returns `OrmError::UnsupportedType` for unsupported shapes and numbers wider than 64 bits.
pub fn standard_column_type(kind: &ValueKind) -> Result<&'static str, OrmError> {
    match *kind {
        ValueKind::Bool => Ok("BOOL"),
        ValueKind::Int { bits, .. } if bits < 64 => Ok("INT"),
        ValueKind::Int { bits: 64, .. } => Ok("BIGINT"),
        ValueKind::Int { bits, signed } => Err(OrmError::UnsupportedType {
            type_name: format!("{}{bits}", if signed { "i" } else { "u" }),
            shape: Shape::Int,
        }),
        ValueKind::Float { bits: 32 } => Ok("FLOAT"),
        ValueKind::Float { bits: 64 } => Ok("DOUBLE"),
        ValueKind::Float { bits } => Err(OrmError::UnsupportedType {
            type_name: format!("f{bits}"),
            shape: Shape::Float,
        }),
        ValueKind::Text => Ok("TEXT"),
        ValueKind::Bytes => Ok("BLOB"),
        ValueKind::Timestamp => Ok("DATETIME"),
        ValueKind::Unsupported { type_name, shape } => Err(OrmError::UnsupportedType {
            type_name: type_name.to_string(),
            shape,
        }),
    }
}

/// Render `value` as a single-quoted SQL string literal.
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Registry of dialects keyed by name.
///
/// Built explicitly with [`with_builtins`](Self::with_builtins) and handed to
/// [`Db::open_with_registry`](crate::db::Db::open_with_registry), or shared process-wide
/// through [`global`](Self::global). Registration after start-up is safe: the map sits
/// behind a lock.
#[derive(Default)]
pub struct DialectRegistry {
    dialects: RwLock<HashMap<String, Arc<dyn Dialect>>>,
}

static GLOBAL_REGISTRY: LazyLock<DialectRegistry> = LazyLock::new(DialectRegistry::with_builtins);

impl DialectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in dialect.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("mysql", MysqlDialect::new());
        registry.register("sqlite", SqliteDialect::new());
        registry
    }

    /// Process-wide registry, bootstrapped with the built-ins on first use.
    #[must_use]
    pub fn global() -> &'static DialectRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register `dialect` under `name`; a previous entry with the same name is replaced.
    pub fn register(&self, name: impl Into<String>, dialect: impl Dialect + 'static) {
        self.register_arc(name, Arc::new(dialect));
    }

    pub fn register_arc(&self, name: impl Into<String>, dialect: Arc<dyn Dialect>) {
        let name = name.into();
        tracing::debug!(dialect = %name, "registering dialect");
        self.dialects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, dialect);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is an error.
    ///
    /// # Errors
    /// Returns `OrmError::DialectNotFound` when nothing is registered under `name`.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Dialect>, OrmError> {
        self.get(name)
            .ok_or_else(|| OrmError::DialectNotFound(name.to_string()))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dialects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("dialects", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fake(&'static str);

    impl Dialect for Fake {
        fn name(&self) -> &str {
            self.0
        }
        fn table_exists_query(&self, _table_name: &str) -> String {
            String::new()
        }
        fn drop_table_query(&self, _table_name: &str) -> String {
            String::new()
        }
        fn version_query(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = DialectRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["mysql", "sqlite"]);
        assert_eq!(registry.get("mysql").unwrap().name(), "mysql");
        assert!(registry.get("oracle").is_none());
        assert!(matches!(
            registry.require("oracle"),
            Err(OrmError::DialectNotFound(name)) if name == "oracle"
        ));
    }

    #[test]
    fn last_registration_wins() {
        let registry = DialectRegistry::new();
        registry.register("custom", Fake("first"));
        registry.register("custom", Fake("second"));
        assert_eq!(registry.names(), vec!["custom"]);
        assert_eq!(registry.get("custom").unwrap().version_query(), "second");
    }

    #[test]
    fn global_registry_has_builtins() {
        assert!(DialectRegistry::global().get("mysql").is_some());
        assert!(DialectRegistry::global().get("sqlite").is_some());
    }

    #[test]
    fn standard_type_table() {
        let cases = [
            (ValueKind::Bool, "BOOL"),
            (ValueKind::Int { bits: 8, signed: true }, "INT"),
            (ValueKind::Int { bits: 32, signed: false }, "INT"),
            (ValueKind::Int { bits: 64, signed: true }, "BIGINT"),
            (ValueKind::Int { bits: 64, signed: false }, "BIGINT"),
            (ValueKind::Float { bits: 32 }, "FLOAT"),
            (ValueKind::Float { bits: 64 }, "DOUBLE"),
            (ValueKind::Text, "TEXT"),
            (ValueKind::Bytes, "BLOB"),
            (ValueKind::Timestamp, "DATETIME"),
        ];
        for (kind, expected) in cases {
            assert_eq!(standard_column_type(&kind).unwrap(), expected, "{kind:?}");
        }
    }

    #[test]
    fn unsupported_shapes_are_errors() {
        let err = standard_column_type(&ValueKind::unsupported("Address", Shape::Struct))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid sql type Address (struct)");

        let err = standard_column_type(&ValueKind::Int { bits: 128, signed: false }).unwrap_err();
        assert_eq!(err.to_string(), "invalid sql type u128 (int)");

        let err = standard_column_type(&ValueKind::Float { bits: 128 }).unwrap_err();
        assert!(matches!(
            err,
            OrmError::UnsupportedType { shape: Shape::Float, .. }
        ));
        assert_eq!(err.to_string(), "invalid sql type f128 (float)");
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(quote_literal("users"), "'users'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
    }
}
