//! Table schemas derived from [`Model`] types.

mod macros;
mod model;
mod sql_type;

use std::collections::HashMap;
use std::fmt;

use crate::dialect::Dialect;
use crate::error::OrmError;

pub use model::{FieldDescriptor, Model};
pub use sql_type::SqlType;

/// One column of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Dialect column type, e.g. `BIGINT`
    pub sql_type: String,
    /// Verbatim tag; empty when the member carried none
    pub tag: String,
}

/// Ordered column metadata for one model type.
///
/// `field_names` and the lookup behind [`get_field`](Self::get_field) always mirror `fields`.
#[derive(Clone)]
pub struct Schema<'a, M> {
    pub model: &'a M,
    pub name: String,
    pub fields: Vec<Field>,
    pub field_names: Vec<String>,
    field_map: HashMap<String, usize>,
}

impl<'a, M: Model> Schema<'a, M> {
    /// Derive the schema of `model` using `dialect` for column types.
    ///
    /// Members are taken in declaration order; embedded and non-exported members are
    /// skipped.
    ///
    /// # Errors
    /// Returns `OrmError::UnsupportedType` if any remaining member has no column type.
    /// No partial schema is produced.
    pub fn parse(model: &'a M, dialect: &dyn Dialect) -> Result<Self, OrmError> {
        let name = M::model_name().to_string();
        let descriptors = M::describe();

        let mut fields = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors.iter().filter(|d| d.is_column()) {
            let sql_type = dialect.column_type(&descriptor.kind).inspect_err(|e| {
                tracing::warn!(model = %name, field = descriptor.name, error = %e, "cannot map field");
            })?;
            fields.push(Field {
                name: descriptor.name.to_string(),
                sql_type,
                tag: descriptor.tag.unwrap_or_default().to_string(),
            });
        }

        let field_names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        let field_map = field_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        tracing::debug!(
            model = %name,
            dialect = dialect.name(),
            columns = fields.len(),
            "parsed schema"
        );

        Ok(Self {
            model,
            name,
            fields,
            field_names,
            field_map,
        })
    }
}

impl<M> fmt::Debug for Schema<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl<M> Schema<'_, M> {
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).and_then(|&i| self.fields.get(i))
    }

    /// Replace the table name, e.g. with its `snake_case` form.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `CREATE TABLE` statement for this schema, tags appended after each column type.
    #[must_use]
    pub fn create_table_sql(&self, dialect: &dyn Dialect) -> String {
        let columns = self
            .fields
            .iter()
            .map(|f| {
                let mut col = format!("{} {}", dialect.quote_ident(&f.name), f.sql_type);
                if !f.tag.is_empty() {
                    col.push(' ');
                    col.push_str(&f.tag);
                }
                col
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({columns})", dialect.quote_ident(&self.name))
    }
}
