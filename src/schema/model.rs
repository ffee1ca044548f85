use crate::value_kind::ValueKind;

/// One declared member of a [`Model`], in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Storage shape of the member's type
    pub kind: ValueKind,
    /// Opaque per-field annotation, copied verbatim into the schema
    pub tag: Option<&'static str>,
    /// Only exported (`pub`) members become columns
    pub exported: bool,
    /// Embedded members are flattened away and never become columns
    pub embedded: bool,
}

impl FieldDescriptor {
    /// An exported, non-embedded member without a tag.
    #[must_use]
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            tag: None,
            exported: true,
            embedded: false,
        }
    }

    #[must_use]
    pub const fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    #[must_use]
    pub const fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    #[must_use]
    pub const fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    /// Whether this member becomes a column.
    #[must_use]
    pub const fn is_column(&self) -> bool {
        self.exported && !self.embedded
    }
}

/// A type that can describe its own members.
///
/// Usually implemented by [`model!`](crate::model), but a hand-written impl is equally
/// valid:
///
/// ```rust
/// use sql_orm::schema::{FieldDescriptor, Model, SqlType};
///
/// struct Account {
///     id: i64,
///     email: String,
/// }
///
/// impl Model for Account {
///     fn model_name() -> &'static str {
///         "Account"
///     }
///
///     fn describe() -> Vec<FieldDescriptor> {
///         vec![
///             FieldDescriptor::new("id", i64::value_kind()).tag("PRIMARY KEY"),
///             FieldDescriptor::new("email", String::value_kind()),
///         ]
///     }
/// }
///
/// assert_eq!(Account::describe().len(), 2);
/// ```
pub trait Model {
    /// Bare type name, used as the table name.
    fn model_name() -> &'static str;

    /// Every declared member, including the ones that do not become columns.
    fn describe() -> Vec<FieldDescriptor>;
}

impl<M: Model> Model for &M {
    fn model_name() -> &'static str {
        M::model_name()
    }

    fn describe() -> Vec<FieldDescriptor> {
        M::describe()
    }
}

impl<M: Model> Model for Box<M> {
    fn model_name() -> &'static str {
        M::model_name()
    }

    fn describe() -> Vec<FieldDescriptor> {
        M::describe()
    }
}
