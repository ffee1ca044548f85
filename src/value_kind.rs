use std::fmt;

/// Storage shape of a model field, independent of any live value.
///
/// Produced at the type level by [`SqlType`](crate::schema::SqlType) and consumed only by
/// [`Dialect::column_type`](crate::dialect::Dialect::column_type).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Boolean
    Bool,
    /// Integer of the given width in bits
    Int { bits: u32, signed: bool },
    /// Floating point of the given width in bits
    Float { bits: u32 },
    /// UTF-8 text
    Text,
    /// Byte array or byte vector
    Bytes,
    /// A structured temporal value recognized as a timestamp
    Timestamp,
    /// Anything with no column mapping
    Unsupported {
        type_name: &'static str,
        shape: Shape,
    },
}

/// Coarse shape of a type that has no SQL column mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Struct,
    Map,
    Func,
    Channel,
    Pointer,
    Unit,
    Int,
    Float,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Struct => "struct",
            Shape::Map => "map",
            Shape::Func => "func",
            Shape::Channel => "chan",
            Shape::Pointer => "ptr",
            Shape::Unit => "unit",
            Shape::Int => "int",
            Shape::Float => "float",
        };
        f.write_str(name)
    }
}

impl ValueKind {
    /// Convenience constructor for an unsupported shape.
    #[must_use]
    pub const fn unsupported(type_name: &'static str, shape: Shape) -> Self {
        ValueKind::Unsupported { type_name, shape }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, ValueKind::Unsupported { .. })
    }
}
