/// Declare a struct together with its [`Model`](crate::schema::Model) implementation.
///
/// Each field may carry a tag after `=>`, which is copied verbatim into the schema, and
/// may be marked `@embedded` to keep it out of the column list. Fields that are not `pub`
/// are described but never become columns.
///
/// ```rust
/// use sql_orm::model;
/// use sql_orm::schema::Model;
///
/// model! {
///     #[derive(Debug, Default)]
///     pub struct Audit {
///         pub created_by: String,
///     }
/// }
///
/// model! {
///     #[derive(Debug, Default)]
///     pub struct User {
///         pub id: i64 => "PRIMARY KEY",
///         pub name: String => "NOT NULL",
///         pub age: Option<i32>,
///         @embedded pub audit: Audit,
///         password_hash: String,
///     }
/// }
///
/// assert_eq!(User::model_name(), "User");
/// assert_eq!(User::describe().iter().filter(|f| f.is_column()).count(), 3);
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$sattr:meta])*
        $svis:vis struct $name:ident {
            $(
                $(#[$fattr:meta])*
                $(@$marker:ident)?
                $fvis:vis $fname:ident : $fty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$sattr])*
        $svis struct $name {
            $(
                $(#[$fattr])*
                $fvis $fname: $fty,
            )*
        }

        impl $crate::schema::Model for $name {
            fn model_name() -> &'static str {
                stringify!($name)
            }

            fn describe() -> ::std::vec::Vec<$crate::schema::FieldDescriptor> {
                ::std::vec![
                    $(
                        $crate::schema::FieldDescriptor {
                            name: stringify!($fname),
                            kind: <$fty as $crate::schema::SqlType>::value_kind(),
                            tag: $crate::__model_tag!($($tag)?),
                            exported: stringify!($fvis) == "pub",
                            embedded: $crate::__model_embedded!($($marker)?),
                        },
                    )*
                ]
            }
        }

        impl $crate::schema::SqlType for $name {
            fn value_kind() -> $crate::value_kind::ValueKind {
                $crate::value_kind::ValueKind::unsupported(
                    stringify!($name),
                    $crate::value_kind::Shape::Struct,
                )
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __model_tag {
    () => {
        ::std::option::Option::None
    };
    ($tag:literal) => {
        ::std::option::Option::Some($tag)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __model_embedded {
    () => {
        false
    };
    (embedded) => {
        true
    };
}
