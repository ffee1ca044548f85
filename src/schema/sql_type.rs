use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, TimeZone};

use crate::value_kind::{Shape, ValueKind};

/// Type-level storage shape, looked up without needing a value.
pub trait SqlType {
    fn value_kind() -> ValueKind;
}

macro_rules! impl_sql_type {
    ($($ty:ty => $kind:expr),+ $(,)?) => {
        $(
            impl SqlType for $ty {
                fn value_kind() -> ValueKind {
                    $kind
                }
            }
        )+
    };
}

impl_sql_type! {
    bool => ValueKind::Bool,
    i8 => ValueKind::Int { bits: 8, signed: true },
    i16 => ValueKind::Int { bits: 16, signed: true },
    i32 => ValueKind::Int { bits: 32, signed: true },
    i64 => ValueKind::Int { bits: 64, signed: true },
    i128 => ValueKind::Int { bits: 128, signed: true },
    u8 => ValueKind::Int { bits: 8, signed: false },
    u16 => ValueKind::Int { bits: 16, signed: false },
    u32 => ValueKind::Int { bits: 32, signed: false },
    u64 => ValueKind::Int { bits: 64, signed: false },
    u128 => ValueKind::Int { bits: 128, signed: false },
    // stored as BIGINT whatever the target width
    isize => ValueKind::Int { bits: 64, signed: true },
    usize => ValueKind::Int { bits: 64, signed: false },
    f32 => ValueKind::Float { bits: 32 },
    f64 => ValueKind::Float { bits: 64 },
    char => ValueKind::Text,
    String => ValueKind::Text,
    Vec<u8> => ValueKind::Bytes,
    NaiveDateTime => ValueKind::Timestamp,
    SystemTime => ValueKind::Timestamp,
    () => ValueKind::unsupported("()", Shape::Unit),
}

impl<const N: usize> SqlType for [u8; N] {
    fn value_kind() -> ValueKind {
        ValueKind::Bytes
    }
}

impl<Tz: TimeZone> SqlType for DateTime<Tz> {
    fn value_kind() -> ValueKind {
        ValueKind::Timestamp
    }
}

impl<T: SqlType> SqlType for Option<T> {
    fn value_kind() -> ValueKind {
        T::value_kind()
    }
}

fn unsupported<T: ?Sized>(shape: Shape) -> ValueKind {
    ValueKind::unsupported(std::any::type_name::<T>(), shape)
}

impl<T: ?Sized> SqlType for Box<T> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Pointer)
    }
}

impl<T: ?Sized> SqlType for Rc<T> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Pointer)
    }
}

impl<T: ?Sized> SqlType for Arc<T> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Pointer)
    }
}

impl<K, V, S> SqlType for HashMap<K, V, S> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Map)
    }
}

impl<K, V> SqlType for BTreeMap<K, V> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Map)
    }
}

impl<T> SqlType for Sender<T> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Channel)
    }
}

impl<T> SqlType for SyncSender<T> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Channel)
    }
}

impl<T> SqlType for Receiver<T> {
    fn value_kind() -> ValueKind {
        unsupported::<Self>(Shape::Channel)
    }
}

macro_rules! impl_fn_pointer {
    ($($arg:ident),*) => {
        impl<R, $($arg),*> SqlType for fn($($arg),*) -> R {
            fn value_kind() -> ValueKind {
                unsupported::<Self>(Shape::Func)
            }
        }
    };
}

impl_fn_pointer!();
impl_fn_pointer!(A);
impl_fn_pointer!(A, B);
impl_fn_pointer!(A, B, C);
impl_fn_pointer!(A, B, C, D);
