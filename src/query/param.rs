//! Positional query parameters.

use serde_json::Value;

/// SQL type of a typed NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Text,
    Bytes,
}

/// A positional parameter bound to a `?` / `$n` placeholder.
///
/// Each backend converts these into its own bind values.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Untyped NULL, bound as a text NULL.
    ///
    /// Postgres rejects a text parameter assigned to a non-text column,
    /// so prefer `TypedNull` there, or cast the placeholder (`$1::int`).
    Null,
    /// NULL bound with a concrete SQL type. `None::<T>` converts to this.
    TypedNull(ParamType),
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Param {
    /// Check if this is SQL `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Null | Param::TypedNull(_))
    }
}

/// Rust types with a fixed SQL parameter type, so that `None` can be bound
/// as a NULL of that type.
pub trait ParamKind {
    const KIND: ParamType;
}

macro_rules! impl_param_kind {
    ($($kind:ident => $($ty:ty),+);* $(;)?) => {
        $($(
            impl ParamKind for $ty {
                const KIND: ParamType = ParamType::$kind;
            }
        )+)*
    };
}

impl_param_kind!(
    Bool => bool;
    Int => i32, i64, u32;
    Float => f64;
    Text => &str, String;
    Bytes => Vec<u8>, &[u8];
);

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Int(value.into())
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Int(value.into())
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<Vec<u8>> for Param {
    fn from(value: Vec<u8>) -> Self {
        Param::Bytes(value)
    }
}

impl From<&[u8]> for Param {
    fn from(value: &[u8]) -> Self {
        Param::Bytes(value.to_vec())
    }
}

impl<T: Into<Param> + ParamKind> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Param::TypedNull(T::KIND),
        }
    }
}

/// JSON scalars map onto the matching variant; arrays and objects are
/// bound as their JSON text.
impl From<Value> for Param {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Param::Null,
            Value::Bool(b) => Param::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Param::Int(i),
                None => Param::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Param::Text(s),
            other => Param::Text(other.to_string()),
        }
    }
}

/// Build a `Vec<Param>` from a list of values.
///
/// ```
/// use txsession::{params, Param};
///
/// let params = params![1, "alice", None::<i64>];
/// assert_eq!(params[1], Param::Text("alice".into()));
/// assert!(params[2].is_null());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::query::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::query::Param::from($value)),+]
    };
}
