//! Coercion of raw store strings into a field's declared type.
//!
//! | Declared kind | Attempts, in order                        |
//! |---------------|-------------------------------------------|
//! | `Bool`        | boolean literal                           |
//! | `String`      | verbatim                                  |
//! | `Integer`     | duration literal (nanoseconds), then integer |
//! | `Float`       | floating point literal                    |
//! | `StringList`  | split on `\n`                             |
//! | `Unsupported` | always fails                              |
//!
//! Integer fields try the duration form first so that `timeout = "5s"` and
//! `timeout = "5000000000"` land on the same value.

use crate::value::RawValue;
use crate::{Error, Result};

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    String,
    /// Any integer width, and durations stored as nanoseconds.
    Integer,
    /// Any floating point precision.
    Float,
    StringList,
    /// A type no coercion rule covers; carries the type name for messages.
    Unsupported(&'static str),
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::StringList => "string-list",
            Self::Unsupported(name) => name,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A successfully coerced value, ready to be written into a field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    String(String),
    Integer(i64),
    Float(f64),
    StringList(Vec<String>),
}

impl TypedValue {
    /// Name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::StringList(_) => "string-list",
        }
    }
}

/// Coerce `raw` into `kind`.
///
/// A value that does not parse yields [`Error::Coercion`]; an unsupported
/// kind yields [`Error::UnsupportedType`]. Neither is fatal to a
/// synchronization pass.
pub fn coerce(raw: &RawValue, kind: FieldKind) -> Result<TypedValue> {
    match kind {
        FieldKind::Bool => raw.as_bool().map(TypedValue::Bool),
        FieldKind::String => Ok(TypedValue::String(raw.as_str().to_string())),
        FieldKind::Integer => match raw.as_duration_nanos() {
            Ok(nanos) => Ok(TypedValue::Integer(nanos)),
            Err(_) => raw.as_int().map(TypedValue::Integer),
        },
        FieldKind::Float => raw.as_float().map(TypedValue::Float),
        FieldKind::StringList => Ok(TypedValue::StringList(raw.as_strings())),
        FieldKind::Unsupported(name) => Err(Error::UnsupportedType(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce_str(raw: &str, kind: FieldKind) -> Result<TypedValue> {
        coerce(&RawValue::new(raw), kind)
    }

    #[test]
    fn test_integer_prefers_duration() {
        assert_eq!(
            coerce_str("5s", FieldKind::Integer).unwrap(),
            TypedValue::Integer(5_000_000_000)
        );
        assert_eq!(
            coerce_str("5", FieldKind::Integer).unwrap(),
            TypedValue::Integer(5)
        );
        assert_eq!(
            coerce_str("0", FieldKind::Integer).unwrap(),
            TypedValue::Integer(0)
        );
    }

    #[test]
    fn test_integer_failure_reports_integer() {
        let err = coerce_str("notanumber", FieldKind::Integer).unwrap_err();
        assert!(matches!(
            err,
            Error::Coercion {
                expected: "integer",
                ..
            }
        ));
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(
            coerce_str(" spaced \n", FieldKind::String).unwrap(),
            TypedValue::String(" spaced \n".to_string())
        );
    }

    #[test]
    fn test_bool_and_float() {
        assert_eq!(
            coerce_str("True", FieldKind::Bool).unwrap(),
            TypedValue::Bool(true)
        );
        assert!(coerce_str("on", FieldKind::Bool).is_err());
        assert_eq!(
            coerce_str("0.25", FieldKind::Float).unwrap(),
            TypedValue::Float(0.25)
        );
        assert!(coerce_str("5s", FieldKind::Float).is_err());
    }

    #[test]
    fn test_string_list() {
        assert_eq!(
            coerce_str("a\nb\nc", FieldKind::StringList).unwrap(),
            TypedValue::StringList(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(
            coerce_str("", FieldKind::StringList).unwrap(),
            TypedValue::StringList(vec![String::new()])
        );
    }

    #[test]
    fn test_unsupported_kind_always_fails() {
        let err = coerce_str("anything", FieldKind::Unsupported("SocketAddr")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(ref name) if name == "SocketAddr"));
        assert_eq!(err.to_string(), "unsupported config type: SocketAddr");
    }
}
