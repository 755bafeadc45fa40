//! Raw store values and their typed views.
//!
//! Every value in the store is text. [`RawValue`] wraps one such string and
//! converts it on demand; nothing is cached, so the same raw value can be
//! read as several types.

pub mod duration;

pub use duration::{DurationError, format_duration, parse_duration};

use crate::{Error, Result};
use std::time::Duration;

/// One raw string as read from (or written to) the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawValue {
    value: String,
}

impl RawValue {
    /// Wrap a raw string.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The raw string, verbatim.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Parse a boolean literal.
    ///
    /// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and
    /// `0`, `f`, `F`, `FALSE`, `false`, `False`.
    pub fn as_bool(&self) -> Result<bool> {
        match self.value.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(self.coercion_error("bool", "not a boolean literal")),
        }
    }

    /// Parse a base-10 integer with an optional sign.
    pub fn as_int(&self) -> Result<i64> {
        self.value
            .parse::<i64>()
            .map_err(|e| self.coercion_error("integer", e))
    }

    /// Parse a base-10 floating point literal.
    pub fn as_float(&self) -> Result<f64> {
        self.value
            .parse::<f64>()
            .map_err(|e| self.coercion_error("float", e))
    }

    /// Parse a duration literal (`5s`, `1h30m`, ...) into signed nanoseconds.
    pub fn as_duration_nanos(&self) -> Result<i64> {
        parse_duration(&self.value).map_err(|e| self.coercion_error("duration", e))
    }

    /// Parse a duration literal into a [`Duration`]. Negative literals are rejected.
    pub fn as_duration(&self) -> Result<Duration> {
        let nanos = self.as_duration_nanos()?;
        u64::try_from(nanos)
            .map(Duration::from_nanos)
            .map_err(|_| self.coercion_error("duration", "negative duration"))
    }

    /// Split on newlines. Empty segments are kept, so an empty value yields
    /// a single empty string.
    pub fn as_strings(&self) -> Vec<String> {
        self.value.split('\n').map(str::to_string).collect()
    }

    fn coercion_error(&self, expected: &'static str, reason: impl ToString) -> Error {
        Error::Coercion {
            value: self.value.clone(),
            expected,
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
