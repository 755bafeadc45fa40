//! Declarative field registration for configuration records.
//!
//! A record type lists its settable fields once, as a [`Schema`], instead of
//! being introspected at runtime. Each [`Field`] carries a name, the declared
//! [`FieldKind`] (derived from the Rust type through [`ConfigType`]), a
//! metadata [`Tag`] holding the default, and a write handle into the record.
//!
//! ```
//! use etcd_configer::schema::{Configurable, Field, Schema};
//!
//! #[derive(Default)]
//! struct HttpConfig {
//!     timeout: i64,
//!     name: String,
//! }
//!
//! impl Configurable for HttpConfig {
//!     fn schema() -> Schema<Self> {
//!         Schema::new()
//!             .field(Field::new("Timeout", |c: &mut HttpConfig| &mut c.timeout).default("10s"))
//!             .field(Field::new("Name", |c: &mut HttpConfig| &mut c.name))
//!     }
//! }
//! ```

pub mod tag;

pub use tag::Tag;

use crate::coerce::{FieldKind, TypedValue};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// A Rust type that can back a configuration field.
pub trait ConfigType: Sized + Send + Sync + 'static {
    /// Declared semantic kind, which selects the coercion rule.
    fn kind() -> FieldKind;

    /// Convert a coerced value into this type.
    fn from_typed(value: TypedValue) -> Result<Self>;

    /// Render the current value in its stored text form.
    fn to_raw(&self) -> String;
}

fn mismatch(expected: FieldKind, got: &TypedValue) -> Error {
    Error::InvalidInput(format!(
        "expected {} value, got {}",
        expected,
        got.kind_name()
    ))
}

impl ConfigType for bool {
    fn kind() -> FieldKind {
        FieldKind::Bool
    }

    fn from_typed(value: TypedValue) -> Result<Self> {
        match value {
            TypedValue::Bool(b) => Ok(b),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }

    fn to_raw(&self) -> String {
        self.to_string()
    }
}

impl ConfigType for String {
    fn kind() -> FieldKind {
        FieldKind::String
    }

    fn from_typed(value: TypedValue) -> Result<Self> {
        match value {
            TypedValue::String(s) => Ok(s),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }

    fn to_raw(&self) -> String {
        self.clone()
    }
}

macro_rules! integer_config_type {
    ($($t:ty),* $(,)?) => {
        $(
            impl ConfigType for $t {
                fn kind() -> FieldKind {
                    FieldKind::Integer
                }

                fn from_typed(value: TypedValue) -> Result<Self> {
                    match value {
                        TypedValue::Integer(v) => <$t>::try_from(v).map_err(|_| Error::OutOfRange {
                            value: v.to_string(),
                            target: stringify!($t),
                        }),
                        other => Err(mismatch(Self::kind(), &other)),
                    }
                }

                fn to_raw(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_config_type!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ConfigType for f64 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn from_typed(value: TypedValue) -> Result<Self> {
        match value {
            TypedValue::Float(f) => Ok(f),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }

    fn to_raw(&self) -> String {
        self.to_string()
    }
}

impl ConfigType for f32 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }

    fn from_typed(value: TypedValue) -> Result<Self> {
        f64::from_typed(value).map(|f| f as f32)
    }

    fn to_raw(&self) -> String {
        self.to_string()
    }
}

impl ConfigType for Vec<String> {
    fn kind() -> FieldKind {
        FieldKind::StringList
    }

    fn from_typed(value: TypedValue) -> Result<Self> {
        match value {
            TypedValue::StringList(items) => Ok(items),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }

    fn to_raw(&self) -> String {
        self.join("\n")
    }
}

/// Durations are integer fields holding nanoseconds.
impl ConfigType for Duration {
    fn kind() -> FieldKind {
        FieldKind::Integer
    }

    fn from_typed(value: TypedValue) -> Result<Self> {
        match value {
            TypedValue::Integer(v) => u64::try_from(v)
                .map(Duration::from_nanos)
                .map_err(|_| Error::OutOfRange {
                    value: v.to_string(),
                    target: "Duration",
                }),
            other => Err(mismatch(Self::kind(), &other)),
        }
    }

    fn to_raw(&self) -> String {
        self.as_nanos().to_string()
    }
}

type ReadFn<T> = Box<dyn Fn(&mut T) -> String + Send + Sync>;
type WriteFn<T> = Box<dyn Fn(&mut T, TypedValue) -> Result<()> + Send + Sync>;

/// Read and write handles for one field of `T`.
pub(crate) struct Binding<T> {
    read: ReadFn<T>,
    write: WriteFn<T>,
}

impl<T> Binding<T> {
    /// Current value of the field, in stored text form.
    pub(crate) fn read(&self, record: &mut T) -> String {
        (self.read)(record)
    }

    /// Overwrite the field. On error the field is left untouched.
    pub(crate) fn write(&self, record: &mut T, value: TypedValue) -> Result<()> {
        (self.write)(record, value)
    }
}

/// Declaration of one configuration field of `T`.
pub struct Field<T> {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) tag: Tag,
    pub(crate) binding: Option<Binding<T>>,
}

impl<T: 'static> Field<T> {
    /// Declare a settable field reached through `accessor`.
    pub fn new<V, F>(name: impl Into<String>, accessor: F) -> Self
    where
        V: ConfigType,
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let accessor = Arc::new(accessor);
        let reader = Arc::clone(&accessor);
        let binding = Binding {
            read: Box::new(move |record: &mut T| (*reader)(record).to_raw()),
            write: Box::new(move |record: &mut T, value: TypedValue| {
                let parsed = V::from_typed(value)?;
                *(*accessor)(record) = parsed;
                Ok(())
            }),
        };
        Self {
            name: name.into(),
            kind: V::kind(),
            tag: Tag::default(),
            binding: Some(binding),
        }
    }

    /// Declare a field that exists on the record but cannot be written.
    ///
    /// Such fields are reported and skipped when a namespace is registered.
    pub fn unexported<V: ConfigType>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: V::kind(),
            tag: Tag::default(),
            binding: None,
        }
    }
}

impl<T> Field<T> {
    /// Set the default value written to the store when no key exists.
    pub fn default(mut self, value: &str) -> Self {
        self.tag.push("default", value);
        self
    }

    /// Replace the raw metadata tag.
    ///
    /// Without a `default:"..."` entry the whole tag text is used as the default.
    pub fn tag(mut self, raw: impl Into<String>) -> Self {
        self.tag = Tag::new(raw);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn metadata(&self) -> &Tag {
        &self.tag
    }

    pub fn is_assignable(&self) -> bool {
        self.binding.is_some()
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("tag", &self.tag)
            .field("assignable", &self.binding.is_some())
            .finish()
    }
}

/// Ordered field declarations for a record type.
pub struct Schema<T> {
    fields: Vec<Field<T>>,
}

impl<T> Schema<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field declaration.
    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn into_fields(self) -> Vec<Field<T>> {
        self.fields
    }
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A record type that knows its own schema.
pub trait Configurable: Send + Sync + Sized + 'static {
    fn schema() -> Schema<Self>;
}
