//! Dynamic value model
//!
//! Every field of every synthesized type holds a [`Value`]. Values are
//! immutable; composite variants (`Record`, `Collection`) are shared
//! handles, so cloning a value never copies a validated instance.
//!
//! `List` and `Map` are untyped construction sources: they are accepted as
//! input when a collection is coerced from raw data, and are used as the
//! argument shape when collections are reduced for persistence, but no
//! declared type ever matches them.

pub mod hash;
mod scalar;
mod types;

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::collection::Collection;
use crate::record::Record;

pub use scalar::{Scalar, ScalarType, ScalarValue};
pub use types::ValueType;

use self::hash::{combine_ordered, combine_unordered, stable_hash};

/// Duration type carried by [`Value::Duration`]
pub type Duration = chrono::Duration;

/// A single field, element, key or value
#[derive(Clone)]
pub enum Value {
    /// Absence
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Duration(Duration),
    Uuid(Uuid),
    Record(Record),
    Collection(Collection),
    Scalar(Scalar),
    /// Untyped ordered elements
    List(Vec<Value>),
    /// Untyped key/value entries
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Wraps an extension scalar
    pub fn scalar<T: ScalarValue>(value: T) -> Self {
        Value::Scalar(Scalar::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_scalar<T: std::any::Any>(&self) -> Option<&T> {
        match self {
            Value::Scalar(s) => s.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Short name of the value's runtime kind, for error messages
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Duration(_) => "duration",
            Value::Uuid(_) => "uuid",
            Value::Record(r) => r.record_type().name(),
            Value::Collection(c) => c.collection_type().name(),
            Value::Scalar(s) => s.type_name().rsplit("::").next().unwrap_or("scalar"),
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Number of elements for sized values (strings count characters)
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Collection(c) => Some(c.len()),
            _ => None,
        }
    }

    /// Process-independent hash, consistent with equality
    pub fn hash_code(&self) -> u64 {
        match self {
            Value::Null => stable_hash(0, &()),
            Value::Bool(b) => stable_hash(1, b),
            Value::Int(n) => stable_hash(2, n),
            Value::Float(f) => stable_hash(3, &canonical_float_bits(*f)),
            Value::Str(s) => stable_hash(4, s.as_str()),
            Value::DateTime(dt) => stable_hash(5, dt),
            Value::Date(d) => stable_hash(6, d),
            Value::Duration(d) => stable_hash(7, d),
            Value::Uuid(u) => stable_hash(8, u),
            Value::Record(r) => r.hash_code(),
            Value::Collection(c) => c.hash_code(),
            Value::Scalar(s) => s.stable_hash(),
            Value::List(items) => combine_ordered(items.iter().map(Value::hash_code)),
            Value::Map(entries) => combine_unordered(
                entries
                    .iter()
                    .map(|(k, v)| k.hash_code().wrapping_mul(31) ^ v.hash_code()),
            ),
        }
    }

    /// Text of a scalar without repr quoting. Used by string conversion and
    /// for mapping keys.
    pub(crate) fn plain_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(n) => Some(n.to_string()),
            Value::Float(f) => Some(format_float(*f)),
            Value::Str(s) => Some(s.clone()),
            Value::DateTime(dt) => Some(dt.format(crate::pods::DATETIME_FORMAT).to_string()),
            Value::Date(d) => Some(d.format(crate::pods::DATE_FORMAT).to_string()),
            Value::Uuid(u) => Some(u.hyphenated().to_string()),
            _ => None,
        }
    }
}

fn canonical_float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

fn format_float(f: f64) -> String {
    format!("{:?}", f)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::DateTime(dt) => write!(f, "datetime({})", dt.format(crate::pods::DATETIME_FORMAT)),
            Value::Date(d) => write!(f, "date({})", d.format(crate::pods::DATE_FORMAT)),
            Value::Duration(d) => write!(f, "duration({})", d),
            Value::Uuid(u) => write!(f, "uuid({})", u.hyphenated()),
            Value::Record(r) => write!(f, "{}", r),
            Value::Collection(c) => write!(f, "{}", c),
            Value::Scalar(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Value::Collection(c)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
