//! Record instances

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Map;

use crate::errors::{RecordError, RecordResult};
use crate::pods::Pods;
use crate::value::hash::combine_weighted;
use crate::value::Value;

use super::types::RecordType;

struct RecordInner {
    record_type: RecordType,
    values: Vec<Value>,
}

/// An immutable, validated record
///
/// Values are held in canonical field order. There is no way to change a
/// field after construction; [`derive`](Record::derive) builds a new
/// instance instead.
#[derive(Clone)]
pub struct Record(Arc<RecordInner>);

impl Record {
    pub(crate) fn from_validated(record_type: RecordType, values: Vec<Value>) -> Self {
        Self(Arc::new(RecordInner { record_type, values }))
    }

    pub fn record_type(&self) -> &RecordType {
        &self.0.record_type
    }

    /// Value of a field, `None` if the type has no such field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0
            .record_type
            .position(field)
            .map(|i| &self.0.values[i])
    }

    /// Values in canonical order
    pub fn values(&self) -> &[Value] {
        &self.0.values
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.record_type.field_names().zip(self.0.values.iter())
    }

    /// Always fails: records are immutable.
    pub fn set(&self, _field: &str, _value: impl Into<Value>) -> RecordResult<()> {
        Err(RecordError::immutable(self.0.record_type.name()))
    }

    /// Always fails: records are immutable.
    pub fn remove(&self, _field: &str) -> RecordResult<()> {
        Err(RecordError::immutable(self.0.record_type.name()))
    }

    /// New instance with some fields replaced. Every field is validated
    /// again.
    pub fn derive<I, N, V>(&self, overrides: I) -> RecordResult<Record>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Value>,
    {
        let record_type = &self.0.record_type;
        let mut values = self.0.values.clone();
        for (field, value) in overrides {
            let field = field.as_ref();
            let i = record_type
                .position(field)
                .ok_or_else(|| record_type.no_such_field(field))?;
            values[i] = value.into();
        }
        record_type.build(values)
    }

    /// Projects to a PODS mapping. Absent fields are omitted.
    pub fn to_pods(&self) -> RecordResult<Pods> {
        let mut object = Map::new();
        let fields = self.0.record_type.field_names().zip(self.0.record_type.plans());
        for ((field, plan), value) in fields.zip(&self.0.values) {
            if value.is_null() {
                continue;
            }
            object.insert(field.to_string(), plan.to_pods(value)?);
        }
        Ok(Pods::Object(object))
    }

    /// Type name and canonical positional values, enough to rebuild the
    /// instance through the registry
    pub fn reduce(&self) -> (String, Vec<Value>) {
        (self.0.record_type.name().to_string(), self.0.values.clone())
    }

    /// Stable hash: `Σ hash(v_i) * 7^i`
    pub fn hash_code(&self) -> u64 {
        combine_weighted(self.0.values.iter().map(Value::hash_code))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.record_type == other.0.record_type && self.0.values == other.0.values)
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.0.record_type.name())?;
        for (i, (field, value)) in self.fields().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field, value)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
