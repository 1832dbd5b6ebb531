//! Conformance types
//!
//! A [`ValueType`] is what a field declares its values must be. It is the
//! analogue of an `isinstance` target: `matches` answers whether a value
//! conforms.

use std::fmt;

use super::scalar::ScalarType;
use super::Value;
use crate::collection::CollectionType;
use crate::record::RecordType;

/// Declared type of a field, collection element, mapping key or value
#[derive(Debug, Clone)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    DateTime,
    Date,
    Duration,
    Uuid,
    /// Instance of a synthesized record type
    Record(RecordType),
    /// Instance of a synthesized collection type
    Collection(CollectionType),
    /// Caller-defined extension scalar
    Scalar(ScalarType),
}

impl ValueType {
    /// Returns the type name for error messages and auto-naming
    pub fn type_name(&self) -> &str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::DateTime => "datetime",
            ValueType::Date => "date",
            ValueType::Duration => "duration",
            ValueType::Uuid => "uuid",
            ValueType::Record(rt) => rt.name(),
            ValueType::Collection(ct) => ct.name(),
            ValueType::Scalar(st) => st.short_name(),
        }
    }

    /// Whether `value` conforms to this type. Absence never conforms.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Bool, Value::Bool(_))
            | (ValueType::Int, Value::Int(_))
            | (ValueType::Float, Value::Float(_))
            | (ValueType::Str, Value::Str(_))
            | (ValueType::DateTime, Value::DateTime(_))
            | (ValueType::Date, Value::Date(_))
            | (ValueType::Duration, Value::Duration(_))
            | (ValueType::Uuid, Value::Uuid(_)) => true,
            (ValueType::Record(rt), Value::Record(r)) => r.record_type().extends(rt),
            (ValueType::Collection(ct), Value::Collection(c)) => c.collection_type() == ct,
            (ValueType::Scalar(st), Value::Scalar(s)) => s.type_id() == st.type_id(),
            _ => false,
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueType::Record(a), ValueType::Record(b)) => a == b,
            (ValueType::Collection(a), ValueType::Collection(b)) => a == b,
            (ValueType::Scalar(a), ValueType::Scalar(b)) => a == b,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for ValueType {}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_matching() {
        assert!(ValueType::Int.matches(&Value::Int(3)));
        assert!(!ValueType::Int.matches(&Value::Float(3.0)));
        assert!(!ValueType::Float.matches(&Value::Int(3)));
        assert!(ValueType::Str.matches(&Value::from("x")));
        assert!(!ValueType::Str.matches(&Value::Null));
    }

    #[test]
    fn test_untyped_containers_never_conform() {
        let list = Value::List(vec![Value::Int(1)]);
        assert!(!ValueType::Int.matches(&list));
        assert!(!ValueType::Str.matches(&list));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ValueType::Bool.type_name(), "bool");
        assert_eq!(ValueType::DateTime.type_name(), "datetime");
        assert_eq!(ValueType::Uuid.to_string(), "uuid");
    }

    #[test]
    fn test_equality_by_variant() {
        assert_eq!(ValueType::Int, ValueType::Int);
        assert_ne!(ValueType::Int, ValueType::Float);
    }
}
