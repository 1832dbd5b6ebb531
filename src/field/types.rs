//! Field specification types
//!
//! A [`FieldSpec`] is a field's contract: conformance type, nullability,
//! default, coercion and value predicate. Specs are immutable; every
//! modifier returns a derived copy.

use std::fmt;
use std::sync::Arc;

use crate::collection::CollectionType;
use crate::errors::{RecordError, RecordResult};
use crate::record::RecordType;
use crate::value::{Value, ValueType};

/// Caller-supplied transform applied before any check
pub type CoerceFn = Arc<dyn Fn(Value) -> RecordResult<Value> + Send + Sync>;

/// Caller-supplied predicate; `Ok(false)` rejects the value
pub type CheckFn = Arc<dyn Fn(&Value) -> RecordResult<bool> + Send + Sync>;

/// Transform applied to a value before validation
#[derive(Clone)]
pub enum Coercion {
    /// Convert to an integer (truncating floats, parsing strings)
    ToInt,
    /// Convert to a float
    ToFloat,
    /// Render a scalar as text
    ToStr,
    /// Truthiness
    ToBool,
    /// Caller transform
    Custom(CoerceFn),
    /// Build the given collection type from list, map or collection input
    Collection(CollectionType),
}

impl Coercion {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Value) -> RecordResult<Value> + Send + Sync + 'static,
    {
        Coercion::Custom(Arc::new(f))
    }

    /// Built-in conversions never yield an absent value
    pub fn never_absent(&self) -> bool {
        matches!(
            self,
            Coercion::ToInt | Coercion::ToFloat | Coercion::ToStr | Coercion::ToBool
        )
    }

    /// The type this coercion always produces, when it is known up front.
    /// Collection coercion may also pass absence through.
    pub fn target(&self) -> Option<ValueType> {
        match self {
            Coercion::ToInt => Some(ValueType::Int),
            Coercion::ToFloat => Some(ValueType::Float),
            Coercion::ToStr => Some(ValueType::Str),
            Coercion::ToBool => Some(ValueType::Bool),
            Coercion::Collection(ct) => Some(ValueType::Collection(ct.clone())),
            Coercion::Custom(_) => None,
        }
    }

    /// Applies the coercion. Built-in conversions expect a present value;
    /// the plan deals with absence before calling them.
    pub(crate) fn apply(&self, value: Value) -> RecordResult<Value> {
        match self {
            Coercion::ToInt => to_int(value),
            Coercion::ToFloat => to_float(value),
            Coercion::ToStr => match value.plain_text() {
                Some(text) => Ok(Value::Str(text)),
                None => Err(conversion_error(&value, "str")),
            },
            Coercion::ToBool => Ok(Value::Bool(truthy(&value))),
            Coercion::Custom(f) => f(value),
            Coercion::Collection(ct) => ct.coerce(value),
        }
    }
}

fn conversion_error(value: &Value, target: &str) -> RecordError {
    RecordError::value(format!(": cannot convert {} to {}", value, target))
}

fn to_int(value: Value) -> RecordResult<Value> {
    match value {
        Value::Int(_) => Ok(value),
        Value::Bool(b) => Ok(Value::Int(b as i64)),
        Value::Float(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Value::Int(f.trunc() as i64))
        }
        Value::Str(ref s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| conversion_error(&value, "int")),
        other => Err(conversion_error(&other, "int")),
    }
}

fn to_float(value: Value) -> RecordResult<Value> {
    match value {
        Value::Float(_) => Ok(value),
        Value::Int(n) => Ok(Value::Float(n as f64)),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::Str(ref s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| conversion_error(&value, "float")),
        other => Err(conversion_error(&other, "float")),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Float(f) => *f != 0.0,
        Value::Duration(d) => *d != crate::value::Duration::zero(),
        other => other.len().map_or(true, |n| n > 0),
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coercion::ToInt => f.write_str("ToInt"),
            Coercion::ToFloat => f.write_str("ToFloat"),
            Coercion::ToStr => f.write_str("ToStr"),
            Coercion::ToBool => f.write_str("ToBool"),
            Coercion::Custom(_) => f.write_str("<fn>"),
            Coercion::Collection(ct) => write!(f, "{}", ct.name()),
        }
    }
}

/// Partial update for [`FieldSpec::derive`]. `None` keeps the original.
#[derive(Clone, Default)]
pub struct FieldOverrides {
    pub nullable: Option<bool>,
    pub default: Option<Value>,
    pub coerce: Option<Coercion>,
    pub check: Option<CheckFn>,
}

/// One field's validation contract
#[derive(Clone)]
pub struct FieldSpec {
    value_type: ValueType,
    nullable: bool,
    default: Option<Value>,
    coerce: Option<Coercion>,
    check: Option<CheckFn>,
}

impl FieldSpec {
    /// Non-nullable field with no coercion and no predicate
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            nullable: false,
            default: None,
            coerce: None,
            check: None,
        }
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Configured default, if any. Null defaults are treated as no default.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }

    pub fn coercion(&self) -> Option<&Coercion> {
        self.coerce.as_ref()
    }

    pub fn check(&self) -> Option<&CheckFn> {
        self.check.as_ref()
    }

    /// Copy of this spec with the given overrides applied
    pub fn derive(&self, overrides: FieldOverrides) -> Self {
        Self {
            value_type: self.value_type.clone(),
            nullable: overrides.nullable.unwrap_or(self.nullable),
            default: overrides.default.or_else(|| self.default.clone()),
            coerce: overrides.coerce.or_else(|| self.coerce.clone()),
            check: overrides.check.or_else(|| self.check.clone()),
        }
    }

    /// Nullable copy
    pub fn nullable(&self) -> Self {
        self.with_nullable(true)
    }

    pub fn with_nullable(&self, nullable: bool) -> Self {
        self.derive(FieldOverrides {
            nullable: Some(nullable),
            ..Default::default()
        })
    }

    /// Copy with a default. Defaults only apply to nullable fields.
    pub fn with_default(&self, default: impl Into<Value>) -> Self {
        self.derive(FieldOverrides {
            default: Some(default.into()),
            ..Default::default()
        })
    }

    pub fn with_coerce(&self, coerce: Coercion) -> Self {
        self.derive(FieldOverrides {
            coerce: Some(coerce),
            ..Default::default()
        })
    }

    pub fn with_check<F>(&self, check: F) -> Self
    where
        F: Fn(&Value) -> RecordResult<bool> + Send + Sync + 'static,
    {
        self.with_check_fn(Arc::new(check))
    }

    pub fn with_check_fn(&self, check: CheckFn) -> Self {
        self.derive(FieldOverrides {
            check: Some(check),
            ..Default::default()
        })
    }
}

impl From<ValueType> for FieldSpec {
    fn from(value_type: ValueType) -> Self {
        FieldSpec::new(value_type)
    }
}

impl From<RecordType> for FieldSpec {
    fn from(record_type: RecordType) -> Self {
        FieldSpec::new(ValueType::Record(record_type))
    }
}

impl From<CollectionType> for FieldSpec {
    fn from(collection_type: CollectionType) -> Self {
        collection_type.field()
    }
}

impl From<&FieldSpec> for FieldSpec {
    fn from(spec: &FieldSpec) -> Self {
        spec.clone()
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}", self.value_type)?;
        if self.nullable {
            f.write_str(", nullable=true")?;
        }
        if let Some(default) = self.default_value() {
            write!(f, ", default={}", default)?;
        }
        if let Some(coerce) = &self.coerce {
            write!(f, ", coerce={:?}", coerce)?;
        }
        if self.check.is_some() {
            f.write_str(", check=<fn>")?;
        }
        f.write_str(")")
    }
}
