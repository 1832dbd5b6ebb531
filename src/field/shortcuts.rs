//! Ready-made field specs
//!
//! Value checks do not chain: applying one of the check shortcuts to a spec
//! that already has a check is an error.

use std::collections::HashSet;

use regex::Regex;

use crate::errors::{RecordError, RecordResult};
use crate::value::{Value, ValueType};

use super::types::FieldSpec;

/// Field accepting only the given values. All values must share one type.
pub fn one_of(values: impl IntoIterator<Item = impl Into<Value>>) -> RecordResult<FieldSpec> {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    let first = values
        .first()
        .ok_or_else(|| RecordError::invalid_arguments("one_of requires at least one value"))?;

    let value_type = native_type_of(first)?;
    if let Some(other) = values.iter().find(|v| !value_type.matches(v)) {
        return Err(RecordError::invalid_arguments(format!(
            "all arguments to one_of should be of the same type ({} is not {})",
            value_type,
            other.kind_name()
        )));
    }

    let allowed: HashSet<Value> = values.into_iter().collect();
    Ok(FieldSpec::new(value_type).with_check(move |v| Ok(allowed.contains(v))))
}

fn native_type_of(value: &Value) -> RecordResult<ValueType> {
    Ok(match value {
        Value::Bool(_) => ValueType::Bool,
        Value::Int(_) => ValueType::Int,
        Value::Float(_) => ValueType::Float,
        Value::Str(_) => ValueType::Str,
        Value::DateTime(_) => ValueType::DateTime,
        Value::Date(_) => ValueType::Date,
        Value::Duration(_) => ValueType::Duration,
        Value::Uuid(_) => ValueType::Uuid,
        Value::Record(r) => ValueType::Record(r.record_type().clone()),
        Value::Collection(c) => ValueType::Collection(c.collection_type().clone()),
        other => {
            return Err(RecordError::invalid_arguments(format!(
                "one_of cannot enumerate {} values",
                other.kind_name()
            )))
        }
    })
}

/// Nullable copy of `spec`, optionally with a default
pub fn nullable(spec: impl Into<FieldSpec>, default: Option<Value>) -> FieldSpec {
    let spec = spec.into().nullable();
    match default {
        Some(default) => spec.with_default(default),
        None => spec,
    }
}

fn value_check<F>(name: &str, spec: impl Into<FieldSpec>, check: F) -> RecordResult<FieldSpec>
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let spec = spec.into();
    if spec.check().is_some() {
        return Err(RecordError::invalid_arguments(format!(
            "{}: the field already has a value check, and checks do not chain",
            name
        )));
    }
    Ok(spec.with_check(move |v| Ok(check(v))))
}

/// Rejects empty strings and collections
pub fn nonempty(spec: impl Into<FieldSpec>) -> RecordResult<FieldSpec> {
    value_check("nonempty", spec, |v| v.len().map_or(false, |n| n > 0))
}

/// Rejects negative numbers
pub fn nonnegative(spec: impl Into<FieldSpec>) -> RecordResult<FieldSpec> {
    value_check("nonnegative", spec, |v| match v {
        Value::Int(n) => *n >= 0,
        Value::Float(f) => *f >= 0.0,
        _ => false,
    })
}

/// Rejects zero and negative numbers
pub fn strictly_positive(spec: impl Into<FieldSpec>) -> RecordResult<FieldSpec> {
    value_check("strictly_positive", spec, |v| match v {
        Value::Int(n) => *n > 0,
        Value::Float(f) => *f > 0.0,
        _ => false,
    })
}

fn regex_field(pattern: &str) -> RecordResult<FieldSpec> {
    let re = Regex::new(pattern).map_err(|e| RecordError::invalid_arguments(e.to_string()))?;
    Ok(FieldSpec::new(ValueType::Str).with_check(move |v| Ok(v.as_str().map_or(false, |s| re.is_match(s)))))
}

fn char_class_field(class: &str, len: Option<usize>) -> RecordResult<FieldSpec> {
    let multiplier = match len {
        Some(n) => format!("{{{}}}", n),
        None => "*".to_string(),
    };
    regex_field(&format!("^[{}]{}$", class, multiplier))
}

/// `A-Z` only, optionally of exact length
pub fn uppercase_letters(len: Option<usize>) -> RecordResult<FieldSpec> {
    char_class_field("A-Z", len)
}

/// `A-Z0-9_` only
pub fn uppercase_wchars(len: Option<usize>) -> RecordResult<FieldSpec> {
    char_class_field("A-Z0-9_", len)
}

/// Upper-case hex digits only
pub fn uppercase_hex(len: Option<usize>) -> RecordResult<FieldSpec> {
    char_class_field("0-9A-F", len)
}

/// `a-z` only
pub fn lowercase_letters(len: Option<usize>) -> RecordResult<FieldSpec> {
    char_class_field("a-z", len)
}

/// `a-z0-9_` only
pub fn lowercase_wchars(len: Option<usize>) -> RecordResult<FieldSpec> {
    char_class_field("a-z0-9_", len)
}

/// Lower-case hex digits only
pub fn lowercase_hex(len: Option<usize>) -> RecordResult<FieldSpec> {
    char_class_field("0-9a-f", len)
}

/// Decimal digits only
pub fn digits_str(len: Option<usize>) -> RecordResult<FieldSpec> {
    char_class_field("0-9", len)
}

/// `http://` or `https://` URL of at most 2000 characters after the scheme
pub fn absolute_http_url() -> RecordResult<FieldSpec> {
    regex_field(r"^https?://.{1,2000}$")
}
