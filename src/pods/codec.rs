//! Per-type PODS capability
//!
//! Whether and how a declared type reaches a PODS is decided once, when a
//! field plan is compiled, and cached in the plan as a [`PodsCodec`].

use serde_json::{Map, Number};

use crate::collection::CollectionType;
use crate::errors::{RecordError, RecordResult};
use crate::record::RecordType;
use crate::value::{Value, ValueType};

use super::marshaller::{lookup_marshaller, Marshaller};
use super::Pods;

/// Types with a direct PODS representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    Bool,
    Int,
    Float,
    Str,
}

/// How values of one declared type are projected to and from a PODS
#[derive(Debug, Clone)]
pub enum PodsCodec {
    Native(NativeKind),
    Record(RecordType),
    Collection(CollectionType),
    Marshalled(Marshaller),
    /// No capability; the type name is kept for the error message
    Unsupported(String),
}

impl PodsCodec {
    /// Resolves the capability of `value_type` from the marshallers
    /// registered right now.
    pub fn resolve(value_type: &ValueType) -> Self {
        match value_type {
            ValueType::Bool => PodsCodec::Native(NativeKind::Bool),
            ValueType::Int => PodsCodec::Native(NativeKind::Int),
            ValueType::Float => PodsCodec::Native(NativeKind::Float),
            ValueType::Str => PodsCodec::Native(NativeKind::Str),
            ValueType::Record(rt) => PodsCodec::Record(rt.clone()),
            ValueType::Collection(ct) => PodsCodec::Collection(ct.clone()),
            other => match lookup_marshaller(other) {
                Some(marshaller) => PodsCodec::Marshalled(marshaller),
                None => PodsCodec::Unsupported(other.to_string()),
            },
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PodsCodec::Unsupported(_))
    }

    /// Projects a validated value. Absence maps to null; callers that
    /// represent absence by omission filter it out first.
    pub fn encode(&self, value: &Value) -> RecordResult<Pods> {
        if value.is_null() {
            return Ok(Pods::Null);
        }
        match self {
            PodsCodec::Native(_) => encode_native(value),
            PodsCodec::Record(_) => match value {
                Value::Record(r) => r.to_pods(),
                other => Err(unexpected(other)),
            },
            PodsCodec::Collection(_) => match value {
                Value::Collection(c) => c.to_pods(),
                other => Err(unexpected(other)),
            },
            PodsCodec::Marshalled(m) => m.marshal(value).map(Pods::String),
            PodsCodec::Unsupported(name) => Err(unsupported(name)),
        }
    }

    /// Loads an unvalidated value
    pub fn decode(&self, pods: &Pods) -> RecordResult<Value> {
        if pods.is_null() {
            return Ok(Value::Null);
        }
        match self {
            PodsCodec::Native(NativeKind::Float) => match pods.as_f64() {
                Some(f) => Ok(Value::Float(f)),
                None => Ok(decode_plain(pods)),
            },
            PodsCodec::Native(_) => Ok(decode_plain(pods)),
            PodsCodec::Record(rt) => rt.from_pods(pods).map(Value::Record),
            PodsCodec::Collection(ct) => ct.from_pods(pods).map(Value::Collection),
            PodsCodec::Marshalled(m) => match pods {
                Pods::String(text) => m.unmarshal(text),
                other => Err(RecordError::type_mismatch(format!(
                    " should be a marshalled string, not {}",
                    other
                ))),
            },
            PodsCodec::Unsupported(name) => Err(unsupported(name)),
        }
    }

    /// Text form of a mapping key
    pub fn encode_key(&self, key: &Value) -> RecordResult<String> {
        match self {
            PodsCodec::Native(_) => key
                .plain_text()
                .filter(|_| !matches!(key, Value::Float(f) if !f.is_finite()))
                .ok_or_else(|| {
                    RecordError::cannot_serialize(format!("{} cannot be used as a PODS key", key))
                }),
            PodsCodec::Marshalled(m) => m.marshal(key),
            PodsCodec::Record(rt) => Err(RecordError::cannot_serialize(format!(
                "{} values cannot be used as PODS keys",
                rt.name()
            ))),
            PodsCodec::Collection(ct) => Err(RecordError::cannot_serialize(format!(
                "{} values cannot be used as PODS keys",
                ct.name()
            ))),
            PodsCodec::Unsupported(name) => Err(unsupported(name)),
        }
    }

    /// Parses a mapping key back from its text form
    pub fn decode_key(&self, text: &str) -> RecordResult<Value> {
        match self {
            PodsCodec::Native(NativeKind::Str) => Ok(Value::Str(text.to_string())),
            PodsCodec::Native(NativeKind::Int) => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| key_parse_error(text, "int")),
            PodsCodec::Native(NativeKind::Float) => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| key_parse_error(text, "float")),
            PodsCodec::Native(NativeKind::Bool) => match text {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(key_parse_error(text, "bool")),
            },
            PodsCodec::Marshalled(m) => m.unmarshal(text),
            PodsCodec::Record(_) | PodsCodec::Collection(_) => Err(RecordError::cannot_serialize(
                format!("cannot load a key from {:?}", text),
            )),
            PodsCodec::Unsupported(name) => Err(unsupported(name)),
        }
    }
}

fn unsupported(type_name: &str) -> RecordError {
    RecordError::cannot_serialize(format!(
        "don't know how to serialize {} to a PODS",
        type_name
    ))
}

fn unexpected(value: &Value) -> RecordError {
    RecordError::cannot_serialize(format!(
        "unexpected {} value {} in PODS projection",
        value.kind_name(),
        value
    ))
}

fn key_parse_error(text: &str, target: &str) -> RecordError {
    RecordError::value(format!(": cannot read key {:?} as {}", text, target))
}

fn encode_native(value: &Value) -> RecordResult<Pods> {
    match value {
        Value::Bool(b) => Ok(Pods::Bool(*b)),
        Value::Int(n) => Ok(Pods::from(*n)),
        Value::Float(f) => Number::from_f64(*f).map(Pods::Number).ok_or_else(|| {
            RecordError::cannot_serialize(format!("{} cannot be represented in a PODS", value))
        }),
        Value::Str(s) => Ok(Pods::String(s.clone())),
        other => Err(unexpected(other)),
    }
}

/// Untyped reading of a PODS; validation decides whether it conforms.
fn decode_plain(pods: &Pods) -> Value {
    match pods {
        Pods::Null => Value::Null,
        Pods::Bool(b) => Value::Bool(*b),
        Pods::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Pods::String(s) => Value::Str(s.clone()),
        Pods::Array(items) => Value::List(items.iter().map(decode_plain).collect()),
        Pods::Object(map) => Value::Map(object_entries(map)),
    }
}

fn object_entries(map: &Map<String, Pods>) -> Vec<(Value, Value)> {
    map.iter()
        .map(|(k, v)| (Value::Str(k.clone()), decode_plain(v)))
        .collect()
}
