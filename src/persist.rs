//! Opaque-graph persistence
//!
//! A [`Persisted`] tree stores every record and collection as its type name
//! plus reduced constructor arguments. Loading looks the name up in a
//! [`TypeRegistry`] and rebuilds the instance through its constructor, so
//! every loaded value is validated again. No static knowledge of the types
//! is needed on the loading side, only that they were defined.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{RecordError, RecordResult};
use crate::pods::lookup_scalar_marshaller;
use crate::registry::TypeRegistry;
use crate::value::{Duration, Value};

/// Serializable form of a value graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Persisted {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "float_text")] f64),
    Str(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Duration { seconds: i64, nanos: i32 },
    Uuid(Uuid),
    List(Vec<Persisted>),
    Map(Vec<(Persisted, Persisted)>),
    /// Extension scalar, as marshalled text
    Scalar { type_name: String, text: String },
    /// Record or collection: type name and constructor arguments
    Instance {
        type_name: String,
        values: Vec<Persisted>,
    },
}

/// Floats as JSON numbers, except non-finite ones, which JSON cannot hold
/// and are written as `"NaN"`, `"inf"` or `"-inf"`.
mod float_text {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(f: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = if f.is_nan() {
            Repr::Text("NaN".to_string())
        } else if f.is_infinite() {
            Repr::Text(if *f > 0.0 { "inf" } else { "-inf" }.to_string())
        } else {
            Repr::Number(*f)
        };
        repr.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(f) => Ok(f),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("{:?} is not a float", other))),
            },
        }
    }
}

/// Converts a value graph to its persisted form
pub fn dump(value: &Value) -> RecordResult<Persisted> {
    Ok(match value {
        Value::Null => Persisted::Null,
        Value::Bool(b) => Persisted::Bool(*b),
        Value::Int(n) => Persisted::Int(*n),
        Value::Float(f) => Persisted::Float(*f),
        Value::Str(s) => Persisted::Str(s.clone()),
        Value::DateTime(dt) => Persisted::DateTime(*dt),
        Value::Date(d) => Persisted::Date(*d),
        Value::Duration(d) => Persisted::Duration {
            seconds: d.num_seconds(),
            nanos: d.subsec_nanos(),
        },
        Value::Uuid(u) => Persisted::Uuid(*u),
        Value::Record(r) => instance(r.reduce())?,
        Value::Collection(c) => instance(c.reduce())?,
        Value::Scalar(s) => {
            let marshaller = lookup_scalar_marshaller(s.type_name()).ok_or_else(|| {
                RecordError::persistence(format!(
                    "no marshaller is registered for scalar type {}",
                    s.type_name()
                ))
            })?;
            Persisted::Scalar {
                type_name: s.type_name().to_string(),
                text: marshaller.marshal(value)?,
            }
        }
        Value::List(items) => Persisted::List(items.iter().map(dump).collect::<RecordResult<_>>()?),
        Value::Map(entries) => Persisted::Map(
            entries
                .iter()
                .map(|(k, v)| -> RecordResult<(Persisted, Persisted)> { Ok((dump(k)?, dump(v)?)) })
                .collect::<RecordResult<_>>()?,
        ),
    })
}

fn instance((type_name, values): (String, Vec<Value>)) -> RecordResult<Persisted> {
    Ok(Persisted::Instance {
        type_name,
        values: values.iter().map(dump).collect::<RecordResult<_>>()?,
    })
}

/// Rebuilds a value graph, resolving types in the process-wide registry
pub fn load(persisted: &Persisted) -> RecordResult<Value> {
    load_with(persisted, TypeRegistry::global())
}

/// Rebuilds a value graph, resolving types in `registry`
pub fn load_with(persisted: &Persisted, registry: &TypeRegistry) -> RecordResult<Value> {
    Ok(match persisted {
        Persisted::Null => Value::Null,
        Persisted::Bool(b) => Value::Bool(*b),
        Persisted::Int(n) => Value::Int(*n),
        Persisted::Float(f) => Value::Float(*f),
        Persisted::Str(s) => Value::Str(s.clone()),
        Persisted::DateTime(dt) => Value::DateTime(*dt),
        Persisted::Date(d) => Value::Date(*d),
        Persisted::Duration { seconds, nanos } => Duration::try_seconds(*seconds)
            .and_then(|d| d.checked_add(&Duration::nanoseconds(i64::from(*nanos))))
            .map(Value::Duration)
            .ok_or_else(|| {
                RecordError::persistence(format!(
                    "duration of {}s {}ns is out of range",
                    seconds, nanos
                ))
            })?,
        Persisted::Uuid(u) => Value::Uuid(*u),
        Persisted::List(items) => Value::List(
            items
                .iter()
                .map(|item| load_with(item, registry))
                .collect::<RecordResult<_>>()?,
        ),
        Persisted::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| -> RecordResult<(Value, Value)> {
                    Ok((load_with(k, registry)?, load_with(v, registry)?))
                })
                .collect::<RecordResult<_>>()?,
        ),
        Persisted::Scalar { type_name, text } => lookup_scalar_marshaller(type_name)
            .ok_or_else(|| {
                RecordError::persistence(format!(
                    "no marshaller is registered for scalar type {}",
                    type_name
                ))
            })?
            .unmarshal(text)?,
        Persisted::Instance { type_name, values } => {
            let values = values
                .iter()
                .map(|v| load_with(v, registry))
                .collect::<RecordResult<Vec<_>>>()?;
            registry.reconstruct(type_name, values)?
        }
    })
}

/// Persists a value graph as JSON text
pub fn dumps(value: &Value) -> RecordResult<String> {
    let persisted = dump(value)?;
    serde_json::to_string(&persisted).map_err(|e| RecordError::persistence(e.to_string()))
}

/// Loads a value graph from JSON text written by [`dumps`]
pub fn loads(text: &str) -> RecordResult<Value> {
    let persisted: Persisted =
        serde_json::from_str(text).map_err(|e| RecordError::persistence(e.to_string()))?;
    load(&persisted)
}
