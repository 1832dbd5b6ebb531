//! Scalar marshallers
//!
//! Scalars without a native PODS shape (timestamps, durations, uuids,
//! caller-defined scalars) are serialized as text through a marshaller.
//! Standard marshallers are built in; caller marshallers are registered
//! per type and take precedence.
//!
//! Field plans look their marshaller up when they are compiled. A marshaller
//! registered after a field was defined is never seen by that field.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::{RecordError, RecordResult};
use crate::value::{Duration, Value, ValueType};

/// Format for `datetime` values
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format for `date` values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Value to text
pub type MarshalFn = Arc<dyn Fn(&Value) -> RecordResult<String> + Send + Sync>;

/// Text to value
pub type UnmarshalFn = Arc<dyn Fn(&str) -> RecordResult<Value> + Send + Sync>;

/// Parse failures in the standard marshallers
#[derive(Debug, Error)]
pub enum MarshalError {
    #[error("invalid datetime {text:?}: {source}")]
    DateTime {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid date {text:?}: {source}")]
    Date {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid duration {0:?}")]
    Duration(String),

    #[error("invalid uuid {text:?}: {source}")]
    Uuid {
        text: String,
        #[source]
        source: uuid::Error,
    },

    #[error("expected a {expected} value, got {actual}")]
    WrongKind { expected: &'static str, actual: String },
}

impl From<MarshalError> for RecordError {
    fn from(err: MarshalError) -> Self {
        RecordError::value(format!(": {}", err))
    }
}

/// Encode/decode pair for one scalar type
#[derive(Clone)]
pub struct Marshaller {
    marshal: MarshalFn,
    unmarshal: UnmarshalFn,
}

impl Marshaller {
    pub fn new<M, U>(marshal: M, unmarshal: U) -> Self
    where
        M: Fn(&Value) -> RecordResult<String> + Send + Sync + 'static,
        U: Fn(&str) -> RecordResult<Value> + Send + Sync + 'static,
    {
        Self {
            marshal: Arc::new(marshal),
            unmarshal: Arc::new(unmarshal),
        }
    }

    pub fn marshal(&self, value: &Value) -> RecordResult<String> {
        (self.marshal)(value)
    }

    pub fn unmarshal(&self, text: &str) -> RecordResult<Value> {
        (self.unmarshal)(text)
    }

    /// Whether both handles point at the same marshaller
    pub fn same_as(&self, other: &Marshaller) -> bool {
        Arc::ptr_eq(&self.marshal, &other.marshal) && Arc::ptr_eq(&self.unmarshal, &other.unmarshal)
    }
}

impl fmt::Debug for Marshaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Marshaller")
    }
}

/// Registry key: the marshallable types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MarshalKey {
    DateTime,
    Date,
    Duration,
    Uuid,
    Scalar(String),
}

impl MarshalKey {
    fn for_type(value_type: &ValueType) -> Option<Self> {
        match value_type {
            ValueType::DateTime => Some(MarshalKey::DateTime),
            ValueType::Date => Some(MarshalKey::Date),
            ValueType::Duration => Some(MarshalKey::Duration),
            ValueType::Uuid => Some(MarshalKey::Uuid),
            ValueType::Scalar(st) => Some(MarshalKey::Scalar(st.name().to_string())),
            _ => None,
        }
    }
}

fn wrong_kind(expected: &'static str, value: &Value) -> RecordError {
    MarshalError::WrongKind {
        expected,
        actual: value.kind_name().to_string(),
    }
    .into()
}

fn standard_marshallers() -> HashMap<MarshalKey, Marshaller> {
    let mut standard = HashMap::new();

    standard.insert(
        MarshalKey::DateTime,
        Marshaller::new(
            |v| match v {
                Value::DateTime(dt) => Ok(dt.format(DATETIME_FORMAT).to_string()),
                other => Err(wrong_kind("datetime", other)),
            },
            |text| {
                NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                    .map(Value::DateTime)
                    .map_err(|source| {
                        MarshalError::DateTime {
                            text: text.to_string(),
                            source,
                        }
                        .into()
                    })
            },
        ),
    );

    standard.insert(
        MarshalKey::Date,
        Marshaller::new(
            |v| match v {
                Value::Date(d) => Ok(d.format(DATE_FORMAT).to_string()),
                other => Err(wrong_kind("date", other)),
            },
            |text| {
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .map(Value::Date)
                    .map_err(|source| {
                        MarshalError::Date {
                            text: text.to_string(),
                            source,
                        }
                        .into()
                    })
            },
        ),
    );

    // Durations travel as a number of seconds, with microsecond precision.
    standard.insert(
        MarshalKey::Duration,
        Marshaller::new(
            |v| match v {
                Value::Duration(d) => d
                    .num_microseconds()
                    .map(format_seconds)
                    .ok_or_else(|| MarshalError::Duration(d.to_string()).into()),
                other => Err(wrong_kind("duration", other)),
            },
            |text| {
                parse_seconds(text.trim())
                    .map(|us| Value::Duration(Duration::microseconds(us)))
                    .ok_or_else(|| MarshalError::Duration(text.to_string()).into())
            },
        ),
    );

    standard.insert(
        MarshalKey::Uuid,
        Marshaller::new(
            |v| match v {
                Value::Uuid(u) => Ok(u.hyphenated().to_string()),
                other => Err(wrong_kind("uuid", other)),
            },
            |text| {
                Uuid::parse_str(text).map(Value::Uuid).map_err(|source| {
                    MarshalError::Uuid {
                        text: text.to_string(),
                        source,
                    }
                    .into()
                })
            },
        ),
    );

    standard
}

struct MarshallerRegistry {
    standard: HashMap<MarshalKey, Marshaller>,
    custom: RwLock<HashMap<MarshalKey, Marshaller>>,
}

static MARSHALLERS: OnceLock<MarshallerRegistry> = OnceLock::new();

fn registry() -> &'static MarshallerRegistry {
    MARSHALLERS.get_or_init(|| MarshallerRegistry {
        standard: standard_marshallers(),
        custom: RwLock::new(HashMap::new()),
    })
}

fn key_or_err(value_type: &ValueType) -> RecordResult<MarshalKey> {
    MarshalKey::for_type(value_type).ok_or_else(|| {
        RecordError::invalid_arguments(format!(
            "values of type {} are not marshalled",
            value_type
        ))
    })
}

/// Registers a marshaller for a scalar type, replacing any previous
/// caller marshaller for it.
pub fn register_marshaller(value_type: &ValueType, marshaller: Marshaller) -> RecordResult<()> {
    let key = key_or_err(value_type)?;
    tracing::debug!(value_type = %value_type, "registered marshaller");
    registry()
        .custom
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(key, marshaller);
    Ok(())
}

/// Removes a caller marshaller. Fails unless `marshaller` is the one
/// currently registered for the type.
pub fn unregister_marshaller(value_type: &ValueType, marshaller: &Marshaller) -> RecordResult<()> {
    let key = key_or_err(value_type)?;
    let mut custom = registry().custom.write().unwrap_or_else(|e| e.into_inner());
    match custom.get(&key) {
        Some(current) if current.same_as(marshaller) => {
            custom.remove(&key);
            Ok(())
        }
        _ => Err(RecordError::invalid_arguments(format!(
            "marshaller is not registered for {}",
            value_type
        ))),
    }
}

/// Current marshaller for a type: caller-registered first, then standard
pub fn lookup_marshaller(value_type: &ValueType) -> Option<Marshaller> {
    MarshalKey::for_type(value_type).and_then(|key| lookup_key(&key))
}

/// Marshaller for an extension scalar, by its full type name
pub(crate) fn lookup_scalar_marshaller(type_name: &str) -> Option<Marshaller> {
    lookup_key(&MarshalKey::Scalar(type_name.to_string()))
}

fn lookup_key(key: &MarshalKey) -> Option<Marshaller> {
    let reg = registry();
    let custom = reg.custom.read().unwrap_or_else(|e| e.into_inner());
    custom
        .get(key)
        .or_else(|| reg.standard.get(key))
        .cloned()
}

/// Registration that is undone when dropped
#[must_use = "the marshaller is unregistered as soon as the guard is dropped"]
pub struct MarshallerGuard {
    value_type: ValueType,
    marshaller: Marshaller,
}

impl Drop for MarshallerGuard {
    fn drop(&mut self) {
        if let Err(err) = unregister_marshaller(&self.value_type, &self.marshaller) {
            tracing::warn!(error = %err, "scoped marshaller was already replaced");
        }
    }
}

/// Registers `marshaller` until the returned guard is dropped
pub fn temporary_marshaller(value_type: &ValueType, marshaller: Marshaller) -> RecordResult<MarshallerGuard> {
    register_marshaller(value_type, marshaller.clone())?;
    Ok(MarshallerGuard {
        value_type: value_type.clone(),
        marshaller,
    })
}

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Seconds as decimal text, exact to the microsecond: `1.5`, `-0.000001`, `3.0`
fn format_seconds(us: i64) -> String {
    let sign = if us < 0 { "-" } else { "" };
    let abs = us.unsigned_abs();
    let (whole, frac) = (abs / MICROS_PER_SECOND, abs % MICROS_PER_SECOND);
    if frac == 0 {
        return format!("{}{}.0", sign, whole);
    }
    let digits = format!("{:06}", frac);
    format!("{}{}.{}", sign, whole, digits.trim_end_matches('0'))
}

/// Parses decimal seconds into microseconds. Plain decimals are read with
/// integer arithmetic and rounded half away from zero at the microsecond;
/// anything else (exponent forms) goes through `f64`.
fn parse_seconds(text: &str) -> Option<i64> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let plain = !(whole.is_empty() && frac.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit());
    if !plain {
        return text
            .parse::<f64>()
            .ok()
            .map(|secs| secs * MICROS_PER_SECOND as f64)
            .filter(|us| us.is_finite() && us.abs() < i64::MAX as f64)
            .map(|us| us.round() as i64);
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut micros: u64 = 0;
    for (i, digit) in frac.bytes().take(6).enumerate() {
        micros += u64::from(digit - b'0') * 10u64.pow(5 - i as u32);
    }
    if frac.as_bytes().get(6).is_some_and(|d| *d >= b'5') {
        micros += 1;
    }
    let total = whole.checked_mul(MICROS_PER_SECOND)?.checked_add(micros)?;
    if negative {
        0i64.checked_sub_unsigned(total)
    } else {
        i64::try_from(total).ok()
    }
}
