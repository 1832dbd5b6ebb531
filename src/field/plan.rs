//! Validation plan compiler
//!
//! Compiling a [`FieldSpec`] resolves, once, everything the per-value
//! procedure needs: whether the default applies, whether the null and type
//! checks can be skipped, and how the value is projected to a PODS. The
//! resulting plan is shared by every instance of the owning type.
//!
//! Per value the plan runs, in this order:
//!
//! 1. default substitution (absent + nullable + default)
//! 2. coercion
//! 3. null check
//! 4. value predicate (present values only)
//! 5. type conformance
//!
//! Field errors raised in steps 2-5 are prefixed once with the plan's path
//! descriptor. Anything else passes through untouched.

use crate::errors::{RecordError, RecordResult};
use crate::pods::{Pods, PodsCodec};
use crate::value::{Value, ValueType};

use super::types::{Coercion, FieldSpec};

/// A compiled, read-only validation procedure for one field or element
#[derive(Debug, Clone)]
pub struct ValidationPlan {
    descriptor: String,
    spec: FieldSpec,
    substitute: Option<Value>,
    null_check: bool,
    type_check: bool,
    codec: PodsCodec,
}

impl ValidationPlan {
    /// Compiles a spec (or bare type) into a plan whose errors are prefixed
    /// with `descriptor`, e.g. `"Person.age"` or `"[elem]"`.
    pub fn compile(spec: impl Into<FieldSpec>, descriptor: impl Into<String>) -> Self {
        let spec = spec.into();

        let substitute = if spec.is_nullable() {
            spec.default_value().cloned()
        } else {
            None
        };

        let null_check = !spec.is_nullable()
            && !spec.coercion().map_or(false, Coercion::never_absent);

        let type_check = spec
            .coercion()
            .and_then(Coercion::target)
            .map_or(true, |target| &target != spec.value_type());

        let codec = PodsCodec::resolve(spec.value_type());

        Self {
            descriptor: descriptor.into(),
            spec,
            substitute,
            null_check,
            type_check,
            codec,
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn value_type(&self) -> &ValueType {
        self.spec.value_type()
    }

    pub fn is_nullable(&self) -> bool {
        self.spec.is_nullable()
    }

    /// Whether values of this field can reach a PODS at all
    pub fn is_serializable(&self) -> bool {
        self.codec.is_supported()
    }

    /// Runs the full pipeline over one value
    pub fn validate(&self, value: Value) -> RecordResult<Value> {
        let value = match (&self.substitute, value) {
            (Some(default), Value::Null) => default.clone(),
            (_, value) => value,
        };
        self.run(value).map_err(|e| e.with_path(&self.descriptor))
    }

    fn run(&self, value: Value) -> RecordResult<Value> {
        let value = match self.spec.coercion() {
            Some(coercion) => self.coerce(coercion, value)?,
            None => value,
        };

        if self.null_check && value.is_null() {
            return Err(RecordError::not_nullable(" cannot be null"));
        }

        if let Some(check) = self.spec.check() {
            if !value.is_null() && !check(&value)? {
                return Err(RecordError::value(format!(
                    ": {} is not a valid value",
                    value
                )));
            }
        }

        let absent_ok = value.is_null() && self.spec.is_nullable();
        if self.type_check && !absent_ok && !self.spec.value_type().matches(&value) {
            return Err(RecordError::type_mismatch(format!(
                " should be of type {}, not {} ({})",
                self.spec.value_type(),
                value.kind_name(),
                value
            )));
        }

        Ok(value)
    }

    fn coerce(&self, coercion: &Coercion, value: Value) -> RecordResult<Value> {
        if coercion.never_absent() && value.is_null() {
            // Built-in conversions reject absence themselves, so the
            // separate null check is compiled out for them.
            return if self.spec.is_nullable() {
                Ok(Value::Null)
            } else {
                Err(RecordError::not_nullable(" cannot be null"))
            };
        }
        coercion.apply(value)
    }

    /// Projects a validated value to a PODS
    pub fn to_pods(&self, value: &Value) -> RecordResult<Pods> {
        self.codec
            .encode(value)
            .map_err(|e| e.with_path(&self.descriptor))
    }

    /// Loads a value from a PODS. The result still has to go through
    /// [`validate`](Self::validate).
    pub fn from_pods(&self, pods: &Pods) -> RecordResult<Value> {
        self.codec
            .decode(pods)
            .map_err(|e| e.with_path(&self.descriptor))
    }

    /// Text form of a value used as a mapping key
    pub(crate) fn key_to_pods(&self, key: &Value) -> RecordResult<String> {
        self.codec
            .encode_key(key)
            .map_err(|e| e.with_path(&self.descriptor))
    }

    pub(crate) fn key_from_pods(&self, text: &str) -> RecordResult<Value> {
        self.codec
            .decode_key(text)
            .map_err(|e| e.with_path(&self.descriptor))
    }
}
