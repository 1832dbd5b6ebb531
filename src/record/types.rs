//! Record schemas and synthesized record types

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::errors::{RecordError, RecordResult};
use crate::field::{FieldSpec, ValidationPlan};
use crate::pods::Pods;
use crate::value::Value;

use super::instance::Record;

/// Ordered, uniquely named fields
///
/// Fields are kept in canonical construction order: non-nullable fields
/// first, then nullable ones, each group sorted by name. Declaration order
/// does not matter.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl RecordSchema {
    /// Builds a schema. Fails on a duplicate field name.
    pub fn new<I, N, S>(fields: I) -> RecordResult<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<FieldSpec>,
    {
        Self::extending(&[], fields)
    }

    /// Builds a schema holding every field of `parents` plus `fields`.
    ///
    /// A parent field may neither be redeclared nor come from two parents.
    pub fn extending<I, N, S>(parents: &[RecordType], fields: I) -> RecordResult<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<FieldSpec>,
    {
        let mut seen = HashSet::new();
        let mut collected = Vec::new();

        for (name, spec) in fields {
            let name = name.into();
            if name.is_empty() {
                return Err(RecordError::invalid_arguments("field names cannot be empty"));
            }
            if !seen.insert(name.clone()) {
                return Err(RecordError::invalid_arguments(format!(
                    "duplicate field name '{}'",
                    name
                )));
            }
            collected.push((name, spec.into()));
        }

        let mut inherited = HashSet::new();
        for parent in parents {
            for (name, spec) in parent.schema().iter() {
                if !inherited.insert(name) {
                    return Err(RecordError::invalid_arguments(format!(
                        "multiple parent types have a field called '{}'",
                        name
                    )));
                }
                if seen.contains(name) {
                    return Err(RecordError::invalid_arguments(format!(
                        "can't override field '{}' of parent type {}",
                        name,
                        parent.name()
                    )));
                }
                collected.push((name.to_string(), spec.clone()));
            }
        }

        collected.sort_by(|(a_name, a), (b_name, b)| {
            (a.is_nullable(), a_name).cmp(&(b.is_nullable(), b_name))
        });

        Ok(Self { fields: collected })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in canonical order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Number of leading fields that must be supplied
    pub fn required_count(&self) -> usize {
        self.fields.iter().take_while(|(_, s)| !s.is_nullable()).count()
    }
}

struct RecordTypeInner {
    name: String,
    parents: Vec<RecordType>,
    schema: RecordSchema,
    plans: Vec<ValidationPlan>,
    index: HashMap<String, usize>,
}

/// A synthesized record type
///
/// Handles are cheap to clone; two handles are equal only if they come
/// from the same definition.
#[derive(Clone)]
pub struct RecordType(Arc<RecordTypeInner>);

impl RecordType {
    /// Compiles one plan per field. Registration is the registry's job.
    pub(crate) fn synthesize(name: &str, schema: RecordSchema) -> Self {
        Self::synthesize_extending(name, schema, Vec::new())
    }

    /// As [`RecordType::synthesize`], for a schema built with
    /// [`RecordSchema::extending`] over `parents`
    pub(crate) fn synthesize_extending(
        name: &str,
        schema: RecordSchema,
        parents: Vec<RecordType>,
    ) -> Self {
        let plans = schema
            .iter()
            .map(|(field, spec)| ValidationPlan::compile(spec, format!("{}.{}", name, field)))
            .collect();
        let index = schema
            .field_names()
            .enumerate()
            .map(|(i, field)| (field.to_string(), i))
            .collect();

        Self(Arc::new(RecordTypeInner {
            name: name.to_string(),
            parents,
            schema,
            plans,
            index,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.0.schema
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.schema.field_names()
    }

    /// Types this one was defined as extending
    pub fn parents(&self) -> &[RecordType] {
        &self.0.parents
    }

    /// Whether this is `other` or extends it, directly or not
    pub fn extends(&self, other: &RecordType) -> bool {
        self == other || self.0.parents.iter().any(|p| p.extends(other))
    }

    pub(crate) fn plans(&self) -> &[ValidationPlan] {
        &self.0.plans
    }

    pub(crate) fn position(&self, field: &str) -> Option<usize> {
        self.0.index.get(field).copied()
    }

    /// Constructs an instance from values in canonical order. Trailing
    /// nullable values may be left out.
    pub fn new_positional<I, V>(&self, values: I) -> RecordResult<Record>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let arity = self.0.plans.len();
        if values.len() > arity {
            return Err(RecordError::invalid_arguments(format!(
                "{} takes at most {} arguments ({} given)",
                self.name(),
                arity,
                values.len()
            )));
        }
        values.resize(arity, Value::Null);
        self.build(values)
    }

    /// Constructs an instance from `(field, value)` pairs. Omitted fields
    /// are absent.
    pub fn new_named<I, N, V>(&self, pairs: I) -> RecordResult<Record>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<Value>,
    {
        let mut slots: Vec<Option<Value>> = vec![None; self.0.plans.len()];
        for (field, value) in pairs {
            let field = field.as_ref();
            let i = self.position(field).ok_or_else(|| self.no_such_field(field))?;
            if slots[i].is_some() {
                return Err(RecordError::invalid_arguments(format!(
                    "{} got multiple values for field '{}'",
                    self.name(),
                    field
                )));
            }
            slots[i] = Some(value.into());
        }
        self.build(slots.into_iter().map(|v| v.unwrap_or(Value::Null)).collect())
    }

    /// Loads an instance from a PODS mapping. Missing keys and explicit
    /// nulls are both absence; unknown keys are ignored.
    pub fn from_pods(&self, pods: &Pods) -> RecordResult<Record> {
        let object = pods.as_object().ok_or_else(|| {
            RecordError::type_mismatch(format!(
                "{} must be loaded from a mapping, not {}",
                self.name(),
                pods
            ))
        })?;

        let values = self
            .field_names()
            .zip(self.plans())
            .map(|(field, plan)| match object.get(field) {
                Some(item) => plan.from_pods(item),
                None => Ok(Value::Null),
            })
            .collect::<RecordResult<Vec<_>>>()?;

        self.build(values)
    }

    /// Runs every field plan; all-or-nothing.
    pub(crate) fn build(&self, values: Vec<Value>) -> RecordResult<Record> {
        let validated = values
            .into_iter()
            .zip(self.plans())
            .map(|(value, plan)| plan.validate(value))
            .collect::<RecordResult<Vec<_>>>()?;
        Ok(Record::from_validated(self.clone(), validated))
    }

    pub(crate) fn no_such_field(&self, field: &str) -> RecordError {
        RecordError::invalid_arguments(format!("{} has no field '{}'", self.name(), field))
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RecordType {}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.0.name)
            .field(
                "parents",
                &self.0.parents.iter().map(RecordType::name).collect::<Vec<_>>(),
            )
            .field("fields", &self.0.schema.field_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::value::ValueType;
    use serde_json::json;

    fn point() -> RecordType {
        let schema = RecordSchema::new([
            ("y", FieldSpec::new(ValueType::Int)),
            ("label", FieldSpec::new(ValueType::Str).nullable()),
            ("x", FieldSpec::new(ValueType::Int)),
        ])
        .unwrap();
        RecordType::synthesize("Point", schema)
    }

    #[test]
    fn test_canonical_order() {
        let rt = point();
        assert_eq!(rt.field_names().collect::<Vec<_>>(), ["x", "y", "label"]);
        assert_eq!(rt.schema().required_count(), 2);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = RecordSchema::new([("a", ValueType::Int), ("a", ValueType::Str)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    }

    #[test]
    fn test_positional_with_trailing_nullable_omitted() {
        let p = point().new_positional([1i64, 2]).unwrap();
        assert_eq!(p.get("x"), Some(&Value::Int(1)));
        assert_eq!(p.get("label"), Some(&Value::Null));
    }

    #[test]
    fn test_too_many_positional() {
        let err = point()
            .new_positional(vec![Value::Int(1), Value::Int(2), Value::Null, Value::Int(4)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    }

    #[test]
    fn test_named_construction() {
        let rt = point();
        let p = rt.new_named([("y", 2i64), ("x", 1i64)]).unwrap();
        assert_eq!(p, rt.new_positional([1i64, 2]).unwrap());

        assert_eq!(
            rt.new_named([("z", 1i64)]).unwrap_err().kind(),
            ErrorKind::InvalidArguments
        );
        assert_eq!(
            rt.new_named([("x", 1i64), ("x", 2i64)]).unwrap_err().kind(),
            ErrorKind::InvalidArguments
        );
    }

    #[test]
    fn test_missing_required_field() {
        let err = point().new_named([("x", 1i64)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldNotNullable);
        assert_eq!(err.message(), "Point.y cannot be null");
    }

    #[test]
    fn test_from_pods_requires_mapping() {
        let err = point().from_pods(&json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldTypeError);
    }

    #[test]
    fn test_from_pods_ignores_unknown_keys() {
        let rt = point();
        let p = rt.from_pods(&json!({"x": 1, "y": 2, "z": 3})).unwrap();
        assert_eq!(p, rt.new_positional([1i64, 2]).unwrap());
    }

    #[test]
    fn test_extending_merges_parent_fields() {
        let parent = point();
        let schema = RecordSchema::extending(
            std::slice::from_ref(&parent),
            [("z", FieldSpec::new(ValueType::Int)), ("w", FieldSpec::new(ValueType::Int).nullable())],
        )
        .unwrap();
        assert_eq!(schema.field_names().collect::<Vec<_>>(), ["x", "y", "z", "label", "w"]);

        let child = RecordType::synthesize_extending("Point3", schema, vec![parent.clone()]);
        assert!(child.extends(&parent));
        assert!(child.extends(&child));
        assert!(!parent.extends(&child));
        assert_eq!(child.parents(), [parent]);
    }

    #[test]
    fn test_extending_cannot_override() {
        let err = RecordSchema::extending(&[point()], [("x", ValueType::Float)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        assert_eq!(err.message(), "can't override field 'x' of parent type Point");
    }

    #[test]
    fn test_extending_two_parents_sharing_a_field() {
        let other = RecordType::synthesize(
            "Labelled",
            RecordSchema::new([("label", ValueType::Str)]).unwrap(),
        );
        let err =
            RecordSchema::extending(&[point(), other], [("z", ValueType::Int)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        assert_eq!(err.message(), "multiple parent types have a field called 'label'");
    }

    #[test]
    fn test_type_identity() {
        let a = point();
        let b = point();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
