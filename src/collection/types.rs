//! Collection specs and synthesized collection types

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::errors::{RecordError, RecordResult};
use crate::field::{Coercion, FieldSpec, ValidationPlan};
use crate::pods::Pods;
use crate::value::{Value, ValueType};

use super::instance::{Collection, Items, StableState};

/// Shape of a collection type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Ordered, duplicates allowed
    Sequence,
    /// Ordered, exactly two elements
    Pair,
    /// Unordered, deduplicated
    Set,
    /// Unordered, unique keys
    Mapping,
}

impl CollectionKind {
    fn suffix(&self) -> &'static str {
        match self {
            CollectionKind::Sequence => "Seq",
            CollectionKind::Pair => "Pair",
            CollectionKind::Set => "Set",
            CollectionKind::Mapping => "Dict",
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, CollectionKind::Sequence | CollectionKind::Pair)
    }
}

/// Element specs of a collection type
#[derive(Debug, Clone)]
pub enum CollectionSpec {
    Sequence(FieldSpec),
    Pair(FieldSpec),
    Set(FieldSpec),
    Mapping(FieldSpec, FieldSpec),
}

impl CollectionSpec {
    pub fn sequence(element: impl Into<FieldSpec>) -> Self {
        CollectionSpec::Sequence(element.into())
    }

    pub fn pair(element: impl Into<FieldSpec>) -> Self {
        CollectionSpec::Pair(element.into())
    }

    pub fn set(element: impl Into<FieldSpec>) -> Self {
        CollectionSpec::Set(element.into())
    }

    pub fn mapping(key: impl Into<FieldSpec>, value: impl Into<FieldSpec>) -> Self {
        CollectionSpec::Mapping(key.into(), value.into())
    }

    pub fn kind(&self) -> CollectionKind {
        match self {
            CollectionSpec::Sequence(_) => CollectionKind::Sequence,
            CollectionSpec::Pair(_) => CollectionKind::Pair,
            CollectionSpec::Set(_) => CollectionKind::Set,
            CollectionSpec::Mapping(..) => CollectionKind::Mapping,
        }
    }

    /// Name derived from the element types: `IntSeq`, `StrToIntDict`
    pub fn auto_name(&self) -> String {
        let suffix = self.kind().suffix();
        match self {
            CollectionSpec::Sequence(e) | CollectionSpec::Pair(e) | CollectionSpec::Set(e) => {
                format!("{}{}", capitalize(e.value_type().type_name()), suffix)
            }
            CollectionSpec::Mapping(k, v) => format!(
                "{}To{}{}",
                capitalize(k.value_type().type_name()),
                capitalize(v.value_type().type_name()),
                suffix
            ),
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

struct CollectionTypeInner {
    name: String,
    spec: CollectionSpec,
    element: ValidationPlan,
    value: Option<ValidationPlan>,
}

/// A synthesized collection type
#[derive(Clone)]
pub struct CollectionType(Arc<CollectionTypeInner>);

impl CollectionType {
    pub(crate) fn synthesize(name: &str, spec: CollectionSpec) -> Self {
        let (element, value) = match &spec {
            CollectionSpec::Sequence(e) | CollectionSpec::Pair(e) | CollectionSpec::Set(e) => {
                (ValidationPlan::compile(e, "[elem]"), None)
            }
            CollectionSpec::Mapping(k, v) => (
                ValidationPlan::compile(k, "<key>"),
                Some(ValidationPlan::compile(v, "<val>")),
            ),
        };

        Self(Arc::new(CollectionTypeInner {
            name: name.to_string(),
            spec,
            element,
            value,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> CollectionKind {
        self.0.spec.kind()
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.0.spec
    }

    /// Plan for elements, or for keys of a mapping
    pub(crate) fn element_plan(&self) -> &ValidationPlan {
        &self.0.element
    }

    /// Plan for mapping values
    pub(crate) fn value_plan(&self) -> Option<&ValidationPlan> {
        self.0.value.as_ref()
    }

    /// Field spec embedding this collection in a record. Raw lists and maps
    /// assigned to the field are converted.
    pub fn field(&self) -> FieldSpec {
        FieldSpec::new(ValueType::Collection(self.clone()))
            .with_coerce(Coercion::Collection(self.clone()))
    }

    /// Builds a sequence, pair or set from elements
    pub fn build<I, V>(&self, elements: I) -> RecordResult<Collection>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let plan = self.element_plan();
        let items = match self.kind() {
            CollectionKind::Sequence => Items::Ordered(
                elements
                    .into_iter()
                    .map(|e| plan.validate(e.into()))
                    .collect::<RecordResult<Vec<_>>>()?,
            ),
            CollectionKind::Pair => Items::Ordered(self.build_pair(elements)?),
            CollectionKind::Set => Items::Set(
                elements
                    .into_iter()
                    .map(|e| plan.validate(e.into()))
                    .collect::<RecordResult<HashSet<Value, StableState>>>()?,
            ),
            CollectionKind::Mapping => {
                return Err(RecordError::invalid_arguments(format!(
                    "{} is a mapping and is built from entries",
                    self.name()
                )))
            }
        };
        Ok(Collection::from_validated(self.clone(), items))
    }

    /// Stops at the third element without draining the rest of the input.
    fn build_pair<I, V>(&self, elements: I) -> RecordResult<Vec<Value>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let plan = self.element_plan();
        let mut pair = Vec::with_capacity(2);
        for element in elements {
            if pair.len() == 2 {
                return Err(RecordError::value("a pair cannot have more than two elements"));
            }
            pair.push(plan.validate(element.into())?);
        }
        if pair.len() != 2 {
            return Err(RecordError::value(format!(
                "a pair must have two elements, not {}",
                pair.len()
            )));
        }
        Ok(pair)
    }

    /// Builds a mapping from key/value entries. Later duplicates of a key
    /// replace earlier ones.
    pub fn build_entries<I, K, V>(&self, entries: I) -> RecordResult<Collection>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let value_plan = self.value_plan().ok_or_else(|| {
            RecordError::invalid_arguments(format!(
                "{} is not a mapping and is built from elements",
                self.name()
            ))
        })?;
        let key_plan = self.element_plan();

        let mut map: HashMap<Value, Value, StableState> = HashMap::default();
        for (key, value) in entries {
            let key = key_plan.validate(key.into())?;
            let value = value_plan.validate(value.into())?;
            map.insert(key, value);
        }
        Ok(Collection::from_validated(self.clone(), Items::Mapping(map)))
    }

    /// Builds from untyped input: a list, a map, or another collection.
    /// An instance of this very type is returned as is.
    pub fn from_value(&self, value: Value) -> RecordResult<Collection> {
        let is_mapping = self.kind() == CollectionKind::Mapping;
        match value {
            Value::Collection(c) if c.collection_type() == self => Ok(c),
            Value::Collection(c) if is_mapping => match c.kind() {
                CollectionKind::Mapping => {
                    self.build_entries(c.entries().map(|(k, v)| (k.clone(), v.clone())))
                }
                _ => self.build_entries(c.iter().map(entry_of).collect::<RecordResult<Vec<_>>>()?),
            },
            Value::Collection(c) => self.build(c.iter().cloned()),
            Value::Map(entries) if is_mapping => self.build_entries(entries),
            Value::Map(entries) => self.build(entries.into_iter().map(|(k, _)| k)),
            Value::List(items) if is_mapping => {
                self.build_entries(items.iter().map(entry_of).collect::<RecordResult<Vec<_>>>()?)
            }
            Value::List(items) => self.build(items),
            other => Err(RecordError::type_mismatch(format!(
                "cannot build {} from {} ({})",
                self.name(),
                other.kind_name(),
                other
            ))),
        }
    }

    /// Coercion behind [`field`](Self::field). Absence passes through.
    pub fn coerce(&self, value: Value) -> RecordResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.from_value(value).map(Value::Collection)
    }

    /// Loads an instance from a PODS list (or mapping, for mappings)
    pub fn from_pods(&self, pods: &Pods) -> RecordResult<Collection> {
        match (self.value_plan(), pods) {
            (None, Pods::Array(items)) => {
                let plan = self.element_plan();
                let elements = items
                    .iter()
                    .map(|item| plan.from_pods(item))
                    .collect::<RecordResult<Vec<_>>>()?;
                self.build(elements)
            }
            (Some(value_plan), Pods::Object(object)) => {
                let key_plan = self.element_plan();
                let entries = object
                    .iter()
                    .map(|(k, v)| -> RecordResult<(Value, Value)> {
                        Ok((key_plan.key_from_pods(k)?, value_plan.from_pods(v)?))
                    })
                    .collect::<RecordResult<Vec<_>>>()?;
                self.build_entries(entries)
            }
            (None, other) => Err(RecordError::type_mismatch(format!(
                "{} must be loaded from a list, not {}",
                self.name(),
                other
            ))),
            (Some(_), other) => Err(RecordError::type_mismatch(format!(
                "{} must be loaded from a mapping, not {}",
                self.name(),
                other
            ))),
        }
    }
}

/// Reads one mapping entry from a two-element list or collection
fn entry_of(item: &Value) -> RecordResult<(Value, Value)> {
    let parts: Vec<Value> = match item {
        Value::List(parts) => parts.clone(),
        Value::Collection(c) if c.kind().is_ordered() => c.iter().cloned().collect(),
        _ => Vec::new(),
    };
    match <[Value; 2]>::try_from(parts) {
        Ok([key, value]) => Ok((key, value)),
        Err(_) => Err(RecordError::value(format!(
            ": mapping entries must be key/value pairs, not {}",
            item
        ))),
    }
}

impl PartialEq for CollectionType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for CollectionType {}

impl fmt::Debug for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionType")
            .field("name", &self.0.name)
            .field("spec", &self.0.spec)
            .finish()
    }
}
