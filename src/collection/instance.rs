//! Collection instances

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::sync::Arc;

use serde_json::Map;

use crate::errors::RecordResult;
use crate::pods::Pods;
use crate::value::hash::{combine_ordered, combine_unordered, StableHasher};
use crate::value::Value;

use super::types::{CollectionKind, CollectionType};

/// Hash state for sets and mappings, independent of the process
pub(crate) type StableState = BuildHasherDefault<StableHasher>;

pub(crate) enum Items {
    Ordered(Vec<Value>),
    Set(HashSet<Value, StableState>),
    Mapping(HashMap<Value, Value, StableState>),
}

struct CollectionInner {
    collection_type: CollectionType,
    items: Items,
}

/// An immutable, validated sequence, pair, set or mapping
#[derive(Clone)]
pub struct Collection(Arc<CollectionInner>);

impl Collection {
    pub(crate) fn from_validated(collection_type: CollectionType, items: Items) -> Self {
        Self(Arc::new(CollectionInner {
            collection_type,
            items,
        }))
    }

    pub fn collection_type(&self) -> &CollectionType {
        &self.0.collection_type
    }

    pub fn kind(&self) -> CollectionKind {
        self.0.collection_type.kind()
    }

    pub fn len(&self) -> usize {
        match &self.0.items {
            Items::Ordered(items) => items.len(),
            Items::Set(items) => items.len(),
            Items::Mapping(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements, or the keys of a mapping
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match &self.0.items {
            Items::Ordered(items) => Box::new(items.iter()),
            Items::Set(items) => Box::new(items.iter()),
            Items::Mapping(map) => Box::new(map.keys()),
        }
    }

    /// Element at `index` of a sequence or pair
    pub fn get(&self, index: usize) -> Option<&Value> {
        match &self.0.items {
            Items::Ordered(items) => items.get(index),
            _ => None,
        }
    }

    /// Membership; keys for a mapping
    pub fn contains(&self, value: &Value) -> bool {
        match &self.0.items {
            Items::Ordered(items) => items.contains(value),
            Items::Set(items) => items.contains(value),
            Items::Mapping(map) => map.contains_key(value),
        }
    }

    /// Value stored under `key` in a mapping
    pub fn lookup(&self, key: &Value) -> Option<&Value> {
        match &self.0.items {
            Items::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Key/value entries of a mapping; empty for other kinds
    pub fn entries(&self) -> Box<dyn Iterator<Item = (&Value, &Value)> + '_> {
        match &self.0.items {
            Items::Mapping(map) => Box::new(map.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Sequences, pairs and sets project to lists, mappings to string-keyed
    /// objects.
    pub fn to_pods(&self) -> RecordResult<Pods> {
        let collection_type = &self.0.collection_type;
        let element = collection_type.element_plan();
        match (&self.0.items, collection_type.value_plan()) {
            (Items::Mapping(map), Some(value_plan)) => {
                let mut object = Map::new();
                for (key, value) in map {
                    // keys with an absent value stay, as null
                    object.insert(element.key_to_pods(key)?, value_plan.to_pods(value)?);
                }
                Ok(Pods::Object(object))
            }
            _ => self
                .iter()
                .map(|item| element.to_pods(item))
                .collect::<RecordResult<Vec<_>>>()
                .map(Pods::Array),
        }
    }

    /// Type name and the single constructor argument: a list of elements,
    /// or a map of entries
    pub fn reduce(&self) -> (String, Vec<Value>) {
        let argument = match &self.0.items {
            Items::Mapping(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            _ => Value::List(self.iter().cloned().collect()),
        };
        (self.0.collection_type.name().to_string(), vec![argument])
    }

    /// Stable hash; order-dependent only for sequences and pairs
    pub fn hash_code(&self) -> u64 {
        match &self.0.items {
            Items::Ordered(items) => combine_ordered(items.iter().map(Value::hash_code)),
            Items::Set(items) => combine_unordered(items.iter().map(Value::hash_code)),
            Items::Mapping(map) => combine_unordered(
                map.iter()
                    .map(|(k, v)| k.hash_code().wrapping_mul(31) ^ v.hash_code()),
            ),
        }
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        if self.0.collection_type != other.0.collection_type {
            return false;
        }
        match (&self.0.items, &other.0.items) {
            (Items::Ordered(a), Items::Ordered(b)) => a == b,
            (Items::Set(a), Items::Set(b)) => a == b,
            (Items::Mapping(a), Items::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Collection {}

impl Hash for Collection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.0.collection_type.name())?;
        match &self.0.items {
            Items::Ordered(items) => {
                let reprs: Vec<String> = items.iter().map(Value::to_string).collect();
                write!(f, "[{}]", reprs.join(", "))?;
            }
            Items::Set(items) => {
                let mut reprs: Vec<String> = items.iter().map(Value::to_string).collect();
                reprs.sort();
                write!(f, "{{{}}}", reprs.join(", "))?;
            }
            Items::Mapping(map) => {
                let mut reprs: Vec<String> =
                    map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                reprs.sort();
                write!(f, "{{{}}}", reprs.join(", "))?;
            }
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
