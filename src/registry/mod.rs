//! # Type Registry
//!
//! Name-keyed table of every synthesized record and collection type. The
//! registry is what lets an opaque persisted graph be rebuilt: an instance
//! is stored as its type name plus constructor arguments, and
//! [`TypeRegistry::reconstruct`] turns that back into a validated value.
//!
//! Definition holds the write lock for the whole check-and-insert, so two
//! threads can never both claim a name.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::collection::{CollectionSpec, CollectionType};
use crate::config::{RedefinitionPolicy, RegistryConfig};
use crate::errors::{RecordError, RecordResult};
use crate::field::FieldSpec;
use crate::record::{RecordSchema, RecordType};
use crate::value::Value;

/// A registered type
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesizedType {
    Record(RecordType),
    Collection(CollectionType),
}

impl SynthesizedType {
    pub fn name(&self) -> &str {
        match self {
            SynthesizedType::Record(rt) => rt.name(),
            SynthesizedType::Collection(ct) => ct.name(),
        }
    }

    /// Rebuilds an instance from reduced constructor arguments
    pub fn reconstruct(&self, values: Vec<Value>) -> RecordResult<Value> {
        match self {
            SynthesizedType::Record(rt) => rt.new_positional(values).map(Value::Record),
            SynthesizedType::Collection(ct) => {
                let [argument] = <[Value; 1]>::try_from(values).map_err(|values| {
                    RecordError::invalid_arguments(format!(
                        "{} takes exactly one argument ({} given)",
                        ct.name(),
                        values.len()
                    ))
                })?;
                ct.from_value(argument).map(Value::Collection)
            }
        }
    }
}

/// Registry of synthesized types
#[derive(Debug, Default)]
pub struct TypeRegistry {
    config: RegistryConfig,

    /// Types by name
    types: RwLock<HashMap<String, SynthesizedType>>,
}

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

impl TypeRegistry {
    /// Create a registry with the given configuration
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            types: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static TypeRegistry {
        GLOBAL.get_or_init(TypeRegistry::default)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Define and register a record type
    pub fn define_record<I, N, S>(&self, name: &str, fields: I) -> RecordResult<RecordType>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<FieldSpec>,
    {
        self.define_record_extending(name, &[], fields)
    }

    /// Define and register a record type carrying every field of `parents`
    /// as well as its own. Instances conform to each parent type.
    pub fn define_record_extending<I, N, S>(
        &self,
        name: &str,
        parents: &[RecordType],
        fields: I,
    ) -> RecordResult<RecordType>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<FieldSpec>,
    {
        let schema = RecordSchema::extending(parents, fields)?;
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        self.claim(&types, name)?;

        let record_type = RecordType::synthesize_extending(name, schema, parents.to_vec());
        types.insert(name.to_string(), SynthesizedType::Record(record_type.clone()));
        tracing::debug!(
            type_name = %name,
            fields = record_type.schema().len(),
            parents = parents.len(),
            "defined record type"
        );
        Ok(record_type)
    }

    /// Define a collection type under its automatic name. A taken name gets
    /// a numeric suffix (`IntSeq2`), so this never fails.
    pub fn define_collection(&self, spec: CollectionSpec) -> CollectionType {
        let base = spec.auto_name();
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());

        let mut name = base.clone();
        let mut n = 1;
        while types.contains_key(&name) {
            n += 1;
            name = format!("{}{}", base, n);
        }

        let collection_type = CollectionType::synthesize(&name, spec);
        types.insert(name.clone(), SynthesizedType::Collection(collection_type.clone()));
        tracing::debug!(type_name = %name, kind = ?collection_type.kind(), "defined collection type");
        collection_type
    }

    /// Define a collection type under an explicit name
    pub fn define_named_collection(
        &self,
        name: &str,
        spec: CollectionSpec,
    ) -> RecordResult<CollectionType> {
        let mut types = self.types.write().unwrap_or_else(|e| e.into_inner());
        self.claim(&types, name)?;

        let collection_type = CollectionType::synthesize(name, spec);
        types.insert(name.to_string(), SynthesizedType::Collection(collection_type.clone()));
        tracing::debug!(type_name = %name, kind = ?collection_type.kind(), "defined collection type");
        Ok(collection_type)
    }

    /// Checks that `name` may be (re)defined under the configured policy
    fn claim(&self, types: &HashMap<String, SynthesizedType>, name: &str) -> RecordResult<()> {
        if name.is_empty() {
            return Err(RecordError::invalid_arguments("type names cannot be empty"));
        }
        if !types.contains_key(name) {
            return Ok(());
        }
        match self.config.redefinition {
            RedefinitionPolicy::Reject => Err(RecordError::redefined(name)),
            RedefinitionPolicy::Replace => {
                tracing::warn!(type_name = %name, "replacing previously defined type");
                Ok(())
            }
        }
    }

    /// Get a type by name
    pub fn lookup(&self, name: &str) -> Option<SynthesizedType> {
        self.types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds an instance of the named type from its reduced constructor
    /// arguments
    pub fn reconstruct(&self, name: &str, values: Vec<Value>) -> RecordResult<Value> {
        self.lookup(name)
            .ok_or_else(|| RecordError::unknown_type(name))?
            .reconstruct(values)
    }
}

/// Define a record type in the process-wide registry
pub fn define_record<I, N, S>(name: &str, fields: I) -> RecordResult<RecordType>
where
    I: IntoIterator<Item = (N, S)>,
    N: Into<String>,
    S: Into<FieldSpec>,
{
    TypeRegistry::global().define_record(name, fields)
}

/// Define a record type extending `parents` in the process-wide registry
pub fn define_record_extending<I, N, S>(
    name: &str,
    parents: &[RecordType],
    fields: I,
) -> RecordResult<RecordType>
where
    I: IntoIterator<Item = (N, S)>,
    N: Into<String>,
    S: Into<FieldSpec>,
{
    TypeRegistry::global().define_record_extending(name, parents, fields)
}

/// Define an auto-named collection type in the process-wide registry
pub fn define_collection(spec: CollectionSpec) -> CollectionType {
    TypeRegistry::global().define_collection(spec)
}

/// Define a named collection type in the process-wide registry
pub fn define_named_collection(name: &str, spec: CollectionSpec) -> RecordResult<CollectionType> {
    TypeRegistry::global().define_named_collection(name, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::value::ValueType;

    // ==================
    // Definition
    // ==================

    #[test]
    fn test_redefinition_rejected_by_default() {
        let registry = TypeRegistry::default();
        registry.define_record("Point", [("x", ValueType::Int)]).unwrap();
        let err = registry
            .define_record("Point", [("y", ValueType::Int)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeRedefined);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_permissive_registry_replaces() {
        let registry = TypeRegistry::new(RegistryConfig::permissive());
        let first = registry.define_record("Point", [("x", ValueType::Int)]).unwrap();
        let second = registry.define_record("Point", [("y", ValueType::Int)]).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            registry.lookup("Point"),
            Some(SynthesizedType::Record(second))
        );
    }

    #[test]
    fn test_bad_schema_does_not_claim_name() {
        let registry = TypeRegistry::default();
        assert!(registry
            .define_record("Dup", [("a", ValueType::Int), ("a", ValueType::Int)])
            .is_err());
        assert!(!registry.contains("Dup"));
    }

    #[test]
    fn test_auto_named_collections_get_suffixes() {
        let registry = TypeRegistry::default();
        let a = registry.define_collection(CollectionSpec::sequence(ValueType::Int));
        let b = registry.define_collection(CollectionSpec::sequence(ValueType::Int));
        assert_eq!(a.name(), "IntSeq");
        assert_eq!(b.name(), "IntSeq2");
        assert_eq!(registry.names(), ["IntSeq", "IntSeq2"]);
    }

    #[test]
    fn test_named_collection_is_strict() {
        let registry = TypeRegistry::default();
        registry.define_collection(CollectionSpec::set(ValueType::Str));
        let err = registry
            .define_named_collection("StrSet", CollectionSpec::set(ValueType::Str))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeRedefined);
    }

    #[test]
    fn test_concurrent_definitions_claim_once() {
        let registry = TypeRegistry::default();
        let shared = &registry;
        let results: Vec<RecordResult<RecordType>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || shared.define_record("Contended", [("n", ValueType::Int)]))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .collect()
        });

        let winners: Vec<&RecordType> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.kind(), ErrorKind::TypeRedefined);
        }
        assert_eq!(
            registry.lookup("Contended"),
            Some(SynthesizedType::Record(winners[0].clone()))
        );
    }

    #[test]
    fn test_extending_definition() {
        let registry = TypeRegistry::default();
        let named = registry.define_record("Named", [("name", ValueType::Str)]).unwrap();
        let aged = registry.define_record("Aged", [("age", ValueType::Int)]).unwrap();
        let person = registry
            .define_record_extending("Person", &[named.clone(), aged], [("email", ValueType::Str)])
            .unwrap();
        assert_eq!(
            person.field_names().collect::<Vec<_>>(),
            ["age", "email", "name"]
        );
        assert!(person.extends(&named));

        let err = registry
            .define_record_extending("Renamed", &[named], [("name", ValueType::Str)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
        assert!(!registry.contains("Renamed"));
    }

    // ==================
    // Reconstruction
    // ==================

    #[test]
    fn test_reconstruct_record() {
        let registry = TypeRegistry::default();
        let rt = registry
            .define_record("Pt", [("x", ValueType::Int), ("y", ValueType::Int)])
            .unwrap();
        let original = rt.new_positional([1i64, 2]).unwrap();
        let (name, values) = original.reduce();
        assert_eq!(
            registry.reconstruct(&name, values).unwrap(),
            Value::Record(original)
        );
    }

    #[test]
    fn test_reconstruct_collection_takes_one_argument() {
        let registry = TypeRegistry::default();
        let ct = registry.define_collection(CollectionSpec::pair(ValueType::Int));
        let pair = ct.build([1i64, 2]).unwrap();
        let (name, args) = pair.reduce();
        assert_eq!(
            registry.reconstruct(&name, args).unwrap(),
            Value::Collection(pair)
        );
        assert_eq!(
            registry.reconstruct(&name, vec![]).unwrap_err().kind(),
            ErrorKind::InvalidArguments
        );
    }

    #[test]
    fn test_reconstruct_unknown() {
        let registry = TypeRegistry::default();
        let err = registry.reconstruct("Nope", vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
    }

    #[test]
    fn test_reconstruct_revalidates() {
        let registry = TypeRegistry::default();
        registry.define_record("Age", [("years", ValueType::Int)]).unwrap();
        let err = registry
            .reconstruct("Age", vec![Value::from("old")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldTypeError);
    }
}
