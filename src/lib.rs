//! strictrecord - Immutable, schema-validated records and collections
//!
//! Types are synthesized at runtime from declarative field specs. Each field
//! is compiled once into a validation plan that every instance shares:
//! default substitution, coercion, null check, value check and type check,
//! always in that order. Instances can be projected to a PODS (plain nested
//! data, see [`pods`]) and back, and persisted as an opaque graph that is
//! rebuilt through the type registry.
//!
//! ```ignore
//! use strictrecord::{define_record, FieldSpec, ValueType};
//!
//! let point = define_record("Point", [
//!     ("x", FieldSpec::new(ValueType::Int)),
//!     ("y", FieldSpec::new(ValueType::Int)),
//!     ("label", FieldSpec::new(ValueType::Str).nullable()),
//! ])?;
//! let p = point.new_positional([1i64, 2])?;
//! assert_eq!(p.to_pods()?, serde_json::json!({"x": 1, "y": 2}));
//! ```

pub mod collection;
pub mod config;
pub mod errors;
pub mod field;
pub mod persist;
pub mod pods;
pub mod record;
pub mod registry;
pub mod value;

pub use collection::{dict_of, pair_of, seq_of, set_of, Collection, CollectionKind, CollectionSpec, CollectionType};
pub use config::{RedefinitionPolicy, RegistryConfig};
pub use errors::{ErrorKind, RecordError, RecordResult};
pub use field::{Coercion, FieldOverrides, FieldSpec, ValidationPlan};
pub use pods::{Marshaller, Pods};
pub use record::{Record, RecordSchema, RecordType};
pub use registry::{
    define_collection, define_named_collection, define_record, define_record_extending,
    SynthesizedType, TypeRegistry,
};
pub use value::{Value, ValueType};
