//! Collection type synthesis
//!
//! Collection types wrap a validated, immutable container around one
//! element spec (sequence, pair, set) or a key spec and a value spec
//! (mapping). Elements are validated with the same plans as record fields,
//! under the path descriptors `[elem]`, `<key>` and `<val>`.
//!
//! The `*_of` helpers define an auto-named type in the process-wide
//! registry and return the field spec that embeds it in a record.

mod instance;
mod types;

pub use instance::Collection;
pub use types::{CollectionKind, CollectionSpec, CollectionType};

use crate::field::FieldSpec;
use crate::registry::TypeRegistry;

/// Field holding a sequence of `element`
pub fn seq_of(element: impl Into<FieldSpec>) -> FieldSpec {
    TypeRegistry::global()
        .define_collection(CollectionSpec::sequence(element))
        .field()
}

/// Field holding a pair of `element`
pub fn pair_of(element: impl Into<FieldSpec>) -> FieldSpec {
    TypeRegistry::global()
        .define_collection(CollectionSpec::pair(element))
        .field()
}

/// Field holding a set of `element`
pub fn set_of(element: impl Into<FieldSpec>) -> FieldSpec {
    TypeRegistry::global()
        .define_collection(CollectionSpec::set(element))
        .field()
}

/// Field holding a mapping from `key` to `value`
pub fn dict_of(key: impl Into<FieldSpec>, value: impl Into<FieldSpec>) -> FieldSpec {
    TypeRegistry::global()
        .define_collection(CollectionSpec::mapping(key, value))
        .field()
}
