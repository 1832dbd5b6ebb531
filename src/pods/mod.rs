//! PODS projection
//!
//! A PODS ("plain old data structure") is a tree of JSON-shaped values:
//! null, booleans, numbers, strings, arrays and string-keyed objects. Every
//! record and collection can be projected to one and rebuilt from it.

mod codec;
mod marshaller;

pub use codec::PodsCodec;
pub use marshaller::{
    lookup_marshaller, register_marshaller, temporary_marshaller, unregister_marshaller,
    MarshalError, MarshalFn, Marshaller, MarshallerGuard, UnmarshalFn, DATETIME_FORMAT,
    DATE_FORMAT,
};

pub(crate) use marshaller::lookup_scalar_marshaller;

/// Plain data tree
pub type Pods = serde_json::Value;
