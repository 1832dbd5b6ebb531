//! Caller-defined extension scalars
//!
//! Any `Debug + PartialEq + Hash + Send + Sync` type can be carried in a
//! [`Value`](super::Value) as a scalar. Such values have no native PODS
//! shape; they serialize only through a registered marshaller.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use super::hash::StableHasher;
use std::hash::Hasher;

/// Object-safe view of an extension scalar
pub trait ScalarValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn ScalarValue) -> bool;
    fn stable_hash(&self) -> u64;
    fn type_name(&self) -> &'static str;
}

impl<T> ScalarValue for T
where
    T: Any + fmt::Debug + PartialEq + Hash + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn ScalarValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn stable_hash(&self) -> u64 {
        let mut hasher = StableHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Shared handle on an extension scalar value
#[derive(Clone)]
pub struct Scalar(Arc<dyn ScalarValue>);

impl Scalar {
    pub fn new<T: ScalarValue>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrows the payload as `T`, if that is its type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn stable_hash(&self) -> u64 {
        self.0.stable_hash()
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Identity of an extension scalar type, used as a conformance type
#[derive(Debug, Clone, Copy)]
pub struct ScalarType {
    name: &'static str,
    type_id: TypeId,
}

impl ScalarType {
    pub fn of<T: ScalarValue>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Full Rust type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl PartialEq for ScalarType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ScalarType {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Hash)]
    struct Celsius(i32);

    #[derive(Debug, PartialEq, Hash)]
    struct Kelvin(i32);

    #[test]
    fn test_scalar_equality_is_typed() {
        assert_eq!(Scalar::new(Celsius(3)), Scalar::new(Celsius(3)));
        assert_ne!(Scalar::new(Celsius(3)), Scalar::new(Celsius(4)));
        assert_ne!(Scalar::new(Celsius(3)), Scalar::new(Kelvin(3)));
    }

    #[test]
    fn test_scalar_type_identity() {
        let c = ScalarType::of::<Celsius>();
        assert_eq!(c, ScalarType::of::<Celsius>());
        assert_ne!(c, ScalarType::of::<Kelvin>());
        assert_eq!(c.short_name(), "Celsius");
        assert_eq!(Scalar::new(Celsius(1)).type_id(), c.type_id());
    }

    #[test]
    fn test_downcast() {
        let s = Scalar::new(Celsius(21));
        assert_eq!(s.downcast_ref::<Celsius>(), Some(&Celsius(21)));
        assert!(s.downcast_ref::<Kelvin>().is_none());
    }
}
