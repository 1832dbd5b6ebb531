//! Field specifications and their compiled validation plans

mod plan;
pub mod shortcuts;
mod types;

pub use plan::ValidationPlan;
pub use types::{CheckFn, CoerceFn, Coercion, FieldOverrides, FieldSpec};
