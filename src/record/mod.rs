//! Record type synthesis
//!
//! A record type is defined once from a set of named field specs. Each
//! field is compiled into a [`ValidationPlan`](crate::field::ValidationPlan)
//! at definition time; every instance of the type shares those plans.

mod instance;
mod types;

pub use instance::Record;
pub use types::{RecordSchema, RecordType};
