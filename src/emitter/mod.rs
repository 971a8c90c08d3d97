//! SQL emitter (verb module)
//!
//! Transforms a `PlanNode` tree into the SQL text handed to the external
//! query engine.

mod error;
mod sql;

pub use error::EmitError;
pub use sql::emit_sql;
