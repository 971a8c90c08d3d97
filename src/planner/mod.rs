//! Widget plan construction (verb module)
//!
//! Builds the logical plan for each widget kind from its options, its
//! resolved source and the combined restriction.

mod build;
mod error;

pub use build::{plan_category, plan_formula, plan_histogram_base, plan_list};
pub use error::PlanError;
