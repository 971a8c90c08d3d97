//! Planner errors

use std::fmt;

use crate::mapconfig::Aggregation;

/// Errors raised while building a widget's plan.
///
/// These indicate widget options that should have been rejected at
/// configuration parse time; reaching them here is a configuration fault.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// A non-count aggregation has no column to aggregate over
    MissingAggregationColumn(Aggregation),
    /// A list widget projects no columns
    EmptyProjection,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::MissingAggregationColumn(agg) => {
                write!(f, "Aggregation '{}' requires an aggregation column", agg.as_str())
            }
            PlanError::EmptyProjection => {
                write!(f, "List projection requires at least one column")
            }
        }
    }
}

impl std::error::Error for PlanError {}
