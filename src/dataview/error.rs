//! Widget computation errors

use std::fmt;

use crate::emitter::EmitError;
use crate::engine::EngineError;
use crate::planner::PlanError;

/// Errors raised while computing a widget result
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// Widget options could not produce a plan (a configuration fault)
    Plan(PlanError),
    /// The plan could not be rendered to SQL
    Emit(EmitError),
    /// The query engine failed; surfaced as-is, never retried here
    Engine(EngineError),
    /// The engine returned rows that do not match the expected shape
    Rows { dataview: String, detail: String },
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeError::Plan(e) => write!(f, "{}", e),
            ComputeError::Emit(e) => write!(f, "{}", e),
            ComputeError::Engine(e) => write!(f, "{}", e),
            ComputeError::Rows { dataview, detail } => {
                write!(f, "Unexpected rows for dataview '{}': {}", dataview, detail)
            }
        }
    }
}

impl std::error::Error for ComputeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComputeError::Plan(e) => Some(e),
            ComputeError::Emit(e) => Some(e),
            ComputeError::Engine(e) => Some(e),
            ComputeError::Rows { .. } => None,
        }
    }
}

impl From<PlanError> for ComputeError {
    fn from(err: PlanError) -> Self {
        ComputeError::Plan(err)
    }
}

impl From<EmitError> for ComputeError {
    fn from(err: EmitError) -> Self {
        ComputeError::Emit(err)
    }
}
