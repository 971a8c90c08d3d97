//! Filter parsing errors

use std::fmt;

/// Errors raised while parsing client filter state.
///
/// These indicate malformed input and are not retryable.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The filters document is not an object of the expected shape
    Invalid(String),
    /// A filter entry is not an object
    InvalidEntry { widget: String },
    /// A filter entry has neither category nor range fields
    Empty { widget: String },
    /// A filter entry mixes category and range fields
    Mixed { widget: String },
    /// accept/reject is not an array of scalar values
    InvalidCategoryList { widget: String, field: String },
    /// min/max is not a number
    InvalidBound { widget: String, field: String },
    /// Range lower bound exceeds the upper bound
    InvertedRange { widget: String, min: f64, max: f64 },
    /// Bounding box is not `west,south,east,north`
    InvalidBoundingBox(String),
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::Invalid(detail) => {
                write!(f, "Invalid filters: {}", detail)
            }
            FilterError::InvalidEntry { widget } => {
                write!(f, "Filter for widget '{}' must be an object", widget)
            }
            FilterError::Empty { widget } => {
                write!(f, "Filter for widget '{}' has no accept/reject or min/max", widget)
            }
            FilterError::Mixed { widget } => {
                write!(
                    f,
                    "Filter for widget '{}' mixes category and range fields",
                    widget
                )
            }
            FilterError::InvalidCategoryList { widget, field } => {
                write!(
                    f,
                    "Filter for widget '{}': '{}' must be an array of scalar values",
                    widget, field
                )
            }
            FilterError::InvalidBound { widget, field } => {
                write!(f, "Filter for widget '{}': '{}' must be a number", widget, field)
            }
            FilterError::InvertedRange { widget, min, max } => {
                write!(
                    f,
                    "Filter for widget '{}': min {} exceeds max {}",
                    widget, min, max
                )
            }
            FilterError::InvalidBoundingBox(raw) => {
                write!(f, "Invalid bounding box '{}': expected west,south,east,north", raw)
            }
        }
    }
}

impl std::error::Error for FilterError {}
