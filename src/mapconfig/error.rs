//! Configuration errors

use std::fmt;

/// Errors raised while parsing or validating a map configuration.
///
/// Every variant names the offending layer or widget so callers can fix
/// their input; none of these are retryable.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The raw payload is not a valid configuration document
    Json(String),
    /// Layer `type` is not one of the supported kinds
    UnknownLayerType { layer: usize, kind: String },
    /// Widget `type` is not one of the supported kinds
    UnknownWidgetType { widget: String, kind: String },
    /// Aggregation/operation name is not one of count/sum/avg/min/max
    UnknownAggregation { widget: String, value: String },
    /// The same widget id is defined more than once
    DuplicateWidget { widget: String },
    /// A widget is missing an option its type requires
    MissingOption { widget: String, option: String },
    /// A widget option is present but unusable
    InvalidOption {
        widget: String,
        option: String,
        reason: String,
    },
    /// A widget carries no source reference and its layer has no inline SQL
    MissingSource { widget: String },
    /// A widget references an analysis node that does not exist
    UnknownSource { widget: String, source: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(detail) => {
                write!(f, "Invalid map configuration: {}", detail)
            }
            ConfigError::UnknownLayerType { layer, kind } => {
                write!(f, "Layer {} has unknown type '{}'", layer, kind)
            }
            ConfigError::UnknownWidgetType { widget, kind } => {
                write!(f, "Widget '{}' has unknown type '{}'", widget, kind)
            }
            ConfigError::UnknownAggregation { widget, value } => {
                write!(f, "Widget '{}' has unknown aggregation '{}'", widget, value)
            }
            ConfigError::DuplicateWidget { widget } => {
                write!(f, "Widget '{}' is defined more than once", widget)
            }
            ConfigError::MissingOption { widget, option } => {
                write!(f, "Widget '{}' is missing required option '{}'", widget, option)
            }
            ConfigError::InvalidOption {
                widget,
                option,
                reason,
            } => {
                write!(f, "Widget '{}' option '{}': {}", widget, option, reason)
            }
            ConfigError::MissingSource { widget } => {
                write!(f, "Widget '{}' has no data source", widget)
            }
            ConfigError::UnknownSource { widget, source } => {
                write!(f, "Widget '{}' references unknown source '{}'", widget, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
