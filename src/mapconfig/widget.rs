//! Widget (dataview) types

use serde::{Deserialize, Serialize};

/// Aggregate functions supported by aggregation and formula widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregation {
    /// Parse an aggregation name as it appears in widget options
    pub fn parse(value: &str) -> Option<Aggregation> {
        match value {
            "count" => Some(Aggregation::Count),
            "sum" => Some(Aggregation::Sum),
            "avg" => Some(Aggregation::Avg),
            "min" => Some(Aggregation::Min),
            "max" => Some(Aggregation::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }
}

/// A named statistical view over a data source
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    /// Widget id, unique within the configuration; filters key on it
    pub id: String,
    pub kind: WidgetKind,
    /// Analysis node this widget reads from
    pub source_id: String,
}

/// The closed set of widget types.
///
/// The wire format uses type strings; `aggregation`/`category` and
/// `histogram`/`range` are aliases for the same internal kind.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// Group rows by a column and aggregate each group
    Aggregation {
        column: String,
        aggregation: Aggregation,
        /// Column the aggregate runs over; count works without one
        aggregation_column: Option<String>,
    },
    /// Equal-width frequency bins over a numeric column
    Histogram {
        column: String,
        /// Bin count override; the engine default applies when absent
        bins: Option<usize>,
    },
    /// A single scalar aggregate
    Formula {
        operation: Aggregation,
        column: String,
    },
    /// Raw projection of selected columns
    List {
        columns: Vec<String>,
        /// Optional explicit sort column; natural engine order otherwise
        order_by: Option<String>,
    },
}

impl Widget {
    /// The column a filter naming this widget restricts.
    ///
    /// List widgets have no single column, so filters naming them are
    /// no-ops at combination time.
    pub fn filter_column(&self) -> Option<&str> {
        match &self.kind {
            WidgetKind::Aggregation { column, .. } => Some(column),
            WidgetKind::Histogram { column, .. } => Some(column),
            WidgetKind::Formula { column, .. } => Some(column),
            WidgetKind::List { .. } => None,
        }
    }
}
