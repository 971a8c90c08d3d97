//! Widget response contracts

use serde::Serialize;
use serde_json::{Map, Value};

use crate::mapconfig::Aggregation;

/// One category row.
///
/// `agg` is true only on the collapsed `Other` row that absorbs the
/// categories beyond the configured cap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub category: String,
    pub value: f64,
    pub agg: bool,
}

/// Category aggregation result, ordered by value descending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoriesResult {
    pub categories: Vec<CategoryEntry>,
}

/// One histogram bin; `min`/`max`/`avg` describe the actual values that
/// fell in the bin, not its nominal edges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub bin: u32,
    pub freq: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Histogram result, ordered by bin ascending; bins with no rows are
/// omitted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramResult {
    pub bins: Vec<HistogramBin>,
}

/// Formula result; `result` is null when the aggregate has no input rows
/// (count yields 0 instead)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaResult {
    pub operation: Aggregation,
    pub column: String,
    pub result: Option<f64>,
}

/// List result: the projected rows in engine order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListResult {
    pub rows: Vec<Map<String, Value>>,
}

/// The four widget response shapes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WidgetResult {
    Categories(CategoriesResult),
    Histogram(HistogramResult),
    Formula(FormulaResult),
    List(ListResult),
}
