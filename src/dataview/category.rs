//! Category aggregation dataview

use serde_json::Value;

use crate::engine::{QueryEngine, Row};
use crate::emitter::emit_sql;
use crate::mapconfig::{Aggregation, SourceRef};
use crate::plan::Expr;
use crate::planner::plan_category;

use super::result::{CategoriesResult, CategoryEntry, WidgetResult};
use super::{run_query, ComputeError, ComputeOptions};

/// Name given to the collapsed tail row
const OTHER_CATEGORY: &str = "Other";

#[allow(clippy::too_many_arguments)]
pub(crate) async fn compute<E>(
    engine: &E,
    widget_id: &str,
    column: &str,
    aggregation: Aggregation,
    aggregation_column: Option<&str>,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
    options: &ComputeOptions,
) -> Result<WidgetResult, ComputeError>
where
    E: QueryEngine + ?Sized,
{
    let plan = plan_category(column, aggregation, aggregation_column, source, predicate)?;
    let sql = emit_sql(&plan)?;
    let rows = run_query(engine, widget_id, &sql).await?;
    let result = shape(widget_id, rows, aggregation, options.category_cap)?;
    Ok(WidgetResult::Categories(result))
}

/// Shape ordered aggregation rows, collapsing the tail beyond the cap.
///
/// Rows arrive ordered by value descending (category ascending on ties).
/// When the distinct-category count exceeds the cap, the first `cap - 1`
/// rows pass through and the remainder becomes one `Other` row with
/// `agg: true`, combined with the widget's own aggregation semantics.
pub(crate) fn shape(
    widget_id: &str,
    rows: Vec<Row>,
    aggregation: Aggregation,
    cap: usize,
) -> Result<CategoriesResult, ComputeError> {
    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let category = row
            .get("category")
            .map(category_name)
            .ok_or_else(|| rows_error(widget_id, "missing 'category' column"))?;
        let value = row
            .f64_value("value")
            .ok_or_else(|| rows_error(widget_id, "missing numeric 'value' column"))?;
        entries.push(CategoryEntry {
            category,
            value,
            agg: false,
        });
    }

    if cap > 0 && entries.len() > cap {
        let tail: Vec<f64> = entries.split_off(cap - 1).iter().map(|e| e.value).collect();
        entries.push(CategoryEntry {
            category: OTHER_CATEGORY.to_string(),
            value: collapse(aggregation, &tail),
            agg: true,
        });
    }

    Ok(CategoriesResult { categories: entries })
}

/// Combine the collapsed tail with the widget's aggregation semantics
fn collapse(aggregation: Aggregation, values: &[f64]) -> f64 {
    match aggregation {
        Aggregation::Count | Aggregation::Sum => values.iter().sum(),
        Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Avg => values.iter().sum::<f64>() / values.len() as f64,
    }
}

fn category_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn rows_error(widget_id: &str, detail: &str) -> ComputeError {
    ComputeError::Rows {
        dataview: widget_id.to_string(),
        detail: detail.to_string(),
    }
}
