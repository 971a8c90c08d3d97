//! Formula dataview

use serde_json::Value;

use crate::engine::{QueryEngine, Row};
use crate::emitter::emit_sql;
use crate::mapconfig::{Aggregation, SourceRef};
use crate::plan::Expr;
use crate::planner::plan_formula;

use super::result::{FormulaResult, WidgetResult};
use super::{run_query, ComputeError};

pub(crate) async fn compute<E>(
    engine: &E,
    widget_id: &str,
    operation: Aggregation,
    column: &str,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
) -> Result<WidgetResult, ComputeError>
where
    E: QueryEngine + ?Sized,
{
    let plan = plan_formula(operation, column, source, predicate)?;
    let sql = emit_sql(&plan)?;
    let rows = run_query(engine, widget_id, &sql).await?;
    let result = shape(widget_id, rows, operation, column)?;
    Ok(WidgetResult::Formula(result))
}

pub(crate) fn shape(
    widget_id: &str,
    rows: Vec<Row>,
    operation: Aggregation,
    column: &str,
) -> Result<FormulaResult, ComputeError> {
    let result = match rows.first() {
        Some(row) => match row.get("result") {
            // SQL aggregates over an empty input yield NULL, except count
            Some(Value::Null) | None => None,
            Some(value) => Some(value.as_f64().ok_or_else(|| ComputeError::Rows {
                dataview: widget_id.to_string(),
                detail: "non-numeric 'result' column".to_string(),
            })?),
        },
        None => None,
    };

    let result = match (result, operation) {
        (None, Aggregation::Count) => Some(0.0),
        (value, _) => value,
    };

    Ok(FormulaResult {
        operation,
        column: column.to_string(),
        result,
    })
}
