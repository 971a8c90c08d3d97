//! List dataview

use crate::engine::QueryEngine;
use crate::emitter::emit_sql;
use crate::mapconfig::SourceRef;
use crate::plan::Expr;
use crate::planner::plan_list;

use super::result::{ListResult, WidgetResult};
use super::{run_query, ComputeError, ComputeOptions};

pub(crate) async fn compute<E>(
    engine: &E,
    widget_id: &str,
    columns: &[String],
    order_by: Option<&str>,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
    options: &ComputeOptions,
) -> Result<WidgetResult, ComputeError>
where
    E: QueryEngine + ?Sized,
{
    let plan = plan_list(columns, order_by, options.list_limit, source, predicate)?;
    let sql = emit_sql(&plan)?;
    let rows = run_query(engine, widget_id, &sql).await?;
    Ok(WidgetResult::List(ListResult {
        rows: rows.into_iter().map(|r| r.into_values()).collect(),
    }))
}
