//! Histogram dataview
//!
//! Bin edges come from the min/max of the *filtered* column domain, so a
//! range filter narrows both the included rows and the bin boundaries.
//! One SQL statement computes everything: a filtered, null-stripped CTE, a
//! min/max stats CTE, and equal-width bucket arithmetic over both.

use crate::engine::{QueryEngine, Row};
use crate::emitter::emit_sql;
use crate::mapconfig::SourceRef;
use crate::plan::Expr;
use crate::planner::plan_histogram_base;

use super::result::{HistogramBin, HistogramResult, WidgetResult};
use super::{run_query, ComputeError, ComputeOptions};

pub(crate) async fn compute<E>(
    engine: &E,
    widget_id: &str,
    column: &str,
    bins: Option<usize>,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
    options: &ComputeOptions,
) -> Result<WidgetResult, ComputeError>
where
    E: QueryEngine + ?Sized,
{
    let bins = bins.unwrap_or(options.default_bins);
    let base = plan_histogram_base(column, source, predicate);
    let base_sql = emit_sql(&base)?;
    let sql = histogram_sql(&base_sql, bins);
    let rows = run_query(engine, widget_id, &sql).await?;
    let result = shape(widget_id, rows)?;
    Ok(WidgetResult::Histogram(result))
}

/// Wrap the filtered relation in the bucketing query.
///
/// A degenerate domain (max = min) puts every value in bin 0; otherwise
/// values map to `floor(bins * (val - min) / (max - min))` with the top
/// edge clamped into the last bin. Empty buckets produce no rows.
pub(crate) fn histogram_sql(base_sql: &str, bins: usize) -> String {
    let base = indent(base_sql);
    format!(
        "WITH _filtered AS (
{base}
),
_stats AS (
  SELECT MIN(val) AS min_val, MAX(val) AS max_val FROM _filtered
)
SELECT
  CASE WHEN s.max_val = s.min_val THEN 0
       ELSE LEAST(FLOOR({bins} * (f.val - s.min_val) / (s.max_val - s.min_val)), {top})
  END AS bin,
  COUNT(*) AS freq,
  MIN(f.val) AS min,
  MAX(f.val) AS max,
  AVG(f.val) AS avg
FROM _filtered f, _stats s
GROUP BY 1
ORDER BY 1",
        top = bins.saturating_sub(1),
    )
}

pub(crate) fn shape(widget_id: &str, rows: Vec<Row>) -> Result<HistogramResult, ComputeError> {
    let mut bins = Vec::with_capacity(rows.len());
    for row in rows {
        bins.push(HistogramBin {
            bin: numeric(widget_id, &row, "bin")? as u32,
            freq: numeric(widget_id, &row, "freq")? as u64,
            min: numeric(widget_id, &row, "min")?,
            max: numeric(widget_id, &row, "max")?,
            avg: numeric(widget_id, &row, "avg")?,
        });
    }
    Ok(HistogramResult { bins })
}

fn numeric(widget_id: &str, row: &Row, column: &str) -> Result<f64, ComputeError> {
    row.f64_value(column).ok_or_else(|| ComputeError::Rows {
        dataview: widget_id.to_string(),
        detail: format!("missing numeric '{}' column", column),
    })
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
