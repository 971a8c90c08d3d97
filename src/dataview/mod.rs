//! Widget computation engine (verb module)
//!
//! Per widget kind: build the plan for the combined restriction, emit SQL,
//! issue exactly one query against the external engine, and shape the raw
//! rows into the widget's response contract. Nothing here mutates the
//! configuration, the filter set or cache state, so a failure in one
//! request never affects its siblings.

mod category;
mod error;
mod formula;
mod histogram;
mod list;
mod result;

pub use error::ComputeError;
pub use result::{
    CategoriesResult, CategoryEntry, FormulaResult, HistogramBin, HistogramResult, ListResult,
    WidgetResult,
};

use crate::engine::QueryEngine;
use crate::mapconfig::{SourceRef, Widget, WidgetKind};
use crate::plan::Expr;

/// Tunables for result shaping.
///
/// The category cap and bin default are deliberate policy choices rather
/// than fixed behavior; see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeOptions {
    /// Maximum category rows returned before the tail collapses into a
    /// single `Other` row flagged `agg: true`
    pub category_cap: usize,
    /// Histogram bin count when the widget does not specify one
    pub default_bins: usize,
    /// Maximum rows a list widget returns
    pub list_limit: usize,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            category_cap: 6,
            default_bins: 10,
            list_limit: 500,
        }
    }
}

/// Compute a widget's result under the given restriction
pub async fn compute<E>(
    engine: &E,
    widget: &Widget,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
    options: &ComputeOptions,
) -> Result<WidgetResult, ComputeError>
where
    E: QueryEngine + ?Sized,
{
    match &widget.kind {
        WidgetKind::Aggregation {
            column,
            aggregation,
            aggregation_column,
        } => {
            category::compute(
                engine,
                &widget.id,
                column,
                *aggregation,
                aggregation_column.as_deref(),
                source,
                predicate,
                options,
            )
            .await
        }
        WidgetKind::Histogram { column, bins } => {
            histogram::compute(engine, &widget.id, column, *bins, source, predicate, options).await
        }
        WidgetKind::Formula { operation, column } => {
            formula::compute(engine, &widget.id, *operation, column, source, predicate).await
        }
        WidgetKind::List { columns, order_by } => {
            list::compute(
                engine,
                &widget.id,
                columns,
                order_by.as_deref(),
                source,
                predicate,
                options,
            )
            .await
        }
    }
}

pub(crate) async fn run_query<E>(
    engine: &E,
    widget_id: &str,
    sql: &str,
) -> Result<Vec<crate::engine::Row>, ComputeError>
where
    E: QueryEngine + ?Sized,
{
    tracing::debug!(widget = widget_id, "dispatching dataview query");
    engine.execute(sql).await.map_err(ComputeError::Engine)
}
