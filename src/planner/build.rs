//! Plan building logic

use crate::mapconfig::{Aggregation, SourceRef};
use crate::plan::{
    Aggregate, AggregateExpr, Column, Expr, Filter, Limit, PlanNode, Project, ProjectExpr, Scan,
    Sort, SortDirection, SortKey,
};

use super::error::PlanError;

/// Category aggregation: group the restricted source by the widget's
/// column, aggregate each group, order by aggregate value descending with
/// the category value as the ascending tie-break.
pub fn plan_category(
    column: &str,
    aggregation: Aggregation,
    aggregation_column: Option<&str>,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
) -> Result<PlanNode, PlanError> {
    let value_expr = aggregate_operand(aggregation, aggregation_column)?;

    let plan = restricted_scan(source, predicate);
    let plan = PlanNode::Aggregate(Aggregate {
        input: Box::new(plan),
        group_by: vec![Column::unqualified(column)],
        aggregates: vec![AggregateExpr {
            func: aggregation,
            expr: value_expr,
            alias: "value".to_string(),
        }],
    });
    let plan = PlanNode::Project(Project {
        input: Box::new(plan),
        expressions: vec![
            ProjectExpr {
                expr: Expr::Column(Column::unqualified(column)),
                alias: "category".to_string(),
            },
            ProjectExpr {
                expr: Expr::Column(Column::unqualified("value")),
                alias: "value".to_string(),
            },
        ],
    });
    Ok(PlanNode::Sort(Sort {
        input: Box::new(plan),
        sort_keys: vec![
            SortKey {
                column: "value".to_string(),
                direction: SortDirection::Descending,
            },
            SortKey {
                column: "category".to_string(),
                direction: SortDirection::Ascending,
            },
        ],
    }))
}

/// Formula: a single scalar aggregate over the restricted source
pub fn plan_formula(
    operation: Aggregation,
    column: &str,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
) -> Result<PlanNode, PlanError> {
    let operand = match operation {
        Aggregation::Count => Expr::Sql("*".to_string()),
        _ => Expr::Column(Column::unqualified(column)),
    };

    Ok(PlanNode::Aggregate(Aggregate {
        input: Box::new(restricted_scan(source, predicate)),
        group_by: vec![],
        aggregates: vec![AggregateExpr {
            func: operation,
            expr: operand,
            alias: "result".to_string(),
        }],
    }))
}

/// List: project the widget's columns over the restricted source, capped
pub fn plan_list(
    columns: &[String],
    order_by: Option<&str>,
    limit: usize,
    source: &SourceRef<'_>,
    predicate: Option<Expr>,
) -> Result<PlanNode, PlanError> {
    if columns.is_empty() {
        return Err(PlanError::EmptyProjection);
    }

    let plan = restricted_scan(source, predicate);
    let mut plan = PlanNode::Project(Project {
        input: Box::new(plan),
        expressions: columns
            .iter()
            .map(|c| ProjectExpr {
                expr: Expr::Column(Column::unqualified(c)),
                alias: c.clone(),
            })
            .collect(),
    });
    if let Some(order_by) = order_by {
        plan = PlanNode::Sort(Sort {
            input: Box::new(plan),
            sort_keys: vec![SortKey {
                column: order_by.to_string(),
                direction: SortDirection::Ascending,
            }],
        });
    }
    Ok(PlanNode::Limit(Limit {
        input: Box::new(plan),
        count: limit,
    }))
}

/// The filtered, null-stripped relation a histogram buckets over.
///
/// Bin edges are derived from this relation's min/max, so a range filter
/// narrows both the included rows and the bin boundaries. The bucket
/// arithmetic itself is wrapped around the emitted SQL by the dataview
/// layer.
pub fn plan_histogram_base(column: &str, source: &SourceRef<'_>, predicate: Option<Expr>) -> PlanNode {
    let column_expr = Expr::Column(Column::unqualified(column));
    let not_null = Expr::IsNotNull(Box::new(column_expr.clone()));
    let predicate = match predicate {
        Some(expr) => Expr::And(vec![expr, not_null]),
        None => not_null,
    };

    let plan = PlanNode::Filter(Filter {
        input: Box::new(PlanNode::Scan(Scan::new(source.sql))),
        predicate,
    });
    PlanNode::Project(Project {
        input: Box::new(plan),
        expressions: vec![ProjectExpr {
            expr: column_expr,
            alias: "val".to_string(),
        }],
    })
}

fn restricted_scan(source: &SourceRef<'_>, predicate: Option<Expr>) -> PlanNode {
    let scan = PlanNode::Scan(Scan::new(source.sql));
    match predicate {
        Some(predicate) => PlanNode::Filter(Filter {
            input: Box::new(scan),
            predicate,
        }),
        None => scan,
    }
}

fn aggregate_operand(
    aggregation: Aggregation,
    aggregation_column: Option<&str>,
) -> Result<Expr, PlanError> {
    match aggregation {
        // count is a row count regardless of any aggregation column
        Aggregation::Count => Ok(Expr::Sql("*".to_string())),
        _ => aggregation_column
            .map(|c| Expr::Column(Column::unqualified(c)))
            .ok_or(PlanError::MissingAggregationColumn(aggregation)),
    }
}
