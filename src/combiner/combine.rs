//! Filter combination logic

use serde_json::Value;

use crate::filters::{CategoryFilter, Filter, FilterSet, RangeFilter};
use crate::mapconfig::{MapConfig, DEFAULT_GEOMETRY_COLUMN};
use crate::plan::{BinaryOperator, Column, Expr, Literal};

/// Compute the restriction to apply before computing `target_widget_id`'s
/// result.
///
/// Conjuncts, in order: the bounding-box spatial predicate if one is
/// active, then one sub-predicate per filtered widget sharing the target's
/// data source, visited in widget-id order. With `include_own_filter` set
/// to false the target's own filter is skipped while every sibling filter
/// still applies; this is what lets a client refresh a widget's selector
/// without the widget suppressing its own options.
///
/// Pure: identical inputs always produce the identical expression.
/// `None` means no restriction. Filter entries naming widgets the
/// configuration does not define contribute nothing; a widget with no
/// filter entry contributes nothing.
pub fn combine(
    config: &MapConfig,
    filters: &FilterSet,
    target_widget_id: &str,
    include_own_filter: bool,
) -> Option<Expr> {
    let target = config.widget(target_widget_id)?;

    let mut conjuncts = Vec::new();

    if let Some(bbox) = &filters.bbox {
        let geometry_column = config
            .resolve_source(target_widget_id)
            .map(|s| s.geometry_column.to_string())
            .unwrap_or_else(|_| DEFAULT_GEOMETRY_COLUMN.to_string());
        conjuncts.push(Expr::Sql(bbox.intersects_sql(&geometry_column)));
    }

    for widget in config.widgets() {
        if widget.source_id != target.source_id {
            continue;
        }
        if widget.id == target.id && !include_own_filter {
            continue;
        }
        let Some(filter) = filters.get(&widget.id) else {
            continue;
        };
        // List widgets have no filterable column; their entries are no-ops.
        let Some(column) = widget.filter_column() else {
            continue;
        };
        conjuncts.push(filter_expr(column, filter));
    }

    match conjuncts.len() {
        0 => None,
        1 => conjuncts.into_iter().next(),
        _ => Some(Expr::And(conjuncts)),
    }
}

/// Translate one widget's filter into a predicate on its column
fn filter_expr(column: &str, filter: &Filter) -> Expr {
    match filter {
        Filter::Category(category) => category_expr(column, category),
        Filter::Range(range) => range_expr(column, range),
    }
}

fn category_expr(column: &str, filter: &CategoryFilter) -> Expr {
    let column_expr = Expr::Column(Column::unqualified(column));
    let mut parts = Vec::new();

    if let Some(accept) = &filter.accept {
        if accept.is_empty() {
            // An empty accept list accepts nothing; no row satisfies it.
            return Expr::Literal(Literal::Bool(false));
        }
        parts.push(Expr::In {
            expr: Box::new(column_expr.clone()),
            values: accept.iter().map(json_to_literal).collect(),
        });
    }

    if let Some(reject) = &filter.reject {
        if !reject.is_empty() {
            parts.push(Expr::NotIn {
                expr: Box::new(column_expr),
                values: reject.iter().map(json_to_literal).collect(),
            });
        }
    }

    match parts.len() {
        0 => Expr::Literal(Literal::Bool(true)),
        1 => parts.into_iter().next().unwrap(),
        _ => Expr::And(parts),
    }
}

fn range_expr(column: &str, filter: &RangeFilter) -> Expr {
    let mut parts = Vec::new();
    if let Some(min) = filter.min {
        parts.push(Expr::BinaryOp {
            left: Box::new(Expr::Column(Column::unqualified(column))),
            op: BinaryOperator::GtEq,
            right: Box::new(Expr::Literal(Literal::Float(min))),
        });
    }
    if let Some(max) = filter.max {
        parts.push(Expr::BinaryOp {
            left: Box::new(Expr::Column(Column::unqualified(column))),
            op: BinaryOperator::LtEq,
            right: Box::new(Expr::Literal(Literal::Float(max))),
        });
    }
    match parts.len() {
        0 => Expr::Literal(Literal::Bool(true)),
        1 => parts.into_iter().next().unwrap(),
        _ => Expr::And(parts),
    }
}

/// Convert a JSON category value to a literal expression
fn json_to_literal(value: &Value) -> Expr {
    let literal = match value {
        Value::Null => Literal::Null,
        Value::Bool(b) => Literal::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Literal::Int(i)
            } else if let Some(f) = n.as_f64() {
                Literal::Float(f)
            } else {
                Literal::Null
            }
        }
        Value::String(s) => Literal::String(s.clone()),
        _ => Literal::Null,
    };
    Expr::Literal(literal)
}
