//! SQL emitter
//!
//! Transforms a PlanNode tree into a pretty-printed SQL string. Sources are
//! query texts, so scans wrap them as aliased subselects.

use crate::mapconfig::Aggregation;
use crate::plan::{
    Aggregate, AggregateExpr, Column, Expr, Filter, Limit, Literal, PlanNode, Project, Scan, Sort,
    SortDirection,
};

use super::error::EmitError;

/// Emit a SQL string from a PlanNode
pub fn emit_sql(node: &PlanNode) -> Result<String, EmitError> {
    emit_node(node, 0)
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

// ---------------------------------------------------------------------------
// Node dispatch
// ---------------------------------------------------------------------------

fn emit_node(node: &PlanNode, indent: usize) -> Result<String, EmitError> {
    match node {
        PlanNode::Scan(scan) => Ok(emit_scan(scan, indent)),
        PlanNode::Filter(filter) => emit_filter(filter, indent),
        PlanNode::Aggregate(agg) => emit_aggregate(agg, indent),
        PlanNode::Project(proj) => emit_project(proj, indent),
        PlanNode::Sort(sort) => emit_sort(sort, indent),
        PlanNode::Limit(limit) => emit_limit(limit, indent),
    }
}

// ---------------------------------------------------------------------------
// Relation nodes
// ---------------------------------------------------------------------------

fn emit_scan(scan: &Scan, indent: usize) -> String {
    let p = pad(indent);
    let source = indent_lines(&scan.sql, indent + 1);
    format!(
        "{p}SELECT *\n{p}FROM (\n{source}\n{p}) AS {alias}",
        alias = scan.alias
    )
}

fn emit_filter(filter: &Filter, indent: usize) -> Result<String, EmitError> {
    let p = pad(indent);
    let input = emit_node(&filter.input, indent + 1)?;
    let predicate = emit_expr(&filter.predicate)?;
    Ok(format!(
        "{p}SELECT *\n{p}FROM (\n{input}\n{p}) AS _f\n{p}WHERE {predicate}"
    ))
}

fn emit_aggregate(agg: &Aggregate, indent: usize) -> Result<String, EmitError> {
    if agg.group_by.is_empty() && agg.aggregates.is_empty() {
        return Err(EmitError::InvalidPlan(
            "Aggregate requires group columns or aggregate expressions".to_string(),
        ));
    }

    let p = pad(indent);
    let input = emit_node(&agg.input, indent + 1)?;

    let group_cols: Vec<String> = agg.group_by.iter().map(emit_column).collect();

    let agg_exprs: Vec<String> = agg
        .aggregates
        .iter()
        .map(emit_aggregate_expr)
        .collect::<Result<Vec<_>, _>>()?;

    let mut select_items: Vec<String> = group_cols.clone();
    select_items.extend(agg_exprs);

    if group_cols.is_empty() {
        Ok(format!(
            "{p}SELECT {sel}\n{p}FROM (\n{input}\n{p})",
            sel = select_items.join(", "),
        ))
    } else {
        Ok(format!(
            "{p}SELECT {sel}\n{p}FROM (\n{input}\n{p})\n{p}GROUP BY {grp}",
            sel = select_items.join(", "),
            grp = group_cols.join(", "),
        ))
    }
}

fn emit_project(proj: &Project, indent: usize) -> Result<String, EmitError> {
    if proj.expressions.is_empty() {
        return Err(EmitError::InvalidPlan(
            "Project requires at least one expression".to_string(),
        ));
    }

    let p = pad(indent);
    let input = emit_node(&proj.input, indent + 1)?;

    let items: Vec<String> = proj
        .expressions
        .iter()
        .map(|pe| {
            let expr_sql = emit_expr(&pe.expr)?;
            Ok(format!("{} AS \"{}\"", expr_sql, pe.alias))
        })
        .collect::<Result<Vec<_>, EmitError>>()?;

    Ok(format!(
        "{p}SELECT {sel}\n{p}FROM (\n{input}\n{p})",
        sel = items.join(", "),
    ))
}

fn emit_sort(sort: &Sort, indent: usize) -> Result<String, EmitError> {
    let p = pad(indent);
    let input = emit_node(&sort.input, indent + 1)?;

    let keys: Vec<String> = sort
        .sort_keys
        .iter()
        .map(|k| {
            let dir = match k.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            format!("{} {}", k.column, dir)
        })
        .collect();

    Ok(format!(
        "{p}SELECT *\n{p}FROM (\n{input}\n{p})\n{p}ORDER BY {keys}",
        keys = keys.join(", "),
    ))
}

fn emit_limit(limit: &Limit, indent: usize) -> Result<String, EmitError> {
    let p = pad(indent);
    let input = emit_node(&limit.input, indent + 1)?;
    Ok(format!(
        "{p}SELECT *\n{p}FROM (\n{input}\n{p})\n{p}LIMIT {count}",
        count = limit.count,
    ))
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn emit_expr(expr: &Expr) -> Result<String, EmitError> {
    match expr {
        Expr::Column(col) => Ok(emit_column(col)),
        Expr::Literal(lit) => Ok(emit_literal(lit)),
        Expr::BinaryOp { left, op, right } => {
            let l = emit_expr(left)?;
            let r = emit_expr(right)?;
            Ok(format!("{} {} {}", l, op.as_str(), r))
        }
        Expr::And(exprs) => {
            if exprs.is_empty() {
                return Ok("TRUE".to_string());
            }
            let parts: Vec<String> = exprs.iter().map(emit_expr).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" AND ")))
        }
        Expr::Or(exprs) => {
            if exprs.is_empty() {
                return Ok("FALSE".to_string());
            }
            let parts: Vec<String> = exprs.iter().map(emit_expr).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("({})", parts.join(" OR ")))
        }
        Expr::In { expr, values } => {
            if values.is_empty() {
                return Err(EmitError::InvalidPlan("IN with no values".to_string()));
            }
            let needle = emit_expr(expr)?;
            let vals: Vec<String> = values.iter().map(emit_expr).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("{} IN ({})", needle, vals.join(", ")))
        }
        Expr::NotIn { expr, values } => {
            if values.is_empty() {
                return Err(EmitError::InvalidPlan("NOT IN with no values".to_string()));
            }
            let needle = emit_expr(expr)?;
            let vals: Vec<String> = values.iter().map(emit_expr).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("{} NOT IN ({})", needle, vals.join(", ")))
        }
        Expr::IsNotNull(inner) => Ok(format!("{} IS NOT NULL", emit_expr(inner)?)),
        Expr::Sql(s) => Ok(s.clone()),
    }
}

fn emit_column(col: &Column) -> String {
    if col.table.is_empty() {
        col.name.clone()
    } else {
        format!("{}.{}", col.table, col.name)
    }
}

fn emit_literal(lit: &Literal) -> String {
    match lit {
        Literal::Null => "NULL".to_string(),
        Literal::Bool(b) => {
            if *b {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => format!("{}", f),
        Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn indent_lines(text: &str, indent: usize) -> String {
    let p = pad(indent);
    text.lines()
        .map(|line| format!("{p}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

fn emit_aggregate_expr(agg: &AggregateExpr) -> Result<String, EmitError> {
    let inner = emit_expr(&agg.expr)?;
    let func_sql = match agg.func {
        Aggregation::Count => format!("COUNT({})", inner),
        Aggregation::Sum => format!("SUM({})", inner),
        Aggregation::Avg => format!("AVG({})", inner),
        Aggregation::Min => format!("MIN({})", inner),
        Aggregation::Max => format!("MAX({})", inner),
    };
    Ok(format!("{} AS \"{}\"", func_sql, agg.alias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ProjectExpr, SortKey};

    fn scan() -> Scan {
        Scan::new("select * from populated_places_simple_reduced")
    }

    // -- unit: scan -----------------------------------------------------------

    #[test]
    fn test_sql_scan_wraps_source_query() {
        let sql = emit_sql(&PlanNode::Scan(scan())).unwrap();
        assert_eq!(
            sql,
            "SELECT *\nFROM (\n  select * from populated_places_simple_reduced\n) AS _source"
        );
    }

    // -- unit: filter ---------------------------------------------------------

    #[test]
    fn test_sql_filter() {
        let filter = PlanNode::Filter(Filter {
            input: Box::new(PlanNode::Scan(scan())),
            predicate: Expr::BinaryOp {
                left: Box::new(Expr::Column(Column::unqualified("pop_max"))),
                op: crate::plan::BinaryOperator::GtEq,
                right: Box::new(Expr::Literal(Literal::Float(4000000.0))),
            },
        });
        let sql = emit_sql(&filter).unwrap();
        assert!(sql.contains("WHERE pop_max >= 4000000"));
        assert!(sql.contains('\n'));
    }

    // -- unit: aggregate ------------------------------------------------------

    #[test]
    fn test_sql_aggregate() {
        let agg = PlanNode::Aggregate(Aggregate {
            input: Box::new(PlanNode::Scan(scan())),
            group_by: vec![Column::unqualified("adm0_a3")],
            aggregates: vec![AggregateExpr {
                func: Aggregation::Count,
                expr: Expr::Sql("*".to_string()),
                alias: "value".to_string(),
            }],
        });
        let sql = emit_sql(&agg).unwrap();
        assert!(sql.contains("COUNT(*) AS \"value\""));
        assert!(sql.contains("GROUP BY adm0_a3"));
    }

    #[test]
    fn test_sql_aggregate_without_groups() {
        let agg = PlanNode::Aggregate(Aggregate {
            input: Box::new(PlanNode::Scan(scan())),
            group_by: vec![],
            aggregates: vec![AggregateExpr {
                func: Aggregation::Sum,
                expr: Expr::Column(Column::unqualified("pop_max")),
                alias: "result".to_string(),
            }],
        });
        let sql = emit_sql(&agg).unwrap();
        assert!(sql.contains("SUM(pop_max) AS \"result\""));
        assert!(!sql.contains("GROUP BY"));
    }

    #[test]
    fn test_sql_empty_aggregate_is_invalid() {
        let agg = PlanNode::Aggregate(Aggregate {
            input: Box::new(PlanNode::Scan(scan())),
            group_by: vec![],
            aggregates: vec![],
        });
        assert!(emit_sql(&agg).is_err());
    }

    // -- unit: project --------------------------------------------------------

    #[test]
    fn test_sql_project() {
        let proj = PlanNode::Project(Project {
            input: Box::new(PlanNode::Scan(scan())),
            expressions: vec![ProjectExpr {
                expr: Expr::Column(Column::unqualified("name")),
                alias: "name".to_string(),
            }],
        });
        let sql = emit_sql(&proj).unwrap();
        assert!(sql.contains("name AS \"name\""));
    }

    // -- unit: sort and limit -------------------------------------------------

    #[test]
    fn test_sql_sort() {
        let sort = PlanNode::Sort(Sort {
            input: Box::new(PlanNode::Scan(scan())),
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
        });
        let sql = emit_sql(&sort).unwrap();
        assert!(sql.contains("ORDER BY value DESC, category ASC"));
    }

    #[test]
    fn test_sql_limit() {
        let limit = PlanNode::Limit(Limit {
            input: Box::new(PlanNode::Scan(scan())),
            count: 500,
        });
        let sql = emit_sql(&limit).unwrap();
        assert!(sql.contains("LIMIT 500"));
    }

    // -- unit: expressions ----------------------------------------------------

    #[test]
    fn test_sql_in_expr() {
        let expr = Expr::In {
            expr: Box::new(Expr::Column(Column::unqualified("adm0_a3"))),
            values: vec![
                Expr::Literal(Literal::String("USA".to_string())),
                Expr::Literal(Literal::String("CAN".to_string())),
            ],
        };
        assert_eq!(emit_expr(&expr).unwrap(), "adm0_a3 IN ('USA', 'CAN')");
    }

    #[test]
    fn test_sql_not_in_expr() {
        let expr = Expr::NotIn {
            expr: Box::new(Expr::Column(Column::unqualified("adm0_a3"))),
            values: vec![Expr::Literal(Literal::String("CHN".to_string()))],
        };
        assert_eq!(emit_expr(&expr).unwrap(), "adm0_a3 NOT IN ('CHN')");
    }

    #[test]
    fn test_sql_empty_in_is_invalid() {
        let expr = Expr::In {
            expr: Box::new(Expr::Column(Column::unqualified("x"))),
            values: vec![],
        };
        assert!(emit_expr(&expr).is_err());
    }

    #[test]
    fn test_sql_and_or_empties() {
        assert_eq!(emit_expr(&Expr::And(vec![])).unwrap(), "TRUE");
        assert_eq!(emit_expr(&Expr::Or(vec![])).unwrap(), "FALSE");
    }

    #[test]
    fn test_sql_or_joins_parts() {
        let expr = Expr::Or(vec![
            Expr::Literal(Literal::Bool(true)),
            Expr::Literal(Literal::Bool(false)),
        ]);
        assert_eq!(emit_expr(&expr).unwrap(), "(TRUE OR FALSE)");
    }

    #[test]
    fn test_sql_is_not_null() {
        let expr = Expr::IsNotNull(Box::new(Expr::Column(Column::unqualified("pop_max"))));
        assert_eq!(emit_expr(&expr).unwrap(), "pop_max IS NOT NULL");
    }

    #[test]
    fn test_sql_string_escaping() {
        let expr = Expr::Literal(Literal::String("O'Brien".to_string()));
        assert_eq!(emit_expr(&expr).unwrap(), "'O''Brien'");
    }

    #[test]
    fn test_sql_qualified_column() {
        assert_eq!(emit_column(&Column::new("f", "val")), "f.val");
    }
}
