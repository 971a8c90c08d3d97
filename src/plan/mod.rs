//! Logical plan types (noun module)
//!
//! The intermediate representation between widget planning and SQL
//! emission: a small relational tree (scan, filter, aggregate, project,
//! sort, limit) over a scalar expression language.

mod expr;
mod node;

pub use expr::{AggregateExpr, BinaryOperator, Column, Expr, Literal};
pub use node::{
    Aggregate, Filter, Limit, PlanNode, Project, ProjectExpr, Scan, Sort, SortDirection, SortKey,
};
