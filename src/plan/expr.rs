//! Expression types for the logical plan

use crate::mapconfig::Aggregation;

/// A column reference
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Relation alias; empty for unqualified references
    pub table: String,
    /// Column name
    pub name: String,
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Create an unqualified column reference (no table prefix)
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            table: String::new(),
            name: name.into(),
        }
    }
}

/// Scalar expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(Column),
    /// Literal value
    Literal(Literal),
    /// Binary comparison (e.g., a >= 5)
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Membership: expr IN (values)
    In { expr: Box<Expr>, values: Vec<Expr> },
    /// Exclusion: expr NOT IN (values)
    NotIn { expr: Box<Expr>, values: Vec<Expr> },
    /// AND of multiple expressions
    And(Vec<Expr>),
    /// OR of multiple expressions
    Or(Vec<Expr>),
    /// IS NOT NULL check
    IsNotNull(Box<Expr>),
    /// Raw SQL fragment (spatial predicates, COUNT(*) operands)
    Sql(String),
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
        }
    }
}

/// An aggregate expression: func(expr) AS alias
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    pub func: Aggregation,
    pub expr: Expr,
    pub alias: String,
}
