//! Expression and query trees.
//!
//! [`Expr`] is a closed sum type: every node kind has exactly one rendering
//! case in [`crate::render`], checked exhaustively by the compiler.

use crate::schema::Column;
use crate::types::{Constant, DataType};

/// Fully qualified column reference (`table.column`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl From<&Column> for ColumnRef {
    fn from(column: &Column) -> Self {
        Self {
            table: column.table.clone(),
            column: column.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn text(self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOperator {
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
}

impl PostfixOperator {
    pub const ALL: [PostfixOperator; 4] = [
        PostfixOperator::IsNull,
        PostfixOperator::IsNotNull,
        PostfixOperator::IsTrue,
        PostfixOperator::IsFalse,
    ];

    pub fn text(self) -> &'static str {
        match self {
            PostfixOperator::IsNull => "IS NULL",
            PostfixOperator::IsNotNull => "IS NOT NULL",
            PostfixOperator::IsTrue => "IS TRUE",
            PostfixOperator::IsFalse => "IS FALSE",
        }
    }

    /// Whether the operator accepts an operand of `data_type`.
    pub fn accepts(self, data_type: DataType) -> bool {
        match self {
            PostfixOperator::IsNull | PostfixOperator::IsNotNull => true,
            PostfixOperator::IsTrue | PostfixOperator::IsFalse => data_type == DataType::Boolean,
        }
    }
}

/// Boolean connectives used to build compound predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub const ALL: [LogicalOperator; 2] = [LogicalOperator::And, LogicalOperator::Or];

    pub fn text(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 6] = [
        ComparisonOperator::Equals,
        ComparisonOperator::NotEquals,
        ComparisonOperator::Less,
        ComparisonOperator::LessEquals,
        ComparisonOperator::Greater,
        ComparisonOperator::GreaterEquals,
    ];

    pub fn text(self) -> &'static str {
        match self {
            ComparisonOperator::Equals => "=",
            ComparisonOperator::NotEquals => "!=",
            ComparisonOperator::Less => "<",
            ComparisonOperator::LessEquals => "<=",
            ComparisonOperator::Greater => ">",
            ComparisonOperator::GreaterEquals => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
}

impl ArithmeticOperator {
    pub const ALL: [ArithmeticOperator; 2] = [ArithmeticOperator::Add, ArithmeticOperator::Subtract];

    pub fn text(self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Subtract => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Column(ColumnRef),
    Constant(Constant),
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Postfix {
        op: PostfixOperator,
        expr: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOperator,
        right: Box<Expr>,
    },
    Comparison {
        left: Box<Expr>,
        op: ComparisonOperator,
        right: Box<Expr>,
    },
    Arithmetic {
        left: Box<Expr>,
        op: ArithmeticOperator,
        right: Box<Expr>,
    },
    Concat {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
}

impl Expr {
    pub fn column(column: &Column) -> Self {
        Expr::Column(ColumnRef::from(column))
    }

    /// Prefix `NOT` over `expr`.
    pub fn not(expr: Expr) -> Self {
        Expr::Unary {
            op: UnaryOperator::Not,
            expr: Box::new(expr),
        }
    }

    pub fn logical(left: Expr, op: LogicalOperator, right: Expr) -> Self {
        Expr::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn comparison(left: Expr, op: ComparisonOperator, right: Expr) -> Self {
        Expr::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Number of `AND`/`OR` nodes in the tree.
    pub fn logical_node_count(&self) -> usize {
        match self {
            Expr::Column(_) | Expr::Constant(_) => 0,
            Expr::Unary { expr, .. } | Expr::Postfix { expr, .. } => expr.logical_node_count(),
            Expr::Logical { left, right, .. } => {
                1 + left.logical_node_count() + right.logical_node_count()
            }
            Expr::Comparison { left, right, .. }
            | Expr::Arithmetic { left, right, .. }
            | Expr::Concat { left, right } => left.logical_node_count() + right.logical_node_count(),
            Expr::Between {
                expr, low, high, ..
            } => expr.logical_node_count() + low.logical_node_count() + high.logical_node_count(),
            Expr::Like { expr, pattern, .. } => {
                expr.logical_node_count() + pattern.logical_node_count()
            }
        }
    }
}

/// Table in a FROM list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub const ALL: [JoinKind; 3] = [JoinKind::Inner, JoinKind::Left, JoinKind::Right];

    pub fn text(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// A join between two tables with an ON condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    pub left: TableRef,
    pub right: TableRef,
    pub kind: JoinKind,
    pub on: Expr,
}

/// A SELECT statement.
///
/// The row source (`from` + `joins`) is shared between the combined-fetch
/// query and the verification query of a check; only the projection,
/// `where_clause` and `distinct` change between the two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Select {
    pub distinct: bool,
    pub fetch_columns: Vec<Expr>,
    pub from: Vec<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<Expr>,
}
