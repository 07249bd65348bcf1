//! SQL text rendering.
//!
//! The oracle never builds SQL text itself: it hands expression trees and
//! query descriptions to a [`SqlRenderer`], which owns the dialect syntax.

use std::fmt::Write as _;

use crate::ast::{Expr, Join, Select};
use crate::types::Constant;

/// Renders expression trees and queries into dialect-specific SQL text.
pub trait SqlRenderer {
    fn render_expr(&self, expr: &Expr) -> String;

    fn render_select(&self, select: &Select) -> String;
}

/// Renderer for the ANSI-style syntax shared by DuckDB and PostgreSQL.
///
/// Every compound expression is parenthesised so operator precedence of
/// the target dialect never changes the meaning of a generated tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiRenderer;

impl AnsiRenderer {
    fn write_expr(&self, out: &mut String, expr: &Expr) {
        match expr {
            Expr::Column(c) => {
                let _ = write!(out, "{}.{}", c.table, c.column);
            }
            Expr::Constant(constant) => write_constant(out, constant),
            Expr::Unary { op, expr } => {
                let _ = write!(out, "({} ", op.text());
                self.write_expr(out, expr);
                out.push(')');
            }
            Expr::Postfix { op, expr } => {
                out.push('(');
                self.write_expr(out, expr);
                let _ = write!(out, " {})", op.text());
            }
            Expr::Logical { left, op, right } => self.write_binary(out, left, op.text(), right),
            Expr::Comparison { left, op, right } => self.write_binary(out, left, op.text(), right),
            Expr::Arithmetic { left, op, right } => self.write_binary(out, left, op.text(), right),
            Expr::Concat { left, right } => self.write_binary(out, left, "||", right),
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                out.push('(');
                self.write_expr(out, expr);
                out.push_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " });
                self.write_expr(out, low);
                out.push_str(" AND ");
                self.write_expr(out, high);
                out.push(')');
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                out.push('(');
                self.write_expr(out, expr);
                out.push_str(if *negated { " NOT LIKE " } else { " LIKE " });
                self.write_expr(out, pattern);
                out.push(')');
            }
        }
    }

    fn write_binary(&self, out: &mut String, left: &Expr, op: &str, right: &Expr) {
        out.push('(');
        self.write_expr(out, left);
        let _ = write!(out, " {op} ");
        self.write_expr(out, right);
        out.push(')');
    }

    fn write_join(&self, out: &mut String, join: &Join) {
        let _ = write!(
            out,
            "{} {} {} ON ",
            join.left.name,
            join.kind.text(),
            join.right.name
        );
        self.write_expr(out, &join.on);
    }

    fn write_list(&self, out: &mut String, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_expr(out, expr);
        }
    }
}

fn write_constant(out: &mut String, constant: &Constant) {
    match constant {
        Constant::Null(data_type) => {
            let _ = write!(out, "CAST(NULL AS {})", data_type.sql_name());
        }
        Constant::Integer(v) => {
            let _ = write!(out, "{v}");
        }
        Constant::Varchar(s) => {
            let _ = write!(out, "'{}'", s.replace('\'', "''"));
        }
        Constant::Boolean(true) => out.push_str("TRUE"),
        Constant::Boolean(false) => out.push_str("FALSE"),
    }
}

impl SqlRenderer for AnsiRenderer {
    fn render_expr(&self, expr: &Expr) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, expr);
        out
    }

    fn render_select(&self, select: &Select) -> String {
        let mut out = String::from("SELECT ");
        if select.distinct {
            out.push_str("DISTINCT ");
        }
        self.write_list(&mut out, &select.fetch_columns);

        let sources = select.from.len() + select.joins.len();
        if sources > 0 {
            out.push_str(" FROM ");
        }
        let mut first = true;
        for table in &select.from {
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(&table.name);
        }
        for join in &select.joins {
            if !first {
                out.push_str(", ");
            }
            first = false;
            self.write_join(&mut out, join);
        }

        if let Some(predicate) = &select.where_clause {
            out.push_str(" WHERE ");
            self.write_expr(&mut out, predicate);
        }
        if !select.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            self.write_list(&mut out, &select.order_by);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        ArithmeticOperator, ColumnRef, ComparisonOperator, JoinKind, LogicalOperator,
        PostfixOperator, TableRef,
    };
    use crate::generator::{ExpressionGenerator, GeneratorOptions, RandomExpressionGenerator};
    use crate::rng::SqlRng;
    use crate::schema::Column;
    use crate::types::DataType;
    use proptest::prelude::*;
    use test_case::test_case;

    fn col(table: &str, name: &str) -> Expr {
        Expr::Column(ColumnRef {
            table: table.into(),
            column: name.into(),
        })
    }

    #[test_case(Constant::Null(DataType::Integer) => "CAST(NULL AS INTEGER)"; "typed null")]
    #[test_case(Constant::Integer(-5) => "-5"; "negative integer")]
    #[test_case(Constant::Boolean(true) => "TRUE"; "true")]
    #[test_case(Constant::Varchar("it's".into()) => "'it''s'"; "escaped quote")]
    fn renders_constants(constant: Constant) -> String {
        AnsiRenderer.render_expr(&Expr::Constant(constant))
    }

    #[test]
    fn renders_nested_expression_fully_parenthesised() {
        let expr = Expr::logical(
            Expr::not(Expr::Postfix {
                op: PostfixOperator::IsNull,
                expr: Box::new(col("t0", "c0")),
            }),
            LogicalOperator::Or,
            Expr::comparison(
                Expr::Arithmetic {
                    left: Box::new(col("t0", "c1")),
                    op: ArithmeticOperator::Subtract,
                    right: Box::new(Expr::Constant(Constant::Integer(-3))),
                },
                ComparisonOperator::GreaterEquals,
                Expr::Constant(Constant::Integer(7)),
            ),
        );
        assert_eq!(
            AnsiRenderer.render_expr(&expr),
            "((NOT (t0.c0 IS NULL)) OR ((t0.c1 - -3) >= 7))"
        );
    }

    #[test]
    fn renders_between_and_like() {
        let between = Expr::Between {
            expr: Box::new(col("t0", "c0")),
            low: Box::new(Expr::Constant(Constant::Integer(1))),
            high: Box::new(Expr::Constant(Constant::Integer(9))),
            negated: true,
        };
        assert_eq!(
            AnsiRenderer.render_expr(&between),
            "(t0.c0 NOT BETWEEN 1 AND 9)"
        );

        let like = Expr::Like {
            expr: Box::new(Expr::Concat {
                left: Box::new(col("t0", "c1")),
                right: Box::new(Expr::Constant(Constant::Varchar("a".into()))),
            }),
            pattern: Box::new(Expr::Constant(Constant::Varchar("%a".into()))),
            negated: false,
        };
        assert_eq!(
            AnsiRenderer.render_expr(&like),
            "((t0.c1 || 'a') LIKE '%a')"
        );
    }

    #[test]
    fn renders_select_with_all_clauses() {
        let select = Select {
            distinct: true,
            fetch_columns: vec![col("t0", "c0"), col("t1", "c0")],
            from: vec![TableRef::new("t2")],
            joins: vec![Join {
                left: TableRef::new("t0"),
                right: TableRef::new("t1"),
                kind: JoinKind::Left,
                on: Expr::comparison(
                    col("t0", "c0"),
                    ComparisonOperator::Equals,
                    col("t1", "c0"),
                ),
            }],
            where_clause: Some(Expr::Constant(Constant::Boolean(true))),
            order_by: vec![col("t0", "c0")],
        };
        assert_eq!(
            AnsiRenderer.render_select(&select),
            "SELECT DISTINCT t0.c0, t1.c0 FROM t2, t0 LEFT JOIN t1 ON (t0.c0 = t1.c0) \
             WHERE TRUE ORDER BY t0.c0"
        );
    }

    #[test]
    fn renders_minimal_select() {
        let select = Select {
            fetch_columns: vec![col("t0", "c0")],
            from: vec![TableRef::new("t0")],
            ..Select::default()
        };
        assert_eq!(AnsiRenderer.render_select(&select), "SELECT t0.c0 FROM t0");
    }

    /// Depth of unclosed parentheses outside string literals, `None` if it
    /// ever goes negative.
    fn paren_balance(sql: &str) -> Option<i64> {
        let mut depth = 0i64;
        let mut in_string = false;
        for ch in sql.chars() {
            match ch {
                '\'' => in_string = !in_string,
                '(' if !in_string => depth += 1,
                ')' if !in_string => {
                    depth -= 1;
                    if depth < 0 {
                        return None;
                    }
                }
                _ => {}
            }
        }
        Some(depth)
    }

    proptest! {
        #[test]
        fn generated_predicates_render_balanced(seed in any::<u64>(), depth in 0usize..4) {
            let columns = vec![
                Column::new("t0", "c0", DataType::Integer),
                Column::new("t0", "c1", DataType::Varchar),
                Column::new("t1", "c0", DataType::Boolean),
            ];
            let mut generator = RandomExpressionGenerator::new(GeneratorOptions {
                max_expression_depth: depth,
                logic_in_predicates: true,
                null_probability: 0.2,
            });
            let mut rng = SqlRng::new(seed);
            let sql = AnsiRenderer.render_expr(&generator.generate_predicate(&mut rng, &columns));
            prop_assert_eq!(paren_balance(&sql), Some(0), "{}", sql);
            prop_assert!(!sql.contains("--"), "{}", sql);
        }
    }
}
