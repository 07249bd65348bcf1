//! Typed random expression generation.

use serde::{Deserialize, Serialize};

use crate::ast::{
    ArithmeticOperator, ComparisonOperator, Expr, LogicalOperator, PostfixOperator, UnaryOperator,
};
use crate::rng::SqlRng;
use crate::schema::Column;
use crate::types::{Constant, DataType};

/// Characters used for generated string constants and LIKE patterns.
const STRING_ALPHABET: [char; 6] = ['a', 'b', 'c', 'A', '%', '_'];
const MAX_STRING_LEN: usize = 3;

/// Integer constants stay small so generated arithmetic never overflows.
const INTEGER_RANGE: (i64, i64) = (-100, 100);

/// Produces boolean predicates over a set of columns.
pub trait ExpressionGenerator {
    /// Generates a boolean-typed expression over `columns`.
    fn generate_predicate(&mut self, rng: &mut SqlRng, columns: &[Column]) -> Expr;

    /// Syntactic negation of a predicate.
    fn negate(&self, predicate: Expr) -> Expr {
        Expr::not(predicate)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Nesting depth below which operators may still be generated.
    pub max_expression_depth: usize,
    /// Allow AND/OR inside individual predicates.
    pub logic_in_predicates: bool,
    /// Probability of a NULL literal in place of any constant.
    pub null_probability: f64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_expression_depth: 1,
            logic_in_predicates: false,
            null_probability: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BooleanShape {
    Not,
    Logical,
    Postfix,
    Comparison,
    Between,
    Like,
}

/// Recursive typed generator in the spirit of SQLancer's expression
/// generators: leaves are columns or constants of the requested type,
/// inner nodes are operators whose operand types line up.
#[derive(Debug, Clone, Default)]
pub struct RandomExpressionGenerator {
    options: GeneratorOptions,
}

impl RandomExpressionGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generates an expression of `data_type` at nesting `depth`.
    pub fn generate_expression(
        &self,
        rng: &mut SqlRng,
        columns: &[Column],
        data_type: DataType,
        depth: usize,
    ) -> Expr {
        if depth > self.options.max_expression_depth || rng.rather_low_probability() {
            return self.generate_leaf(rng, columns, data_type);
        }
        match data_type {
            DataType::Boolean => self.generate_boolean(rng, columns, depth),
            DataType::Integer => self.generate_integer(rng, columns, depth),
            DataType::Varchar => self.generate_varchar(rng, columns, depth),
        }
    }

    fn generate_boolean(&self, rng: &mut SqlRng, columns: &[Column], depth: usize) -> Expr {
        let mut shapes = vec![
            BooleanShape::Not,
            BooleanShape::Postfix,
            BooleanShape::Comparison,
            BooleanShape::Between,
            BooleanShape::Like,
        ];
        if self.options.logic_in_predicates {
            shapes.push(BooleanShape::Logical);
        }
        let next = depth + 1;
        match rng.pick(&shapes) {
            BooleanShape::Not => Expr::Unary {
                op: UnaryOperator::Not,
                expr: Box::new(self.generate_expression(rng, columns, DataType::Boolean, next)),
            },
            BooleanShape::Logical => Expr::logical(
                self.generate_expression(rng, columns, DataType::Boolean, next),
                rng.pick(&LogicalOperator::ALL),
                self.generate_expression(rng, columns, DataType::Boolean, next),
            ),
            BooleanShape::Postfix => {
                let op = rng.pick(&PostfixOperator::ALL);
                let operand_types: Vec<DataType> = DataType::ALL
                    .into_iter()
                    .filter(|t| op.accepts(*t))
                    .collect();
                let operand_type = rng.pick(&operand_types);
                Expr::Postfix {
                    op,
                    expr: Box::new(self.generate_expression(rng, columns, operand_type, next)),
                }
            }
            BooleanShape::Comparison => {
                let operand_type = self.meaningful_type(rng, columns);
                Expr::comparison(
                    self.generate_expression(rng, columns, operand_type, next),
                    rng.pick(&ComparisonOperator::ALL),
                    self.generate_expression(rng, columns, operand_type, next),
                )
            }
            BooleanShape::Between => {
                let operand_type = rng.pick(&[DataType::Integer, DataType::Varchar]);
                Expr::Between {
                    expr: Box::new(self.generate_expression(rng, columns, operand_type, next)),
                    low: Box::new(self.generate_expression(rng, columns, operand_type, next)),
                    high: Box::new(self.generate_expression(rng, columns, operand_type, next)),
                    negated: rng.next_bool(),
                }
            }
            BooleanShape::Like => Expr::Like {
                expr: Box::new(self.generate_expression(rng, columns, DataType::Varchar, next)),
                pattern: Box::new(self.generate_expression(rng, columns, DataType::Varchar, next)),
                negated: rng.next_bool(),
            },
        }
    }

    fn generate_integer(&self, rng: &mut SqlRng, columns: &[Column], depth: usize) -> Expr {
        let next = depth + 1;
        if rng.next_bool() {
            Expr::Unary {
                op: rng.pick(&[UnaryOperator::Plus, UnaryOperator::Minus]),
                expr: Box::new(self.generate_expression(rng, columns, DataType::Integer, next)),
            }
        } else {
            Expr::Arithmetic {
                left: Box::new(self.generate_expression(rng, columns, DataType::Integer, next)),
                op: rng.pick(&ArithmeticOperator::ALL),
                right: Box::new(self.generate_expression(rng, columns, DataType::Integer, next)),
            }
        }
    }

    fn generate_varchar(&self, rng: &mut SqlRng, columns: &[Column], depth: usize) -> Expr {
        if rng.next_bool() {
            return self.generate_leaf(rng, columns, DataType::Varchar);
        }
        let next = depth + 1;
        Expr::Concat {
            left: Box::new(self.generate_expression(rng, columns, DataType::Varchar, next)),
            right: Box::new(self.generate_expression(rng, columns, DataType::Varchar, next)),
        }
    }

    /// Prefers the type of an existing column so comparisons touch data.
    fn meaningful_type(&self, rng: &mut SqlRng, columns: &[Column]) -> DataType {
        match rng.choose(columns) {
            Some(column) if !rng.small_probability() => column.data_type,
            _ => rng.pick(&DataType::ALL),
        }
    }

    fn generate_leaf(&self, rng: &mut SqlRng, columns: &[Column], data_type: DataType) -> Expr {
        let candidates: Vec<&Column> = columns
            .iter()
            .filter(|c| c.data_type == data_type)
            .collect();
        if !candidates.is_empty() && rng.next_bool() {
            let column = candidates[rng.next_usize(candidates.len())];
            return Expr::column(column);
        }
        Expr::Constant(self.generate_constant(rng, data_type))
    }

    pub fn generate_constant(&self, rng: &mut SqlRng, data_type: DataType) -> Constant {
        if rng.chance(self.options.null_probability) {
            return Constant::Null(data_type);
        }
        match data_type {
            DataType::Integer => {
                Constant::Integer(rng.next_i64_inclusive(INTEGER_RANGE.0, INTEGER_RANGE.1))
            }
            DataType::Varchar => {
                Constant::Varchar(rng.string_from(&STRING_ALPHABET, MAX_STRING_LEN))
            }
            DataType::Boolean => Constant::Boolean(rng.next_bool()),
        }
    }
}

impl ExpressionGenerator for RandomExpressionGenerator {
    fn generate_predicate(&mut self, rng: &mut SqlRng, columns: &[Column]) -> Expr {
        self.generate_expression(rng, columns, DataType::Boolean, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("t0", "c0", DataType::Integer),
            Column::new("t0", "c1", DataType::Varchar),
            Column::new("t0", "c2", DataType::Boolean),
        ]
    }

    /// Static type of a generated expression, `None` when operands disagree.
    fn type_of(expr: &Expr, columns: &[Column]) -> Option<DataType> {
        match expr {
            Expr::Column(c) => columns
                .iter()
                .find(|col| col.name == c.column)
                .map(|col| col.data_type),
            Expr::Constant(constant) => Some(constant.data_type()),
            Expr::Unary { op, expr } => {
                let inner = type_of(expr, columns)?;
                match op {
                    UnaryOperator::Not => (inner == DataType::Boolean).then_some(inner),
                    UnaryOperator::Plus | UnaryOperator::Minus => {
                        (inner == DataType::Integer).then_some(inner)
                    }
                }
            }
            Expr::Postfix { op, expr } => {
                let inner = type_of(expr, columns)?;
                op.accepts(inner).then_some(DataType::Boolean)
            }
            Expr::Logical { left, right, .. } => {
                let l = type_of(left, columns)?;
                let r = type_of(right, columns)?;
                (l == DataType::Boolean && r == DataType::Boolean).then_some(DataType::Boolean)
            }
            Expr::Comparison { left, right, .. } => {
                (type_of(left, columns)? == type_of(right, columns)?).then_some(DataType::Boolean)
            }
            Expr::Arithmetic { left, right, .. } => {
                let l = type_of(left, columns)?;
                let r = type_of(right, columns)?;
                (l == DataType::Integer && r == DataType::Integer).then_some(DataType::Integer)
            }
            Expr::Concat { left, right } => {
                let l = type_of(left, columns)?;
                let r = type_of(right, columns)?;
                (l == DataType::Varchar && r == DataType::Varchar).then_some(DataType::Varchar)
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                let t = type_of(expr, columns)?;
                (t == type_of(low, columns)? && t == type_of(high, columns)?)
                    .then_some(DataType::Boolean)
            }
            Expr::Like { expr, pattern, .. } => {
                let t = type_of(expr, columns)?;
                let p = type_of(pattern, columns)?;
                (t == DataType::Varchar && p == DataType::Varchar).then_some(DataType::Boolean)
            }
        }
    }

    #[test]
    fn predicates_are_boolean_typed() {
        let columns = columns();
        let mut generator = RandomExpressionGenerator::new(GeneratorOptions {
            max_expression_depth: 3,
            logic_in_predicates: true,
            null_probability: 0.1,
        });
        let mut rng = SqlRng::new(1234);
        for _ in 0..500 {
            let predicate = generator.generate_predicate(&mut rng, &columns);
            assert_eq!(
                type_of(&predicate, &columns),
                Some(DataType::Boolean),
                "{predicate:?}"
            );
        }
    }

    #[test]
    fn no_logic_in_predicates_by_default() {
        let columns = columns();
        let mut generator = RandomExpressionGenerator::default();
        let mut rng = SqlRng::new(99);
        for _ in 0..500 {
            let predicate = generator.generate_predicate(&mut rng, &columns);
            assert_eq!(predicate.logical_node_count(), 0);
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let columns = columns();
        let mut generator = RandomExpressionGenerator::default();
        let a: Vec<Expr> = {
            let mut rng = SqlRng::new(5);
            (0..20)
                .map(|_| generator.generate_predicate(&mut rng, &columns))
                .collect()
        };
        let b: Vec<Expr> = {
            let mut rng = SqlRng::new(5);
            (0..20)
                .map(|_| generator.generate_predicate(&mut rng, &columns))
                .collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn works_without_columns() {
        let mut generator = RandomExpressionGenerator::default();
        let mut rng = SqlRng::new(8);
        for _ in 0..100 {
            let predicate = generator.generate_predicate(&mut rng, &[]);
            assert_eq!(type_of(&predicate, &[]), Some(DataType::Boolean));
        }
    }

    #[test]
    fn negate_wraps_in_not() {
        let generator = RandomExpressionGenerator::default();
        let expr = Expr::Constant(Constant::Boolean(true));
        assert_eq!(generator.negate(expr.clone()), Expr::not(expr));
    }
}
