//! Row-source generation: FROM lists with optional joins.

use crate::ast::{Join, JoinKind, TableRef};
use crate::generator::expression::ExpressionGenerator;
use crate::rng::SqlRng;
use crate::schema::{Column, Table};

/// The FROM clause of a generated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSource {
    pub from: Vec<TableRef>,
    pub joins: Vec<Join>,
}

/// Builds a row source over `tables`.
///
/// While at least two tables remain, with probability `join_probability`
/// the first two are turned into a join with a generated ON predicate over
/// their columns; the rest stay in the comma-separated FROM list.
pub fn generate_row_source<G: ExpressionGenerator + ?Sized>(
    rng: &mut SqlRng,
    generator: &mut G,
    tables: &[Table],
    join_probability: f64,
) -> RowSource {
    let mut remaining: Vec<&Table> = tables.iter().collect();
    let mut joins = Vec::new();
    while remaining.len() >= 2 && rng.chance(join_probability) {
        let left = remaining.remove(0);
        let right = remaining.remove(0);
        let columns: Vec<Column> = left
            .columns
            .iter()
            .chain(right.columns.iter())
            .cloned()
            .collect();
        joins.push(Join {
            left: TableRef::new(&left.name),
            right: TableRef::new(&right.name),
            kind: rng.pick(&JoinKind::ALL),
            on: generator.generate_predicate(rng, &columns),
        });
    }
    RowSource {
        from: remaining.into_iter().map(|t| TableRef::new(&t.name)).collect(),
        joins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::expression::RandomExpressionGenerator;
    use crate::types::DataType;

    fn tables(n: usize) -> Vec<Table> {
        (0..n)
            .map(|i| {
                let name = format!("t{i}");
                Table::new(&name, vec![Column::new(&name, "c0", DataType::Integer)])
            })
            .collect()
    }

    #[test]
    fn every_table_appears_exactly_once() {
        let mut generator = RandomExpressionGenerator::default();
        let mut rng = SqlRng::new(17);
        let tables = tables(5);
        for _ in 0..100 {
            let source = generate_row_source(&mut rng, &mut generator, &tables, 0.7);
            let mut names: Vec<String> = source.from.iter().map(|t| t.name.clone()).collect();
            for join in &source.joins {
                names.push(join.left.name.clone());
                names.push(join.right.name.clone());
            }
            names.sort();
            assert_eq!(names, ["t0", "t1", "t2", "t3", "t4"]);
        }
    }

    #[test]
    fn no_joins_when_probability_is_zero() {
        let mut generator = RandomExpressionGenerator::default();
        let mut rng = SqlRng::new(2);
        let source = generate_row_source(&mut rng, &mut generator, &tables(3), 0.0);
        assert!(source.joins.is_empty());
        assert_eq!(source.from.len(), 3);
    }

    #[test]
    fn single_table_never_joins() {
        let mut generator = RandomExpressionGenerator::default();
        let mut rng = SqlRng::new(2);
        let source = generate_row_source(&mut rng, &mut generator, &tables(1), 1.0);
        assert!(source.joins.is_empty());
        assert_eq!(source.from, vec![TableRef::new("t0")]);
    }
}
