//! Row evaluation table: one combined fetch of row contents and every
//! predicate's ground-truth value.

use tracing::debug;
use trivalent_sql::{Expr, RowSource, Select, SqlRenderer};

use crate::client::{DatabaseClient, QueryResult, Row};
use crate::error::OracleError;
use crate::expected_errors::{ExpectedErrors, query_classified};
use crate::predicate::KnownPredicate;
use crate::ternary::{Ternary, TruthVector};

/// Fetch-column values of the rows captured for one check, in fetch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSnapshot {
    rows: Vec<Row>,
}

impl RowSnapshot {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// Snapshot plus the evaluated predicates, aligned row by row.
#[derive(Debug, Clone)]
pub struct EvaluationTable {
    pub snapshot: RowSnapshot,
    pub predicates: Vec<KnownPredicate>,
    /// The combined-fetch query text, kept for bug reports.
    pub fetch_query: String,
}

/// The query projecting `fetch_columns ++ predicates` over the row source.
pub fn combined_fetch_query(
    fetch_columns: &[Expr],
    predicates: &[Expr],
    source: &RowSource,
    order_by: &[Expr],
) -> Select {
    Select {
        distinct: false,
        fetch_columns: fetch_columns.iter().chain(predicates).cloned().collect(),
        from: source.from.clone(),
        joins: source.joins.clone(),
        where_clause: None,
        order_by: order_by.to_vec(),
    }
}

impl EvaluationTable {
    /// Materializes the table with a single round trip.
    ///
    /// Execution errors are classified against `expected`. A returned
    /// tri-state cell other than `true`, `false` or NULL, or a row of the
    /// wrong arity, is an oracle defect.
    pub fn fetch<C, R>(
        client: &mut C,
        renderer: &R,
        expected: &ExpectedErrors,
        fetch_columns: &[Expr],
        predicates: Vec<Expr>,
        source: &RowSource,
        order_by: &[Expr],
    ) -> Result<Self, OracleError>
    where
        C: DatabaseClient + ?Sized,
        R: SqlRenderer + ?Sized,
    {
        let select = combined_fetch_query(fetch_columns, &predicates, source, order_by);
        let fetch_query = renderer.render_select(&select);
        let result = query_classified(client, expected, &fetch_query)?;
        let table = Self::from_result(result, fetch_columns.len(), predicates, fetch_query)?;
        debug!(
            rows = table.snapshot.len(),
            predicates = table.predicates.len(),
            "materialized evaluation table"
        );
        Ok(table)
    }

    /// Splits each result row positionally into fetch values and truth
    /// values.
    pub fn from_result(
        result: QueryResult,
        fetch_width: usize,
        predicates: Vec<Expr>,
        fetch_query: String,
    ) -> Result<Self, OracleError> {
        let arity = fetch_width + predicates.len();
        let mut truths: Vec<TruthVector> = predicates
            .iter()
            .map(|_| TruthVector::with_capacity(result.rows.len()))
            .collect();
        let mut rows = Vec::with_capacity(result.rows.len());

        for (index, mut row) in result.rows.into_iter().enumerate() {
            if row.len() != arity {
                return Err(OracleError::Defect(format!(
                    "row {index} has {} values, expected {arity}",
                    row.len()
                )));
            }
            let truth_cells = row.split_off(fetch_width);
            for (predicate, cell) in truth_cells.iter().enumerate() {
                let value = Ternary::from_sql_text(cell.as_deref()).map_err(|text| {
                    OracleError::Defect(format!(
                        "predicate {predicate} evaluated to non-boolean `{text}` at row {index}"
                    ))
                })?;
                truths[predicate].push(value);
            }
            rows.push(row);
        }

        Ok(Self {
            snapshot: RowSnapshot::new(rows),
            predicates: predicates
                .into_iter()
                .zip(truths)
                .map(|(expression, truth)| KnownPredicate::new(expression, truth))
                .collect(),
            fetch_query,
        })
    }
}
