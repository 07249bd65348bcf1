//! Expected-result projection.
//!
//! Both variants are pure functions of a snapshot and a truth vector: a
//! row is part of the expected result iff its truth value is exactly
//! `True`, mirroring `WHERE`.

use std::collections::HashSet;

use crate::client::Row;
use crate::error::OracleError;
use crate::evaluation::RowSnapshot;
use crate::ternary::TruthVector;

/// Which fetch-column values make up an output row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    FullRow,
    FirstColumn,
}

impl Projection {
    fn apply(self, row: &Row) -> Row {
        match self {
            Projection::FullRow => row.clone(),
            Projection::FirstColumn => row.iter().take(1).cloned().collect(),
        }
    }
}

fn check_lengths(snapshot: &RowSnapshot, truth: &TruthVector) -> Result<(), OracleError> {
    if snapshot.len() == truth.len() {
        Ok(())
    } else {
        Err(OracleError::Defect(format!(
            "truth vector has {} values for a snapshot of {} rows",
            truth.len(),
            snapshot.len()
        )))
    }
}

/// Rows whose truth value is `True`, in snapshot order, duplicates kept.
pub fn project_ordered(
    snapshot: &RowSnapshot,
    truth: &TruthVector,
    projection: Projection,
) -> Result<Vec<Row>, OracleError> {
    check_lengths(snapshot, truth)?;
    Ok(snapshot
        .rows()
        .iter()
        .zip(truth.iter())
        .filter(|(_, value)| value.is_true())
        .map(|(row, _)| projection.apply(row))
        .collect())
}

/// Like [`project_ordered`], collapsing rows identical across all fetch
/// columns (NULL included) to their first appearance.
///
/// Identity is decided on the full row even when only the first column is
/// emitted, matching `SELECT DISTINCT` over every fetch column.
pub fn project_distinct(
    snapshot: &RowSnapshot,
    truth: &TruthVector,
    projection: Projection,
) -> Result<Vec<Row>, OracleError> {
    check_lengths(snapshot, truth)?;
    let mut seen: HashSet<&Row> = HashSet::new();
    Ok(snapshot
        .rows()
        .iter()
        .zip(truth.iter())
        .filter(|(row, value)| value.is_true() && seen.insert(*row))
        .map(|(row, _)| projection.apply(row))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ternary::Ternary;
    use crate::ternary::Ternary::{False as F, True as T, Unknown as U};
    use proptest::prelude::*;

    fn snapshot(values: &[Option<&str>]) -> RowSnapshot {
        RowSnapshot::new(
            values
                .iter()
                .map(|v| vec![v.map(str::to_string)])
                .collect(),
        )
    }

    fn flat(rows: Vec<Row>) -> Vec<Option<String>> {
        rows.into_iter().flatten().collect()
    }

    #[test]
    fn ordered_scenario() {
        let snapshot = snapshot(&[Some("a"), Some("b"), Some("c")]);
        let truth = TruthVector::new(vec![T, U, T]);
        let rows = project_ordered(&snapshot, &truth, Projection::FullRow).unwrap();
        assert_eq!(flat(rows), [Some("a".to_string()), Some("c".to_string())]);
    }

    #[test]
    fn distinct_scenario() {
        let snapshot = snapshot(&[Some("x"), Some("x"), Some("y")]);
        let truth = TruthVector::new(vec![T, T, T]);
        let rows = project_distinct(&snapshot, &truth, Projection::FullRow).unwrap();
        assert_eq!(flat(rows), [Some("x".to_string()), Some("y".to_string())]);
    }

    #[test]
    fn distinct_treats_null_as_a_value() {
        let snapshot = snapshot(&[None, None, Some("NULL")]);
        let truth = TruthVector::new(vec![T, T, T]);
        let rows = project_distinct(&snapshot, &truth, Projection::FullRow).unwrap();
        assert_eq!(flat(rows), [None, Some("NULL".to_string())]);
    }

    #[test]
    fn distinct_identity_uses_every_column() {
        let snapshot = RowSnapshot::new(vec![
            vec![Some("x".into()), Some("1".into())],
            vec![Some("x".into()), Some("2".into())],
            vec![Some("x".into()), Some("1".into())],
        ]);
        let truth = TruthVector::new(vec![T, T, T]);
        let rows = project_distinct(&snapshot, &truth, Projection::FirstColumn).unwrap();
        assert_eq!(flat(rows), [Some("x".to_string()), Some("x".to_string())]);
    }

    #[test]
    fn length_mismatch_is_a_defect() {
        let snapshot = snapshot(&[Some("a")]);
        let truth = TruthVector::new(vec![T, F]);
        assert!(matches!(
            project_ordered(&snapshot, &truth, Projection::FullRow),
            Err(OracleError::Defect(_))
        ));
        assert!(matches!(
            project_distinct(&snapshot, &truth, Projection::FullRow),
            Err(OracleError::Defect(_))
        ));
    }

    fn ternary() -> impl Strategy<Value = Ternary> {
        prop_oneof![Just(T), Just(F), Just(U)]
    }

    proptest! {
        #[test]
        fn ordered_emits_exactly_the_true_rows(
            cells in prop::collection::vec((prop::option::of("[a-c]"), ternary()), 0..40),
        ) {
            let (values, truth): (Vec<Option<String>>, Vec<Ternary>) = cells.into_iter().unzip();
            let snapshot = RowSnapshot::new(values.iter().cloned().map(|v| vec![v]).collect());
            let truth = TruthVector::new(truth);

            let rows = project_ordered(&snapshot, &truth, Projection::FullRow).unwrap();
            prop_assert_eq!(rows.len(), truth.count_true());

            let expected: Vec<Row> = values
                .into_iter()
                .zip(truth.iter())
                .filter(|(_, t)| t.is_true())
                .map(|(v, _)| vec![v])
                .collect();
            prop_assert_eq!(rows, expected);
        }

        #[test]
        fn distinct_is_a_duplicate_free_subset_of_ordered(
            cells in prop::collection::vec((prop::option::of("[a-c]"), ternary()), 0..40),
        ) {
            let (values, truth): (Vec<Option<String>>, Vec<Ternary>) = cells.into_iter().unzip();
            let snapshot = RowSnapshot::new(values.into_iter().map(|v| vec![v]).collect());
            let truth = TruthVector::new(truth);

            let ordered = project_ordered(&snapshot, &truth, Projection::FullRow).unwrap();
            let distinct = project_distinct(&snapshot, &truth, Projection::FullRow).unwrap();
            let unique: HashSet<&Row> = ordered.iter().collect();
            prop_assert_eq!(distinct.len(), unique.len());
            prop_assert!(distinct.iter().all(|row| unique.contains(row)));
        }
    }
}
