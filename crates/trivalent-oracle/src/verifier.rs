//! Result verification: actual rows against derived expected rows.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::client::Row;

/// How two result sets are considered equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonPolicy {
    /// Same rows in the same order (the query asserted an ordering).
    Ordered,
    /// Same rows with the same multiplicities, order ignored.
    Multiset,
    /// Same distinct rows; the actual result must itself be duplicate-free.
    Set,
}

impl ComparisonPolicy {
    /// The policy implied by a query's `DISTINCT` flag and ordering.
    pub fn for_query(distinct: bool, ordered: bool) -> Self {
        match (distinct, ordered) {
            (true, _) => ComparisonPolicy::Set,
            (false, true) => ComparisonPolicy::Ordered,
            (false, false) => ComparisonPolicy::Multiset,
        }
    }
}

/// Compares the rows the engine returned with the expected rows.
///
/// # Returns
///
/// - `Ok(())` if the results are equivalent under `policy`
/// - `Err(ResultMismatch)` describing the first divergence found
pub fn compare_rows(
    expected: &[Row],
    actual: &[Row],
    policy: ComparisonPolicy,
) -> Result<(), ResultMismatch> {
    if expected.len() != actual.len() {
        return Err(ResultMismatch::RowCountMismatch {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    match policy {
        ComparisonPolicy::Ordered => {
            for (row_index, (e, a)) in expected.iter().zip(actual).enumerate() {
                if e.len() != a.len() {
                    return Err(ResultMismatch::RowValueCountMismatch {
                        row_index,
                        expected: e.len(),
                        actual: a.len(),
                    });
                }
                if e != a {
                    return Err(ResultMismatch::RowMismatch {
                        row_index,
                        expected: format!("{e:?}"),
                        actual: format!("{a:?}"),
                    });
                }
            }
            Ok(())
        }
        ComparisonPolicy::Multiset => {
            let mut counts: BTreeMap<&Row, i64> = BTreeMap::new();
            for row in expected {
                *counts.entry(row).or_default() += 1;
            }
            for row in actual {
                *counts.entry(row).or_default() -= 1;
            }
            let missing = rows_with(&counts, |c| c > 0);
            let unexpected = rows_with(&counts, |c| c < 0);
            if missing.is_empty() && unexpected.is_empty() {
                Ok(())
            } else {
                Err(ResultMismatch::MultisetMismatch {
                    missing,
                    unexpected,
                })
            }
        }
        ComparisonPolicy::Set => {
            let expected: HashSet<&Row> = expected.iter().collect();
            let actual: HashSet<&Row> = actual.iter().collect();
            if expected == actual {
                return Ok(());
            }
            let mut missing: Vec<Row> = expected.difference(&actual).map(|r| (*r).clone()).collect();
            let mut unexpected: Vec<Row> =
                actual.difference(&expected).map(|r| (*r).clone()).collect();
            missing.sort();
            unexpected.sort();
            Err(ResultMismatch::SetMismatch {
                missing,
                unexpected,
            })
        }
    }
}

fn rows_with(counts: &BTreeMap<&Row, i64>, keep: impl Fn(i64) -> bool) -> Vec<Row> {
    counts
        .iter()
        .filter(|(_, c)| keep(**c))
        .map(|(row, _)| (*row).clone())
        .collect()
}

/// Describes a mismatch between expected and actual rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultMismatch {
    /// Row counts don't match.
    RowCountMismatch { expected: usize, actual: usize },

    /// The same row position has a different number of values.
    RowValueCountMismatch {
        row_index: usize,
        expected: usize,
        actual: usize,
    },

    /// Rows at the same position differ (ordered comparison).
    RowMismatch {
        row_index: usize,
        expected: String,
        actual: String,
    },

    /// Row multiplicities differ (unordered comparison).
    MultisetMismatch {
        missing: Vec<Row>,
        unexpected: Vec<Row>,
    },

    /// Distinct row sets differ.
    SetMismatch {
        missing: Vec<Row>,
        unexpected: Vec<Row>,
    },
}

impl fmt::Display for ResultMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultMismatch::RowCountMismatch { expected, actual } => {
                write!(f, "Row count mismatch: expected={expected}, actual={actual}")
            }
            ResultMismatch::RowValueCountMismatch {
                row_index,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Row value count mismatch at row {row_index}: expected={expected}, actual={actual}"
                )
            }
            ResultMismatch::RowMismatch {
                row_index,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Row mismatch at row {row_index}: expected={expected}, actual={actual}"
                )
            }
            ResultMismatch::MultisetMismatch {
                missing,
                unexpected,
            } => {
                write!(
                    f,
                    "Multiset mismatch: missing={missing:?}, unexpected={unexpected:?}"
                )
            }
            ResultMismatch::SetMismatch {
                missing,
                unexpected,
            } => {
                write!(
                    f,
                    "Set mismatch: missing={missing:?}, unexpected={unexpected:?}"
                )
            }
        }
    }
}

impl std::error::Error for ResultMismatch {}
