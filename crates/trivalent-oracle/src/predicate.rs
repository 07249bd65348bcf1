//! Predicates paired with their ground-truth evaluation.

use serde::{Deserialize, Serialize};
use trivalent_sql::{Expr, ExpressionGenerator, LogicalOperator, SqlRng};

use crate::ternary::{Ternary, TruthVector};

/// A boolean expression and its per-row truth over the current snapshot.
///
/// Negation and combination always transform the expression and the truth
/// vector together.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownPredicate {
    pub expression: Expr,
    pub truth: TruthVector,
}

impl KnownPredicate {
    pub fn new(expression: Expr, truth: TruthVector) -> Self {
        Self { expression, truth }
    }

    /// Syntactic negation via the generator, semantic negation elementwise.
    pub fn negate<G: ExpressionGenerator + ?Sized>(&self, generator: &G) -> Self {
        Self {
            expression: generator.negate(self.expression.clone()),
            truth: self.truth.negated(),
        }
    }

    /// Combines two predicates under AND or OR.
    ///
    /// # Panics
    ///
    /// Panics if the truth vectors have different lengths.
    pub fn combine(left: Self, right: Self, op: LogicalOperator) -> Self {
        let truth = match op {
            LogicalOperator::And => left.truth.zip_with(&right.truth, Ternary::and),
            LogicalOperator::Or => left.truth.zip_with(&right.truth, Ternary::or),
        };
        Self {
            expression: Expr::logical(left.expression, op, right.expression),
            truth,
        }
    }
}

/// How the combiner picks a leaf predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeafSelection {
    /// Pick a distinct truth pattern uniformly, then a predicate within it.
    #[default]
    ByPattern,
    /// Pick uniformly over all predicates.
    Uniform,
}

/// The known predicates of one check, grouped by truth-vector pattern.
///
/// Patterns are kept in first-appearance order, never in hash order, so
/// leaf selection is reproducible from the seed.
#[derive(Debug, Clone, Default)]
pub struct PredicatePool {
    predicates: Vec<KnownPredicate>,
    /// Indexes into `predicates`, one group per distinct truth pattern.
    patterns: Vec<Vec<usize>>,
}

impl PredicatePool {
    pub fn new(predicates: Vec<KnownPredicate>) -> Self {
        let mut patterns: Vec<Vec<usize>> = Vec::new();
        for (index, predicate) in predicates.iter().enumerate() {
            match patterns
                .iter_mut()
                .find(|group| predicates[group[0]].truth == predicate.truth)
            {
                Some(group) => group.push(index),
                None => patterns.push(vec![index]),
            }
        }
        Self {
            predicates,
            patterns,
        }
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[KnownPredicate] {
        &self.predicates
    }

    /// Number of distinct truth patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Selects one predicate per the given policy.
    ///
    /// Returns `None` only for an empty pool.
    pub fn select(&self, rng: &mut SqlRng, policy: LeafSelection) -> Option<&KnownPredicate> {
        if self.predicates.is_empty() {
            return None;
        }
        let index = match policy {
            LeafSelection::Uniform => rng.next_usize(self.predicates.len()),
            LeafSelection::ByPattern => {
                let group = &self.patterns[rng.next_usize(self.patterns.len())];
                group[rng.next_usize(group.len())]
            }
        };
        self.predicates.get(index)
    }
}
