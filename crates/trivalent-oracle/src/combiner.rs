//! Depth-bounded random combination of known predicates.

use trivalent_sql::{ExpressionGenerator, LogicalOperator, SqlRng};

use crate::predicate::{KnownPredicate, LeafSelection, PredicatePool};

/// Builds one compound predicate out of a pool of known predicates.
#[derive(Debug, Clone, Copy)]
pub struct PredicateCombiner {
    max_depth: usize,
    leaf_probability: f64,
    leaf_selection: LeafSelection,
}

impl PredicateCombiner {
    pub fn new(max_depth: usize, leaf_probability: f64, leaf_selection: LeafSelection) -> Self {
        Self {
            max_depth,
            leaf_probability,
            leaf_selection,
        }
    }

    /// Returns a compound predicate whose leaves are pool members.
    ///
    /// At depth `max_depth` a leaf is returned unconditionally, so the tree
    /// has at most `2^max_depth - 1` AND/OR nodes. Returns `None` only for
    /// an empty pool.
    pub fn combine<G: ExpressionGenerator + ?Sized>(
        &self,
        rng: &mut SqlRng,
        generator: &G,
        pool: &PredicatePool,
    ) -> Option<KnownPredicate> {
        self.combine_at(rng, generator, pool, 0)
    }

    fn combine_at<G: ExpressionGenerator + ?Sized>(
        &self,
        rng: &mut SqlRng,
        generator: &G,
        pool: &PredicatePool,
        depth: usize,
    ) -> Option<KnownPredicate> {
        if depth >= self.max_depth || rng.chance(self.leaf_probability) {
            return pool.select(rng, self.leaf_selection).cloned();
        }

        let mut left = self.combine_at(rng, generator, pool, depth + 1)?;
        let mut right = self.combine_at(rng, generator, pool, depth + 1)?;
        if rng.next_bool() {
            left = left.negate(generator);
        }
        if rng.next_bool() {
            right = right.negate(generator);
        }
        let op = if rng.next_bool() {
            LogicalOperator::And
        } else {
            LogicalOperator::Or
        };
        Some(KnownPredicate::combine(left, right, op))
    }
}
