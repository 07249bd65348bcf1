//! Seeded randomness for query synthesis.
//!
//! Every random decision made while generating schemas, predicates and
//! compound predicates goes through a [`SqlRng`]. The generator is
//! ChaCha8-based so a run is replayable from its seed on every platform.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Probability used for "rather low probability" decisions (1 in 10).
pub const RATHER_LOW_PROBABILITY: f64 = 0.1;

/// Probability used for "small probability" decisions (1 in 100).
pub const SMALL_PROBABILITY: f64 = 0.01;

/// Deterministic random source threaded through all generators.
#[derive(Debug, Clone)]
pub struct SqlRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl SqlRng {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Derives an independent generator for a worker or sub-task.
    ///
    /// The derived seed depends only on the parent seed and `stream`, so
    /// worker `n` of seed `s` always sees the same sequence.
    pub fn fork(&self, stream: u64) -> Self {
        let mixed = self
            .seed
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .rotate_left(17)
            ^ stream.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        Self::new(mixed)
    }

    /// Returns the seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fair coin flip.
    pub fn next_bool(&mut self) -> bool {
        self.inner.gen_bool(0.5)
    }

    /// Returns `true` with probability `p`, clamped to `[0, 1]`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.inner.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Returns `true` with a rather low probability.
    pub fn rather_low_probability(&mut self) -> bool {
        self.chance(RATHER_LOW_PROBABILITY)
    }

    /// Returns `true` with a small probability.
    pub fn small_probability(&mut self) -> bool {
        self.chance(SMALL_PROBABILITY)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn next_usize(&mut self, len: usize) -> usize {
        assert!(len > 0, "next_usize requires a non-empty range");
        self.inner.gen_range(0..len)
    }

    /// Uniform integer in `low..=high`.
    pub fn next_i64_inclusive(&mut self, low: i64, high: i64) -> i64 {
        self.inner.gen_range(low..=high)
    }

    /// Picks one element uniformly, `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// Picks one of the given options; panics on an empty slice.
    pub fn pick<T: Copy>(&mut self, options: &[T]) -> T {
        options[self.next_usize(options.len())]
    }

    /// Returns a random non-empty subset, preserving the input order.
    ///
    /// Returns an empty vector only when `items` is empty.
    pub fn non_empty_subset<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        if items.is_empty() {
            return Vec::new();
        }
        let keep = 1 + self.next_usize(items.len());
        let mut indexes: Vec<usize> = (0..items.len()).collect();
        indexes.shuffle(&mut self.inner);
        indexes.truncate(keep);
        indexes.sort_unstable();
        indexes.into_iter().map(|i| items[i].clone()).collect()
    }

    /// Random string over `alphabet` with length in `0..=max_len`.
    pub fn string_from(&mut self, alphabet: &[char], max_len: usize) -> String {
        let len = self.inner.gen_range(0..=max_len);
        (0..len).map(|_| self.pick(alphabet)).collect()
    }
}
