//! SQL three-valued logic.
//!
//! `Unknown` is what a comparison involving NULL evaluates to. It is a
//! first-class value: AND/OR/NOT propagate it per the SQL truth tables and
//! it is never collapsed into `false` except by a WHERE clause, which keeps
//! only strictly `True` rows.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ternary {
    True,
    False,
    Unknown,
}

impl Ternary {
    pub const ALL: [Ternary; 3] = [Ternary::True, Ternary::False, Ternary::Unknown];

    /// `True ↔ False`, `Unknown → Unknown`.
    pub const fn not(self) -> Self {
        match self {
            Ternary::True => Ternary::False,
            Ternary::False => Ternary::True,
            Ternary::Unknown => Ternary::Unknown,
        }
    }

    /// `False` dominates, then `Unknown`.
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Ternary::False, _) | (_, Ternary::False) => Ternary::False,
            (Ternary::True, Ternary::True) => Ternary::True,
            _ => Ternary::Unknown,
        }
    }

    /// `True` dominates, then `Unknown`.
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Ternary::True, _) | (_, Ternary::True) => Ternary::True,
            (Ternary::False, Ternary::False) => Ternary::False,
            _ => Ternary::Unknown,
        }
    }

    /// Whether a WHERE clause keeps a row with this value.
    pub const fn is_true(self) -> bool {
        matches!(self, Ternary::True)
    }

    /// Maps a driver's textual boolean to a ternary value.
    ///
    /// `"true"`/`"false"` map to their values and NULL maps to `Unknown`.
    /// Any other text is returned back as the error.
    pub fn from_sql_text(value: Option<&str>) -> Result<Self, String> {
        match value {
            None => Ok(Ternary::Unknown),
            Some("true") => Ok(Ternary::True),
            Some("false") => Ok(Ternary::False),
            Some(other) => Err(other.to_string()),
        }
    }
}

impl From<Option<bool>> for Ternary {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Ternary::True,
            Some(false) => Ternary::False,
            None => Ternary::Unknown,
        }
    }
}

impl Not for Ternary {
    type Output = Ternary;

    fn not(self) -> Ternary {
        Ternary::not(self)
    }
}

impl BitAnd for Ternary {
    type Output = Ternary;

    fn bitand(self, rhs: Ternary) -> Ternary {
        self.and(rhs)
    }
}

impl BitOr for Ternary {
    type Output = Ternary;

    fn bitor(self, rhs: Ternary) -> Ternary {
        self.or(rhs)
    }
}

impl fmt::Display for Ternary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ternary::True => "TRUE",
            Ternary::False => "FALSE",
            Ternary::Unknown => "UNKNOWN",
        })
    }
}

/// Per-row truth values of one predicate over a row snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TruthVector(Vec<Ternary>);

impl TruthVector {
    pub fn new(values: Vec<Ternary>) -> Self {
        Self(values)
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self(Vec::with_capacity(rows))
    }

    pub fn push(&mut self, value: Ternary) {
        self.0.push(value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Ternary] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Ternary> + '_ {
        self.0.iter().copied()
    }

    /// Number of rows a WHERE clause with this predicate keeps.
    pub fn count_true(&self) -> usize {
        self.0.iter().filter(|v| v.is_true()).count()
    }

    /// Elementwise NOT.
    pub fn negated(&self) -> Self {
        Self(self.0.iter().map(|v| v.not()).collect())
    }

    /// Elementwise combination of two vectors of equal length.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ: both vectors must come from the same
    /// row snapshot.
    pub fn zip_with(&self, other: &Self, op: impl Fn(Ternary, Ternary) -> Ternary) -> Self {
        assert_eq!(
            self.len(),
            other.len(),
            "truth vectors from different snapshots cannot be combined"
        );
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(l, r)| op(*l, *r))
                .collect(),
        )
    }
}

impl From<Vec<Ternary>> for TruthVector {
    fn from(values: Vec<Ternary>) -> Self {
        Self(values)
    }
}

impl FromIterator<Ternary> for TruthVector {
    fn from_iter<I: IntoIterator<Item = Ternary>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
