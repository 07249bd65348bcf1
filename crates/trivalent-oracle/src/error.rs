//! Oracle outcome taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::{DatabaseError, Row};
use crate::verifier::ResultMismatch;

/// Why a check was abandoned without a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InconclusiveReason {
    /// The schema has no table with at least one column.
    EmptySchema,
    /// The engine produced no result handle for a query.
    NoResultHandle { query: String },
    /// The engine raised an error registered as benign.
    ExpectedError { query: String, message: String },
}

impl fmt::Display for InconclusiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconclusiveReason::EmptySchema => write!(f, "schema has no usable table"),
            InconclusiveReason::NoResultHandle { query } => {
                write!(f, "no result handle for query: {query}")
            }
            InconclusiveReason::ExpectedError { message, .. } => {
                write!(f, "expected error: {message}")
            }
        }
    }
}

/// Reproduction bundle for a found logic bug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReport {
    /// Seed of the random source the check ran with.
    pub seed: u64,
    /// The verification query whose result diverged.
    pub query: String,
    /// The combined-fetch query that produced the ground truth.
    pub fetch_query: String,
    /// Every generated predicate, rendered.
    pub predicates: Vec<String>,
    /// The compound predicate used as `WHERE`.
    pub combined_predicate: String,
    pub expected: Vec<Row>,
    pub actual: Vec<Row>,
    pub mismatch: String,
}

impl fmt::Display for BugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "logic bug: {}", self.mismatch)?;
        writeln!(f, "  seed: {}", self.seed)?;
        writeln!(f, "  query: {}", self.query)?;
        writeln!(f, "  fetch query: {}", self.fetch_query)?;
        writeln!(f, "  combined predicate: {}", self.combined_predicate)?;
        writeln!(f, "  predicates:")?;
        for predicate in &self.predicates {
            writeln!(f, "    {predicate}")?;
        }
        writeln!(f, "  expected ({} rows): {:?}", self.expected.len(), self.expected)?;
        write!(f, "  actual ({} rows): {:?}", self.actual.len(), self.actual)
    }
}

impl BugReport {
    pub(crate) fn with_mismatch(mut self, mismatch: &ResultMismatch) -> Self {
        self.mismatch = mismatch.to_string();
        self
    }
}

/// Errors that end an oracle check.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The check was abandoned without a verdict; the driver retries.
    #[error("inconclusive: {0}")]
    Inconclusive(InconclusiveReason),

    /// The engine returned a result that differs from the derived one.
    #[error("{0}")]
    LogicBug(Box<BugReport>),

    /// The oracle or generator itself is broken (malformed tri-state value,
    /// arity or length mismatch).
    #[error("oracle defect: {0}")]
    Defect(String),

    /// The engine rejected a query with an error not registered as benign.
    #[error("unexpected error for query `{query}`: {message}")]
    UnexpectedError { query: String, message: String },

    /// Database access outside the classified fetch/verify boundaries
    /// (schema reads, statement cache release).
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}

impl OracleError {
    /// Whether the driver must stop: everything but an inconclusive check.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, OracleError::Inconclusive(_))
    }
}
