//! Allowlist of benign engine error messages.

use tracing::{trace, warn};

use crate::client::{DatabaseClient, QueryResult};
use crate::error::{InconclusiveReason, OracleError};

/// Substrings marking an engine error as expected.
///
/// Backends contribute their own lists; the oracle only asks
/// [`ExpectedErrors::is_expected`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedErrors {
    substrings: Vec<String>,
}

impl ExpectedErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an allowlist from string slices.
    pub fn from_substrings<I, S>(substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            substrings: substrings.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add(&mut self, substring: impl Into<String>) -> &mut Self {
        self.substrings.push(substring.into());
        self
    }

    /// Appends every substring of `other`.
    pub fn extend(&mut self, other: &ExpectedErrors) -> &mut Self {
        self.substrings.extend(other.substrings.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }

    /// True iff any registered substring occurs in `message`.
    pub fn is_expected(&self, message: &str) -> bool {
        self.substrings.iter().any(|s| message.contains(s.as_str()))
    }
}

/// Runs a query at a classified boundary.
///
/// A missing result handle or a benign error abandons the check as
/// inconclusive; any other error is surfaced as unexpected.
pub(crate) fn query_classified<C: DatabaseClient + ?Sized>(
    client: &mut C,
    expected: &ExpectedErrors,
    sql: &str,
) -> Result<QueryResult, OracleError> {
    trace!(engine = client.name(), sql, "executing query");
    match client.query(sql) {
        Ok(Some(result)) => Ok(result),
        Ok(None) => Err(OracleError::Inconclusive(
            InconclusiveReason::NoResultHandle {
                query: sql.to_string(),
            },
        )),
        Err(e) if expected.is_expected(&e.message) => {
            trace!(error = %e, "expected error");
            Err(OracleError::Inconclusive(InconclusiveReason::ExpectedError {
                query: sql.to_string(),
                message: e.message,
            }))
        }
        Err(e) => {
            warn!(engine = client.name(), sql, error = %e, "unexpected error");
            Err(OracleError::UnexpectedError {
                query: sql.to_string(),
                message: e.message,
            })
        }
    }
}
