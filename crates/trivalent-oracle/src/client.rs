//! Boundary to the engine under test.

use trivalent_sql::Schema;

/// A result row: nullable textual cell values, in projection order.
pub type Row = Vec<Option<String>>;

/// Rows returned by a query, each cell rendered as text by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

/// Raw engine failure, surfaced uninterpreted.
///
/// Classification into "expected" and "unexpected" happens in the oracle,
/// never in the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DatabaseError {
    pub message: String,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes SQL against a database engine.
///
/// One client serves one in-flight statement at a time; concurrent checks
/// each own their client.
pub trait DatabaseClient {
    /// Executes a query and returns its rows.
    ///
    /// `Ok(None)` means the engine produced no result handle; the caller
    /// abandons the current check as inconclusive.
    fn query(&mut self, sql: &str) -> Result<Option<QueryResult>, DatabaseError>;

    /// Executes a statement without a result set (DDL/DML), returning the
    /// number of affected rows where the engine reports one.
    fn execute_statement(&mut self, sql: &str) -> Result<usize, DatabaseError>;

    /// Frees prepared statements the driver keeps cached.
    ///
    /// Engines that hold statement resources until the connection closes
    /// implement this; the default does nothing.
    fn release_cached_statements(&mut self) -> Result<(), DatabaseError> {
        Ok(())
    }

    /// Name of the engine (for logging).
    fn name(&self) -> &'static str;
}

/// Reads the live schema of the database behind a client.
pub trait SchemaReader {
    fn read_schema(&mut self) -> Result<Schema, DatabaseError>;
}
