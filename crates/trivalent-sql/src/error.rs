//! Error types for the SQL model.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlError {
    /// The engine reported a column type the generators cannot produce.
    #[error("unsupported column type: {0}")]
    UnsupportedType(String),
}
