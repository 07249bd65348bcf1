//! # trivalent-oracle: Predicate-combining logic-bug oracle
//!
//! This crate finds logic bugs in SQL engines by predicting the result of a
//! query from first principles and comparing it with what the engine
//! returns. It follows SQLancer's predicate-combining approach.
//!
//! ## Algorithm
//!
//! 1. **Generate** N independent boolean predicates over a random set of
//!    tables.
//! 2. **Fetch** once: `SELECT fetch_columns, p1, ..., pN FROM ...`. The
//!    engine itself evaluates every predicate on every row, giving a
//!    per-row three-valued [`TruthVector`] per predicate.
//! 3. **Combine** predicates recursively with NOT/AND/OR. The compound
//!    expression and its truth vector are built in lockstep using
//!    [`Ternary`] logic, so the expected truth of the compound predicate
//!    is known without asking the engine.
//! 4. **Project** the rows whose compound truth is exactly `True`.
//! 5. **Verify** against `SELECT [DISTINCT] fetch_columns FROM ... WHERE
//!    compound`.
//!
//! A divergence in step 5 is a [`BugReport`]. Engine errors matching an
//! [`ExpectedErrors`] allowlist make a check inconclusive instead.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trivalent_oracle::{
//!     DuckDbClient, OracleMode, OracleOptions, PredicateCombiningOracle, duckdb::errors,
//! };
//! use trivalent_sql::{AnsiRenderer, RandomExpressionGenerator, SqlRng};
//!
//! let mut client = DuckDbClient::open_in_memory()?;
//! // ... populate tables ...
//!
//! let mut oracle = PredicateCombiningOracle::new(
//!     OracleOptions::default(),
//!     RandomExpressionGenerator::default(),
//!     AnsiRenderer,
//!     errors::oracle_errors(),
//! );
//! let mut rng = SqlRng::new(42);
//! let outcome = oracle.check(&mut client, OracleMode::Where, &mut rng)?;
//! println!("{outcome:?}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## References
//!
//! - SQLancer: "Detecting Logic Bugs in DBMS" (Rigger & Su, 2020)
//! - "Finding Bugs in Database Systems via Query Partitioning" (TLP)

mod client;
mod combiner;
pub mod duckdb;
mod error;
mod evaluation;
mod expected_errors;
mod oracle;
mod predicate;
mod projector;
mod ternary;
mod verifier;

pub use client::{DatabaseClient, DatabaseError, QueryResult, Row, SchemaReader};
pub use combiner::PredicateCombiner;
pub use self::duckdb::DuckDbClient;
pub use error::{BugReport, InconclusiveReason, OracleError};
pub use evaluation::{EvaluationTable, RowSnapshot, combined_fetch_query};
pub use expected_errors::ExpectedErrors;
pub use oracle::{CheckOutcome, OracleMode, OracleOptions, OracleStats, PredicateCombiningOracle};
pub use predicate::{KnownPredicate, LeafSelection, PredicatePool};
pub use projector::{Projection, project_distinct, project_ordered};
pub use ternary::{Ternary, TruthVector};
pub use verifier::{ComparisonPolicy, ResultMismatch, compare_rows};
