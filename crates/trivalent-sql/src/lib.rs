//! # trivalent-sql: SQL model and generators for Trivalent
//!
//! This crate holds everything dialect-facing that the predicate-combining
//! oracle consumes but never inspects:
//!
//! - [`Expr`] / [`Select`]: closed expression and query trees
//! - [`SqlRenderer`]: turns trees into dialect SQL text ([`AnsiRenderer`])
//! - [`ExpressionGenerator`]: typed random boolean predicates
//! - [`StatementGenerator`]: CREATE TABLE / INSERT / UPDATE / DELETE /
//!   CREATE INDEX / CREATE VIEW text for populating a database under test
//! - [`SqlRng`]: the seeded random source threaded through all of the above
//!
//! ## Usage
//!
//! ```
//! use trivalent_sql::{
//!     AnsiRenderer, Column, DataType, ExpressionGenerator, RandomExpressionGenerator,
//!     SqlRenderer, SqlRng,
//! };
//!
//! let columns = vec![Column::new("t0", "c0", DataType::Integer)];
//! let mut rng = SqlRng::new(42);
//! let mut generator = RandomExpressionGenerator::default();
//!
//! let predicate = generator.generate_predicate(&mut rng, &columns);
//! let sql = AnsiRenderer.render_expr(&predicate);
//! assert!(!sql.is_empty());
//! ```

mod ast;
mod error;
pub mod generator;
mod render;
mod rng;
mod schema;
mod types;

pub use ast::{
    ArithmeticOperator, ColumnRef, ComparisonOperator, Expr, Join, JoinKind, LogicalOperator,
    PostfixOperator, Select, TableRef, UnaryOperator,
};
pub use error::SqlError;
pub use generator::{
    Action, ExpressionGenerator, GeneratorOptions, RandomExpressionGenerator, RowSource,
    StatementGenerator, WorkloadOptions, generate_row_source,
};
pub use render::{AnsiRenderer, SqlRenderer};
pub use rng::SqlRng;
pub use schema::{Column, Schema, Table, TableSet};
pub use types::{Constant, DataType};
