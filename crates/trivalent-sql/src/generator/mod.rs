//! Random generators for predicates, row sources and mutation statements.

pub mod expression;
pub mod join;
pub mod statement;

pub use expression::{ExpressionGenerator, GeneratorOptions, RandomExpressionGenerator};
pub use join::{RowSource, generate_row_source};
pub use statement::{Action, StatementGenerator, WorkloadOptions};
