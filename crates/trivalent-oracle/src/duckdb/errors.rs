//! DuckDB error catalog.
//!
//! Substrings of DuckDB error messages that signal a rejected statement
//! rather than a wrong answer.

use crate::expected_errors::ExpectedErrors;

/// Errors a well-typed generated expression can still raise at runtime.
pub fn expression_errors() -> ExpectedErrors {
    ExpectedErrors::from_substrings([
        "Out of Range Error",
        "Overflow",
        "Conversion Error",
        "Could not convert string",
        "Invalid Input Error",
    ])
}

/// Transient engine or resource failures.
pub fn unstable_errors() -> ExpectedErrors {
    ExpectedErrors::from_substrings([
        "Out of Memory Error",
        "INTERRUPT Error",
        "Interrupted",
        "IO Error",
    ])
}

/// Constraint violations from INSERT and UPDATE.
pub fn insert_errors() -> ExpectedErrors {
    let mut errors = ExpectedErrors::from_substrings([
        "Constraint Error",
        "Duplicate key",
        "violates primary key constraint",
        "violates unique constraint",
        "NOT NULL constraint failed",
        "over-eager constraint checking",
    ]);
    errors.extend(&expression_errors());
    errors
}

/// Failures creating tables.
pub fn table_errors() -> ExpectedErrors {
    ExpectedErrors::from_substrings([
        "Catalog Error: Table with name",
        "already exists",
    ])
}

/// Failures creating indexes over existing data.
pub fn index_errors() -> ExpectedErrors {
    ExpectedErrors::from_substrings([
        "Constraint Error",
        "contains duplicates",
        "Catalog Error: Index with name",
    ])
}

/// Failures creating views; the view body is bound against live data types.
pub fn view_errors() -> ExpectedErrors {
    let mut errors = insert_errors();
    errors.extend(&unstable_errors());
    errors
}

/// Everything a check may hit at its fetch and verification boundaries.
pub fn oracle_errors() -> ExpectedErrors {
    let mut errors = expression_errors();
    errors.extend(&unstable_errors());
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Out of Range Error: Overflow in addition of INT32 (2147483647 + 1)!" => true)]
    #[test_case("Conversion Error: Could not convert string 'a' to INT32" => true)]
    #[test_case("Binder Error: Referenced column \"c9\" not found" => false)]
    #[test_case("Parser Error: syntax error at or near \"WHERE\"" => false)]
    fn oracle_catalog(message: &str) -> bool {
        oracle_errors().is_expected(message)
    }

    #[test_case("Constraint Error: Duplicate key \"c0: 1\" violates primary key constraint." => true)]
    #[test_case("Constraint Error: NOT NULL constraint failed: t0.c1" => true)]
    #[test_case("Out of Range Error: Overflow in subtraction" => true)]
    #[test_case("Binder Error: table t0 has 2 columns but 3 values were supplied" => false)]
    fn insert_catalog(message: &str) -> bool {
        insert_errors().is_expected(message)
    }

    #[test_case("Out of Range Error: Overflow in addition of INT32" => true)]
    #[test_case("IO Error: could not write file" => true)]
    #[test_case("Catalog Error: View with name v0 already exists" => false)]
    fn view_catalog(message: &str) -> bool {
        view_errors().is_expected(message)
    }

    #[test]
    fn constraint_errors_are_not_benign_for_queries() {
        assert!(!oracle_errors().is_expected("Constraint Error: Duplicate key"));
    }
}
