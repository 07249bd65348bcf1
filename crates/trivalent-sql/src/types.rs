//! Column data types and literal constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SqlError;

/// Column data types the generators understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Varchar,
    Boolean,
}

impl DataType {
    pub const ALL: [DataType; 3] = [DataType::Integer, DataType::Varchar, DataType::Boolean];

    /// The SQL type name used in DDL.
    pub fn sql_name(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Varchar => "VARCHAR",
            DataType::Boolean => "BOOLEAN",
        }
    }

    /// Maps an engine-reported type name back to a [`DataType`].
    ///
    /// Accepts the common aliases engines report in their catalogs
    /// (`INT`, `INT4`, `TEXT`, `BOOL`, ...).
    pub fn from_sql_name(name: &str) -> Result<Self, SqlError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "INTEGER" | "INT" | "INT4" | "SIGNED" => Ok(DataType::Integer),
            "VARCHAR" | "TEXT" | "STRING" | "CHAR" | "BPCHAR" => Ok(DataType::Varchar),
            "BOOLEAN" | "BOOL" | "LOGICAL" => Ok(DataType::Boolean),
            other => Err(SqlError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A literal value in an expression.
///
/// NULL literals carry their type so engines never have to infer the type
/// of a bare `NULL` operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Null(DataType),
    Integer(i64),
    Varchar(String),
    Boolean(bool),
}

impl Constant {
    pub fn data_type(&self) -> DataType {
        match self {
            Constant::Null(data_type) => *data_type,
            Constant::Integer(_) => DataType::Integer,
            Constant::Varchar(_) => DataType::Varchar,
            Constant::Boolean(_) => DataType::Boolean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("INTEGER" => DataType::Integer; "integer")]
    #[test_case("int4" => DataType::Integer; "int4 lowercase")]
    #[test_case("VARCHAR" => DataType::Varchar; "varchar")]
    #[test_case(" text " => DataType::Varchar; "padded text")]
    #[test_case("BOOLEAN" => DataType::Boolean; "boolean")]
    fn parses_engine_type_names(name: &str) -> DataType {
        DataType::from_sql_name(name).expect("known type")
    }

    #[test]
    fn rejects_unknown_type_names() {
        let err = DataType::from_sql_name("GEOMETRY").unwrap_err();
        assert!(matches!(err, SqlError::UnsupportedType(ref t) if t == "GEOMETRY"));
    }

    #[test]
    fn sql_name_round_trips() {
        for ty in DataType::ALL {
            assert_eq!(DataType::from_sql_name(ty.sql_name()).unwrap(), ty);
        }
    }
}
