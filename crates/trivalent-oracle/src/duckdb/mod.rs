//! DuckDB backend.
//!
//! Wraps an embedded DuckDB connection as a [`DatabaseClient`] and a
//! [`SchemaReader`](crate::SchemaReader). Cell values are rendered as text
//! so that booleans come back as `"true"`/`"false"`, which is what the
//! evaluation table expects for predicate columns.

use std::path::Path;

use duckdb::Connection;
use duckdb::types::ValueRef;
use tracing::debug;

use crate::client::{DatabaseClient, DatabaseError, QueryResult, Row};

pub mod errors;
mod schema;

impl From<duckdb::Error> for DatabaseError {
    fn from(e: duckdb::Error) -> Self {
        DatabaseError::new(e.to_string())
    }
}

/// Embedded DuckDB connection under test.
pub struct DuckDbClient {
    conn: Connection,
}

impl std::fmt::Debug for DuckDbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbClient").finish_non_exhaustive()
    }
}

impl DuckDbClient {
    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::new(format!("Failed to open DuckDB: {e}")))?;
        Ok(Self { conn })
    }

    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            DatabaseError::new(format!("Failed to open DuckDB at {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "opened DuckDB database");
        Ok(Self { conn })
    }

    /// Drops every user view and table, leaving an empty database.
    ///
    /// Views go first so none outlives the tables it reads.
    pub fn reset(&mut self) -> Result<(), DatabaseError> {
        let (views, tables): (Vec<(String, String)>, Vec<(String, String)>) = {
            let mut stmt = self.conn.prepare(
                "SELECT table_name, table_type FROM information_schema.tables \
                 WHERE table_schema = 'main'",
            )?;
            let mut rows = stmt.query([])?;
            let mut relations = Vec::new();
            while let Some(row) = rows.next()? {
                relations.push((row.get::<_, String>(0)?, row.get::<_, String>(1)?));
            }
            relations.into_iter().partition(|(_, kind)| kind == "VIEW")
        };
        self.conn.flush_prepared_statement_cache();
        for (view, _) in views {
            self.conn
                .execute(&format!("DROP VIEW IF EXISTS {}", quote_identifier(&view)), [])?;
        }
        for (table, _) in tables {
            self.conn
                .execute(&format!("DROP TABLE IF EXISTS {}", quote_identifier(&table)), [])?;
        }
        Ok(())
    }

    /// Renders a DuckDB value as text; NULL becomes `None`.
    fn value_to_text(value: ValueRef<'_>) -> Option<String> {
        match value {
            ValueRef::Null => None,
            ValueRef::Boolean(b) => Some(if b { "true" } else { "false" }.to_string()),
            ValueRef::TinyInt(i) => Some(i.to_string()),
            ValueRef::SmallInt(i) => Some(i.to_string()),
            ValueRef::Int(i) => Some(i.to_string()),
            ValueRef::BigInt(i) => Some(i.to_string()),
            ValueRef::HugeInt(i) => Some(i.to_string()),
            ValueRef::UTinyInt(i) => Some(i.to_string()),
            ValueRef::USmallInt(i) => Some(i.to_string()),
            ValueRef::UInt(i) => Some(i.to_string()),
            ValueRef::UBigInt(i) => Some(i.to_string()),
            ValueRef::Float(f) => Some(f.to_string()),
            ValueRef::Double(f) => Some(f.to_string()),
            ValueRef::Decimal(d) => Some(d.to_string()),
            ValueRef::Text(s) => Some(String::from_utf8_lossy(s).into_owned()),
            other => Some(format!("{other:?}")),
        }
    }

    /// DDL/DML produce no result handle.
    fn is_statement(sql: &str) -> bool {
        let sql_upper = sql.trim_start().to_uppercase();
        ["CREATE", "INSERT", "UPDATE", "DELETE", "DROP", "ALTER"]
            .iter()
            .any(|keyword| sql_upper.starts_with(keyword))
    }

    fn collect_rows(&self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let column_count = row.as_ref().column_count();
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(Self::value_to_text(row.get_ref(i)?));
            }
            result.push(values);
        }
        Ok(result)
    }
}

impl DatabaseClient for DuckDbClient {
    fn query(&mut self, sql: &str) -> Result<Option<QueryResult>, DatabaseError> {
        if Self::is_statement(sql) {
            self.execute_statement(sql)?;
            return Ok(None);
        }
        Ok(Some(QueryResult::new(self.collect_rows(sql)?)))
    }

    fn execute_statement(&mut self, sql: &str) -> Result<usize, DatabaseError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute([])?)
    }

    fn release_cached_statements(&mut self) -> Result<(), DatabaseError> {
        self.conn.flush_prepared_statement_cache();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DuckDB"
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SchemaReader;

    #[test]
    fn test_booleans_and_nulls_render_as_text() {
        let mut client = DuckDbClient::open_in_memory().expect("open DuckDB");
        client
            .execute_statement("CREATE TABLE t0 (c0 INTEGER, c1 BOOLEAN, c2 VARCHAR)")
            .unwrap();
        client
            .execute_statement("INSERT INTO t0 VALUES (1, TRUE, 'a'), (NULL, FALSE, NULL), (3, NULL, 'it''s')")
            .unwrap();

        let result = client
            .query("SELECT t0.c0, t0.c1, t0.c2, (t0.c0 > 1) FROM t0 ORDER BY t0.c0 NULLS LAST")
            .unwrap()
            .expect("result handle");
        let text = |s: &str| Some(s.to_string());
        assert_eq!(
            result.rows,
            vec![
                vec![text("1"), text("true"), text("a"), text("false")],
                vec![text("3"), None, text("it's"), text("true")],
                vec![None, text("false"), None, None],
            ]
        );
    }

    #[test]
    fn test_statements_have_no_result_handle() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        assert_eq!(client.query("CREATE TABLE t0 (c0 INTEGER)").unwrap(), None);
        assert_eq!(client.query("  insert into t0 VALUES (1)").unwrap(), None);
        let result = client.query("SELECT t0.c0 FROM t0").unwrap().unwrap();
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_errors_surface_raw_messages() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        let err = client.query("SELECT c0 FROM missing").unwrap_err();
        assert!(err.message.contains("missing"), "{err}");
        let err = client.query("SELECT CAST('x' AS INTEGER)").unwrap_err();
        assert!(errors::oracle_errors().is_expected(&err.message), "{err}");
    }

    #[test]
    fn test_release_and_reset() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        client.execute_statement("CREATE TABLE t0 (c0 INTEGER)").unwrap();
        client.query("SELECT * FROM t0").unwrap();
        client.release_cached_statements().unwrap();
        client.reset().unwrap();
        assert!(client.query("SELECT * FROM t0").is_err());
    }

    #[test]
    fn test_reset_drops_views_before_tables() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        client.execute_statement("CREATE TABLE t0 (c0 INTEGER)").unwrap();
        client
            .execute_statement("CREATE VIEW v0(c0) AS SELECT t0.c0 + 1 FROM t0")
            .unwrap();
        client.reset().unwrap();
        assert!(client.query("SELECT * FROM v0").is_err());
        assert!(client.read_schema().unwrap().tables.is_empty());
    }

    #[test]
    fn test_reset_quotes_identifiers() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        client
            .execute_statement(r#"CREATE TABLE "Select" (c0 INTEGER)"#)
            .unwrap();
        client
            .execute_statement(r#"CREATE TABLE "we""ird" (c0 INTEGER)"#)
            .unwrap();
        client
            .execute_statement(r#"CREATE VIEW "Order"(c0) AS SELECT c0 FROM "Select""#)
            .unwrap();
        client.reset().unwrap();
        assert!(client.read_schema().unwrap().tables.is_empty());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("t0"), "\"t0\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trivalent.duckdb");
        {
            let mut client = DuckDbClient::open(&path).unwrap();
            client.execute_statement("CREATE TABLE t0 (c0 INTEGER)").unwrap();
            client.execute_statement("INSERT INTO t0 VALUES (7)").unwrap();
        }
        let mut client = DuckDbClient::open(&path).unwrap();
        let result = client.query("SELECT t0.c0 FROM t0").unwrap().unwrap();
        assert_eq!(result.rows, vec![vec![Some("7".to_string())]]);
    }
}
