//! Live schema from `information_schema.columns`.
//!
//! Views list their columns there too, so they are read as ordinary
//! targets alongside base tables.

use tracing::debug;
use trivalent_sql::{Column, DataType, Schema, Table};

use super::DuckDbClient;
use crate::client::{DatabaseError, SchemaReader};

const COLUMNS_QUERY: &str = "SELECT table_name, column_name, data_type, is_nullable \
     FROM information_schema.columns \
     WHERE table_schema = 'main' \
     ORDER BY table_name, ordinal_position";

impl SchemaReader for DuckDbClient {
    fn read_schema(&mut self) -> Result<Schema, DatabaseError> {
        let mut stmt = self.conn.prepare(COLUMNS_QUERY)?;
        let mut rows = stmt.query([])?;
        let mut tables: Vec<Table> = Vec::new();
        while let Some(row) = rows.next()? {
            let table_name: String = row.get(0)?;
            let column_name: String = row.get(1)?;
            let type_name: String = row.get(2)?;
            let nullable: String = row.get(3)?;

            let data_type = match DataType::from_sql_name(&type_name) {
                Ok(data_type) => data_type,
                Err(e) => {
                    debug!(table = %table_name, column = %column_name, error = %e, "skipping column");
                    continue;
                }
            };
            let mut column = Column::new(&table_name, column_name, data_type);
            if nullable.eq_ignore_ascii_case("NO") {
                column = column.not_null();
            }

            match tables.last_mut() {
                Some(table) if table.name == table_name => table.columns.push(column),
                _ => tables.push(Table::new(table_name, vec![column])),
            }
        }
        Ok(Schema::new(tables))
    }
}
