//! Schema snapshot as read from the engine under test.

use crate::rng::SqlRng;
use crate::types::DataType;

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    pub table: String,
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// A table and its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// All user tables of the database, read fresh at the start of a check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.columns.is_empty())
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Picks a random non-empty set of tables, each with at least one column.
    ///
    /// Returns `None` when the schema has no usable table; callers treat that
    /// as "cannot run this cycle". At most `max_tables` tables are returned.
    pub fn random_table_set(&self, rng: &mut SqlRng, max_tables: usize) -> Option<TableSet> {
        let usable: Vec<Table> = self
            .tables
            .iter()
            .filter(|t| !t.columns.is_empty())
            .cloned()
            .collect();
        if usable.is_empty() {
            return None;
        }
        let mut tables = rng.non_empty_subset(&usable);
        while tables.len() > max_tables.max(1) {
            let victim = rng.next_usize(tables.len());
            tables.remove(victim);
        }
        Some(TableSet { tables })
    }
}

/// The tables targeted by one oracle check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSet {
    pub tables: Vec<Table>,
}

impl TableSet {
    /// All columns across the tables, in table order.
    pub fn columns(&self) -> Vec<Column> {
        self.tables
            .iter()
            .flat_map(|t| t.columns.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            Table::new("t0", vec![Column::new("t0", "c0", DataType::Integer)]),
            Table::new("t1", vec![]),
            Table::new(
                "t2",
                vec![
                    Column::new("t2", "c0", DataType::Varchar),
                    Column::new("t2", "c1", DataType::Boolean).not_null(),
                ],
            ),
        ])
    }

    #[test]
    fn random_table_set_skips_tables_without_columns() {
        let schema = schema();
        let mut rng = SqlRng::new(11);
        for _ in 0..100 {
            let set = schema.random_table_set(&mut rng, 8).expect("usable tables");
            assert!(!set.tables.is_empty());
            assert!(set.tables.iter().all(|t| t.name != "t1"));
        }
    }

    #[test]
    fn random_table_set_respects_max() {
        let schema = schema();
        let mut rng = SqlRng::new(5);
        for _ in 0..100 {
            let set = schema.random_table_set(&mut rng, 1).unwrap();
            assert_eq!(set.tables.len(), 1);
        }
    }

    #[test]
    fn empty_schema_yields_none() {
        let mut rng = SqlRng::new(1);
        assert!(Schema::default().random_table_set(&mut rng, 2).is_none());
        let only_empty = Schema::new(vec![Table::new("t", vec![])]);
        assert!(only_empty.is_empty());
        assert!(only_empty.random_table_set(&mut rng, 2).is_none());
    }

    #[test]
    fn table_set_columns_are_flattened_in_order() {
        let schema = schema();
        let set = TableSet {
            tables: vec![schema.tables[2].clone(), schema.tables[0].clone()],
        };
        let names: Vec<_> = set
            .columns()
            .into_iter()
            .map(|c| format!("{}.{}", c.table, c.name))
            .collect();
        assert_eq!(names, ["t2.c0", "t2.c1", "t0.c0"]);
    }
}
