//! Schema and data mutation statements (CREATE TABLE, INSERT, UPDATE,
//! DELETE, CREATE INDEX, CREATE VIEW).
//!
//! Statements are generated as SQL text; executing them and deciding
//! which failures are acceptable belongs to the caller.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::ast::Select;
use crate::generator::expression::{ExpressionGenerator, GeneratorOptions, RandomExpressionGenerator};
use crate::generator::join::generate_row_source;
use crate::render::SqlRenderer;
use crate::rng::SqlRng;
use crate::schema::{Column, Schema, Table};
use crate::types::{Constant, DataType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadOptions {
    pub max_tables: usize,
    pub max_columns: usize,
    pub max_inserts: usize,
    pub max_updates: usize,
    pub max_deletes: usize,
    pub max_indexes: usize,
    pub max_views: usize,
    /// Allow explicit indexes and UNIQUE / PRIMARY KEY constraints.
    pub test_indexes: bool,
    /// Allow NOT NULL constraints.
    pub test_not_null: bool,
}

impl Default for WorkloadOptions {
    fn default() -> Self {
        Self {
            max_tables: 2,
            max_columns: 4,
            max_inserts: 30,
            max_updates: 5,
            max_deletes: 1,
            max_indexes: 3,
            max_views: 1,
            test_indexes: true,
            test_not_null: true,
        }
    }
}

/// Kinds of mutation issued after the tables are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Insert,
    CreateIndex,
    Update,
    Delete,
    CreateView,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Insert,
        Action::CreateIndex,
        Action::Update,
        Action::Delete,
        Action::CreateView,
    ];

    /// How many statements of this kind to issue for one database.
    pub fn random_count(self, rng: &mut SqlRng, options: &WorkloadOptions) -> usize {
        let max = match self {
            Action::Insert => options.max_inserts,
            Action::CreateIndex if options.test_indexes => options.max_indexes,
            Action::CreateIndex => 0,
            Action::Update => options.max_updates,
            Action::Delete => options.max_deletes,
            Action::CreateView => options.max_views,
        };
        rng.next_usize(max + 1)
    }
}

/// Generates mutation statements for one database.
#[derive(Debug, Clone)]
pub struct StatementGenerator {
    options: WorkloadOptions,
    expressions: RandomExpressionGenerator,
    index_counter: usize,
    view_counter: usize,
}

/// Probability that a view's SELECT joins its first two tables.
const VIEW_JOIN_PROBABILITY: f64 = 0.2;

impl StatementGenerator {
    pub fn new(options: WorkloadOptions, expressions: RandomExpressionGenerator) -> Self {
        Self {
            options,
            expressions,
            index_counter: 0,
            view_counter: 0,
        }
    }

    pub fn options(&self) -> &WorkloadOptions {
        &self.options
    }

    /// Number of tables to create, in `1..=max_tables`.
    pub fn table_count(&self, rng: &mut SqlRng) -> usize {
        1 + rng.next_usize(self.options.max_tables.max(1))
    }

    /// Generates `CREATE TABLE name (...)` and the table it describes.
    ///
    /// With indexes enabled a column occasionally gets a UNIQUE or PRIMARY
    /// KEY constraint, and half of the tables without a column-level key get
    /// a table-level `PRIMARY KEY(..)` over a random column subset. Key
    /// columns are reported NOT NULL.
    pub fn create_table(&self, rng: &mut SqlRng, name: &str) -> (Table, String) {
        let column_count = 1 + rng.next_usize(self.options.max_columns.max(1));
        let mut columns = Vec::with_capacity(column_count);
        let mut definitions = Vec::with_capacity(column_count);
        let mut has_primary_key = false;
        for i in 0..column_count {
            let mut column = Column::new(name, format!("c{i}"), rng.pick(&DataType::ALL));
            let mut definition = format!("{} {}", column.name, column.data_type.sql_name());
            if self.options.test_indexes && rng.rather_low_probability() {
                if !has_primary_key && rng.next_bool() {
                    definition.push_str(" PRIMARY KEY");
                    column = column.not_null();
                    has_primary_key = true;
                } else {
                    definition.push_str(" UNIQUE");
                }
            }
            if self.options.test_not_null && rng.rather_low_probability() {
                definition.push_str(" NOT NULL");
                column = column.not_null();
            }
            definitions.push(definition);
            columns.push(column);
        }
        if self.options.test_indexes && !has_primary_key && rng.next_bool() {
            let indices: Vec<usize> = (0..columns.len()).collect();
            let mut key = rng.non_empty_subset(&indices);
            key.sort_unstable();
            let names: Vec<&str> = key.iter().map(|&i| columns[i].name.as_str()).collect();
            definitions.push(format!("PRIMARY KEY({})", names.join(", ")));
            for i in key {
                columns[i].nullable = false;
            }
        }
        let sql = format!("CREATE TABLE {name} ({})", definitions.join(", "));
        (Table::new(name, columns), sql)
    }

    /// Generates a multi-row INSERT into `table`.
    pub fn insert(&self, rng: &mut SqlRng, table: &Table) -> String {
        let rows = 1 + rng.next_usize(3);
        let mut sql = format!("INSERT INTO {} VALUES ", table.name);
        for row in 0..rows {
            if row > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (i, column) in table.columns.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                let value = self.insert_value(rng, column);
                write_literal(&mut sql, &value);
            }
            sql.push(')');
        }
        sql
    }

    /// Generates `UPDATE table SET c = v [WHERE p]`.
    pub fn update<R: SqlRenderer + ?Sized>(
        &mut self,
        rng: &mut SqlRng,
        renderer: &R,
        table: &Table,
    ) -> Option<String> {
        let column = rng.choose(&table.columns)?.clone();
        let value = self.insert_value(rng, &column);
        let mut sql = format!("UPDATE {} SET {} = ", table.name, column.name);
        write_literal(&mut sql, &value);
        self.append_where(rng, renderer, table, &mut sql);
        Some(sql)
    }

    /// Generates `DELETE FROM table [WHERE p]`.
    pub fn delete<R: SqlRenderer + ?Sized>(
        &mut self,
        rng: &mut SqlRng,
        renderer: &R,
        table: &Table,
    ) -> String {
        let mut sql = format!("DELETE FROM {}", table.name);
        self.append_where(rng, renderer, table, &mut sql);
        sql
    }

    /// Generates `CREATE [UNIQUE] INDEX ... ON table (cols)`.
    pub fn create_index(&mut self, rng: &mut SqlRng, table: &Table) -> Option<String> {
        if table.columns.is_empty() {
            return None;
        }
        let columns = rng.non_empty_subset(&table.columns);
        let name = format!("i{}", self.index_counter);
        self.index_counter += 1;
        let unique = if rng.rather_low_probability() {
            "UNIQUE "
        } else {
            ""
        };
        let column_list: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        Some(format!(
            "CREATE {unique}INDEX {name} ON {} ({})",
            table.name,
            column_list.join(", ")
        ))
    }

    /// Generates `CREATE VIEW vN(c0, ..) AS SELECT ..` over `tables` and
    /// the view as a table of typed, nullable columns.
    ///
    /// The SELECT draws its row source like an oracle check does and may be
    /// DISTINCT or filtered. Returns `None` when no table has a column.
    pub fn create_view<R: SqlRenderer + ?Sized>(
        &mut self,
        rng: &mut SqlRng,
        renderer: &R,
        tables: &[Table],
    ) -> Option<(Table, String)> {
        let targets = Schema::new(tables.to_vec()).random_table_set(rng, self.options.max_tables)?;
        let columns = targets.columns();
        let name = format!("v{}", self.view_counter);
        self.view_counter += 1;

        let column_count = 1 + rng.next_usize(self.options.max_columns.max(1));
        let mut view_columns = Vec::with_capacity(column_count);
        let mut fetch_columns = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let data_type = rng.pick(&DataType::ALL);
            fetch_columns.push(self.expressions.generate_expression(rng, &columns, data_type, 0));
            view_columns.push(Column::new(&name, format!("c{i}"), data_type));
        }

        let source = generate_row_source(
            rng,
            &mut self.expressions,
            &targets.tables,
            VIEW_JOIN_PROBABILITY,
        );
        let where_clause = rng
            .next_bool()
            .then(|| self.expressions.generate_predicate(rng, &columns));
        let select = Select {
            distinct: rng.next_bool(),
            fetch_columns,
            from: source.from,
            joins: source.joins,
            where_clause,
            order_by: Vec::new(),
        };
        let column_list: Vec<&str> = view_columns.iter().map(|c| c.name.as_str()).collect();
        let sql = format!(
            "CREATE VIEW {name}({}) AS {}",
            column_list.join(", "),
            renderer.render_select(&select)
        );
        Some((Table::new(name, view_columns), sql))
    }

    fn insert_value(&self, rng: &mut SqlRng, column: &Column) -> Constant {
        if column.nullable {
            return self.expressions.generate_constant(rng, column.data_type);
        }
        let non_null = RandomExpressionGenerator::new(GeneratorOptions {
            null_probability: 0.0,
            ..self.expressions.options().clone()
        });
        non_null.generate_constant(rng, column.data_type)
    }

    fn append_where<R: SqlRenderer + ?Sized>(
        &mut self,
        rng: &mut SqlRng,
        renderer: &R,
        table: &Table,
        sql: &mut String,
    ) {
        if rng.next_bool() {
            let predicate = self.expressions.generate_predicate(rng, &table.columns);
            let _ = write!(sql, " WHERE {}", renderer.render_expr(&predicate));
        }
    }
}

/// Writes a constant as a VALUES/SET literal (bare `NULL`, no cast).
fn write_literal(out: &mut String, constant: &Constant) {
    match constant {
        Constant::Null(_) => out.push_str("NULL"),
        Constant::Integer(v) => {
            let _ = write!(out, "{v}");
        }
        Constant::Varchar(s) => {
            let _ = write!(out, "'{}'", s.replace('\'', "''"));
        }
        Constant::Boolean(b) => out.push_str(if *b { "TRUE" } else { "FALSE" }),
    }
}
