//! Database population: random tables, rows, indexes and views.
//!
//! Statement failures the DuckDB error catalog lists as expected are
//! skipped; anything else aborts the worker.

use anyhow::{Result, bail};
use tracing::{debug, trace};
use trivalent_oracle::duckdb::errors;
use trivalent_oracle::{DatabaseClient, ExpectedErrors};
use trivalent_sql::{
    Action, AnsiRenderer, GeneratorOptions, RandomExpressionGenerator, SqlRng,
    StatementGenerator, Table, WorkloadOptions,
};

/// Attempts per table before giving up on a database.
const MAX_TABLE_ATTEMPTS: usize = 10;

/// Expected-error allowlists for each kind of statement.
struct Allowlists {
    table: ExpectedErrors,
    insert: ExpectedErrors,
    index: ExpectedErrors,
    view: ExpectedErrors,
}

impl Allowlists {
    fn duckdb() -> Self {
        Self {
            table: errors::table_errors(),
            insert: errors::insert_errors(),
            index: errors::index_errors(),
            view: errors::view_errors(),
        }
    }

    fn for_action(&self, action: Action) -> &ExpectedErrors {
        match action {
            Action::Insert | Action::Update | Action::Delete => &self.insert,
            Action::CreateIndex => &self.index,
            Action::CreateView => &self.view,
        }
    }
}

/// Counts of statements a population pass issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkloadStats {
    pub tables: usize,
    pub views: usize,
    pub executed: usize,
    pub skipped: usize,
}

/// Creates tables `t0..tN`, fills them with random mutations and defines
/// views `v0..vN` over them.
///
/// The database is expected to be empty. Views are only defined over base
/// tables and never receive mutations; the oracle picks them up from the
/// live schema.
pub fn populate<C: DatabaseClient + ?Sized>(
    client: &mut C,
    rng: &mut SqlRng,
    workload: &WorkloadOptions,
    generator: &GeneratorOptions,
) -> Result<WorkloadStats> {
    let allowlists = Allowlists::duckdb();
    let mut statements = StatementGenerator::new(
        workload.clone(),
        RandomExpressionGenerator::new(generator.clone()),
    );
    let mut stats = WorkloadStats::default();

    let table_count = statements.table_count(rng);
    let mut tables = Vec::with_capacity(table_count);
    for i in 0..table_count {
        tables.push(create_table(
            client,
            rng,
            &statements,
            &allowlists.table,
            &format!("t{i}"),
        )?);
    }
    stats.tables = tables.len();

    for action in Action::ALL {
        let count = action.random_count(rng, workload);
        for _ in 0..count {
            let Some(table) = rng.choose(&tables) else {
                break;
            };
            let sql = match action {
                Action::Insert => Some(statements.insert(rng, table)),
                Action::CreateIndex => statements.create_index(rng, table),
                Action::Update => statements.update(rng, &AnsiRenderer, table),
                Action::Delete => Some(statements.delete(rng, &AnsiRenderer, table)),
                Action::CreateView => statements
                    .create_view(rng, &AnsiRenderer, &tables)
                    .map(|(_, sql)| sql),
            };
            let Some(sql) = sql else {
                continue;
            };
            if execute(client, &sql, allowlists.for_action(action))? {
                if action == Action::CreateView {
                    stats.views += 1;
                }
                stats.executed += 1;
            } else {
                stats.skipped += 1;
            }
        }
    }

    debug!(
        tables = stats.tables,
        views = stats.views,
        executed = stats.executed,
        skipped = stats.skipped,
        "populated database"
    );
    Ok(stats)
}

fn create_table<C: DatabaseClient + ?Sized>(
    client: &mut C,
    rng: &mut SqlRng,
    statements: &StatementGenerator,
    expected: &ExpectedErrors,
    name: &str,
) -> Result<Table> {
    for _ in 0..MAX_TABLE_ATTEMPTS {
        let (table, sql) = statements.create_table(rng, name);
        if execute(client, &sql, expected)? {
            return Ok(table);
        }
    }
    bail!("could not create table {name} in {MAX_TABLE_ATTEMPTS} attempts")
}

/// Runs one statement. `Ok(false)` means it failed with an expected error.
fn execute<C: DatabaseClient + ?Sized>(
    client: &mut C,
    sql: &str,
    expected: &ExpectedErrors,
) -> Result<bool> {
    trace!(sql, "executing statement");
    match client.execute_statement(sql) {
        Ok(_) => Ok(true),
        Err(e) if expected.is_expected(&e.message) => {
            trace!(error = %e, "statement skipped");
            Ok(false)
        }
        Err(e) => bail!("unexpected error executing `{sql}`: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivalent_oracle::{DuckDbClient, SchemaReader};

    #[test]
    fn populates_an_empty_database() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        let mut rng = SqlRng::new(3);
        let stats = populate(
            &mut client,
            &mut rng,
            &WorkloadOptions::default(),
            &GeneratorOptions::default(),
        )
        .unwrap();

        let schema = client.read_schema().unwrap();
        assert!(stats.tables >= 1);
        assert!(!schema.is_empty());
        assert!(schema.table("t0").is_some());
    }

    #[test]
    fn same_seed_same_schema() {
        let schema_for = |seed| {
            let mut client = DuckDbClient::open_in_memory().unwrap();
            let mut rng = SqlRng::new(seed);
            populate(
                &mut client,
                &mut rng,
                &WorkloadOptions::default(),
                &GeneratorOptions::default(),
            )
            .unwrap();
            client.read_schema().unwrap()
        };
        assert_eq!(schema_for(11), schema_for(11));
    }

    #[test]
    fn views_join_the_schema() {
        let workload = WorkloadOptions {
            max_views: 3,
            ..WorkloadOptions::default()
        };
        let mut created = 0;
        for seed in 0..20 {
            let mut client = DuckDbClient::open_in_memory().unwrap();
            let mut rng = SqlRng::new(seed);
            let stats =
                populate(&mut client, &mut rng, &workload, &GeneratorOptions::default()).unwrap();
            let schema = client.read_schema().unwrap();
            let views = schema.tables.iter().filter(|t| t.name.starts_with('v')).count();
            assert_eq!(views, stats.views);
            created += stats.views;
        }
        assert!(created > 0);
    }

    #[test]
    fn zero_max_views_creates_none() {
        let workload = WorkloadOptions {
            max_views: 0,
            ..WorkloadOptions::default()
        };
        let mut client = DuckDbClient::open_in_memory().unwrap();
        let mut rng = SqlRng::new(5);
        let stats =
            populate(&mut client, &mut rng, &workload, &GeneratorOptions::default()).unwrap();
        assert_eq!(stats.views, 0);
        let schema = client.read_schema().unwrap();
        assert!(schema.tables.iter().all(|t| t.name.starts_with('t')));
    }

    #[test]
    fn unexpected_statement_error_aborts() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        let err = execute(&mut client, "SELEC 1", &ExpectedErrors::new()).unwrap_err();
        assert!(err.to_string().contains("SELEC 1"));
    }

    #[test]
    fn expected_statement_error_is_skipped() {
        let mut client = DuckDbClient::open_in_memory().unwrap();
        client
            .execute_statement("CREATE TABLE t0 (c0 INTEGER PRIMARY KEY)")
            .unwrap();
        client.execute_statement("INSERT INTO t0 VALUES (1)").unwrap();
        let executed = execute(
            &mut client,
            "INSERT INTO t0 VALUES (1)",
            &errors::insert_errors(),
        )
        .unwrap();
        assert!(!executed);
    }
}
