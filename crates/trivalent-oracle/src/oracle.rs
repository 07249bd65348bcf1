//! The predicate-combining oracle.
//!
//! One check runs: schema read → target tables and fetch columns → N
//! generated predicates → combined fetch → compound predicate → expected
//! rows → verification query → comparison. Nothing survives a check except
//! the counters in [`OracleStats`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use trivalent_sql::{
    AnsiRenderer, Expr, ExpressionGenerator, RandomExpressionGenerator, Select, SqlRenderer,
    SqlRng, generate_row_source,
};

use crate::client::{DatabaseClient, SchemaReader};
use crate::combiner::PredicateCombiner;
use crate::error::{BugReport, InconclusiveReason, OracleError};
use crate::evaluation::EvaluationTable;
use crate::expected_errors::{ExpectedErrors, query_classified};
use crate::predicate::{LeafSelection, PredicatePool};
use crate::projector::{Projection, project_distinct, project_ordered};
use crate::verifier::{ComparisonPolicy, compare_rows};

/// Which query shape the verification step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleMode {
    /// `SELECT ... WHERE compound`, duplicates preserved.
    Where,
    /// `SELECT DISTINCT ... WHERE compound`.
    Distinct,
}

impl OracleMode {
    pub const ALL: [OracleMode; 2] = [OracleMode::Where, OracleMode::Distinct];

    pub fn as_str(self) -> &'static str {
        match self {
            OracleMode::Where => "where",
            OracleMode::Distinct => "distinct",
        }
    }
}

impl fmt::Display for OracleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OracleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "where" => Ok(OracleMode::Where),
            "distinct" => Ok(OracleMode::Distinct),
            other => Err(format!("unknown oracle mode `{other}` (expected where|distinct)")),
        }
    }
}

/// Tunables of the oracle (`[oracle]` config section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleOptions {
    /// Predicates generated per check.
    pub num_predicates: usize,
    /// Hard ceiling on the compound predicate's nesting.
    pub max_depth: usize,
    /// Chance of stopping early at a leaf before `max_depth`.
    pub leaf_probability: f64,
    pub leaf_selection: LeafSelection,
    /// Tables targeted per check.
    pub max_tables: usize,
    pub join_probability: f64,
    /// Chance both queries order by every fetch column.
    pub ordered_probability: f64,
    /// Chance a check first frees the driver's statement cache.
    pub release_statements_probability: f64,
    pub modes: Vec<OracleMode>,
}

impl Default for OracleOptions {
    fn default() -> Self {
        Self {
            num_predicates: 10,
            max_depth: 3,
            leaf_probability: 0.1,
            leaf_selection: LeafSelection::ByPattern,
            max_tables: 2,
            join_probability: 0.1,
            ordered_probability: 0.2,
            release_statements_probability: 0.1,
            modes: OracleMode::ALL.to_vec(),
        }
    }
}

/// Outcome of a check that did not find a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Actual rows matched the expected rows.
    Passed { rows: usize },
    /// The check was abandoned without a verdict.
    Inconclusive(InconclusiveReason),
}

/// Counters across checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleStats {
    pub checks: u64,
    pub passed: u64,
    pub inconclusive: u64,
    pub bugs: u64,
}

impl OracleStats {
    pub fn merge(&mut self, other: &OracleStats) {
        self.checks += other.checks;
        self.passed += other.passed;
        self.inconclusive += other.inconclusive;
        self.bugs += other.bugs;
    }
}

/// Builds independent predicates, combines them with three-valued logic and
/// checks the engine's `WHERE` evaluation against the derived result.
#[derive(Debug)]
pub struct PredicateCombiningOracle<G = RandomExpressionGenerator, R = AnsiRenderer> {
    options: OracleOptions,
    generator: G,
    renderer: R,
    expected_errors: ExpectedErrors,
    stats: OracleStats,
}

impl<G: ExpressionGenerator, R: SqlRenderer> PredicateCombiningOracle<G, R> {
    pub fn new(
        options: OracleOptions,
        generator: G,
        renderer: R,
        expected_errors: ExpectedErrors,
    ) -> Self {
        Self {
            options,
            generator,
            renderer,
            expected_errors,
            stats: OracleStats::default(),
        }
    }

    pub fn options(&self) -> &OracleOptions {
        &self.options
    }

    pub fn stats(&self) -> OracleStats {
        self.stats
    }

    /// Runs one check.
    ///
    /// Inconclusive cycles are returned as [`CheckOutcome::Inconclusive`];
    /// a found bug, a defect or an unexpected error is returned as `Err`.
    pub fn check<C>(
        &mut self,
        client: &mut C,
        mode: OracleMode,
        rng: &mut SqlRng,
    ) -> Result<CheckOutcome, OracleError>
    where
        C: DatabaseClient + SchemaReader + ?Sized,
    {
        self.stats.checks += 1;
        match self.run_check(client, mode, rng) {
            Ok(rows) => {
                self.stats.passed += 1;
                Ok(CheckOutcome::Passed { rows })
            }
            Err(OracleError::Inconclusive(reason)) => {
                debug!(%reason, "check inconclusive");
                self.stats.inconclusive += 1;
                Ok(CheckOutcome::Inconclusive(reason))
            }
            Err(OracleError::LogicBug(report)) => {
                error!(query = %report.query, mismatch = %report.mismatch, "logic bug found");
                self.stats.bugs += 1;
                Err(OracleError::LogicBug(report))
            }
            Err(e) => Err(e),
        }
    }

    fn run_check<C>(
        &mut self,
        client: &mut C,
        mode: OracleMode,
        rng: &mut SqlRng,
    ) -> Result<usize, OracleError>
    where
        C: DatabaseClient + SchemaReader + ?Sized,
    {
        if rng.chance(self.options.release_statements_probability) {
            client.release_cached_statements()?;
        }

        let schema = client.read_schema()?;
        let Some(targets) = schema.random_table_set(rng, self.options.max_tables) else {
            return Err(OracleError::Inconclusive(InconclusiveReason::EmptySchema));
        };
        let columns = targets.columns();
        let fetched = if rng.next_bool() {
            columns.clone()
        } else {
            rng.non_empty_subset(&columns)
        };
        let fetch_columns: Vec<Expr> = fetched.iter().map(Expr::column).collect();
        let source = generate_row_source(
            rng,
            &mut self.generator,
            &targets.tables,
            self.options.join_probability,
        );
        let predicates: Vec<Expr> = (0..self.options.num_predicates)
            .map(|_| self.generator.generate_predicate(rng, &columns))
            .collect();
        let ordered = rng.chance(self.options.ordered_probability);
        let order_by = if ordered {
            fetch_columns.clone()
        } else {
            Vec::new()
        };
        debug!(
            %mode,
            tables = targets.tables.len(),
            fetch_columns = fetch_columns.len(),
            joins = source.joins.len(),
            ordered,
            "starting check"
        );

        let table = EvaluationTable::fetch(
            client,
            &self.renderer,
            &self.expected_errors,
            &fetch_columns,
            predicates,
            &source,
            &order_by,
        )?;

        let pool = PredicatePool::new(table.predicates.clone());
        let combiner = PredicateCombiner::new(
            self.options.max_depth,
            self.options.leaf_probability,
            self.options.leaf_selection,
        );
        let compound = combiner
            .combine(rng, &self.generator, &pool)
            .ok_or_else(|| OracleError::Defect("no predicates to combine".to_string()))?;
        debug!(
            patterns = pool.pattern_count(),
            logical_nodes = compound.expression.logical_node_count(),
            "built compound predicate"
        );

        let distinct = mode == OracleMode::Distinct;
        let expected = if distinct {
            project_distinct(&table.snapshot, &compound.truth, Projection::FullRow)?
        } else {
            project_ordered(&table.snapshot, &compound.truth, Projection::FullRow)?
        };

        let verification = Select {
            distinct,
            fetch_columns,
            from: source.from,
            joins: source.joins,
            where_clause: Some(compound.expression.clone()),
            order_by,
        };
        let query = self.renderer.render_select(&verification);
        let actual = query_classified(client, &self.expected_errors, &query)?.rows;

        let policy = ComparisonPolicy::for_query(distinct, ordered);
        if let Err(mismatch) = compare_rows(&expected, &actual, policy) {
            let report = BugReport {
                seed: rng.seed(),
                query,
                fetch_query: table.fetch_query,
                predicates: table
                    .predicates
                    .iter()
                    .map(|p| self.renderer.render_expr(&p.expression))
                    .collect(),
                combined_predicate: self.renderer.render_expr(&compound.expression),
                expected,
                actual,
                mismatch: String::new(),
            }
            .with_mismatch(&mismatch);
            return Err(OracleError::LogicBug(Box::new(report)));
        }

        debug!(rows = expected.len(), ?policy, "check passed");
        Ok(expected.len())
    }
}
