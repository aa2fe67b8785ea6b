//! Lowering of semantic queries into the SQL AST.
//!
//! [`SqmToSqlAstConverter`] is the compiler pass proper: a single-use session
//! that turns one semantic statement into a [`SqmTranslation`].
//! [`QuerySplitter`] runs before it and expands a query over an unmapped
//! polymorphic type into one query per mapped implementor. The remaining
//! modules are the collaborators the converter consults: the metamodel, the
//! SQL function registry, parameter bindings, alias generation, and the
//! from-clause index.

pub mod alias;
pub mod config;
pub mod converter;
pub mod from_clause_index;
pub mod functions;
pub mod metamodel;
pub mod parameters;
pub mod scope;
pub mod splitter;

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

pub use alias::{SqlAliasBase, SqlAliasBaseManager};
pub use config::{ConverterConfig, JoinPredicatePlacement};
pub use converter::{SqlAstCreationContext, SqmToSqlAstConverter, SqmTranslation};
pub use from_clause_index::FromClauseIndex;
pub use functions::{ReturnType, SqlFunctionDescriptor, SqlFunctionRegistry, StandardFunction};
pub use metamodel::{
    AttributeMapping, EmbeddableMapping, EntityMapping, MappingMetamodel, Metamodel,
};
pub use parameters::{
    DomainParameterXref, JdbcParameters, ParameterBinding, ParameterFallbackType,
    QueryParameterBindings,
};
pub use scope::{AppliedByUnit, DurationScope, DurationTarget};
pub use splitter::QuerySplitter;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Point-in-time snapshot of lowering counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoweringMetricsSnapshot {
    /// Statements handed to a converter session.
    pub sqmc_lower_statements_total: u64,
    /// Table groups created for roots, joins, and cross joins.
    pub sqmc_lower_table_groups_total: u64,
    /// JDBC placeholders created.
    pub sqmc_lower_jdbc_parameters_total: u64,
    /// Extra parameter copies created for multi-valued bindings.
    pub sqmc_lower_parameter_expansions_total: u64,
    /// Binary arithmetic nodes rewritten as duration or datetime arithmetic.
    pub sqmc_lower_duration_rewrites_total: u64,
    /// Statements produced by the polymorphic splitter.
    pub sqmc_split_statements_total: u64,
}

static SQMC_LOWER_STATEMENTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SQMC_LOWER_TABLE_GROUPS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SQMC_LOWER_JDBC_PARAMETERS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SQMC_LOWER_PARAMETER_EXPANSIONS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SQMC_LOWER_DURATION_REWRITES_TOTAL: AtomicU64 = AtomicU64::new(0);
static SQMC_SPLIT_STATEMENTS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Snapshot lowering counters.
#[must_use]
pub fn lowering_metrics_snapshot() -> LoweringMetricsSnapshot {
    LoweringMetricsSnapshot {
        sqmc_lower_statements_total: SQMC_LOWER_STATEMENTS_TOTAL.load(AtomicOrdering::Relaxed),
        sqmc_lower_table_groups_total: SQMC_LOWER_TABLE_GROUPS_TOTAL.load(AtomicOrdering::Relaxed),
        sqmc_lower_jdbc_parameters_total: SQMC_LOWER_JDBC_PARAMETERS_TOTAL
            .load(AtomicOrdering::Relaxed),
        sqmc_lower_parameter_expansions_total: SQMC_LOWER_PARAMETER_EXPANSIONS_TOTAL
            .load(AtomicOrdering::Relaxed),
        sqmc_lower_duration_rewrites_total: SQMC_LOWER_DURATION_REWRITES_TOTAL
            .load(AtomicOrdering::Relaxed),
        sqmc_split_statements_total: SQMC_SPLIT_STATEMENTS_TOTAL.load(AtomicOrdering::Relaxed),
    }
}

/// Reset lowering counters.
pub fn reset_lowering_metrics() {
    SQMC_LOWER_STATEMENTS_TOTAL.store(0, AtomicOrdering::Relaxed);
    SQMC_LOWER_TABLE_GROUPS_TOTAL.store(0, AtomicOrdering::Relaxed);
    SQMC_LOWER_JDBC_PARAMETERS_TOTAL.store(0, AtomicOrdering::Relaxed);
    SQMC_LOWER_PARAMETER_EXPANSIONS_TOTAL.store(0, AtomicOrdering::Relaxed);
    SQMC_LOWER_DURATION_REWRITES_TOTAL.store(0, AtomicOrdering::Relaxed);
    SQMC_SPLIT_STATEMENTS_TOTAL.store(0, AtomicOrdering::Relaxed);
}

pub(crate) fn record_statement() {
    SQMC_LOWER_STATEMENTS_TOTAL.fetch_add(1, AtomicOrdering::Relaxed);
}

pub(crate) fn record_table_group() {
    SQMC_LOWER_TABLE_GROUPS_TOTAL.fetch_add(1, AtomicOrdering::Relaxed);
}

pub(crate) fn record_jdbc_parameters(count: usize) {
    SQMC_LOWER_JDBC_PARAMETERS_TOTAL.fetch_add(count as u64, AtomicOrdering::Relaxed);
}

pub(crate) fn record_parameter_expansion() {
    SQMC_LOWER_PARAMETER_EXPANSIONS_TOTAL.fetch_add(1, AtomicOrdering::Relaxed);
}

pub(crate) fn record_duration_rewrite() {
    SQMC_LOWER_DURATION_REWRITES_TOTAL.fetch_add(1, AtomicOrdering::Relaxed);
}

pub(crate) fn record_split_statements(count: usize) {
    SQMC_SPLIT_STATEMENTS_TOTAL.fetch_add(count as u64, AtomicOrdering::Relaxed);
}
