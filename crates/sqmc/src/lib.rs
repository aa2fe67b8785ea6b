//! Public API facade: compile semantic queries into SQL AST.
//!
//! [`QueryCompiler`] owns the mapping metamodel, the SQL function registry,
//! and the converter configuration. Compiling a statement splits it over
//! unmapped polymorphic roots and lowers every resulting SELECT in its own
//! converter session.

use sqmc_sqm::SqmStatement;
use tracing::{debug, debug_span};

pub use sqmc_error::{ErrorKind, Result, SqmError};
pub use sqmc_lower::{
    ConverterConfig, DomainParameterXref, JoinPredicatePlacement, MappingMetamodel, Metamodel,
    ParameterBinding, ParameterFallbackType, QueryParameterBindings, QuerySplitter,
    SqlAstCreationContext, SqlFunctionRegistry, SqmToSqlAstConverter, SqmTranslation,
};
pub use sqmc_lower::{lowering_metrics_snapshot, LoweringMetricsSnapshot};
pub use sqmc_sql_ast::SelectStatement;
pub use {sqmc_lower, sqmc_sql_ast, sqmc_sqm, sqmc_types};

pub struct QueryCompiler {
    metamodel: Box<dyn MappingMetamodel>,
    functions: SqlFunctionRegistry,
    config: ConverterConfig,
}

impl QueryCompiler {
    /// Compiler with the standard function registry and default config.
    #[must_use]
    pub fn new(metamodel: impl MappingMetamodel + 'static) -> Self {
        let functions = SqlFunctionRegistry::standard(metamodel.type_configuration());
        Self {
            metamodel: Box::new(metamodel),
            functions,
            config: ConverterConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ConverterConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_functions(mut self, functions: SqlFunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    #[must_use]
    pub fn metamodel(&self) -> &dyn MappingMetamodel {
        self.metamodel.as_ref()
    }

    #[must_use]
    pub fn functions(&self) -> &SqlFunctionRegistry {
        &self.functions
    }

    /// Creation context handed to each converter session.
    #[must_use]
    pub fn creation_context(&self) -> SqlAstCreationContext<'_> {
        SqlAstCreationContext {
            metamodel: self.metamodel.as_ref(),
            functions: &self.functions,
        }
    }

    /// Lower `statement`, one translation per split SELECT.
    ///
    /// Non-SELECT statements are not split; they go straight to the converter.
    pub fn compile(
        &self,
        statement: &SqmStatement,
        bindings: &QueryParameterBindings,
    ) -> Result<Vec<SqmTranslation>> {
        let span = debug_span!(target: "sqmc.compile", "compile");
        let _g = span.enter();

        let statements = match statement {
            SqmStatement::Select(_) => QuerySplitter::split(self.metamodel.as_ref(), statement)?,
            _ => vec![statement.clone()],
        };
        let translations = statements
            .iter()
            .map(|statement| self.translate(statement, bindings))
            .collect::<Result<Vec<_>>>()?;
        debug!(target: "sqmc.compile", translations = translations.len(), "statement compiled");
        Ok(translations)
    }

    /// Lower one statement without splitting it.
    pub fn translate(
        &self,
        statement: &SqmStatement,
        bindings: &QueryParameterBindings,
    ) -> Result<SqmTranslation> {
        let xref = DomainParameterXref::from_statement(statement)?;
        SqmToSqlAstConverter::new(self.creation_context(), self.config.clone(), bindings, xref)
            .translate(statement)
    }
}

/// SQL-ish rendering of a translation, with table groups expanded.
#[must_use]
pub fn render(translation: &SqmTranslation) -> String {
    let ast = &translation.sql_ast;
    ast.query_spec.display(&ast.table_groups).to_string()
}
