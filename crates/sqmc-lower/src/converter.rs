//! The SQM to SQL AST lowering converter.
//!
//! One [`SqmToSqlAstConverter`] lowers one top-level statement (with all of
//! its subqueries) and is then consumed by [`SqmToSqlAstConverter::translate`].
//! Lowering is a `match` over the semantic node kinds. Session state:
//!
//! - a clause stack (the clause currently being lowered),
//! - a processing-state stack with one [`QuerySpec`] under construction per
//!   nested query spec,
//! - a stack of [`FromClauseIndex`]es, innermost last, consulted outward so
//!   that correlated subqueries see their enclosing from-elements,
//! - a stack of inferrable types used to type parameters and untyped literals
//!   from their sibling operand,
//! - the JDBC parameter registry and the parameter cross reference.
//!
//! Duration arithmetic state is not session state: it travels as a
//! [`DurationScope`] argument of expression lowering.

use std::collections::{BTreeSet, HashMap};

use smallvec::{SmallVec, smallvec};
use sqmc_error::{Result, SqmError};
use sqmc_sqm::{
    ParameterId, SqmAttributeJoin, SqmBinaryArithmetic, SqmByUnit, SqmCrossJoin, SqmExpression,
    SqmFromClause, SqmFromElementSpace, SqmFunction, SqmFunctionKind, SqmInListPredicate,
    SqmParameter, SqmPath, SqmPathKind, SqmPredicate, SqmQuerySpec, SqmRoot, SqmSelectClause,
    SqmSpaceJoin, SqmStatement, SqmToDuration, SqmUnaryOperation, TrimSpec,
};
use sqmc_sql_ast::{
    Expression, JdbcParameter, JunctionKind, NavigableKind, NavigableReference, Predicate,
    QuerySpec, SelectStatement, SortSpecification, TableGroupArena, TableGroupId, TableGroupJoin,
};
use sqmc_types::{
    BasicJavaType, BasicType, BinaryArithmeticOperator, Clause, JavaType, JdbcMappings,
    LiteralValue, NavigablePath, SqlJoinType, TemporalUnit, TypeConfiguration,
    UnaryArithmeticOperator,
};
use tracing::{debug, debug_span, trace};

use crate::alias::SqlAliasBaseManager;
use crate::config::{ConverterConfig, JoinPredicatePlacement};
use crate::from_clause_index::FromClauseIndex;
use crate::functions::SqlFunctionRegistry;
use crate::metamodel::{self, AttributeMapping, MappingMetamodel};
use crate::parameters::{
    DomainParameterXref, JdbcParameters, ParameterFallbackType, QueryParameterBindings,
};
use crate::scope::{DurationScope, DurationTarget};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Read-only collaborators shared by every conversion.
#[derive(Clone, Copy)]
pub struct SqlAstCreationContext<'a> {
    pub metamodel: &'a dyn MappingMetamodel,
    pub functions: &'a SqlFunctionRegistry,
}

/// Result of lowering one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmTranslation {
    pub sql_ast: SelectStatement,
    /// JDBC placeholders of every consumed semantic parameter occurrence.
    pub jdbc_params_by_sqm_param: HashMap<ParameterId, Vec<JdbcParameter>>,
    pub jdbc_parameters: JdbcParameters,
    pub parameter_xref: DomainParameterXref,
    pub affected_table_names: BTreeSet<String>,
}

struct ProcessingState {
    query_spec: QuerySpec,
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

pub struct SqmToSqlAstConverter<'a> {
    creation_context: SqlAstCreationContext<'a>,
    config: ConverterConfig,
    bindings: &'a QueryParameterBindings,
    xref: DomainParameterXref,
    table_groups: TableGroupArena,
    from_clause_indexes: Vec<FromClauseIndex>,
    processing_states: Vec<ProcessingState>,
    clause_stack: Vec<Clause>,
    inferrable_types: Vec<Option<JdbcMappings>>,
    alias_manager: SqlAliasBaseManager,
    jdbc_params_by_sqm_param: HashMap<ParameterId, Vec<JdbcParameter>>,
    jdbc_parameters: JdbcParameters,
    affected_table_names: BTreeSet<String>,
}

impl<'a> SqmToSqlAstConverter<'a> {
    #[must_use]
    pub fn new(
        creation_context: SqlAstCreationContext<'a>,
        config: ConverterConfig,
        bindings: &'a QueryParameterBindings,
        xref: DomainParameterXref,
    ) -> Self {
        Self {
            creation_context,
            config,
            bindings,
            xref,
            table_groups: TableGroupArena::new(),
            from_clause_indexes: vec![FromClauseIndex::new()],
            processing_states: Vec::new(),
            clause_stack: Vec::new(),
            inferrable_types: Vec::new(),
            alias_manager: SqlAliasBaseManager::new(),
            jdbc_params_by_sqm_param: HashMap::new(),
            jdbc_parameters: JdbcParameters::new(),
            affected_table_names: BTreeSet::new(),
        }
    }

    /// Lower a statement, consuming the session.
    pub fn translate(mut self, statement: &SqmStatement) -> Result<SqmTranslation> {
        let span = debug_span!(target: "sqmc.lower", "translate", kind = statement_kind(statement));
        let _g = span.enter();
        crate::record_statement();

        let query_spec = match statement {
            SqmStatement::Select(select) => self.visit_query_spec(&select.query_spec)?,
            SqmStatement::Update(_) => return Err(SqmError::not_yet_implemented("UPDATE statement")),
            SqmStatement::Delete(_) => return Err(SqmError::not_yet_implemented("DELETE statement")),
            SqmStatement::InsertSelect(_) => {
                return Err(SqmError::not_yet_implemented("INSERT-SELECT statement"));
            }
        };
        if !self.clause_stack.is_empty() {
            return Err(SqmError::internal(format!(
                "clause stack not empty after lowering: {:?}",
                self.clause_stack
            )));
        }

        debug!(
            target: "sqmc.lower",
            table_groups = self.table_groups.len(),
            jdbc_parameters = self.jdbc_parameters.len(),
            affected_tables = self.affected_table_names.len(),
            "statement lowered"
        );
        Ok(SqmTranslation {
            sql_ast: SelectStatement {
                query_spec,
                table_groups: self.table_groups,
            },
            jdbc_params_by_sqm_param: self.jdbc_params_by_sqm_param,
            jdbc_parameters: self.jdbc_parameters,
            parameter_xref: self.xref,
            affected_table_names: self.affected_table_names,
        })
    }

    // -- session state ------------------------------------------------------

    #[must_use]
    pub fn table_groups(&self) -> &TableGroupArena {
        &self.table_groups
    }

    /// Index of the innermost query spec being lowered.
    #[must_use]
    pub fn from_clause_index(&self) -> Option<&FromClauseIndex> {
        self.from_clause_indexes.last()
    }

    #[must_use]
    pub fn current_clause(&self) -> Option<Clause> {
        self.clause_stack.last().copied()
    }

    #[must_use]
    pub fn clause_depth(&self) -> usize {
        self.clause_stack.len()
    }

    #[must_use]
    pub fn jdbc_parameters(&self) -> &JdbcParameters {
        &self.jdbc_parameters
    }

    #[must_use]
    pub fn parameter_xref(&self) -> &DomainParameterXref {
        &self.xref
    }

    #[must_use]
    pub fn affected_table_names(&self) -> &BTreeSet<String> {
        &self.affected_table_names
    }

    /// Seed the clause stack before lowering a fragment outside of any query
    /// spec. Fails if the stack already holds a clause.
    pub fn prime_clause_stack(&mut self, clause: Clause) -> Result<()> {
        if let Some(current) = self.current_clause() {
            return Err(SqmError::StackAlreadyPrimed {
                stack: format!("clause stack (current {current})"),
            });
        }
        self.clause_stack.push(clause);
        Ok(())
    }

    /// Run `f` under `clause`. Type hints of an enclosing query never reach
    /// into the clause: it starts from the clause's own hint.
    fn with_clause<T>(&mut self, clause: Clause, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let hint = match clause {
            Clause::Limit | Clause::Offset => Some(smallvec![BasicType::INTEGER]),
            _ => None,
        };
        self.clause_stack.push(clause);
        self.inferrable_types.push(hint);
        let result = f(self);
        self.inferrable_types.pop();
        self.clause_stack.pop();
        result
    }

    fn with_inferrable_type<T>(
        &mut self,
        ty: Option<JdbcMappings>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.inferrable_types.push(ty);
        let result = f(self);
        self.inferrable_types.pop();
        result
    }

    fn inferred_type(&self) -> Option<&JdbcMappings> {
        self.inferrable_types.last().and_then(Option::as_ref)
    }

    fn type_configuration(&self) -> &'a TypeConfiguration {
        self.creation_context.metamodel.type_configuration()
    }

    fn current_query_spec_mut(&mut self) -> Result<&mut QuerySpec> {
        self.processing_states
            .last_mut()
            .map(|state| &mut state.query_spec)
            .ok_or_else(|| SqmError::internal("no query spec is being lowered"))
    }

    fn from_clause_index_mut(&mut self) -> Result<&mut FromClauseIndex> {
        self.from_clause_indexes
            .last_mut()
            .ok_or_else(|| SqmError::internal("from-clause index stack is empty"))
    }

    fn find_table_group(&self, path: &NavigablePath) -> Option<TableGroupId> {
        self.from_clause_indexes
            .iter()
            .rev()
            .find_map(|index| index.find_table_group(path))
    }

    /// Join already created for `path` by the query spec being lowered.
    /// Joins of enclosing query specs are never reused.
    fn find_local_table_group_join(&self, path: &NavigablePath) -> Option<&TableGroupJoin> {
        self.from_clause_indexes
            .last()
            .and_then(|index| index.find_table_group_join(path))
    }

    fn find_local_table_group(&self, path: &NavigablePath) -> Option<TableGroupId> {
        self.from_clause_indexes
            .last()
            .and_then(|index| index.find_table_group(path))
    }

    fn record_table_group(&mut self, group: TableGroupId) {
        if let Some(g) = self.table_groups.get(group) {
            self.affected_table_names
                .insert(g.primary_table_reference.table_name.clone());
        }
        crate::record_table_group();
    }

    // -- query spec ---------------------------------------------------------

    pub fn visit_query_spec(&mut self, spec: &SqmQuerySpec) -> Result<QuerySpec> {
        let is_root = self.processing_states.is_empty();
        let span = debug_span!(target: "sqmc.lower", "query_spec", is_root, depth = self.processing_states.len());
        let _g = span.enter();

        self.processing_states.push(ProcessingState {
            query_spec: QuerySpec::new(is_root),
        });
        self.from_clause_indexes.push(FromClauseIndex::new());
        let result = self.lower_query_spec_clauses(spec);
        self.from_clause_indexes.pop();
        let state = self.processing_states.pop();
        result?;
        state
            .map(|s| s.query_spec)
            .ok_or_else(|| SqmError::internal("processing-state stack underflow"))
    }

    fn lower_query_spec_clauses(&mut self, spec: &SqmQuerySpec) -> Result<()> {
        self.visit_from_clause(&spec.from_clause)?;
        self.visit_select_clause(&spec.select_clause)?;

        if let Some(where_clause) = &spec.where_clause {
            let predicate =
                self.with_clause(Clause::Where, |c| c.visit_predicate(&where_clause.predicate))?;
            self.current_query_spec_mut()?.add_restriction(predicate);
        }
        if spec.group_by_clause.is_some() {
            return Err(SqmError::not_yet_implemented("GROUP BY clause"));
        }
        if spec.having_clause.is_some() {
            return Err(SqmError::not_yet_implemented("HAVING clause"));
        }

        if let Some(order_by) = &spec.order_by_clause {
            self.with_clause(Clause::Order, |c| {
                for sort in &order_by.sort_specifications {
                    let sort_expression = c.visit_expression(&sort.expression, &DurationScope::clean())?;
                    c.current_query_spec_mut()?
                        .sort_specifications
                        .push(SortSpecification {
                            sort_expression,
                            sort_order: sort.order,
                        });
                }
                Ok(())
            })?;
        }

        if let Some(limit_offset) = &spec.limit_offset_clause {
            if let Some(limit) = &limit_offset.limit {
                let limit = self.with_clause(Clause::Limit, |c| {
                    c.visit_expression(limit, &DurationScope::clean())
                })?;
                self.current_query_spec_mut()?.limit_clause_expression = Some(limit);
            }
            if let Some(offset) = &limit_offset.offset {
                let offset = self.with_clause(Clause::Offset, |c| {
                    c.visit_expression(offset, &DurationScope::clean())
                })?;
                self.current_query_spec_mut()?.offset_clause_expression = Some(offset);
            }
        }
        Ok(())
    }

    fn visit_select_clause(&mut self, clause: &SqmSelectClause) -> Result<()> {
        self.with_clause(Clause::Select, |c| {
            c.current_query_spec_mut()?.select_clause.distinct = clause.distinct;
            for selection in &clause.selections {
                let expression = c.visit_expression(&selection.expression, &DurationScope::clean())?;
                let select_clause = &mut c.current_query_spec_mut()?.select_clause;
                match expression {
                    Expression::Navigable(reference) => {
                        for column in reference.columns {
                            select_clause.resolve_sql_selection(Expression::Column(column));
                        }
                    }
                    other => {
                        select_clause.resolve_sql_selection(other);
                    }
                }
            }
            Ok(())
        })
    }

    // -- from clause --------------------------------------------------------

    fn visit_from_clause(&mut self, clause: &SqmFromClause) -> Result<()> {
        self.with_clause(Clause::From, |c| {
            for space in &clause.spaces {
                c.visit_from_element_space(space)?;
            }
            Ok(())
        })
    }

    fn visit_from_element_space(&mut self, space: &SqmFromElementSpace) -> Result<TableGroupId> {
        let root = self.visit_root_path(&space.root)?;
        let roots = &mut self.current_query_spec_mut()?.from_clause.roots;
        if !roots.contains(&root) {
            roots.push(root);
        }
        for join in &space.joins {
            let table_group_join = match join {
                SqmSpaceJoin::Cross(cross) => self.visit_cross_join(cross)?,
                SqmSpaceJoin::Entity(entity) => {
                    return Err(SqmError::not_yet_implemented(format!(
                        "entity join '{}'",
                        entity.navigable_path
                    )));
                }
            };
            self.table_groups.add_join(root, table_group_join);
        }
        Ok(root)
    }

    /// Resolve a root from-element to its table group, creating it on first
    /// use. The root's attribute joins are lowered and attached to it.
    pub fn visit_root_path(&mut self, root: &SqmRoot) -> Result<TableGroupId> {
        if let Some(existing) = self.find_local_table_group(&root.navigable_path) {
            trace!(target: "sqmc.lower", path = %root.navigable_path, group = %existing, "root resolved to existing table group");
            return Ok(existing);
        }

        let metamodel = self.creation_context.metamodel;
        let entity = metamodel.entity(&root.entity_name)?;
        let group = entity.create_root_table_group(
            root.navigable_path.clone(),
            &mut self.table_groups,
            &mut self.alias_manager,
            self.config.default_lock_mode,
        )?;
        self.from_clause_index_mut()?
            .register_table_group(root.navigable_path.clone(), group);
        self.record_table_group(group);
        trace!(target: "sqmc.lower", path = %root.navigable_path, group = %group, "root resolved to new table group");

        for join in &root.joins {
            self.visit_attribute_join(join)?;
        }
        Ok(group)
    }

    /// Lower an attribute join against its already-resolved left-hand side.
    ///
    /// An embedded attribute does not produce a join: its path is registered
    /// under the left-hand side's group and `None` is returned. Otherwise the
    /// join is attached to the left-hand side's group and returned.
    pub fn visit_attribute_join(&mut self, join: &SqmAttributeJoin) -> Result<Option<TableGroupJoin>> {
        let lhs = self
            .find_table_group(&join.lhs_path)
            .ok_or_else(|| SqmError::UnresolvedJoinLhs {
                lhs_path: join.lhs_path.to_string(),
                join_path: join.navigable_path.to_string(),
            })?;
        let (_, attribute) = self.resolve_attribute(&join.navigable_path)?;

        if let AttributeMapping::Embedded(_) = attribute {
            self.from_clause_index_mut()?
                .register_table_group(join.navigable_path.clone(), lhs);
            trace!(target: "sqmc.lower", path = %join.navigable_path, group = %lhs, "embedded join registered under lhs table group");
            for child in &join.joins {
                self.visit_attribute_join(child)?;
            }
            return Ok(None);
        }

        if let Some(existing) = self.find_local_table_group_join(&join.navigable_path) {
            trace!(target: "sqmc.lower", path = %join.navigable_path, "join resolved to existing table group join");
            return Ok(Some(existing.clone()));
        }
        if !attribute.is_join_producer() {
            return Err(SqmError::semantic(format!(
                "attribute '{}' cannot be joined",
                join.navigable_path
            )));
        }

        let metamodel = self.creation_context.metamodel;
        let mut table_group_join = metamodel::create_table_group_join(
            metamodel,
            &attribute,
            lhs,
            join.navigable_path.clone(),
            join.join_type.to_sql(),
            &mut self.table_groups,
            &mut self.alias_manager,
            self.config.default_lock_mode,
        )?;
        self.from_clause_index_mut()?
            .register_table_group(join.navigable_path.clone(), table_group_join.joined_group);
        self.record_table_group(table_group_join.joined_group);

        if let Some(on) = &join.on_predicate {
            let predicate = self.visit_predicate(on)?;
            match self.config.join_predicate_placement {
                JoinPredicatePlacement::QueryRestriction => {
                    debug!(target: "sqmc.lower", path = %join.navigable_path, predicate = %predicate, "join predicate added to query restriction");
                    self.current_query_spec_mut()?.add_restriction(predicate);
                }
                JoinPredicatePlacement::JoinOn => {
                    table_group_join.predicate = Some(match table_group_join.predicate.take() {
                        Some(existing) => Predicate::Junction {
                            kind: JunctionKind::Conjunction,
                            predicates: vec![existing, predicate],
                        },
                        None => predicate,
                    });
                }
            }
        }

        self.from_clause_index_mut()?
            .register_table_group_join(join.navigable_path.clone(), table_group_join.clone());
        if !self.table_groups.add_join(lhs, table_group_join.clone()) {
            return Err(SqmError::internal(format!("join lhs {lhs} is not part of this statement")));
        }
        trace!(target: "sqmc.lower", path = %join.navigable_path, group = %table_group_join.joined_group, "join resolved to new table group");

        for child in &join.joins {
            self.visit_attribute_join(child)?;
        }
        Ok(Some(table_group_join))
    }

    /// Lower a cross join into a fresh table group; the returned CROSS join
    /// is not attached to anything.
    pub fn visit_cross_join(&mut self, join: &SqmCrossJoin) -> Result<TableGroupJoin> {
        let metamodel = self.creation_context.metamodel;
        let entity = metamodel.entity(&join.entity_name)?;
        let group = entity.create_root_table_group(
            join.navigable_path.clone(),
            &mut self.table_groups,
            &mut self.alias_manager,
            self.config.default_lock_mode,
        )?;
        self.from_clause_index_mut()?
            .register_table_group(join.navigable_path.clone(), group);
        self.record_table_group(group);

        for child in &join.joins {
            self.visit_attribute_join(child)?;
        }
        Ok(TableGroupJoin {
            navigable_path: join.navigable_path.clone(),
            join_type: SqlJoinType::Cross,
            joined_group: group,
            predicate: None,
        })
    }

    /// The table group a path hangs off, and the attribute the path denotes.
    ///
    /// Walks up to the closest resolved ancestor, then down through embedded
    /// attributes. Passing through a to-one or plural attribute needs an
    /// implicit join, which is not supported.
    fn resolve_attribute(&self, path: &NavigablePath) -> Result<(TableGroupId, AttributeMapping)> {
        let metamodel = self.creation_context.metamodel;
        let unresolved = || SqmError::internal(format!("no table group resolved for '{path}'"));
        let parent = path.parent().ok_or_else(unresolved)?;
        let (group_id, _) = self
            .from_clause_indexes
            .iter()
            .rev()
            .find_map(|index| index.find_closest(&parent))
            .ok_or_else(unresolved)?;
        let group = self.table_groups.get(group_id).ok_or_else(unresolved)?;
        let depth = group.navigable_path.segments().len();
        let names: Vec<&str> = path
            .segments()
            .get(depth..)
            .unwrap_or_default()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        let Some((first, rest)) = names.split_first() else {
            return Err(unresolved());
        };

        let entity = metamodel.entity(&group.entity_name)?;
        let mut attribute = entity.find_attribute(first)?;
        let mut container = (*first).to_owned();
        for name in rest {
            attribute = match attribute {
                AttributeMapping::Embedded(embeddable) => embeddable
                    .attribute(name)
                    .cloned()
                    .ok_or_else(|| SqmError::UnknownAttribute {
                        container: embeddable.name.clone(),
                        attribute: (*name).to_owned(),
                    })?,
                AttributeMapping::ToOne { .. } | AttributeMapping::Plural { .. } => {
                    return Err(SqmError::not_yet_implemented(format!(
                        "implicit join through '{container}' in '{path}'"
                    )));
                }
                AttributeMapping::Basic { .. } => {
                    return Err(SqmError::UnknownAttribute {
                        container,
                        attribute: (*name).to_owned(),
                    });
                }
            };
            container = (*name).to_owned();
        }
        Ok((group_id, attribute))
    }

    // -- expressions --------------------------------------------------------

    /// Lower an expression under a duration scope.
    pub fn visit_expression(&mut self, expression: &SqmExpression, scope: &DurationScope) -> Result<Expression> {
        match expression {
            SqmExpression::Literal(literal) => Ok(self.visit_literal(&literal.value, literal.node_type.as_ref())),
            SqmExpression::Parameter(parameter) => self.consume_sqm_parameter(parameter),
            SqmExpression::Unary(op) => self.visit_unary_operation(op, scope),
            SqmExpression::BinaryArithmetic(arithmetic) => self.visit_binary_arithmetic(arithmetic, scope),
            SqmExpression::Concat(concat) => {
                let lhs = self.visit_expression(&concat.lhs, &DurationScope::clean())?;
                let rhs = self.visit_expression(&concat.rhs, &DurationScope::clean())?;
                self.generate_function("concat", vec![lhs, rhs], self.basic_type(&JavaType::STRING))
            }
            SqmExpression::CaseSimple(case) => {
                let fixture = self.visit_expression(&case.fixture, &DurationScope::clean())?;
                let fixture_type = Some(fixture.expression_type());
                let result_type = self.static_type_of(expression);
                let mut whens = Vec::with_capacity(case.when_fragments.len());
                for (test, result) in &case.when_fragments {
                    let test = self.with_inferrable_type(fixture_type.clone(), |c| {
                        c.visit_expression(test, &DurationScope::clean())
                    })?;
                    let result = self.with_inferrable_type(result_type.clone(), |c| {
                        c.visit_expression(result, scope)
                    })?;
                    whens.push((test, result));
                }
                let otherwise = case
                    .otherwise
                    .as_ref()
                    .map(|o| self.with_inferrable_type(result_type.clone(), |c| c.visit_expression(o, scope)))
                    .transpose()?
                    .map(Box::new);
                Ok(Expression::CaseSimple {
                    fixture: Box::new(fixture),
                    whens,
                    otherwise,
                    ty: self.basic_type(&case.node_type),
                })
            }
            SqmExpression::CaseSearched(case) => {
                let result_type = self.static_type_of(expression);
                let mut whens = Vec::with_capacity(case.when_fragments.len());
                for (predicate, result) in &case.when_fragments {
                    let predicate = self.visit_predicate(predicate)?;
                    let result = self.with_inferrable_type(result_type.clone(), |c| {
                        c.visit_expression(result, scope)
                    })?;
                    whens.push((predicate, result));
                }
                let otherwise = case
                    .otherwise
                    .as_ref()
                    .map(|o| self.with_inferrable_type(result_type.clone(), |c| c.visit_expression(o, scope)))
                    .transpose()?
                    .map(Box::new);
                Ok(Expression::CaseSearched {
                    whens,
                    otherwise,
                    ty: self.basic_type(&case.node_type),
                })
            }
            SqmExpression::SubQuery(sub_query) => {
                let query_spec = self.visit_query_spec(&sub_query.query_spec)?;
                Ok(Expression::SubQuery {
                    query_spec: Box::new(query_spec),
                    ty: Some(self.basic_type(&sub_query.node_type)),
                })
            }
            SqmExpression::Function(function) => self.visit_function(function),
            SqmExpression::Path(path) => self.visit_path(path, scope),
            SqmExpression::ToDuration(to_duration) => self.visit_to_duration(to_duration, scope),
            SqmExpression::ByUnit(by_unit) => self.visit_by_unit(by_unit, scope),
            SqmExpression::Tuple(_) => Err(SqmError::not_yet_implemented("tuple expression")),
        }
    }

    fn basic_type(&self, ty: &JavaType) -> BasicType {
        self.type_configuration().basic_type_for(ty)
    }

    fn duration_type(&self) -> BasicType {
        self.type_configuration().basic_type(BasicJavaType::Duration)
    }

    fn visit_literal(&self, value: &LiteralValue, node_type: Option<&JavaType>) -> Expression {
        let ty = match node_type {
            Some(ty) => self.basic_type(ty),
            None => self
                .inferred_type()
                .and_then(|mappings| mappings.first().copied())
                .unwrap_or(BasicType::OBJECT),
        };
        Expression::QueryLiteral {
            value: value.clone(),
            ty,
            in_select: self.current_clause() == Some(Clause::Select),
        }
    }

    fn visit_unary_operation(&mut self, op: &SqmUnaryOperation, scope: &DurationScope) -> Result<Expression> {
        let tc = self.type_configuration();
        let is_duration = op.operand.node_type().is_some_and(|t| tc.is_duration(&t));
        if is_duration {
            return match op.operator {
                UnaryArithmeticOperator::UnaryMinus => {
                    self.visit_expression(&op.operand, &scope.with_negation_flipped())
                }
                UnaryArithmeticOperator::UnaryPlus => self.visit_expression(&op.operand, scope),
            };
        }
        let operand = self.visit_expression(&op.operand, scope)?;
        let ty = operand.single_type().unwrap_or(BasicType::OBJECT);
        Ok(Expression::Unary {
            operator: op.operator,
            operand: Box::new(operand),
            ty,
        })
    }

    fn visit_binary_arithmetic(&mut self, expr: &SqmBinaryArithmetic, scope: &DurationScope) -> Result<Expression> {
        let tc = self.type_configuration();
        let lhs_type = expr.lhs.node_type();
        let rhs_type = expr.rhs.node_type();
        let temporal_left = lhs_type.as_ref().is_some_and(|t| tc.is_temporal(t));
        let temporal_right = rhs_type.as_ref().is_some_and(|t| tc.is_temporal(t));
        let duration_left = lhs_type.as_ref().is_some_and(|t| tc.is_duration(t));
        let duration_right = rhs_type.as_ref().is_some_and(|t| tc.is_duration(t));
        let operator = expr.operator;

        if temporal_left && duration_right && scope.has_pending_scale() {
            return Err(SqmError::ScalarMultiplicationOfTemporal {
                operand: describe(&expr.lhs),
            });
        }
        if temporal_left != temporal_right
            && !matches!(
                operator,
                BinaryArithmeticOperator::Add | BinaryArithmeticOperator::Subtract
            )
        {
            let operand = if temporal_left { &expr.lhs } else { &expr.rhs };
            return Err(SqmError::ScalarMultiplicationOfTemporal {
                operand: describe(operand),
            });
        }

        if duration_right && (scope.adjusted_timestamp().is_some() || temporal_left) {
            crate::record_duration_rewrite();
            return self.transform_duration_arithmetic(operator, &expr.lhs, &expr.rhs, scope);
        }
        if duration_left
            && scope.adjusted_timestamp().is_some()
            && !matches!(operator, BinaryArithmeticOperator::Multiply)
        {
            return Err(SqmError::IllegalDurationOperator {
                operator: operator.symbol().to_owned(),
            });
        }
        if operator == BinaryArithmeticOperator::Multiply && duration_left != duration_right {
            // `d * n` scales like `n * d`.
            let (scalar, duration) = if duration_right {
                (&expr.lhs, &expr.rhs)
            } else {
                (&expr.rhs, &expr.lhs)
            };
            crate::record_duration_rewrite();
            return self.transform_duration_arithmetic(operator, scalar, duration, scope);
        }
        if temporal_left && temporal_right {
            crate::record_duration_rewrite();
            return self.transform_datetime_arithmetic(expr, scope);
        }

        let ty = match scope.applied_by_unit() {
            Some(by_unit) if duration_right => by_unit.ty,
            _ => self.basic_type(&expr.node_type),
        };
        let lhs_hint = self.static_type_of(&expr.rhs);
        let rhs_hint = self.static_type_of(&expr.lhs);
        let lhs = self.with_inferrable_type(lhs_hint, |c| c.visit_expression(&expr.lhs, scope))?;
        let rhs = self.with_inferrable_type(rhs_hint, |c| c.visit_expression(&expr.rhs, scope))?;
        if operator == BinaryArithmeticOperator::Modulo {
            return self.generate_function("mod", vec![lhs, rhs], ty);
        }
        Ok(Expression::BinaryArithmetic {
            lhs: Box::new(lhs),
            operator,
            rhs: Box::new(rhs),
            ty,
        })
    }

    /// `ts ± (d1 ± d2)` becomes `(ts ± d1) ± d2`: the left operand becomes
    /// the timestamp the right operand adjusts. `n * d` pushes `n` into the
    /// scale applied to `d`.
    fn transform_duration_arithmetic(
        &mut self,
        operator: BinaryArithmeticOperator,
        lhs: &SqmExpression,
        duration: &SqmExpression,
        scope: &DurationScope,
    ) -> Result<Expression> {
        match operator {
            BinaryArithmeticOperator::Add | BinaryArithmeticOperator::Subtract => {
                let timestamp = self.visit_expression(lhs, scope)?;
                let mut duration_scope = scope.with_adjusted_timestamp(timestamp);
                if operator == BinaryArithmeticOperator::Subtract {
                    duration_scope = duration_scope.with_negation_flipped();
                }
                self.visit_expression(duration, &duration_scope)
            }
            BinaryArithmeticOperator::Multiply => {
                let scalar = self.visit_expression(lhs, &DurationScope::clean())?;
                let scale = scope.apply_scale(scalar, self.type_configuration());
                self.visit_expression(duration, &scope.with_scale(scale))
            }
            BinaryArithmeticOperator::Divide
            | BinaryArithmeticOperator::Quot
            | BinaryArithmeticOperator::Modulo => Err(SqmError::IllegalDurationOperator {
                operator: operator.symbol().to_owned(),
            }),
        }
    }

    /// `t1 - t2` is the duration between two temporal values.
    fn transform_datetime_arithmetic(&mut self, expr: &SqmBinaryArithmetic, scope: &DurationScope) -> Result<Expression> {
        let tc = self.type_configuration();
        let lhs_type = expr.lhs.node_type().unwrap_or(JavaType::OBJECT);
        let rhs_type = expr.rhs.node_type().unwrap_or(JavaType::OBJECT);
        if expr.operator != BinaryArithmeticOperator::Subtract {
            return Err(SqmError::IllegalTemporalOperator {
                operator: expr.operator.symbol().to_owned(),
                lhs: lhs_type.to_string(),
                rhs: rhs_type.to_string(),
            });
        }

        let left = self.visit_expression(&expr.lhs, &DurationScope::clean())?;
        let right = self.visit_expression(&expr.rhs, &DurationScope::clean())?;
        let unit = if tc.is_timestamp(&lhs_type) || tc.is_timestamp(&rhs_type) {
            TemporalUnit::Native
        } else {
            TemporalUnit::Day
        };

        match scope.target()? {
            DurationTarget::Timestamp(timestamp) => {
                let difference = self.timestampdiff(unit, right, left)?;
                let magnitude = scope.apply_scale(difference, tc);
                self.timestampadd(unit, magnitude, timestamp.clone())
            }
            DurationTarget::ByUnit(by_unit) => {
                let difference = self.timestampdiff(by_unit.unit, right, left)?;
                Ok(scope.apply_scale(difference, tc))
            }
            DurationTarget::Duration => {
                let difference = self.timestampdiff(unit, right, left)?;
                Ok(Expression::Duration {
                    magnitude: Box::new(scope.apply_scale(difference, tc)),
                    unit,
                    ty: self.duration_type(),
                })
            }
        }
    }

    fn visit_to_duration(&mut self, to_duration: &SqmToDuration, scope: &DurationScope) -> Result<Expression> {
        let magnitude = self.visit_expression(&to_duration.magnitude, &DurationScope::clean())?;
        self.scaled_duration(magnitude, to_duration.unit, scope)
    }

    fn visit_by_unit(&mut self, by_unit: &SqmByUnit, scope: &DurationScope) -> Result<Expression> {
        let ty = self.basic_type(&by_unit.node_type);
        self.visit_expression(&by_unit.duration, &scope.with_by_unit(by_unit.unit, ty))
    }

    /// A duration of `magnitude` units under `scope`: added to the adjusted
    /// timestamp, converted to the pending by-unit, or left as a duration.
    fn scaled_duration(&self, magnitude: Expression, unit: TemporalUnit, scope: &DurationScope) -> Result<Expression> {
        let target = scope.target()?;
        let scaled = scope.apply_scale(magnitude, self.type_configuration());
        let ty = self.duration_type();
        let duration = |magnitude: Expression| Expression::Duration {
            magnitude: Box::new(magnitude),
            unit,
            ty,
        };
        match target {
            DurationTarget::Timestamp(timestamp) => self.timestampadd(unit, scaled, timestamp.clone()),
            DurationTarget::ByUnit(by_unit) => {
                unit.conversion_factor(by_unit.unit)?;
                Ok(Expression::Conversion {
                    duration: Box::new(duration(scaled)),
                    unit: by_unit.unit,
                    ty: by_unit.ty,
                })
            }
            DurationTarget::Duration => Ok(duration(scaled)),
        }
    }

    fn timestampadd(&self, unit: TemporalUnit, magnitude: Expression, timestamp: Expression) -> Result<Expression> {
        let ty = timestamp.single_type().unwrap_or(BasicType::OBJECT);
        self.generate_function(
            "timestampadd",
            vec![duration_unit(unit), magnitude, timestamp],
            ty,
        )
    }

    fn timestampdiff(&self, unit: TemporalUnit, from: Expression, to: Expression) -> Result<Expression> {
        self.generate_function(
            "timestampdiff",
            vec![duration_unit(unit), from, to],
            BasicType::LONG,
        )
    }

    fn generate_function(&self, name: &str, arguments: Vec<Expression>, inferred: BasicType) -> Result<Expression> {
        let descriptor = self
            .creation_context
            .functions
            .find(name, arguments.len())
            .ok_or_else(|| {
                SqmError::semantic(format!(
                    "no function '{name}' taking {} arguments",
                    arguments.len()
                ))
            })?;
        Ok(descriptor.generate(arguments, inferred))
    }

    fn visit_function(&mut self, function: &SqmFunction) -> Result<Expression> {
        let inferred = self.basic_type(&function.node_type);
        let mut arguments = function
            .arguments
            .iter()
            .map(|a| self.visit_expression(a, &DurationScope::clean()))
            .collect::<Result<Vec<_>>>()?;

        let name = match &function.kind {
            SqmFunctionKind::Avg { distinct } | SqmFunctionKind::Sum { distinct } | SqmFunctionKind::Count { distinct } => {
                if *distinct {
                    arguments = arguments
                        .into_iter()
                        .map(|a| Expression::Distinct(Box::new(a)))
                        .collect();
                }
                match function.kind {
                    SqmFunctionKind::Avg { .. } => "avg",
                    SqmFunctionKind::Sum { .. } => "sum",
                    _ => "count",
                }
            }
            SqmFunctionKind::CountStar => {
                arguments = vec![Expression::Star];
                "count"
            }
            SqmFunctionKind::Min => "min",
            SqmFunctionKind::Max => "max",
            SqmFunctionKind::Substring => "substring",
            SqmFunctionKind::Trim { spec, character } => {
                let spec = match spec {
                    TrimSpec::Leading => "leading",
                    TrimSpec::Trailing => "trailing",
                    TrimSpec::Both => "both",
                };
                let string_type = self.basic_type(&JavaType::STRING);
                let mut trim_arguments = vec![
                    Expression::QueryLiteral {
                        value: LiteralValue::String(spec.to_owned()),
                        ty: string_type,
                        in_select: false,
                    },
                    Expression::QueryLiteral {
                        value: LiteralValue::Character(character.unwrap_or(' ')),
                        ty: self.type_configuration().basic_type(BasicJavaType::Character),
                        in_select: false,
                    },
                ];
                trim_arguments.append(&mut arguments);
                arguments = trim_arguments;
                "trim"
            }
            SqmFunctionKind::Cast { target } => {
                return self.generate_function("cast", arguments, self.basic_type(target));
            }
            SqmFunctionKind::Upper => "upper",
            SqmFunctionKind::Lower => "lower",
            SqmFunctionKind::Length => "length",
            SqmFunctionKind::Locate => "locate",
            SqmFunctionKind::Abs => "abs",
            SqmFunctionKind::Mod => "mod",
            SqmFunctionKind::Coalesce => "coalesce",
            SqmFunctionKind::NullIf => "nullif",
            SqmFunctionKind::Concat => "concat",
            SqmFunctionKind::CurrentDate => "current_date",
            SqmFunctionKind::CurrentTime => "current_time",
            SqmFunctionKind::CurrentTimestamp => "current_timestamp",
            SqmFunctionKind::Extract { unit } => {
                arguments.insert(0, duration_unit(*unit));
                "extract"
            }
            SqmFunctionKind::Generic { name } => {
                return Ok(
                    match self.creation_context.functions.find(name, arguments.len()) {
                        Some(descriptor) => descriptor.generate(arguments, inferred),
                        None => Expression::Function {
                            name: name.clone(),
                            arguments,
                            ty: inferred,
                        },
                    },
                );
            }
        };
        self.generate_function(name, arguments, inferred)
    }

    // -- paths --------------------------------------------------------------

    fn visit_path(&mut self, path: &SqmPath, scope: &DurationScope) -> Result<Expression> {
        match path.kind {
            SqmPathKind::Basic => self.visit_basic_valued_path(path, scope),
            SqmPathKind::Embedded => self.visit_embedded_valued_path(path),
            SqmPathKind::Entity => self.visit_entity_valued_path(path),
            SqmPathKind::Plural
            | SqmPathKind::CollectionElement
            | SqmPathKind::CollectionIndex
            | SqmPathKind::MapEntry => Err(SqmError::not_yet_implemented(format!(
                "{:?} path '{}'",
                path.kind, path.navigable_path
            ))),
        }
    }

    fn navigable_reference(&self, path: &SqmPath, kind: NavigableKind) -> Result<NavigableReference> {
        let (group_id, attribute) = self.resolve_attribute(&path.navigable_path)?;
        let qualifier = self
            .table_groups
            .get(group_id)
            .map(|g| g.primary_table_reference.identification_variable.clone())
            .ok_or_else(|| SqmError::internal(format!("table group {group_id} vanished")))?;
        let columns = attribute.columns(self.creation_context.metamodel, &qualifier)?;
        Ok(NavigableReference {
            kind,
            navigable_path: path.navigable_path.clone(),
            table_group: group_id,
            columns,
            ty: path.node_type.clone(),
        })
    }

    fn visit_basic_valued_path(&mut self, path: &SqmPath, scope: &DurationScope) -> Result<Expression> {
        let reference = Expression::Navigable(self.navigable_reference(path, NavigableKind::Basic)?);
        if !self.type_configuration().is_duration(&path.node_type) {
            return Ok(reference);
        }
        self.scaled_duration(reference, self.config.duration_storage_unit, scope)
    }

    fn visit_embedded_valued_path(&mut self, path: &SqmPath) -> Result<Expression> {
        Ok(Expression::Navigable(
            self.navigable_reference(path, NavigableKind::Embedded)?,
        ))
    }

    fn visit_entity_valued_path(&mut self, path: &SqmPath) -> Result<Expression> {
        let Some(group_id) = self.find_table_group(&path.navigable_path) else {
            // to-one attribute without a join: its foreign key columns
            return Ok(Expression::Navigable(
                self.navigable_reference(path, NavigableKind::Entity)?,
            ));
        };
        let group = self
            .table_groups
            .get(group_id)
            .ok_or_else(|| SqmError::internal(format!("table group {group_id} vanished")))?;
        let entity = self.creation_context.metamodel.entity(&group.entity_name)?;
        let column = group.column(
            &entity.identifier_column,
            entity.identifier_jdbc_type(self.type_configuration()),
        );
        Ok(Expression::Navigable(NavigableReference {
            kind: NavigableKind::Entity,
            navigable_path: path.navigable_path.clone(),
            table_group: group_id,
            columns: smallvec![column],
            ty: path.node_type.clone(),
        }))
    }

    // -- parameters ---------------------------------------------------------

    /// Resolve a semantic parameter to its JDBC placeholders, one per column
    /// of its inferred type. A parameter consumed before is replaced by a
    /// copy so that each occurrence binds independently.
    fn consume_sqm_parameter(&mut self, parameter: &SqmParameter) -> Result<Expression> {
        let copy;
        let parameter = if self.jdbc_params_by_sqm_param.contains_key(&parameter.id) {
            copy = parameter.copy();
            self.xref.add_duplicate(parameter, &copy);
            debug!(target: "sqmc.params", parameter = %parameter.kind, original = %parameter.id, copy = %copy.id, "repeated parameter occurrence copied");
            &copy
        } else {
            parameter
        };

        let mappings = self.determine_parameter_mappings(parameter)?;
        let jdbc_parameters: SmallVec<[JdbcParameter; 1]> = mappings
            .iter()
            .map(|mapping| self.jdbc_parameters.add(*mapping))
            .collect();
        crate::record_jdbc_parameters(jdbc_parameters.len());
        trace!(target: "sqmc.params", parameter = %parameter.kind, id = %parameter.id, placeholders = jdbc_parameters.len(), "parameter consumed");
        self.jdbc_params_by_sqm_param
            .insert(parameter.id, jdbc_parameters.to_vec());
        Ok(Expression::Parameter { jdbc_parameters })
    }

    fn determine_parameter_mappings(&self, parameter: &SqmParameter) -> Result<JdbcMappings> {
        let metamodel = self.creation_context.metamodel;
        if let Some(ty) = &parameter.anticipated_type {
            return metamodel::jdbc_mappings_of(metamodel, ty);
        }
        if let Some(inferred) = self.inferred_type() {
            return Ok(inferred.clone());
        }
        if let Some(ty) = self
            .bindings
            .binding(&parameter.kind)
            .and_then(|binding| binding.bind_type())
        {
            return metamodel::jdbc_mappings_of(metamodel, &ty);
        }
        if matches!(self.current_clause(), Some(Clause::Limit | Clause::Offset)) {
            return Ok(smallvec![BasicType::INTEGER]);
        }
        trace!(target: "sqmc.params", parameter = %parameter.kind, "parameter type falls back to Object");
        Ok(ParameterFallbackType.jdbc_mappings())
    }

    /// Best-effort static JDBC type of a semantic expression, used as the
    /// inferrable type of its sibling.
    fn static_type_of(&self, expression: &SqmExpression) -> Option<JdbcMappings> {
        let metamodel = self.creation_context.metamodel;
        match expression {
            SqmExpression::Path(path) if path.kind == SqmPathKind::Embedded => {
                let reference = self.navigable_reference(path, NavigableKind::Embedded).ok()?;
                Some(reference.columns.iter().map(|c| c.jdbc_mapping).collect())
            }
            SqmExpression::Parameter(parameter) if parameter.anticipated_type.is_none() => None,
            SqmExpression::Literal(literal) if literal.node_type.is_none() => None,
            other => other
                .node_type()
                .and_then(|ty| metamodel::jdbc_mappings_of(metamodel, &ty).ok()),
        }
    }

    // -- predicates ---------------------------------------------------------

    pub fn visit_predicate(&mut self, predicate: &SqmPredicate) -> Result<Predicate> {
        let clean = DurationScope::clean();
        match predicate {
            SqmPredicate::And(junction) | SqmPredicate::Or(junction) => {
                let kind = if matches!(predicate, SqmPredicate::And(_)) {
                    JunctionKind::Conjunction
                } else {
                    JunctionKind::Disjunction
                };
                let lhs = self.visit_predicate(&junction.lhs)?;
                let rhs = self.visit_predicate(&junction.rhs)?;
                Ok(Predicate::Junction {
                    kind,
                    predicates: vec![lhs, rhs],
                })
            }
            SqmPredicate::Negated(inner) => Ok(Predicate::Negated(Box::new(self.visit_predicate(inner)?))),
            SqmPredicate::Grouped(inner) => Ok(Predicate::Grouped(Box::new(self.visit_predicate(inner)?))),
            SqmPredicate::Comparison(comparison) => {
                let lhs_hint = self.static_type_of(&comparison.rhs);
                let rhs_hint = self.static_type_of(&comparison.lhs);
                let lhs = self.with_inferrable_type(lhs_hint, |c| c.visit_expression(&comparison.lhs, &clean))?;
                let rhs = self.with_inferrable_type(rhs_hint, |c| c.visit_expression(&comparison.rhs, &clean))?;
                Ok(Predicate::Comparison {
                    lhs,
                    operator: comparison.operator,
                    rhs,
                })
            }
            SqmPredicate::Between(between) => {
                let expression_hint = self
                    .static_type_of(&between.lower)
                    .or_else(|| self.static_type_of(&between.upper));
                let bound_hint = self.static_type_of(&between.expression);
                let expression = self.with_inferrable_type(expression_hint, |c| {
                    c.visit_expression(&between.expression, &clean)
                })?;
                let lower_bound = self.with_inferrable_type(bound_hint.clone(), |c| {
                    c.visit_expression(&between.lower, &clean)
                })?;
                let upper_bound = self.with_inferrable_type(bound_hint, |c| {
                    c.visit_expression(&between.upper, &clean)
                })?;
                Ok(Predicate::Between {
                    expression,
                    lower_bound,
                    upper_bound,
                    negated: between.negated,
                })
            }
            SqmPredicate::Like(like) => {
                let match_hint = self.static_type_of(&like.pattern);
                let pattern_hint = self.static_type_of(&like.match_expression);
                let match_expression = self.with_inferrable_type(match_hint, |c| {
                    c.visit_expression(&like.match_expression, &clean)
                })?;
                let pattern = self.with_inferrable_type(pattern_hint.clone(), |c| {
                    c.visit_expression(&like.pattern, &clean)
                })?;
                let escape_character = like
                    .escape
                    .as_ref()
                    .map(|e| self.with_inferrable_type(pattern_hint.clone(), |c| c.visit_expression(e, &clean)))
                    .transpose()?;
                Ok(Predicate::Like {
                    match_expression,
                    pattern,
                    escape_character,
                    negated: like.negated,
                })
            }
            SqmPredicate::InList(in_list) => self.visit_in_list_predicate(in_list),
            SqmPredicate::InSubQuery(in_sub_query) => {
                let test_expression = self.with_inferrable_type(None, |c| {
                    c.visit_expression(&in_sub_query.test_expression, &clean)
                })?;
                let sub_query = self.visit_query_spec(&in_sub_query.sub_query.query_spec)?;
                Ok(Predicate::InSubQuery {
                    test_expression,
                    sub_query: Box::new(sub_query),
                    negated: in_sub_query.negated,
                })
            }
            SqmPredicate::MemberOf(member_of) => Err(SqmError::not_yet_implemented(format!(
                "member-of predicate on '{}'",
                member_of.plural_path.navigable_path
            ))),
            SqmPredicate::Emptiness(emptiness) => Err(SqmError::not_yet_implemented(format!(
                "emptiness predicate on '{}'",
                emptiness.plural_path.navigable_path
            ))),
            SqmPredicate::Nullness(nullness) => Ok(Predicate::Nullness {
                expression: self.visit_expression(&nullness.expression, &clean)?,
                negated: nullness.negated,
            }),
            SqmPredicate::BooleanExpression(expression) => Ok(Predicate::BooleanExpression(
                self.visit_expression(expression, &clean)?,
            )),
        }
    }

    /// `x in (:p)` where `:p` is bound to several values expands into one
    /// placeholder group per value. The first value keeps the original
    /// parameter, every further value gets a copy recorded as an expansion.
    fn visit_in_list_predicate(&mut self, predicate: &SqmInListPredicate) -> Result<Predicate> {
        let clean = DurationScope::clean();
        let test_hint = predicate
            .list_expressions
            .iter()
            .find_map(|e| self.static_type_of(e));
        let list_hint = self.static_type_of(&predicate.test_expression);
        let test_expression = self.with_inferrable_type(test_hint, |c| {
            c.visit_expression(&predicate.test_expression, &clean)
        })?;

        if let [SqmExpression::Parameter(parameter)] = predicate.list_expressions.as_slice() {
            let binding = self.bindings.binding(&parameter.kind);
            let value_count = binding
                .filter(|b| b.is_multi_valued())
                .map_or(0, |b| b.bind_values().len());
            if parameter.allow_multi_valued && self.config.expand_multi_valued_parameters && value_count > 1 {
                let span = debug_span!(target: "sqmc.params", "expand_parameter", parameter = %parameter.kind, values = value_count);
                let _g = span.enter();
                let list_expressions = self.with_inferrable_type(list_hint, |c| {
                    let mut expressions = Vec::with_capacity(value_count);
                    expressions.push(c.consume_sqm_parameter(parameter)?);
                    for _ in 1..value_count {
                        let expansion = parameter.copy();
                        c.xref.add_expansion(parameter, &expansion);
                        crate::record_parameter_expansion();
                        expressions.push(c.consume_sqm_parameter(&expansion)?);
                    }
                    Ok(expressions)
                })?;
                debug!(target: "sqmc.params", expansions = value_count - 1, "multi-valued parameter expanded");
                return Ok(Predicate::InList {
                    test_expression,
                    list_expressions,
                    negated: predicate.negated,
                });
            }
        }

        let list_expressions = self.with_inferrable_type(list_hint, |c| {
            predicate
                .list_expressions
                .iter()
                .map(|e| c.visit_expression(e, &clean))
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(Predicate::InList {
            test_expression,
            list_expressions,
            negated: predicate.negated,
        })
    }
}

fn duration_unit(unit: TemporalUnit) -> Expression {
    Expression::DurationUnit {
        unit,
        ty: BasicType::LONG,
    }
}

fn describe(expression: &SqmExpression) -> String {
    match expression {
        SqmExpression::Path(path) => path.navigable_path.to_string(),
        SqmExpression::Literal(literal) => literal.value.to_string(),
        SqmExpression::Parameter(parameter) => parameter.kind.to_string(),
        other => other
            .node_type()
            .map_or_else(|| "expression".to_owned(), |t| t.to_string()),
    }
}

const fn statement_kind(statement: &SqmStatement) -> &'static str {
    match statement {
        SqmStatement::Select(_) => "select",
        SqmStatement::Update(_) => "update",
        SqmStatement::Delete(_) => "delete",
        SqmStatement::InsertSelect(_) => "insert-select",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sqmc_error::ErrorKind;
    use sqmc_sqm::{
        ParameterKind, SqmInSubQueryPredicate, SqmJoinType, SqmMemberOfPredicate,
        SqmNullnessPredicate, SqmSelectStatement, SqmSetClause, SqmSubQuery, SqmTuple,
        SqmUpdateStatement,
    };
    use sqmc_types::ComparisonOperator;

    use crate::metamodel::{EmbeddableMapping, EntityMapping, Metamodel};
    use crate::parameters::ParameterBinding;

    struct Fixture {
        metamodel: Metamodel,
        functions: SqlFunctionRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let tc = TypeConfiguration::new();
            let metamodel = Metamodel::new(tc)
                .with_entity(
                    EntityMapping::new("Person", "person", "id")
                        .with_attribute("name", AttributeMapping::basic("name", BasicJavaType::String))
                        .with_attribute("age", AttributeMapping::basic("age", BasicJavaType::Integer))
                        .with_attribute("birthday", AttributeMapping::basic("birthday", BasicJavaType::LocalDate))
                        .with_attribute("created", AttributeMapping::basic("created", BasicJavaType::LocalDateTime))
                        .with_attribute("workTime", AttributeMapping::basic("work_time", BasicJavaType::Duration))
                        .with_attribute(
                            "address",
                            AttributeMapping::Embedded(
                                EmbeddableMapping::new("Address")
                                    .with_attribute("city", AttributeMapping::basic("city", BasicJavaType::String))
                                    .with_attribute("zip", AttributeMapping::basic("zip", BasicJavaType::String)),
                            ),
                        )
                        .with_attribute("employer", AttributeMapping::to_one("Company", "employer_id"))
                        .with_attribute("pets", AttributeMapping::plural("Pet", "owner_id")),
                )
                .with_entity(
                    EntityMapping::new("Company", "company", "id")
                        .with_attribute("name", AttributeMapping::basic("name", BasicJavaType::String)),
                )
                .with_entity(EntityMapping::new("Pet", "pet", "id"));
            Self {
                metamodel,
                functions: SqlFunctionRegistry::standard(&tc),
            }
        }

        fn context(&self) -> SqlAstCreationContext<'_> {
            SqlAstCreationContext {
                metamodel: &self.metamodel,
                functions: &self.functions,
            }
        }

        fn lower_with(
            &self,
            statement: &SqmStatement,
            config: ConverterConfig,
            bindings: &QueryParameterBindings,
        ) -> Result<SqmTranslation> {
            let xref = DomainParameterXref::from_statement(statement)?;
            SqmToSqlAstConverter::new(self.context(), config, bindings, xref).translate(statement)
        }

        fn lower(&self, statement: &SqmStatement) -> Result<SqmTranslation> {
            self.lower_with(statement, ConverterConfig::default(), &QueryParameterBindings::new())
        }
    }

    fn select(spec: SqmQuerySpec) -> SqmStatement {
        SqmStatement::Select(SqmSelectStatement { query_spec: spec })
    }

    fn person() -> SqmRoot {
        SqmRoot::new("Person", Some("p"))
    }

    fn attr(root: &SqmRoot, name: &str, ty: JavaType) -> SqmExpression {
        SqmExpression::Path(SqmPath::basic(&root.navigable_path, name, ty))
    }

    fn select_one(root: SqmRoot, expression: SqmExpression) -> SqmQuerySpec {
        SqmQuerySpec::new(SqmFromClause::of(root), SqmSelectClause::of(vec![expression]))
    }

    fn render(t: &SqmTranslation) -> String {
        t.sql_ast
            .query_spec
            .display(&t.sql_ast.table_groups)
            .to_string()
    }

    fn selected(t: &SqmTranslation) -> String {
        t.sql_ast.query_spec.select_clause.sql_selections()[0]
            .expression
            .to_string()
    }

    fn hours(n: i64) -> SqmExpression {
        SqmExpression::to_duration(SqmExpression::integer(n), TemporalUnit::Hour)
    }

    fn days(n: i64) -> SqmExpression {
        SqmExpression::to_duration(SqmExpression::integer(n), TemporalUnit::Day)
    }

    fn duration_op(lhs: SqmExpression, op: BinaryArithmeticOperator, rhs: SqmExpression) -> SqmExpression {
        SqmExpression::binary(lhs, op, rhs, JavaType::DURATION)
    }

    fn timestamp_op(lhs: SqmExpression, op: BinaryArithmeticOperator, rhs: SqmExpression) -> SqmExpression {
        SqmExpression::binary(lhs, op, rhs, JavaType::LOCAL_DATE_TIME)
    }

    fn lower_selected(f: &Fixture, build: impl FnOnce(&SqmRoot) -> SqmExpression) -> Result<String> {
        let root = person();
        let expression = build(&root);
        let t = f.lower(&select(select_one(root, expression)))?;
        Ok(selected(&t))
    }

    // -- from clause --------------------------------------------------------

    #[test]
    fn lowers_basic_select_with_inferred_parameter() {
        let f = Fixture::new();
        let root = person();
        let spec = select_one(root.clone(), attr(&root, "name", JavaType::STRING)).with_where(
            SqmPredicate::comparison(
                attr(&root, "age", JavaType::INTEGER),
                ComparisonOperator::GreaterThan,
                SqmExpression::Parameter(SqmParameter::named("min")),
            ),
        );
        let t = f.lower(&select(spec)).unwrap();
        assert_eq!(render(&t), "select p1_0.name from person p1_0 where p1_0.age > ?");
        assert!(t.sql_ast.query_spec.is_root);
        assert_eq!(t.jdbc_parameters.len(), 1);
        assert_eq!(t.jdbc_parameters.parameters()[0].jdbc_mapping, BasicType::INTEGER);
        assert_eq!(t.affected_table_names.iter().collect::<Vec<_>>(), ["person"]);
    }

    #[test]
    fn root_resolution_is_idempotent() {
        let f = Fixture::new();
        let bindings = QueryParameterBindings::new();
        let mut conv = SqmToSqlAstConverter::new(
            f.context(),
            ConverterConfig::default(),
            &bindings,
            DomainParameterXref::new(),
        );
        let root = person();
        let first = conv.visit_root_path(&root).unwrap();
        let second = conv.visit_root_path(&root).unwrap();
        assert_eq!(first, second);
        assert_eq!(conv.table_groups().len(), 1);

        let other = conv.visit_root_path(&SqmRoot::new("Person", Some("q"))).unwrap();
        assert_ne!(first, other);
        let alias = |id| {
            conv.table_groups()
                .get(id)
                .map(|g| g.primary_table_reference.identification_variable.clone())
        };
        assert_eq!(alias(first).as_deref(), Some("p1_0"));
        assert_eq!(alias(other).as_deref(), Some("p2_0"));
    }

    #[test]
    fn embedded_join_reuses_owner_group() {
        let f = Fixture::new();
        let root = person();
        let join = SqmAttributeJoin::new(&root.navigable_path, "address", Some("a"), SqmJoinType::Inner);
        let city = SqmExpression::Path(SqmPath::basic(&join.navigable_path, "city", JavaType::STRING));
        let t = f.lower(&select(select_one(root.with_join(join), city))).unwrap();
        assert_eq!(render(&t), "select p1_0.city from person p1_0");
        assert_eq!(t.sql_ast.table_groups.len(), 1);
    }

    #[test]
    fn embedded_join_returns_no_table_group_join() {
        let f = Fixture::new();
        let bindings = QueryParameterBindings::new();
        let mut conv = SqmToSqlAstConverter::new(
            f.context(),
            ConverterConfig::default(),
            &bindings,
            DomainParameterXref::new(),
        );
        let root = person();
        let group = conv.visit_root_path(&root).unwrap();
        let address = SqmAttributeJoin::new(&root.navigable_path, "address", None, SqmJoinType::Inner);
        assert_eq!(conv.visit_attribute_join(&address).unwrap(), None);
        assert_eq!(
            conv.from_clause_index()
                .and_then(|index| index.find_table_group(&address.navigable_path)),
            Some(group)
        );

        let employer = SqmAttributeJoin::new(&root.navigable_path, "employer", Some("e"), SqmJoinType::Left);
        let first = conv.visit_attribute_join(&employer).unwrap().unwrap();
        let again = conv.visit_attribute_join(&employer).unwrap().unwrap();
        assert_eq!(first, again);
        assert_eq!(first.join_type, SqlJoinType::Left);
        assert_eq!(conv.table_groups().len(), 2);
    }

    #[test]
    fn join_lhs_must_be_resolved() {
        let f = Fixture::new();
        let bindings = QueryParameterBindings::new();
        let mut conv = SqmToSqlAstConverter::new(
            f.context(),
            ConverterConfig::default(),
            &bindings,
            DomainParameterXref::new(),
        );
        let ghost = NavigablePath::root("Ghost", Some("g"));
        let join = SqmAttributeJoin::new(&ghost, "employer", None, SqmJoinType::Inner);
        assert!(matches!(
            conv.visit_attribute_join(&join),
            Err(SqmError::UnresolvedJoinLhs { .. })
        ));
    }

    fn employer_join_query() -> SqmStatement {
        let root = person();
        let join = SqmAttributeJoin::new(&root.navigable_path, "employer", Some("e"), SqmJoinType::Inner);
        let on = SqmPredicate::comparison(
            SqmExpression::Path(SqmPath::basic(&join.navigable_path, "name", JavaType::STRING)),
            ComparisonOperator::Equal,
            SqmExpression::literal(LiteralValue::String("Acme".to_owned())),
        );
        let name = attr(&root, "name", JavaType::STRING);
        select(select_one(root.with_join(join.with_on(on)), name))
    }

    #[test]
    fn join_predicate_goes_to_where_by_default() {
        let f = Fixture::new();
        let t = f.lower(&employer_join_query()).unwrap();
        assert_eq!(
            render(&t),
            "select p1_0.name from person p1_0 INNER JOIN company e1_0 on p1_0.employer_id = e1_0.id \
             where e1_0.name = 'Acme'"
        );
        assert_eq!(
            t.affected_table_names.iter().collect::<Vec<_>>(),
            ["company", "person"]
        );
    }

    #[test]
    fn join_predicate_can_stay_on_the_join() {
        let f = Fixture::new();
        let config = ConverterConfig {
            join_predicate_placement: JoinPredicatePlacement::JoinOn,
            ..ConverterConfig::default()
        };
        let t = f
            .lower_with(&employer_join_query(), config, &QueryParameterBindings::new())
            .unwrap();
        assert_eq!(
            render(&t),
            "select p1_0.name from person p1_0 INNER JOIN company e1_0 on p1_0.employer_id = e1_0.id \
             and e1_0.name = 'Acme'"
        );
        assert_eq!(t.sql_ast.query_spec.where_clause, None);
    }

    #[test]
    fn cross_join_gets_its_own_group() {
        let f = Fixture::new();
        let root = person();
        let name = attr(&root, "name", JavaType::STRING);
        let spec = SqmQuerySpec::new(
            SqmFromClause {
                spaces: vec![SqmFromElementSpace {
                    root,
                    joins: vec![SqmSpaceJoin::Cross(SqmCrossJoin::new("Company", Some("c")))],
                }],
            },
            SqmSelectClause::of(vec![name]),
        );
        let t = f.lower(&select(spec)).unwrap();
        assert_eq!(render(&t), "select p1_0.name from person p1_0 CROSS JOIN company c1_0");
    }

    #[test]
    fn entity_and_embedded_selections_expand_to_columns() {
        let f = Fixture::new();
        let root = person();
        let whole = SqmExpression::Path(SqmPath::from_element(&root.navigable_path, "Person"));
        let address = SqmExpression::Path(SqmPath::attribute(
            &root.navigable_path,
            "address",
            SqmPathKind::Embedded,
            JavaType::Embeddable("Address".to_owned()),
        ));
        let employer = SqmExpression::Path(SqmPath::attribute(
            &root.navigable_path,
            "employer",
            SqmPathKind::Entity,
            JavaType::Entity("Company".to_owned()),
        ));
        let spec = SqmQuerySpec::new(
            SqmFromClause::of(root),
            SqmSelectClause::of(vec![whole.clone(), address, employer, whole]),
        );
        let t = f.lower(&select(spec)).unwrap();
        assert_eq!(
            render(&t),
            "select p1_0.id, p1_0.city, p1_0.zip, p1_0.employer_id from person p1_0"
        );
    }

    #[test]
    fn correlated_subquery_sees_outer_from_elements() {
        let f = Fixture::new();
        let outer = person();
        let inner = SqmRoot::new("Person", Some("q"));
        let sub_spec = select_one(inner.clone(), attr(&inner, "age", JavaType::INTEGER)).with_where(
            SqmPredicate::comparison(
                attr(&inner, "name", JavaType::STRING),
                ComparisonOperator::Equal,
                attr(&outer, "name", JavaType::STRING),
            ),
        );
        let predicate = SqmPredicate::InSubQuery(SqmInSubQueryPredicate {
            test_expression: attr(&outer, "age", JavaType::INTEGER),
            sub_query: SqmSubQuery {
                query_spec: Box::new(sub_spec),
                node_type: JavaType::INTEGER,
            },
            negated: false,
        });
        let name = attr(&outer, "name", JavaType::STRING);
        let t = f.lower(&select(select_one(outer, name).with_where(predicate))).unwrap();
        assert_eq!(
            render(&t),
            "select p1_0.name from person p1_0 where p1_0.age in \
             (select p2_0.age from person p2_0 where p2_0.name = p1_0.name)"
        );
        assert_eq!(t.sql_ast.table_groups.len(), 2);
    }

    #[test]
    fn subquery_root_with_outer_alias_gets_its_own_group() {
        let f = Fixture::new();
        let outer = person();
        let inner = person();
        assert_eq!(outer.navigable_path, inner.navigable_path);
        let sub_spec = select_one(inner.clone(), attr(&inner, "age", JavaType::INTEGER));
        let predicate = SqmPredicate::InSubQuery(SqmInSubQueryPredicate {
            test_expression: attr(&outer, "age", JavaType::INTEGER),
            sub_query: SqmSubQuery {
                query_spec: Box::new(sub_spec),
                node_type: JavaType::INTEGER,
            },
            negated: false,
        });
        let name = attr(&outer, "name", JavaType::STRING);
        let t = f.lower(&select(select_one(outer, name).with_where(predicate))).unwrap();
        assert_eq!(t.sql_ast.table_groups.len(), 2);
        assert_eq!(
            render(&t),
            "select p1_0.name from person p1_0 where p1_0.age in (select p2_0.age from person p2_0)"
        );
    }

    #[test]
    fn subquery_clauses_do_not_inherit_the_outer_type_hint() {
        let f = Fixture::new();
        let outer = person();
        let inner = SqmRoot::new("Person", Some("q"));
        let sub_spec = select_one(inner.clone(), attr(&inner, "name", JavaType::STRING))
            .with_where(SqmPredicate::Nullness(SqmNullnessPredicate {
                expression: SqmExpression::Parameter(SqmParameter::named("w")),
                negated: true,
            }))
            .with_limit_offset(Some(SqmExpression::Parameter(SqmParameter::named("n"))), None);
        let predicate = SqmPredicate::comparison(
            attr(&outer, "name", JavaType::STRING),
            ComparisonOperator::Equal,
            SqmExpression::SubQuery(SqmSubQuery {
                query_spec: Box::new(sub_spec),
                node_type: JavaType::STRING,
            }),
        );
        let name = attr(&outer, "name", JavaType::STRING);
        let t = f.lower(&select(select_one(outer, name).with_where(predicate))).unwrap();
        let mappings: Vec<_> = t
            .jdbc_parameters
            .parameters()
            .iter()
            .map(|p| p.jdbc_mapping)
            .collect();
        assert_eq!(mappings, [ParameterFallbackType.jdbc_mappings()[0], BasicType::INTEGER]);
    }

    // -- clause stack -------------------------------------------------------

    #[test]
    fn clause_stack_can_be_primed_once() {
        let f = Fixture::new();
        let bindings = QueryParameterBindings::new();
        let mut conv = SqmToSqlAstConverter::new(
            f.context(),
            ConverterConfig::default(),
            &bindings,
            DomainParameterXref::new(),
        );
        assert_eq!(conv.current_clause(), None);
        conv.prime_clause_stack(Clause::Where).unwrap();
        assert_eq!(conv.current_clause(), Some(Clause::Where));
        assert!(matches!(
            conv.prime_clause_stack(Clause::Select),
            Err(SqmError::StackAlreadyPrimed { .. })
        ));
        assert_eq!(conv.clause_depth(), 1);
    }

    #[test]
    fn clause_stack_unwinds_on_failure() {
        let f = Fixture::new();
        let bindings = QueryParameterBindings::new();
        let mut conv = SqmToSqlAstConverter::new(
            f.context(),
            ConverterConfig::default(),
            &bindings,
            DomainParameterXref::new(),
        );
        let root = person();
        let tuple = SqmExpression::Tuple(SqmTuple {
            elements: vec![SqmExpression::integer(1)],
            node_type: None,
        });
        let spec = select_one(root, tuple);
        assert!(matches!(
            conv.visit_query_spec(&spec),
            Err(SqmError::NotYetImplemented(_))
        ));
        assert_eq!(conv.clause_depth(), 0);
        assert!(conv.from_clause_index().is_some_and(FromClauseIndex::is_empty));
    }

    #[test]
    fn literals_know_whether_they_are_selected() {
        let f = Fixture::new();
        let root = person();
        let spec = select_one(root, SqmExpression::integer(1))
            .with_where(SqmPredicate::BooleanExpression(SqmExpression::literal(LiteralValue::Boolean(true))));
        let t = f.lower(&select(spec)).unwrap();
        assert!(matches!(
            t.sql_ast.query_spec.select_clause.sql_selections()[0].expression,
            Expression::QueryLiteral { in_select: true, .. }
        ));
        assert!(matches!(
            t.sql_ast.query_spec.where_clause,
            Some(Predicate::BooleanExpression(Expression::QueryLiteral { in_select: false, .. }))
        ));
    }

    // -- duration arithmetic ------------------------------------------------

    #[test]
    fn timestamp_plus_duration_becomes_timestampadd() {
        let f = Fixture::new();
        let sql = lower_selected(&f, |p| {
            timestamp_op(attr(p, "created", JavaType::LOCAL_DATE_TIME), BinaryArithmeticOperator::Add, hours(2))
        })
        .unwrap();
        assert_eq!(sql, "timestampadd(hour, 2, p1_0.created)");
    }

    #[test]
    fn duration_sums_reassociate() {
        use BinaryArithmeticOperator::{Add, Subtract};

        let f = Fixture::new();
        let lowered = |build: fn(SqmExpression) -> SqmExpression| {
            let root = person();
            let expression = build(attr(&root, "created", JavaType::LOCAL_DATE_TIME));
            let t = f.lower(&select(select_one(root, expression))).unwrap();
            t.sql_ast.query_spec.select_clause.sql_selections()[0].expression.clone()
        };

        let nested = lowered(|ts| timestamp_op(ts, Add, duration_op(days(1), Add, hours(3))));
        let flat = lowered(|ts| timestamp_op(timestamp_op(ts, Add, days(1)), Add, hours(3)));
        assert_eq!(nested, flat);
        assert_eq!(nested.to_string(), "timestampadd(hour, 3, timestampadd(day, 1, p1_0.created))");

        let nested = lowered(|ts| timestamp_op(ts, Subtract, duration_op(days(1), Subtract, hours(3))));
        let flat = lowered(|ts| timestamp_op(timestamp_op(ts, Subtract, days(1)), Add, hours(3)));
        assert_eq!(nested, flat);
        assert_eq!(nested.to_string(), "timestampadd(hour, 3, timestampadd(day, -1, p1_0.created))");
    }

    #[test]
    fn conflicting_duration_targets_are_an_internal_error() {
        let f = Fixture::new();
        let bindings = QueryParameterBindings::new();
        let mut conv = SqmToSqlAstConverter::new(
            f.context(),
            ConverterConfig::default(),
            &bindings,
            DomainParameterXref::new(),
        );
        let timestamp = conv
            .visit_expression(&SqmExpression::integer(0), &DurationScope::clean())
            .unwrap();
        let scope = DurationScope::clean()
            .with_by_unit(TemporalUnit::Hour, BasicType::LONG)
            .with_adjusted_timestamp(timestamp);
        let err = conv.visit_expression(&hours(2), &scope).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn scalar_factors_distribute_over_durations() {
        let f = Fixture::new();
        let sql = lower_selected(&f, |p| {
            timestamp_op(
                attr(p, "created", JavaType::LOCAL_DATE_TIME),
                BinaryArithmeticOperator::Add,
                duration_op(SqmExpression::integer(2), BinaryArithmeticOperator::Multiply, hours(3)),
            )
        })
        .unwrap();
        assert_eq!(sql, "timestampadd(hour, (2 * 3), p1_0.created)");

        let sql = lower_selected(&f, |p| {
            timestamp_op(
                attr(p, "created", JavaType::LOCAL_DATE_TIME),
                BinaryArithmeticOperator::Add,
                duration_op(hours(3), BinaryArithmeticOperator::Multiply, SqmExpression::integer(2)),
            )
        })
        .unwrap();
        assert_eq!(sql, "timestampadd(hour, (2 * 3), p1_0.created)");

        let sql = lower_selected(&f, |p| {
            timestamp_op(
                attr(p, "created", JavaType::LOCAL_DATE_TIME),
                BinaryArithmeticOperator::Add,
                SqmExpression::negate(hours(3)),
            )
        })
        .unwrap();
        assert_eq!(sql, "timestampadd(hour, -3, p1_0.created)");
    }

    #[test]
    fn by_unit_converts_durations() {
        let f = Fixture::new();
        let root = person();
        let expression = SqmExpression::by_unit(
            SqmExpression::to_duration(SqmExpression::integer(90), TemporalUnit::Minute),
            TemporalUnit::Hour,
        );
        let t = f.lower(&select(select_one(root, expression))).unwrap();
        let lowered = &t.sql_ast.query_spec.select_clause.sql_selections()[0].expression;
        assert_eq!(lowered.to_string(), "((90 minute) by hour)");
        assert_eq!(lowered.constant_value(), Some(1.5));
        assert_eq!(lowered.single_type(), Some(BasicType::LONG));

        let sql = lower_selected(&f, |p| {
            SqmExpression::by_unit(attr(p, "workTime", JavaType::DURATION), TemporalUnit::Second)
        })
        .unwrap();
        assert_eq!(sql, "((p1_0.work_time nanosecond) by second)");
    }

    #[test]
    fn datetime_difference_uses_timestampdiff() {
        let f = Fixture::new();
        let difference = |p: &SqmRoot| {
            duration_op(
                attr(p, "created", JavaType::LOCAL_DATE_TIME),
                BinaryArithmeticOperator::Subtract,
                attr(p, "birthday", JavaType::LOCAL_DATE),
            )
        };
        let sql = lower_selected(&f, difference).unwrap();
        assert_eq!(sql, "(timestampdiff(native, p1_0.birthday, p1_0.created) native)");

        let sql = lower_selected(&f, |p| SqmExpression::by_unit(difference(p), TemporalUnit::Day)).unwrap();
        assert_eq!(sql, "timestampdiff(day, p1_0.birthday, p1_0.created)");
    }

    #[test]
    fn illegal_temporal_arithmetic_is_rejected() {
        let f = Fixture::new();
        let created = |p: &SqmRoot| attr(p, "created", JavaType::LOCAL_DATE_TIME);

        let err = lower_selected(&f, |p| {
            timestamp_op(created(p), BinaryArithmeticOperator::Add, created(p))
        })
        .unwrap_err();
        assert!(matches!(err, SqmError::IllegalTemporalOperator { ref operator, .. } if operator == "+"));
        assert!(err.is_user_error());

        let err = lower_selected(&f, |p| {
            timestamp_op(SqmExpression::integer(2), BinaryArithmeticOperator::Multiply, created(p))
        })
        .unwrap_err();
        assert!(matches!(err, SqmError::ScalarMultiplicationOfTemporal { .. }));

        let err = lower_selected(&f, |p| {
            timestamp_op(
                created(p),
                BinaryArithmeticOperator::Add,
                duration_op(hours(1), BinaryArithmeticOperator::Divide, SqmExpression::integer(2)),
            )
        })
        .unwrap_err();
        assert!(matches!(err, SqmError::IllegalDurationOperator { .. }));

        let err = lower_selected(&f, |_| {
            SqmExpression::by_unit(
                SqmExpression::to_duration(SqmExpression::integer(1), TemporalUnit::Month),
                TemporalUnit::Day,
            )
        })
        .unwrap_err();
        assert!(matches!(err, SqmError::IllegalUnitConversion { .. }));
    }

    #[test]
    fn scaled_timestamp_is_rejected() {
        let f = Fixture::new();
        let err = lower_selected(&f, |p| {
            duration_op(
                SqmExpression::integer(2),
                BinaryArithmeticOperator::Multiply,
                timestamp_op(
                    attr(p, "created", JavaType::LOCAL_DATE_TIME),
                    BinaryArithmeticOperator::Add,
                    hours(1),
                ),
            )
        })
        .unwrap_err();
        assert!(matches!(err, SqmError::ScalarMultiplicationOfTemporal { .. }));
    }

    // -- functions ----------------------------------------------------------

    #[test]
    fn named_functions_map_onto_the_registry() {
        let f = Fixture::new();
        let function = |kind, p: &SqmRoot, node_type| {
            SqmExpression::Function(SqmFunction {
                kind,
                arguments: vec![attr(p, "name", JavaType::STRING)],
                node_type,
            })
        };
        let sql = lower_selected(&f, |p| function(SqmFunctionKind::Count { distinct: true }, p, JavaType::LONG)).unwrap();
        assert_eq!(sql, "count(distinct p1_0.name)");

        let sql = lower_selected(&f, |p| {
            function(
                SqmFunctionKind::Trim {
                    spec: TrimSpec::Leading,
                    character: Some('x'),
                },
                p,
                JavaType::STRING,
            )
        })
        .unwrap();
        assert_eq!(sql, "trim('leading', 'x', p1_0.name)");

        let sql = lower_selected(&f, |p| {
            function(
                SqmFunctionKind::Generic {
                    name: "soundex".to_owned(),
                },
                p,
                JavaType::STRING,
            )
        })
        .unwrap();
        assert_eq!(sql, "soundex(p1_0.name)");

        let sql = lower_selected(&f, |_| {
            SqmExpression::Function(SqmFunction {
                kind: SqmFunctionKind::CountStar,
                arguments: Vec::new(),
                node_type: JavaType::LONG,
            })
        })
        .unwrap();
        assert_eq!(sql, "count(*)");
    }

    // -- parameters ---------------------------------------------------------

    #[test]
    fn parameter_types_fall_back_in_order() {
        let f = Fixture::new();
        let root = person();
        let spec = select_one(root.clone(), attr(&root, "name", JavaType::STRING))
            .with_where(SqmPredicate::and(
                SqmPredicate::comparison(
                    SqmExpression::Parameter(SqmParameter::named("a")),
                    ComparisonOperator::Equal,
                    SqmExpression::Parameter(SqmParameter::named("b")),
                ),
                SqmPredicate::Nullness(SqmNullnessPredicate {
                    expression: SqmExpression::Parameter(SqmParameter::named("bound")),
                    negated: true,
                }),
            ))
            .with_limit_offset(Some(SqmExpression::Parameter(SqmParameter::named("n"))), None);
        let bindings = QueryParameterBindings::new().with_binding(
            ParameterKind::Named("bound".to_owned()),
            ParameterBinding::single(LiteralValue::Decimal("1.5".to_owned())),
        );
        let t = f
            .lower_with(&select(spec), ConverterConfig::default(), &bindings)
            .unwrap();
        let tc = TypeConfiguration::new();
        let mappings: Vec<_> = t
            .jdbc_parameters
            .parameters()
            .iter()
            .map(|p| p.jdbc_mapping)
            .collect();
        assert_eq!(
            mappings,
            [
                BasicType::OBJECT,
                BasicType::OBJECT,
                tc.basic_type(BasicJavaType::BigDecimal),
                BasicType::INTEGER,
            ]
        );
        assert_eq!(ParameterFallbackType.jdbc_mappings().as_slice(), &mappings[..1]);
    }

    #[test]
    fn repeated_parameter_occurrences_bind_independently() {
        let f = Fixture::new();
        let root = person();
        let min = SqmParameter::named("min");
        let age = || attr(&root, "age", JavaType::INTEGER);
        let spec = select_one(root.clone(), age()).with_where(SqmPredicate::or(
            SqmPredicate::comparison(age(), ComparisonOperator::GreaterThan, SqmExpression::Parameter(min.clone())),
            SqmPredicate::comparison(age(), ComparisonOperator::Equal, SqmExpression::Parameter(min.clone())),
        ));
        let t = f.lower(&select(spec)).unwrap();
        assert_eq!(t.jdbc_parameters.len(), 2);
        let duplicates = t.parameter_xref.duplicates(min.id);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(t.parameter_xref.query_parameter(duplicates[0]), Some(&min.kind));
        assert_eq!(t.jdbc_params_by_sqm_param.len(), 2);
        assert_eq!(render(&t), "select p1_0.age from person p1_0 where p1_0.age > ? or p1_0.age = ?");
    }

    fn in_list_query(ids: &SqmParameter) -> SqmStatement {
        let root = person();
        let age = attr(&root, "age", JavaType::INTEGER);
        let predicate = SqmPredicate::in_list(age.clone(), vec![SqmExpression::Parameter(ids.clone())]);
        select(select_one(root, age).with_where(predicate))
    }

    fn three_ids() -> QueryParameterBindings {
        QueryParameterBindings::new().with_binding(
            ParameterKind::Named("ids".to_owned()),
            ParameterBinding::multi(vec![
                LiteralValue::Integer(1),
                LiteralValue::Integer(2),
                LiteralValue::Integer(3),
            ]),
        )
    }

    #[test]
    fn multi_valued_parameter_expands_in_list() {
        let f = Fixture::new();
        let ids = SqmParameter::named("ids").multi_valued();
        let t = f
            .lower_with(&in_list_query(&ids), ConverterConfig::default(), &three_ids())
            .unwrap();
        assert_eq!(render(&t), "select p1_0.age from person p1_0 where p1_0.age in (?, ?, ?)");
        assert_eq!(t.jdbc_parameters.len(), 3);
        assert_eq!(t.parameter_xref.expansion_count(), 2);
        assert_eq!(t.parameter_xref.expansions(ids.id).len(), 2);
        assert!(t
            .jdbc_parameters
            .parameters()
            .iter()
            .all(|p| p.jdbc_mapping == BasicType::INTEGER));
    }

    #[test]
    fn expansion_can_be_disabled() {
        let f = Fixture::new();
        let ids = SqmParameter::named("ids").multi_valued();
        let config = ConverterConfig {
            expand_multi_valued_parameters: false,
            ..ConverterConfig::default()
        };
        let t = f.lower_with(&in_list_query(&ids), config, &three_ids()).unwrap();
        assert_eq!(render(&t), "select p1_0.age from person p1_0 where p1_0.age in (?)");
        assert_eq!(t.parameter_xref.expansion_count(), 0);

        let single_valued = SqmParameter::named("ids");
        let t = f
            .lower_with(&in_list_query(&single_valued), ConverterConfig::default(), &three_ids())
            .unwrap();
        assert_eq!(t.jdbc_parameters.len(), 1);
    }

    // -- unsupported shapes -------------------------------------------------

    #[test]
    fn unsupported_shapes_report_not_yet_implemented() {
        let f = Fixture::new();
        let root = person();
        let update = SqmStatement::Update(SqmUpdateStatement {
            target: root.clone(),
            set_clause: SqmSetClause {
                assignments: Vec::new(),
            },
            where_clause: None,
        });
        assert!(matches!(f.lower(&update), Err(SqmError::NotYetImplemented(_))));

        let pets = SqmPath::attribute(
            &root.navigable_path,
            "pets",
            SqmPathKind::Plural,
            JavaType::Entity("Pet".to_owned()),
        );
        let member_of = SqmPredicate::MemberOf(SqmMemberOfPredicate {
            expression: SqmExpression::Path(SqmPath::from_element(&root.navigable_path, "Person")),
            plural_path: pets.clone(),
            negated: false,
        });
        let spec = select_one(root.clone(), attr(&root, "name", JavaType::STRING)).with_where(member_of);
        let err = f.lower(&select(spec)).unwrap_err();
        assert!(matches!(err, SqmError::NotYetImplemented(_)));
        assert!(!err.is_user_error());

        let spec = select_one(root, SqmExpression::Path(pets));
        assert!(matches!(f.lower(&select(spec)), Err(SqmError::NotYetImplemented(_))));
    }

    #[test]
    fn unknown_entity_fails() {
        let f = Fixture::new();
        let root = SqmRoot::new("Nope", None);
        let spec = select_one(root, SqmExpression::integer(1));
        assert!(matches!(f.lower(&select(spec)), Err(SqmError::UnknownEntity { .. })));
    }
}
