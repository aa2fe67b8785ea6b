//! Semantic tree traversal.
//!
//! [`SemanticQueryWalker`] has one method per node kind. Every method has a
//! default implementation that delegates to the matching `walk_*` function,
//! which visits the node's children and rebuilds the node from the results.
//! A walker that overrides nothing is therefore an identity copy of the tree;
//! implementors override only the node kinds they care about and call the
//! `walk_*` function to continue the descent.
//!
//! Children are always visited in the order they can legally be written:
//! FROM, SELECT, WHERE, GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET; left
//! operand before right operand; tested expression before its bounds. Passes
//! that assign aliases or record positions rely on this order.

use sqmc_error::Result;

use crate::{
    ParameterKind, SqmAssignment, SqmAttributeJoin, SqmBetweenPredicate, SqmBinaryArithmetic,
    SqmByUnit, SqmCaseSearched, SqmCaseSimple, SqmComparisonPredicate, SqmConcat, SqmCrossJoin,
    SqmDeleteStatement, SqmEmptinessPredicate, SqmEntityJoin, SqmExpression, SqmFromClause,
    SqmFromElementSpace, SqmFunction, SqmGroupByClause, SqmHavingClause, SqmInListPredicate,
    SqmInSubQueryPredicate, SqmInsertSelectStatement, SqmJunction, SqmLikePredicate,
    SqmLimitOffsetClause, SqmLiteral, SqmMemberOfPredicate, SqmNullnessPredicate,
    SqmOrderByClause, SqmParameter, SqmPath, SqmPathKind, SqmPredicate, SqmQuerySpec, SqmRoot,
    SqmSelectClause, SqmSelectStatement, SqmSelection, SqmSetClause, SqmSortSpecification,
    SqmSpaceJoin, SqmStatement, SqmSubQuery, SqmToDuration, SqmTuple, SqmUnaryOperation,
    SqmUpdateStatement, SqmWhereClause,
};

/// A pass over the semantic tree.
pub trait SemanticQueryWalker {
    // -- statements ---------------------------------------------------------

    fn visit_statement(&mut self, statement: &SqmStatement) -> Result<SqmStatement> {
        walk_statement(self, statement)
    }

    fn visit_select_statement(&mut self, statement: &SqmSelectStatement) -> Result<SqmSelectStatement> {
        walk_select_statement(self, statement)
    }

    fn visit_update_statement(&mut self, statement: &SqmUpdateStatement) -> Result<SqmUpdateStatement> {
        walk_update_statement(self, statement)
    }

    fn visit_delete_statement(&mut self, statement: &SqmDeleteStatement) -> Result<SqmDeleteStatement> {
        walk_delete_statement(self, statement)
    }

    fn visit_insert_select_statement(
        &mut self,
        statement: &SqmInsertSelectStatement,
    ) -> Result<SqmInsertSelectStatement> {
        walk_insert_select_statement(self, statement)
    }

    fn visit_set_clause(&mut self, clause: &SqmSetClause) -> Result<SqmSetClause> {
        walk_set_clause(self, clause)
    }

    fn visit_assignment(&mut self, assignment: &SqmAssignment) -> Result<SqmAssignment> {
        walk_assignment(self, assignment)
    }

    // -- query spec and clauses ---------------------------------------------

    fn visit_query_spec(&mut self, spec: &SqmQuerySpec) -> Result<SqmQuerySpec> {
        walk_query_spec(self, spec)
    }

    fn visit_from_clause(&mut self, clause: &SqmFromClause) -> Result<SqmFromClause> {
        walk_from_clause(self, clause)
    }

    fn visit_from_element_space(&mut self, space: &SqmFromElementSpace) -> Result<SqmFromElementSpace> {
        walk_from_element_space(self, space)
    }

    fn visit_root(&mut self, root: &SqmRoot) -> Result<SqmRoot> {
        walk_root(self, root)
    }

    fn visit_attribute_join(&mut self, join: &SqmAttributeJoin) -> Result<SqmAttributeJoin> {
        walk_attribute_join(self, join)
    }

    fn visit_cross_join(&mut self, join: &SqmCrossJoin) -> Result<SqmCrossJoin> {
        walk_cross_join(self, join)
    }

    fn visit_entity_join(&mut self, join: &SqmEntityJoin) -> Result<SqmEntityJoin> {
        walk_entity_join(self, join)
    }

    fn visit_select_clause(&mut self, clause: &SqmSelectClause) -> Result<SqmSelectClause> {
        walk_select_clause(self, clause)
    }

    fn visit_selection(&mut self, selection: &SqmSelection) -> Result<SqmSelection> {
        Ok(SqmSelection {
            expression: self.visit_expression(&selection.expression)?,
            alias: selection.alias.clone(),
        })
    }

    fn visit_where_clause(&mut self, clause: &SqmWhereClause) -> Result<SqmWhereClause> {
        Ok(SqmWhereClause {
            predicate: self.visit_predicate(&clause.predicate)?,
        })
    }

    fn visit_group_by_clause(&mut self, clause: &SqmGroupByClause) -> Result<SqmGroupByClause> {
        Ok(SqmGroupByClause {
            expressions: walk_expressions(self, &clause.expressions)?,
        })
    }

    fn visit_having_clause(&mut self, clause: &SqmHavingClause) -> Result<SqmHavingClause> {
        Ok(SqmHavingClause {
            predicate: self.visit_predicate(&clause.predicate)?,
        })
    }

    fn visit_order_by_clause(&mut self, clause: &SqmOrderByClause) -> Result<SqmOrderByClause> {
        let sort_specifications = clause
            .sort_specifications
            .iter()
            .map(|s| self.visit_sort_specification(s))
            .collect::<Result<_>>()?;
        Ok(SqmOrderByClause { sort_specifications })
    }

    fn visit_sort_specification(&mut self, spec: &SqmSortSpecification) -> Result<SqmSortSpecification> {
        Ok(SqmSortSpecification {
            expression: self.visit_expression(&spec.expression)?,
            order: spec.order,
        })
    }

    fn visit_limit_expression(&mut self, expression: &SqmExpression) -> Result<SqmExpression> {
        self.visit_expression(expression)
    }

    fn visit_offset_expression(&mut self, expression: &SqmExpression) -> Result<SqmExpression> {
        self.visit_expression(expression)
    }

    // -- expressions --------------------------------------------------------

    fn visit_expression(&mut self, expression: &SqmExpression) -> Result<SqmExpression> {
        walk_expression(self, expression)
    }

    fn visit_literal(&mut self, literal: &SqmLiteral) -> Result<SqmLiteral> {
        Ok(literal.clone())
    }

    fn visit_parameter(&mut self, parameter: &SqmParameter) -> Result<SqmParameter> {
        match parameter.kind {
            ParameterKind::Named(_) => self.visit_named_parameter(parameter),
            ParameterKind::Positional(_) => self.visit_positional_parameter(parameter),
            ParameterKind::Criteria(_) => self.visit_criteria_parameter(parameter),
        }
    }

    fn visit_named_parameter(&mut self, parameter: &SqmParameter) -> Result<SqmParameter> {
        Ok(parameter.clone())
    }

    fn visit_positional_parameter(&mut self, parameter: &SqmParameter) -> Result<SqmParameter> {
        Ok(parameter.clone())
    }

    fn visit_criteria_parameter(&mut self, parameter: &SqmParameter) -> Result<SqmParameter> {
        Ok(parameter.clone())
    }

    fn visit_unary_operation(&mut self, op: &SqmUnaryOperation) -> Result<SqmUnaryOperation> {
        Ok(SqmUnaryOperation {
            operator: op.operator,
            operand: Box::new(self.visit_expression(&op.operand)?),
        })
    }

    fn visit_binary_arithmetic(&mut self, expr: &SqmBinaryArithmetic) -> Result<SqmBinaryArithmetic> {
        let lhs = self.visit_expression(&expr.lhs)?;
        let rhs = self.visit_expression(&expr.rhs)?;
        Ok(SqmBinaryArithmetic {
            operator: expr.operator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            node_type: expr.node_type.clone(),
        })
    }

    fn visit_concat(&mut self, concat: &SqmConcat) -> Result<SqmConcat> {
        let lhs = self.visit_expression(&concat.lhs)?;
        let rhs = self.visit_expression(&concat.rhs)?;
        Ok(SqmConcat {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn visit_case_simple(&mut self, case: &SqmCaseSimple) -> Result<SqmCaseSimple> {
        walk_case_simple(self, case)
    }

    fn visit_case_searched(&mut self, case: &SqmCaseSearched) -> Result<SqmCaseSearched> {
        walk_case_searched(self, case)
    }

    fn visit_sub_query(&mut self, sub_query: &SqmSubQuery) -> Result<SqmSubQuery> {
        Ok(SqmSubQuery {
            query_spec: Box::new(self.visit_query_spec(&sub_query.query_spec)?),
            node_type: sub_query.node_type.clone(),
        })
    }

    fn visit_function(&mut self, function: &SqmFunction) -> Result<SqmFunction> {
        Ok(SqmFunction {
            kind: function.kind.clone(),
            arguments: walk_expressions(self, &function.arguments)?,
            node_type: function.node_type.clone(),
        })
    }

    fn visit_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        match path.kind {
            SqmPathKind::Basic => self.visit_basic_valued_path(path),
            SqmPathKind::Embedded => self.visit_embedded_valued_path(path),
            SqmPathKind::Entity => self.visit_entity_valued_path(path),
            SqmPathKind::Plural => self.visit_plural_valued_path(path),
            SqmPathKind::CollectionElement => self.visit_collection_element_path(path),
            SqmPathKind::CollectionIndex => self.visit_collection_index_path(path),
            SqmPathKind::MapEntry => self.visit_map_entry_path(path),
        }
    }

    fn visit_basic_valued_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        Ok(path.clone())
    }

    fn visit_embedded_valued_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        Ok(path.clone())
    }

    fn visit_entity_valued_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        Ok(path.clone())
    }

    fn visit_plural_valued_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        Ok(path.clone())
    }

    fn visit_collection_element_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        Ok(path.clone())
    }

    fn visit_collection_index_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        Ok(path.clone())
    }

    fn visit_map_entry_path(&mut self, path: &SqmPath) -> Result<SqmPath> {
        Ok(path.clone())
    }

    fn visit_to_duration(&mut self, to_duration: &SqmToDuration) -> Result<SqmToDuration> {
        Ok(SqmToDuration {
            magnitude: Box::new(self.visit_expression(&to_duration.magnitude)?),
            unit: to_duration.unit,
        })
    }

    fn visit_by_unit(&mut self, by_unit: &SqmByUnit) -> Result<SqmByUnit> {
        Ok(SqmByUnit {
            duration: Box::new(self.visit_expression(&by_unit.duration)?),
            unit: by_unit.unit,
            node_type: by_unit.node_type.clone(),
        })
    }

    fn visit_tuple(&mut self, tuple: &SqmTuple) -> Result<SqmTuple> {
        Ok(SqmTuple {
            elements: walk_expressions(self, &tuple.elements)?,
            node_type: tuple.node_type.clone(),
        })
    }

    // -- predicates ---------------------------------------------------------

    fn visit_predicate(&mut self, predicate: &SqmPredicate) -> Result<SqmPredicate> {
        walk_predicate(self, predicate)
    }

    fn visit_and_predicate(&mut self, junction: &SqmJunction) -> Result<SqmJunction> {
        walk_junction(self, junction)
    }

    fn visit_or_predicate(&mut self, junction: &SqmJunction) -> Result<SqmJunction> {
        walk_junction(self, junction)
    }

    fn visit_negated_predicate(&mut self, inner: &SqmPredicate) -> Result<SqmPredicate> {
        self.visit_predicate(inner)
    }

    fn visit_grouped_predicate(&mut self, inner: &SqmPredicate) -> Result<SqmPredicate> {
        self.visit_predicate(inner)
    }

    fn visit_comparison_predicate(
        &mut self,
        predicate: &SqmComparisonPredicate,
    ) -> Result<SqmComparisonPredicate> {
        let lhs = self.visit_expression(&predicate.lhs)?;
        let rhs = self.visit_expression(&predicate.rhs)?;
        Ok(SqmComparisonPredicate {
            lhs,
            operator: predicate.operator,
            rhs,
        })
    }

    fn visit_between_predicate(&mut self, predicate: &SqmBetweenPredicate) -> Result<SqmBetweenPredicate> {
        let expression = self.visit_expression(&predicate.expression)?;
        let lower = self.visit_expression(&predicate.lower)?;
        let upper = self.visit_expression(&predicate.upper)?;
        Ok(SqmBetweenPredicate {
            expression,
            lower,
            upper,
            negated: predicate.negated,
        })
    }

    fn visit_like_predicate(&mut self, predicate: &SqmLikePredicate) -> Result<SqmLikePredicate> {
        let match_expression = self.visit_expression(&predicate.match_expression)?;
        let pattern = self.visit_expression(&predicate.pattern)?;
        let escape = predicate
            .escape
            .as_ref()
            .map(|e| self.visit_expression(e))
            .transpose()?;
        Ok(SqmLikePredicate {
            match_expression,
            pattern,
            escape,
            negated: predicate.negated,
        })
    }

    fn visit_in_list_predicate(&mut self, predicate: &SqmInListPredicate) -> Result<SqmInListPredicate> {
        let test_expression = self.visit_expression(&predicate.test_expression)?;
        Ok(SqmInListPredicate {
            test_expression,
            list_expressions: walk_expressions(self, &predicate.list_expressions)?,
            negated: predicate.negated,
        })
    }

    fn visit_in_sub_query_predicate(
        &mut self,
        predicate: &SqmInSubQueryPredicate,
    ) -> Result<SqmInSubQueryPredicate> {
        let test_expression = self.visit_expression(&predicate.test_expression)?;
        Ok(SqmInSubQueryPredicate {
            test_expression,
            sub_query: self.visit_sub_query(&predicate.sub_query)?,
            negated: predicate.negated,
        })
    }

    fn visit_member_of_predicate(&mut self, predicate: &SqmMemberOfPredicate) -> Result<SqmMemberOfPredicate> {
        let expression = self.visit_expression(&predicate.expression)?;
        Ok(SqmMemberOfPredicate {
            expression,
            plural_path: self.visit_path(&predicate.plural_path)?,
            negated: predicate.negated,
        })
    }

    fn visit_nullness_predicate(&mut self, predicate: &SqmNullnessPredicate) -> Result<SqmNullnessPredicate> {
        Ok(SqmNullnessPredicate {
            expression: self.visit_expression(&predicate.expression)?,
            negated: predicate.negated,
        })
    }

    fn visit_emptiness_predicate(
        &mut self,
        predicate: &SqmEmptinessPredicate,
    ) -> Result<SqmEmptinessPredicate> {
        Ok(SqmEmptinessPredicate {
            plural_path: self.visit_path(&predicate.plural_path)?,
            negated: predicate.negated,
        })
    }

    fn visit_boolean_expression_predicate(&mut self, expression: &SqmExpression) -> Result<SqmExpression> {
        self.visit_expression(expression)
    }
}

// ---------------------------------------------------------------------------
// Default traversal
// ---------------------------------------------------------------------------

pub fn walk_statement<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    statement: &SqmStatement,
) -> Result<SqmStatement> {
    Ok(match statement {
        SqmStatement::Select(s) => SqmStatement::Select(walker.visit_select_statement(s)?),
        SqmStatement::Update(s) => SqmStatement::Update(walker.visit_update_statement(s)?),
        SqmStatement::Delete(s) => SqmStatement::Delete(walker.visit_delete_statement(s)?),
        SqmStatement::InsertSelect(s) => {
            SqmStatement::InsertSelect(walker.visit_insert_select_statement(s)?)
        }
    })
}

pub fn walk_select_statement<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    statement: &SqmSelectStatement,
) -> Result<SqmSelectStatement> {
    Ok(SqmSelectStatement {
        query_spec: walker.visit_query_spec(&statement.query_spec)?,
    })
}

pub fn walk_update_statement<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    statement: &SqmUpdateStatement,
) -> Result<SqmUpdateStatement> {
    let target = walker.visit_root(&statement.target)?;
    let set_clause = walker.visit_set_clause(&statement.set_clause)?;
    let where_clause = statement
        .where_clause
        .as_ref()
        .map(|w| walker.visit_where_clause(w))
        .transpose()?;
    Ok(SqmUpdateStatement {
        target,
        set_clause,
        where_clause,
    })
}

pub fn walk_delete_statement<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    statement: &SqmDeleteStatement,
) -> Result<SqmDeleteStatement> {
    let target = walker.visit_root(&statement.target)?;
    let where_clause = statement
        .where_clause
        .as_ref()
        .map(|w| walker.visit_where_clause(w))
        .transpose()?;
    Ok(SqmDeleteStatement {
        target,
        where_clause,
    })
}

pub fn walk_insert_select_statement<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    statement: &SqmInsertSelectStatement,
) -> Result<SqmInsertSelectStatement> {
    let target = walker.visit_root(&statement.target)?;
    let state_fields = statement
        .state_fields
        .iter()
        .map(|p| walker.visit_path(p))
        .collect::<Result<_>>()?;
    let select_query = walker.visit_query_spec(&statement.select_query)?;
    Ok(SqmInsertSelectStatement {
        target,
        state_fields,
        select_query,
    })
}

pub fn walk_set_clause<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    clause: &SqmSetClause,
) -> Result<SqmSetClause> {
    let assignments = clause
        .assignments
        .iter()
        .map(|a| walker.visit_assignment(a))
        .collect::<Result<_>>()?;
    Ok(SqmSetClause { assignments })
}

pub fn walk_assignment<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    assignment: &SqmAssignment,
) -> Result<SqmAssignment> {
    let target = walker.visit_path(&assignment.target)?;
    let value = walker.visit_expression(&assignment.value)?;
    Ok(SqmAssignment { target, value })
}

/// Visit the clauses of a query spec in grammatical order.
pub fn walk_query_spec<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    spec: &SqmQuerySpec,
) -> Result<SqmQuerySpec> {
    let from_clause = walker.visit_from_clause(&spec.from_clause)?;
    let select_clause = walker.visit_select_clause(&spec.select_clause)?;
    let where_clause = spec
        .where_clause
        .as_ref()
        .map(|w| walker.visit_where_clause(w))
        .transpose()?;
    let group_by_clause = spec
        .group_by_clause
        .as_ref()
        .map(|g| walker.visit_group_by_clause(g))
        .transpose()?;
    let having_clause = spec
        .having_clause
        .as_ref()
        .map(|h| walker.visit_having_clause(h))
        .transpose()?;
    let order_by_clause = spec
        .order_by_clause
        .as_ref()
        .map(|o| walker.visit_order_by_clause(o))
        .transpose()?;
    let limit_offset_clause = match &spec.limit_offset_clause {
        Some(clause) => Some(walk_limit_offset(walker, clause)?),
        None => None,
    };
    Ok(SqmQuerySpec {
        from_clause,
        select_clause,
        where_clause,
        group_by_clause,
        having_clause,
        order_by_clause,
        limit_offset_clause,
    })
}

fn walk_limit_offset<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    clause: &SqmLimitOffsetClause,
) -> Result<SqmLimitOffsetClause> {
    let limit = clause
        .limit
        .as_ref()
        .map(|e| walker.visit_limit_expression(e))
        .transpose()?;
    let offset = clause
        .offset
        .as_ref()
        .map(|e| walker.visit_offset_expression(e))
        .transpose()?;
    Ok(SqmLimitOffsetClause { limit, offset })
}

pub fn walk_from_clause<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    clause: &SqmFromClause,
) -> Result<SqmFromClause> {
    let spaces = clause
        .spaces
        .iter()
        .map(|s| walker.visit_from_element_space(s))
        .collect::<Result<_>>()?;
    Ok(SqmFromClause { spaces })
}

pub fn walk_from_element_space<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    space: &SqmFromElementSpace,
) -> Result<SqmFromElementSpace> {
    let root = walker.visit_root(&space.root)?;
    let joins = space
        .joins
        .iter()
        .map(|j| {
            Ok(match j {
                SqmSpaceJoin::Cross(c) => SqmSpaceJoin::Cross(walker.visit_cross_join(c)?),
                SqmSpaceJoin::Entity(e) => SqmSpaceJoin::Entity(walker.visit_entity_join(e)?),
            })
        })
        .collect::<Result<_>>()?;
    Ok(SqmFromElementSpace { root, joins })
}

pub fn walk_root<W: SemanticQueryWalker + ?Sized>(walker: &mut W, root: &SqmRoot) -> Result<SqmRoot> {
    Ok(SqmRoot {
        joins: walk_attribute_joins(walker, &root.joins)?,
        ..root.clone_shallow()
    })
}

pub fn walk_attribute_join<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    join: &SqmAttributeJoin,
) -> Result<SqmAttributeJoin> {
    let on_predicate = join
        .on_predicate
        .as_ref()
        .map(|p| walker.visit_predicate(p))
        .transpose()?;
    let joins = walk_attribute_joins(walker, &join.joins)?;
    Ok(SqmAttributeJoin {
        id: join.id,
        lhs_path: join.lhs_path.clone(),
        attribute: join.attribute.clone(),
        alias: join.alias.clone(),
        navigable_path: join.navigable_path.clone(),
        join_type: join.join_type,
        fetched: join.fetched,
        on_predicate,
        joins,
    })
}

pub fn walk_cross_join<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    join: &SqmCrossJoin,
) -> Result<SqmCrossJoin> {
    Ok(SqmCrossJoin {
        id: join.id,
        entity_name: join.entity_name.clone(),
        alias: join.alias.clone(),
        navigable_path: join.navigable_path.clone(),
        joins: walk_attribute_joins(walker, &join.joins)?,
    })
}

pub fn walk_entity_join<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    join: &SqmEntityJoin,
) -> Result<SqmEntityJoin> {
    let on_predicate = join
        .on_predicate
        .as_ref()
        .map(|p| walker.visit_predicate(p))
        .transpose()?;
    Ok(SqmEntityJoin {
        id: join.id,
        entity_name: join.entity_name.clone(),
        alias: join.alias.clone(),
        navigable_path: join.navigable_path.clone(),
        join_type: join.join_type,
        on_predicate,
        joins: walk_attribute_joins(walker, &join.joins)?,
    })
}

fn walk_attribute_joins<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    joins: &[SqmAttributeJoin],
) -> Result<Vec<SqmAttributeJoin>> {
    joins.iter().map(|j| walker.visit_attribute_join(j)).collect()
}

pub fn walk_select_clause<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    clause: &SqmSelectClause,
) -> Result<SqmSelectClause> {
    let selections = clause
        .selections
        .iter()
        .map(|s| walker.visit_selection(s))
        .collect::<Result<_>>()?;
    Ok(SqmSelectClause {
        distinct: clause.distinct,
        selections,
    })
}

pub fn walk_expression<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    expression: &SqmExpression,
) -> Result<SqmExpression> {
    Ok(match expression {
        SqmExpression::Literal(l) => SqmExpression::Literal(walker.visit_literal(l)?),
        SqmExpression::Parameter(p) => SqmExpression::Parameter(walker.visit_parameter(p)?),
        SqmExpression::Unary(u) => SqmExpression::Unary(walker.visit_unary_operation(u)?),
        SqmExpression::BinaryArithmetic(b) => {
            SqmExpression::BinaryArithmetic(walker.visit_binary_arithmetic(b)?)
        }
        SqmExpression::Concat(c) => SqmExpression::Concat(walker.visit_concat(c)?),
        SqmExpression::CaseSimple(c) => SqmExpression::CaseSimple(walker.visit_case_simple(c)?),
        SqmExpression::CaseSearched(c) => SqmExpression::CaseSearched(walker.visit_case_searched(c)?),
        SqmExpression::SubQuery(s) => SqmExpression::SubQuery(walker.visit_sub_query(s)?),
        SqmExpression::Function(f) => SqmExpression::Function(walker.visit_function(f)?),
        SqmExpression::Path(p) => SqmExpression::Path(walker.visit_path(p)?),
        SqmExpression::ToDuration(d) => SqmExpression::ToDuration(walker.visit_to_duration(d)?),
        SqmExpression::ByUnit(b) => SqmExpression::ByUnit(walker.visit_by_unit(b)?),
        SqmExpression::Tuple(t) => SqmExpression::Tuple(walker.visit_tuple(t)?),
    })
}

fn walk_expressions<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    expressions: &[SqmExpression],
) -> Result<Vec<SqmExpression>> {
    expressions.iter().map(|e| walker.visit_expression(e)).collect()
}

pub fn walk_case_simple<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    case: &SqmCaseSimple,
) -> Result<SqmCaseSimple> {
    let fixture = walker.visit_expression(&case.fixture)?;
    let mut when_fragments = Vec::with_capacity(case.when_fragments.len());
    for (test, result) in &case.when_fragments {
        let test = walker.visit_expression(test)?;
        let result = walker.visit_expression(result)?;
        when_fragments.push((test, result));
    }
    let otherwise = case
        .otherwise
        .as_ref()
        .map(|o| walker.visit_expression(o).map(Box::new))
        .transpose()?;
    Ok(SqmCaseSimple {
        fixture: Box::new(fixture),
        when_fragments,
        otherwise,
        node_type: case.node_type.clone(),
    })
}

pub fn walk_case_searched<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    case: &SqmCaseSearched,
) -> Result<SqmCaseSearched> {
    let mut when_fragments = Vec::with_capacity(case.when_fragments.len());
    for (predicate, result) in &case.when_fragments {
        let predicate = walker.visit_predicate(predicate)?;
        let result = walker.visit_expression(result)?;
        when_fragments.push((predicate, result));
    }
    let otherwise = case
        .otherwise
        .as_ref()
        .map(|o| walker.visit_expression(o).map(Box::new))
        .transpose()?;
    Ok(SqmCaseSearched {
        when_fragments,
        otherwise,
        node_type: case.node_type.clone(),
    })
}

pub fn walk_predicate<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    predicate: &SqmPredicate,
) -> Result<SqmPredicate> {
    Ok(match predicate {
        SqmPredicate::And(j) => SqmPredicate::And(walker.visit_and_predicate(j)?),
        SqmPredicate::Or(j) => SqmPredicate::Or(walker.visit_or_predicate(j)?),
        SqmPredicate::Negated(p) => SqmPredicate::Negated(Box::new(walker.visit_negated_predicate(p)?)),
        SqmPredicate::Grouped(p) => SqmPredicate::Grouped(Box::new(walker.visit_grouped_predicate(p)?)),
        SqmPredicate::Comparison(c) => SqmPredicate::Comparison(walker.visit_comparison_predicate(c)?),
        SqmPredicate::Between(b) => SqmPredicate::Between(walker.visit_between_predicate(b)?),
        SqmPredicate::Like(l) => SqmPredicate::Like(walker.visit_like_predicate(l)?),
        SqmPredicate::InList(i) => SqmPredicate::InList(walker.visit_in_list_predicate(i)?),
        SqmPredicate::InSubQuery(i) => SqmPredicate::InSubQuery(walker.visit_in_sub_query_predicate(i)?),
        SqmPredicate::MemberOf(m) => SqmPredicate::MemberOf(walker.visit_member_of_predicate(m)?),
        SqmPredicate::Nullness(n) => SqmPredicate::Nullness(walker.visit_nullness_predicate(n)?),
        SqmPredicate::Emptiness(e) => SqmPredicate::Emptiness(walker.visit_emptiness_predicate(e)?),
        SqmPredicate::BooleanExpression(e) => {
            SqmPredicate::BooleanExpression(walker.visit_boolean_expression_predicate(e)?)
        }
    })
}

pub fn walk_junction<W: SemanticQueryWalker + ?Sized>(
    walker: &mut W,
    junction: &SqmJunction,
) -> Result<SqmJunction> {
    let lhs = walker.visit_predicate(&junction.lhs)?;
    let rhs = walker.visit_predicate(&junction.rhs)?;
    Ok(SqmJunction {
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

impl SqmRoot {
    /// This root without its joins.
    fn clone_shallow(&self) -> Self {
        Self {
            id: self.id,
            entity_name: self.entity_name.clone(),
            alias: self.alias.clone(),
            navigable_path: self.navigable_path.clone(),
            joins: Vec::new(),
        }
    }
}
