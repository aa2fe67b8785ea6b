//! Relational SQL AST produced by lowering a semantic query.
//!
//! Nodes are self-contained: nothing here points back into the semantic
//! tree. Table groups live in a [`TableGroupArena`] and are referred to by
//! [`TableGroupId`], so that resolving the same navigable path twice yields
//! the same group, and joins can be attached to a group after creation.

mod display;

use std::fmt;

use smallvec::{SmallVec, smallvec};
use sqmc_error::{Result, SqmError};
use sqmc_types::{
    BasicType, BinaryArithmeticOperator, ComparisonOperator, JavaType, JdbcMappings, LiteralValue,
    LockMode, NavigablePath, SortOrder, SqlJoinType, TemporalUnit, UnaryArithmeticOperator,
};

pub use display::QuerySpecDisplay;

// ---------------------------------------------------------------------------
// Table groups
// ---------------------------------------------------------------------------

/// Index of a [`TableGroup`] in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableGroupId(u32);

impl TableGroupId {
    /// Position of the group in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| SqmError::internal(format!("table group index {index} exceeds the arena limit")))
    }
}

impl fmt::Display for TableGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tg{}", self.0)
    }
}

/// A physical table occurrence: `person p1_0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableReference {
    pub table_name: String,
    pub identification_variable: String,
}

/// The set of tables a from-element (entity root or join) maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGroup {
    pub id: TableGroupId,
    pub navigable_path: NavigablePath,
    pub entity_name: String,
    /// Alias stem shared by the group's table references.
    pub source_alias: String,
    pub primary_table_reference: TableReference,
    pub lock_mode: LockMode,
    pub table_group_joins: Vec<TableGroupJoin>,
}

impl TableGroup {
    /// A column of this group's primary table.
    #[must_use]
    pub fn column(&self, column: &str, jdbc_mapping: BasicType) -> ColumnReference {
        ColumnReference {
            qualifier: self.primary_table_reference.identification_variable.clone(),
            column_expression: column.to_owned(),
            jdbc_mapping,
        }
    }
}

/// A SQL join from one table group to another.
#[derive(Debug, Clone, PartialEq)]
pub struct TableGroupJoin {
    pub navigable_path: NavigablePath,
    pub join_type: SqlJoinType,
    pub joined_group: TableGroupId,
    pub predicate: Option<Predicate>,
}

/// Owner of every table group created while lowering one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGroupArena {
    groups: Vec<TableGroup>,
}

impl TableGroupArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group with no joins and return its id.
    pub fn create(
        &mut self,
        navigable_path: NavigablePath,
        entity_name: &str,
        source_alias: &str,
        primary_table_reference: TableReference,
        lock_mode: LockMode,
    ) -> Result<TableGroupId> {
        let id = TableGroupId::from_index(self.groups.len())?;
        self.groups.push(TableGroup {
            id,
            navigable_path,
            entity_name: entity_name.to_owned(),
            source_alias: source_alias.to_owned(),
            primary_table_reference,
            lock_mode,
            table_group_joins: Vec::new(),
        });
        Ok(id)
    }

    #[must_use]
    pub fn get(&self, id: TableGroupId) -> Option<&TableGroup> {
        self.groups.get(id.index())
    }

    pub fn get_mut(&mut self, id: TableGroupId) -> Option<&mut TableGroup> {
        self.groups.get_mut(id.index())
    }

    /// Attach a join to `lhs`. Returns `false` if `lhs` is unknown.
    pub fn add_join(&mut self, lhs: TableGroupId, join: TableGroupJoin) -> bool {
        match self.groups.get_mut(lhs.index()) {
            Some(group) => {
                group.table_group_joins.push(join);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableGroup> {
        self.groups.iter()
    }
}

// ---------------------------------------------------------------------------
// Query spec
// ---------------------------------------------------------------------------

/// A lowered SELECT statement: the root query spec plus the groups it uses.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub query_spec: QuerySpec,
    pub table_groups: TableGroupArena,
}

/// The FROM clause: root table groups, each with its joins in the arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FromClause {
    pub roots: Vec<TableGroupId>,
}

/// One selected SQL expression and its position in the result.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlSelection {
    pub values_array_position: usize,
    pub expression: Expression,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectClause {
    pub distinct: bool,
    sql_selections: Vec<SqlSelection>,
}

impl SelectClause {
    /// Position of `expression` in the result, adding it when not already
    /// selected.
    pub fn resolve_sql_selection(&mut self, expression: Expression) -> usize {
        if let Some(existing) = self
            .sql_selections
            .iter()
            .find(|s| s.expression == expression)
        {
            return existing.values_array_position;
        }
        let position = self.sql_selections.len();
        self.sql_selections.push(SqlSelection {
            values_array_position: position,
            expression,
        });
        position
    }

    #[must_use]
    pub fn sql_selections(&self) -> &[SqlSelection] {
        &self.sql_selections
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpecification {
    pub sort_expression: Expression,
    pub sort_order: SortOrder,
}

/// One lowered query specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    /// Whether this is the outermost query of the statement.
    pub is_root: bool,
    pub from_clause: FromClause,
    pub select_clause: SelectClause,
    pub where_clause: Option<Predicate>,
    pub sort_specifications: Vec<SortSpecification>,
    pub limit_clause_expression: Option<Expression>,
    pub offset_clause_expression: Option<Expression>,
}

impl QuerySpec {
    #[must_use]
    pub fn new(is_root: bool) -> Self {
        Self {
            is_root,
            ..Self::default()
        }
    }

    /// AND `predicate` into the WHERE restrictions.
    pub fn add_restriction(&mut self, predicate: Predicate) {
        self.where_clause = Some(match self.where_clause.take() {
            None => predicate,
            Some(Predicate::Junction {
                kind: JunctionKind::Conjunction,
                mut predicates,
            }) => {
                predicates.push(predicate);
                Predicate::Junction {
                    kind: JunctionKind::Conjunction,
                    predicates,
                }
            }
            Some(existing) => Predicate::Junction {
                kind: JunctionKind::Conjunction,
                predicates: vec![existing, predicate],
            },
        });
    }

    /// Render this spec with the table groups of `arena` expanded.
    #[must_use]
    pub const fn display<'a>(&'a self, arena: &'a TableGroupArena) -> QuerySpecDisplay<'a> {
        QuerySpecDisplay { spec: self, arena }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A column of a table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnReference {
    /// Identification variable of the owning table reference.
    pub qualifier: String,
    pub column_expression: String,
    pub jdbc_mapping: BasicType,
}

/// What kind of domain value a navigable reference denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigableKind {
    Basic,
    Embedded,
    Entity,
}

/// A resolved domain path: its columns in the owning table group.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigableReference {
    pub kind: NavigableKind,
    pub navigable_path: NavigablePath,
    pub table_group: TableGroupId,
    pub columns: SmallVec<[ColumnReference; 1]>,
    pub ty: JavaType,
}

/// One JDBC bind position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JdbcParameter {
    /// Zero-based position in the statement's parameter registry.
    pub position: usize,
    pub jdbc_mapping: BasicType,
}

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(ColumnReference),
    Navigable(NavigableReference),
    /// A literal, rendered inline when it appears in the SELECT clause.
    QueryLiteral {
        value: LiteralValue,
        ty: BasicType,
        in_select: bool,
    },
    /// A query parameter and the JDBC positions it binds to.
    Parameter {
        jdbc_parameters: SmallVec<[JdbcParameter; 1]>,
    },
    Tuple(Vec<Self>),
    Unary {
        operator: UnaryArithmeticOperator,
        operand: Box<Self>,
        ty: BasicType,
    },
    BinaryArithmetic {
        lhs: Box<Self>,
        operator: BinaryArithmeticOperator,
        rhs: Box<Self>,
        ty: BasicType,
    },
    /// A duration value: `magnitude` counted in `unit`.
    Duration {
        magnitude: Box<Self>,
        unit: TemporalUnit,
        ty: BasicType,
    },
    /// A unit keyword passed to a temporal function.
    DurationUnit { unit: TemporalUnit, ty: BasicType },
    /// A duration converted to a scalar count of `unit`.
    Conversion {
        duration: Box<Self>,
        unit: TemporalUnit,
        ty: BasicType,
    },
    Function {
        name: String,
        arguments: Vec<Self>,
        ty: BasicType,
    },
    /// The `*` argument of `count(*)`.
    Star,
    /// `distinct x` as the argument of an aggregate.
    Distinct(Box<Self>),
    CaseSimple {
        fixture: Box<Self>,
        whens: Vec<(Self, Self)>,
        otherwise: Option<Box<Self>>,
        ty: BasicType,
    },
    CaseSearched {
        whens: Vec<(Predicate, Self)>,
        otherwise: Option<Box<Self>>,
        ty: BasicType,
    },
    SubQuery {
        query_spec: Box<QuerySpec>,
        ty: Option<BasicType>,
    },
}

impl Expression {
    /// The JDBC column types this expression produces.
    #[must_use]
    pub fn expression_type(&self) -> JdbcMappings {
        match self {
            Self::Column(c) => smallvec![c.jdbc_mapping],
            Self::Navigable(n) => n.columns.iter().map(|c| c.jdbc_mapping).collect(),
            Self::QueryLiteral { ty, .. }
            | Self::Unary { ty, .. }
            | Self::BinaryArithmetic { ty, .. }
            | Self::Duration { ty, .. }
            | Self::DurationUnit { ty, .. }
            | Self::Conversion { ty, .. }
            | Self::Function { ty, .. }
            | Self::CaseSimple { ty, .. }
            | Self::CaseSearched { ty, .. } => smallvec![*ty],
            Self::Parameter { jdbc_parameters } => {
                jdbc_parameters.iter().map(|p| p.jdbc_mapping).collect()
            }
            Self::Tuple(elements) => elements.iter().flat_map(Self::expression_type).collect(),
            Self::Star => SmallVec::new(),
            Self::Distinct(inner) => inner.expression_type(),
            Self::SubQuery { ty, .. } => ty.iter().copied().collect(),
        }
    }

    /// The single JDBC type of a one-column expression.
    #[must_use]
    pub fn single_type(&self) -> Option<BasicType> {
        let types = self.expression_type();
        (types.len() == 1).then(|| types[0])
    }

    /// Whether this is the integer literal one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, Self::QueryLiteral { value, .. } if value.is_one())
    }

    /// Fold a constant numeric expression.
    ///
    /// Durations fold to their length in nanoseconds; a conversion of a
    /// literal duration folds to the exact count of the target unit.
    /// Anything that depends on a column or parameter yields `None`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            Self::QueryLiteral { value, .. } => value.as_f64(),
            Self::Unary { operator, operand, .. } => {
                let v = operand.constant_value()?;
                Some(match operator {
                    UnaryArithmeticOperator::UnaryMinus => -v,
                    UnaryArithmeticOperator::UnaryPlus => v,
                })
            }
            Self::BinaryArithmetic { lhs, operator, rhs, .. } => {
                let (l, r) = (lhs.constant_value()?, rhs.constant_value()?);
                match operator {
                    BinaryArithmeticOperator::Add => Some(l + r),
                    BinaryArithmeticOperator::Subtract => Some(l - r),
                    BinaryArithmeticOperator::Multiply => Some(l * r),
                    BinaryArithmeticOperator::Divide if r != 0.0 => Some(l / r),
                    BinaryArithmeticOperator::Quot if r != 0.0 => Some((l / r).trunc()),
                    BinaryArithmeticOperator::Modulo if r != 0.0 => Some(l % r),
                    _ => None,
                }
            }
            Self::Duration { magnitude, unit, .. } => {
                let nanos = unit.nanos_per_unit()?;
                Some(magnitude.constant_value()? * nanos as f64)
            }
            Self::Conversion { duration, unit, .. } => match duration.as_ref() {
                Self::Duration {
                    magnitude,
                    unit: from,
                    ..
                } => {
                    let ratio = from.conversion_factor(*unit).ok()?;
                    Some(ratio.apply(magnitude.constant_value()?))
                }
                other => {
                    let nanos = unit.nanos_per_unit()?;
                    Some(other.constant_value()? / nanos as f64)
                }
            },
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JunctionKind {
    Conjunction,
    Disjunction,
}

/// A SQL predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Junction {
        kind: JunctionKind,
        predicates: Vec<Self>,
    },
    Negated(Box<Self>),
    Grouped(Box<Self>),
    Comparison {
        lhs: Expression,
        operator: ComparisonOperator,
        rhs: Expression,
    },
    Between {
        expression: Expression,
        lower_bound: Expression,
        upper_bound: Expression,
        negated: bool,
    },
    Like {
        match_expression: Expression,
        pattern: Expression,
        escape_character: Option<Expression>,
        negated: bool,
    },
    InList {
        test_expression: Expression,
        list_expressions: Vec<Expression>,
        negated: bool,
    },
    InSubQuery {
        test_expression: Expression,
        sub_query: Box<QuerySpec>,
        negated: bool,
    },
    Nullness {
        expression: Expression,
        negated: bool,
    },
    BooleanExpression(Expression),
}
