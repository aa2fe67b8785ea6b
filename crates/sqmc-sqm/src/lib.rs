//! Semantic query model (SQM): the object-domain query tree.
//!
//! A semantic tree is produced by the HQL parser or the criteria builder
//! (both outside this workspace) and consumed by the splitter and the SQL-AST
//! lowering converter. Nodes are plain enums of structs; every from-element,
//! navigable reference, and parameter carries a stable id so that passes can
//! key side tables on identity without pointer comparisons.
//!
//! Traversal is provided by [`walker::SemanticQueryWalker`].

pub mod walker;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use sqmc_types::{
    BinaryArithmeticOperator, ComparisonOperator, JavaType, LiteralValue, NavigablePath,
    SortOrder, SqlJoinType, TemporalUnit, UnaryArithmeticOperator,
};

pub use walker::SemanticQueryWalker;

// ---------------------------------------------------------------------------
// Node identity
// ---------------------------------------------------------------------------

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a from-element or navigable reference.
///
/// Ids are allocated from a process-wide counter, so ids of independently
/// built trees never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of one parameter occurrence in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(u64);

impl ParameterId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A top-level semantic statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqmStatement {
    Select(SqmSelectStatement),
    Update(SqmUpdateStatement),
    Delete(SqmDeleteStatement),
    InsertSelect(SqmInsertSelectStatement),
}

/// `select ... from ...`
#[derive(Debug, Clone, PartialEq)]
pub struct SqmSelectStatement {
    pub query_spec: SqmQuerySpec,
}

/// `update Entity e set ... where ...`
#[derive(Debug, Clone, PartialEq)]
pub struct SqmUpdateStatement {
    pub target: SqmRoot,
    pub set_clause: SqmSetClause,
    pub where_clause: Option<SqmWhereClause>,
}

/// `delete from Entity e where ...`
#[derive(Debug, Clone, PartialEq)]
pub struct SqmDeleteStatement {
    pub target: SqmRoot,
    pub where_clause: Option<SqmWhereClause>,
}

/// `insert into Entity (a, b) select ...`
#[derive(Debug, Clone, PartialEq)]
pub struct SqmInsertSelectStatement {
    pub target: SqmRoot,
    pub state_fields: Vec<SqmPath>,
    pub select_query: SqmQuerySpec,
}

/// The SET clause of an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmSetClause {
    pub assignments: Vec<SqmAssignment>,
}

/// One `path = value` assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmAssignment {
    pub target: SqmPath,
    pub value: SqmExpression,
}

// ---------------------------------------------------------------------------
// Query spec and clauses
// ---------------------------------------------------------------------------

/// A single query specification (top level or nested).
#[derive(Debug, Clone, PartialEq)]
pub struct SqmQuerySpec {
    pub from_clause: SqmFromClause,
    pub select_clause: SqmSelectClause,
    pub where_clause: Option<SqmWhereClause>,
    pub group_by_clause: Option<SqmGroupByClause>,
    pub having_clause: Option<SqmHavingClause>,
    pub order_by_clause: Option<SqmOrderByClause>,
    pub limit_offset_clause: Option<SqmLimitOffsetClause>,
}

impl SqmQuerySpec {
    /// A query spec with the given FROM and SELECT and nothing else.
    #[must_use]
    pub const fn new(from_clause: SqmFromClause, select_clause: SqmSelectClause) -> Self {
        Self {
            from_clause,
            select_clause,
            where_clause: None,
            group_by_clause: None,
            having_clause: None,
            order_by_clause: None,
            limit_offset_clause: None,
        }
    }

    #[must_use]
    pub fn with_where(mut self, predicate: SqmPredicate) -> Self {
        self.where_clause = Some(SqmWhereClause { predicate });
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, sort_specifications: Vec<SqmSortSpecification>) -> Self {
        self.order_by_clause = Some(SqmOrderByClause { sort_specifications });
        self
    }

    #[must_use]
    pub fn with_limit_offset(
        mut self,
        limit: Option<SqmExpression>,
        offset: Option<SqmExpression>,
    ) -> Self {
        self.limit_offset_clause = Some(SqmLimitOffsetClause { limit, offset });
        self
    }
}

/// The FROM clause: one space per comma-separated root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqmFromClause {
    pub spaces: Vec<SqmFromElementSpace>,
}

impl SqmFromClause {
    /// A FROM clause with a single root.
    #[must_use]
    pub fn of(root: SqmRoot) -> Self {
        Self {
            spaces: vec![SqmFromElementSpace {
                root,
                joins: Vec::new(),
            }],
        }
    }
}

/// One root plus the cross / entity joins hanging off the space.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmFromElementSpace {
    pub root: SqmRoot,
    pub joins: Vec<SqmSpaceJoin>,
}

/// A join attached to a from-element space rather than a path.
#[derive(Debug, Clone, PartialEq)]
pub enum SqmSpaceJoin {
    Cross(SqmCrossJoin),
    Entity(SqmEntityJoin),
}

/// The SELECT clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqmSelectClause {
    pub distinct: bool,
    pub selections: Vec<SqmSelection>,
}

impl SqmSelectClause {
    /// A non-distinct select of the given expressions.
    #[must_use]
    pub fn of(expressions: Vec<SqmExpression>) -> Self {
        Self {
            distinct: false,
            selections: expressions
                .into_iter()
                .map(|expression| SqmSelection {
                    expression,
                    alias: None,
                })
                .collect(),
        }
    }
}

/// One selected expression with its optional result alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmSelection {
    pub expression: SqmExpression,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmWhereClause {
    pub predicate: SqmPredicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmGroupByClause {
    pub expressions: Vec<SqmExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmHavingClause {
    pub predicate: SqmPredicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmOrderByClause {
    pub sort_specifications: Vec<SqmSortSpecification>,
}

/// One ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmSortSpecification {
    pub expression: SqmExpression,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmLimitOffsetClause {
    pub limit: Option<SqmExpression>,
    pub offset: Option<SqmExpression>,
}

// ---------------------------------------------------------------------------
// From elements
// ---------------------------------------------------------------------------

/// Join type as written in the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SqmJoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl SqmJoinType {
    /// The SQL join type this semantic join lowers to.
    #[must_use]
    pub const fn to_sql(self) -> SqlJoinType {
        match self {
            Self::Inner => SqlJoinType::Inner,
            Self::Left => SqlJoinType::Left,
            Self::Right => SqlJoinType::Right,
            Self::Full => SqlJoinType::Full,
            Self::Cross => SqlJoinType::Cross,
        }
    }
}

/// A root entity reference: `from Person p`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmRoot {
    pub id: NodeId,
    pub entity_name: String,
    pub alias: Option<String>,
    pub navigable_path: NavigablePath,
    pub joins: Vec<SqmAttributeJoin>,
}

impl SqmRoot {
    #[must_use]
    pub fn new(entity_name: &str, alias: Option<&str>) -> Self {
        Self {
            id: NodeId::next(),
            entity_name: entity_name.to_owned(),
            alias: alias.map(str::to_owned),
            navigable_path: NavigablePath::root(entity_name, alias),
            joins: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_join(mut self, join: SqmAttributeJoin) -> Self {
        self.joins.push(join);
        self
    }
}

/// A join along an attribute of a from-element: `join p.address a`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmAttributeJoin {
    pub id: NodeId,
    pub lhs_path: NavigablePath,
    pub attribute: String,
    pub alias: Option<String>,
    pub navigable_path: NavigablePath,
    pub join_type: SqmJoinType,
    pub fetched: bool,
    pub on_predicate: Option<SqmPredicate>,
    pub joins: Vec<SqmAttributeJoin>,
}

impl SqmAttributeJoin {
    #[must_use]
    pub fn new(
        lhs_path: &NavigablePath,
        attribute: &str,
        alias: Option<&str>,
        join_type: SqmJoinType,
    ) -> Self {
        let navigable_path = match alias {
            Some(alias) => lhs_path.append_aliased(attribute, alias),
            None => lhs_path.append(attribute),
        };
        Self {
            id: NodeId::next(),
            lhs_path: lhs_path.clone(),
            attribute: attribute.to_owned(),
            alias: alias.map(str::to_owned),
            navigable_path,
            join_type,
            fetched: false,
            on_predicate: None,
            joins: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_on(mut self, predicate: SqmPredicate) -> Self {
        self.on_predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_join(mut self, join: Self) -> Self {
        self.joins.push(join);
        self
    }
}

/// `cross join Entity e`
#[derive(Debug, Clone, PartialEq)]
pub struct SqmCrossJoin {
    pub id: NodeId,
    pub entity_name: String,
    pub alias: Option<String>,
    pub navigable_path: NavigablePath,
    pub joins: Vec<SqmAttributeJoin>,
}

impl SqmCrossJoin {
    #[must_use]
    pub fn new(entity_name: &str, alias: Option<&str>) -> Self {
        Self {
            id: NodeId::next(),
            entity_name: entity_name.to_owned(),
            alias: alias.map(str::to_owned),
            navigable_path: NavigablePath::root(entity_name, alias),
            joins: Vec::new(),
        }
    }
}

/// `join Entity e on ...` (a qualified entity join).
#[derive(Debug, Clone, PartialEq)]
pub struct SqmEntityJoin {
    pub id: NodeId,
    pub entity_name: String,
    pub alias: Option<String>,
    pub navigable_path: NavigablePath,
    pub join_type: SqmJoinType,
    pub on_predicate: Option<SqmPredicate>,
    pub joins: Vec<SqmAttributeJoin>,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A semantic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SqmExpression {
    Literal(SqmLiteral),
    Parameter(SqmParameter),
    Unary(SqmUnaryOperation),
    BinaryArithmetic(SqmBinaryArithmetic),
    Concat(SqmConcat),
    CaseSimple(SqmCaseSimple),
    CaseSearched(SqmCaseSearched),
    SubQuery(SqmSubQuery),
    Function(SqmFunction),
    Path(SqmPath),
    /// `to_duration(magnitude, unit)`: a literal duration.
    ToDuration(SqmToDuration),
    /// `duration by unit`: a duration converted to a scalar.
    ByUnit(SqmByUnit),
    Tuple(SqmTuple),
}

impl SqmExpression {
    /// The static type of this expression, when known.
    #[must_use]
    pub fn node_type(&self) -> Option<JavaType> {
        match self {
            Self::Literal(l) => l.node_type.clone(),
            Self::Parameter(p) => p.anticipated_type.clone(),
            Self::Unary(u) => u.operand.node_type(),
            Self::BinaryArithmetic(b) => Some(b.node_type.clone()),
            Self::Concat(_) => Some(JavaType::STRING),
            Self::CaseSimple(c) => Some(c.node_type.clone()),
            Self::CaseSearched(c) => Some(c.node_type.clone()),
            Self::SubQuery(s) => Some(s.node_type.clone()),
            Self::Function(f) => Some(f.node_type.clone()),
            Self::Path(p) => Some(p.node_type.clone()),
            Self::ToDuration(_) => Some(JavaType::DURATION),
            Self::ByUnit(b) => Some(b.node_type.clone()),
            Self::Tuple(t) => t.node_type.clone(),
        }
    }

    /// A literal whose type is its natural type.
    #[must_use]
    pub fn literal(value: LiteralValue) -> Self {
        let node_type = value.natural_type().map(JavaType::Basic);
        Self::Literal(SqmLiteral { value, node_type })
    }

    /// A literal with an explicit static type.
    #[must_use]
    pub const fn typed_literal(value: LiteralValue, node_type: JavaType) -> Self {
        Self::Literal(SqmLiteral {
            value,
            node_type: Some(node_type),
        })
    }

    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::literal(LiteralValue::Integer(value))
    }

    #[must_use]
    pub fn binary(
        lhs: Self,
        operator: BinaryArithmeticOperator,
        rhs: Self,
        node_type: JavaType,
    ) -> Self {
        Self::BinaryArithmetic(SqmBinaryArithmetic {
            operator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            node_type,
        })
    }

    #[must_use]
    pub fn negate(operand: Self) -> Self {
        Self::Unary(SqmUnaryOperation {
            operator: UnaryArithmeticOperator::UnaryMinus,
            operand: Box::new(operand),
        })
    }

    #[must_use]
    pub fn to_duration(magnitude: Self, unit: TemporalUnit) -> Self {
        Self::ToDuration(SqmToDuration {
            magnitude: Box::new(magnitude),
            unit,
        })
    }

    #[must_use]
    pub fn by_unit(duration: Self, unit: TemporalUnit) -> Self {
        Self::ByUnit(SqmByUnit {
            duration: Box::new(duration),
            unit,
            node_type: JavaType::LONG,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmLiteral {
    pub value: LiteralValue,
    pub node_type: Option<JavaType>,
}

/// How a parameter is written in the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// `:name`
    Named(String),
    /// `?1`
    Positional(u32),
    /// A parameter object created through the criteria API.
    Criteria(u32),
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, ":{name}"),
            Self::Positional(pos) => write!(f, "?{pos}"),
            Self::Criteria(n) => write!(f, "<criteria-param-{n}>"),
        }
    }
}

/// One occurrence of a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmParameter {
    pub id: ParameterId,
    pub kind: ParameterKind,
    /// Type implied by the parameter's position, if known.
    pub anticipated_type: Option<JavaType>,
    /// Whether the parameter may be bound to a collection of values.
    pub allow_multi_valued: bool,
}

impl SqmParameter {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::new(ParameterKind::Named(name.to_owned()))
    }

    #[must_use]
    pub fn positional(position: u32) -> Self {
        Self::new(ParameterKind::Positional(position))
    }

    fn new(kind: ParameterKind) -> Self {
        Self {
            id: ParameterId::next(),
            kind,
            anticipated_type: None,
            allow_multi_valued: false,
        }
    }

    #[must_use]
    pub fn with_type(mut self, ty: JavaType) -> Self {
        self.anticipated_type = Some(ty);
        self
    }

    #[must_use]
    pub const fn multi_valued(mut self) -> Self {
        self.allow_multi_valued = true;
        self
    }

    /// A new occurrence of the same logical parameter.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            id: ParameterId::next(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmUnaryOperation {
    pub operator: UnaryArithmeticOperator,
    pub operand: Box<SqmExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmBinaryArithmetic {
    pub operator: BinaryArithmeticOperator,
    pub lhs: Box<SqmExpression>,
    pub rhs: Box<SqmExpression>,
    pub node_type: JavaType,
}

/// String concatenation `lhs || rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmConcat {
    pub lhs: Box<SqmExpression>,
    pub rhs: Box<SqmExpression>,
}

/// `case fixture when v then r ... else o end`
#[derive(Debug, Clone, PartialEq)]
pub struct SqmCaseSimple {
    pub fixture: Box<SqmExpression>,
    pub when_fragments: Vec<(SqmExpression, SqmExpression)>,
    pub otherwise: Option<Box<SqmExpression>>,
    pub node_type: JavaType,
}

/// `case when p then r ... else o end`
#[derive(Debug, Clone, PartialEq)]
pub struct SqmCaseSearched {
    pub when_fragments: Vec<(SqmPredicate, SqmExpression)>,
    pub otherwise: Option<Box<SqmExpression>>,
    pub node_type: JavaType,
}

/// A nested query used as an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmSubQuery {
    pub query_spec: Box<SqmQuerySpec>,
    pub node_type: JavaType,
}

/// Trim specification of `trim(...)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrimSpec {
    Leading,
    Trailing,
    #[default]
    Both,
}

/// The functions the semantic layer knows by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqmFunctionKind {
    Avg { distinct: bool },
    Sum { distinct: bool },
    Min,
    Max,
    Count { distinct: bool },
    CountStar,
    Substring,
    Trim { spec: TrimSpec, character: Option<char> },
    Cast { target: JavaType },
    Upper,
    Lower,
    Length,
    Locate,
    Abs,
    Mod,
    Coalesce,
    NullIf,
    Concat,
    CurrentDate,
    CurrentTime,
    CurrentTimestamp,
    Extract { unit: TemporalUnit },
    /// Any other function, passed through by name.
    Generic { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmFunction {
    pub kind: SqmFunctionKind,
    pub arguments: Vec<SqmExpression>,
    pub node_type: JavaType,
}

/// Classification of a navigable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqmPathKind {
    /// A single-column attribute.
    Basic,
    /// A composite value stored in its owner's table.
    Embedded,
    /// A reference to an entity (a from-element or a to-one attribute).
    Entity,
    /// A collection-valued attribute.
    Plural,
    /// `element(c)` / `value(m)`
    CollectionElement,
    /// `index(l)` / `key(m)`
    CollectionIndex,
    /// `entry(m)`
    MapEntry,
}

/// A navigable reference: `p`, `p.name`, `p.address`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct SqmPath {
    pub id: NodeId,
    pub kind: SqmPathKind,
    pub navigable_path: NavigablePath,
    /// Path of the from-element or value this one is dereferenced from.
    pub lhs_path: Option<NavigablePath>,
    pub node_type: JavaType,
}

impl SqmPath {
    /// A reference to a from-element itself (`select p`).
    #[must_use]
    pub fn from_element(navigable_path: &NavigablePath, entity_name: &str) -> Self {
        Self {
            id: NodeId::next(),
            kind: SqmPathKind::Entity,
            navigable_path: navigable_path.clone(),
            lhs_path: None,
            node_type: JavaType::Entity(entity_name.to_owned()),
        }
    }

    /// A dereference of `attribute` on `lhs`.
    #[must_use]
    pub fn attribute(
        lhs: &NavigablePath,
        attribute: &str,
        kind: SqmPathKind,
        node_type: JavaType,
    ) -> Self {
        Self {
            id: NodeId::next(),
            kind,
            navigable_path: lhs.append(attribute),
            lhs_path: Some(lhs.clone()),
            node_type,
        }
    }

    /// A basic-valued attribute reference.
    #[must_use]
    pub fn basic(lhs: &NavigablePath, attribute: &str, node_type: JavaType) -> Self {
        Self::attribute(lhs, attribute, SqmPathKind::Basic, node_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmToDuration {
    pub magnitude: Box<SqmExpression>,
    pub unit: TemporalUnit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmByUnit {
    pub duration: Box<SqmExpression>,
    pub unit: TemporalUnit,
    /// Scalar result type, `Long` unless overridden.
    pub node_type: JavaType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmTuple {
    pub elements: Vec<SqmExpression>,
    pub node_type: Option<JavaType>,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// A semantic predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum SqmPredicate {
    And(SqmJunction),
    Or(SqmJunction),
    Negated(Box<SqmPredicate>),
    Grouped(Box<SqmPredicate>),
    Comparison(SqmComparisonPredicate),
    Between(SqmBetweenPredicate),
    Like(SqmLikePredicate),
    InList(SqmInListPredicate),
    InSubQuery(SqmInSubQueryPredicate),
    MemberOf(SqmMemberOfPredicate),
    Nullness(SqmNullnessPredicate),
    Emptiness(SqmEmptinessPredicate),
    BooleanExpression(SqmExpression),
}

impl SqmPredicate {
    #[must_use]
    pub fn and(lhs: Self, rhs: Self) -> Self {
        Self::And(SqmJunction {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    #[must_use]
    pub fn or(lhs: Self, rhs: Self) -> Self {
        Self::Or(SqmJunction {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    #[must_use]
    pub const fn comparison(lhs: SqmExpression, operator: ComparisonOperator, rhs: SqmExpression) -> Self {
        Self::Comparison(SqmComparisonPredicate { lhs, operator, rhs })
    }

    #[must_use]
    pub const fn between(expression: SqmExpression, lower: SqmExpression, upper: SqmExpression) -> Self {
        Self::Between(SqmBetweenPredicate {
            expression,
            lower,
            upper,
            negated: false,
        })
    }

    #[must_use]
    pub const fn in_list(test_expression: SqmExpression, list_expressions: Vec<SqmExpression>) -> Self {
        Self::InList(SqmInListPredicate {
            test_expression,
            list_expressions,
            negated: false,
        })
    }
}

/// Binary AND / OR.
#[derive(Debug, Clone, PartialEq)]
pub struct SqmJunction {
    pub lhs: Box<SqmPredicate>,
    pub rhs: Box<SqmPredicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmComparisonPredicate {
    pub lhs: SqmExpression,
    pub operator: ComparisonOperator,
    pub rhs: SqmExpression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmBetweenPredicate {
    pub expression: SqmExpression,
    pub lower: SqmExpression,
    pub upper: SqmExpression,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmLikePredicate {
    pub match_expression: SqmExpression,
    pub pattern: SqmExpression,
    pub escape: Option<SqmExpression>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmInListPredicate {
    pub test_expression: SqmExpression,
    pub list_expressions: Vec<SqmExpression>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmInSubQueryPredicate {
    pub test_expression: SqmExpression,
    pub sub_query: SqmSubQuery,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmMemberOfPredicate {
    pub expression: SqmExpression,
    pub plural_path: SqmPath,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmNullnessPredicate {
    pub expression: SqmExpression,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqmEmptinessPredicate {
    pub plural_path: SqmPath,
    pub negated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn parameter_copy_keeps_kind_and_changes_id() {
        let p = SqmParameter::named("ids").multi_valued();
        let c = p.copy();
        assert_ne!(p.id, c.id);
        assert_eq!(p.kind, c.kind);
        assert!(c.allow_multi_valued);
    }

    #[test]
    fn attribute_join_paths() {
        let root = SqmRoot::new("Person", Some("p"));
        let join = SqmAttributeJoin::new(&root.navigable_path, "address", Some("a"), SqmJoinType::Inner);
        assert_eq!(join.navigable_path.to_string(), "Person(p).address(a)");
        assert_eq!(join.navigable_path.parent(), Some(root.navigable_path.clone()));
    }

    #[test]
    fn expression_node_types() {
        assert_eq!(SqmExpression::integer(1).node_type(), Some(JavaType::INTEGER));
        let d = SqmExpression::to_duration(SqmExpression::integer(5), TemporalUnit::Hour);
        assert_eq!(d.node_type(), Some(JavaType::DURATION));
        assert_eq!(
            SqmExpression::by_unit(d, TemporalUnit::Minute).node_type(),
            Some(JavaType::LONG)
        );
        assert_eq!(
            SqmExpression::negate(SqmExpression::integer(2)).node_type(),
            Some(JavaType::INTEGER)
        );
        assert_eq!(SqmExpression::Parameter(SqmParameter::positional(1)).node_type(), None);
    }

    #[test]
    fn join_type_lowering() {
        assert_eq!(SqmJoinType::Left.to_sql(), SqlJoinType::Left);
        assert_eq!(SqmJoinType::default().to_sql(), SqlJoinType::Inner);
    }
}
