use thiserror::Error;

/// Primary error type for query compilation.
///
/// Every failure raised while walking, splitting, or lowering a semantic
/// query tree is one of these variants. Variants fall into four families
/// (see [`ErrorKind`]) that callers can tell apart without string matching.
/// No variant is ever recovered from inside the compiler: a failed lowering
/// aborts the whole statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqmError {
    // === Semantic Errors (user query is ill-formed) ===
    /// An arithmetic operator that is illegal between two temporal values.
    #[error("illegal operator for temporal type: {operator} (operands: {lhs} {operator} {rhs})")]
    IllegalTemporalOperator {
        operator: String,
        lhs: String,
        rhs: String,
    },

    /// An arithmetic operator that cannot be applied to a duration.
    #[error("illegal operator for a duration: {operator}")]
    IllegalDurationOperator { operator: String },

    /// A scale or sign was about to be distributed over a date/timestamp.
    #[error("scalar multiplication of temporal value: {operand}")]
    ScalarMultiplicationOfTemporal { operand: String },

    /// Conversion between two temporal units without a fixed ratio.
    #[error("illegal unit conversion: {from} to {to}")]
    IllegalUnitConversion { from: String, to: String },

    /// Any other semantic problem with the query.
    #[error("semantic error: {0}")]
    Semantic(String),

    // === Internal Errors (an earlier pass misbehaved) ===
    /// Internal consistency failure (should never happen).
    #[error("internal error: {0}")]
    Internal(String),

    /// A stack that must start empty already holds entries.
    #[error("cannot prime an already populated stack: {stack}")]
    StackAlreadyPrimed { stack: String },

    /// A join whose left-hand side has not been resolved to a table group.
    #[error("no table group resolved for join lhs '{lhs_path}' (join '{join_path}')")]
    UnresolvedJoinLhs { lhs_path: String, join_path: String },

    /// An entity name that the metamodel does not know.
    #[error("unknown entity: {name}")]
    UnknownEntity { name: String },

    /// An attribute name that an entity or embeddable does not declare.
    #[error("unknown attribute '{attribute}' of '{container}'")]
    UnknownAttribute { container: String, attribute: String },

    // === Not Yet Implemented ===
    /// Construct intentionally not handled at this layer.
    #[error("not yet implemented: {0}")]
    NotYetImplemented(String),

    // === Unsupported ===
    /// Operation that violates a component contract.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Coarse classification of [`SqmError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Illegal query; surfaced to the user against the query text.
    Semantic,
    /// Assertion / internal consistency failure in an earlier pass.
    Internal,
    /// Explicitly unimplemented construct.
    NotYetImplemented,
    /// Programming contract violation (e.g. splitting an UPDATE).
    Unsupported,
}

impl SqmError {
    /// Classify this error.
    #[allow(clippy::match_same_arms)]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalTemporalOperator { .. }
            | Self::IllegalDurationOperator { .. }
            | Self::ScalarMultiplicationOfTemporal { .. }
            | Self::IllegalUnitConversion { .. }
            | Self::Semantic(_) => ErrorKind::Semantic,
            Self::Internal(_)
            | Self::StackAlreadyPrimed { .. }
            | Self::UnresolvedJoinLhs { .. }
            | Self::UnknownEntity { .. }
            | Self::UnknownAttribute { .. } => ErrorKind::Internal,
            Self::NotYetImplemented(_) => ErrorKind::NotYetImplemented,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Whether the error is caused by the query itself rather than a bug.
    pub const fn is_user_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Semantic)
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::IllegalTemporalOperator { .. } => {
                Some("Only subtraction is defined between two dates or timestamps")
            }
            Self::IllegalDurationOperator { .. } => {
                Some("Durations may only be added, subtracted, or multiplied by a scalar")
            }
            Self::ScalarMultiplicationOfTemporal { .. } => {
                Some("Multiply the duration, not the date or timestamp it adjusts")
            }
            Self::IllegalUnitConversion { .. } => {
                Some("Month-based units cannot be converted to fixed-length units")
            }
            Self::NotYetImplemented(_) => Some("This construct is not yet supported by the compiler"),
            _ => None,
        }
    }

    /// Create a generic semantic error.
    pub fn semantic(msg: impl Into<String>) -> Self {
        Self::Semantic(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a not-yet-implemented error.
    pub fn not_yet_implemented(feature: impl Into<String>) -> Self {
        Self::NotYetImplemented(feature.into())
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Result type alias using `SqmError`.
pub type Result<T> = std::result::Result<T, SqmError>;
