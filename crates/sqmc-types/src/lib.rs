//! Shared domain types for the query compiler.
//!
//! These types are consumed by every other crate in the workspace: the
//! semantic tree uses them to describe static types and paths, the SQL AST
//! uses them to describe JDBC-level types, and the lowering converter uses
//! [`TypeConfiguration`] to classify operands.

pub mod ops;
pub mod path;
pub mod temporal;
pub mod types;
pub mod value;

pub use ops::{BinaryArithmeticOperator, ComparisonOperator, SortOrder, UnaryArithmeticOperator};
pub use path::{NavigablePath, PathSegment};
pub use temporal::{TemporalUnit, UnitFamily, UnitRatio};
pub use types::{
    BasicJavaType, BasicType, JavaType, JdbcMappings, JdbcTypeCode, TemporalType, TypeConfiguration,
};
pub use value::LiteralValue;

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Clause
// ---------------------------------------------------------------------------

/// The syntactic clause currently being lowered.
///
/// Pushed onto the converter's clause stack so that behavior depending on the
/// position in the query (parameter type inference, literal rendering) can be
/// decided locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clause {
    Select,
    From,
    Where,
    GroupBy,
    Having,
    Order,
    Limit,
    Offset,
    Set,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::GroupBy => "GROUP BY",
            Self::Having => "HAVING",
            Self::Order => "ORDER BY",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Set => "SET",
        })
    }
}

// ---------------------------------------------------------------------------
// Lock mode
// ---------------------------------------------------------------------------

/// Lock mode requested for the tables of a table group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockMode {
    #[default]
    None,
    Read,
    Optimistic,
    PessimisticRead,
    PessimisticWrite,
}

// ---------------------------------------------------------------------------
// SQL join type
// ---------------------------------------------------------------------------

/// Join type of a SQL-level table group join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlJoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl fmt::Display for SqlJoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_display() {
        assert_eq!(Clause::Order.to_string(), "ORDER BY");
        assert_eq!(Clause::Offset.to_string(), "OFFSET");
    }

    #[test]
    fn lock_mode_serde_names() {
        let json = serde_json::to_string(&LockMode::PessimisticWrite).unwrap();
        assert_eq!(json, "\"PESSIMISTIC_WRITE\"");
        let back: LockMode = serde_json::from_str("\"NONE\"").unwrap();
        assert_eq!(back, LockMode::None);
    }

    #[test]
    fn join_type_defaults_to_inner() {
        assert_eq!(SqlJoinType::default(), SqlJoinType::Inner);
        assert_eq!(SqlJoinType::Cross.to_string(), "CROSS JOIN");
    }
}
