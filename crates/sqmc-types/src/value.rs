use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::BasicJavaType;

/// A literal value appearing in a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Exact decimal, kept in its textual form.
    Decimal(String),
    String(String),
    Character(char),
    /// ISO-8601 date, time, or timestamp text.
    Temporal(String),
}

impl LiteralValue {
    /// The natural basic type of this literal, `None` for `NULL`.
    #[must_use]
    pub const fn natural_type(&self) -> Option<BasicJavaType> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(BasicJavaType::Boolean),
            Self::Integer(_) => Some(BasicJavaType::Integer),
            Self::Float(_) => Some(BasicJavaType::Double),
            Self::Decimal(_) => Some(BasicJavaType::BigDecimal),
            Self::String(_) => Some(BasicJavaType::String),
            Self::Character(_) => Some(BasicJavaType::Character),
            Self::Temporal(_) => Some(BasicJavaType::LocalDateTime),
        }
    }

    /// Numeric value, when this literal is a number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Decimal(d) => d.parse().ok(),
            _ => None,
        }
    }

    /// Whether this is the literal integer one.
    #[must_use]
    pub fn is_one(&self) -> bool {
        matches!(self, Self::Integer(1))
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(d) => f.write_str(d),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Character(c) => write!(f, "'{c}'"),
            Self::Temporal(t) => write!(f, "{{ts '{t}'}}"),
        }
    }
}
