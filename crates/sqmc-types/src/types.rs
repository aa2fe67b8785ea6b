//! Static (java-level) types, JDBC type codes, and the type configuration
//! that classifies them.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Java-level types
// ---------------------------------------------------------------------------

/// A basic (single-column) value type as seen by the domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicJavaType {
    Boolean,
    Character,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    String,
    LocalDate,
    LocalTime,
    LocalDateTime,
    Instant,
    OffsetDateTime,
    /// An elapsed time interval, persisted as a nanosecond count.
    Duration,
    /// Unknown / untyped value.
    Object,
}

impl BasicJavaType {
    /// Whether values of this type are numeric.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Short
                | Self::Integer
                | Self::Long
                | Self::BigInteger
                | Self::Float
                | Self::Double
                | Self::BigDecimal
        )
    }

    /// Simple name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Character => "Character",
            Self::Short => "Short",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::BigInteger => "BigInteger",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::BigDecimal => "BigDecimal",
            Self::String => "String",
            Self::LocalDate => "LocalDate",
            Self::LocalTime => "LocalTime",
            Self::LocalDateTime => "LocalDateTime",
            Self::Instant => "Instant",
            Self::OffsetDateTime => "OffsetDateTime",
            Self::Duration => "Duration",
            Self::Object => "Object",
        }
    }
}

/// The static type of a semantic node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaType {
    /// A single-column value.
    Basic(BasicJavaType),
    /// A reference to an entity, by entity name.
    Entity(String),
    /// A composite (embedded) value, by embeddable name.
    Embeddable(String),
}

impl JavaType {
    pub const BOOLEAN: Self = Self::Basic(BasicJavaType::Boolean);
    pub const INTEGER: Self = Self::Basic(BasicJavaType::Integer);
    pub const LONG: Self = Self::Basic(BasicJavaType::Long);
    pub const DOUBLE: Self = Self::Basic(BasicJavaType::Double);
    pub const BIG_DECIMAL: Self = Self::Basic(BasicJavaType::BigDecimal);
    pub const STRING: Self = Self::Basic(BasicJavaType::String);
    pub const LOCAL_DATE: Self = Self::Basic(BasicJavaType::LocalDate);
    pub const LOCAL_TIME: Self = Self::Basic(BasicJavaType::LocalTime);
    pub const LOCAL_DATE_TIME: Self = Self::Basic(BasicJavaType::LocalDateTime);
    pub const INSTANT: Self = Self::Basic(BasicJavaType::Instant);
    pub const DURATION: Self = Self::Basic(BasicJavaType::Duration);
    pub const OBJECT: Self = Self::Basic(BasicJavaType::Object);

    /// The basic type, if this is a single-column value type.
    #[must_use]
    pub const fn as_basic(&self) -> Option<BasicJavaType> {
        match self {
            Self::Basic(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(b) => f.write_str(b.name()),
            Self::Entity(name) => write!(f, "entity {name}"),
            Self::Embeddable(name) => write!(f, "embeddable {name}"),
        }
    }
}

/// Temporal classification of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalType {
    Date,
    Time,
    Timestamp,
}

// ---------------------------------------------------------------------------
// JDBC-level types
// ---------------------------------------------------------------------------

/// JDBC type code of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JdbcTypeCode {
    Boolean,
    Char,
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Real,
    Double,
    Varchar,
    Date,
    Time,
    Timestamp,
    TimestampWithTimezone,
    JavaObject,
}

/// The engine's canonical descriptor of a single-column value.
///
/// Pairs the domain-level type with the JDBC column type used to bind or
/// read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasicType {
    pub java_type: BasicJavaType,
    pub jdbc_type: JdbcTypeCode,
}

impl BasicType {
    /// The catch-all `Object` type.
    pub const OBJECT: Self = Self {
        java_type: BasicJavaType::Object,
        jdbc_type: JdbcTypeCode::JavaObject,
    };

    /// Canonical boolean type, used for predicates.
    pub const BOOLEAN: Self = Self {
        java_type: BasicJavaType::Boolean,
        jdbc_type: JdbcTypeCode::Boolean,
    };

    /// Canonical long type, used for unit conversions and differences.
    pub const LONG: Self = Self {
        java_type: BasicJavaType::Long,
        jdbc_type: JdbcTypeCode::BigInt,
    };

    /// Canonical integer type, used for LIMIT / OFFSET values.
    pub const INTEGER: Self = Self {
        java_type: BasicJavaType::Integer,
        jdbc_type: JdbcTypeCode::Integer,
    };
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.java_type.name(), self.jdbc_type)
    }
}

/// The JDBC column types that a value decomposes into.
///
/// Nearly every expression maps to exactly one column; composite (embedded)
/// values map to several.
pub type JdbcMappings = SmallVec<[BasicType; 1]>;

// ---------------------------------------------------------------------------
// Type configuration
// ---------------------------------------------------------------------------

/// Answers classification questions about static types.
///
/// Read-only after construction; one instance may be shared by any number of
/// compilations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeConfiguration {
    /// Map `OffsetDateTime` / `Instant` to `TIMESTAMP WITH TIME ZONE`.
    pub timezone_aware_timestamps: bool,
}

impl TypeConfiguration {
    /// Create a configuration with default preferences.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timezone_aware_timestamps: false,
        }
    }

    /// The temporal type of a static type, or `None` if it is not temporal.
    #[must_use]
    pub fn temporal_type(&self, ty: &JavaType) -> Option<TemporalType> {
        match ty.as_basic()? {
            BasicJavaType::LocalDate => Some(TemporalType::Date),
            BasicJavaType::LocalTime => Some(TemporalType::Time),
            BasicJavaType::LocalDateTime
            | BasicJavaType::Instant
            | BasicJavaType::OffsetDateTime => Some(TemporalType::Timestamp),
            _ => None,
        }
    }

    /// Whether the type is a date, time, or timestamp.
    #[must_use]
    pub fn is_temporal(&self, ty: &JavaType) -> bool {
        self.temporal_type(ty).is_some()
    }

    /// Whether the type is a full timestamp (as opposed to date-only).
    #[must_use]
    pub fn is_timestamp(&self, ty: &JavaType) -> bool {
        self.temporal_type(ty) == Some(TemporalType::Timestamp)
    }

    /// Whether the type is the `Duration` value type.
    #[must_use]
    pub fn is_duration(&self, ty: &JavaType) -> bool {
        ty.as_basic() == Some(BasicJavaType::Duration)
    }

    /// The canonical basic type descriptor for a basic java type.
    #[must_use]
    pub const fn basic_type(&self, java_type: BasicJavaType) -> BasicType {
        let jdbc_type = match java_type {
            BasicJavaType::Boolean => JdbcTypeCode::Boolean,
            BasicJavaType::Character => JdbcTypeCode::Char,
            BasicJavaType::Short => JdbcTypeCode::SmallInt,
            BasicJavaType::Integer => JdbcTypeCode::Integer,
            BasicJavaType::Long | BasicJavaType::Duration => JdbcTypeCode::BigInt,
            BasicJavaType::BigInteger | BasicJavaType::BigDecimal => JdbcTypeCode::Numeric,
            BasicJavaType::Float => JdbcTypeCode::Real,
            BasicJavaType::Double => JdbcTypeCode::Double,
            BasicJavaType::String => JdbcTypeCode::Varchar,
            BasicJavaType::LocalDate => JdbcTypeCode::Date,
            BasicJavaType::LocalTime => JdbcTypeCode::Time,
            BasicJavaType::LocalDateTime => JdbcTypeCode::Timestamp,
            BasicJavaType::Instant | BasicJavaType::OffsetDateTime => {
                if self.timezone_aware_timestamps {
                    JdbcTypeCode::TimestampWithTimezone
                } else {
                    JdbcTypeCode::Timestamp
                }
            }
            BasicJavaType::Object => JdbcTypeCode::JavaObject,
        };
        BasicType {
            java_type,
            jdbc_type,
        }
    }

    /// The canonical basic type for a static type, `Object` for composites.
    #[must_use]
    pub fn basic_type_for(&self, ty: &JavaType) -> BasicType {
        ty.as_basic()
            .map_or(BasicType::OBJECT, |b| self.basic_type(b))
    }

    /// The wider of two numeric types: fixed-point beats double beats float;
    /// otherwise the left-hand type wins.
    #[must_use]
    pub fn widest_numeric(&self, lhs: BasicType, rhs: BasicType) -> BasicType {
        for wanted in [JdbcTypeCode::Numeric, JdbcTypeCode::Double, JdbcTypeCode::Real] {
            if lhs.jdbc_type == wanted {
                return lhs;
            }
            if rhs.jdbc_type == wanted {
                return rhs;
            }
        }
        lhs
    }
}
