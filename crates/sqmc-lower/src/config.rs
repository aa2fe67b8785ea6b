//! Converter configuration.

use serde::{Deserialize, Serialize};
use sqmc_error::{Result, SqmError};
use sqmc_types::{LockMode, TemporalUnit};

/// Where an explicit `ON` predicate of an attribute join ends up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinPredicatePlacement {
    /// Added as a restriction on the enclosing query spec's WHERE clause.
    ///
    /// Equivalent to `JoinOn` for inner joins only.
    #[default]
    QueryRestriction,
    /// Conjoined with the join's own predicate.
    JoinOn,
}

/// Tunables of one lowering session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Lock mode given to every created table group.
    pub default_lock_mode: LockMode,
    pub join_predicate_placement: JoinPredicatePlacement,
    /// Unit in which `Duration` attributes are stored in their column.
    pub duration_storage_unit: TemporalUnit,
    /// Expand a multi-valued parameter into one placeholder per bound value.
    pub expand_multi_valued_parameters: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            default_lock_mode: LockMode::None,
            join_predicate_placement: JoinPredicatePlacement::QueryRestriction,
            duration_storage_unit: TemporalUnit::Nanosecond,
            expand_multi_valued_parameters: true,
        }
    }
}

impl ConverterConfig {
    /// Parse a configuration from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SqmError::internal(format!("invalid converter config: {e}")))?;
        if !config.duration_storage_unit.is_duration_unit() {
            return Err(SqmError::internal(format!(
                "duration storage unit must be a duration unit, got {}",
                config.duration_storage_unit
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConverterConfig::default();
        assert_eq!(config.default_lock_mode, LockMode::None);
        assert_eq!(
            config.join_predicate_placement,
            JoinPredicatePlacement::QueryRestriction
        );
        assert_eq!(config.duration_storage_unit, TemporalUnit::Nanosecond);
        assert!(config.expand_multi_valued_parameters);
    }

    #[test]
    fn from_json_partial() {
        let config = ConverterConfig::from_json(
            r#"{"join_predicate_placement": "JOIN_ON", "duration_storage_unit": "SECOND"}"#,
        )
        .unwrap();
        assert_eq!(config.join_predicate_placement, JoinPredicatePlacement::JoinOn);
        assert_eq!(config.duration_storage_unit, TemporalUnit::Second);
        assert!(config.expand_multi_valued_parameters);
    }

    #[test]
    fn from_json_rejects_field_unit() {
        let err = ConverterConfig::from_json(r#"{"duration_storage_unit": "DAY_OF_WEEK"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duration storage unit"));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(ConverterConfig::from_json("{not json").is_err());
    }
}
