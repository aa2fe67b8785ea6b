//! Context of duration arithmetic rewriting.
//!
//! Lowering `ts + (d1 + d2)` or `(d by unit)` needs to know, deep inside the
//! right operand, what the operand is being added to, what it is being scaled
//! by, and what unit the result is wanted in. That context is a
//! [`DurationScope`]: an immutable value passed down by reference, where each
//! `with_*` builder returns the modified copy for one recursive call. The
//! scope a caller holds is never changed by its callees.

use sqmc_error::{Result, SqmError};
use sqmc_sql_ast::Expression;
use sqmc_types::{
    BasicType, BinaryArithmeticOperator, TemporalUnit, TypeConfiguration, UnaryArithmeticOperator,
};

/// A pending `by unit` conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedByUnit {
    pub unit: TemporalUnit,
    /// Type of the converted value.
    pub ty: BasicType,
}

/// What a lowered duration turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationTarget<'a> {
    /// Added to this timestamp.
    Timestamp(&'a Expression),
    /// Converted to a number of units.
    ByUnit(AppliedByUnit),
    /// Left as a duration.
    Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DurationScope {
    applied_by_unit: Option<AppliedByUnit>,
    adjusted_timestamp: Option<Expression>,
    adjustment_scale: Option<Expression>,
    negative_adjustment: bool,
}

impl DurationScope {
    /// Scope with nothing pending.
    #[must_use]
    pub fn clean() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.applied_by_unit.is_none()
            && self.adjusted_timestamp.is_none()
            && self.adjustment_scale.is_none()
            && !self.negative_adjustment
    }

    #[must_use]
    pub const fn applied_by_unit(&self) -> Option<AppliedByUnit> {
        self.applied_by_unit
    }

    #[must_use]
    pub const fn adjusted_timestamp(&self) -> Option<&Expression> {
        self.adjusted_timestamp.as_ref()
    }

    #[must_use]
    pub const fn adjustment_scale(&self) -> Option<&Expression> {
        self.adjustment_scale.as_ref()
    }

    #[must_use]
    pub const fn negative_adjustment(&self) -> bool {
        self.negative_adjustment
    }

    /// Where a duration lowered under this scope goes. A timestamp
    /// adjustment and a by-unit conversion never apply together.
    pub fn target(&self) -> Result<DurationTarget<'_>> {
        match (&self.adjusted_timestamp, self.applied_by_unit) {
            (Some(_), Some(by_unit)) => Err(SqmError::internal(format!(
                "duration is both added to a timestamp and converted by {}",
                by_unit.unit
            ))),
            (Some(timestamp), None) => Ok(DurationTarget::Timestamp(timestamp)),
            (None, Some(by_unit)) => Ok(DurationTarget::ByUnit(by_unit)),
            (None, None) => Ok(DurationTarget::Duration),
        }
    }

    /// Whether a scale or sign is waiting to be distributed.
    #[must_use]
    pub const fn has_pending_scale(&self) -> bool {
        self.adjustment_scale.is_some() || self.negative_adjustment
    }

    #[must_use]
    pub fn with_by_unit(&self, unit: TemporalUnit, ty: BasicType) -> Self {
        Self {
            applied_by_unit: Some(AppliedByUnit { unit, ty }),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_adjusted_timestamp(&self, timestamp: Expression) -> Self {
        Self {
            adjusted_timestamp: Some(timestamp),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_negation_flipped(&self) -> Self {
        Self {
            negative_adjustment: !self.negative_adjustment,
            ..self.clone()
        }
    }

    /// Replace the pending scale; the pending sign is consumed by it.
    #[must_use]
    pub fn with_scale(&self, scale: Expression) -> Self {
        Self {
            adjustment_scale: Some(scale),
            negative_adjustment: false,
            ..self.clone()
        }
    }

    /// Apply the pending scale and sign to a duration magnitude.
    ///
    /// A unary minus on the magnitude is folded into the sign; a scale of
    /// literal `1` is dropped, and a magnitude of literal `1` is replaced by
    /// the scale itself.
    #[must_use]
    pub fn apply_scale(&self, magnitude: Expression, tc: &TypeConfiguration) -> Expression {
        let mut negate = self.negative_adjustment;
        let magnitude = match magnitude {
            Expression::Unary {
                operator: UnaryArithmeticOperator::UnaryMinus,
                operand,
                ..
            } => {
                negate = !negate;
                *operand
            }
            other => other,
        };

        let scaled = match &self.adjustment_scale {
            Some(scale) if !scale.is_one() => {
                if magnitude.is_one() {
                    scale.clone()
                } else {
                    let ty = match (scale.single_type(), magnitude.single_type()) {
                        (Some(l), Some(r)) => tc.widest_numeric(l, r),
                        (Some(t), None) | (None, Some(t)) => t,
                        (None, None) => BasicType::LONG,
                    };
                    Expression::BinaryArithmetic {
                        lhs: Box::new(scale.clone()),
                        operator: BinaryArithmeticOperator::Multiply,
                        rhs: Box::new(magnitude),
                        ty,
                    }
                }
            }
            _ => magnitude,
        };

        if negate {
            let ty = scaled.single_type().unwrap_or(BasicType::LONG);
            Expression::Unary {
                operator: UnaryArithmeticOperator::UnaryMinus,
                operand: Box::new(scaled),
                ty,
            }
        } else {
            scaled
        }
    }
}
