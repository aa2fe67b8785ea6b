//! Temporal units and the exact conversion factors between them.
//!
//! Durations are normalized to nanoseconds and converted at the boundary, so
//! the only arithmetic needed is a rational factor between two units of the
//! same family.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqmc_error::{Result, SqmError};

/// A unit of time used by duration literals, `by unit` conversions,
/// `timestampadd` / `timestampdiff`, and `extract`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemporalUnit {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    /// The finest resolution the database offers; treated as nanoseconds.
    Native,
    DayOfWeek,
    DayOfMonth,
    DayOfYear,
    Epoch,
}

/// Group of units that convert to each other by a fixed ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitFamily {
    /// Nanosecond through week.
    Time,
    /// Month, quarter, year.
    Month,
    /// Field units only usable with `extract`.
    Field,
}

/// Exact rational conversion factor `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitRatio {
    pub numerator: u64,
    pub denominator: u64,
}

impl UnitRatio {
    /// Whether the ratio is exactly one.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        self.numerator == self.denominator
    }

    /// Apply the ratio to a magnitude.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn apply(self, magnitude: f64) -> f64 {
        magnitude * self.numerator as f64 / self.denominator as f64
    }
}

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SECOND: u64 = 1_000_000_000;
const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: u64 = 24 * NANOS_PER_HOUR;
const NANOS_PER_WEEK: u64 = 7 * NANOS_PER_DAY;

impl TemporalUnit {
    /// Units that are legal as the unit of a duration.
    pub const DURATION_UNITS: [Self; 12] = [
        Self::Year,
        Self::Quarter,
        Self::Month,
        Self::Week,
        Self::Day,
        Self::Hour,
        Self::Minute,
        Self::Second,
        Self::Millisecond,
        Self::Microsecond,
        Self::Nanosecond,
        Self::Native,
    ];

    /// The family this unit belongs to.
    #[must_use]
    pub const fn family(self) -> UnitFamily {
        match self {
            Self::Year | Self::Quarter | Self::Month => UnitFamily::Month,
            Self::Week
            | Self::Day
            | Self::Hour
            | Self::Minute
            | Self::Second
            | Self::Millisecond
            | Self::Microsecond
            | Self::Nanosecond
            | Self::Native => UnitFamily::Time,
            Self::DayOfWeek | Self::DayOfMonth | Self::DayOfYear | Self::Epoch => {
                UnitFamily::Field
            }
        }
    }

    /// Whether this unit can measure a duration.
    #[must_use]
    pub const fn is_duration_unit(self) -> bool {
        !matches!(self.family(), UnitFamily::Field)
    }

    /// Size of one unit in the family's base unit (nanoseconds or months).
    const fn base_units(self) -> u64 {
        match self {
            Self::Year => 12,
            Self::Quarter => 3,
            Self::Month => 1,
            Self::Week => NANOS_PER_WEEK,
            Self::Day => NANOS_PER_DAY,
            Self::Hour => NANOS_PER_HOUR,
            Self::Minute => NANOS_PER_MINUTE,
            Self::Second => NANOS_PER_SECOND,
            Self::Millisecond => NANOS_PER_MILLI,
            Self::Microsecond => NANOS_PER_MICRO,
            Self::Nanosecond | Self::Native => 1,
            Self::DayOfWeek | Self::DayOfMonth | Self::DayOfYear | Self::Epoch => 0,
        }
    }

    /// Nanoseconds per unit, or `None` for month-based and field units.
    #[must_use]
    pub const fn nanos_per_unit(self) -> Option<u64> {
        match self.family() {
            UnitFamily::Time => Some(self.base_units()),
            UnitFamily::Month | UnitFamily::Field => None,
        }
    }

    /// Factor converting a magnitude in `self` into a magnitude in `to`.
    ///
    /// `n self == n * factor to`. Fails with a semantic error across families.
    pub fn conversion_factor(self, to: Self) -> Result<UnitRatio> {
        if self.family() != to.family() || self.family() == UnitFamily::Field {
            return Err(SqmError::IllegalUnitConversion {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        let from_base = self.base_units();
        let to_base = to.base_units();
        let g = gcd(from_base, to_base);
        Ok(UnitRatio {
            numerator: from_base / g,
            denominator: to_base / g,
        })
    }
}

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl fmt::Display for TemporalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Year => "year",
            Self::Quarter => "quarter",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Millisecond => "millisecond",
            Self::Microsecond => "microsecond",
            Self::Nanosecond => "nanosecond",
            Self::Native => "native",
            Self::DayOfWeek => "day_of_week",
            Self::DayOfMonth => "day_of_month",
            Self::DayOfYear => "day_of_year",
            Self::Epoch => "epoch",
        })
    }
}
