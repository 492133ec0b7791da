//! Stat breakdown module.
//!
//! Contains the `StatBreakdown` type, every intermediate term of a
//! stat's value for tooltips and debugging.

use crate::stat_type::StatType;
use serde::{Deserialize, Serialize};

/// A stat value with the terms that produced it.
///
/// Read-only and serializable, so it can be shipped to a UI or logged
/// as-is.
///
/// # Examples
///
/// ```rust
/// use charstat::{StatBreakdown, StatType};
///
/// let breakdown = StatBreakdown {
///     stat_type: StatType::Attack,
///     level: 5,
///     scaled_base: 240.0,
///     growth: 0.0,
///     flat: 10.0,
///     derived: 0.0,
///     percentage: 0.20,
///     ascension: 0.0,
///     value: 300.0,
/// };
/// assert_eq!(breakdown.pre_multiplier(), 250.0);
/// assert!((breakdown.multiplier() - 1.20).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBreakdown {
    pub stat_type: StatType,
    pub level: u32,
    /// Base value after level scaling.
    pub scaled_base: f64,
    /// Sum of active growth modifiers.
    pub growth: f64,
    /// Sum of active flat modifiers.
    pub flat: f64,
    /// Contribution from the stats this one is derived from.
    pub derived: f64,
    /// Sum of active percentage modifiers.
    pub percentage: f64,
    pub ascension: f64,
    /// Final value, clamped at zero.
    pub value: f64,
}

impl StatBreakdown {
    /// The value before the percentage/ascension multiplier.
    pub fn pre_multiplier(&self) -> f64 {
        self.scaled_base * (1.0 + self.growth) + self.flat + self.derived
    }

    /// The combined percentage and ascension multiplier.
    pub fn multiplier(&self) -> f64 {
        1.0 + self.percentage + self.ascension
    }

    /// Whether the zero clamp changed the result.
    pub fn is_clamped(&self) -> bool {
        self.pre_multiplier() * self.multiplier() < 0.0
    }
}
