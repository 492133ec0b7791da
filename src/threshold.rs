//! Percentage threshold tracking.
//!
//! Thresholds are percentages of a stat's level-scaled base value, not
//! of its live value, so they stay put while buffs come and go.

use crate::error::StatError;
use crate::stat_type::StatType;
use serde::{Deserialize, Serialize};

/// One threshold crossed by a value change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCrossing {
    /// The configured percentage (0–100).
    pub threshold_percent: f64,
    /// The absolute value the percentage resolved to.
    pub threshold_value: f64,
    /// `true` when the value rose to or above the threshold.
    pub crossing_up: bool,
}

/// Sorted, immutable list of threshold percentages for one stat.
///
/// # Examples
///
/// ```rust
/// use charstat::{StatType, ThresholdTracker};
///
/// let tracker = ThresholdTracker::new(&StatType::Health, vec![50.0, 25.0]).unwrap();
/// assert_eq!(tracker.percentages(), &[25.0, 50.0]);
///
/// // Base 150: the 50% threshold sits at 75, the 25% one at 37.5.
/// let crossings = tracker.crossings(150.0, 100.0, 30.0);
/// assert_eq!(crossings.len(), 2);
/// assert!(crossings.iter().all(|c| !c.crossing_up));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTracker {
    percentages: Vec<f64>,
}

impl ThresholdTracker {
    /// Build a tracker, sorting and deduplicating the percentages.
    ///
    /// Fails with `InvalidDefinition` if any percentage is outside 0..=100.
    pub fn new(stat_type: &StatType, mut percentages: Vec<f64>) -> Result<Self, StatError> {
        if let Some(bad) = percentages
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 100.0)
        {
            return Err(StatError::InvalidDefinition {
                stat_type: stat_type.clone(),
                reason: format!("threshold {bad} is outside 0..=100"),
            });
        }

        percentages.sort_by(f64::total_cmp);
        percentages.dedup();
        Ok(Self { percentages })
    }

    pub fn percentages(&self) -> &[f64] {
        &self.percentages
    }

    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty()
    }

    /// Every threshold crossed between `old` and `new`, ascending.
    ///
    /// `reference` is the level-scaled base value the percentages apply to.
    pub fn crossings(&self, reference: f64, old: f64, new: f64) -> Vec<ThresholdCrossing> {
        self.percentages
            .iter()
            .filter_map(|&percent| {
                let threshold_value = reference * (percent / 100.0);
                let crossing_up = if old >= threshold_value && new < threshold_value {
                    false
                } else if old < threshold_value && new >= threshold_value {
                    true
                } else {
                    return None;
                };
                Some(ThresholdCrossing {
                    threshold_percent: percent,
                    threshold_value,
                    crossing_up,
                })
            })
            .collect()
    }
}
