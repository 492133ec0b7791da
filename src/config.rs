//! Engine configuration and stat definitions.
//!
//! Both types deserialize from JSON with every field optional, falling
//! back to the defaults below.

use crate::error::StatError;
use crate::stat_type::StatType;
use serde::{Deserialize, Serialize};

/// Default absolute difference below which a recomputed value is not
/// reported as a change.
pub const DEFAULT_CHANGE_EPSILON: f64 = 0.01;

/// Default number of observer reaction rounds processed per mutation.
pub const DEFAULT_MAX_REACTION_DEPTH: usize = 16;

/// Registry-wide tuning.
///
/// # Examples
///
/// ```rust
/// use charstat::RegistryConfig;
///
/// let config = RegistryConfig::from_json_str(r#"{ "change_epsilon": 0.5 }"#).unwrap();
/// assert_eq!(config.change_epsilon, 0.5);
/// assert_eq!(config.max_reaction_depth, 16);
/// assert!(config.standard_derived_stats);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Value changes at or below this are cached silently.
    pub change_epsilon: f64,
    /// Reaction rounds beyond this are dropped.
    pub max_reaction_depth: usize,
    /// Whether the built-in derived-stat table is active.
    pub standard_derived_stats: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            change_epsilon: DEFAULT_CHANGE_EPSILON,
            max_reaction_depth: DEFAULT_MAX_REACTION_DEPTH,
            standard_derived_stats: true,
        }
    }
}

impl RegistryConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, StatError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail with `InvalidConfig` unless `change_epsilon` is a finite,
    /// non-negative number.
    pub fn validate(&self) -> Result<(), StatError> {
        if !self.change_epsilon.is_finite() || self.change_epsilon < 0.0 {
            return Err(StatError::InvalidConfig(format!(
                "change_epsilon must be a non-negative number, got {}",
                self.change_epsilon
            )));
        }
        Ok(())
    }
}

/// How to create one stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatDefinition {
    pub stat_type: StatType,
    pub base_value: f64,
    #[serde(default)]
    pub growth_rate: f64,
    #[serde(default)]
    pub thresholds: Vec<f64>,
}

impl StatDefinition {
    pub fn new(stat_type: StatType, base_value: f64, growth_rate: f64) -> Self {
        Self {
            stat_type,
            base_value,
            growth_rate,
            thresholds: Vec::new(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// A set of stats to create together.
///
/// The default is the standard starter set used by
/// `StatRegistry::initialize_defaults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSetConfig {
    pub stats: Vec<StatDefinition>,
}

impl Default for StatSetConfig {
    fn default() -> Self {
        Self {
            stats: vec![
                StatDefinition::new(StatType::Health, 100.0, 0.10)
                    .with_thresholds(vec![25.0, 50.0]),
                StatDefinition::new(StatType::Mana, 50.0, 0.08).with_thresholds(vec![25.0]),
                StatDefinition::new(StatType::Attack, 10.0, 0.15),
                StatDefinition::new(StatType::Defense, 5.0, 0.12),
                StatDefinition::new(StatType::Speed, 1.0, 0.02),
            ],
        }
    }
}

impl StatSetConfig {
    /// Parse a stat set from JSON.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::{StatSetConfig, StatType};
    ///
    /// let json = r#"{
    ///     "stats": [
    ///         { "stat_type": "Health", "base_value": 150.0, "growth_rate": 0.15, "thresholds": [50.0] },
    ///         { "stat_type": "Luck", "base_value": 3.0 }
    ///     ]
    /// }"#;
    /// let set = StatSetConfig::from_json_str(json).unwrap();
    /// assert_eq!(set.stats[0].stat_type, StatType::Health);
    /// assert_eq!(set.stats[1].growth_rate, 0.0);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, StatError> {
        Ok(serde_json::from_str(json)?)
    }
}
