//! Error types for the stat engine.
//!
//! Every fallible operation returns a `StatError`. Speculative calls
//! (removing an unknown modifier, sweeping with nothing expired) are
//! no-ops rather than errors.

use crate::ids::CharacterId;
use crate::stat_type::StatType;
use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[StatType]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|stat| stat.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur while creating, looking up or mutating stats.
///
/// # Examples
///
/// ```rust
/// use charstat::{CharacterId, StatError, StatType};
///
/// let err = StatError::StatNotFound {
///     character_id: CharacterId::from("hero"),
///     stat_type: StatType::Mana,
/// };
/// assert_eq!(err.to_string(), "Stat Mana not found for character hero");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatError {
    /// A record for this `(character, stat)` pair already exists.
    ///
    /// Creating a stat twice is a programmer error; the existing record
    /// is never overwritten.
    #[error("Stat {stat_type} already exists for character {character_id}")]
    DuplicateStat {
        character_id: CharacterId,
        stat_type: StatType,
    },

    /// Lookup of a stat that was never created.
    ///
    /// Use the `try_` variants when absence is expected.
    #[error("Stat {stat_type} not found for character {character_id}")]
    StatNotFound {
        character_id: CharacterId,
        stat_type: StatType,
    },

    /// A level-up to a level that is not strictly greater than the current one.
    #[error("Invalid level transition: {current} -> {requested}")]
    InvalidLevelTransition { current: u32, requested: u32 },

    /// A stat definition with an unusable base value, growth rate or threshold.
    #[error("Invalid definition for stat {stat_type}: {reason}")]
    InvalidDefinition { stat_type: StatType, reason: String },

    /// Derived-stat formulas form a dependency cycle.
    ///
    /// Contains the path of stats involved, with the first stat repeated
    /// at the end, e.g. `[Attack, Power, Attack]`.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<StatType> },

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for StatError {
    fn from(err: serde_json::Error) -> Self {
        StatError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StatError::DuplicateStat {
            character_id: CharacterId::from("hero"),
            stat_type: StatType::Health,
        };
        assert!(err.to_string().contains("Health"));
        assert!(err.to_string().contains("hero"));
    }

    #[test]
    fn test_level_transition_display() {
        let err = StatError::InvalidLevelTransition {
            current: 5,
            requested: 3,
        };
        assert_eq!(err.to_string(), "Invalid level transition: 5 -> 3");
    }

    #[test]
    fn test_cycle_error_display() {
        let err = StatError::Cycle {
            path: vec![StatType::Attack, StatType::Power, StatType::Attack],
        };
        let display = err.to_string();
        assert!(display.contains("Cycle detected"));
        assert!(display.contains("Attack -> Power -> Attack"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: StatError = json_err.into();
        assert!(matches!(err, StatError::InvalidConfig(_)));
    }
}
