//! Stat type module.
//!
//! `StatType` names a character attribute. The common attributes are
//! enum variants so they can be matched on (the derived-stat table does
//! this); anything else is a `Custom` name.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// A named numeric character attribute.
///
/// Serializes as its name. Parsing a name that matches a standard
/// variant yields that variant; any other name becomes `Custom`.
///
/// # Examples
///
/// ```rust
/// use charstat::StatType;
///
/// assert_eq!(StatType::from_name("Health"), StatType::Health);
/// assert_eq!(StatType::from_name("Luck").as_str(), "Luck");
/// assert!(StatType::from_name("Luck").is_custom());
///
/// let mana: StatType = "Mana".into();
/// assert_eq!(mana, StatType::Mana);
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatType {
    Health,
    Mana,
    Attack,
    Defense,
    Speed,
    Strength,
    Agility,
    Intelligence,
    Stamina,
    CritChance,
    /// Overall combat rating consumed by difficulty and reward calculators.
    Power,
    Custom(Arc<str>),
}

impl StatType {
    /// All non-custom stat types, in declaration order.
    pub const STANDARD: [StatType; 11] = [
        StatType::Health,
        StatType::Mana,
        StatType::Attack,
        StatType::Defense,
        StatType::Speed,
        StatType::Strength,
        StatType::Agility,
        StatType::Intelligence,
        StatType::Stamina,
        StatType::CritChance,
        StatType::Power,
    ];

    /// Resolve a name to a stat type.
    pub fn from_name(name: &str) -> Self {
        Self::STANDARD
            .iter()
            .find(|stat| stat.as_str() == name)
            .cloned()
            .unwrap_or_else(|| StatType::Custom(Arc::from(name)))
    }

    /// Create a custom stat type without checking the standard names.
    pub fn custom(name: &str) -> Self {
        StatType::Custom(Arc::from(name))
    }

    /// Get the name of this stat type.
    pub fn as_str(&self) -> &str {
        match self {
            StatType::Health => "Health",
            StatType::Mana => "Mana",
            StatType::Attack => "Attack",
            StatType::Defense => "Defense",
            StatType::Speed => "Speed",
            StatType::Strength => "Strength",
            StatType::Agility => "Agility",
            StatType::Intelligence => "Intelligence",
            StatType::Stamina => "Stamina",
            StatType::CritChance => "CritChance",
            StatType::Power => "Power",
            StatType::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, StatType::Custom(_))
    }
}

impl Serialize for StatType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(StatType::from_name(&s))
    }
}

impl From<&str> for StatType {
    fn from(s: &str) -> Self {
        Self::from_name(s)
    }
}

impl From<String> for StatType {
    fn from(s: String) -> Self {
        Self::from_name(&s)
    }
}

impl std::fmt::Display for StatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_names_round_trip() {
        for stat in StatType::STANDARD.iter() {
            assert_eq!(&StatType::from_name(stat.as_str()), stat);
            assert!(!stat.is_custom());
        }
    }

    #[test]
    fn test_custom_stat() {
        let luck = StatType::from_name("Luck");
        assert_eq!(luck, StatType::custom("Luck"));
        assert_eq!(luck.to_string(), "Luck");
    }

    #[test]
    fn test_serde_uses_name() {
        let json = serde_json::to_string(&StatType::CritChance).unwrap();
        assert_eq!(json, "\"CritChance\"");

        let parsed: StatType = serde_json::from_str("\"Stamina\"").unwrap();
        assert_eq!(parsed, StatType::Stamina);

        let custom: StatType = serde_json::from_str("\"Luck\"").unwrap();
        assert!(custom.is_custom());
    }
}
