//! Character identifier module.
//!
//! Provides the `CharacterId` type, a cheaply clonable string identifier
//! for the character a registry describes. Every emitted event carries
//! one, so it uses `Arc<str>` to keep clones allocation-free.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Shared string identifier for a character.
///
/// # Examples
///
/// ```rust
/// use charstat::CharacterId;
///
/// let hero = CharacterId::new("hero");
/// let hero2: CharacterId = "hero".into();
/// let hero3: CharacterId = String::from("hero").into();
///
/// assert_eq!(hero, hero2);
/// assert_eq!(hero, hero3);
/// assert_eq!(hero.as_str(), "hero");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CharacterId(Arc<str>);

impl Serialize for CharacterId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CharacterId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(CharacterId::from(s))
    }
}

impl CharacterId {
    /// Create a new `CharacterId` from a string slice.
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the string representation of this `CharacterId`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CharacterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CharacterId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
