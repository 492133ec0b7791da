//! Modifiers module.
//!
//! A `Modifier` is an immutable buff or debuff on a single stat. It is
//! never changed after construction: re-applying "the same" buff means
//! building a new modifier with the same id, which replaces the old one
//! in its `ModifierSet`.

use serde::{Deserialize, Serialize};

/// Engine time in seconds.
///
/// The engine has no timer of its own; time only advances when the
/// owning registry is ticked.
///
/// # Examples
///
/// ```rust
/// use charstat::Timestamp;
///
/// let t = Timestamp::from_secs(12.5);
/// assert_eq!(t.as_secs(), 12.5);
/// assert!(Timestamp::from_secs(13.0) > t);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0.0);

    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// The timestamp `secs` seconds after this one.
    pub fn after(self, secs: f64) -> Self {
        Self(self.0 + secs)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// How a modifier's value enters the stat formula.
///
/// The stages are applied in this order:
///
/// ```text
/// ((scaled_base × (1 + Σgrowth)) + Σflat) × (1 + Σpercentage + ascension)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Added after growth, before the percentage multiplier.
    Flat,
    /// Summed with other percentages and the ascension bonus, then multiplied.
    Percentage,
    /// Scales the level-scaled base before any flat bonus.
    Growth,
}

/// A single buff or debuff on one stat.
///
/// # Examples
///
/// ```rust
/// use charstat::{Modifier, ModifierKind, Timestamp};
///
/// let potion = Modifier::flat("potion", "Minor Potion", 25.0);
/// assert_eq!(potion.kind(), ModifierKind::Flat);
/// assert!(potion.is_permanent());
///
/// let rage = Modifier::percentage("rage", "Berserker Rage", 0.30)
///     .expires_at(Timestamp::from_secs(10.0));
/// assert!(!rage.is_expired(Timestamp::from_secs(10.0)));
/// assert!(rage.is_expired(Timestamp::from_secs(10.5)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    id: String,
    source: String,
    kind: ModifierKind,
    value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<Timestamp>,
}

impl Modifier {
    /// Create a permanent modifier.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        kind: ModifierKind,
        value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind,
            value,
            expiry: None,
        }
    }

    /// Create a permanent flat modifier.
    pub fn flat(id: impl Into<String>, source: impl Into<String>, value: f64) -> Self {
        Self::new(id, source, ModifierKind::Flat, value)
    }

    /// Create a permanent percentage modifier (`0.20` = +20%).
    pub fn percentage(id: impl Into<String>, source: impl Into<String>, value: f64) -> Self {
        Self::new(id, source, ModifierKind::Percentage, value)
    }

    /// Create a permanent growth modifier (`0.10` = +10% of the scaled base).
    pub fn growth(id: impl Into<String>, source: impl Into<String>, value: f64) -> Self {
        Self::new(id, source, ModifierKind::Growth, value)
    }

    /// Return this modifier with an absolute expiry time.
    pub fn expires_at(self, expiry: Timestamp) -> Self {
        Self {
            expiry: Some(expiry),
            ..self
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> ModifierKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn expiry(&self) -> Option<Timestamp> {
        self.expiry
    }

    pub fn is_permanent(&self) -> bool {
        self.expiry.is_none()
    }

    /// A modifier is expired strictly after its expiry time.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry.is_some_and(|expiry| now > expiry)
    }
}
