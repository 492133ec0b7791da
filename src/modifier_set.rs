//! Per-stat modifier collection.
//!
//! Modifiers are keyed by id, so re-applying a named buff replaces the
//! previous instance instead of stacking. Expired modifiers are ignored
//! by `summarize` but stay stored until `sweep_expired` removes them.

use crate::modifier::{Modifier, ModifierKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-kind sums of the active modifiers on a stat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierTotals {
    pub flat: f64,
    pub percentage: f64,
    pub growth: f64,
}

/// The modifiers currently attached to one stat.
///
/// # Examples
///
/// ```rust
/// use charstat::{Modifier, ModifierSet, Timestamp};
///
/// let mut set = ModifierSet::new();
/// set.insert(Modifier::flat("sword", "Iron Sword", 10.0));
/// set.insert(Modifier::flat("ring", "Ring", 5.0));
/// set.insert(Modifier::percentage("aura", "Aura", 0.25));
///
/// let totals = set.summarize(Timestamp::ZERO);
/// assert_eq!(totals.flat, 15.0);
/// assert_eq!(totals.percentage, 0.25);
/// assert_eq!(totals.growth, 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModifierSet {
    modifiers: BTreeMap<String, Modifier>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a modifier, replacing any modifier with the same id.
    ///
    /// Returns the replaced modifier, if any.
    pub fn insert(&mut self, modifier: Modifier) -> Option<Modifier> {
        self.modifiers.insert(modifier.id().to_owned(), modifier)
    }

    /// Remove a modifier by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Modifier> {
        self.modifiers.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Modifier> {
        self.modifiers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modifiers.contains_key(id)
    }

    /// Number of stored modifiers, expired or not.
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Every stored modifier in id order, including expired ones.
    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.values()
    }

    /// Modifiers that are not expired at `now`, in id order.
    pub fn active(&self, now: Timestamp) -> impl Iterator<Item = &Modifier> {
        self.modifiers.values().filter(move |m| !m.is_expired(now))
    }

    /// Remove every modifier expired at `now` and return them in id order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::{Modifier, ModifierSet, Timestamp};
    ///
    /// let mut set = ModifierSet::new();
    /// set.insert(Modifier::flat("shout", "Shout", 5.0).expires_at(Timestamp::from_secs(2.0)));
    /// set.insert(Modifier::flat("ring", "Ring", 3.0));
    ///
    /// assert!(set.sweep_expired(Timestamp::from_secs(1.0)).is_empty());
    ///
    /// let expired = set.sweep_expired(Timestamp::from_secs(2.5));
    /// assert_eq!(expired.len(), 1);
    /// assert_eq!(expired[0].id(), "shout");
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn sweep_expired(&mut self, now: Timestamp) -> Vec<Modifier> {
        let expired_ids: Vec<String> = self
            .modifiers
            .values()
            .filter(|m| m.is_expired(now))
            .map(|m| m.id().to_owned())
            .collect();

        expired_ids
            .iter()
            .filter_map(|id| self.modifiers.remove(id))
            .collect()
    }

    /// Sum the active modifiers per kind.
    pub fn summarize(&self, now: Timestamp) -> ModifierTotals {
        self.active(now)
            .fold(ModifierTotals::default(), |mut totals, m| {
                match m.kind() {
                    ModifierKind::Flat => totals.flat += m.value(),
                    ModifierKind::Percentage => totals.percentage += m.value(),
                    ModifierKind::Growth => totals.growth += m.value(),
                }
                totals
            })
    }
}
