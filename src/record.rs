//! The value container for one `(character, stat)` pair.
//!
//! A `StatRecord` combines the level-scaled base value, its modifiers,
//! the ascension slot and the derived-stat slot into one cached value:
//!
//! ```text
//! scaled    = base × (1 + growth_rate × (level - 1))     (never below the level-up floor)
//! value     = ((scaled × (1 + Σgrowth)) + Σflat + derived) × (1 + Σpercentage + ascension)
//! value     = max(0, value)
//! ```
//!
//! Mutations mark the cache dirty and recompute immediately, so the
//! change and threshold notifications of a mutation are produced in the
//! same step as the mutation itself. Notifications are appended to a
//! caller-provided buffer; the registry delivers them once the record
//! is back in a consistent state.

use crate::breakdown::StatBreakdown;
use crate::config::DEFAULT_CHANGE_EPSILON;
use crate::error::StatError;
use crate::events::StatEvent;
use crate::ids::CharacterId;
use crate::modifier::{Modifier, Timestamp};
use crate::modifier_set::ModifierSet;
use crate::stat_type::StatType;
use crate::threshold::ThresholdTracker;
use tracing::{debug, trace};

/// One stat of one character.
///
/// # Examples
///
/// ```rust
/// use charstat::{CharacterId, Modifier, StatRecord, StatType};
///
/// let mut events = Vec::new();
/// let mut attack = StatRecord::new(CharacterId::new("hero"), StatType::Attack, 150.0, 0.15, vec![])
///     .unwrap();
///
/// attack.level_up(5, &mut events).unwrap();
/// assert!((attack.current_value(&mut events) - 240.0).abs() < 1e-9);
///
/// attack.add_modifier(Modifier::flat("sword", "Iron Sword", 10.0), &mut events);
/// attack.add_modifier(Modifier::percentage("rage", "Rage", 0.20), &mut events);
/// assert!((attack.current_value(&mut events) - 300.0).abs() < 1e-9);
///
/// attack.remove_modifier("sword", &mut events);
/// assert!((attack.current_value(&mut events) - 288.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct StatRecord {
    character_id: CharacterId,
    stat_type: StatType,
    base_value: f64,
    growth_rate: f64,
    level: u32,
    scaled_base: f64,
    ascension_bonus: f64,
    derived_bonus: f64,
    modifiers: ModifierSet,
    thresholds: ThresholdTracker,
    cached_value: f64,
    last_value: f64,
    is_dirty: bool,
    now: Timestamp,
    epsilon: f64,
}

impl StatRecord {
    /// Create a level 1 record.
    ///
    /// Fails with `InvalidDefinition` if the base value or growth rate is
    /// negative or not finite, or a threshold is outside 0..=100.
    pub fn new(
        character_id: CharacterId,
        stat_type: StatType,
        base_value: f64,
        growth_rate: f64,
        thresholds: Vec<f64>,
    ) -> Result<Self, StatError> {
        Self::at_level(character_id, stat_type, base_value, growth_rate, thresholds, 1)
    }

    /// Create a record that starts at `level` (a stat added mid-game).
    pub fn at_level(
        character_id: CharacterId,
        stat_type: StatType,
        base_value: f64,
        growth_rate: f64,
        thresholds: Vec<f64>,
        level: u32,
    ) -> Result<Self, StatError> {
        if !base_value.is_finite() || base_value < 0.0 {
            return Err(StatError::InvalidDefinition {
                stat_type,
                reason: format!("base value {base_value} must be a non-negative number"),
            });
        }
        if !growth_rate.is_finite() || growth_rate < 0.0 {
            return Err(StatError::InvalidDefinition {
                stat_type,
                reason: format!("growth rate {growth_rate} must be a non-negative number"),
            });
        }
        let thresholds = ThresholdTracker::new(&stat_type, thresholds)?;
        let level = level.max(1);

        let mut record = Self {
            character_id,
            stat_type,
            base_value,
            growth_rate,
            level,
            scaled_base: scaled_base_at(base_value, growth_rate, level),
            ascension_bonus: 0.0,
            derived_bonus: 0.0,
            modifiers: ModifierSet::new(),
            thresholds,
            cached_value: 0.0,
            last_value: 0.0,
            is_dirty: false,
            now: Timestamp::ZERO,
            epsilon: DEFAULT_CHANGE_EPSILON,
        };
        record.reset_silently();
        Ok(record)
    }

    /// Use a different change epsilon.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Start with a derived bonus already in place, without notifications.
    pub fn with_derived_bonus(mut self, bonus: f64) -> Self {
        self.derived_bonus = bonus;
        self.reset_silently();
        self
    }

    /// Start with the engine clock at `now`.
    pub fn with_time(mut self, now: Timestamp) -> Self {
        self.now = now;
        self.reset_silently();
        self
    }

    /// The character this stat belongs to.
    pub fn character_id(&self) -> &CharacterId {
        &self.character_id
    }

    /// Which stat this record holds.
    pub fn stat_type(&self) -> &StatType {
        &self.stat_type
    }

    /// The level 1 base value, before scaling.
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Fraction of the base value gained per level.
    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Current level, starting at 1.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// The level-scaled base value thresholds are measured against.
    pub fn scaled_base(&self) -> f64 {
        self.scaled_base
    }

    /// The ascension slot (`0.10` = +10%).
    pub fn ascension_bonus(&self) -> f64 {
        self.ascension_bonus
    }

    /// Flat contribution from the stats this one is derived from.
    pub fn derived_bonus(&self) -> f64 {
        self.derived_bonus
    }

    /// Every attached modifier, including expired ones not yet swept.
    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    /// Threshold percentages, ascending.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::{CharacterId, StatRecord, StatType};
    ///
    /// let health = StatRecord::new(CharacterId::new("hero"), StatType::Health, 100.0, 0.1, vec![50.0, 25.0, 50.0])
    ///     .unwrap();
    /// assert_eq!(health.thresholds(), &[25.0, 50.0]);
    /// ```
    pub fn thresholds(&self) -> &[f64] {
        self.thresholds.percentages()
    }

    /// Whether an input changed since the last recomputation.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// The value as of the last recomputation.
    pub fn cached_value(&self) -> f64 {
        self.cached_value
    }

    /// The value last reported in a `StatChanged` notification.
    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    /// Engine time this record was last ticked to.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Compute the value from the current inputs without touching the cache.
    pub fn compute_value(&self) -> f64 {
        self.breakdown().value
    }

    /// Every intermediate term of the current computation.
    pub fn breakdown(&self) -> StatBreakdown {
        let totals = self.modifiers.summarize(self.now);
        let with_growth = self.scaled_base * (1.0 + totals.growth);
        let with_flat = with_growth + totals.flat + self.derived_bonus;
        let value = (with_flat * (1.0 + totals.percentage + self.ascension_bonus)).max(0.0);

        StatBreakdown {
            stat_type: self.stat_type.clone(),
            level: self.level,
            scaled_base: self.scaled_base,
            growth: totals.growth,
            flat: totals.flat,
            derived: self.derived_bonus,
            percentage: totals.percentage,
            ascension: self.ascension_bonus,
            value,
        }
    }

    /// The authoritative current value.
    ///
    /// A clean record returns its cache. A dirty one recomputes; if the
    /// result differs from the last reported value by more than the
    /// epsilon, a `StatChanged` event followed by one `ThresholdCrossed`
    /// event per crossed threshold is appended to `events`.
    pub fn current_value(&mut self, events: &mut Vec<StatEvent>) -> f64 {
        if !self.is_dirty {
            return self.cached_value;
        }

        let value = self.compute_value();
        let old = self.last_value;
        trace!(stat = %self.stat_type, old, value, "recomputed stat");

        if (value - old).abs() > self.epsilon {
            let crossings = self.thresholds.crossings(self.scaled_base, old, value);
            events.push(StatEvent::StatChanged {
                character_id: self.character_id.clone(),
                stat_type: self.stat_type.clone(),
                old_value: old,
                new_value: value,
            });
            events.extend(crossings.into_iter().map(|c| StatEvent::ThresholdCrossed {
                character_id: self.character_id.clone(),
                stat_type: self.stat_type.clone(),
                threshold_percent: c.threshold_percent,
                new_value: value,
                crossing_up: c.crossing_up,
            }));
            self.last_value = value;
        }

        self.cached_value = value;
        self.is_dirty = false;
        value
    }

    /// Insert or replace a modifier, then recompute.
    pub fn add_modifier(&mut self, modifier: Modifier, events: &mut Vec<StatEvent>) {
        self.stage_modifier(modifier, events);
        self.current_value(events);
    }

    /// Remove a modifier by id, then recompute.
    ///
    /// Unknown ids are a no-op and return `None`.
    pub fn remove_modifier(&mut self, id: &str, events: &mut Vec<StatEvent>) -> Option<Modifier> {
        let removed = self.stage_removal(id, events);
        self.current_value(events);
        removed
    }

    /// Advance the clock, drop expired modifiers and recompute.
    ///
    /// Returns how many modifiers expired.
    pub fn tick(&mut self, now: Timestamp, events: &mut Vec<StatEvent>) -> usize {
        let count = self.stage_tick(now, events);
        self.current_value(events);
        count
    }

    /// Raise the level, applying the level-up floor, then recompute.
    ///
    /// The scaled base never grows by less than
    /// `base × growth_rate × levels_gained`, even after rounding.
    pub fn level_up(&mut self, new_level: u32, events: &mut Vec<StatEvent>) -> Result<(), StatError> {
        self.stage_level_up(new_level)?;
        self.current_value(events);
        Ok(())
    }

    /// Fail with `InvalidLevelTransition` unless `new_level` is above the current level.
    pub fn check_level_up(&self, new_level: u32) -> Result<(), StatError> {
        if new_level <= self.level {
            return Err(StatError::InvalidLevelTransition {
                current: self.level,
                requested: new_level,
            });
        }
        Ok(())
    }

    /// Replace the ascension slot (never accumulates), then recompute.
    pub fn update_ascension_bonus(&mut self, bonus: f64, events: &mut Vec<StatEvent>) {
        self.stage_ascension_bonus(bonus);
        self.current_value(events);
    }

    /// Replace the derived-stat slot, then recompute.
    pub fn set_derived_bonus(&mut self, bonus: f64, events: &mut Vec<StatEvent>) {
        self.stage_derived_bonus(bonus);
        self.current_value(events);
    }

    // The `stage_*` methods change inputs and mark the record dirty but
    // leave recomputation to the caller. The registry uses them to apply
    // a multi-stat change completely before any value is reported.

    pub(crate) fn stage_modifier(&mut self, modifier: Modifier, events: &mut Vec<StatEvent>) {
        debug!(
            stat = %self.stat_type,
            id = modifier.id(),
            kind = ?modifier.kind(),
            value = modifier.value(),
            "modifier applied"
        );
        self.modifiers.insert(modifier.clone());
        events.push(StatEvent::ModifierApplied {
            character_id: self.character_id.clone(),
            stat_type: self.stat_type.clone(),
            modifier,
        });
        self.is_dirty = true;
    }

    pub(crate) fn stage_removal(&mut self, id: &str, events: &mut Vec<StatEvent>) -> Option<Modifier> {
        let removed = self.modifiers.remove(id)?;
        debug!(stat = %self.stat_type, id, "modifier removed");
        events.push(StatEvent::ModifierRemoved {
            character_id: self.character_id.clone(),
            stat_type: self.stat_type.clone(),
            modifier: removed.clone(),
        });
        self.is_dirty = true;
        Some(removed)
    }

    pub(crate) fn stage_tick(&mut self, now: Timestamp, events: &mut Vec<StatEvent>) -> usize {
        self.now = now;
        let expired = self.modifiers.sweep_expired(now);
        let count = expired.len();

        for modifier in expired {
            debug!(stat = %self.stat_type, id = modifier.id(), %now, "modifier expired");
            events.push(StatEvent::ModifierExpired {
                character_id: self.character_id.clone(),
                stat_type: self.stat_type.clone(),
                modifier,
            });
        }

        if count > 0 {
            self.is_dirty = true;
        }
        count
    }

    pub(crate) fn stage_level_up(&mut self, new_level: u32) -> Result<(), StatError> {
        self.check_level_up(new_level)?;

        let level_delta = f64::from(new_level - self.level);
        let floor = self.scaled_base + self.base_value * self.growth_rate * level_delta;
        self.scaled_base = scaled_base_at(self.base_value, self.growth_rate, new_level).max(floor);
        self.level = new_level;
        self.is_dirty = true;
        Ok(())
    }

    pub(crate) fn stage_ascension_bonus(&mut self, bonus: f64) {
        self.ascension_bonus = bonus;
        self.is_dirty = true;
    }

    pub(crate) fn stage_derived_bonus(&mut self, bonus: f64) {
        if bonus != self.derived_bonus {
            self.derived_bonus = bonus;
            self.is_dirty = true;
        }
    }

    /// Recompute and accept the result as the baseline, with no events.
    fn reset_silently(&mut self) {
        let value = self.compute_value();
        self.cached_value = value;
        self.last_value = value;
        self.is_dirty = false;
    }
}

fn scaled_base_at(base_value: f64, growth_rate: f64, level: u32) -> f64 {
    base_value * (1.0 + growth_rate * f64::from(level.saturating_sub(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(base: f64, growth: f64, thresholds: Vec<f64>) -> StatRecord {
        StatRecord::new(
            CharacterId::new("hero"),
            StatType::Health,
            base,
            growth,
            thresholds,
        )
        .unwrap()
    }

    #[test]
    fn test_new_record_is_clean() {
        let r = record(150.0, 0.15, vec![50.0]);
        assert!(!r.is_dirty());
        assert_eq!(r.cached_value(), 150.0);
        assert_eq!(r.last_value(), 150.0);
        assert_eq!(r.level(), 1);
    }

    #[test]
    fn test_invalid_definitions() {
        let id = CharacterId::new("hero");
        assert!(StatRecord::new(id.clone(), StatType::Health, -1.0, 0.1, vec![]).is_err());
        assert!(StatRecord::new(id.clone(), StatType::Health, 10.0, f64::NAN, vec![]).is_err());
        assert!(StatRecord::new(id, StatType::Health, 10.0, 0.1, vec![101.0]).is_err());
    }

    #[test]
    fn test_clean_read_emits_nothing() {
        let mut r = record(100.0, 0.0, vec![]);
        let mut events = Vec::new();
        assert_eq!(r.current_value(&mut events), 100.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_level_up_scales_base() {
        let mut r = record(150.0, 0.15, vec![]);
        let mut events = Vec::new();
        r.level_up(5, &mut events).unwrap();
        assert!((r.scaled_base() - 240.0).abs() < 1e-9);
        assert!(matches!(
            events.as_slice(),
            [StatEvent::StatChanged { old_value, new_value, .. }]
                if *old_value == 150.0 && (*new_value - 240.0).abs() < 1e-9
        ));
    }

    #[test]
    fn test_level_up_rejects_non_increasing() {
        let mut r = record(100.0, 0.1, vec![]);
        let mut events = Vec::new();
        r.level_up(3, &mut events).unwrap();
        events.clear();

        let err = r.level_up(3, &mut events).unwrap_err();
        assert_eq!(
            err,
            StatError::InvalidLevelTransition {
                current: 3,
                requested: 3,
            }
        );
        assert!(r.level_up(2, &mut events).is_err());
        assert_eq!(r.level(), 3);
        assert!(events.is_empty());
    }

    #[test]
    fn test_level_up_floor_holds_after_growth() {
        let mut r = record(100.0, 0.1, vec![]);
        let mut events = Vec::new();
        let mut previous = r.scaled_base();
        for level in 2..=50 {
            r.level_up(level, &mut events).unwrap();
            assert!(r.scaled_base() >= previous + 100.0 * 0.1 - 1e-9);
            previous = r.scaled_base();
        }
    }

    #[test]
    fn test_change_within_epsilon_is_silent() {
        let mut r = record(100.0, 0.0, vec![]);
        let mut events = Vec::new();
        r.add_modifier(Modifier::flat("dust", "Dust", 0.005), &mut events);

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StatEvent::ModifierApplied { .. }));
        assert!((r.cached_value() - 100.005).abs() < 1e-9);
        assert_eq!(r.last_value(), 100.0);
    }

    #[test]
    fn test_small_changes_accumulate_against_last_reported() {
        let mut r = record(100.0, 0.0, vec![]);
        let mut events = Vec::new();
        r.add_modifier(Modifier::flat("a", "A", 0.006), &mut events);
        r.add_modifier(Modifier::flat("b", "B", 0.006), &mut events);

        let changes: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, StatEvent::StatChanged { .. }))
            .collect();
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_threshold_down_then_up() {
        let mut r = record(150.0, 0.0, vec![50.0]);
        let mut events = Vec::new();

        r.add_modifier(Modifier::percentage("curse", "Curse", -0.85), &mut events);
        assert!((r.cached_value() - 22.5).abs() < 1e-9);
        assert!(events.iter().any(|e| matches!(
            e,
            StatEvent::ThresholdCrossed { threshold_percent, crossing_up: false, .. }
                if *threshold_percent == 50.0
        )));

        events.clear();
        r.add_modifier(Modifier::percentage("bless", "Blessing", 0.70), &mut events);
        assert!((r.cached_value() - 127.5).abs() < 1e-9);
        let ups: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, StatEvent::ThresholdCrossed { crossing_up: true, .. }))
            .collect();
        assert_eq!(ups.len(), 1);
    }

    #[test]
    fn test_value_never_negative() {
        let mut r = record(50.0, 0.0, vec![]);
        let mut events = Vec::new();
        r.add_modifier(Modifier::flat("drain", "Drain", -500.0), &mut events);
        assert_eq!(r.current_value(&mut events), 0.0);
    }

    #[test]
    fn test_growth_applies_before_flat() {
        let mut r = record(100.0, 0.0, vec![]);
        let mut events = Vec::new();
        r.add_modifier(Modifier::growth("train", "Training", 0.5), &mut events);
        r.add_modifier(Modifier::flat("ring", "Ring", 10.0), &mut events);
        r.add_modifier(Modifier::percentage("aura", "Aura", 0.1), &mut events);
        // ((100 * 1.5) + 10) * 1.1
        assert!((r.current_value(&mut events) - 176.0).abs() < 1e-9);
    }

    #[test]
    fn test_ascension_replaces() {
        let mut r = record(100.0, 0.0, vec![]);
        let mut events = Vec::new();
        r.update_ascension_bonus(0.25, &mut events);
        r.update_ascension_bonus(0.25, &mut events);
        assert!((r.current_value(&mut events) - 125.0).abs() < 1e-9);

        r.update_ascension_bonus(0.10, &mut events);
        assert!((r.current_value(&mut events) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_expires_and_recomputes() {
        let mut r = record(100.0, 0.0, vec![]);
        let mut events = Vec::new();
        r.add_modifier(
            Modifier::flat("shout", "Shout", 20.0).expires_at(Timestamp::from_secs(5.0)),
            &mut events,
        );
        events.clear();

        assert_eq!(r.tick(Timestamp::from_secs(4.0), &mut events), 0);
        assert!(events.is_empty());

        assert_eq!(r.tick(Timestamp::from_secs(6.0), &mut events), 1);
        assert!(matches!(events[0], StatEvent::ModifierExpired { .. }));
        assert!(matches!(
            events[1],
            StatEvent::StatChanged { new_value, .. } if new_value == 100.0
        ));
        assert!(r.modifiers().is_empty());
    }

    #[test]
    fn test_remove_unknown_is_silent() {
        let mut r = record(100.0, 0.0, vec![]);
        let mut events = Vec::new();
        assert!(r.remove_modifier("nothing", &mut events).is_none());
        assert!(events.is_empty());
        assert!(!r.is_dirty());
    }

    #[test]
    fn test_at_level_starts_scaled() {
        let r = StatRecord::at_level(
            CharacterId::new("hero"),
            StatType::Attack,
            150.0,
            0.15,
            vec![],
            5,
        )
        .unwrap();
        assert!((r.cached_value() - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_staged_changes_report_once() {
        let mut r = record(100.0, 0.1, vec![50.0]);
        let mut events = Vec::new();
        r.stage_level_up(3).unwrap();
        r.stage_derived_bonus(-90.0);
        r.stage_ascension_bonus(0.1);
        assert!(r.is_dirty());
        assert!(events.is_empty());

        // (120 - 90) * 1.1
        let value = r.current_value(&mut events);
        assert!((value - 33.0).abs() < 1e-9);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            StatEvent::ThresholdCrossed { crossing_up: false, .. }
        ));
    }
}
