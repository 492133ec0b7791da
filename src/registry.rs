//! Stat registry module.
//!
//! Provides the `StatRegistry` type, the owner of every `StatRecord` of
//! one character and the entry point for all mutations: modifiers,
//! leveling, ascension and the periodic expiry tick.
//!
//! Each mutation first changes the inputs of every affected record,
//! then settles the records once: plain stats first, derived stats in
//! dependency order. Every value is therefore reported once per
//! mutation, computed from consistent inputs. Events produced along the
//! way are queued, then flushed to the injected `EventBus`; follow-up
//! commands pushed by observers are applied afterwards, round by round,
//! up to the configured depth.

use crate::breakdown::StatBreakdown;
use crate::config::{RegistryConfig, StatDefinition, StatSetConfig};
use crate::derived::{DerivedFormula, DerivedRules};
use crate::error::StatError;
use crate::events::{EventBus, NullBus, Reactions, StatCommand, StatEvent};
use crate::ids::CharacterId;
use crate::modifier::{Modifier, Timestamp};
use crate::record::StatRecord;
use crate::stat_type::StatType;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// All stats of one character.
///
/// # Examples
///
/// ```rust
/// use charstat::*;
///
/// let mut registry = StatRegistry::new("hero", RecordingBus::new());
/// registry.create_stat(StatType::Health, 150.0, 0.15, vec![50.0]).unwrap();
///
/// registry.level_up(5).unwrap();
/// registry
///     .add_modifier(&StatType::Health, Modifier::flat("amulet", "Amulet", 10.0))
///     .unwrap();
/// registry
///     .add_modifier(&StatType::Health, Modifier::percentage("blessing", "Blessing", 0.20))
///     .unwrap();
///
/// let health = registry.value(&StatType::Health).unwrap();
/// assert!((health - 300.0).abs() < 1e-9);
/// assert!(!registry.bus().events().is_empty());
/// ```
#[derive(Debug)]
pub struct StatRegistry<B: EventBus = NullBus> {
    character_id: CharacterId,
    level: u32,
    now: Timestamp,
    config: RegistryConfig,
    rules: DerivedRules,
    records: BTreeMap<StatType, StatRecord>,
    bus: B,
}

impl<B: EventBus> StatRegistry<B> {
    /// Create an empty level 1 registry with the default configuration.
    pub fn new(character_id: impl Into<CharacterId>, bus: B) -> Self {
        Self::from_parts(character_id.into(), RegistryConfig::default(), bus)
    }

    /// Create an empty level 1 registry with a custom configuration.
    ///
    /// # Arguments
    ///
    /// * `character_id` - Owner of every stat in the registry
    /// * `config` - Tuning; rejected with `InvalidConfig` if invalid
    /// * `bus` - Receiver of every notification
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::{NullBus, RegistryConfig, StatRegistry};
    ///
    /// let config = RegistryConfig {
    ///     change_epsilon: f64::NAN,
    ///     ..RegistryConfig::default()
    /// };
    /// assert!(StatRegistry::with_config("hero", config, NullBus).is_err());
    /// ```
    pub fn with_config(
        character_id: impl Into<CharacterId>,
        config: RegistryConfig,
        bus: B,
    ) -> Result<Self, StatError> {
        config.validate()?;
        Ok(Self::from_parts(character_id.into(), config, bus))
    }

    fn from_parts(character_id: CharacterId, config: RegistryConfig, bus: B) -> Self {
        let rules = if config.standard_derived_stats {
            DerivedRules::standard()
        } else {
            DerivedRules::empty()
        };
        Self {
            character_id,
            level: 1,
            now: Timestamp::ZERO,
            config,
            rules,
            records: BTreeMap::new(),
            bus,
        }
    }

    /// The character every stat belongs to.
    pub fn character_id(&self) -> &CharacterId {
        &self.character_id
    }

    /// The character level every record created from now on starts at.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Engine time as of the last tick.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The active derived-stat formulas.
    pub fn derived_rules(&self) -> &DerivedRules {
        &self.rules
    }

    /// The injected event bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the registry, returning its bus.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Number of created stats.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `stat_type` has been created.
    pub fn contains(&self, stat_type: &StatType) -> bool {
        self.records.contains_key(stat_type)
    }

    /// Every created stat type, in sorted order.
    pub fn stat_types(&self) -> impl Iterator<Item = &StatType> {
        self.records.keys()
    }

    /// Every record, in stat type order.
    pub fn records(&self) -> impl Iterator<Item = &StatRecord> {
        self.records.values()
    }

    /// Create a stat at the current character level.
    ///
    /// Fails with `DuplicateStat` if the stat exists (the existing record
    /// is left untouched) or `InvalidDefinition` for unusable values.
    /// Stats derived from the new one are refreshed immediately.
    pub fn create_stat(
        &mut self,
        stat_type: StatType,
        base_value: f64,
        growth_rate: f64,
        thresholds: Vec<f64>,
    ) -> Result<(), StatError> {
        self.ensure_absent(&stat_type)?;
        let record = self.build_record(stat_type.clone(), base_value, growth_rate, thresholds)?;
        debug!(
            character = %self.character_id,
            stat = %stat_type,
            value = record.cached_value(),
            "stat created"
        );
        self.records.insert(stat_type, record);

        let mut events = Vec::new();
        self.settle(&mut events);
        self.dispatch(events);
        Ok(())
    }

    /// Create a stat from a definition.
    pub fn create_from_definition(&mut self, definition: &StatDefinition) -> Result<(), StatError> {
        self.create_stat(
            definition.stat_type.clone(),
            definition.base_value,
            definition.growth_rate,
            definition.thresholds.clone(),
        )
    }

    /// Create every stat in `set`.
    ///
    /// The whole set is validated first: a duplicate or invalid
    /// definition rejects it before anything is created.
    pub fn load_definitions(&mut self, set: &StatSetConfig) -> Result<(), StatError> {
        let mut seen = HashSet::new();
        for definition in &set.stats {
            self.ensure_absent(&definition.stat_type)?;
            if !seen.insert(&definition.stat_type) {
                return Err(StatError::DuplicateStat {
                    character_id: self.character_id.clone(),
                    stat_type: definition.stat_type.clone(),
                });
            }
            self.build_record(
                definition.stat_type.clone(),
                definition.base_value,
                definition.growth_rate,
                definition.thresholds.clone(),
            )?;
        }

        for definition in &set.stats {
            self.create_from_definition(definition)?;
        }
        info!(
            character = %self.character_id,
            count = set.stats.len(),
            "stat definitions loaded"
        );
        Ok(())
    }

    /// Create the standard starter stats.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::{NullBus, StatRegistry, StatType};
    ///
    /// let mut registry = StatRegistry::new("hero", NullBus);
    /// registry.initialize_defaults().unwrap();
    /// assert!(registry.contains(&StatType::Health));
    /// assert!(registry.initialize_defaults().is_err());
    /// ```
    pub fn initialize_defaults(&mut self) -> Result<(), StatError> {
        self.load_definitions(&StatSetConfig::default())
    }

    /// Look up a stat, failing with `StatNotFound`.
    pub fn get_stat(&self, stat_type: &StatType) -> Result<&StatRecord, StatError> {
        self.records
            .get(stat_type)
            .ok_or_else(|| self.not_found(stat_type))
    }

    /// Look up a stat that may legitimately be absent.
    pub fn try_get_stat(&self, stat_type: &StatType) -> Option<&StatRecord> {
        self.records.get(stat_type)
    }

    /// The current value of a stat.
    pub fn value(&mut self, stat_type: &StatType) -> Result<f64, StatError> {
        let mut events = Vec::new();
        let value = self.record_mut(stat_type)?.current_value(&mut events);
        self.dispatch(events);
        Ok(value)
    }

    /// The current value of a stat, or `None` if it was never created.
    pub fn try_value(&mut self, stat_type: &StatType) -> Option<f64> {
        self.value(stat_type).ok()
    }

    /// Every term of a stat's current value.
    pub fn breakdown(&self, stat_type: &StatType) -> Result<StatBreakdown, StatError> {
        self.get_stat(stat_type).map(StatRecord::breakdown)
    }

    /// Apply a modifier, replacing any modifier with the same id.
    pub fn add_modifier(&mut self, stat_type: &StatType, modifier: Modifier) -> Result<(), StatError> {
        let mut events = Vec::new();
        self.apply_add(stat_type, modifier, &mut events)?;
        self.dispatch(events);
        Ok(())
    }

    /// Remove a modifier by id.
    ///
    /// Returns the removed modifier; an unknown id is `Ok(None)`, not an error.
    pub fn remove_modifier(
        &mut self,
        stat_type: &StatType,
        id: &str,
    ) -> Result<Option<Modifier>, StatError> {
        let mut events = Vec::new();
        let removed = self.apply_remove(stat_type, id, &mut events)?;
        self.dispatch(events);
        Ok(removed)
    }

    /// Raise the character level of every stat.
    ///
    /// Rejected with `InvalidLevelTransition`, before anything changes,
    /// unless `new_level` is above the character level and above the
    /// level of every stat. Each stat reports its new value once.
    pub fn level_up(&mut self, new_level: u32) -> Result<(), StatError> {
        if new_level <= self.level {
            return Err(StatError::InvalidLevelTransition {
                current: self.level,
                requested: new_level,
            });
        }
        for record in self.records.values() {
            record.check_level_up(new_level)?;
        }

        for record in self.records.values_mut() {
            record.stage_level_up(new_level)?;
        }
        self.level = new_level;
        info!(character = %self.character_id, level = new_level, "character leveled up");

        let mut events = Vec::new();
        self.settle(&mut events);
        self.dispatch(events);
        Ok(())
    }

    /// Raise the level of a single stat (stats that level independently).
    pub fn level_up_stat(&mut self, stat_type: &StatType, new_level: u32) -> Result<(), StatError> {
        self.record_mut(stat_type)?.stage_level_up(new_level)?;
        debug!(character = %self.character_id, stat = %stat_type, level = new_level, "stat leveled up");

        let mut events = Vec::new();
        self.settle(&mut events);
        self.dispatch(events);
        Ok(())
    }

    /// Replace a stat's ascension bonus (`0.10` = +10%).
    ///
    /// The slot is overwritten, never accumulated: pass the new
    /// cumulative total.
    pub fn update_ascension_bonus(&mut self, stat_type: &StatType, bonus: f64) -> Result<(), StatError> {
        let mut events = Vec::new();
        self.apply_ascension(stat_type, bonus, &mut events)?;
        self.dispatch(events);
        Ok(())
    }

    /// Replace the ascension bonus of several stats at once.
    ///
    /// Every stat and bonus is validated before any slot changes.
    pub fn update_ascension_bonuses(
        &mut self,
        bonuses: impl IntoIterator<Item = (StatType, f64)>,
    ) -> Result<(), StatError> {
        let bonuses: Vec<(StatType, f64)> = bonuses.into_iter().collect();
        for (stat_type, bonus) in &bonuses {
            self.get_stat(stat_type)?;
            check_ascension_bonus(stat_type, *bonus)?;
        }

        for (stat_type, bonus) in &bonuses {
            self.record_mut(stat_type)?.stage_ascension_bonus(*bonus);
        }

        let mut events = Vec::new();
        self.settle(&mut events);
        self.dispatch(events);
        Ok(())
    }

    /// Advance engine time and expire modifiers.
    ///
    /// Every expired modifier produces one `ModifierExpired` event. The
    /// value and threshold events the removals caused follow in the same
    /// tick, once per stat. Returns the number of expired modifiers.
    pub fn tick(&mut self, now: Timestamp) -> usize {
        self.now = now;
        let mut events = Vec::new();
        let expired: usize = self
            .records
            .values_mut()
            .map(|record| record.stage_tick(now, &mut events))
            .sum();

        if expired > 0 {
            debug!(character = %self.character_id, expired, %now, "modifiers expired");
        }
        self.settle(&mut events);
        self.dispatch(events);
        expired
    }

    /// Add or replace a derived-stat formula.
    ///
    /// Rejected with `StatError::Cycle` if it would make a stat depend on
    /// itself. The affected stats are refreshed immediately.
    pub fn register_derived_formula(
        &mut self,
        stat_type: StatType,
        formula: DerivedFormula,
    ) -> Result<(), StatError> {
        self.rules.insert(stat_type, formula)?;

        let mut events = Vec::new();
        self.settle(&mut events);
        self.dispatch(events);
        Ok(())
    }

    fn apply_add(
        &mut self,
        stat_type: &StatType,
        modifier: Modifier,
        events: &mut Vec<StatEvent>,
    ) -> Result<(), StatError> {
        self.record_mut(stat_type)?.stage_modifier(modifier, events);
        self.settle(events);
        Ok(())
    }

    fn apply_remove(
        &mut self,
        stat_type: &StatType,
        id: &str,
        events: &mut Vec<StatEvent>,
    ) -> Result<Option<Modifier>, StatError> {
        let removed = self.record_mut(stat_type)?.stage_removal(id, events);
        self.settle(events);
        Ok(removed)
    }

    fn apply_ascension(
        &mut self,
        stat_type: &StatType,
        bonus: f64,
        events: &mut Vec<StatEvent>,
    ) -> Result<(), StatError> {
        check_ascension_bonus(stat_type, bonus)?;
        self.record_mut(stat_type)?.stage_ascension_bonus(bonus);
        self.settle(events);
        Ok(())
    }

    fn apply_command(&mut self, command: StatCommand, events: &mut Vec<StatEvent>) -> Result<(), StatError> {
        match command {
            StatCommand::AddModifier {
                stat_type,
                modifier,
            } => self.apply_add(&stat_type, modifier, events),
            StatCommand::RemoveModifier { stat_type, id } => {
                self.apply_remove(&stat_type, &id, events).map(|_| ())
            }
            StatCommand::UpdateAscensionBonus { stat_type, bonus } => {
                self.apply_ascension(&stat_type, bonus, events)
            }
        }
    }

    /// Deliver queued events, then apply observer reactions round by round.
    fn dispatch(&mut self, events: Vec<StatEvent>) {
        let mut pending = events;
        let mut depth = 0;

        while !pending.is_empty() {
            let mut reactions = Reactions::new();
            for event in &pending {
                self.bus.publish(event, &mut reactions);
            }
            if reactions.is_empty() {
                break;
            }
            if depth >= self.config.max_reaction_depth {
                warn!(
                    character = %self.character_id,
                    dropped = reactions.len(),
                    depth,
                    "reaction depth exceeded, dropping follow-up commands"
                );
                break;
            }
            depth += 1;

            let mut next = Vec::new();
            for command in reactions.into_commands() {
                if let Err(err) = self.apply_command(command, &mut next) {
                    warn!(character = %self.character_id, error = %err, "reaction command rejected");
                }
            }
            pending = next;
        }
    }

    /// Recompute every dirty record once, inputs before derived stats.
    ///
    /// Plain stats settle first. Derived stats then take their bonus from
    /// already settled inputs, in topological order.
    fn settle(&mut self, events: &mut Vec<StatEvent>) {
        for (stat_type, record) in self.records.iter_mut() {
            if self.rules.formula(stat_type).is_none() {
                record.current_value(events);
            }
        }

        let order: Vec<StatType> = self.rules.derived_in_order().cloned().collect();
        for stat_type in &order {
            if !self.records.contains_key(stat_type) {
                continue;
            }
            let bonus = self.derived_input_value(stat_type);
            if let Some(record) = self.records.get_mut(stat_type) {
                record.stage_derived_bonus(bonus);
                record.current_value(events);
            }
        }
    }

    fn derived_input_value(&self, stat_type: &StatType) -> f64 {
        self.rules
            .formula(stat_type)
            .map(|formula| formula.evaluate(|input| self.records.get(input).map(StatRecord::cached_value)))
            .unwrap_or(0.0)
    }

    fn build_record(
        &self,
        stat_type: StatType,
        base_value: f64,
        growth_rate: f64,
        thresholds: Vec<f64>,
    ) -> Result<StatRecord, StatError> {
        let derived = self.derived_input_value(&stat_type);
        Ok(StatRecord::at_level(
            self.character_id.clone(),
            stat_type,
            base_value,
            growth_rate,
            thresholds,
            self.level,
        )?
        .with_epsilon(self.config.change_epsilon)
        .with_time(self.now)
        .with_derived_bonus(derived))
    }

    fn ensure_absent(&self, stat_type: &StatType) -> Result<(), StatError> {
        if self.records.contains_key(stat_type) {
            return Err(StatError::DuplicateStat {
                character_id: self.character_id.clone(),
                stat_type: stat_type.clone(),
            });
        }
        Ok(())
    }

    fn record_mut(&mut self, stat_type: &StatType) -> Result<&mut StatRecord, StatError> {
        let character_id = &self.character_id;
        self.records
            .get_mut(stat_type)
            .ok_or_else(|| StatError::StatNotFound {
                character_id: character_id.clone(),
                stat_type: stat_type.clone(),
            })
    }

    fn not_found(&self, stat_type: &StatType) -> StatError {
        StatError::StatNotFound {
            character_id: self.character_id.clone(),
            stat_type: stat_type.clone(),
        }
    }
}

fn check_ascension_bonus(stat_type: &StatType, bonus: f64) -> Result<(), StatError> {
    if !bonus.is_finite() {
        return Err(StatError::InvalidDefinition {
            stat_type: stat_type.clone(),
            reason: format!("ascension bonus {bonus} must be finite"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingBus;

    fn registry() -> StatRegistry<RecordingBus> {
        StatRegistry::new("hero", RecordingBus::new())
    }

    #[test]
    fn test_create_and_get() {
        let mut reg = registry();
        reg.create_stat(StatType::Health, 100.0, 0.1, vec![]).unwrap();

        let health = reg.get_stat(&StatType::Health).unwrap();
        assert_eq!(health.cached_value(), 100.0);
        assert_eq!(health.character_id().as_str(), "hero");
        assert!(reg.bus().events().is_empty());
    }

    #[test]
    fn test_duplicate_stat_rejected() {
        let mut reg = registry();
        reg.create_stat(StatType::Health, 100.0, 0.1, vec![]).unwrap();
        reg.add_modifier(&StatType::Health, Modifier::flat("ring", "Ring", 5.0))
            .unwrap();

        let err = reg.create_stat(StatType::Health, 1.0, 0.0, vec![]).unwrap_err();
        assert!(matches!(err, StatError::DuplicateStat { .. }));
        assert_eq!(reg.value(&StatType::Health).unwrap(), 105.0);
    }

    #[test]
    fn test_lookup_missing() {
        let mut reg = registry();
        assert!(matches!(
            reg.get_stat(&StatType::Mana),
            Err(StatError::StatNotFound { .. })
        ));
        assert!(reg.try_get_stat(&StatType::Mana).is_none());
        assert!(reg.try_value(&StatType::Mana).is_none());
        assert!(reg
            .add_modifier(&StatType::Mana, Modifier::flat("x", "X", 1.0))
            .is_err());
    }

    #[test]
    fn test_remove_unknown_modifier_is_ok() {
        let mut reg = registry();
        reg.create_stat(StatType::Attack, 10.0, 0.0, vec![]).unwrap();
        assert_eq!(reg.remove_modifier(&StatType::Attack, "ghost").unwrap(), None);
        assert!(reg.bus().events().is_empty());
    }

    #[test]
    fn test_level_up_is_atomic() {
        let mut reg = registry();
        reg.create_stat(StatType::Attack, 10.0, 0.1, vec![]).unwrap();
        reg.create_stat(StatType::Speed, 1.0, 0.1, vec![]).unwrap();
        reg.level_up_stat(&StatType::Speed, 6).unwrap();
        reg.bus_mut().clear();

        let err = reg.level_up(4).unwrap_err();
        assert_eq!(
            err,
            StatError::InvalidLevelTransition {
                current: 6,
                requested: 4
            }
        );
        assert_eq!(reg.level(), 1);
        assert_eq!(reg.get_stat(&StatType::Attack).unwrap().level(), 1);
        assert!(reg.bus().events().is_empty());
    }

    #[test]
    fn test_level_up_rejects_same_level() {
        let mut reg = registry();
        reg.level_up(3).unwrap();
        assert!(reg.level_up(3).is_err());
        assert!(reg.level_up(2).is_err());
        assert_eq!(reg.level(), 3);
    }

    #[test]
    fn test_new_stat_starts_at_character_level() {
        let mut reg = registry();
        reg.level_up(5).unwrap();
        reg.create_stat(StatType::Attack, 150.0, 0.15, vec![]).unwrap();
        let attack = reg.get_stat(&StatType::Attack).unwrap();
        assert_eq!(attack.level(), 5);
        assert!((attack.cached_value() - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_emits_expired_then_changed() {
        let mut reg = registry();
        reg.create_stat(StatType::Speed, 10.0, 0.0, vec![]).unwrap();
        reg.add_modifier(
            &StatType::Speed,
            Modifier::percentage("haste", "Haste", 0.5).expires_at(Timestamp::from_secs(3.0)),
        )
        .unwrap();
        reg.bus_mut().clear();

        assert_eq!(reg.tick(Timestamp::from_secs(2.0)), 0);
        assert!(reg.bus().events().is_empty());

        assert_eq!(reg.tick(Timestamp::from_secs(4.0)), 1);
        let events = reg.bus().events();
        assert!(matches!(events[0], StatEvent::ModifierExpired { .. }));
        assert!(matches!(
            events[1],
            StatEvent::StatChanged { old_value, new_value, .. }
                if old_value == 15.0 && new_value == 10.0
        ));
        assert_eq!(reg.now(), Timestamp::from_secs(4.0));
    }

    #[test]
    fn test_derived_health_follows_stamina() {
        let mut reg = registry();
        reg.create_stat(StatType::Stamina, 10.0, 0.0, vec![]).unwrap();
        reg.create_stat(StatType::Health, 100.0, 0.0, vec![]).unwrap();
        assert_eq!(reg.value(&StatType::Health).unwrap(), 200.0);

        reg.add_modifier(&StatType::Stamina, Modifier::flat("belt", "Belt", 5.0))
            .unwrap();
        assert_eq!(reg.value(&StatType::Health).unwrap(), 250.0);
        assert_eq!(
            reg.breakdown(&StatType::Health).unwrap().derived,
            150.0
        );
    }

    #[test]
    fn test_input_created_after_derived_stat() {
        let mut reg = registry();
        reg.create_stat(StatType::Attack, 10.0, 0.0, vec![]).unwrap();
        reg.create_stat(StatType::Strength, 4.0, 0.0, vec![]).unwrap();

        assert_eq!(reg.value(&StatType::Attack).unwrap(), 18.0);
        assert_eq!(reg.bus().value_changes(), vec![(10.0, 18.0)]);
    }

    #[test]
    fn test_derived_disabled_by_config() {
        let config = RegistryConfig {
            standard_derived_stats: false,
            ..RegistryConfig::default()
        };
        let mut reg = StatRegistry::with_config("hero", config, NullBus).unwrap();
        reg.create_stat(StatType::Stamina, 10.0, 0.0, vec![]).unwrap();
        reg.create_stat(StatType::Health, 100.0, 0.0, vec![]).unwrap();
        assert_eq!(reg.value(&StatType::Health).unwrap(), 100.0);
    }

    #[test]
    fn test_register_custom_formula() {
        let mut reg = registry();
        let dodge = StatType::custom("Dodge");
        reg.create_stat(StatType::Agility, 20.0, 0.0, vec![]).unwrap();
        reg.create_stat(dodge.clone(), 1.0, 0.0, vec![]).unwrap();

        reg.register_derived_formula(
            dodge.clone(),
            DerivedFormula::new(vec![(StatType::Agility, 0.5)]),
        )
        .unwrap();
        assert_eq!(reg.value(&dodge).unwrap(), 11.0);

        let err = reg
            .register_derived_formula(
                StatType::Agility,
                DerivedFormula::new(vec![(dodge.clone(), 1.0)]),
            )
            .unwrap_err();
        assert!(matches!(err, StatError::Cycle { .. }));
    }

    #[test]
    fn test_load_definitions_is_atomic() {
        let mut reg = registry();
        reg.create_stat(StatType::Attack, 1.0, 0.0, vec![]).unwrap();

        let err = reg.initialize_defaults().unwrap_err();
        assert!(matches!(err, StatError::DuplicateStat { .. }));
        assert_eq!(reg.len(), 1);

        let set = StatSetConfig {
            stats: vec![
                StatDefinition::new(StatType::Mana, 10.0, 0.0),
                StatDefinition::new(StatType::Speed, -1.0, 0.0),
            ],
        };
        assert!(matches!(
            reg.load_definitions(&set),
            Err(StatError::InvalidDefinition { .. })
        ));
        assert!(!reg.contains(&StatType::Mana));
    }

    #[test]
    fn test_batch_ascension_validates_first() {
        let mut reg = registry();
        reg.create_stat(StatType::Health, 100.0, 0.0, vec![]).unwrap();

        let err = reg
            .update_ascension_bonuses(vec![(StatType::Health, 0.5), (StatType::Mana, 0.5)])
            .unwrap_err();
        assert!(matches!(err, StatError::StatNotFound { .. }));
        assert_eq!(reg.value(&StatType::Health).unwrap(), 100.0);

        reg.update_ascension_bonuses(vec![(StatType::Health, 0.5)])
            .unwrap();
        assert_eq!(reg.value(&StatType::Health).unwrap(), 150.0);
    }

    #[test]
    fn test_non_finite_ascension_rejected() {
        let mut reg = registry();
        reg.create_stat(StatType::Health, 100.0, 0.0, vec![]).unwrap();
        assert!(reg
            .update_ascension_bonus(&StatType::Health, f64::NAN)
            .is_err());
        assert_eq!(reg.value(&StatType::Health).unwrap(), 100.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        for epsilon in [f64::NAN, -0.5, f64::INFINITY] {
            let config = RegistryConfig {
                change_epsilon: epsilon,
                ..RegistryConfig::default()
            };
            assert!(matches!(
                StatRegistry::with_config("hero", config, NullBus),
                Err(StatError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_level_up_reports_each_stat_once() {
        let mut reg = registry();
        reg.create_stat(StatType::Stamina, 10.0, 0.1, vec![]).unwrap();
        reg.create_stat(StatType::Health, 100.0, 0.1, vec![]).unwrap();

        reg.level_up(2).unwrap();
        // Stamina 11, Health 110 + 110
        assert_eq!(reg.bus().value_changes().len(), 2);
        let health = reg.get_stat(&StatType::Health).unwrap();
        assert!((health.cached_value() - 220.0).abs() < 1e-9);
        assert!(!health.is_dirty());
    }
}
