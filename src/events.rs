//! Outbound notifications and the event-bus seam.
//!
//! The engine never calls back into game code while a mutation is in
//! progress. Each mutation collects its `StatEvent`s, finishes updating
//! state, and only then hands the events to the registry's `EventBus`.
//! Observers that want to react by changing stats push `StatCommand`s
//! into the `Reactions` they are given; the registry applies those
//! after the current batch has been delivered.

use crate::ids::CharacterId;
use crate::modifier::Modifier;
use crate::stat_type::StatType;
use serde::{Deserialize, Serialize};

/// A change notification emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatEvent {
    /// The stat's value moved by more than the change epsilon.
    StatChanged {
        character_id: CharacterId,
        stat_type: StatType,
        old_value: f64,
        new_value: f64,
    },
    ModifierApplied {
        character_id: CharacterId,
        stat_type: StatType,
        modifier: Modifier,
    },
    ModifierRemoved {
        character_id: CharacterId,
        stat_type: StatType,
        modifier: Modifier,
    },
    /// Emitted by the tick sweep, once per expired modifier.
    ModifierExpired {
        character_id: CharacterId,
        stat_type: StatType,
        modifier: Modifier,
    },
    ThresholdCrossed {
        character_id: CharacterId,
        stat_type: StatType,
        threshold_percent: f64,
        new_value: f64,
        crossing_up: bool,
    },
}

impl StatEvent {
    pub fn character_id(&self) -> &CharacterId {
        match self {
            StatEvent::StatChanged { character_id, .. }
            | StatEvent::ModifierApplied { character_id, .. }
            | StatEvent::ModifierRemoved { character_id, .. }
            | StatEvent::ModifierExpired { character_id, .. }
            | StatEvent::ThresholdCrossed { character_id, .. } => character_id,
        }
    }

    pub fn stat_type(&self) -> &StatType {
        match self {
            StatEvent::StatChanged { stat_type, .. }
            | StatEvent::ModifierApplied { stat_type, .. }
            | StatEvent::ModifierRemoved { stat_type, .. }
            | StatEvent::ModifierExpired { stat_type, .. }
            | StatEvent::ThresholdCrossed { stat_type, .. } => stat_type,
        }
    }
}

/// A stat mutation requested by an observer during dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum StatCommand {
    AddModifier { stat_type: StatType, modifier: Modifier },
    RemoveModifier { stat_type: StatType, id: String },
    UpdateAscensionBonus { stat_type: StatType, bonus: f64 },
}

/// Follow-up commands collected while a batch of events is published.
#[derive(Debug, Default)]
pub struct Reactions {
    commands: Vec<StatCommand>,
}

impl Reactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: StatCommand) {
        self.commands.push(command);
    }

    pub fn add_modifier(&mut self, stat_type: StatType, modifier: Modifier) {
        self.push(StatCommand::AddModifier {
            stat_type,
            modifier,
        });
    }

    pub fn remove_modifier(&mut self, stat_type: StatType, id: impl Into<String>) {
        self.push(StatCommand::RemoveModifier {
            stat_type,
            id: id.into(),
        });
    }

    pub fn update_ascension_bonus(&mut self, stat_type: StatType, bonus: f64) {
        self.push(StatCommand::UpdateAscensionBonus { stat_type, bonus });
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn into_commands(self) -> Vec<StatCommand> {
        self.commands
    }
}

/// Receiver of engine notifications.
///
/// Injected into the registry at construction, so tests can substitute
/// a recording implementation.
///
/// # Examples
///
/// ```rust
/// use charstat::{EventBus, Reactions, StatEvent};
///
/// #[derive(Default)]
/// struct ChangeCounter(usize);
///
/// impl EventBus for ChangeCounter {
///     fn publish(&mut self, event: &StatEvent, _reactions: &mut Reactions) {
///         if matches!(event, StatEvent::StatChanged { .. }) {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait EventBus {
    /// Deliver one event. Stat changes in response go through `reactions`.
    fn publish(&mut self, event: &StatEvent, reactions: &mut Reactions);
}

/// A bus that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBus;

impl EventBus for NullBus {
    fn publish(&mut self, _event: &StatEvent, _reactions: &mut Reactions) {}
}

/// A bus that stores every event it receives, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    events: Vec<StatEvent>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[StatEvent] {
        &self.events
    }

    /// Take the recorded events, leaving the bus empty.
    pub fn drain(&mut self) -> Vec<StatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Recorded threshold crossings as `(threshold_percent, crossing_up)`.
    pub fn threshold_crossings(&self) -> Vec<(f64, bool)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StatEvent::ThresholdCrossed {
                    threshold_percent,
                    crossing_up,
                    ..
                } => Some((*threshold_percent, *crossing_up)),
                _ => None,
            })
            .collect()
    }

    /// Recorded value changes as `(old_value, new_value)`.
    pub fn value_changes(&self) -> Vec<(f64, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StatEvent::StatChanged {
                    old_value,
                    new_value,
                    ..
                } => Some((*old_value, *new_value)),
                _ => None,
            })
            .collect()
    }
}

impl EventBus for RecordingBus {
    fn publish(&mut self, event: &StatEvent, _reactions: &mut Reactions) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(old: f64, new: f64) -> StatEvent {
        StatEvent::StatChanged {
            character_id: CharacterId::new("hero"),
            stat_type: StatType::Health,
            old_value: old,
            new_value: new,
        }
    }

    #[test]
    fn test_accessors() {
        let event = changed(1.0, 2.0);
        assert_eq!(event.character_id().as_str(), "hero");
        assert_eq!(event.stat_type(), &StatType::Health);
    }

    #[test]
    fn test_recording_bus() {
        let mut bus = RecordingBus::new();
        let mut reactions = Reactions::new();
        bus.publish(&changed(1.0, 2.0), &mut reactions);
        bus.publish(
            &StatEvent::ThresholdCrossed {
                character_id: CharacterId::new("hero"),
                stat_type: StatType::Health,
                threshold_percent: 50.0,
                new_value: 2.0,
                crossing_up: true,
            },
            &mut reactions,
        );

        assert!(reactions.is_empty());
        assert_eq!(bus.value_changes(), vec![(1.0, 2.0)]);
        assert_eq!(bus.threshold_crossings(), vec![(50.0, true)]);
        assert_eq!(bus.drain().len(), 2);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(changed(10.0, 12.5)).unwrap();
        assert_eq!(json["event"], "stat_changed");
        assert_eq!(json["stat_type"], "Health");
        assert_eq!(json["new_value"], 12.5);
    }

    #[test]
    fn test_reactions_collect_commands() {
        let mut reactions = Reactions::new();
        reactions.add_modifier(StatType::Defense, Modifier::flat("guard", "Guard", 5.0));
        reactions.remove_modifier(StatType::Attack, "rage");
        reactions.update_ascension_bonus(StatType::Health, 0.1);
        assert_eq!(reactions.len(), 3);

        let commands = reactions.into_commands();
        assert!(matches!(commands[1], StatCommand::RemoveModifier { ref id, .. } if id == "rage"));
    }
}
