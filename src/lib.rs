//! # charstat - Character Stat and Modifier Engine
//!
//! Stores every attribute of a game character and keeps one
//! authoritative value per stat:
//! - **Level scaling** with a guaranteed minimum gain per level
//! - **Modifiers** (flat, percentage, growth) with optional expiry
//! - **Ascension** as a single replaceable bonus slot
//! - **Threshold notifications** when a value crosses a percentage of its base
//! - **Derived stats** (Health from Stamina, Power from the combat stats)
//!
//! ## Core Concepts
//!
//! ### Value computation
//!
//! ```text
//! scaled  = base × (1 + growth_rate × (level - 1))
//! value   = max(0, ((scaled × (1 + Σgrowth)) + Σflat + derived) × (1 + Σpercentage + ascension))
//! ```
//!
//! Values are cached. Every mutation marks the record dirty and
//! recomputes right away, so change and threshold notifications belong
//! to the mutation that caused them.
//!
//! ### Notifications
//!
//! A `StatRegistry` owns the records of one character and an injected
//! `EventBus`. Events are queued during a mutation and delivered once it
//! has completed. Observers that want to change stats in response push
//! commands into the `Reactions` they are handed; the registry applies
//! them after the current batch.
//!
//! ## Example
//!
//! ```rust
//! use charstat::*;
//!
//! let mut registry = StatRegistry::new("hero", RecordingBus::new());
//! registry.create_stat(StatType::Health, 150.0, 0.0, vec![50.0]).unwrap();
//!
//! // A curse drops Health below half of its base
//! registry
//!     .add_modifier(&StatType::Health, Modifier::percentage("curse", "Curse", -0.85))
//!     .unwrap();
//! assert!((registry.value(&StatType::Health).unwrap() - 22.5).abs() < 1e-9);
//! assert_eq!(registry.bus().threshold_crossings(), vec![(50.0, false)]);
//!
//! // The curse wears off
//! registry.remove_modifier(&StatType::Health, "curse").unwrap();
//! assert_eq!(registry.value(&StatType::Health).unwrap(), 150.0);
//! ```
//!
//! ## Modules
//!
//! - [`modifier`] - Modifiers and engine time
//! - [`modifier_set`] - Per-stat modifier collection
//! - [`record`] - One stat of one character
//! - [`threshold`] - Threshold crossing detection
//! - [`registry`] - All stats of one character
//! - [`events`] - Notifications and the event bus seam
//! - [`derived`] - Derived-stat formulas
//! - [`graph`] - Dependency graph management
//! - [`config`] - Registry configuration and stat definitions
//! - [`error`] - Error types

pub mod breakdown;
pub mod config;
pub mod derived;
pub mod error;
pub mod events;
pub mod graph;
pub mod ids;
pub mod modifier;
pub mod modifier_set;
pub mod record;
pub mod registry;
pub mod stat_type;
pub mod threshold;

// Re-export main types for convenience
pub use breakdown::StatBreakdown;
pub use config::{RegistryConfig, StatDefinition, StatSetConfig};
pub use derived::{DerivedFormula, DerivedRules};
pub use error::StatError;
pub use events::{EventBus, NullBus, Reactions, RecordingBus, StatCommand, StatEvent};
pub use ids::CharacterId;
pub use modifier::{Modifier, ModifierKind, Timestamp};
pub use modifier_set::{ModifierSet, ModifierTotals};
pub use record::StatRecord;
pub use registry::StatRegistry;
pub use stat_type::StatType;
pub use threshold::{ThresholdCrossing, ThresholdTracker};
