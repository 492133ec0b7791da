//! Levels a character, applies timed buffs and prints every notification.
//!
//! Run with `RUST_LOG=charstat=debug cargo run --example leveling` to see
//! the engine's own logging as well.

use charstat::*;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Prints events and drinks a potion whenever Health drops below a quarter.
#[derive(Default)]
struct ConsoleBus {
    potions: u32,
}

impl EventBus for ConsoleBus {
    fn publish(&mut self, event: &StatEvent, reactions: &mut Reactions) {
        match event {
            StatEvent::StatChanged {
                stat_type,
                old_value,
                new_value,
                ..
            } => println!("  {stat_type}: {old_value:.2} -> {new_value:.2}"),
            StatEvent::ModifierApplied {
                stat_type,
                modifier,
                ..
            } => println!("  {stat_type}: + {} ({:?} {})", modifier.source(), modifier.kind(), modifier.value()),
            StatEvent::ModifierRemoved {
                stat_type,
                modifier,
                ..
            } => println!("  {stat_type}: - {}", modifier.source()),
            StatEvent::ModifierExpired {
                stat_type,
                modifier,
                ..
            } => println!("  {stat_type}: {} wore off", modifier.source()),
            StatEvent::ThresholdCrossed {
                stat_type,
                threshold_percent,
                crossing_up,
                ..
            } => {
                let direction = if *crossing_up { "above" } else { "below" };
                println!("  {stat_type}: now {direction} {threshold_percent}%");

                if *stat_type == StatType::Health && *threshold_percent == 25.0 && !crossing_up {
                    self.potions += 1;
                    reactions.add_modifier(
                        StatType::Health,
                        Modifier::flat(format!("potion-{}", self.potions), "Healing Potion", 60.0),
                    );
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("charstat=info".parse()?))
        .init();

    let mut hero = StatRegistry::new("hero", ConsoleBus::default());
    hero.initialize_defaults()?;
    hero.create_stat(StatType::Stamina, 8.0, 0.05, vec![])?;
    hero.create_stat(StatType::Power, 0.0, 0.0, vec![])?;

    println!("Level 1 -> 5");
    hero.level_up(5)?;

    println!("Equip a sword and cast a 10s war cry");
    hero.add_modifier(&StatType::Attack, Modifier::flat("sword", "Iron Sword", 10.0))?;
    hero.add_modifier(
        &StatType::Attack,
        Modifier::percentage("war_cry", "War Cry", 0.20).expires_at(hero.now().after(10.0)),
    )?;

    println!("A curse saps Health");
    hero.add_modifier(&StatType::Health, Modifier::percentage("curse", "Curse", -0.80))?;

    for second in [5.0, 12.0] {
        println!("t = {second}s");
        let expired = hero.tick(Timestamp::from_secs(second));
        info!(expired, "tick");
    }

    println!("Ascend: +10% Health and Attack");
    hero.update_ascension_bonuses([(StatType::Health, 0.10), (StatType::Attack, 0.10)])?;

    println!("Final values");
    let stats: Vec<StatType> = hero.stat_types().cloned().collect();
    for stat in &stats {
        let breakdown = hero.breakdown(stat)?;
        println!(
            "  {stat}: {:.2} (base {:.2}, flat {:+.2}, derived {:+.2}, x{:.2})",
            breakdown.value,
            breakdown.scaled_base,
            breakdown.flat,
            breakdown.derived,
            breakdown.multiplier()
        );
    }
    println!("Potions drunk: {}", hero.bus().potions);
    Ok(())
}
