//! Combat system module
//!
//! ECS responsibility:
//! - Game state: Health, Poise, AbilitySet (cooldowns, active ability)
//! - Combat rules: hit check, damage, poise break, death
//! - Events: AttackHit, DamageDealt, PoiseBroken, EntityDied, AbilityExecutionComplete

use bevy::prelude::*;

pub mod abilities;
pub mod damage;

pub use abilities::{advance_abilities, Ability, AbilityExecutionComplete, AbilitySet, ActiveAbility};
pub use damage::{apply_damage, regenerate_poise, AttackHit, DamageDealt, Dead, EntityDied, PoiseBroken};

/// Combat Plugin
///
/// Registers combat systems in FixedUpdate (`SimulationSet::Combat`, after AI).
///
/// Execution order:
/// 1. advance_abilities — cooldowns, active swings, AttackHit
/// 2. apply_damage — AttackHit → Health/Poise → events
/// 3. regenerate_poise
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AttackHit>()
            .add_event::<DamageDealt>()
            .add_event::<PoiseBroken>()
            .add_event::<EntityDied>()
            .add_event::<AbilityExecutionComplete>();

        app.add_systems(
            FixedUpdate,
            (advance_abilities, apply_damage, regenerate_poise)
                .chain()
                .in_set(crate::SimulationSet::Combat),
        );
    }
}
