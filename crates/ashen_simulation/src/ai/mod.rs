//! AI decision-making module
//!
//! Hierarchical state machine for Souls-like enemies (main state → combat
//! sub-state → boss phase). The core (`state_machine`, `combat`, `boss`,
//! `roaming`) is engine independent and talks to the world only through the
//! traits in `services`; `systems` is the Bevy glue.

use bevy::prelude::*;

mod boss;
mod combat;
mod roaming;

pub mod components;
pub mod events;
pub mod services;
pub mod state_machine;
pub mod systems;

// Re-export core types
pub use components::*;
pub use events::*;
pub use services::{
    AIServices, AbilityExecutor, AbilityHandle, AbilitySelector, AbilitySystem, CombatStats, EntityLookup, MoveGoal,
    MoveOutcome, MoveRequest, MoveRequestResult, Navigation, Perception,
};
pub use state_machine::{AIStateMachine, AITimers, MAX_NAVIGATION_FAILURES};

/// AI Plugin
///
/// Registers AI systems in FixedUpdate for determinism.
///
/// `SimulationSet::Perception`:
/// 1. sense_nearby_actors — proximity sensing → PerceptionEvent
/// 2. update_spotted_enemies — PerceptionEvent → SpottedEnemies
///
/// `SimulationSet::AI`:
/// 1. init_ai_agents — AIConfig → AIStateMachine
/// 2. route_ai_signals — engine events → AIInbox
/// 3. restore_respawned_actors — body reset on AICommand::Respawn
/// 4. tick_ai_state_machines — inbox + tick
/// 5. publish_ai_notifications — outbox → Bevy events
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<AIConfig>()
            .register_type::<SpottedEnemies>()
            .register_type::<PatrolPath>()
            .register_type::<BossThresholdOverride>();

        app.add_event::<PerceptionEvent>()
            .add_event::<Stimulus>()
            .add_event::<AICommand>()
            .add_event::<AIStateChanged>()
            .add_event::<AICombatSubStateChanged>()
            .add_event::<BossPhaseChanged>()
            .add_event::<AttackStarted>()
            .add_event::<AttackEnded>()
            // Read by route_ai_signals, written by other plugins
            .add_event::<crate::movement::MoveCompleted>()
            .add_event::<crate::combat::AbilityExecutionComplete>()
            .add_event::<crate::combat::PoiseBroken>()
            .add_event::<crate::combat::EntityDied>();

        app.add_systems(
            FixedUpdate,
            (systems::sense_nearby_actors, systems::update_spotted_enemies)
                .chain()
                .in_set(crate::SimulationSet::Perception),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::init_ai_agents,
                systems::route_ai_signals,
                systems::restore_respawned_actors,
                systems::tick_ai_state_machines,
                systems::publish_ai_notifications,
            )
                .chain() // sequential for determinism
                .in_set(crate::SimulationSet::AI),
        );
    }
}
