//! ASHEN Simulation Core
//!
//! ECS simulation on Bevy 0.16: Souls-like enemy AI (hierarchical state
//! machine), combat rules and headless movement.
//!
//! Layers:
//! - `ai` — state machine core (engine independent) + Bevy systems
//! - `combat` — abilities, damage, poise, death
//! - `movement` — headless execution of movement commands
//!
//! One simulation tick (FixedUpdate, 60Hz) runs
//! `Perception → AI → Combat → Movement`.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Public modules
pub mod ai;
pub mod combat;
pub mod components;
pub mod logger;
pub mod movement;

// Re-exports for convenience
pub use ai::{
    AIConfig, AIPlugin, AIServices, AIStateMachine, BossPhase, BossPhaseThresholds, CombatSubState, MainState,
    PatrolPath,
};
pub use combat::{Ability, AbilitySet, CombatPlugin, Dead, EntityDied};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning, LogLevel, LogPrinter};
pub use movement::{MoveCompleted, MovementPlugin};

/// Order of one simulation tick inside FixedUpdate
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Sensing → SpottedEnemies
    Perception,
    /// State machines
    AI,
    /// Abilities, damage, poise
    Combat,
    /// Movement commands → Transform
    Movement,
}

/// Main simulation plugin (combines all subsystems)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz for the simulation tick
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        // Keep a seed chosen by create_headless_app
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Perception,
                SimulationSet::AI,
                SimulationSet::Combat,
                SimulationSet::Movement,
            )
                .chain(),
        );

        app.add_plugins((AIPlugin, CombatPlugin, MovementPlugin));
    }
}

/// Deterministic RNG resource (seeded)
///
/// Only used to hand out per-agent seeds; every state machine owns its own
/// ChaCha8Rng afterwards.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Creates a minimal Bevy App for headless simulation
///
/// Every `app.update()` advances virtual time by exactly one fixed step
/// (1/60 s), so FixedUpdate runs once per update regardless of wall clock.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(
            std::time::Duration::from_secs_f64(1.0 / 60.0),
        ))
        .add_plugins(SimulationPlugin);

    app
}

/// World snapshot for determinism comparisons
///
/// Components of type `T` ordered by entity index, serialized through Debug.
pub fn world_snapshot<T>(world: &mut World) -> Vec<u8>
where
    T: Component + std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Entity order, not archetype order
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
