//! Headless ASHEN encounter
//!
//! A boss and a patrolling guard against a stationary dummy, no rendering.
//! Prints the state machines every second of simulated time.

use bevy::prelude::*;
use ashen_simulation::ai::systems::services::WorldLookup;
use ashen_simulation::*;

const TICKS: u32 = 1800;

fn main() {
    let seed = 42;
    println!("Starting ASHEN headless encounter (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.insert_resource(WalkableArea::default());

    let dummy = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(0.0, 0.0, 0.0)),
            Actor { faction_id: 1 },
            Health::new(1000),
        ))
        .id();

    let boss = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(8.0, 0.0, 0.0)),
            Actor { faction_id: 2 },
            Health::new(400),
            AIConfig::boss(),
            AbilitySet::new(vec![
                Ability::melee(1, "sweep", 25, 20.0),
                Ability::melee(2, "slam", 45, 40.0),
            ]),
            MovementCommand::Idle,
        ))
        .id();

    let guard = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(-30.0, 0.0, -30.0)),
            Actor { faction_id: 2 },
            Health::new(120),
            AIConfig::guard(),
            PatrolPath {
                points: vec![
                    Vec3::new(-30.0, 0.0, -30.0),
                    Vec3::new(-20.0, 0.0, -30.0),
                    Vec3::new(-20.0, 0.0, -20.0),
                ],
            },
            AbilitySet::new(vec![Ability::melee(1, "slash", 15, 15.0)]),
            MovementCommand::Idle,
        ))
        .id();

    for tick in 0..TICKS {
        app.update();

        if tick % 60 == 0 {
            let world = app.world();
            let lookup = WorldLookup { world };
            for (name, entity) in [("boss", boss), ("guard", guard)] {
                if let Some(machine) = world.get::<AIStateMachine>(entity) {
                    println!("t={:>4} {:<5} {}", tick, name, machine.debug_string(&lookup));
                }
            }
            if let Some(health) = world.get::<Health>(dummy) {
                println!("t={:>4} dummy health {}/{}", tick, health.current, health.max);
            }
        }
    }

    println!("Encounter complete!");
}
