//! Determinism tests
//!
//! Same seed + same spawn order → identical state sequences, positions and
//! health, run after run.

use bevy::prelude::*;
use ashen_simulation::ai::AIStateChanged;
use ashen_simulation::*;

#[derive(Debug, PartialEq)]
struct RunResult {
    transitions: Vec<(u32, MainState, MainState)>,
    transforms: Vec<u8>,
    health: Vec<u8>,
}

fn run_encounter(seed: u64, ticks: usize) -> RunResult {
    let mut app = create_headless_app(seed);

    for (i, faction) in [1u64, 2, 1, 2].into_iter().enumerate() {
        let config = if i == 3 { AIConfig::boss() } else { AIConfig::default() };
        app.world_mut()
            .spawn((
                Transform::from_translation(Vec3::new(i as f32 * 3.0, 0.0, (i % 2) as f32 * 2.0)),
                Actor { faction_id: faction },
                Health::new(150),
                config,
                AbilitySet::new(vec![
                    Ability::melee(1, "light", 10, 10.0),
                    Ability::melee(2, "heavy", 25, 25.0),
                ]),
                MovementCommand::Idle,
            ));
    }

    let mut transitions = Vec::new();
    for _ in 0..ticks {
        app.update();

        // Events live two frames: only take the ones written this frame
        let events = app.world().resource::<Events<AIStateChanged>>();
        for event in events.iter_current_update_events() {
            transitions.push((event.entity.index(), event.old, event.new));
        }
    }

    let world = app.world_mut();
    RunResult {
        transitions,
        transforms: world_snapshot::<Transform>(world),
        health: world_snapshot::<Health>(world),
    }
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICKS: usize = 600;

    let run1 = run_encounter(SEED, TICKS);
    let run2 = run_encounter(SEED, TICKS);

    assert!(!run1.transitions.is_empty(), "nothing happened in {} ticks", TICKS);
    assert_eq!(run1, run2, "same seed ({}) produced different runs", SEED);
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const TICKS: usize = 300;

    let runs: Vec<_> = (0..3).map(|_| run_encounter(SEED, TICKS)).collect();

    for (i, run) in runs.iter().enumerate().skip(1) {
        assert_eq!(runs[0], *run, "run {} differs from run 0", i);
    }
}
