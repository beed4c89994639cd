//! AI integration test
//!
//! Full headless App (SimulationPlugin): perception → AI → combat → movement.
//!
//! Checks:
//! - A boss finds, chases and kills a stationary dummy, then goes home
//! - Two NPC fight 1000 ticks without breaking invariants
//! - Stimuli, poise breaks and respawn commands reach the state machines
//! - A stagger drops the swing in progress

use bevy::prelude::*;
use ashen_simulation::ai::{AICommand, AIStateChanged, AttackStarted, Stimulus};
use ashen_simulation::*;

/// Helper: stationary target (no AI, no movement)
fn spawn_dummy(app: &mut App, position: Vec3, health: u32) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            Actor { faction_id: 1 },
            Health::new(health),
        ))
        .id()
}

/// Helper: AI fighter with one or two melee abilities
fn spawn_fighter(app: &mut App, position: Vec3, faction_id: u64, config: AIConfig) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            Actor { faction_id },
            Health::new(100),
            config,
            AbilitySet::new(vec![
                Ability::melee(1, "light", 20, 15.0),
                Ability::melee(2, "heavy", 35, 30.0),
            ]),
            MovementCommand::Idle,
        ))
        .id()
}

fn machine(app: &App, entity: Entity) -> Option<&AIStateMachine> {
    app.world().get::<AIStateMachine>(entity)
}

fn check_invariants(app: &App, entities: &[Entity], tick: usize) {
    let world = app.world();

    for &entity in entities {
        if let Some(health) = world.get::<Health>(entity) {
            assert!(
                health.current <= health.max,
                "Tick {}: {:?} health.current ({}) > health.max ({})",
                tick,
                entity,
                health.current,
                health.max
            );
        }

        if let Some(machine) = world.get::<AIStateMachine>(entity) {
            assert_eq!(
                machine.combat_sub_state() != CombatSubState::None,
                machine.current_state() == MainState::Combat,
                "Tick {}: {:?} in {:?}/{:?}",
                tick,
                entity,
                machine.current_state(),
                machine.combat_sub_state()
            );
        }
    }
}

/// Test: boss kills a dummy and returns to Idle
#[test]
fn test_boss_kills_dummy_then_goes_home() {
    let mut app = create_headless_app(42);
    let dummy = spawn_dummy(&mut app, Vec3::ZERO, 150);
    let boss = spawn_fighter(&mut app, Vec3::new(8.0, 0.0, 0.0), 2, AIConfig::boss());

    let mut saw_combat = false;
    let mut saw_attack = false;

    for tick in 0..3600 {
        app.update();
        check_invariants(&app, &[dummy, boss], tick);

        saw_combat |= machine(&app, boss).is_some_and(|m| m.current_state() == MainState::Combat);
        saw_attack |= !app.world().resource::<Events<AttackStarted>>().is_empty();

        if app.world().get::<Dead>(dummy).is_some()
            && machine(&app, boss).is_some_and(|m| m.current_state() == MainState::Idle)
        {
            break;
        }
    }

    assert!(saw_combat, "boss never engaged");
    assert!(saw_attack, "boss never attacked");
    assert!(app.world().get::<Dead>(dummy).is_some(), "dummy survived");
    assert_eq!(app.world().get::<Health>(dummy).map(|h| h.current), Some(0));

    let boss_machine = machine(&app, boss).expect("boss has a state machine");
    assert_eq!(boss_machine.current_state(), MainState::Idle);
    assert_eq!(boss_machine.target(), None);
}

/// Test: 2 NPC fight 1000 ticks without crash
#[test]
fn test_two_npcs_fight_1000_ticks() {
    let mut app = create_headless_app(7);
    let npc1 = spawn_fighter(&mut app, Vec3::new(0.0, 0.0, 0.0), 1, AIConfig::default());
    let npc2 = spawn_fighter(&mut app, Vec3::new(5.0, 0.0, 0.0), 2, AIConfig::guard());

    for tick in 0..1000 {
        app.update();
        check_invariants(&app, &[npc1, npc2], tick);
    }

    let world = app.world();
    let damaged = [npc1, npc2]
        .iter()
        .any(|&e| world.get::<Health>(e).is_some_and(|h| h.current < h.max));
    assert!(damaged, "1000 ticks of combat without a single hit");
}

/// Test: a stimulus within hearing range sends an idle agent to investigate
#[test]
fn test_stimulus_triggers_investigation() {
    let mut app = create_headless_app(3);
    let npc = spawn_fighter(&mut app, Vec3::ZERO, 2, AIConfig::default());
    let far = spawn_fighter(&mut app, Vec3::new(50.0, 0.0, 50.0), 2, AIConfig::default());

    for _ in 0..5 {
        app.update();
    }

    app.world_mut().send_event(Stimulus {
        location: Vec3::new(4.0, 0.0, 0.0),
    });
    app.update();
    app.update();

    assert_eq!(machine(&app, npc).map(|m| m.current_state()), Some(MainState::Investigating));
    assert_eq!(machine(&app, far).map(|m| m.current_state()), Some(MainState::Idle));

    // Walks over, looks around, gives up
    let mut back_home = false;
    for _ in 0..900 {
        app.update();
        if machine(&app, npc).is_some_and(|m| m.current_state() == MainState::Idle) {
            back_home = true;
            break;
        }
    }
    assert!(back_home);

    let position = app.world().get::<Transform>(npc).map(|t| t.translation);
    assert!(position.is_some_and(|p| p.distance(Vec3::new(4.0, 0.0, 0.0)) < 1.0));
}

/// Test: killed agent stays dead, respawn command brings it back
#[test]
fn test_death_and_respawn_command() {
    let mut app = create_headless_app(11);
    let npc = spawn_fighter(&mut app, Vec3::ZERO, 2, AIConfig::default());
    let attacker = spawn_dummy(&mut app, Vec3::new(30.0, 0.0, 0.0), 100);

    for _ in 0..3 {
        app.update();
    }

    app.world_mut().send_event(combat::AttackHit {
        attacker,
        target: npc,
        damage: 500,
        poise_damage: 0.0,
    });
    app.update();
    app.update();

    assert_eq!(machine(&app, npc).map(|m| m.current_state()), Some(MainState::Dead));
    assert!(app.world().get::<Dead>(npc).is_some());

    let spawn = Vec3::new(2.0, 0.0, 2.0);
    app.world_mut().send_event(AICommand::Respawn { entity: npc, location: spawn });
    app.update();

    assert_eq!(machine(&app, npc).map(|m| m.current_state()), Some(MainState::Idle));
    assert!(app.world().get::<Dead>(npc).is_none());
    assert_eq!(app.world().get::<Health>(npc).map(|h| h.current), Some(100));
    assert_eq!(machine(&app, npc).map(|m| m.spawn_location()), Some(spawn));
}

/// Test: a stagger mid-swing drops the swing before its hit lands
#[test]
fn test_poise_break_mid_swing_cancels_hit() {
    let mut app = create_headless_app(9);
    let dummy = spawn_dummy(&mut app, Vec3::ZERO, 1000);
    let fighter = spawn_fighter(&mut app, Vec3::new(1.5, 0.0, 0.0), 2, AIConfig::default());

    let mut mid_swing = false;
    for _ in 0..600 {
        app.update();
        mid_swing = app
            .world()
            .get::<AbilitySet>(fighter)
            .and_then(|set| set.active)
            .is_some_and(|active| !active.hit_applied);
        if mid_swing {
            break;
        }
    }
    assert!(mid_swing, "fighter never started a swing");

    let health_before = app.world().get::<Health>(dummy).map(|h| h.current);
    app.world_mut().send_event(combat::PoiseBroken {
        entity: fighter,
        attacker: dummy,
    });
    app.update();

    assert_eq!(machine(&app, fighter).map(|m| m.current_state()), Some(MainState::PoiseBroken));
    assert!(app.world().get::<AbilitySet>(fighter).is_some_and(|set| set.active.is_none()));
    assert!(app.world().get::<ActorActivity>(fighter).is_some_and(|a| !a.attacking));

    // Well past the dropped swing's hit time, still staggered
    for _ in 0..60 {
        app.update();
    }

    assert_eq!(app.world().get::<Health>(dummy).map(|h| h.current), health_before);
    assert_eq!(machine(&app, fighter).map(|m| m.current_state()), Some(MainState::PoiseBroken));
}

/// Test: state changes are re-published as Bevy events
#[test]
fn test_state_changes_published_as_events() {
    let mut app = create_headless_app(5);
    let dummy = spawn_dummy(&mut app, Vec3::ZERO, 1000);
    let npc = spawn_fighter(&mut app, Vec3::new(6.0, 0.0, 0.0), 2, AIConfig::default());

    let mut entered_combat = false;
    for _ in 0..120 {
        app.update();
        let events = app.world().resource::<Events<AIStateChanged>>();
        let mut cursor = events.get_cursor();
        entered_combat |= cursor
            .read(events)
            .any(|e| e.entity == npc && e.old == MainState::Idle && e.new == MainState::Combat);
        if entered_combat {
            break;
        }
    }

    assert!(entered_combat);
    assert_eq!(machine(&app, npc).and_then(|m| m.target()), Some(dummy));
}
