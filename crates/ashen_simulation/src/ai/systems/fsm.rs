//! FSM AI systems: state machine setup, signal routing, ticking, notifications.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::components::{
    AIConfig, AIInbox, AINotification, AISignal, BossThresholdOverride, PatrolPath, SpottedEnemies,
};
use crate::ai::events::{
    AICombatSubStateChanged, AICommand, AIStateChanged, AttackEnded, AttackStarted, BossPhaseChanged, Stimulus,
};
use crate::ai::services::AIServices;
use crate::ai::state_machine::AIStateMachine;
use crate::combat::{AbilityExecutionComplete, AbilitySet, Dead, EntityDied, PoiseBroken};
use crate::components::{Health, Poise, WalkableArea};
use crate::logger::GlobalLogPrinter;
use crate::movement::MoveCompleted;
use crate::DeterministicRng;

use super::services::{ActorLookup, ActorView, AbilitySetAbilities, CommandNavigation, MoverView, SpottedPerception};

/// System: attach an AIStateMachine to every new AIConfig entity
///
/// Seed is drawn from DeterministicRng (spawn order → same seeds every run).
/// Spawn location = current translation.
pub fn init_ai_agents(
    mut commands: Commands,
    new_agents: Query<
        (Entity, &AIConfig, &Transform, Option<&PatrolPath>, Option<&BossThresholdOverride>),
        Without<AIStateMachine>,
    >,
    mut rng: ResMut<DeterministicRng>,
) {
    for (entity, config, transform, patrol, thresholds) in new_agents.iter() {
        let seed = rng.rng.gen::<u64>();
        let mut machine = AIStateMachine::new(entity, config.clone(), transform.translation, seed, &GlobalLogPrinter);

        if let Some(patrol) = patrol {
            machine.set_patrol_path(patrol.points.clone());
        }

        if let Some(BossThresholdOverride(thresholds)) = thresholds {
            machine.apply_boss_overrides(*thresholds, &GlobalLogPrinter);
        }

        crate::logger::log(&format!(
            "AI: {:?} initialized (boss: {}, patrol points: {})",
            entity,
            config.is_boss,
            patrol.map(|p| p.points.len()).unwrap_or(0)
        ));

        commands
            .entity(entity)
            .insert((machine, AIInbox::default()))
            .insert_if_new(SpottedEnemies::default());
    }
}

/// System: route engine events into agent inboxes
///
/// Order inside one frame: move completions, ability completions, stimuli,
/// commands, poise breaks, deaths. Death last so nothing revives a corpse
/// within the same frame.
pub fn route_ai_signals(
    mut agents: Query<(&mut AIInbox, &AIConfig, &Transform)>,
    mut move_completed: EventReader<MoveCompleted>,
    mut ability_completed: EventReader<AbilityExecutionComplete>,
    mut stimuli: EventReader<Stimulus>,
    mut ai_commands: EventReader<AICommand>,
    mut poise_broken: EventReader<PoiseBroken>,
    mut deaths: EventReader<EntityDied>,
) {
    for event in move_completed.read() {
        if let Ok((mut inbox, _, _)) = agents.get_mut(event.entity) {
            inbox.push(AISignal::MoveCompleted(event.outcome));
        }
    }

    for event in ability_completed.read() {
        if let Ok((mut inbox, _, _)) = agents.get_mut(event.entity) {
            inbox.push(AISignal::AbilityExecutionComplete);
        }
    }

    for stimulus in stimuli.read() {
        for (mut inbox, config, transform) in agents.iter_mut() {
            if transform.translation.distance(stimulus.location) <= config.hearing_range {
                inbox.push(AISignal::Stimulus(stimulus.location));
            }
        }
    }

    for command in ai_commands.read() {
        let (entity, signal) = match *command {
            AICommand::BeginSpecialMove { entity } => (entity, AISignal::BeginSpecialMove),
            AICommand::SpecialMoveComplete { entity } => (entity, AISignal::SpecialMoveComplete),
            AICommand::Respawn { entity, location } => (entity, AISignal::Respawn(location)),
        };
        if let Ok((mut inbox, _, _)) = agents.get_mut(entity) {
            inbox.push(signal);
        }
    }

    for event in poise_broken.read() {
        if let Ok((mut inbox, _, _)) = agents.get_mut(event.entity) {
            inbox.push(AISignal::PoiseBroken);
        }
    }

    for event in deaths.read() {
        if let Ok((mut inbox, _, _)) = agents.get_mut(event.entity) {
            inbox.push(AISignal::Died);
        }
    }
}

/// System: restore body state of respawned actors
///
/// Full health/poise, Dead marker removed, teleported to the respawn point.
/// The state machine side is handled by `AISignal::Respawn`.
pub fn restore_respawned_actors(
    mut commands: Commands,
    mut ai_commands: EventReader<AICommand>,
    mut bodies: Query<(&mut Health, &mut Transform, Option<&mut Poise>)>,
) {
    for command in ai_commands.read() {
        let AICommand::Respawn { entity, location } = *command else {
            continue;
        };

        let Ok((mut health, mut transform, poise)) = bodies.get_mut(entity) else {
            continue;
        };

        let missing = health.max - health.current;
        health.heal(missing);
        transform.translation = location;
        if let Some(mut poise) = poise {
            poise.current = poise.max;
            poise.time_since_hit = 0.0;
        }
        commands.entity(entity).remove::<Dead>();
    }
}

/// System: apply inbox signals, then tick every state machine
///
/// Collaborators are rebuilt per agent on top of this system's queries:
/// SpottedEnemies (perception), MovementCommand (navigation),
/// AbilitySet (abilities), Health (stats).
pub fn tick_ai_state_machines(
    mut agents: Query<(&mut AIStateMachine, &mut AIInbox)>,
    actors: Query<ActorView>,
    spotted: Query<&'static SpottedEnemies>,
    mut movers: Query<MoverView>,
    mut ability_sets: Query<&'static mut AbilitySet>,
    area: Option<Res<WalkableArea>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let lookup = ActorLookup { actors: &actors };
    let perception = SpottedPerception {
        spotted: &spotted,
        actors: &actors,
    };

    for (mut machine, mut inbox) in agents.iter_mut() {
        let mut navigation = CommandNavigation {
            movers: &mut movers,
            actors: &actors,
            area: area.as_deref(),
        };
        let mut abilities = AbilitySetAbilities { sets: &mut ability_sets };

        let mut services = AIServices {
            world: &lookup,
            perception: Some(&perception),
            navigation: Some(&mut navigation),
            abilities: Some(&mut abilities),
            stats: Some(&lookup),
            log: &GlobalLogPrinter,
        };

        if !inbox.signals.is_empty() {
            for signal in std::mem::take(&mut inbox.signals) {
                apply_signal(&mut machine, signal, &mut services);
            }
        }

        machine.tick(delta, &mut services);
    }
}

fn apply_signal(machine: &mut AIStateMachine, signal: AISignal, services: &mut AIServices) {
    match signal {
        AISignal::MoveCompleted(outcome) => machine.on_move_completed(outcome),
        AISignal::AbilityExecutionComplete => machine.on_ability_execution_complete(),
        AISignal::PoiseBroken => {
            machine.trigger_poise_broken(services);
        }
        AISignal::Died => machine.on_death(services),
        AISignal::Stimulus(location) => {
            machine.on_stimulus(location, services);
        }
        AISignal::BeginSpecialMove => {
            machine.begin_special_move(services);
        }
        AISignal::SpecialMoveComplete => machine.on_special_move_complete(services),
        AISignal::Respawn(location) => {
            machine.reset_from_death(location, services);
        }
    }
}

/// System: re-publish state machine notifications as Bevy events
pub fn publish_ai_notifications(
    mut agents: Query<(Entity, &mut AIStateMachine)>,
    mut state_changed: EventWriter<AIStateChanged>,
    mut sub_state_changed: EventWriter<AICombatSubStateChanged>,
    mut phase_changed: EventWriter<BossPhaseChanged>,
    mut attack_started: EventWriter<AttackStarted>,
    mut attack_ended: EventWriter<AttackEnded>,
) {
    for (entity, mut machine) in agents.iter_mut() {
        if machine.notifications().is_empty() {
            continue;
        }

        for notification in machine.drain_notifications() {
            match notification {
                AINotification::StateChanged { old, new } => {
                    state_changed.write(AIStateChanged { entity, old, new });
                }
                AINotification::CombatSubStateChanged { old, new } => {
                    sub_state_changed.write(AICombatSubStateChanged { entity, old, new });
                }
                AINotification::BossPhaseChanged { old, new } => {
                    phase_changed.write(BossPhaseChanged { entity, old, new });
                }
                AINotification::AttackStarted => {
                    attack_started.write(AttackStarted { entity });
                }
                AINotification::AttackEnded => {
                    attack_ended.write(AttackEnded { entity });
                }
            }
        }
    }
}
