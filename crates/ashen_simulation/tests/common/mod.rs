//! Test doubles for driving AIStateMachine without an App.
//!
//! `Harness` owns the machine plus scripted collaborators and hands the
//! machine an `AIServices` bundle built from them.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use ashen_simulation::ai::components::TargetActivity;
use ashen_simulation::ai::{
    AIServices, AbilityExecutor, AbilityHandle, AbilitySelector, CombatStats, EntityLookup, MoveRequest,
    MoveRequestResult, Navigation, Perception,
};
use ashen_simulation::{AIConfig, AIStateMachine, LogLevel, LogPrinter};
use bevy::prelude::*;
use rand::RngCore;

pub const DT: f32 = 1.0 / 60.0;

pub fn agent() -> Entity {
    Entity::from_raw(1)
}

pub fn player() -> Entity {
    Entity::from_raw(2)
}

// ============================================================================
// World
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct TestActor {
    pub position: Vec3,
    pub alive: bool,
    pub activity: TargetActivity,
    pub health_fraction: f32,
}

impl TestActor {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            alive: true,
            activity: TargetActivity::default(),
            health_fraction: 1.0,
        }
    }
}

/// Entity lookup + perception + stats in one table.
#[derive(Default)]
pub struct TestWorld {
    pub actors: HashMap<Entity, TestActor>,
    /// Candidates the agent currently senses
    pub visible: HashSet<Entity>,
    /// Returned by `detect_target` (if visible and within range)
    pub detectable: Option<Entity>,
}

impl TestWorld {
    pub fn actor_mut(&mut self, entity: Entity) -> &mut TestActor {
        self.actors.entry(entity).or_insert_with(|| TestActor::at(Vec3::ZERO))
    }
}

impl EntityLookup for TestWorld {
    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.actors.get(&entity).map(|actor| actor.position)
    }

    fn is_alive(&self, entity: Entity) -> bool {
        self.actors.get(&entity).is_some_and(|actor| actor.alive)
    }

    fn activity(&self, entity: Entity) -> TargetActivity {
        self.actors.get(&entity).map(|actor| actor.activity).unwrap_or_default()
    }
}

impl Perception for TestWorld {
    fn can_see_target(&self, _agent: Entity, candidate: Entity) -> bool {
        self.visible.contains(&candidate)
    }

    fn detect_target(&self, agent: Entity, sight_range: f32) -> Option<Entity> {
        let candidate = self.detectable?;
        let origin = self.position(agent)?;
        let position = self.position(candidate)?;
        (self.visible.contains(&candidate) && origin.distance(position) <= sight_range).then_some(candidate)
    }
}

impl CombatStats for TestWorld {
    fn health_fraction(&self, agent: Entity) -> Option<f32> {
        self.actors.get(&agent).map(|actor| actor.health_fraction)
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Records requests, answers with `result`.
pub struct RecordingNavigation {
    pub result: MoveRequestResult,
    pub requests: Vec<MoveRequest>,
    pub stops: usize,
    /// `is_reachable` answer
    pub reachable: bool,
}

impl Default for RecordingNavigation {
    fn default() -> Self {
        Self {
            result: MoveRequestResult::RequestSuccessful,
            requests: Vec::new(),
            stops: 0,
            reachable: true,
        }
    }
}

impl Navigation for RecordingNavigation {
    fn request_move_to(&mut self, _agent: Entity, request: MoveRequest) -> MoveRequestResult {
        self.requests.push(request);
        self.result
    }

    fn stop_movement(&mut self, _agent: Entity) {
        self.stops += 1;
    }

    fn is_reachable(&self, _agent: Entity, _point: Vec3) -> bool {
        self.reachable
    }
}

// ============================================================================
// Abilities
// ============================================================================

pub struct ScriptedAbilities {
    /// Returned by every selection
    pub selection: Option<AbilityHandle>,
    pub start_succeeds: bool,
    pub selections: usize,
    pub started: Vec<AbilityHandle>,
    pub cancelled: Vec<AbilityHandle>,
}

impl Default for ScriptedAbilities {
    fn default() -> Self {
        Self {
            selection: Some(AbilityHandle(1)),
            start_succeeds: true,
            selections: 0,
            started: Vec::new(),
            cancelled: Vec::new(),
        }
    }
}

impl AbilitySelector for ScriptedAbilities {
    fn try_select_ability(
        &mut self,
        _agent: Entity,
        _target: Entity,
        _distance: f32,
        _rng: &mut dyn RngCore,
    ) -> Option<AbilityHandle> {
        self.selections += 1;
        self.selection
    }
}

impl AbilityExecutor for ScriptedAbilities {
    fn start_ability(&mut self, _agent: Entity, handle: AbilityHandle) -> bool {
        if self.start_succeeds {
            self.started.push(handle);
        }
        self.start_succeeds
    }

    fn cancel_ability(&mut self, _agent: Entity, handle: AbilityHandle) {
        self.cancelled.push(handle);
    }
}

// ============================================================================
// Log
// ============================================================================

#[derive(Default)]
pub struct RecordingLog {
    pub lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLog {
    pub fn count(&self, level: LogLevel) -> usize {
        self.lines
            .lock()
            .map(|lines| lines.iter().filter(|(l, _)| *l == level).count())
            .unwrap_or(0)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .map(|lines| lines.iter().any(|(_, line)| line.contains(needle)))
            .unwrap_or(false)
    }
}

impl LogPrinter for RecordingLog {
    fn log(&self, level: LogLevel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub world: TestWorld,
    pub navigation: RecordingNavigation,
    pub abilities: ScriptedAbilities,
    pub log: RecordingLog,
    pub machine: AIStateMachine,
    /// Drop navigation from the bundle (missing dependency)
    pub without_navigation: bool,
}

impl Harness {
    /// Agent at the origin, player 10m away (alive, not visible yet).
    pub fn new(config: AIConfig) -> Self {
        let log = RecordingLog::default();
        let machine = AIStateMachine::new(agent(), config, Vec3::ZERO, 7, &log);

        let mut world = TestWorld::default();
        world.actors.insert(agent(), TestActor::at(Vec3::ZERO));
        world.actors.insert(player(), TestActor::at(Vec3::new(10.0, 0.0, 0.0)));

        Self {
            world,
            navigation: RecordingNavigation::default(),
            abilities: ScriptedAbilities::default(),
            log,
            machine,
            without_navigation: false,
        }
    }

    /// Runs `f` with a services bundle built from the doubles.
    pub fn with<R>(&mut self, f: impl FnOnce(&mut AIStateMachine, &mut AIServices) -> R) -> R {
        let Harness {
            world,
            navigation,
            abilities,
            log,
            machine,
            without_navigation,
        } = self;

        let navigation: Option<&mut dyn Navigation> = if *without_navigation { None } else { Some(navigation) };

        let mut services = AIServices {
            world: &*world,
            perception: Some(&*world),
            navigation,
            abilities: Some(abilities),
            stats: Some(&*world),
            log: &*log,
        };

        f(machine, &mut services)
    }

    pub fn tick(&mut self) {
        self.with(|machine, services| machine.tick(DT, services));
    }

    /// Ticks `seconds` of simulated time.
    pub fn run_for(&mut self, seconds: f32) {
        let ticks = (seconds / DT).round() as u32;
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Ticks until `done` or `max_seconds`. Returns whether `done` held.
    pub fn run_until(&mut self, max_seconds: f32, mut done: impl FnMut(&AIStateMachine) -> bool) -> bool {
        let ticks = (max_seconds / DT).round() as u32;
        for _ in 0..ticks {
            if done(&self.machine) {
                return true;
            }
            self.tick();
        }
        done(&self.machine)
    }

    /// Player visible at `position`, machine targets it.
    pub fn engage_player_at(&mut self, position: Vec3) -> bool {
        self.world.actor_mut(player()).position = position;
        self.world.visible.insert(player());
        let target = player();
        self.with(|machine, services| machine.set_target(target, services))
    }

    pub fn move_agent(&mut self, position: Vec3) {
        self.world.actor_mut(agent()).position = position;
    }
}
