//! AIStateMachine: hierarchical FSM of one agent (core, engine independent).
//!
//! Main state → combat sub-state → boss phase. Ticked once per simulation
//! step with an `AIServices` bundle; external signals (move/ability
//! completion, poise break, death, stimuli) arrive through methods.
//!
//! Handlers live in sibling modules:
//! - `combat.rs` — combat sub-states
//! - `boss.rs` — boss phases, enrage
//! - `roaming.rs` — idle/patrol/roam/investigate/out-of-bounds
//!
//! Transition rules:
//! - A state entered during a tick is dispatched on the next tick
//!   (`set_target` is the only synchronous Idle → Combat path).
//! - `Dead` is terminal, only `reset_from_death` leaves it.
//! - Every change pushes an `AINotification` into the outbox.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::ai::components::{
    AIConfig, AINotification, BossPhase, CombatSubState, MainState, TargetActivity,
};
use crate::ai::services::{
    AIServices, AbilityHandle, EntityLookup, MoveGoal, MoveOutcome, MoveRequest, MoveRequestResult,
};
use crate::logger::{LogLevel, LogPrinter};

/// Consecutive navigation failures tolerated before a state degrades.
pub const MAX_NAVIGATION_FAILURES: u32 = 3;

/// Distance at which "move back to spawn" counts as arrived (meters)
pub(super) const HOME_ACCEPTANCE_RADIUS: f32 = 1.0;

/// Timers of the machine (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct AITimers {
    pub time_in_current_state: f32,
    pub time_in_combat_sub_state: f32,
    pub time_since_last_attack: f32,
    /// Randomized per attack cycle, in [min_attack_delay, max_attack_delay]
    pub next_attack_delay: f32,
    pub time_since_last_reposition: f32,
}

/// Hierarchical AI state machine of one agent.
///
/// Owns its config copy and a per-agent RNG. Never owns collaborators:
/// they are borrowed per call through `AIServices`.
#[derive(Component, Debug, Clone)]
pub struct AIStateMachine {
    pub(super) agent: Entity,

    /// Active config (boss overrides + enrage adjustment applied)
    pub(super) config: AIConfig,
    /// Config restored on `reset_encounter`/`reset_from_death`
    pub(super) base_config: AIConfig,

    pub(super) current_state: MainState,
    pub(super) previous_state: MainState,
    pub(super) combat_sub_state: CombatSubState,
    pub(super) boss_phase: BossPhase,
    pub(super) boss_overrides_applied: bool,

    pub(super) target: Option<Entity>,
    pub(super) last_known_target_location: Option<Vec3>,
    pub(super) time_target_unseen: f32,

    pub(super) timers: AITimers,

    // === Movement ===
    pub(super) spawn_location: Vec3,
    pub(super) patrol_path: Vec<Vec3>,
    pub(super) patrol_index: usize,
    pub(super) roam_point: Option<Vec3>,
    pub(super) roam_point_elapsed: f32,
    pub(super) investigate_location: Option<Vec3>,
    pub(super) investigate_return_state: MainState,
    pub(super) investigate_arrived_elapsed: Option<f32>,
    pub(super) pending_move: Option<MoveRequest>,
    /// Completion latched by `on_move_completed`, consumed by the next tick
    pub(super) move_outcome: Option<MoveOutcome>,
    pub(super) navigation_failures: u32,
    pub(super) perception_poll_elapsed: f32,

    // === Combat ===
    pub(super) pending_ability: Option<AbilityHandle>,
    pub(super) ability_completed: bool,
    pub(super) combo_count: u32,
    pub(super) combo_pending: bool,
    pub(super) strafe_clockwise: bool,
    pub(super) strafe_change_elapsed: f32,
    pub(super) strafe_goal_elapsed: f32,
    pub(super) punish_cooldown_remaining: f32,
    pub(super) wind_up_extended: bool,
    pub(super) input_read_done: bool,
    pub(super) retreat_then_engage: bool,

    pub(super) dependency_warning_logged: bool,
    pub(super) rng: ChaCha8Rng,
    pub(super) outbox: Vec<AINotification>,
}

impl AIStateMachine {
    /// Creates the machine in `Idle` with no target.
    ///
    /// The config is sanitized first, every adjustment is logged as a warning.
    pub fn new(agent: Entity, config: AIConfig, spawn_location: Vec3, seed: u64, log: &dyn LogPrinter) -> Self {
        let (config, adjustments) = config.sanitized();
        for adjustment in &adjustments {
            log.log(
                LogLevel::Warning,
                &format!(
                    "AI {:?}: config {} = {} is invalid, using {}",
                    agent, adjustment.field, adjustment.from, adjustment.to
                ),
            );
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let next_attack_delay = roll_attack_delay(&mut rng, &config);
        let boss_phase = if config.is_boss { BossPhase::Phase1 } else { BossPhase::NotBoss };

        Self {
            agent,
            base_config: config.clone(),
            config,
            current_state: MainState::Idle,
            previous_state: MainState::Idle,
            combat_sub_state: CombatSubState::None,
            boss_phase,
            boss_overrides_applied: false,
            target: None,
            last_known_target_location: None,
            time_target_unseen: 0.0,
            timers: AITimers { next_attack_delay, ..AITimers::default() },
            spawn_location,
            patrol_path: Vec::new(),
            patrol_index: 0,
            roam_point: None,
            roam_point_elapsed: 0.0,
            investigate_location: None,
            investigate_return_state: MainState::Idle,
            investigate_arrived_elapsed: None,
            pending_move: None,
            move_outcome: None,
            navigation_failures: 0,
            perception_poll_elapsed: 0.0,
            pending_ability: None,
            ability_completed: false,
            combo_count: 0,
            combo_pending: false,
            strafe_clockwise: true,
            strafe_change_elapsed: 0.0,
            strafe_goal_elapsed: 0.0,
            punish_cooldown_remaining: 0.0,
            wind_up_extended: false,
            input_read_done: false,
            retreat_then_engage: false,
            dependency_warning_logged: false,
            rng,
            outbox: Vec::new(),
        }
    }

    /// Builder: assigns a looping patrol path (empty = no patrol).
    pub fn with_patrol_path(mut self, points: Vec<Vec3>) -> Self {
        self.patrol_path = points;
        self.patrol_index = 0;
        self
    }

    pub fn set_patrol_path(&mut self, points: Vec<Vec3>) {
        self.patrol_path = points;
        self.patrol_index = 0;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn agent(&self) -> Entity {
        self.agent
    }

    pub fn current_state(&self) -> MainState {
        self.current_state
    }

    pub fn previous_state(&self) -> MainState {
        self.previous_state
    }

    pub fn combat_sub_state(&self) -> CombatSubState {
        self.combat_sub_state
    }

    pub fn boss_phase(&self) -> BossPhase {
        self.boss_phase
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn timers(&self) -> &AITimers {
        &self.timers
    }

    pub fn config(&self) -> &AIConfig {
        &self.config
    }

    pub fn spawn_location(&self) -> Vec3 {
        self.spawn_location
    }

    pub fn last_known_target_location(&self) -> Option<Vec3> {
        self.last_known_target_location
    }

    pub fn patrol_index(&self) -> usize {
        self.patrol_index
    }

    pub fn pending_move(&self) -> Option<MoveRequest> {
        self.pending_move
    }

    pub fn pending_ability(&self) -> Option<AbilityHandle> {
        self.pending_ability
    }

    pub fn navigation_failures(&self) -> u32 {
        self.navigation_failures
    }

    /// Notifications emitted since the last drain.
    pub fn notifications(&self) -> &[AINotification] {
        &self.outbox
    }

    pub fn drain_notifications(&mut self) -> Vec<AINotification> {
        std::mem::take(&mut self.outbox)
    }

    /// Patrol if a path is configured, else Idle.
    pub fn home_state(&self) -> MainState {
        if self.patrol_path.is_empty() {
            MainState::Idle
        } else {
            MainState::Patrol
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances timers and runs the handler of the current state.
    ///
    /// No-op when dead or when a required collaborator is missing.
    pub fn tick(&mut self, delta: f32, services: &mut AIServices) {
        if self.current_state == MainState::Dead {
            return;
        }

        let Some(agent_position) = self.check_dependencies(services) else {
            return;
        };

        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };

        self.timers.time_in_current_state += delta;
        if self.current_state == MainState::Combat {
            self.timers.time_in_combat_sub_state += delta;
        }
        self.timers.time_since_last_attack += delta;
        self.timers.time_since_last_reposition += delta;
        self.punish_cooldown_remaining = (self.punish_cooldown_remaining - delta).max(0.0);

        if self.config.is_boss {
            self.check_boss_phase_transition(services);
        }

        match self.current_state {
            MainState::Idle => self.tick_idle(delta, services),
            MainState::Patrol => self.tick_patrol(delta, agent_position, services),
            MainState::RandomRoam => self.tick_random_roam(delta, agent_position, services),
            MainState::Investigating => self.tick_investigating(delta, agent_position, services),
            MainState::Combat => self.tick_combat(delta, agent_position, services),
            MainState::PoiseBroken => self.tick_poise_broken(services),
            MainState::Uninterruptable => self.tick_uninterruptable(services),
            MainState::OutOfBounds => self.tick_out_of_bounds(agent_position, services),
            MainState::Dead => {}
        }
    }

    /// Agent position if every required collaborator is present.
    ///
    /// Warns once per outage.
    fn check_dependencies(&mut self, services: &AIServices) -> Option<Vec3> {
        let position = services.world.position(self.agent);
        let missing = services
            .missing_dependency()
            .or_else(|| position.is_none().then_some("agent position"));

        match missing {
            Some(name) => {
                if !self.dependency_warning_logged {
                    self.dependency_warning_logged = true;
                    self.log(services, LogLevel::Warning, &format!("missing {}, tick skipped", name));
                }
                None
            }
            None => {
                if self.dependency_warning_logged {
                    self.dependency_warning_logged = false;
                    self.log(services, LogLevel::Info, "dependencies restored");
                }
                position
            }
        }
    }

    // ========================================================================
    // Main state transitions
    // ========================================================================

    /// Switches main state (exit hook → entry hook → notification).
    ///
    /// Notifications raised by the entry hook (e.g. `None → Engaging`) are
    /// queued before the `StateChanged` of the switch itself.
    ///
    /// No-op if equal. Leaving `Dead` is refused.
    pub fn set_state(&mut self, new_state: MainState, services: &mut AIServices) {
        if new_state == self.current_state {
            return;
        }

        if self.current_state == MainState::Dead {
            self.log(services, LogLevel::Debug, &format!("refused {:?} while dead", new_state));
            return;
        }

        let old_state = self.current_state;
        self.exit_state(old_state, services);

        self.previous_state = old_state;
        self.current_state = new_state;
        self.timers.time_in_current_state = 0.0;

        self.enter_state(new_state, services);

        self.outbox.push(AINotification::StateChanged { old: old_state, new: new_state });
        self.log(services, LogLevel::Info, &format!("{:?} → {:?}", old_state, new_state));
    }

    fn exit_state(&mut self, state: MainState, services: &mut AIServices) {
        match state {
            MainState::Combat => {
                self.change_combat_sub_state(CombatSubState::None, services);
                self.combo_count = 0;
                self.combo_pending = false;
                self.retreat_then_engage = false;
            }
            MainState::Investigating => {
                self.investigate_arrived_elapsed = None;
            }
            MainState::RandomRoam => {
                self.roam_point = None;
            }
            _ => {}
        }

        self.clear_pending_move(services);
        self.navigation_failures = 0;
    }

    fn enter_state(&mut self, state: MainState, services: &mut AIServices) {
        match state {
            MainState::Idle => {
                self.stop_movement(services);
                self.perception_poll_elapsed = self.config.perception_poll_interval;
            }
            MainState::Patrol | MainState::RandomRoam => {
                self.perception_poll_elapsed = self.config.perception_poll_interval;
                self.roam_point = None;
            }
            MainState::Investigating => {
                self.investigate_arrived_elapsed = None;
                // Resuming after a stagger keeps the original return state
                if self.previous_state != MainState::PoiseBroken {
                    self.investigate_return_state = if self.previous_state.is_passive()
                        && self.previous_state != MainState::Investigating
                    {
                        self.previous_state
                    } else {
                        self.home_state()
                    };
                }
                self.perception_poll_elapsed = self.config.perception_poll_interval;
            }
            MainState::Combat => {
                self.time_target_unseen = 0.0;
                self.combo_count = 0;
                self.strafe_clockwise = self.roll_strafe_direction();
                self.strafe_change_elapsed = 0.0;
                self.change_combat_sub_state(CombatSubState::Engaging, services);
            }
            MainState::PoiseBroken => {
                self.stop_movement(services);
            }
            MainState::Uninterruptable => {}
            MainState::OutOfBounds => {
                self.target = None;
                self.last_known_target_location = None;
                self.time_target_unseen = 0.0;
                self.stop_movement(services);
            }
            MainState::Dead => {
                self.stop_movement(services);
                self.target = None;
                self.last_known_target_location = None;
                self.investigate_location = None;
                self.pending_ability = None;
                self.ability_completed = false;
                self.time_target_unseen = 0.0;
                self.timers = AITimers::default();
            }
        }
    }

    // ========================================================================
    // Combat sub-state transitions
    // ========================================================================

    /// Switches combat sub-state. Only valid in `Combat` and never to `None`.
    pub fn set_combat_sub_state(&mut self, new_sub_state: CombatSubState, services: &mut AIServices) -> bool {
        if self.current_state != MainState::Combat || new_sub_state == CombatSubState::None {
            return false;
        }

        self.change_combat_sub_state(new_sub_state, services);
        true
    }

    pub(super) fn change_combat_sub_state(&mut self, new_sub_state: CombatSubState, services: &mut AIServices) {
        let old_sub_state = self.combat_sub_state;
        if old_sub_state == new_sub_state {
            return;
        }

        // Interrupted mid-swing: the executor drops the swing, listeners
        // still get the end of the attack
        if old_sub_state == CombatSubState::Attacking && new_sub_state != CombatSubState::Recovering {
            if let Some(handle) = self.pending_ability {
                if let Some(abilities) = services.abilities.as_deref_mut() {
                    abilities.cancel_ability(self.agent, handle);
                }
                self.outbox.push(AINotification::AttackEnded);
                self.log(services, LogLevel::Debug, &format!("attack {:?} cancelled", handle));
            }
        }

        if !matches!(new_sub_state, CombatSubState::WindingUp | CombatSubState::Attacking) {
            self.pending_ability = None;
            self.ability_completed = false;
        }

        self.clear_pending_move(services);
        self.navigation_failures = 0;

        self.combat_sub_state = new_sub_state;
        self.timers.time_in_combat_sub_state = 0.0;
        self.outbox.push(AINotification::CombatSubStateChanged {
            old: old_sub_state,
            new: new_sub_state,
        });
        self.log(services, LogLevel::Debug, &format!("combat {:?} → {:?}", old_sub_state, new_sub_state));

        match new_sub_state {
            CombatSubState::Positioning => {
                self.strafe_goal_elapsed = super::combat::STRAFE_GOAL_REFRESH;
            }
            CombatSubState::WindingUp => {
                self.wind_up_extended = false;
                self.input_read_done = false;
                self.stop_movement(services);
            }
            CombatSubState::Blocking => {
                self.stop_movement(services);
            }
            _ => {}
        }
    }

    // ========================================================================
    // Target
    // ========================================================================

    /// Records a combat target and, unless busy, enters `Combat/Engaging`.
    ///
    /// Rejects the agent itself and dead/unknown entities.
    pub fn set_target(&mut self, actor: Entity, services: &mut AIServices) -> bool {
        if self.current_state == MainState::Dead {
            return false;
        }

        if actor == self.agent || !services.world.is_alive(actor) {
            self.log(services, LogLevel::Debug, &format!("rejected target {:?}", actor));
            return false;
        }

        if self.target != Some(actor) {
            self.log(services, LogLevel::Info, &format!("target acquired {:?}", actor));
        }

        self.target = Some(actor);
        self.time_target_unseen = 0.0;
        self.last_known_target_location = services.world.position(actor);

        if !matches!(
            self.current_state,
            MainState::Combat | MainState::PoiseBroken | MainState::Uninterruptable | MainState::Dead
        ) {
            self.set_state(MainState::Combat, services);
        }

        true
    }

    /// Forgets the target. In `Combat` returns home (Patrol or Idle).
    pub fn clear_target(&mut self, services: &mut AIServices) {
        self.target = None;
        self.time_target_unseen = 0.0;

        if self.current_state == MainState::Combat {
            self.last_known_target_location = None;
            let home = self.home_state();
            self.set_state(home, services);
        }
    }

    /// Target gone: investigate the last known location if allowed, else go home.
    pub(super) fn lose_target(&mut self, investigate: bool, services: &mut AIServices) {
        self.log(services, LogLevel::Info, &format!("lost target {:?}", self.target));
        self.target = None;
        self.time_target_unseen = 0.0;

        match self.last_known_target_location.take() {
            Some(location) if investigate => {
                self.investigate_location = Some(location);
                self.set_state(MainState::Investigating, services);
            }
            _ => {
                let home = self.home_state();
                self.set_state(home, services);
            }
        }
    }

    /// Target alive and resolvable.
    pub(super) fn target_position(&self, world: &dyn EntityLookup) -> Option<(Entity, Vec3)> {
        let target = self.target?;
        if !world.is_alive(target) {
            return None;
        }
        world.position(target).map(|position| (target, position))
    }

    pub(super) fn target_activity(&self, world: &dyn EntityLookup) -> TargetActivity {
        self.target.map(|target| world.activity(target)).unwrap_or_default()
    }

    pub(super) fn within_leash(&self, point: Vec3) -> bool {
        point.distance(self.spawn_location) <= self.config.max_chase_distance
    }

    /// Asks perception for a target every poll interval. `true` = entered Combat.
    pub(super) fn poll_perception(&mut self, delta: f32, services: &mut AIServices) -> bool {
        self.perception_poll_elapsed += delta;
        if self.perception_poll_elapsed < self.config.perception_poll_interval {
            return false;
        }
        self.perception_poll_elapsed = 0.0;

        let Some(perception) = services.perception else {
            return false;
        };
        let Some(candidate) = perception.detect_target(self.agent, self.config.sight_range) else {
            return false;
        };

        // Never acquire something we would immediately leash away from
        match services.world.position(candidate) {
            Some(position) if self.within_leash(position) => self.set_target(candidate, services),
            _ => false,
        }
    }

    // ========================================================================
    // External signals
    // ========================================================================

    /// Stagger. Suppressed while `Uninterruptable` or `Dead`.
    ///
    /// Re-triggering while already staggered restarts the countdown.
    pub fn trigger_poise_broken(&mut self, services: &mut AIServices) -> bool {
        match self.current_state {
            MainState::Uninterruptable | MainState::Dead => {
                self.log(services, LogLevel::Debug, "poise break suppressed");
                false
            }
            MainState::PoiseBroken => {
                self.timers.time_in_current_state = 0.0;
                true
            }
            _ => {
                self.set_state(MainState::PoiseBroken, services);
                true
            }
        }
    }

    /// Unconditional, also from `Uninterruptable`.
    pub fn on_death(&mut self, services: &mut AIServices) {
        if self.current_state == MainState::Dead {
            return;
        }
        self.set_state(MainState::Dead, services);
    }

    /// Completion of the pending move request. Stale completions are ignored.
    pub fn on_move_completed(&mut self, outcome: MoveOutcome) {
        if self.pending_move.take().is_some() {
            self.move_outcome = Some(outcome);
        }
    }

    /// Completion of the pending ability. Handled on the next tick.
    pub fn on_ability_execution_complete(&mut self) {
        if self.combat_sub_state == CombatSubState::Attacking && self.pending_ability.is_some() {
            self.ability_completed = true;
        }
    }

    /// Heard noise / alert. Ignored while busy or when outside the leash.
    pub fn on_stimulus(&mut self, location: Vec3, services: &mut AIServices) -> bool {
        if !self.current_state.is_passive() {
            return false;
        }

        if !self.within_leash(location) {
            self.log(services, LogLevel::Debug, &format!("stimulus at {:?} outside leash", location));
            return false;
        }

        self.investigate_location = Some(location);

        if self.current_state == MainState::Investigating {
            self.clear_pending_move(services);
            self.investigate_arrived_elapsed = None;
            self.timers.time_in_current_state = 0.0;
        } else {
            self.set_state(MainState::Investigating, services);
        }

        true
    }

    /// Enters `Uninterruptable` (special move / boss transition animation).
    pub fn begin_special_move(&mut self, services: &mut AIServices) -> bool {
        if matches!(self.current_state, MainState::Dead | MainState::Uninterruptable) {
            return false;
        }
        self.set_state(MainState::Uninterruptable, services);
        true
    }

    pub fn on_special_move_complete(&mut self, services: &mut AIServices) {
        if self.current_state == MainState::Uninterruptable {
            self.finish_special_move(services);
        }
    }

    pub(super) fn finish_special_move(&mut self, services: &mut AIServices) {
        if self.target_position(services.world).is_some() {
            self.set_state(MainState::Combat, services);
        } else {
            self.target = None;
            self.set_state(MainState::Idle, services);
        }
    }

    /// Only exit from `Dead`: back to `Idle` at `spawn_location` with the base config.
    pub fn reset_from_death(&mut self, spawn_location: Vec3, services: &mut AIServices) -> bool {
        if self.current_state != MainState::Dead {
            return false;
        }

        self.config = self.base_config.clone();
        self.spawn_location = spawn_location;
        self.patrol_index = 0;
        self.combo_count = 0;
        self.navigation_failures = 0;
        self.punish_cooldown_remaining = 0.0;
        self.timers = AITimers {
            next_attack_delay: roll_attack_delay(&mut self.rng, &self.config),
            ..AITimers::default()
        };

        let boss_phase = if self.config.is_boss { BossPhase::Phase1 } else { BossPhase::NotBoss };
        if boss_phase != self.boss_phase {
            self.outbox.push(AINotification::BossPhaseChanged { old: self.boss_phase, new: boss_phase });
            self.boss_phase = boss_phase;
        }

        self.previous_state = MainState::Dead;
        self.current_state = MainState::Idle;
        self.enter_state(MainState::Idle, services);
        self.outbox.push(AINotification::StateChanged { old: MainState::Dead, new: MainState::Idle });
        self.log(services, LogLevel::Info, &format!("respawned at {:?}", spawn_location));
        true
    }

    // ========================================================================
    // Navigation helpers
    // ========================================================================

    /// Issues a move request, replacing any pending one.
    pub(super) fn request_move(
        &mut self,
        goal: MoveGoal,
        acceptance_radius: f32,
        speed: f32,
        services: &mut AIServices,
    ) -> MoveRequestResult {
        self.pending_move = None;
        self.move_outcome = None;

        let request = MoveRequest { goal, acceptance_radius, speed };
        let result = match services.navigation.as_deref_mut() {
            Some(navigation) => navigation.request_move_to(self.agent, request),
            None => MoveRequestResult::Failed,
        };

        match result {
            MoveRequestResult::RequestSuccessful => self.pending_move = Some(request),
            MoveRequestResult::AlreadyAtGoal => self.navigation_failures = 0,
            MoveRequestResult::Failed => {
                self.navigation_failures += 1;
                self.log(
                    services,
                    LogLevel::Warning,
                    &format!("move to {:?} failed ({}/{})", goal, self.navigation_failures, MAX_NAVIGATION_FAILURES),
                );
            }
        }

        result
    }

    /// Consumes a latched move completion, counting failures.
    pub(super) fn take_move_outcome(&mut self, services: &AIServices) -> Option<MoveOutcome> {
        let outcome = self.move_outcome.take()?;
        match outcome {
            MoveOutcome::Reached => self.navigation_failures = 0,
            MoveOutcome::Failed => {
                self.navigation_failures += 1;
                self.log(
                    services,
                    LogLevel::Warning,
                    &format!("move failed ({}/{})", self.navigation_failures, MAX_NAVIGATION_FAILURES),
                );
            }
        }
        Some(outcome)
    }

    /// `true` once the failure bound is hit (counter resets).
    pub(super) fn navigation_exhausted(&mut self) -> bool {
        if self.navigation_failures >= MAX_NAVIGATION_FAILURES {
            self.navigation_failures = 0;
            true
        } else {
            false
        }
    }

    pub(super) fn is_moving(&self) -> bool {
        self.pending_move.is_some()
    }

    /// Drops the pending request (stops the agent only if one was active).
    pub(super) fn clear_pending_move(&mut self, services: &mut AIServices) {
        if self.pending_move.take().is_some() {
            if let Some(navigation) = services.navigation.as_deref_mut() {
                navigation.stop_movement(self.agent);
            }
        }
        self.move_outcome = None;
    }

    pub(super) fn stop_movement(&mut self, services: &mut AIServices) {
        self.pending_move = None;
        self.move_outcome = None;
        if let Some(navigation) = services.navigation.as_deref_mut() {
            navigation.stop_movement(self.agent);
        }
    }

    /// Run above the sprint threshold, walk otherwise.
    pub(super) fn travel_speed(&self, distance: f32) -> f32 {
        if distance > self.config.sprint_threshold_distance {
            self.config.run_speed
        } else {
            self.config.walk_speed
        }
    }

    // ========================================================================
    // Misc
    // ========================================================================

    pub(super) fn log(&self, services: &AIServices, level: LogLevel, message: &str) {
        services.log(level, &format!("AI {:?}: {}", self.agent, message));
    }

    /// One-line summary for debug overlays.
    pub fn debug_string(&self, world: &dyn EntityLookup) -> String {
        let target = match self.target {
            Some(target) => {
                let distance = world
                    .position(self.agent)
                    .zip(world.position(target))
                    .map(|(a, b)| format!("{:.1}m", a.distance(b)))
                    .unwrap_or_else(|| "?".to_string());
                format!("{:?} @ {}", target, distance)
            }
            None => "none".to_string(),
        };

        format!(
            "{:?}/{:?} phase={:?} target={} t={:.2}s next_attack={:.2}s",
            self.current_state,
            self.combat_sub_state,
            self.boss_phase,
            target,
            self.timers.time_in_current_state,
            (self.timers.next_attack_delay - self.timers.time_since_last_attack).max(0.0),
        )
    }
}

/// Uniform draw in [min_attack_delay, max_attack_delay].
pub(super) fn roll_attack_delay(rng: &mut ChaCha8Rng, config: &AIConfig) -> f32 {
    use rand::Rng;

    if config.max_attack_delay > config.min_attack_delay {
        rng.gen_range(config.min_attack_delay..=config.max_attack_delay)
    } else {
        config.min_attack_delay
    }
}
