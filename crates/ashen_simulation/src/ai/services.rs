//! Collaborator contracts of the AI state machine.
//!
//! The state machine never owns any of these. Every tick (and every external
//! call such as `set_target`) receives an `AIServices` bundle; the ECS layer
//! builds one per agent from components (see `ai::systems::services`), tests
//! build one from doubles.

use bevy::prelude::*;
use rand::RngCore;

use crate::ai::components::TargetActivity;
use crate::logger::{LogLevel, LogPrinter};

// ============================================================================
// Entity lookup
// ============================================================================

/// Resolves entity handles. `None`/`false` for despawned entities.
pub trait EntityLookup {
    fn position(&self, entity: Entity) -> Option<Vec3>;
    fn is_alive(&self, entity: Entity) -> bool;
    fn activity(&self, entity: Entity) -> TargetActivity;
}

// ============================================================================
// Perception
// ============================================================================

pub trait Perception {
    /// Is `candidate` currently sensed (sight or hearing) by `agent`?
    fn can_see_target(&self, agent: Entity, candidate: Entity) -> bool;

    /// Best sensed candidate within `sight_range`, if any.
    fn detect_target(&self, agent: Entity, sight_range: f32) -> Option<Entity>;
}

// ============================================================================
// Navigation
// ============================================================================

/// Where to move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveGoal {
    Point(Vec3),
    /// Follow a moving entity
    Actor(Entity),
}

/// Immediate answer to a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRequestResult {
    /// Accepted, completion arrives later via `on_move_completed`
    RequestSuccessful,
    AlreadyAtGoal,
    Failed,
}

/// Asynchronous completion of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Reached,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveRequest {
    pub goal: MoveGoal,
    pub acceptance_radius: f32,
    pub speed: f32,
}

pub trait Navigation {
    fn request_move_to(&mut self, agent: Entity, request: MoveRequest) -> MoveRequestResult;
    fn stop_movement(&mut self, agent: Entity);
    fn is_reachable(&self, agent: Entity, point: Vec3) -> bool;
}

// ============================================================================
// Abilities
// ============================================================================

/// Opaque handle of an ability owned by the ability system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct AbilityHandle(pub u32);

pub trait AbilitySelector {
    /// Picks an ability usable at `distance` (max-distance and cooldown respected).
    fn try_select_ability(
        &mut self,
        agent: Entity,
        target: Entity,
        distance: f32,
        rng: &mut dyn RngCore,
    ) -> Option<AbilityHandle>;
}

pub trait AbilityExecutor {
    /// Starts execution. `false` = could not start (soft failure).
    ///
    /// Completion is reported via `AIStateMachine::on_ability_execution_complete`.
    fn start_ability(&mut self, agent: Entity, handle: AbilityHandle) -> bool;

    /// Aborts `handle` if it is still executing (no hit, no completion).
    fn cancel_ability(&mut self, agent: Entity, handle: AbilityHandle);
}

/// Ability selection + execution usually live on the same object.
pub trait AbilitySystem: AbilitySelector + AbilityExecutor {}

impl<T: AbilitySelector + AbilityExecutor> AbilitySystem for T {}

// ============================================================================
// Combat stats
// ============================================================================

pub trait CombatStats {
    /// Current health in [0, 1]; `None` if the agent has no stats.
    fn health_fraction(&self, agent: Entity) -> Option<f32>;
}

// ============================================================================
// Bundle
// ============================================================================

/// Everything one agent's state machine may talk to during a call.
///
/// `navigation` and `stats` are required: without them a tick is a no-op.
/// Missing `perception`/`abilities` only disable detection/attacks.
pub struct AIServices<'a> {
    pub world: &'a dyn EntityLookup,
    pub perception: Option<&'a dyn Perception>,
    pub navigation: Option<&'a mut dyn Navigation>,
    pub abilities: Option<&'a mut dyn AbilitySystem>,
    pub stats: Option<&'a dyn CombatStats>,
    pub log: &'a dyn LogPrinter,
}

impl<'a> AIServices<'a> {
    pub fn log(&self, level: LogLevel, message: &str) {
        self.log.log(level, message);
    }

    /// Name of the first missing required collaborator.
    pub fn missing_dependency(&self) -> Option<&'static str> {
        if self.navigation.is_none() {
            Some("navigation")
        } else if self.stats.is_none() {
            Some("combat stats")
        } else {
            None
        }
    }
}
