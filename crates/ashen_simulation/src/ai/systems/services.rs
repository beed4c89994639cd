//! ECS implementations of the state machine collaborators.
//!
//! Built per agent inside `tick_ai_state_machines` on top of the system's
//! queries; nothing here outlives one system run.

use bevy::prelude::*;
use rand::RngCore;

use crate::ai::components::{SpottedEnemies, TargetActivity};
use crate::ai::services::{
    AbilityExecutor, AbilityHandle, AbilitySelector, CombatStats, EntityLookup, MoveGoal, MoveRequest,
    MoveRequestResult, Navigation, Perception,
};
use crate::combat::AbilitySet;
use crate::components::{ActorActivity, Health, MovementCommand, MovementSpeed, NavigationState, WalkableArea};

/// Read-only view of an actor
pub type ActorView = (&'static Transform, &'static Health, Option<&'static ActorActivity>);

/// Writable movement state of an agent
pub type MoverView = (
    &'static mut MovementCommand,
    &'static mut NavigationState,
    &'static mut MovementSpeed,
);

// ============================================================================
// Entity lookup + stats
// ============================================================================

/// Transform/Health/ActorActivity lookup.
pub struct ActorLookup<'a, 'w, 's> {
    pub actors: &'a Query<'w, 's, ActorView>,
}

impl EntityLookup for ActorLookup<'_, '_, '_> {
    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.actors.get(entity).ok().map(|(transform, _, _)| transform.translation)
    }

    fn is_alive(&self, entity: Entity) -> bool {
        self.actors
            .get(entity)
            .map(|(_, health, _)| health.is_alive())
            .unwrap_or(false)
    }

    fn activity(&self, entity: Entity) -> TargetActivity {
        match self.actors.get(entity) {
            Ok((_, _, Some(activity))) => TargetActivity {
                healing: activity.healing,
                rolling: activity.rolling,
                attacking: activity.attacking,
            },
            _ => TargetActivity::default(),
        }
    }
}

impl CombatStats for ActorLookup<'_, '_, '_> {
    fn health_fraction(&self, agent: Entity) -> Option<f32> {
        self.actors.get(agent).ok().map(|(_, health, _)| health.fraction())
    }
}

/// Lookup straight on `World` (outside systems: debug output, tests).
pub struct WorldLookup<'w> {
    pub world: &'w World,
}

impl EntityLookup for WorldLookup<'_> {
    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Transform>(entity).map(|transform| transform.translation)
    }

    fn is_alive(&self, entity: Entity) -> bool {
        self.world.get::<Health>(entity).is_some_and(|health| health.is_alive())
    }

    fn activity(&self, entity: Entity) -> TargetActivity {
        self.world
            .get::<ActorActivity>(entity)
            .map(|activity| TargetActivity {
                healing: activity.healing,
                rolling: activity.rolling,
                attacking: activity.attacking,
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Perception
// ============================================================================

/// Perception over `SpottedEnemies`.
pub struct SpottedPerception<'a, 'w, 's> {
    pub spotted: &'a Query<'w, 's, &'static SpottedEnemies>,
    pub actors: &'a Query<'w, 's, ActorView>,
}

impl Perception for SpottedPerception<'_, '_, '_> {
    fn can_see_target(&self, agent: Entity, candidate: Entity) -> bool {
        self.spotted
            .get(agent)
            .map(|spotted| spotted.enemies.contains(&candidate))
            .unwrap_or(false)
    }

    /// Nearest living spotted enemy within `sight_range`.
    fn detect_target(&self, agent: Entity, sight_range: f32) -> Option<Entity> {
        let spotted = self.spotted.get(agent).ok()?;
        let (agent_transform, _, _) = self.actors.get(agent).ok()?;
        let origin = agent_transform.translation;

        spotted
            .enemies
            .iter()
            .filter_map(|&enemy| {
                let (transform, health, _) = self.actors.get(enemy).ok()?;
                let distance = origin.distance(transform.translation);
                (health.is_alive() && distance <= sight_range).then_some((enemy, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(enemy, _)| enemy)
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Navigation over `MovementCommand` (executed by `advance_movement`).
pub struct CommandNavigation<'a, 'w, 's, 'b, 'wa, 'sa> {
    pub movers: &'a mut Query<'w, 's, MoverView>,
    pub actors: &'b Query<'wa, 'sa, ActorView>,
    pub area: Option<&'b WalkableArea>,
}

impl Navigation for CommandNavigation<'_, '_, '_, '_, '_, '_> {
    fn request_move_to(&mut self, agent: Entity, request: MoveRequest) -> MoveRequestResult {
        let Ok((agent_transform, _, _)) = self.actors.get(agent) else {
            return MoveRequestResult::Failed;
        };
        let origin = agent_transform.translation;

        let (goal_position, command) = match request.goal {
            MoveGoal::Point(point) => {
                if !self.is_reachable(agent, point) {
                    return MoveRequestResult::Failed;
                }
                (point, MovementCommand::MoveToPosition { target: point })
            }
            MoveGoal::Actor(target) => match self.actors.get(target) {
                Ok((transform, _, _)) => (transform.translation, MovementCommand::FollowEntity { target }),
                Err(_) => return MoveRequestResult::Failed,
            },
        };

        let Ok((mut movement, mut nav_state, mut speed)) = self.movers.get_mut(agent) else {
            return MoveRequestResult::Failed;
        };

        let offset = goal_position - origin;
        if Vec2::new(offset.x, offset.z).length() <= request.acceptance_radius {
            *movement = MovementCommand::Idle;
            return MoveRequestResult::AlreadyAtGoal;
        }

        *movement = command;
        nav_state.is_target_reached = false;
        nav_state.acceptance_radius = request.acceptance_radius;
        speed.speed = request.speed;
        MoveRequestResult::RequestSuccessful
    }

    fn stop_movement(&mut self, agent: Entity) {
        if let Ok((mut movement, _, _)) = self.movers.get_mut(agent) {
            *movement = MovementCommand::Stop;
        }
    }

    fn is_reachable(&self, _agent: Entity, point: Vec3) -> bool {
        self.area.is_none_or(|area| area.contains(point))
    }
}

// ============================================================================
// Abilities
// ============================================================================

/// Ability selection/execution over `AbilitySet`.
pub struct AbilitySetAbilities<'a, 'w, 's> {
    pub sets: &'a mut Query<'w, 's, &'static mut AbilitySet>,
}

impl AbilitySelector for AbilitySetAbilities<'_, '_, '_> {
    fn try_select_ability(
        &mut self,
        agent: Entity,
        target: Entity,
        distance: f32,
        rng: &mut dyn RngCore,
    ) -> Option<AbilityHandle> {
        let mut set = self.sets.get_mut(agent).ok()?;
        set.select(target, distance, rng)
    }
}

impl AbilityExecutor for AbilitySetAbilities<'_, '_, '_> {
    fn start_ability(&mut self, agent: Entity, handle: AbilityHandle) -> bool {
        match self.sets.get_mut(agent) {
            Ok(mut set) => set.start(handle),
            Err(_) => false,
        }
    }

    /// `ActorActivity.attacking` drops in the same frame (`advance_abilities`).
    fn cancel_ability(&mut self, agent: Entity, handle: AbilityHandle) {
        if let Ok(mut set) = self.sets.get_mut(agent) {
            set.cancel(handle);
        }
    }
}
