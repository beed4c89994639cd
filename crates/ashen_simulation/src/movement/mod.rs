//! Movement domain — headless execution of movement commands
//!
//! Contains:
//! - MoveCompleted (event sent when a command finishes)
//! - advance_movement (straight-line movement over the walkable area)

use bevy::prelude::*;

use crate::ai::services::MoveOutcome;
use crate::components::{
    GlobalPositionHint, MovementCommand, MovementSpeed, NavigationState, WalkableArea,
};

pub mod events;

pub use events::*;

/// Movement Plugin
///
/// Runs last in the simulation tick (`SimulationSet::Movement`);
/// `MoveCompleted` is read by AI signal routing on the next tick.
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MoveCompleted>();

        app.add_systems(
            FixedUpdate,
            (record_position_hints, advance_movement)
                .chain()
                .in_set(crate::SimulationSet::Movement),
        );
    }
}

/// System: moves actors toward their MovementCommand goal
///
/// Straight line, no avoidance. Sends `MoveCompleted` exactly once per
/// command (NavigationState::is_target_reached guards the transition).
pub fn advance_movement(
    mut movers: Query<(
        Entity,
        &mut Transform,
        &mut MovementCommand,
        &mut NavigationState,
        &MovementSpeed,
    )>,
    goals: Query<&Transform, Without<MovementCommand>>,
    followed: Query<&GlobalPositionHint>,
    area: Option<Res<WalkableArea>>,
    mut completed: EventWriter<MoveCompleted>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut transform, mut command, mut nav_state, speed) in movers.iter_mut() {
        let goal = match *command {
            MovementCommand::Idle => continue,
            MovementCommand::Stop => {
                *command = MovementCommand::Idle;
                continue;
            }
            MovementCommand::MoveToPosition { target } => Some(target),
            MovementCommand::FollowEntity { target } => goals
                .get(target)
                .map(|t| t.translation)
                .ok()
                .or_else(|| followed.get(target).ok().map(|hint| hint.0)),
        };

        if nav_state.is_target_reached {
            continue;
        }

        let Some(goal) = goal else {
            nav_state.is_target_reached = true;
            *command = MovementCommand::Idle;
            completed.write(MoveCompleted { entity, outcome: MoveOutcome::Failed });
            continue;
        };

        let to_goal = goal - transform.translation;
        let flat = Vec3::new(to_goal.x, 0.0, to_goal.z);
        let distance = flat.length();

        if distance <= nav_state.acceptance_radius {
            nav_state.is_target_reached = true;
            *command = MovementCommand::Idle;
            completed.write(MoveCompleted { entity, outcome: MoveOutcome::Reached });
            continue;
        }

        let step = (speed.speed * delta).min(distance - nav_state.acceptance_radius * 0.5);
        let next = transform.translation + flat / distance * step.max(0.0);

        if area.as_ref().is_some_and(|area| !area.contains(next)) {
            nav_state.is_target_reached = true;
            *command = MovementCommand::Idle;
            completed.write(MoveCompleted { entity, outcome: MoveOutcome::Failed });
            continue;
        }

        transform.translation = next;
    }
}

/// System: snapshot mover positions for FollowEntity goals
pub fn record_position_hints(mut movers: Query<(&Transform, &mut GlobalPositionHint)>) {
    for (transform, mut hint) in movers.iter_mut() {
        hint.0 = transform.translation;
    }
}
