//! Movement components: movement commands, navigation state, speed

use bevy::prelude::*;

/// Movement command for an actor
///
/// - AI writes MovementCommand (high-level intent)
/// - `advance_movement` executes it headless (straight line over `WalkableArea`)
/// - arrival/failure is reported once via `MoveCompleted`
#[derive(Component, Debug, Clone, Default, PartialEq)]
#[require(NavigationState, MovementSpeed, GlobalPositionHint)]
pub enum MovementCommand {
    /// Stand still
    #[default]
    Idle,
    /// Move to a world position
    MoveToPosition { target: Vec3 },
    /// Follow an entity (goal re-read every frame)
    FollowEntity { target: Entity },
    /// Stop now, becomes Idle after one frame
    Stop,
}

/// Navigation state of the current command
///
/// `is_target_reached` tracks the unreached → reached transition so that
/// `MoveCompleted` is sent exactly once per command.
#[derive(Component, Debug, Clone, Default)]
pub struct NavigationState {
    pub is_target_reached: bool,
    /// Goal counts as reached within this distance (meters)
    pub acceptance_radius: f32,
}

/// Movement speed (meters/second), set per command
#[derive(Component, Clone, Copy, Debug)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 2.0 } // walking pace
    }
}

/// Last known translation of a mover
///
/// `advance_movement` mutates every mover's Transform, so FollowEntity goals
/// that are movers themselves are read from here (copied before movement).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct GlobalPositionHint(pub Vec3);
