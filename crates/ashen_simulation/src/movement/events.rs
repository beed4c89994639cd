//! Movement events

use bevy::prelude::*;

use crate::ai::services::MoveOutcome;

/// Event: movement command finished
///
/// Sent once per command by `advance_movement`:
/// - Reached: within the acceptance radius of the goal
/// - Failed: goal left the walkable area or the followed entity vanished
#[derive(Event, Debug, Clone, Copy)]
pub struct MoveCompleted {
    pub entity: Entity,
    pub outcome: MoveOutcome,
}
