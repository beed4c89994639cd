//! Per-agent ECS components around the state machine: inbox, perception
//! memory, spawn-time overrides.

use bevy::prelude::*;

use crate::ai::services::MoveOutcome;

use super::config::BossPhaseThresholds;

/// External signal waiting to be applied to an agent's state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AISignal {
    MoveCompleted(MoveOutcome),
    AbilityExecutionComplete,
    PoiseBroken,
    Died,
    Stimulus(Vec3),
    BeginSpecialMove,
    SpecialMoveComplete,
    Respawn(Vec3),
}

/// Signals routed this frame, applied in order before the tick.
#[derive(Component, Debug, Clone, Default)]
pub struct AIInbox {
    pub signals: Vec<AISignal>,
}

impl AIInbox {
    pub fn push(&mut self, signal: AISignal) {
        self.signals.push(signal);
    }
}

/// Hostile actors the agent currently senses.
///
/// Fed by `PerceptionEvent::{ActorSpotted, ActorLost}`, dead entries are
/// pruned every frame.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SpottedEnemies {
    pub enemies: Vec<Entity>,
}

/// Boss thresholds applied once when the state machine is created.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct BossThresholdOverride(pub BossPhaseThresholds);

/// Looping patrol waypoints (world coordinates).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct PatrolPath {
    pub points: Vec<Vec3>,
}
