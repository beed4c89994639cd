//! AI Events
//!
//! Inbound: perception, stimuli, special-move commands (routed into `AIInbox`).
//! Outbound: state machine notifications re-published as Bevy events for
//! animation/UI/telemetry listeners.

use bevy::prelude::*;

use super::components::{BossPhase, CombatSubState, MainState};

/// Perception events (vision cone / proximity sensing)
///
/// - ActorSpotted: enemy entered the observer's senses
/// - ActorLost: enemy left them
#[derive(Event, Debug, Clone)]
pub enum PerceptionEvent {
    ActorSpotted {
        /// Who perceives
        observer: Entity,
        target: Entity,
    },
    ActorLost {
        observer: Entity,
        target: Entity,
    },
}

/// Noise at a world location. Every agent within its hearing range investigates.
#[derive(Event, Debug, Clone, Copy)]
pub struct Stimulus {
    pub location: Vec3,
}

/// Commands from gameplay code (boss scripts, respawn logic).
#[derive(Event, Debug, Clone, Copy)]
pub enum AICommand {
    BeginSpecialMove { entity: Entity },
    SpecialMoveComplete { entity: Entity },
    Respawn { entity: Entity, location: Vec3 },
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AIStateChanged {
    pub entity: Entity,
    pub old: MainState,
    pub new: MainState,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AICombatSubStateChanged {
    pub entity: Entity,
    pub old: CombatSubState,
    pub new: CombatSubState,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BossPhaseChanged {
    pub entity: Entity,
    pub old: BossPhase,
    pub new: BossPhase,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackStarted {
    pub entity: Entity,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackEnded {
    pub entity: Entity,
}
