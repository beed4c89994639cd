//! FSM state enums + notifications emitted on transitions.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Top-level AI mode. Exactly one is active.
///
/// `Dead` is terminal: only `AIStateMachine::reset_from_death` leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum MainState {
    /// Standing at spawn, no target
    #[default]
    Idle,
    /// Wandering around spawn
    RandomRoam,
    /// Walking a patrol path
    Patrol,
    /// Checking a last-known location / heard noise
    Investigating,
    /// Engaged with a target (see `CombatSubState`)
    Combat,
    /// Staggered, vulnerable
    PoiseBroken,
    /// Special move in progress, ignores interrupts
    Uninterruptable,
    Dead,
    /// Leashed, walking back to spawn
    OutOfBounds,
}

impl MainState {
    /// States that count as "at rest" (valid places to resume into).
    pub fn is_passive(self) -> bool {
        matches!(
            self,
            MainState::Idle | MainState::RandomRoam | MainState::Patrol | MainState::Investigating
        )
    }
}

/// Combat sub-state. `None` if and only if main state != `Combat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum CombatSubState {
    #[default]
    None,
    /// Closing distance
    Engaging,
    /// Strafing/circling
    Positioning,
    /// Telegraph before the swing (input reading happens here)
    WindingUp,
    /// Ability executing, waits for completion signal
    Attacking,
    /// Post-attack cooldown
    Recovering,
    /// Holding guard while the target swings
    Blocking,
    /// Backing away to re-open distance
    Retreating,
}

/// Boss phase. Ordering is the escalation order, phase never goes down
/// within one encounter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Reflect, Serialize, Deserialize,
)]
pub enum BossPhase {
    #[default]
    NotBoss,
    Phase1,
    Phase2,
    Phase3,
    Enraged,
}

/// Notifications for animation/UI/telemetry listeners.
///
/// Collected in the machine's outbox, drained by the owner
/// (ECS layer forwards them as Bevy events).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AINotification {
    StateChanged { old: MainState, new: MainState },
    CombatSubStateChanged { old: CombatSubState, new: CombatSubState },
    BossPhaseChanged { old: BossPhase, new: BossPhase },
    AttackStarted,
    AttackEnded,
}

/// What the target is doing right now (read for input reading and blocking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct TargetActivity {
    pub healing: bool,
    pub rolling: bool,
    /// Mid-swing (used as the "predicted attack" signal for Blocking)
    pub attacking: bool,
}
