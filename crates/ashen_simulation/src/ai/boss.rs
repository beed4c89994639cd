//! Boss phase controller.
//!
//! Phase is derived from the health fraction every tick and only ever goes
//! up within an encounter (Phase1 → Phase2 → Phase3 → Enraged, skipping is
//! allowed). `reset_encounter` starts a new encounter.

use crate::ai::components::{AINotification, BossPhase, BossPhaseThresholds};
use crate::ai::services::AIServices;
use crate::logger::{LogLevel, LogPrinter};

use super::state_machine::AIStateMachine;

impl AIStateMachine {
    /// Escalates the phase if health crossed a threshold.
    pub fn check_boss_phase_transition(&mut self, services: &AIServices) {
        if !self.config.is_boss {
            return;
        }

        let Some(health) = services.stats.and_then(|stats| stats.health_fraction(self.agent)) else {
            return;
        };

        let reached = self.phase_for_health(health);
        if reached > self.boss_phase {
            self.escalate_boss_phase(reached, services.log);
        }
    }

    /// Highest phase whose threshold `health` is at or below.
    fn phase_for_health(&self, health: f32) -> BossPhase {
        if health <= self.config.enrage_health_threshold {
            BossPhase::Enraged
        } else if health <= self.config.phase3_health_threshold {
            BossPhase::Phase3
        } else if health <= self.config.phase2_health_threshold {
            BossPhase::Phase2
        } else {
            BossPhase::Phase1
        }
    }

    fn escalate_boss_phase(&mut self, new_phase: BossPhase, log: &dyn LogPrinter) {
        let old_phase = self.boss_phase;
        self.boss_phase = new_phase;
        self.outbox.push(AINotification::BossPhaseChanged { old: old_phase, new: new_phase });
        log.log(
            LogLevel::Info,
            &format!("AI {:?}: boss phase {:?} → {:?}", self.agent, old_phase, new_phase),
        );

        if new_phase == BossPhase::Enraged {
            self.apply_enrage_adjustment();
        }
    }

    /// Shorter attack delays and recovery while enraged.
    fn apply_enrage_adjustment(&mut self) {
        let multiplier = self.config.enrage_attack_delay_multiplier;
        self.config.min_attack_delay *= multiplier;
        self.config.max_attack_delay *= multiplier;
        self.config.post_attack_recovery *= multiplier;

        self.timers.next_attack_delay = self.timers.next_attack_delay.min(self.config.max_attack_delay);
    }

    /// Boss-specific thresholds. Accepted once, later calls are ignored.
    pub fn apply_boss_overrides(&mut self, thresholds: BossPhaseThresholds, log: &dyn LogPrinter) -> bool {
        if self.boss_overrides_applied {
            log.log(
                LogLevel::Warning,
                &format!("AI {:?}: boss overrides already applied, ignoring", self.agent),
            );
            return false;
        }

        let Some(thresholds) = thresholds.validated() else {
            log.log(
                LogLevel::Warning,
                &format!("AI {:?}: invalid boss thresholds {:?}, keeping config", self.agent, thresholds),
            );
            return false;
        };

        for config in [&mut self.config, &mut self.base_config] {
            config.phase2_health_threshold = thresholds.phase2;
            config.phase3_health_threshold = thresholds.phase3;
            config.enrage_health_threshold = thresholds.enrage;
        }
        self.boss_overrides_applied = true;
        true
    }

    /// New encounter: phase back to `Phase1`, base timings restored.
    pub fn reset_encounter(&mut self, log: &dyn LogPrinter) {
        if !self.config.is_boss {
            return;
        }

        self.config = self.base_config.clone();
        self.timers.next_attack_delay = self.timers.next_attack_delay.min(self.config.max_attack_delay);

        if self.boss_phase != BossPhase::Phase1 {
            self.outbox.push(AINotification::BossPhaseChanged {
                old: self.boss_phase,
                new: BossPhase::Phase1,
            });
            self.boss_phase = BossPhase::Phase1;
        }

        log.log(LogLevel::Info, &format!("AI {:?}: encounter reset", self.agent));
    }
}
