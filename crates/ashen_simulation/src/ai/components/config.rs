//! AIConfig: per-agent tuning record.
//!
//! Units: meters, seconds, meters/second. Probabilities are in [0, 1].
//! Loaded from archetype data (serde, missing fields take defaults) or built
//! from the presets below. `sanitized()` runs once when the state machine is
//! created; after that the record is read-only except for boss overrides and
//! the enrage adjustment.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// AI tuning parameters
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct AIConfig {
    // === Detection ===
    pub sight_range: f32,
    pub hearing_range: f32,
    /// Target unseen longer than this → target lost
    pub lose_target_time: f32,
    /// How often Idle/Patrol/Roam ask perception for a target
    pub perception_poll_interval: f32,

    // === Combat distances ===
    pub attack_range: f32,
    pub preferred_combat_distance: f32,
    /// Leash radius around spawn
    pub max_chase_distance: f32,

    // === Timing ===
    pub min_attack_delay: f32,
    pub max_attack_delay: f32,
    /// Wind-up hold (only used with input reading enabled)
    pub wind_up_hold_time: f32,
    pub post_attack_recovery: f32,
    pub reposition_interval: f32,
    /// Execution-complete never arrived → treat attack as finished
    pub attack_timeout: f32,

    // === Movement ===
    pub walk_speed: f32,
    pub run_speed: f32,
    pub strafe_speed: f32,
    pub sprint_threshold_distance: f32,
    /// Chance to circle clockwise
    pub strafe_direction_bias: f32,
    pub strafe_direction_change_interval: f32,

    // === Input reading ===
    pub enable_input_reading: bool,
    pub input_reading_reaction_time: f32,
    pub punish_healing_chance: f32,
    pub punish_rolling_chance: f32,
    pub punish_cooldown: f32,

    // === Aggression ===
    pub combo_chance: f32,
    pub max_combo_length: u32,

    // === Poise / retreat / guard ===
    pub poise_broken_duration: f32,
    /// Non-boss agents below this health fraction retreat after recovering
    pub low_health_retreat_threshold: f32,
    pub retreat_margin: f32,
    pub retreat_timeout: f32,
    pub can_block: bool,
    pub block_min_hold: f32,

    // === Roaming / investigation ===
    pub investigate_wait_time: f32,
    pub investigate_timeout: f32,
    /// 0 = agent never roams
    pub roam_radius: f32,
    pub roam_point_timeout: f32,
    pub idle_roam_delay: f32,

    // === Special moves ===
    pub special_move_timeout: f32,

    // === Boss ===
    pub is_boss: bool,
    pub phase2_health_threshold: f32,
    pub phase3_health_threshold: f32,
    pub enrage_health_threshold: f32,
    /// Attack delays/recovery multiplier while Enraged
    pub enrage_attack_delay_multiplier: f32,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            sight_range: 20.0,
            hearing_range: 10.0,
            lose_target_time: 5.0,
            perception_poll_interval: 0.25,

            attack_range: 2.0,
            preferred_combat_distance: 3.0,
            max_chase_distance: 15.0,

            min_attack_delay: 0.2,
            max_attack_delay: 0.8,
            wind_up_hold_time: 0.0,
            post_attack_recovery: 0.25,
            reposition_interval: 1.5,
            attack_timeout: 5.0,

            walk_speed: 2.0,
            run_speed: 4.5,
            strafe_speed: 1.5,
            sprint_threshold_distance: 5.0,
            strafe_direction_bias: 0.5,
            strafe_direction_change_interval: 2.0,

            enable_input_reading: true,
            input_reading_reaction_time: 0.15,
            punish_healing_chance: 0.8,
            punish_rolling_chance: 0.5,
            punish_cooldown: 3.0,

            combo_chance: 0.3,
            max_combo_length: 3,

            poise_broken_duration: 2.0,
            low_health_retreat_threshold: 0.2,
            retreat_margin: 1.0,
            retreat_timeout: 2.0,
            can_block: false,
            block_min_hold: 0.3,

            investigate_wait_time: 1.5,
            investigate_timeout: 10.0,
            roam_radius: 0.0,
            roam_point_timeout: 5.0,
            idle_roam_delay: 3.0,

            special_move_timeout: 10.0,

            is_boss: false,
            phase2_health_threshold: 0.6,
            phase3_health_threshold: 0.3,
            enrage_health_threshold: 0.15,
            enrage_attack_delay_multiplier: 0.6,
        }
    }
}

impl AIConfig {
    /// Boss archetype: bigger leash, wind-up hold for input reading, no combo cap.
    pub fn boss() -> Self {
        Self {
            is_boss: true,
            max_chase_distance: 40.0,
            sight_range: 30.0,
            attack_range: 3.0,
            preferred_combat_distance: 4.5,
            wind_up_hold_time: 0.3,
            max_combo_length: 4,
            ..Self::default()
        }
    }

    /// Shield-bearing grunt.
    pub fn guard() -> Self {
        Self {
            can_block: true,
            combo_chance: 0.1,
            enable_input_reading: false,
            ..Self::default()
        }
    }

    /// Wind-up hold actually applied (0 when input reading is off).
    pub fn effective_wind_up_hold(&self) -> f32 {
        if self.enable_input_reading {
            self.wind_up_hold_time
        } else {
            0.0
        }
    }

    /// Clamps inconsistent values to safe ones.
    ///
    /// Never fails: returns the fixed config plus a list of what was changed.
    pub fn sanitized(mut self) -> (Self, Vec<ConfigAdjustment>) {
        let defaults = Self::default();
        let mut adjustments = Vec::new();

        {
            let mut non_negative = |name: &'static str, value: &mut f32, fallback: f32| {
                if !value.is_finite() || *value < 0.0 {
                    adjustments.push(ConfigAdjustment { field: name, from: *value, to: fallback });
                    *value = fallback;
                }
            };

            non_negative("sight_range", &mut self.sight_range, defaults.sight_range);
            non_negative("hearing_range", &mut self.hearing_range, defaults.hearing_range);
            non_negative("lose_target_time", &mut self.lose_target_time, defaults.lose_target_time);
            non_negative(
                "perception_poll_interval",
                &mut self.perception_poll_interval,
                defaults.perception_poll_interval,
            );
            non_negative("attack_range", &mut self.attack_range, defaults.attack_range);
            non_negative(
                "preferred_combat_distance",
                &mut self.preferred_combat_distance,
                defaults.preferred_combat_distance,
            );
            non_negative("max_chase_distance", &mut self.max_chase_distance, defaults.max_chase_distance);
            non_negative("min_attack_delay", &mut self.min_attack_delay, 0.0);
            non_negative("max_attack_delay", &mut self.max_attack_delay, 0.0);
            non_negative("wind_up_hold_time", &mut self.wind_up_hold_time, 0.0);
            non_negative("post_attack_recovery", &mut self.post_attack_recovery, 0.0);
            non_negative("reposition_interval", &mut self.reposition_interval, defaults.reposition_interval);
            non_negative("attack_timeout", &mut self.attack_timeout, defaults.attack_timeout);
            non_negative("walk_speed", &mut self.walk_speed, defaults.walk_speed);
            non_negative("run_speed", &mut self.run_speed, defaults.run_speed);
            non_negative("strafe_speed", &mut self.strafe_speed, defaults.strafe_speed);
            non_negative(
                "sprint_threshold_distance",
                &mut self.sprint_threshold_distance,
                defaults.sprint_threshold_distance,
            );
            non_negative(
                "strafe_direction_change_interval",
                &mut self.strafe_direction_change_interval,
                defaults.strafe_direction_change_interval,
            );
            non_negative(
                "input_reading_reaction_time",
                &mut self.input_reading_reaction_time,
                defaults.input_reading_reaction_time,
            );
            non_negative("punish_cooldown", &mut self.punish_cooldown, defaults.punish_cooldown);
            non_negative("poise_broken_duration", &mut self.poise_broken_duration, defaults.poise_broken_duration);
            non_negative("retreat_margin", &mut self.retreat_margin, defaults.retreat_margin);
            non_negative("retreat_timeout", &mut self.retreat_timeout, defaults.retreat_timeout);
            non_negative("block_min_hold", &mut self.block_min_hold, defaults.block_min_hold);
            non_negative("investigate_wait_time", &mut self.investigate_wait_time, defaults.investigate_wait_time);
            non_negative("investigate_timeout", &mut self.investigate_timeout, defaults.investigate_timeout);
            non_negative("roam_radius", &mut self.roam_radius, 0.0);
            non_negative("roam_point_timeout", &mut self.roam_point_timeout, defaults.roam_point_timeout);
            non_negative("idle_roam_delay", &mut self.idle_roam_delay, defaults.idle_roam_delay);
            non_negative("special_move_timeout", &mut self.special_move_timeout, defaults.special_move_timeout);
            non_negative(
                "enrage_attack_delay_multiplier",
                &mut self.enrage_attack_delay_multiplier,
                defaults.enrage_attack_delay_multiplier,
            );
        }

        {
            let mut probability = |name: &'static str, value: &mut f32| {
                let clamped = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
                if clamped != *value {
                    adjustments.push(ConfigAdjustment { field: name, from: *value, to: clamped });
                    *value = clamped;
                }
            };

            probability("strafe_direction_bias", &mut self.strafe_direction_bias);
            probability("punish_healing_chance", &mut self.punish_healing_chance);
            probability("punish_rolling_chance", &mut self.punish_rolling_chance);
            probability("combo_chance", &mut self.combo_chance);
            probability("low_health_retreat_threshold", &mut self.low_health_retreat_threshold);
            probability("phase2_health_threshold", &mut self.phase2_health_threshold);
            probability("phase3_health_threshold", &mut self.phase3_health_threshold);
            probability("enrage_health_threshold", &mut self.enrage_health_threshold);
        }

        if self.max_attack_delay < self.min_attack_delay {
            adjustments.push(ConfigAdjustment {
                field: "max_attack_delay",
                from: self.max_attack_delay,
                to: self.min_attack_delay,
            });
            self.max_attack_delay = self.min_attack_delay;
        }

        if self.preferred_combat_distance < self.attack_range {
            adjustments.push(ConfigAdjustment {
                field: "preferred_combat_distance",
                from: self.preferred_combat_distance,
                to: self.attack_range,
            });
            self.preferred_combat_distance = self.attack_range;
        }

        if !thresholds_descending(
            self.phase2_health_threshold,
            self.phase3_health_threshold,
            self.enrage_health_threshold,
        ) {
            adjustments.push(ConfigAdjustment {
                field: "phase2_health_threshold",
                from: self.phase2_health_threshold,
                to: defaults.phase2_health_threshold,
            });
            adjustments.push(ConfigAdjustment {
                field: "phase3_health_threshold",
                from: self.phase3_health_threshold,
                to: defaults.phase3_health_threshold,
            });
            adjustments.push(ConfigAdjustment {
                field: "enrage_health_threshold",
                from: self.enrage_health_threshold,
                to: defaults.enrage_health_threshold,
            });
            self.phase2_health_threshold = defaults.phase2_health_threshold;
            self.phase3_health_threshold = defaults.phase3_health_threshold;
            self.enrage_health_threshold = defaults.enrage_health_threshold;
        }

        (self, adjustments)
    }
}

/// Boss-specific phase thresholds, injected once by the owning boss entity.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct BossPhaseThresholds {
    pub phase2: f32,
    pub phase3: f32,
    pub enrage: f32,
}

impl BossPhaseThresholds {
    /// `None` unless all values are in [0, 1] and descending.
    pub fn validated(self) -> Option<Self> {
        let in_range = [self.phase2, self.phase3, self.enrage]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v));

        (in_range && thresholds_descending(self.phase2, self.phase3, self.enrage)).then_some(self)
    }
}

/// One value `sanitized()` had to change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigAdjustment {
    pub field: &'static str,
    pub from: f32,
    pub to: f32,
}

fn thresholds_descending(phase2: f32, phase3: f32, enrage: f32) -> bool {
    phase2 >= phase3 && phase3 >= enrage
}
