//! Combat sub-state handlers of `AIStateMachine`.
//!
//! Engaging → Positioning → WindingUp → Attacking → Recovering → Positioning
//! with Retreating/Blocking as side branches. Every tick first validates the
//! target and the leash, then the heal punish and guard checks run, then the
//! sub-state handler.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::components::{AINotification, CombatSubState, MainState};
use crate::ai::services::{AIServices, MoveGoal, MoveOutcome, MoveRequestResult};
use crate::logger::LogLevel;

use super::state_machine::{roll_attack_delay, AIStateMachine};

/// Strafe goal refresh period (seconds)
pub(super) const STRAFE_GOAL_REFRESH: f32 = 0.5;

/// Positioning gives up on strafing beyond this multiple of the preferred distance
const POSITIONING_MAX_DISTANCE_FACTOR: f32 = 1.2;

/// Heal punish only considered within this multiple of the attack range
const HEAL_PUNISH_RANGE_FACTOR: f32 = 2.0;

/// Guard only raised within this multiple of the attack range
const BLOCK_RANGE_FACTOR: f32 = 2.0;

/// "Delay" decision extends the wind-up by this fraction of the hold
const WIND_UP_EXTENSION_FACTOR: f32 = 0.5;

/// Acceptance radius fraction when closing in
const ENGAGE_ACCEPTANCE_FACTOR: f32 = 0.9;

impl AIStateMachine {
    pub(super) fn tick_combat(&mut self, delta: f32, agent_position: Vec3, services: &mut AIServices) {
        // Invalid/dead target: abandon the sub-state right away
        let Some((target, target_position)) = self.target_position(services.world) else {
            self.lose_target(false, services);
            return;
        };

        let visible = services
            .perception
            .map(|perception| perception.can_see_target(self.agent, target))
            .unwrap_or(true);

        if visible {
            self.time_target_unseen = 0.0;
            self.last_known_target_location = Some(target_position);
        } else {
            self.time_target_unseen += delta;
            if self.time_target_unseen > self.config.lose_target_time {
                self.lose_target(true, services);
                return;
            }
        }

        if !self.within_leash(agent_position) || !self.within_leash(target_position) {
            self.log(services, LogLevel::Info, "leash exceeded");
            self.set_state(MainState::OutOfBounds, services);
            return;
        }

        let distance = agent_position.distance(target_position);

        self.strafe_change_elapsed += delta;
        if self.strafe_change_elapsed >= self.config.strafe_direction_change_interval {
            self.strafe_change_elapsed = 0.0;
            self.strafe_clockwise = self.roll_strafe_direction();
        }

        if self.try_punish_healing(distance, services) {
            return;
        }

        if self.try_raise_guard(distance, services) {
            return;
        }

        match self.combat_sub_state {
            CombatSubState::Engaging => self.tick_engaging(target, distance, services),
            CombatSubState::Positioning => {
                self.tick_positioning(delta, target, agent_position, target_position, distance, services)
            }
            CombatSubState::WindingUp => self.tick_winding_up(services),
            CombatSubState::Attacking => self.tick_attacking(services),
            CombatSubState::Recovering => self.tick_recovering(target, distance, services),
            CombatSubState::Retreating => {
                self.tick_retreating(agent_position, target_position, distance, services)
            }
            CombatSubState::Blocking => self.tick_blocking(services),
            // Combat always has a sub-state, repair silently
            CombatSubState::None => self.change_combat_sub_state(CombatSubState::Engaging, services),
        }
    }

    pub(super) fn attack_ready(&self) -> bool {
        self.timers.time_since_last_attack >= self.timers.next_attack_delay
    }

    pub(super) fn roll_strafe_direction(&mut self) -> bool {
        self.rng.gen::<f32>() < self.config.strafe_direction_bias
    }

    // ========================================================================
    // Interrupts
    // ========================================================================

    /// Target drinks a flask within reach: roll to drop everything and rush in.
    fn try_punish_healing(&mut self, distance: f32, services: &mut AIServices) -> bool {
        if !self.config.enable_input_reading
            || self.punish_cooldown_remaining > 0.0
            || matches!(self.combat_sub_state, CombatSubState::WindingUp | CombatSubState::Attacking)
            || distance > self.config.attack_range * HEAL_PUNISH_RANGE_FACTOR
            || !self.target_activity(services.world).healing
        {
            return false;
        }

        self.punish_cooldown_remaining = self.config.punish_cooldown;

        if self.rng.gen::<f32>() >= self.config.punish_healing_chance {
            return false;
        }

        self.log(services, LogLevel::Info, "punishing heal");
        self.timers.next_attack_delay = 0.0;
        if self.combat_sub_state == CombatSubState::Engaging {
            self.clear_pending_move(services);
        } else {
            self.change_combat_sub_state(CombatSubState::Engaging, services);
        }
        true
    }

    fn try_raise_guard(&mut self, distance: f32, services: &mut AIServices) -> bool {
        if !self.config.can_block
            || !matches!(
                self.combat_sub_state,
                CombatSubState::Engaging | CombatSubState::Positioning | CombatSubState::Recovering
            )
            || distance > self.config.attack_range * BLOCK_RANGE_FACTOR
            || !self.target_activity(services.world).attacking
        {
            return false;
        }

        self.change_combat_sub_state(CombatSubState::Blocking, services);
        true
    }

    // ========================================================================
    // Sub-states
    // ========================================================================

    fn tick_engaging(&mut self, target: Entity, distance: f32, services: &mut AIServices) {
        // Ready to swing: close all the way into attack range
        let desired = if self.attack_ready() {
            self.config.attack_range
        } else {
            self.config.preferred_combat_distance
        };

        if distance <= desired {
            self.change_combat_sub_state(CombatSubState::Positioning, services);
            return;
        }

        if let Some(MoveOutcome::Failed) = self.take_move_outcome(services) {
            if self.fall_back_after_navigation_failures(services) {
                return;
            }
        }

        if self.is_moving() {
            return;
        }

        let speed = self.travel_speed(distance);
        match self.request_move(MoveGoal::Actor(target), desired * ENGAGE_ACCEPTANCE_FACTOR, speed, services) {
            MoveRequestResult::AlreadyAtGoal => {
                self.change_combat_sub_state(CombatSubState::Positioning, services);
            }
            MoveRequestResult::Failed => {
                self.fall_back_after_navigation_failures(services);
            }
            MoveRequestResult::RequestSuccessful => {}
        }
    }

    /// Bounded navigation failures in combat: back off, then re-engage.
    fn fall_back_after_navigation_failures(&mut self, services: &mut AIServices) -> bool {
        if !self.navigation_exhausted() {
            return false;
        }

        self.log(services, LogLevel::Warning, "navigation keeps failing, retreating");
        self.retreat_then_engage = true;
        self.change_combat_sub_state(CombatSubState::Retreating, services);
        true
    }

    fn tick_positioning(
        &mut self,
        delta: f32,
        target: Entity,
        agent_position: Vec3,
        target_position: Vec3,
        distance: f32,
        services: &mut AIServices,
    ) {
        if distance > self.config.preferred_combat_distance * POSITIONING_MAX_DISTANCE_FACTOR {
            self.change_combat_sub_state(CombatSubState::Engaging, services);
            return;
        }

        let decide = self.timers.time_since_last_reposition >= self.config.reposition_interval
            || distance <= self.config.attack_range;

        if decide {
            self.timers.time_since_last_reposition = 0.0;
            // Attack is due but we strafe out of reach: close in first
            if self.attack_ready() && distance > self.config.attack_range {
                self.change_combat_sub_state(CombatSubState::Engaging, services);
                return;
            }
            if self.attack_ready() {
                if let Some(handle) = self.select_ability(target, distance, services) {
                    self.pending_ability = Some(handle);
                    self.change_combat_sub_state(CombatSubState::WindingUp, services);
                    return;
                }
            }
        }

        if let Some(MoveOutcome::Failed) = self.take_move_outcome(services) {
            if self.fall_back_after_navigation_failures(services) {
                return;
            }
        }

        self.strafe_goal_elapsed += delta;
        if self.strafe_goal_elapsed < STRAFE_GOAL_REFRESH {
            return;
        }
        self.strafe_goal_elapsed = 0.0;

        let goal = self.strafe_goal(agent_position, target_position);
        let speed = self.config.strafe_speed;
        if self.request_move(MoveGoal::Point(goal), 0.25, speed, services) == MoveRequestResult::Failed {
            self.fall_back_after_navigation_failures(services);
        }
    }

    /// Next point on the circle of preferred radius around the target.
    fn strafe_goal(&self, agent_position: Vec3, target_position: Vec3) -> Vec3 {
        let radius = self.config.preferred_combat_distance.max(0.1);
        let offset = flatten(agent_position - target_position);
        let offset = if offset.length_squared() > f32::EPSILON {
            offset.normalize()
        } else {
            Vec3::X
        };

        // Aim one refresh period (times two) ahead along the arc
        let step = self.config.strafe_speed * STRAFE_GOAL_REFRESH * 2.0 / radius;
        let angle = if self.strafe_clockwise { -step } else { step };
        let rotated = Quat::from_rotation_y(angle) * offset;

        target_position + rotated * radius
    }

    fn select_ability(
        &mut self,
        target: Entity,
        distance: f32,
        services: &mut AIServices,
    ) -> Option<crate::ai::services::AbilityHandle> {
        let abilities = services.abilities.as_deref_mut()?;
        abilities.try_select_ability(self.agent, target, distance, &mut self.rng)
    }

    fn tick_winding_up(&mut self, services: &mut AIServices) {
        let base_hold = self.config.effective_wind_up_hold();
        let hold = if self.wind_up_extended {
            base_hold * (1.0 + WIND_UP_EXTENSION_FACTOR)
        } else {
            base_hold
        };

        let elapsed = self.timers.time_in_combat_sub_state;

        if self.config.enable_input_reading
            && !self.input_read_done
            && elapsed >= self.config.input_reading_reaction_time.min(base_hold)
        {
            self.input_read_done = true;

            let activity = self.target_activity(services.world);
            let punish_chance = if activity.healing {
                Some(self.config.punish_healing_chance)
            } else if activity.rolling {
                Some(self.config.punish_rolling_chance)
            } else {
                None
            };

            if let Some(chance) = punish_chance {
                if self.rng.gen::<f32>() < chance {
                    self.log(services, LogLevel::Debug, "read input, committing early");
                    self.begin_attack(services);
                    return;
                }

                if !self.wind_up_extended && base_hold > 0.0 {
                    self.wind_up_extended = true;
                    self.log(services, LogLevel::Debug, "read input, delaying swing");
                    return;
                }
            }
        }

        if elapsed >= hold {
            self.begin_attack(services);
        }
    }

    fn begin_attack(&mut self, services: &mut AIServices) {
        let Some(handle) = self.pending_ability else {
            self.change_combat_sub_state(CombatSubState::Positioning, services);
            return;
        };

        let started = services
            .abilities
            .as_deref_mut()
            .map(|abilities| abilities.start_ability(self.agent, handle))
            .unwrap_or(false);

        if started {
            self.ability_completed = false;
            self.change_combat_sub_state(CombatSubState::Attacking, services);
            self.outbox.push(AINotification::AttackStarted);
            self.log(services, LogLevel::Debug, &format!("attack {:?} started", handle));
        } else {
            self.log(services, LogLevel::Warning, &format!("ability {:?} failed to start", handle));
            self.change_combat_sub_state(CombatSubState::Positioning, services);
        }
    }

    fn tick_attacking(&mut self, services: &mut AIServices) {
        if self.ability_completed {
            self.finish_attack(services);
        } else if self.timers.time_in_combat_sub_state >= self.config.attack_timeout {
            self.log(services, LogLevel::Warning, "attack never completed, timing out");
            self.finish_attack(services);
        }
    }

    fn finish_attack(&mut self, services: &mut AIServices) {
        self.pending_ability = None;
        self.ability_completed = false;
        self.outbox.push(AINotification::AttackEnded);

        self.timers.time_since_last_attack = 0.0;
        self.timers.next_attack_delay = roll_attack_delay(&mut self.rng, &self.config);

        self.combo_count += 1;
        self.combo_pending = self.combo_count < self.config.max_combo_length
            && self.rng.gen::<f32>() < self.config.combo_chance;
        if !self.combo_pending {
            self.combo_count = 0;
        }

        self.change_combat_sub_state(CombatSubState::Recovering, services);
    }

    fn tick_recovering(&mut self, target: Entity, distance: f32, services: &mut AIServices) {
        if self.combo_pending {
            self.combo_pending = false;
            if let Some(handle) = self.select_ability(target, distance, services) {
                self.log(services, LogLevel::Debug, &format!("combo #{}", self.combo_count + 1));
                self.pending_ability = Some(handle);
                self.change_combat_sub_state(CombatSubState::WindingUp, services);
                return;
            }
            self.combo_count = 0;
        }

        if self.timers.time_in_combat_sub_state < self.config.post_attack_recovery {
            return;
        }

        let low_health = services
            .stats
            .and_then(|stats| stats.health_fraction(self.agent))
            .map(|fraction| fraction < self.config.low_health_retreat_threshold)
            .unwrap_or(false);

        if low_health && !self.config.is_boss {
            self.change_combat_sub_state(CombatSubState::Retreating, services);
        } else {
            self.change_combat_sub_state(CombatSubState::Positioning, services);
        }
    }

    fn tick_retreating(
        &mut self,
        agent_position: Vec3,
        target_position: Vec3,
        distance: f32,
        services: &mut AIServices,
    ) {
        let goal_distance = self.config.preferred_combat_distance + self.config.retreat_margin;

        if distance >= goal_distance || self.timers.time_in_combat_sub_state >= self.config.retreat_timeout {
            let next = if std::mem::take(&mut self.retreat_then_engage) {
                CombatSubState::Engaging
            } else {
                CombatSubState::Positioning
            };
            self.change_combat_sub_state(next, services);
            return;
        }

        // One failed attempt is enough, the timeout ends the retreat
        self.take_move_outcome(services);
        if self.is_moving() || self.navigation_failures > 0 {
            return;
        }

        let away = flatten(agent_position - target_position);
        let away = if away.length_squared() > f32::EPSILON {
            away.normalize()
        } else {
            Vec3::Z
        };
        let goal = agent_position + away * (goal_distance - distance + 0.5);
        let speed = self.config.walk_speed;
        self.request_move(MoveGoal::Point(goal), 0.25, speed, services);
    }

    fn tick_blocking(&mut self, services: &mut AIServices) {
        if self.timers.time_in_combat_sub_state < self.config.block_min_hold {
            return;
        }

        if !self.target_activity(services.world).attacking {
            self.change_combat_sub_state(CombatSubState::Positioning, services);
        }
    }
}

fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
