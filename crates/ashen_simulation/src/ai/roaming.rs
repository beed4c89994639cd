//! Non-combat handlers: Idle, Patrol, RandomRoam, Investigating, OutOfBounds,
//! plus the PoiseBroken/Uninterruptable countdowns.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::components::MainState;
use crate::ai::services::{AIServices, MoveGoal, MoveOutcome, MoveRequestResult};
use crate::logger::LogLevel;

use super::state_machine::{AIStateMachine, HOME_ACCEPTANCE_RADIUS};

/// Acceptance radius for patrol/roam/investigate points (meters)
const WAYPOINT_ACCEPTANCE_RADIUS: f32 = 0.5;

/// Random roam candidates tried per pick
const ROAM_POINT_ATTEMPTS: u32 = 5;

impl AIStateMachine {
    pub(super) fn tick_idle(&mut self, delta: f32, services: &mut AIServices) {
        if self.poll_perception(delta, services) {
            return;
        }

        if !self.patrol_path.is_empty() {
            self.set_state(MainState::Patrol, services);
        } else if self.config.roam_radius > 0.0
            && self.timers.time_in_current_state >= self.config.idle_roam_delay
        {
            self.set_state(MainState::RandomRoam, services);
        }
    }

    pub(super) fn tick_patrol(&mut self, delta: f32, agent_position: Vec3, services: &mut AIServices) {
        if self.poll_perception(delta, services) {
            return;
        }

        if !self.within_leash(agent_position) {
            self.set_state(MainState::OutOfBounds, services);
            return;
        }

        if self.patrol_path.is_empty() {
            self.set_state(MainState::Idle, services);
            return;
        }

        match self.take_move_outcome(services) {
            Some(MoveOutcome::Reached) => self.advance_patrol_point(),
            Some(MoveOutcome::Failed) => {
                if self.navigation_exhausted() {
                    self.log(services, LogLevel::Warning, "patrol point unreachable, skipping");
                    self.advance_patrol_point();
                }
            }
            None => {}
        }

        if self.is_moving() {
            return;
        }

        let Some(&point) = self.patrol_path.get(self.patrol_index) else {
            self.patrol_index = 0;
            return;
        };

        let speed = self.config.walk_speed;
        match self.request_move(MoveGoal::Point(point), WAYPOINT_ACCEPTANCE_RADIUS, speed, services) {
            MoveRequestResult::AlreadyAtGoal => self.advance_patrol_point(),
            MoveRequestResult::Failed => {
                if self.navigation_exhausted() {
                    self.log(services, LogLevel::Warning, "patrol point unreachable, skipping");
                    self.advance_patrol_point();
                }
            }
            MoveRequestResult::RequestSuccessful => {}
        }
    }

    /// Patrol paths loop.
    fn advance_patrol_point(&mut self) {
        if !self.patrol_path.is_empty() {
            self.patrol_index = (self.patrol_index + 1) % self.patrol_path.len();
        }
    }

    pub(super) fn tick_random_roam(&mut self, delta: f32, agent_position: Vec3, services: &mut AIServices) {
        if self.poll_perception(delta, services) {
            return;
        }

        if !self.within_leash(agent_position) {
            self.set_state(MainState::OutOfBounds, services);
            return;
        }

        if self.config.roam_radius <= 0.0 {
            self.set_state(MainState::Idle, services);
            return;
        }

        self.roam_point_elapsed += delta;

        match self.take_move_outcome(services) {
            Some(MoveOutcome::Reached) => self.roam_point = None,
            Some(MoveOutcome::Failed) => {
                if self.navigation_exhausted() {
                    self.roam_point = None;
                }
            }
            None => {}
        }

        if self.roam_point.is_some() && self.roam_point_elapsed >= self.config.roam_point_timeout {
            self.log(services, LogLevel::Debug, "roam point timed out");
            self.clear_pending_move(services);
            self.roam_point = None;
        }

        if self.is_moving() {
            return;
        }

        let point = match self.roam_point {
            Some(point) => point,
            None => {
                let Some(point) = self.pick_roam_point(services) else {
                    self.log(services, LogLevel::Debug, "no reachable roam point, idling");
                    self.set_state(MainState::Idle, services);
                    return;
                };
                self.roam_point = Some(point);
                self.roam_point_elapsed = 0.0;
                point
            }
        };

        let speed = self.config.walk_speed;
        match self.request_move(MoveGoal::Point(point), WAYPOINT_ACCEPTANCE_RADIUS, speed, services) {
            MoveRequestResult::AlreadyAtGoal => self.roam_point = None,
            MoveRequestResult::Failed => {
                if self.navigation_exhausted() {
                    self.roam_point = None;
                }
            }
            MoveRequestResult::RequestSuccessful => {}
        }
    }

    /// Uniform point in the roam disc around spawn that navigation can reach.
    fn pick_roam_point(&mut self, services: &AIServices) -> Option<Vec3> {
        let navigation = services.navigation.as_deref()?;

        for _ in 0..ROAM_POINT_ATTEMPTS {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let radius = self.config.roam_radius * self.rng.gen::<f32>().sqrt();
            let point = self.spawn_location + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);

            if navigation.is_reachable(self.agent, point) {
                return Some(point);
            }
        }

        None
    }

    pub(super) fn tick_investigating(&mut self, delta: f32, agent_position: Vec3, services: &mut AIServices) {
        if self.poll_perception(delta, services) {
            return;
        }

        if !self.within_leash(agent_position) {
            self.set_state(MainState::OutOfBounds, services);
            return;
        }

        if self.timers.time_in_current_state >= self.config.investigate_timeout {
            self.log(services, LogLevel::Debug, "investigation timed out");
            self.give_up_investigation(services);
            return;
        }

        let Some(location) = self.investigate_location else {
            self.give_up_investigation(services);
            return;
        };

        // Arrived: look around, then give up
        if let Some(waited) = self.investigate_arrived_elapsed.as_mut() {
            *waited += delta;
            if *waited >= self.config.investigate_wait_time {
                self.give_up_investigation(services);
            }
            return;
        }

        match self.take_move_outcome(services) {
            Some(MoveOutcome::Reached) => {
                self.investigate_arrived_elapsed = Some(0.0);
                return;
            }
            Some(MoveOutcome::Failed) => {
                if self.navigation_exhausted() {
                    self.log(services, LogLevel::Warning, "cannot reach stimulus, giving up");
                    self.give_up_investigation(services);
                    return;
                }
            }
            None => {}
        }

        if self.is_moving() {
            return;
        }

        let speed = self.travel_speed(agent_position.distance(location));
        match self.request_move(MoveGoal::Point(location), WAYPOINT_ACCEPTANCE_RADIUS, speed, services) {
            MoveRequestResult::AlreadyAtGoal => self.investigate_arrived_elapsed = Some(0.0),
            MoveRequestResult::Failed => {
                if self.navigation_exhausted() {
                    self.log(services, LogLevel::Warning, "cannot reach stimulus, giving up");
                    self.give_up_investigation(services);
                }
            }
            MoveRequestResult::RequestSuccessful => {}
        }
    }

    fn give_up_investigation(&mut self, services: &mut AIServices) {
        self.investigate_location = None;
        let next = self.investigate_return_state;
        let next = if next == MainState::Investigating { self.home_state() } else { next };
        self.set_state(next, services);
    }

    pub(super) fn tick_out_of_bounds(&mut self, agent_position: Vec3, services: &mut AIServices) {
        let home = self.home_state();
        let distance = agent_position.distance(self.spawn_location);

        if distance <= HOME_ACCEPTANCE_RADIUS {
            self.set_state(home, services);
            return;
        }

        match self.take_move_outcome(services) {
            Some(MoveOutcome::Reached) => {
                self.set_state(home, services);
                return;
            }
            Some(MoveOutcome::Failed) => {
                if self.navigation_exhausted() {
                    self.log(services, LogLevel::Warning, "cannot path home, idling here");
                    self.set_state(MainState::Idle, services);
                    return;
                }
            }
            None => {}
        }

        if self.is_moving() {
            return;
        }

        let speed = self.travel_speed(distance);
        let spawn = self.spawn_location;
        match self.request_move(MoveGoal::Point(spawn), HOME_ACCEPTANCE_RADIUS, speed, services) {
            MoveRequestResult::AlreadyAtGoal => self.set_state(home, services),
            MoveRequestResult::Failed => {
                if self.navigation_exhausted() {
                    self.log(services, LogLevel::Warning, "cannot path home, idling here");
                    self.set_state(MainState::Idle, services);
                }
            }
            MoveRequestResult::RequestSuccessful => {}
        }
    }

    pub(super) fn tick_poise_broken(&mut self, services: &mut AIServices) {
        if self.timers.time_in_current_state < self.config.poise_broken_duration {
            return;
        }

        let target_in_range = self
            .target_position(services.world)
            .map(|(_, position)| self.within_leash(position))
            .unwrap_or(false);

        if target_in_range {
            self.set_state(MainState::Combat, services);
            return;
        }

        let next = match self.previous_state {
            MainState::Combat | MainState::PoiseBroken | MainState::Uninterruptable | MainState::Dead => {
                self.target = None;
                self.home_state()
            }
            state => state,
        };
        self.set_state(next, services);
    }

    pub(super) fn tick_uninterruptable(&mut self, services: &mut AIServices) {
        if self.timers.time_in_current_state >= self.config.special_move_timeout {
            self.log(services, LogLevel::Warning, "special move never completed, timing out");
            self.finish_special_move(services);
        }
    }
}
