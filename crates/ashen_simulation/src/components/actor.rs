//! Base actor components: Actor, Health, Poise, ActorActivity

use bevy::prelude::*;

/// Actor (enemy, boss, player stand-in) — base component of anything alive
///
/// Adds Health, Poise, ActorActivity and Transform through Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, Poise, ActorActivity, Transform)]
pub struct Actor {
    /// Stable faction ID (same faction = allies)
    pub faction_id: u64,
}

/// Health
///
/// Invariant: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = (self.current + amount).min(self.max);
    }

    /// current / max in [0, 1] (0 for a zero-max record)
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }
}

/// Poise — stagger resistance
///
/// Depleted → `PoiseBroken` event, refills to max immediately.
/// Regenerates after `regen_delay` seconds without poise damage.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Poise {
    pub current: f32,
    pub max: f32,
    /// units per second
    pub regen_rate: f32,
    pub regen_delay: f32,
    pub time_since_hit: f32,
}

impl Default for Poise {
    fn default() -> Self {
        Self::new(50.0)
    }
}

impl Poise {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate: 10.0,
            regen_delay: 2.0,
            time_since_hit: 0.0,
        }
    }

    /// Applies poise damage. `true` = poise broke (and was refilled).
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.time_since_hit = 0.0;
        self.current -= amount.max(0.0);

        if self.current <= 0.0 {
            self.current = self.max;
            true
        } else {
            false
        }
    }

    pub fn regenerate(&mut self, delta: f32) {
        self.time_since_hit += delta;
        if self.time_since_hit >= self.regen_delay {
            self.current = (self.current + self.regen_rate * delta).min(self.max);
        }
    }
}

/// What the actor is doing right now (read by enemy AI input reading)
///
/// `attacking` is maintained by the ability system, `healing`/`rolling` by
/// whoever drives the actor (player input, scripted dummies).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ActorActivity {
    pub healing: bool,
    pub rolling: bool,
    pub attacking: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_fraction() {
        let mut health = Health::new(200);
        assert_eq!(health.fraction(), 1.0);

        health.take_damage(50);
        assert_eq!(health.fraction(), 0.75);

        health.take_damage(500);
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
        assert_eq!(Health { current: 0, max: 0 }.fraction(), 0.0);
    }

    #[test]
    fn test_poise_break_refills() {
        let mut poise = Poise::new(30.0);

        assert!(!poise.take_damage(20.0));
        assert_eq!(poise.current, 10.0);

        assert!(poise.take_damage(15.0));
        assert_eq!(poise.current, 30.0);
    }

    #[test]
    fn test_poise_regen_waits_for_delay() {
        let mut poise = Poise::new(30.0);
        poise.take_damage(20.0);

        poise.regenerate(1.0);
        assert_eq!(poise.current, 10.0);

        poise.regenerate(1.0);
        assert!(poise.current > 10.0);
    }
}
