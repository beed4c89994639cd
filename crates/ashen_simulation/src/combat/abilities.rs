//! AbilitySet — combat abilities of an actor
//!
//! - Selection: weighted random choice among abilities whose max distance and
//!   cooldown allow use (read by AI through `AbilitySelector`)
//! - Execution: one active ability at a time, hit lands at `hit_time`,
//!   `AbilityExecutionComplete` when `duration` elapses

use bevy::prelude::*;
use rand::{Rng, RngCore};

use crate::ai::services::AbilityHandle;
use crate::components::{ActorActivity, Health};

use super::damage::AttackHit;

/// One ability (light swing, heavy slam, ...)
#[derive(Debug, Clone, Reflect)]
pub struct Ability {
    pub handle: AbilityHandle,
    pub name: String,
    /// Usable only when the target is at most this far (meters)
    pub max_distance: f32,
    pub cooldown: f32,
    /// Total execution time (seconds)
    pub duration: f32,
    /// Moment of the damage check, in [0, duration]
    pub hit_time: f32,
    pub damage: u32,
    pub poise_damage: f32,
    /// Selection weight (relative)
    pub weight: f32,
}

impl Ability {
    pub fn melee(id: u32, name: &str, damage: u32, poise_damage: f32) -> Self {
        Self {
            handle: AbilityHandle(id),
            name: name.to_string(),
            max_distance: 3.0,
            cooldown: 1.0,
            duration: 0.8,
            hit_time: 0.4,
            damage,
            poise_damage,
            weight: 1.0,
        }
    }
}

/// Ability currently executing
#[derive(Debug, Clone, Copy, Reflect)]
pub struct ActiveAbility {
    pub handle: AbilityHandle,
    pub target: Option<Entity>,
    pub elapsed: f32,
    pub hit_applied: bool,
}

#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AbilitySet {
    pub abilities: Vec<Ability>,
    /// Remaining cooldown per ability (same order as `abilities`)
    pub cooldowns: Vec<f32>,
    pub active: Option<ActiveAbility>,
    /// Target of the last selection, the hit is checked against it
    pub selected_target: Option<Entity>,
}

impl AbilitySet {
    pub fn new(abilities: Vec<Ability>) -> Self {
        let cooldowns = vec![0.0; abilities.len()];
        Self {
            abilities,
            cooldowns,
            active: None,
            selected_target: None,
        }
    }

    fn index_of(&self, handle: AbilityHandle) -> Option<usize> {
        self.abilities.iter().position(|a| a.handle == handle)
    }

    pub fn get(&self, handle: AbilityHandle) -> Option<&Ability> {
        self.index_of(handle).map(|i| &self.abilities[i])
    }

    pub fn is_ready(&self, index: usize) -> bool {
        self.cooldowns.get(index).copied().unwrap_or(0.0) <= 0.0
    }

    /// Weighted random pick among abilities usable at `distance`.
    pub fn select(&mut self, target: Entity, distance: f32, rng: &mut dyn RngCore) -> Option<AbilityHandle> {
        if self.active.is_some() {
            return None;
        }

        let usable: Vec<(AbilityHandle, f32)> = self
            .abilities
            .iter()
            .enumerate()
            .filter(|(i, a)| distance <= a.max_distance && self.is_ready(*i) && a.weight > 0.0)
            .map(|(_, a)| (a.handle, a.weight))
            .collect();

        let total: f32 = usable.iter().map(|(_, w)| w).sum();
        if usable.is_empty() || total <= 0.0 {
            return None;
        }

        let mut roll = rng.gen::<f32>() * total;
        let mut chosen = usable[usable.len() - 1].0;
        for (handle, weight) in &usable {
            if roll < *weight {
                chosen = *handle;
                break;
            }
            roll -= weight;
        }

        self.selected_target = Some(target);
        Some(chosen)
    }

    /// Starts execution. `false` if busy, unknown or on cooldown.
    pub fn start(&mut self, handle: AbilityHandle) -> bool {
        if self.active.is_some() {
            return false;
        }

        let Some(index) = self.index_of(handle) else {
            return false;
        };

        if !self.is_ready(index) {
            return false;
        }

        self.cooldowns[index] = self.abilities[index].cooldown;
        self.active = Some(ActiveAbility {
            handle,
            target: self.selected_target,
            elapsed: 0.0,
            hit_applied: false,
        });
        true
    }

    /// Drops the active ability if it is `handle`. The cooldown stays spent.
    pub fn cancel(&mut self, handle: AbilityHandle) -> bool {
        match self.active {
            Some(active) if active.handle == handle => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    pub fn tick_cooldowns(&mut self, delta: f32) {
        for cooldown in self.cooldowns.iter_mut() {
            *cooldown = (*cooldown - delta).max(0.0);
        }
    }
}

/// Event: ability finished executing (not sent when the caster dies mid-swing)
#[derive(Event, Debug, Clone, Copy)]
pub struct AbilityExecutionComplete {
    pub entity: Entity,
    pub handle: AbilityHandle,
}

/// System: cooldowns + active ability execution
///
/// Hit lands at `hit_time` if the target is still within reach
/// (max_distance + 0.5m slack for movement during the swing).
pub fn advance_abilities(
    mut casters: Query<(Entity, &mut AbilitySet, &mut ActorActivity, &Transform, &Health)>,
    positions: Query<&Transform>,
    mut hits: EventWriter<AttackHit>,
    mut completed: EventWriter<AbilityExecutionComplete>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut set, mut activity, transform, health) in casters.iter_mut() {
        set.tick_cooldowns(delta);

        let Some(mut active) = set.active else {
            activity.attacking = false;
            continue;
        };

        if !health.is_alive() {
            set.active = None;
            activity.attacking = false;
            continue;
        }

        let Some(ability) = set.get(active.handle).cloned() else {
            set.active = None;
            activity.attacking = false;
            completed.write(AbilityExecutionComplete { entity, handle: active.handle });
            continue;
        };

        active.elapsed += delta;
        activity.attacking = true;

        if !active.hit_applied && active.elapsed >= ability.hit_time {
            active.hit_applied = true;

            let target_position = active
                .target
                .and_then(|target| positions.get(target).ok().map(|t| t.translation));

            if let (Some(target), Some(position)) = (active.target, target_position) {
                if transform.translation.distance(position) <= ability.max_distance + 0.5 {
                    hits.write(AttackHit {
                        attacker: entity,
                        target,
                        damage: ability.damage,
                        poise_damage: ability.poise_damage,
                    });
                }
            }
        }

        if active.elapsed >= ability.duration {
            set.active = None;
            activity.attacking = false;
            completed.write(AbilityExecutionComplete { entity, handle: active.handle });
        } else {
            set.active = Some(active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_set() -> AbilitySet {
        let mut heavy = Ability::melee(2, "heavy", 40, 30.0);
        heavy.max_distance = 1.5;
        heavy.cooldown = 3.0;
        AbilitySet::new(vec![Ability::melee(1, "light", 15, 10.0), heavy])
    }

    #[test]
    fn test_select_respects_max_distance() {
        let mut set = test_set();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..20 {
            let handle = set.select(Entity::PLACEHOLDER, 2.0, &mut rng);
            assert_eq!(handle, Some(AbilityHandle(1)));
        }

        assert_eq!(set.select(Entity::PLACEHOLDER, 10.0, &mut rng), None);
    }

    #[test]
    fn test_start_sets_cooldown() {
        let mut set = test_set();

        assert!(set.start(AbilityHandle(2)));
        assert!(!set.start(AbilityHandle(1)), "only one active ability");

        set.active = None;
        assert!(!set.start(AbilityHandle(2)), "heavy is on cooldown");

        set.tick_cooldowns(3.0);
        assert!(set.start(AbilityHandle(2)));
    }

    #[test]
    fn test_select_skips_cooldown() {
        let mut set = test_set();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        assert!(set.start(AbilityHandle(1)));
        set.active = None;

        for _ in 0..20 {
            assert_eq!(set.select(Entity::PLACEHOLDER, 1.0, &mut rng), Some(AbilityHandle(2)));
        }
    }

    #[test]
    fn test_cancel_only_drops_matching_ability() {
        let mut set = test_set();
        assert!(set.start(AbilityHandle(1)));

        assert!(!set.cancel(AbilityHandle(2)));
        assert!(set.active.is_some());

        assert!(set.cancel(AbilityHandle(1)));
        assert!(set.active.is_none());
        assert!(!set.is_ready(0), "cancelling keeps the cooldown");
    }

    #[test]
    fn test_unknown_handle_does_not_start() {
        let mut set = test_set();
        assert!(!set.start(AbilityHandle(99)));
        assert!(set.active.is_none());
    }
}
