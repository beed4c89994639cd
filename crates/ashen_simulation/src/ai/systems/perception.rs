//! Perception systems: headless proximity sensing + SpottedEnemies tracking.

use bevy::prelude::*;

use crate::ai::components::{AIConfig, SpottedEnemies};
use crate::ai::events::PerceptionEvent;
use crate::components::{Actor, Health};

/// Lost only beyond sight range × this (no flicker at the edge)
const LOST_SIGHT_HYSTERESIS: f32 = 1.1;

/// System: proximity sensing (headless vision cone)
///
/// Sends ActorSpotted when a living enemy enters `sight_range` and ActorLost
/// when it leaves `sight_range × 1.1`.
pub fn sense_nearby_actors(
    observers: Query<(Entity, &Actor, &Transform, &AIConfig, &SpottedEnemies)>,
    candidates: Query<(Entity, &Actor, &Transform, &Health)>,
    mut perception_events: EventWriter<PerceptionEvent>,
) {
    for (observer, observer_actor, observer_transform, config, spotted) in observers.iter() {
        for (target, target_actor, target_transform, health) in candidates.iter() {
            if target == observer || target_actor.faction_id == observer_actor.faction_id {
                continue;
            }

            let distance = observer_transform.translation.distance(target_transform.translation);
            let known = spotted.enemies.contains(&target);

            if !known && health.is_alive() && distance <= config.sight_range {
                perception_events.write(PerceptionEvent::ActorSpotted { observer, target });
            } else if known && distance > config.sight_range * LOST_SIGHT_HYSTERESIS {
                perception_events.write(PerceptionEvent::ActorLost { observer, target });
            }
        }
    }
}

/// System: apply PerceptionEvent to SpottedEnemies, then drop dead entries
///
/// Factions are already filtered by `sense_nearby_actors`. Deaths never
/// produce ActorLost, so corpses are pruned here.
pub fn update_spotted_enemies(
    mut observers: Query<&mut SpottedEnemies>,
    mut perception_events: EventReader<PerceptionEvent>,
    health: Query<&Health>,
) {
    for event in perception_events.read() {
        let (observer, target, spotted_now) = match *event {
            PerceptionEvent::ActorSpotted { observer, target } => (observer, target, true),
            PerceptionEvent::ActorLost { observer, target } => (observer, target, false),
        };

        let Ok(mut spotted) = observers.get_mut(observer) else {
            continue;
        };

        let known = spotted.enemies.contains(&target);
        if spotted_now && !known {
            spotted.enemies.push(target);
            crate::logger::log(&format!("AI {:?}: spotted {:?}", observer, target));
        } else if !spotted_now && known {
            spotted.enemies.retain(|&e| e != target);
            crate::logger::log(&format!("AI {:?}: lost {:?}", observer, target));
        }
    }

    let alive = |e: Entity| health.get(e).is_ok_and(|h| h.is_alive());
    for mut spotted in observers.iter_mut() {
        if !spotted.enemies.iter().all(|&e| alive(e)) {
            spotted.enemies.retain(|&e| alive(e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perception_app() -> App {
        let mut app = App::new();
        app.add_event::<PerceptionEvent>()
            .add_systems(Update, update_spotted_enemies);
        app
    }

    #[test]
    fn test_spotted_then_lost() {
        let mut app = perception_app();
        let observer = app.world_mut().spawn(SpottedEnemies::default()).id();
        let target = app.world_mut().spawn(Health::new(50)).id();

        app.world_mut().send_event(PerceptionEvent::ActorSpotted { observer, target });
        app.world_mut().send_event(PerceptionEvent::ActorSpotted { observer, target });
        app.update();
        assert_eq!(app.world().get::<SpottedEnemies>(observer).map(|s| s.enemies.clone()), Some(vec![target]));

        app.world_mut().send_event(PerceptionEvent::ActorLost { observer, target });
        app.update();
        assert!(app.world().get::<SpottedEnemies>(observer).is_some_and(|s| s.enemies.is_empty()));
    }

    #[test]
    fn test_dead_targets_pruned() {
        let mut app = perception_app();
        let observer = app.world_mut().spawn(SpottedEnemies::default()).id();
        let target = app.world_mut().spawn(Health::new(50)).id();

        app.world_mut().send_event(PerceptionEvent::ActorSpotted { observer, target });
        app.update();

        if let Some(mut health) = app.world_mut().get_mut::<Health>(target) {
            health.take_damage(50);
        }
        app.update();

        assert!(app.world().get::<SpottedEnemies>(observer).is_some_and(|s| s.enemies.is_empty()));
    }
}
