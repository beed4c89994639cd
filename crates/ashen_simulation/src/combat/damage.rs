//! Damage application: health, poise, death
//!
//! AttackHit (from ability execution) → Health/Poise →
//! DamageDealt + PoiseBroken + EntityDied events.

use bevy::prelude::*;

use crate::components::{Health, Poise};

/// Event: an ability connected (hit check passed)
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackHit {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub poise_damage: f32,
}

/// Event: damage applied
///
/// For UI, sounds, effects.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub target_died: bool,
}

/// Event: poise depleted, the entity staggers
#[derive(Event, Debug, Clone, Copy)]
pub struct PoiseBroken {
    pub entity: Entity,
    pub attacker: Entity,
}

/// Event: entity died (health reached 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Marker: entity is dead (Health == 0)
///
/// Corpses stay in the world, respawn removes the marker.
#[derive(Component, Debug)]
pub struct Dead;

/// System: apply AttackHit events
///
/// 1. Skip dead targets (no double death)
/// 2. Health damage, then poise damage
/// 3. DamageDealt / PoiseBroken / EntityDied events, Dead marker
pub fn apply_damage(
    mut commands: Commands,
    mut hit_events: EventReader<AttackHit>,
    mut damage_dealt_events: EventWriter<DamageDealt>,
    mut poise_broken_events: EventWriter<PoiseBroken>,
    mut entity_died_events: EventWriter<EntityDied>,
    mut targets: Query<(&mut Health, Option<&mut Poise>)>,
) {
    for hit in hit_events.read() {
        let Ok((mut health, poise)) = targets.get_mut(hit.target) else {
            crate::logger::log_warning(&format!("AttackHit: target {:?} has no Health", hit.target));
            continue;
        };

        if !health.is_alive() {
            continue;
        }

        health.take_damage(hit.damage);
        let died = !health.is_alive();

        damage_dealt_events.write(DamageDealt {
            attacker: hit.attacker,
            target: hit.target,
            damage: hit.damage,
            target_died: died,
        });

        if died {
            commands.entity(hit.target).insert(Dead);
            entity_died_events.write(EntityDied {
                entity: hit.target,
                killer: Some(hit.attacker),
            });
            crate::logger::log_info(&format!("{:?} killed {:?}", hit.attacker, hit.target));
            continue;
        }

        if let Some(mut poise) = poise {
            if poise.take_damage(hit.poise_damage) {
                poise_broken_events.write(PoiseBroken {
                    entity: hit.target,
                    attacker: hit.attacker,
                });
                crate::logger::log(&format!("{:?} poise broken by {:?}", hit.target, hit.attacker));
            }
        }
    }
}

/// System: poise regeneration
pub fn regenerate_poise(mut query: Query<(&mut Poise, &Health)>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for (mut poise, health) in query.iter_mut() {
        if health.is_alive() {
            poise.regenerate(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damage_app() -> App {
        let mut app = App::new();
        app.add_event::<AttackHit>()
            .add_event::<DamageDealt>()
            .add_event::<PoiseBroken>()
            .add_event::<EntityDied>()
            .add_systems(Update, apply_damage);
        app
    }

    #[test]
    fn test_poise_break_event() {
        let mut app = damage_app();
        let attacker = app.world_mut().spawn_empty().id();
        let target = app.world_mut().spawn((Health::new(100), Poise::new(20.0))).id();

        app.world_mut().send_event(AttackHit { attacker, target, damage: 10, poise_damage: 25.0 });
        app.update();

        let broken = app.world().resource::<Events<PoiseBroken>>();
        assert_eq!(broken.len(), 1);
        assert_eq!(app.world().get::<Health>(target).map(|h| h.current), Some(90));
    }

    #[test]
    fn test_lethal_hit_marks_dead_once() {
        let mut app = damage_app();
        let attacker = app.world_mut().spawn_empty().id();
        let target = app.world_mut().spawn((Health::new(30), Poise::new(20.0))).id();

        app.world_mut().send_event(AttackHit { attacker, target, damage: 50, poise_damage: 50.0 });
        app.world_mut().send_event(AttackHit { attacker, target, damage: 50, poise_damage: 50.0 });
        app.update();

        let died = app.world().resource::<Events<EntityDied>>();
        assert_eq!(died.len(), 1);
        // Dead entities don't stagger
        assert_eq!(app.world().resource::<Events<PoiseBroken>>().len(), 0);
        assert!(app.world().get::<Dead>(target).is_some());
    }
}
