//! ECS Components for game entities
//!
//! Organized by domain:
//! - actor: base stats (faction, health, poise, activity)
//! - movement: navigation and movement (MovementCommand, NavigationState, MovementSpeed)
//! - world: world resources (WalkableArea)

pub mod actor;
pub mod movement;
pub mod world;

// Re-exports
pub use actor::*;
pub use movement::*;
pub use world::*;
