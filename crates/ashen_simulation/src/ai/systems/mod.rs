//! AI systems (ECS side of the state machine)

pub mod fsm;
pub mod perception;
pub mod services;

// Re-export all systems
pub use fsm::*;
pub use perception::*;
