//! AI components

pub mod agent;
pub mod config;
pub mod fsm;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod fsm_tests;

// Re-export all components
pub use agent::*;
pub use config::*;
pub use fsm::*;
