//! BrawlSim - Action Combat Behavior Simulator
//!
//! The behavioral core of a 2D action game, extracted from its
//! presentation layer: a generic state machine engine, stat sheets and
//! damage resolution with parry and boss-evade draws, timed attack and
//! combo sequencing, and per-role behavior graphs for the player,
//! regular monsters, and a pattern-driven boss.
//!
//! This library exposes the core modules for testing and reuse.

pub mod brains;
pub mod cli;
pub mod combat;
pub mod config;
pub mod fsm;
pub mod headless;
pub mod stats;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::{Outcome, ScenarioConfig, ScenarioResult};
pub use stats::{StatKind, StatSheet};
