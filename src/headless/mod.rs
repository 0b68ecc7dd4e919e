//! Headless mode for automated testing
//!
//! Runs combat scenarios without any graphical output, suitable for
//! balance sweeps and scripted regression tests.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless scenario
//! cargo run --release -- scenario.json --seed 42
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "player": { "archetype": "swordsman", "position": [0.0, 0.0] },
//!   "hostiles": [
//!     { "archetype": "grunt", "position": [6.0, 0.0] },
//!     { "archetype": "archer", "position": [10.0, 2.0] }
//!   ],
//!   "seed": 42,
//!   "max_duration_secs": 120
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{ScenarioConfig, SpawnEntry};
pub use runner::{build_scenario_app, run_scenario, Outcome, ScenarioResult};
