//! Command-line interface for BrawlSim
//!
//! The binary runs headless scenarios only; there is no graphical mode.

use clap::Parser;
use std::path::PathBuf;

/// Action combat behavior simulator
#[derive(Parser, Debug)]
#[command(name = "brawlsim")]
#[command(about = "Action combat behavior simulator")]
#[command(version)]
pub struct Args {
    /// JSON scenario file to run
    #[arg(value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Random seed for deterministic reproduction (overrides the scenario file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output path for the combat log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum scenario duration in seconds (overrides the scenario file)
    #[arg(long)]
    pub max_duration: Option<f32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
