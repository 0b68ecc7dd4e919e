//! BrawlSim - Action Combat Behavior Simulator
//!
//! Runs the behavioral core of a 2D action game headlessly: a player
//! character, monsters, and a boss fight it out under scripted input,
//! and the outcome is reported on stdout and in the combat log.

use std::process::ExitCode;

use brawlsim::cli;
use brawlsim::headless::{run_scenario, Outcome, ScenarioConfig};

fn main() -> ExitCode {
    let args = cli::parse_args();

    let mut config = match ScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading scenario: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // CLI flags override the scenario file.
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_secs = max_duration;
    }
    if let Some(output) = args.output {
        config.output_path = Some(output.display().to_string());
    }

    println!("Starting headless scenario simulation...");
    if let Some(player) = &config.player {
        println!("  Player: {}", player.archetype);
    }
    println!(
        "  Hostiles: {:?}",
        config
            .hostiles
            .iter()
            .map(|h| h.archetype.as_str())
            .collect::<Vec<_>>()
    );
    println!("  Max duration: {:.0}s", config.max_duration_secs);
    if let Some(seed) = config.seed {
        println!("  Seed: {}", seed);
    }

    let result = match run_scenario(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Scenario failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!();
    println!(
        "Outcome: {} after {:.1}s",
        match result.outcome {
            Outcome::PlayerVictory => "player victory",
            Outcome::PlayerDefeat => "player defeat",
            Outcome::Draw => "draw",
        },
        result.elapsed
    );
    for unit in &result.units {
        println!(
            "  {:<12} {:?}: {:.1}/{:.1} hp, dealt {:.1}, taken {:.1}{}",
            unit.id,
            unit.role,
            unit.final_health,
            unit.max_health,
            unit.damage_dealt,
            unit.damage_taken,
            if unit.survived { "" } else { " (dead)" }
        );
    }

    ExitCode::SUCCESS
}
