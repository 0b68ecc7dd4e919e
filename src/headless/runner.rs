//! Headless scenario execution
//!
//! Runs combat scenarios without any graphical output, suitable for
//! automated testing. The app advances in fixed steps, so a seeded
//! scenario replays tick-for-tick.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::time::Duration;

use crate::brains::spawn_unit;
use crate::combat::components::{GameRng, PlayerInput, SimStep, Unit};
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::combat::{CombatPlugin, SimPhase};
use crate::config::{UnitDefs, UnitRole};
use crate::stats::{StatKind, StatSheet};

use super::config::ScenarioConfig;

/// How the scenario ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All hostiles died while the player lived
    PlayerVictory,
    /// The player died
    PlayerDefeat,
    /// Timeout, or both sides eliminated on the same tick
    Draw,
}

/// Result of a completed headless scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub outcome: Outcome,
    /// Scenario duration in seconds of simulated time
    pub elapsed: f32,
    /// Per-unit statistics at scenario end
    pub units: Vec<UnitResult>,
    /// Random seed used (if deterministic mode)
    pub seed: Option<u64>,
}

/// Statistics for a single unit after the scenario
#[derive(Debug, Clone)]
pub struct UnitResult {
    pub id: String,
    pub role: UnitRole,
    pub max_health: f32,
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

/// Resource tracking headless scenario progress
#[derive(Resource)]
pub struct HeadlessState {
    pub max_duration: f32,
    pub elapsed: f32,
    pub complete: bool,
    pub output_path: Option<String>,
    pub seed: Option<u64>,
    pub result: Option<ScenarioResult>,
}

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub config: ScenarioConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.config.seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => GameRng::from_entropy(),
        };

        app.insert_resource(rng)
            .insert_resource(HeadlessState {
                max_duration: self.config.max_duration_secs,
                elapsed: 0.0,
                complete: false,
                output_path: self.config.output_path.clone(),
                seed: self.config.seed,
                result: None,
            })
            .insert_resource(self.config.clone())
            .add_plugins(CombatPlugin)
            .add_systems(Startup, setup_scenario)
            .add_systems(
                Update,
                (track_time, check_scenario_end)
                    .chain()
                    .after(SimPhase::Cleanup),
            )
            .add_systems(PostUpdate, exit_on_complete);
    }
}

fn setup_scenario(
    mut commands: Commands,
    config: Res<ScenarioConfig>,
    defs: Res<UnitDefs>,
    mut rng: ResMut<GameRng>,
    mut input: ResMut<PlayerInput>,
    mut log: ResMut<CombatLog>,
) {
    log.clear();
    log.log(
        CombatLogEventType::Scenario,
        "Scenario started (headless mode)".to_string(),
    );
    input.autopilot = config.autopilot;

    for entry in config.player.iter().chain(config.hostiles.iter()) {
        let pos = Vec2::new(entry.position[0], entry.position[1]);
        if let Err(e) = spawn_unit(&mut commands, &defs, &entry.archetype, pos, &mut rng) {
            // Archetypes were validated against the table before launch.
            panic!("failed to spawn '{}': {}", entry.archetype, e);
        }
    }

    info!(
        "Headless scenario setup complete: {} player, {} hostiles",
        config.player.iter().count(),
        config.hostiles.len()
    );
}

fn track_time(step: Res<SimStep>, mut state: ResMut<HeadlessState>) {
    if !state.complete {
        state.elapsed += step.dt;
    }
}

/// Declare the outcome once one side is wiped out or the clock runs out.
fn check_scenario_end(
    units: Query<(&Unit, &StatSheet)>,
    config: Res<ScenarioConfig>,
    mut state: ResMut<HeadlessState>,
    mut log: ResMut<CombatLog>,
) {
    if state.complete {
        return;
    }

    let player_alive = units
        .iter()
        .any(|(u, _)| !u.role.is_hostile() && !u.is_dead);
    let hostiles_alive = units.iter().any(|(u, _)| u.role.is_hostile() && !u.is_dead);

    // Victory and defeat only exist when both sides were spawned; a
    // one-sided scenario runs until the clock, or until everyone is gone.
    let both_sides = config.player.is_some() && !config.hostiles.is_empty();

    let outcome = if state.elapsed >= state.max_duration {
        Some(Outcome::Draw)
    } else if !both_sides {
        (!player_alive && !hostiles_alive).then_some(Outcome::Draw)
    } else if !player_alive && !hostiles_alive {
        Some(Outcome::Draw)
    } else if !player_alive {
        Some(Outcome::PlayerDefeat)
    } else if !hostiles_alive {
        Some(Outcome::PlayerVictory)
    } else {
        None
    };

    let Some(outcome) = outcome else { return };

    log.log(
        CombatLogEventType::Scenario,
        format!("Scenario ended after {:.1}s: {:?}", state.elapsed, outcome),
    );
    info!("Scenario ended after {:.1}s: {:?}", state.elapsed, outcome);

    let unit_results = units
        .iter()
        .map(|(unit, sheet)| UnitResult {
            id: unit.id.clone(),
            role: unit.role,
            max_health: sheet.value(StatKind::HealthMax),
            final_health: sheet.value(StatKind::HealthCur),
            survived: !unit.is_dead,
            damage_dealt: unit.damage_dealt,
            damage_taken: unit.damage_taken,
        })
        .collect();

    if let Some(path) = state.output_path.clone() {
        match log.save_to_file(&path) {
            Ok(()) => println!("Scenario complete. Log saved to: {}", path),
            Err(e) => eprintln!("Failed to save combat log: {}", e),
        }
    }

    state.result = Some(ScenarioResult {
        outcome,
        elapsed: state.elapsed,
        units: unit_results,
        seed: state.seed,
    });
    state.complete = true;
}

/// Exit the app when the scenario is complete
fn exit_on_complete(state: Res<HeadlessState>, mut exit: EventWriter<AppExit>) {
    if state.complete {
        exit.send(AppExit::Success);
    }
}

/// Build a scenario app without running it. Tests drive it with
/// `app.update()` to fast-forward simulated time.
pub fn build_scenario_app(config: ScenarioConfig) -> Result<App, String> {
    config.validate()?;
    let defs = crate::config::load_unit_defs()?;
    config.validate_against(&defs)?;

    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
    )
    .add_plugins(TransformPlugin)
    .insert_resource(defs)
    .add_plugins(HeadlessPlugin { config });
    Ok(app)
}

/// Run a headless scenario to completion and return its result.
pub fn run_scenario(config: ScenarioConfig) -> Result<ScenarioResult, String> {
    let max_duration = config.max_duration_secs;
    let mut app = build_scenario_app(config)?;

    let dt = app.world().resource::<SimStep>().dt;
    // Timeout plus slack; the end-check system fires well before this.
    let max_ticks = (max_duration / dt).ceil() as u64 + 120;
    for _ in 0..max_ticks {
        app.update();
        if app.world().resource::<HeadlessState>().complete {
            break;
        }
    }

    let mut state = app.world_mut().resource_mut::<HeadlessState>();
    state
        .result
        .take()
        .ok_or_else(|| "scenario did not complete".to_string())
}
