//! Headless Nebula planet-surface flight.
//!
//! Loads `config.ron`, focuses the start planet and flies the scripted
//! descent, patrol and climb-out through the surface session manager,
//! logging every transition along the way.
//!
//! Run with: `cargo run -p nebula-game -- --planet mars`

use clap::Parser;
use nebula_config::{CliArgs, Config};
use nebula_game::flight::{FlightPlan, FlightProfile};
use nebula_game::{RunOptions, build_manager, run_flight};
use nebula_surface::PlanetId;
use tracing::{info, warn};

/// CLI arguments for the game binary.
#[derive(Parser, Debug)]
#[command(name = "nebula-game", about = "Headless Nebula planet-surface flight")]
struct GameArgs {
    #[command(flatten)]
    session: CliArgs,

    /// Tick limit for the flight.
    #[arg(long, default_value_t = 6000)]
    ticks: u64,

    /// Run at wall-clock speed instead of as fast as possible.
    #[arg(long)]
    realtime: bool,
}

fn main() {
    let args = GameArgs::parse();

    let config_dir = args.session.config.clone().or_else(Config::default_dir);
    let (mut config, load_error) = match config_dir.as_deref() {
        Some(dir) => match Config::load_or_create(dir) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
        None => (Config::default(), None),
    };
    config.apply_cli_overrides(&args.session);

    let log_dir = config_dir.as_ref().map(|dir| dir.join("logs"));
    nebula_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    if let Some(e) = load_error {
        warn!(error = %e, "failed to load config, using defaults");
    }

    let start = PlanetId::new(config.session.start_planet.clone());
    if config.planet(start.as_str()).is_none() {
        warn!(planet = %start, "start planet is not in the catalogue");
    }
    info!(
        planet = %start,
        tick_rate = config.session.tick_rate_hz,
        planets = config.planets.len(),
        "Nebula planet-surface flight"
    );

    let mut manager = build_manager(&config);
    manager.select_planet(start.clone());

    let mut plan = FlightPlan::new(start, FlightProfile::default());
    let report = run_flight(
        &mut manager,
        &mut plan,
        &RunOptions {
            tick_rate_hz: config.session.tick_rate_hz,
            max_ticks: args.ticks,
            realtime: args.realtime,
        },
    );

    manager.dispose();
    for event in manager.drain_events() {
        info!(?event, "shutdown");
    }

    if report.completed {
        info!(
            ticks = report.ticks,
            transitions = report.transitions.len(),
            surfaces = report.surfaces_built,
            hits = report.hits,
            impacts = report.impacts,
            "flight complete"
        );
    } else {
        warn!(ticks = report.ticks, leg = ?plan.leg(), "tick limit reached before the flight ended");
    }
}
