//! Command-line argument parsing for the Nebula session.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Nebula session command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nebula", about = "Nebula planet-surface session")]
pub struct CliArgs {
    /// Planet focused at session start.
    #[arg(long)]
    pub planet: Option<String>,

    /// Fixed simulation tick rate (Hz).
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Player identifier used when joining a surface world.
    #[arg(long)]
    pub player: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref planet) = args.planet {
            self.session.start_planet = planet.clone();
        }
        if let Some(rate) = args.tick_rate {
            self.session.tick_rate_hz = rate.max(1);
        }
        if let Some(ref player) = args.player {
            self.session.player_id = player.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
