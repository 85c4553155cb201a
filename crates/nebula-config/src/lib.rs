//! Configuration system for the Nebula planet-surface session.
//!
//! Provides runtime-configurable settings that persist to disk as RON files:
//! transition thresholds, altitude filter tuning, camera and HUD settings, and
//! the planet catalogue. Supports CLI overrides via clap, hot-reload detection,
//! validation, and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AltitudeFilterConfig, CameraConfig, ChaseCameraConfig, Config, DebugConfig,
    EnvironmentParams, HudConfig, OrbitalCameraConfig, PlanetEntry, SessionConfig, SpawnParams,
    SurfaceDescriptor, TerrainParams, ThresholdDefaults, TransitionConfig,
};
pub use error::ConfigError;
