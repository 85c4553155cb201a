//! Configuration structs with sensible defaults and RON persistence.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Player session settings.
    pub session: SessionConfig,
    /// Orbital/surface transition tuning.
    pub transition: TransitionConfig,
    /// Camera rig settings.
    pub camera: CameraConfig,
    /// HUD labels.
    pub hud: HudConfig,
    /// Descriptor used when a planet module cannot provide its own.
    pub default_surface: Option<SurfaceDescriptor>,
    /// Planet catalogue for the solar system.
    pub planets: Vec<PlanetEntry>,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

/// Player session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Identifier used when the local player joins a surface world.
    pub player_id: String,
    /// Fixed simulation tick rate (Hz).
    pub tick_rate_hz: u32,
    /// Planet focused when the session starts.
    pub start_planet: String,
}

/// Orbital/surface transition configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionConfig {
    /// Fallback distance thresholds (world units).
    pub thresholds: ThresholdDefaults,
    /// Altitude smoothing and escape hysteresis.
    pub altitude: AltitudeFilterConfig,
    /// Maximum age (seconds) of a filtered altitude sample before the
    /// caller's raw distance is preferred.
    pub fresh_altitude_window_s: f64,
}

/// Static fallback values for the four transition distances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdDefaults {
    /// Distance at or below which the approach phase begins.
    pub approach_enter: f64,
    /// Distance at or below which the surface world is entered.
    pub surface_enter: f64,
    /// Distance at or above which the surface is left.
    pub depart_leave: f64,
    /// Distance above which the orbital view is restored.
    pub system_leave: f64,
}

/// Altitude estimator tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AltitudeFilterConfig {
    /// Exponential response rate (1/s). Higher values track samples faster.
    pub response: f64,
    /// Time (seconds) the smoothed altitude must stay above the escape
    /// altitude before the escape signal fires.
    pub hold_duration_s: f64,
    /// Altitude above the surface that counts as an escape.
    pub escape_altitude: f64,
}

/// Camera rig configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Chase camera used while approaching and on the surface.
    pub chase: ChaseCameraConfig,
    /// Orbital camera used in the system view.
    pub orbital: OrbitalCameraConfig,
}

/// Chase camera tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChaseCameraConfig {
    /// Distance behind the followed vehicle.
    pub distance_m: f64,
    /// Height above the followed vehicle.
    pub height_m: f64,
    /// Spring stiffness of the follow interpolation (1/s).
    pub stiffness: f64,
}

/// Orbital camera tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrbitalCameraConfig {
    /// Closest zoom distance.
    pub min_zoom: f64,
    /// Farthest zoom distance.
    pub max_zoom: f64,
    /// Orbit drag sensitivity (radians per input unit).
    pub sensitivity: f64,
}

/// HUD configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HudConfig {
    /// Map label shown while in the system view.
    pub orbital_label: String,
}

/// A planet in the solar-system catalogue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetEntry {
    /// Stable identifier, e.g. `"mars"`.
    pub id: String,
    /// Display name used for HUD labels.
    pub name: String,
    /// Planet radius in world units.
    pub radius_m: f64,
    /// Whether the planet ships a detail asset pack to preload.
    pub detail_assets: bool,
    /// Surface descriptor, if the planet defines its own.
    pub surface: Option<SurfaceDescriptor>,
}

/// Declarative description of a planet's surface world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurfaceDescriptor {
    /// Map identifier shown in logs and on the HUD.
    pub map_id: String,
    /// Terrain generation parameters.
    pub terrain: TerrainParams,
    /// Lighting and atmosphere parameters.
    pub environment: EnvironmentParams,
    /// Actor spawn parameters.
    pub spawn: SpawnParams,
}

/// Heightfield parameters for a surface world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainParams {
    /// Noise seed.
    pub seed: u32,
    /// Peak-to-valley height amplitude.
    pub amplitude_m: f64,
    /// Base noise frequency (cycles per world unit).
    pub base_frequency: f64,
    /// Number of noise octaves.
    pub octaves: u32,
    /// Half-width of the playable square.
    pub extent_m: f64,
}

/// Lighting and atmosphere of a surface world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentParams {
    /// Sun elevation above the horizon in degrees.
    pub sun_elevation_deg: f64,
    /// Ambient light intensity (0.0 - 1.0).
    pub ambient_intensity: f64,
    /// Exponential fog density.
    pub fog_density: f64,
}

/// Actor spawn parameters of a surface world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnParams {
    /// Player spawn position (x, y, height above terrain).
    pub position: [f64; 3],
    /// Number of AI vehicles spawned with the world.
    pub default_vehicles: u32,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: DebugConfig::default(),
            session: SessionConfig::default(),
            transition: TransitionConfig::default(),
            camera: CameraConfig::default(),
            hud: HudConfig::default(),
            default_surface: Some(SurfaceDescriptor::default()),
            planets: default_catalogue(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_id: "player-1".to_string(),
            tick_rate_hz: 60,
            start_planet: "mars".to_string(),
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdDefaults::default(),
            altitude: AltitudeFilterConfig::default(),
            fresh_altitude_window_s: 2.5,
        }
    }
}

impl Default for ThresholdDefaults {
    fn default() -> Self {
        Self {
            approach_enter: 6000.0,
            surface_enter: 1400.0,
            depart_leave: 2600.0,
            system_leave: 5200.0,
        }
    }
}

impl Default for AltitudeFilterConfig {
    fn default() -> Self {
        Self {
            response: 3.5,
            hold_duration_s: 1.2,
            escape_altitude: 2600.0,
        }
    }
}

impl Default for ChaseCameraConfig {
    fn default() -> Self {
        Self {
            distance_m: 18.0,
            height_m: 6.0,
            stiffness: 6.0,
        }
    }
}

impl Default for OrbitalCameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 2_000.0,
            max_zoom: 60_000.0,
            sensitivity: 0.004,
        }
    }
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            orbital_label: "System View".to_string(),
        }
    }
}

impl Default for PlanetEntry {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            radius_m: 3_000.0,
            detail_assets: false,
            surface: None,
        }
    }
}

impl Default for SurfaceDescriptor {
    fn default() -> Self {
        Self {
            map_id: "default-plains".to_string(),
            terrain: TerrainParams::default(),
            environment: EnvironmentParams::default(),
            spawn: SpawnParams::default(),
        }
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 7,
            amplitude_m: 40.0,
            base_frequency: 0.004,
            octaves: 4,
            extent_m: 4_000.0,
        }
    }
}

impl Default for EnvironmentParams {
    fn default() -> Self {
        Self {
            sun_elevation_deg: 35.0,
            ambient_intensity: 0.3,
            fog_density: 0.0008,
        }
    }
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 2.0],
            default_vehicles: 3,
        }
    }
}

fn default_catalogue() -> Vec<PlanetEntry> {
    vec![
        PlanetEntry {
            id: "mars".to_string(),
            name: "Mars".to_string(),
            radius_m: 3_390.0,
            detail_assets: true,
            surface: Some(SurfaceDescriptor {
                map_id: "mars-dunes".to_string(),
                terrain: TerrainParams {
                    seed: 42,
                    amplitude_m: 65.0,
                    base_frequency: 0.003,
                    octaves: 5,
                    extent_m: 6_000.0,
                },
                environment: EnvironmentParams {
                    sun_elevation_deg: 22.0,
                    ambient_intensity: 0.25,
                    fog_density: 0.0015,
                },
                spawn: SpawnParams::default(),
            }),
        },
        PlanetEntry {
            id: "io".to_string(),
            name: "Io".to_string(),
            radius_m: 1_820.0,
            detail_assets: false,
            surface: None,
        },
        PlanetEntry {
            id: "ceres".to_string(),
            name: "Ceres".to_string(),
            radius_m: 470.0,
            detail_assets: true,
            surface: None,
        },
    ]
}

// --- Load / Save / Reload / Validate ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Check the invariants the transition core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.transition.thresholds;
        let distances = [
            ("approach_enter", t.approach_enter),
            ("surface_enter", t.surface_enter),
            ("depart_leave", t.depart_leave),
            ("system_leave", t.system_leave),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "threshold {name} must be positive, got {value}"
                )));
            }
        }
        if t.surface_enter > t.approach_enter {
            return Err(ConfigError::Invalid(format!(
                "surface_enter ({}) exceeds approach_enter ({})",
                t.surface_enter, t.approach_enter
            )));
        }

        let alt = &self.transition.altitude;
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(alt.hold_duration_s) || !positive(alt.response) {
            return Err(ConfigError::Invalid(
                "altitude hold_duration_s and response must be positive".to_string(),
            ));
        }
        let window = self.transition.fresh_altitude_window_s;
        if !window.is_finite() || window < 0.0 {
            return Err(ConfigError::Invalid(
                "fresh_altitude_window_s must not be negative".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for planet in &self.planets {
            if planet.id.is_empty() {
                return Err(ConfigError::Invalid("planet with empty id".to_string()));
            }
            if !seen.insert(planet.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate planet id '{}'",
                    planet.id
                )));
            }
        }
        Ok(())
    }

    /// Platform config directory for the session, e.g. `~/.config/nebula-surface`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("nebula-surface"))
    }

    /// Look up a catalogue entry by id.
    pub fn planet(&self, id: &str) -> Option<&PlanetEntry> {
        self.planets.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(!ron_str.is_empty());
        assert!(ron_str.contains("approach_enter: 6000.0"));
        assert!(ron_str.contains("tick_rate_hz: 60"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(debug: (), session: (player_id: \"pilot\"))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.transition, TransitionConfig::default());
        assert_eq!(config.session.player_id, "pilot");
        assert_eq!(config.session.tick_rate_hz, 60);
    }

    #[test]
    fn test_partial_thresholds_keep_other_defaults() {
        let ron_str = "(transition: (thresholds: (approach_enter: 9000.0)))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.transition.thresholds.approach_enter, 9000.0);
        assert_eq!(config.transition.thresholds.surface_enter, 1400.0);
        assert_eq!(config.transition.altitude.hold_duration_s, 1.2);
    }

    #[test]
    fn test_extra_field_ignored() {
        let ron_str = "(future_setting: true)";
        let result: Result<Config, _> = ron::from_str(ron_str);
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.session.player_id = "wing-2".to_string();
        config.transition.thresholds.approach_enter = 7500.0;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.transition.altitude.hold_duration_s = 2.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().transition.altitude.hold_duration_s, 2.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.transition.thresholds.surface_enter = 8000.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn test_validate_rejects_zero_hold() {
        let mut config = Config::default();
        config.transition.altitude.hold_duration_s = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_planets() {
        let mut config = Config::default();
        let copy = config.planets[0].clone();
        config.planets.push(copy);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate planet id 'mars'"));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.ron"),
            "(transition: (thresholds: (approach_enter: -1.0)))",
        )
        .unwrap();
        assert!(Config::load_or_create(dir.path()).is_err());
    }

    #[test]
    fn test_planet_lookup() {
        let config = Config::default();
        assert_eq!(config.planet("io").map(|p| p.name.as_str()), Some("Io"));
        assert!(config.planet("pluto").is_none());
    }
}
