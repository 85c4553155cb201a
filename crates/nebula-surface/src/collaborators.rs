//! Capability interfaces for the systems the transition core orchestrates.
//!
//! The core never renders, simulates vehicles, or flies projectiles itself. It
//! decides *when* those systems exist and hands the live surface world to them
//! explicitly: the world initialiser receives the previous world by value, and
//! the vehicle and projectile systems borrow the current world per frame. They
//! only keep a [`WorldId`] tag between frames, which teardown clears.

use std::fmt;

use glam::DVec3;
use nebula_config::{ChaseCameraConfig, SurfaceDescriptor};

use crate::state::HudPreset;
use crate::thresholds::ProximityMetrics;

/// Generation tag of a constructed surface world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u64);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// Handle of a vehicle tracked by the vehicle system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VehicleId(pub u32);

/// A live surface simulation (terrain plus environment).
pub trait SurfaceWorld {
    /// Stream terrain around the focus position.
    fn update(&mut self, focus: DVec3);

    /// Terrain height at a horizontal position.
    fn height_at(&self, x: f64, y: f64) -> f64;

    /// Release every resource held by the world.
    fn dispose(self: Box<Self>);
}

/// Input to [`WorldInitializer::initialize`].
pub struct WorldInitRequest {
    /// Descriptor the new world is built from.
    pub map_definition: SurfaceDescriptor,
    /// World being replaced. The initialiser disposes it before building.
    pub current_world: Option<Box<dyn SurfaceWorld>>,
}

/// Output of a successful world construction.
pub struct InitializedWorld {
    /// The new live world.
    pub world: Box<dyn SurfaceWorld>,
    /// Descriptor the world was actually built from.
    pub map_definition: SurfaceDescriptor,
}

/// Failure reported by a world initialiser.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("world initialisation failed: {0}")]
pub struct WorldInitError(pub String);

/// Builds surface worlds from descriptors.
pub trait WorldInitializer {
    /// Dispose `request.current_world` (if any) and construct a new world.
    fn initialize(&mut self, request: WorldInitRequest) -> Result<InitializedWorld, WorldInitError>;
}

/// Flight mode reported for a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VehicleMode {
    /// Resting on or driving along the terrain.
    Grounded,
    /// Airborne.
    Flight,
}

/// Snapshot of one vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleState {
    /// World position.
    pub position: DVec3,
    /// Height above the terrain directly below.
    pub altitude: f64,
    /// Heading in radians, counter-clockwise from +X.
    pub heading: f64,
    /// Speed in world units per second.
    pub speed: f64,
    /// Throttle in `[0, 1]`.
    pub throttle: f64,
    /// Flight mode.
    pub mode: VehicleMode,
}

/// Player control sample for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSample {
    /// Throttle in `[0, 1]`.
    pub throttle: f64,
    /// Vertical lift in `[-1, 1]`.
    pub lift: f64,
    /// Yaw rate in `[-1, 1]`.
    pub yaw: f64,
    /// Trigger held.
    pub fire: bool,
}

/// Camera orbit input for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitInput {
    /// Horizontal drag.
    pub yaw: f64,
    /// Vertical drag.
    pub pitch: f64,
    /// Zoom delta.
    pub zoom: f64,
}

/// Per-frame timing and input supplied by the host loop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f64,
    /// Seconds since the session started.
    pub elapsed_time: f64,
    /// Player controls.
    pub input: InputSample,
    /// Camera orbit controls.
    pub orbit: OrbitInput,
}

impl FrameInput {
    /// Frame with timing only and neutral controls.
    pub fn tick(dt: f64, elapsed_time: f64) -> Self {
        Self {
            dt,
            elapsed_time,
            ..Self::default()
        }
    }
}

/// HUD readout of the active vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct HudData {
    /// Speed in world units per second.
    pub speed: f64,
    /// Height above the terrain.
    pub altitude: f64,
    /// Throttle in `[0, 1]`.
    pub throttle: f64,
    /// Flight mode.
    pub mode: VehicleMode,
    /// Vehicles alive in the world.
    pub vehicle_count: usize,
}

/// Output of [`VehicleSystem::update`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VehicleUpdate {
    /// Vehicle the player controls.
    pub active_vehicle: Option<VehicleId>,
    /// Its state after this frame.
    pub active_state: Option<VehicleState>,
    /// HUD readout, when the vehicle system produces one.
    pub hud_data: Option<HudData>,
}

/// Options for [`VehicleSystem::handle_player_join`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JoinOptions {
    /// Spawn position (x, y, height above terrain).
    pub spawn: DVec3,
    /// Whether the joined vehicle becomes the active one.
    pub make_active: bool,
}

/// Vehicle simulation of the surface world.
pub trait VehicleSystem {
    /// Attach or detach the world generation used for collision.
    fn set_world(&mut self, world: Option<WorldId>);

    /// Release every tracked vehicle and its meshes.
    fn clear_vehicles(&mut self);

    /// Spawn the AI vehicles a fresh world starts with.
    fn spawn_default_vehicles(&mut self, world: &dyn SurfaceWorld, count: u32);

    /// Spawn the local player's vehicle.
    fn handle_player_join(&mut self, player_id: &str, world: &dyn SurfaceWorld, opts: JoinOptions);

    /// Every tracked vehicle.
    fn vehicles(&self) -> Vec<VehicleId>;

    /// Vehicle the player controls, if any.
    fn active_vehicle(&self) -> Option<VehicleId>;

    /// Snapshot of one vehicle.
    fn vehicle_state(&self, vehicle: VehicleId) -> Option<VehicleState>;

    /// Advance the simulation by one frame.
    fn update(&mut self, frame: &FrameInput, world: &dyn SurfaceWorld) -> VehicleUpdate;
}

/// Something a projectile did this frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectileEvent {
    /// A projectile struck a vehicle.
    VehicleHit {
        /// Vehicle that was struck.
        vehicle: VehicleId,
        /// Damage dealt.
        damage: f64,
    },
    /// A projectile struck the terrain.
    Impact {
        /// Impact position.
        position: DVec3,
    },
}

/// Per-frame context for [`ProjectileManager::update`].
pub struct ProjectileContext<'a> {
    /// Vehicles that can be hit, with their positions.
    pub targets: &'a [(VehicleId, DVec3)],
    /// Active vehicle, if the player is firing.
    pub shooter: Option<(VehicleId, VehicleState)>,
    /// Player controls.
    pub input: &'a InputSample,
    /// World the projectiles fly through.
    pub world: &'a dyn SurfaceWorld,
}

/// Projectile and effect simulation of the surface world.
pub trait ProjectileManager {
    /// Attach or detach the world generation used for impacts.
    fn set_world(&mut self, world: Option<WorldId>);

    /// Drop every in-flight projectile and effect.
    fn clear(&mut self);

    /// Advance projectiles by `dt` and report hits and impacts.
    fn update(&mut self, dt: f64, ctx: &ProjectileContext<'_>) -> Vec<ProjectileEvent>;
}

/// Camera rig of the system view.
pub trait OrbitalCameraRig {
    /// Advance the orbit camera.
    fn update(&mut self, dt: f64, metrics: &ProximityMetrics, orbit: &OrbitInput);
}

/// Camera rig following the active vehicle.
pub trait ChaseCameraRig {
    /// Replace the follow tuning.
    fn set_config(&mut self, config: &ChaseCameraConfig);

    /// Ease toward the followed vehicle.
    fn update(&mut self, target: &VehicleState, dt: f64, orbit: &OrbitInput);

    /// Jump straight to the followed vehicle without interpolation.
    fn snap_to(&mut self, target: &VehicleState);
}

/// On-screen HUD.
pub trait Hud {
    /// Switch the control layout.
    fn set_controls(&mut self, preset: HudPreset);

    /// Set the map label.
    fn set_map_label(&mut self, label: &str);

    /// Refresh the readout.
    fn update(&mut self, data: &HudData);
}

/// Every collaborator the manager drives, fixed at construction.
pub struct Collaborators {
    /// Surface world factory.
    pub world_initializer: Box<dyn WorldInitializer>,
    /// Vehicle simulation.
    pub vehicles: Box<dyn VehicleSystem>,
    /// Projectile simulation.
    pub projectiles: Box<dyn ProjectileManager>,
    /// System-view camera.
    pub orbital_camera: Box<dyn OrbitalCameraRig>,
    /// Surface camera.
    pub chase_camera: Box<dyn ChaseCameraRig>,
    /// HUD.
    pub hud: Box<dyn Hud>,
}
