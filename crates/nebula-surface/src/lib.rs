//! Planet-surface transitions for Nebula.
//!
//! Switches a session between two simulation contexts: the orbital system
//! view and a live planet surface. The [`PlanetSurfaceManager`] is ticked once
//! per frame with the player's [`ProximityMetrics`] and decides when to
//! approach a planet, build its surface world, leave it, and tear it down.
//!
//! - [`state`]: transition states and planet identifiers
//! - [`thresholds`]: per-frame distance thresholds with override resolution
//! - [`altitude`]: smoothed altitude with a hysteresis hold timer
//! - [`registry`]: planet modules and their optional loading capabilities
//! - [`assets`]: detail-asset preloading deduplicated per planet
//! - [`collaborators`]: interfaces of the systems the manager drives
//! - [`manager`]: the state machine, activation, and teardown

pub mod altitude;
pub mod assets;
pub mod collaborators;
pub mod error;
pub mod events;
pub mod manager;
pub mod registry;
pub mod state;
pub mod thresholds;

pub use altitude::{AltitudeEstimate, AltitudeEstimator};
pub use assets::{
    AssetLoad, AssetLoadError, AssetLoadSender, AssetPreloader, DetailAssets, PreloadStatus,
};
pub use collaborators::{
    ChaseCameraRig, Collaborators, FrameInput, Hud, HudData, InitializedWorld, InputSample,
    JoinOptions, OrbitInput, OrbitalCameraRig, ProjectileContext, ProjectileEvent,
    ProjectileManager, SurfaceWorld, VehicleId, VehicleMode, VehicleState, VehicleSystem,
    VehicleUpdate, WorldId, WorldInitError, WorldInitRequest, WorldInitializer,
};
pub use error::ActivationError;
pub use events::{TransitionEvent, TransitionEventQueue};
pub use manager::{
    ExitReason, ExitRequest, PendingExit, PlanetSurfaceManager, SurfaceContext, SurfaceFrame,
    SurfaceSettings,
};
pub use registry::{
    DescriptorContext, DetailAssetLoader, PlanetMetadata, PlanetModule, PlanetRegistry,
    SurfaceDescriptorFactory,
};
pub use state::{CameraRigKind, HudPreset, PlanetId, PlanetSurfaceState};
pub use thresholds::{DistanceThresholds, ProximityMetrics, ThresholdOverrides};
