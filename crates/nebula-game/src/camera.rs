//! Camera rigs for the headless driver.
//!
//! Both rigs compute eye and target positions exactly as a rendering front
//! end would, so their behaviour can be checked without a window.

use glam::DVec3;
use nebula_config::{ChaseCameraConfig, OrbitalCameraConfig};
use nebula_surface::{ChaseCameraRig, OrbitInput, OrbitalCameraRig, ProximityMetrics, VehicleState};

/// Pitch limit of the orbit rig, just short of straight down.
const MAX_PITCH: f64 = 1.5;

/// Orbit camera of the system view.
///
/// Zoom follows the focused planet's distance and is clamped to the
/// configured range; drag input rotates around the planet.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: OrbitalCameraConfig,
    yaw: f64,
    pitch: f64,
    zoom: f64,
}

impl OrbitCamera {
    /// Create a rig at maximum zoom.
    pub fn new(config: OrbitalCameraConfig) -> Self {
        Self {
            zoom: config.max_zoom,
            config,
            yaw: 0.0,
            pitch: 0.4,
        }
    }

    /// Current zoom distance.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Eye position relative to the focused planet.
    pub fn eye(&self) -> DVec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        DVec3::new(cy * cp, sy * cp, sp) * self.zoom
    }
}

impl OrbitalCameraRig for OrbitCamera {
    fn update(&mut self, dt: f64, metrics: &ProximityMetrics, orbit: &OrbitInput) {
        let sensitivity = self.config.sensitivity;
        self.yaw += orbit.yaw * sensitivity;
        self.pitch = (self.pitch + orbit.pitch * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);

        let target = metrics
            .distance()
            .map(|d| d * 2.0)
            .unwrap_or(self.config.max_zoom);
        let eased = self.zoom + (target - self.zoom) * (1.0 - (-4.0 * dt.max(0.0)).exp());
        let zoomed = eased * (-orbit.zoom * 0.1).exp();
        self.zoom = zoomed.clamp(self.config.min_zoom, self.config.max_zoom);
    }
}

/// Chase camera following the active vehicle.
#[derive(Debug, Clone)]
pub struct ChaseCamera {
    config: ChaseCameraConfig,
    eye: DVec3,
    look_at: DVec3,
    yaw_offset: f64,
}

impl ChaseCamera {
    /// Create a rig at the origin.
    pub fn new(config: ChaseCameraConfig) -> Self {
        Self {
            config,
            eye: DVec3::ZERO,
            look_at: DVec3::ZERO,
            yaw_offset: 0.0,
        }
    }

    /// Current eye position.
    pub fn eye(&self) -> DVec3 {
        self.eye
    }

    /// Point the camera looks at.
    pub fn look_at(&self) -> DVec3 {
        self.look_at
    }

    fn desired_eye(&self, target: &VehicleState) -> DVec3 {
        let heading = target.heading + self.yaw_offset;
        let behind = DVec3::new(heading.cos(), heading.sin(), 0.0) * -self.config.distance_m;
        target.position + behind + DVec3::Z * self.config.height_m
    }
}

impl ChaseCameraRig for ChaseCamera {
    fn set_config(&mut self, config: &ChaseCameraConfig) {
        self.config = config.clone();
        self.yaw_offset = 0.0;
    }

    fn update(&mut self, target: &VehicleState, dt: f64, orbit: &OrbitInput) {
        self.yaw_offset += orbit.yaw * 0.01;
        let t = 1.0 - (-self.config.stiffness * dt.max(0.0)).exp();
        self.eye = self.eye.lerp(self.desired_eye(target), t);
        self.look_at = target.position;
    }

    fn snap_to(&mut self, target: &VehicleState) {
        self.eye = self.desired_eye(target);
        self.look_at = target.position;
    }
}
