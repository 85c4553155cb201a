//! Planet-surface transition state machine.
//!
//! [`PlanetSurfaceManager`] is constructed once per session and called every
//! frame by the host loop. Each [`update`](PlanetSurfaceManager::update):
//!
//! 1. drains finished detail-asset loads and completes a pending activation,
//! 2. ticks the live surface (vehicles, projectiles, terrain streaming) and
//!    feeds the active vehicle's altitude to the [`AltitudeEstimator`],
//! 3. picks an effective distance (filtered altitude while a surface is live
//!    and its telemetry is fresh, otherwise the caller's raw distance),
//! 4. resolves this frame's [`DistanceThresholds`] and steps the transition
//!    table (a pending exit request takes priority),
//! 5. retries activation while in SURFACE and, while a surface is live,
//!    turns a held escape altitude into an exit request,
//! 6. drives the active camera rig and the HUD.
//!
//! ```text
//!  SYSTEM_VIEW ──≤approach──▶ APPROACH ──≤surface──▶ SURFACE
//!       ▲                        │                    │  ▲
//!       │                   >system                ≥depart │ ≤surface
//!       │                        ▼                    ▼  │
//!       └───────────────── (system) ◀──≥system── DEPARTING
//! ```
//!
//! The live surface world is the only resource with a create/destroy cycle:
//! it is built by the activation protocol and disposed by teardown when the
//! system view is reached. At most one exists at a time.

mod activation;
#[cfg(test)]
mod tests;

use std::fmt;

use nebula_config::{
    AltitudeFilterConfig, ChaseCameraConfig, Config, SurfaceDescriptor, ThresholdDefaults,
};
use tracing::{debug, info};

use crate::altitude::{AltitudeEstimate, AltitudeEstimator};
use crate::assets::{AssetPreloader, PreloadStatus};
use crate::collaborators::{
    Collaborators, FrameInput, HudData, ProjectileContext, VehicleState, VehicleUpdate,
};
use crate::error::ActivationError;
use crate::events::{TransitionEvent, TransitionEventQueue};
use crate::registry::PlanetRegistry;
use crate::state::{CameraRigKind, PlanetId, PlanetSurfaceState};
use crate::thresholds::{DistanceThresholds, ProximityMetrics};

pub use activation::SurfaceContext;
use activation::PendingActivation;

/// Why the player is returning to the system view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The player asked to leave.
    Manual,
    /// The vehicle held the escape altitude.
    Escape,
    /// The session is ending.
    Shutdown,
    /// Host-defined reason.
    Other(String),
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Escape => f.write_str("escape"),
            Self::Shutdown => f.write_str("shutdown"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Options for [`PlanetSurfaceManager::request_system_view`].
#[derive(Clone, Debug, PartialEq)]
pub struct ExitRequest {
    /// Planet being left. Defaults to the current, selected, or last-seen planet.
    pub planet_id: Option<PlanetId>,
    /// Reason tag carried on the resulting transitions.
    pub reason: ExitReason,
    /// Skip DEPARTING and restore the system view synchronously.
    pub immediate: bool,
}

impl ExitRequest {
    /// A deferred exit with `reason`.
    pub fn new(reason: ExitReason) -> Self {
        Self {
            planet_id: None,
            reason,
            immediate: false,
        }
    }

    /// Restore the system view synchronously.
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    /// Name the planet being left.
    pub fn for_planet(mut self, planet: impl Into<PlanetId>) -> Self {
        self.planet_id = Some(planet.into());
        self
    }
}

impl Default for ExitRequest {
    fn default() -> Self {
        Self::new(ExitReason::Manual)
    }
}

/// A deferred request to return to the system view, consumed by the next step.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingExit {
    /// Planet being left.
    pub planet_id: Option<PlanetId>,
    /// Reason tag.
    pub reason: ExitReason,
}

/// Everything the manager reads from configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceSettings {
    /// Fallback transition distances.
    pub thresholds: ThresholdDefaults,
    /// Altitude estimator tuning.
    pub altitude: AltitudeFilterConfig,
    /// Maximum age of a filtered altitude sample that may replace the raw distance.
    pub fresh_altitude_window_s: f64,
    /// Chase camera tuning applied on approach.
    pub chase_camera: ChaseCameraConfig,
    /// Map label of the system view.
    pub orbital_label: String,
    /// Local player id used when joining a surface world.
    pub player_id: String,
    /// Descriptor used when a planet provides none.
    pub default_surface: Option<SurfaceDescriptor>,
}

impl SurfaceSettings {
    /// Extract the manager's settings from a session config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            thresholds: config.transition.thresholds,
            altitude: config.transition.altitude,
            fresh_altitude_window_s: config.transition.fresh_altitude_window_s,
            chase_camera: config.camera.chase.clone(),
            orbital_label: config.hud.orbital_label.clone(),
            player_id: config.session.player_id.clone(),
            default_surface: config.default_surface.clone(),
        }
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Summary of one [`update`](PlanetSurfaceManager::update).
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceFrame {
    /// State after the update.
    pub state: PlanetSurfaceState,
    /// Whether a surface world is live after the update.
    pub surface_ready: bool,
    /// Distance the transition table compared against.
    pub effective_distance: f64,
    /// Thresholds resolved for this frame.
    pub thresholds: DistanceThresholds,
    /// Altitude estimate after this frame's sample.
    pub altitude: AltitudeEstimate,
    /// Active vehicle after the surface tick, if the surface is live.
    pub active_vehicle: Option<VehicleState>,
    /// HUD readout pushed this frame.
    pub hud: Option<HudData>,
}

/// Orchestrates the orbital and surface simulation contexts.
pub struct PlanetSurfaceManager {
    settings: SurfaceSettings,
    registry: PlanetRegistry,
    collaborators: Collaborators,
    state: PlanetSurfaceState,
    current_planet: Option<PlanetId>,
    selected_planet: Option<PlanetId>,
    pending_exit: Option<PendingExit>,
    exit_reason: Option<ExitReason>,
    last_metrics: ProximityMetrics,
    thresholds: DistanceThresholds,
    estimator: AltitudeEstimator,
    preloader: AssetPreloader,
    activation: Option<PendingActivation>,
    surface: Option<SurfaceContext>,
    last_abort: Option<ActivationError>,
    next_world_id: u64,
    active_camera: CameraRigKind,
    events: TransitionEventQueue,
}

impl PlanetSurfaceManager {
    /// Create a manager in the system view.
    pub fn new(
        settings: SurfaceSettings,
        registry: PlanetRegistry,
        collaborators: Collaborators,
    ) -> Self {
        let mut manager = Self {
            estimator: AltitudeEstimator::new(&settings.altitude),
            thresholds: DistanceThresholds::from(&settings.thresholds),
            settings,
            registry,
            collaborators,
            state: PlanetSurfaceState::SystemView,
            current_planet: None,
            selected_planet: None,
            pending_exit: None,
            exit_reason: None,
            last_metrics: ProximityMetrics::default(),
            preloader: AssetPreloader::new(),
            activation: None,
            surface: None,
            last_abort: None,
            next_world_id: 1,
            active_camera: CameraRigKind::Orbital,
            events: TransitionEventQueue::default(),
        };
        manager.apply_orbital_hud();
        manager
    }

    /// Advance one frame.
    ///
    /// Never fails: missing planets, failed loads and rejected descriptors
    /// leave the manager in its current state to retry next frame.
    pub fn update(&mut self, frame: &FrameInput, metrics: &ProximityMetrics) -> SurfaceFrame {
        let dt = if frame.dt.is_finite() && frame.dt > 0.0 {
            frame.dt
        } else {
            0.0
        };
        self.last_metrics = metrics.clone();

        self.preloader.poll();
        self.poll_activation();

        let tick = self.tick_surface(frame, dt);
        let active_vehicle = tick.as_ref().and_then(|u| u.active_state);
        let altitude = self
            .estimator
            .update(active_vehicle.map(|v| v.altitude), dt);

        let effective_distance = self.effective_distance(metrics);
        self.thresholds = DistanceThresholds::resolve(metrics, &self.settings.thresholds);
        self.step(metrics, effective_distance);

        if self.state.requires_surface() && self.surface.is_none() {
            self.activate_surface();
        }

        if matches!(
            self.state,
            PlanetSurfaceState::Surface | PlanetSurfaceState::Departing
        ) && self.surface.is_some()
            && altitude.above_threshold
            && self.pending_exit.is_none()
        {
            info!(
                altitude = altitude.smoothed,
                escape = self.estimator.threshold(),
                "escape altitude held, leaving surface"
            );
            self.request_system_view(ExitRequest::new(ExitReason::Escape));
        }

        self.update_camera(frame, dt, metrics, active_vehicle);

        let hud = match (&self.surface, tick) {
            (Some(_), Some(VehicleUpdate { hud_data: Some(data), .. })) => {
                self.collaborators.hud.update(&data);
                Some(data)
            }
            _ => None,
        };

        SurfaceFrame {
            state: self.state,
            surface_ready: self.surface.is_some(),
            effective_distance,
            thresholds: self.thresholds,
            altitude,
            active_vehicle: active_vehicle.filter(|_| self.surface.is_some()),
            hud,
        }
    }

    /// Ask to return to the system view.
    ///
    /// Returns `false` (and does nothing) when already in the system view.
    /// A deferred request moves to DEPARTING right away and reaches the
    /// system view on the next update; an immediate one tears down now.
    pub fn request_system_view(&mut self, request: ExitRequest) -> bool {
        if self.state == PlanetSurfaceState::SystemView {
            return false;
        }

        let planet = request
            .planet_id
            .or_else(|| self.current_planet.clone())
            .or_else(|| self.selected_planet.clone())
            .or_else(|| self.last_metrics.planet_id.clone());
        info!(
            reason = %request.reason,
            immediate = request.immediate,
            planet = ?planet.as_ref().map(PlanetId::as_str),
            "system view requested"
        );
        self.exit_reason = Some(request.reason.clone());

        if request.immediate {
            self.transition_to(PlanetSurfaceState::SystemView, None);
            return true;
        }

        self.pending_exit = Some(PendingExit {
            planet_id: planet.clone(),
            reason: request.reason,
        });
        if self.state != PlanetSurfaceState::Departing {
            self.transition_to(PlanetSurfaceState::Departing, planet);
        }
        true
    }

    /// Focus a planet and start preloading its detail assets.
    ///
    /// Does not change state; the next updates decide whether to approach.
    pub fn select_planet(&mut self, planet: impl Into<PlanetId>) {
        let planet = planet.into();
        match self.registry.get(&planet) {
            Some(module) => {
                self.preloader.request(&planet, module);
            }
            None => debug!(%planet, "selected planet is not registered"),
        }
        self.selected_planet = Some(planet);
    }

    /// Drop the planet focus set by [`select_planet`](Self::select_planet).
    pub fn clear_selection(&mut self) {
        self.selected_planet = None;
    }

    /// End the session: return to the system view, dispose the surface, and
    /// drop every in-flight load. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.state != PlanetSurfaceState::SystemView {
            self.exit_reason = Some(ExitReason::Shutdown);
            self.transition_to(PlanetSurfaceState::SystemView, None);
        }
        self.teardown_surface();
        self.activation = None;
        self.preloader.clear();
        self.pending_exit = None;
        self.selected_planet = None;
    }

    /// Take every queued event.
    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        self.events.drain()
    }

    /// Current state.
    pub fn state(&self) -> PlanetSurfaceState {
        self.state
    }

    /// Planet the current approach/surface/departure belongs to.
    pub fn current_planet(&self) -> Option<&PlanetId> {
        self.current_planet.as_ref()
    }

    /// Planet focused with [`select_planet`](Self::select_planet).
    pub fn selected_planet(&self) -> Option<&PlanetId> {
        self.selected_planet.as_ref()
    }

    /// Whether a surface world is live.
    pub fn surface_ready(&self) -> bool {
        self.surface.is_some()
    }

    /// The live surface context.
    pub fn surface(&self) -> Option<&SurfaceContext> {
        self.surface.as_ref()
    }

    /// Planet whose activation is in flight.
    pub fn activation_in_flight(&self) -> Option<&PlanetId> {
        self.activation.as_ref().map(|a| &a.planet)
    }

    /// Camera rig currently driving the view.
    pub fn active_camera(&self) -> CameraRigKind {
        self.active_camera
    }

    /// Exit request waiting for the next step.
    pub fn pending_exit(&self) -> Option<&PendingExit> {
        self.pending_exit.as_ref()
    }

    /// Reason tag of the exit in progress.
    pub fn exit_reason(&self) -> Option<&ExitReason> {
        self.exit_reason.as_ref()
    }

    /// Latest altitude estimate.
    pub fn estimate(&self) -> AltitudeEstimate {
        self.estimator.estimate()
    }

    /// Thresholds resolved on the last update.
    pub fn thresholds(&self) -> DistanceThresholds {
        self.thresholds
    }

    /// Detail-asset status of a planet.
    pub fn preload_status(&self, planet: &PlanetId) -> PreloadStatus {
        self.preloader.status(planet)
    }

    /// Registered planets.
    pub fn registry(&self) -> &PlanetRegistry {
        &self.registry
    }

    /// Settings the manager was built with.
    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    fn effective_distance(&self, metrics: &ProximityMetrics) -> f64 {
        let fresh = self
            .estimator
            .has_recent_sample(self.settings.fresh_altitude_window_s);
        if self.state != PlanetSurfaceState::SystemView && self.surface.is_some() && fresh {
            self.estimator.estimate().smoothed
        } else {
            metrics.distance().unwrap_or(f64::INFINITY)
        }
    }

    fn step(&mut self, metrics: &ProximityMetrics, distance: f64) {
        use PlanetSurfaceState::*;

        if let Some(exit) = self.pending_exit.clone() {
            match self.state {
                SystemView => self.pending_exit = None,
                Departing => self.transition_to(SystemView, None),
                Approach | Surface => {
                    let planet = exit.planet_id.or_else(|| self.current_planet.clone());
                    self.transition_to(Departing, planet);
                }
            }
            return;
        }

        if self.state.requires_planet() && self.current_planet.is_none() {
            debug!(state = %self.state, "no current planet, forcing system view");
            self.transition_to(SystemView, None);
            return;
        }

        let focus = metrics
            .planet_id
            .clone()
            .or_else(|| self.selected_planet.clone());
        let t = self.thresholds;

        let next = match self.state {
            SystemView if focus.is_some() && distance <= t.approach_enter => Some(Approach),
            SystemView => None,
            Approach if focus.is_none() || distance > t.system_leave => Some(SystemView),
            Approach if distance <= t.surface_enter => Some(Surface),
            Approach => None,
            Surface if focus.is_none() || distance >= t.depart_leave => Some(Departing),
            Surface => None,
            Departing if focus.is_none() || distance >= t.system_leave => Some(SystemView),
            Departing if distance <= t.surface_enter => Some(Surface),
            Departing => None,
        };

        if let Some(next) = next {
            let planet = if next == Approach {
                focus
            } else {
                self.current_planet.clone()
            };
            self.transition_to(next, planet);
        }
    }

    fn transition_to(&mut self, next: PlanetSurfaceState, planet: Option<PlanetId>) {
        let from = self.state;
        if from == next {
            return;
        }
        self.state = next;

        let involved = planet.clone().or_else(|| self.current_planet.clone());
        info!(
            %from,
            to = %next,
            planet = ?involved.as_ref().map(PlanetId::as_str),
            "planet surface transition"
        );
        self.events.push(TransitionEvent::StateChanged {
            from,
            to: next,
            planet: involved,
            reason: self.exit_reason.clone(),
        });

        match next {
            PlanetSurfaceState::SystemView => self.enter_system_view(),
            PlanetSurfaceState::Approach => self.enter_approach(planet),
            PlanetSurfaceState::Surface => self.enter_surface(planet),
            PlanetSurfaceState::Departing => self.enter_departing(planet),
        }
    }

    fn enter_system_view(&mut self) {
        self.teardown_surface();
        self.current_planet = None;
        self.pending_exit = None;
        self.exit_reason = None;
        self.last_abort = None;
        self.active_camera = CameraRigKind::Orbital;
        self.apply_orbital_hud();
    }

    fn enter_approach(&mut self, planet: Option<PlanetId>) {
        if planet.is_some() {
            self.current_planet = planet;
        }
        self.attach_chase_camera();

        let label = self
            .current_planet
            .as_ref()
            .and_then(|p| self.registry.get(p))
            .map(|m| m.metadata().name.clone());
        let hud = &mut self.collaborators.hud;
        hud.set_controls(PlanetSurfaceState::Approach.hud_preset());
        if let Some(label) = label {
            hud.set_map_label(&label);
        }

        if let Some(planet) = &self.current_planet
            && let Some(module) = self.registry.get(planet)
        {
            self.preloader.request(planet, module);
        }
    }

    fn enter_surface(&mut self, planet: Option<PlanetId>) {
        if planet.is_some() {
            self.current_planet = planet;
        }
        self.active_camera = CameraRigKind::Chase;
        self.activate_surface();
        self.collaborators
            .hud
            .set_controls(PlanetSurfaceState::Surface.hud_preset());
    }

    fn enter_departing(&mut self, planet: Option<PlanetId>) {
        if planet.is_some() {
            self.current_planet = planet;
        }
        if self.active_camera != CameraRigKind::Chase {
            self.attach_chase_camera();
        }
        self.collaborators
            .hud
            .set_controls(PlanetSurfaceState::Departing.hud_preset());
    }

    fn attach_chase_camera(&mut self) {
        self.active_camera = CameraRigKind::Chase;
        self.collaborators
            .chase_camera
            .set_config(&self.settings.chase_camera);
    }

    fn apply_orbital_hud(&mut self) {
        let hud = &mut self.collaborators.hud;
        hud.set_controls(PlanetSurfaceState::SystemView.hud_preset());
        hud.set_map_label(&self.settings.orbital_label);
    }

    fn tick_surface(&mut self, frame: &FrameInput, dt: f64) -> Option<VehicleUpdate> {
        let surface = self.surface.as_mut()?;
        let collaborators = &mut self.collaborators;

        let update = collaborators.vehicles.update(frame, &*surface.world);
        let targets: Vec<_> = collaborators
            .vehicles
            .vehicles()
            .into_iter()
            .filter_map(|id| {
                let state = collaborators.vehicles.vehicle_state(id)?;
                Some((id, state.position))
            })
            .collect();
        let ctx = ProjectileContext {
            targets: &targets,
            shooter: update.active_vehicle.zip(update.active_state),
            input: &frame.input,
            world: &*surface.world,
        };
        for event in collaborators.projectiles.update(dt, &ctx) {
            self.events.push(TransitionEvent::Projectile(event));
        }

        if let Some(active) = update.active_state {
            surface.world.update(active.position);
        }
        Some(update)
    }

    fn update_camera(
        &mut self,
        frame: &FrameInput,
        dt: f64,
        metrics: &ProximityMetrics,
        active: Option<VehicleState>,
    ) {
        match self.active_camera {
            CameraRigKind::Orbital => {
                self.collaborators
                    .orbital_camera
                    .update(dt, metrics, &frame.orbit);
            }
            CameraRigKind::Chase => {
                if self.surface.is_some()
                    && let Some(target) = active
                {
                    self.collaborators
                        .chase_camera
                        .update(&target, dt, &frame.orbit);
                }
            }
        }
    }
}
