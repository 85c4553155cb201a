//! Headless flight driver for the Nebula planet-surface session.
//!
//! Wires demo collaborators into a [`PlanetSurfaceManager`] and flies a
//! scripted profile through it:
//!
//! - [`world`]: noise heightfield surface world and its initialiser
//! - [`ship`]: player and AI ships
//! - [`projectiles`]: ballistic projectile pool
//! - [`camera`]: orbit and chase camera rigs
//! - [`hud`]: text HUD
//! - [`planet`]: registry with procedural detail-asset loading
//! - [`flight`]: the scripted profile

pub mod camera;
pub mod flight;
pub mod hud;
pub mod planet;
pub mod projectiles;
pub mod ship;
pub mod world;

use std::time::{Duration, Instant};

use nebula_config::Config;
use nebula_surface::{
    Collaborators, FrameInput, PlanetSurfaceManager, PlanetSurfaceState, ProjectileEvent,
    SurfaceFrame, SurfaceSettings, TransitionEvent,
};
use tracing::{debug, info, trace};

use crate::camera::{ChaseCamera, OrbitCamera};
use crate::flight::FlightPlan;
use crate::hud::{TextHud, format_hud};
use crate::projectiles::{ProjectileConfig, ProjectilePool};
use crate::ship::{Fleet, ShipConfig};
use crate::world::HeightfieldInitializer;

/// Demo collaborators configured from `config`.
pub fn collaborators(config: &Config) -> Collaborators {
    Collaborators {
        world_initializer: Box::new(HeightfieldInitializer::new()),
        vehicles: Box::new(Fleet::new(ShipConfig::default())),
        projectiles: Box::new(ProjectilePool::new(ProjectileConfig::default())),
        orbital_camera: Box::new(OrbitCamera::new(config.camera.orbital.clone())),
        chase_camera: Box::new(ChaseCamera::new(config.camera.chase.clone())),
        hud: Box::new(TextHud::new()),
    }
}

/// A manager over the configured planet catalogue with demo collaborators.
pub fn build_manager(config: &Config) -> PlanetSurfaceManager {
    PlanetSurfaceManager::new(
        SurfaceSettings::from_config(config),
        planet::build_registry(config),
        collaborators(config),
    )
}

/// How to run a flight.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Simulation ticks per second.
    pub tick_rate_hz: u32,
    /// Tick limit.
    pub max_ticks: u64,
    /// Sleep between ticks to run at wall-clock speed.
    pub realtime: bool,
}

/// Summary of a flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightReport {
    /// Ticks simulated.
    pub ticks: u64,
    /// Every state change, in order.
    pub transitions: Vec<(PlanetSurfaceState, PlanetSurfaceState)>,
    /// Surface worlds that went live.
    pub surfaces_built: u32,
    /// Surface worlds disposed.
    pub surfaces_disposed: u32,
    /// Projectile hits on vehicles.
    pub hits: u32,
    /// Projectile impacts on terrain.
    pub impacts: u32,
    /// Whether the profile was flown to the end.
    pub completed: bool,
}

/// Fly `plan` through `manager` until it finishes or the tick limit is hit.
///
/// Headless runs wait on in-flight surface activations rather than flying
/// past them, so a slow asset worker cannot desynchronise the profile.
pub fn run_flight(
    manager: &mut PlanetSurfaceManager,
    plan: &mut FlightPlan,
    options: &RunOptions,
) -> FlightReport {
    let rate = options.tick_rate_hz.max(1);
    let dt = 1.0 / f64::from(rate);
    let mut report = FlightReport::default();
    let mut last: Option<SurfaceFrame> = None;
    let started = Instant::now();

    while report.ticks < options.max_ticks && !plan.finished() {
        let (metrics, input) = plan.next(last.as_ref(), dt);
        let frame = FrameInput {
            input,
            ..FrameInput::tick(dt, report.ticks as f64 * dt)
        };
        let result = manager.update(&frame, &metrics);
        report.ticks += 1;

        for event in manager.drain_events() {
            record_event(&mut report, event);
        }
        if report.ticks % u64::from(rate) == 0
            && let Some(hud) = &result.hud
        {
            info!(state = %result.state, "{}", format_hud(hud));
        }
        last = Some(result);

        if options.realtime {
            let due = started + Duration::from_secs_f64(report.ticks as f64 * dt);
            if let Some(wait) = due.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        } else if manager.activation_in_flight().is_some() {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    report.completed = plan.finished();
    report
}

fn record_event(report: &mut FlightReport, event: TransitionEvent) {
    match event {
        TransitionEvent::StateChanged { from, to, .. } => report.transitions.push((from, to)),
        TransitionEvent::SurfaceReady { .. } => report.surfaces_built += 1,
        TransitionEvent::SurfaceDisposed { .. } => report.surfaces_disposed += 1,
        TransitionEvent::ActivationAborted { planet, error } => {
            debug!(%planet, %error, "activation aborted");
        }
        TransitionEvent::Projectile(ProjectileEvent::VehicleHit { vehicle, damage }) => {
            report.hits += 1;
            debug!(vehicle = vehicle.0, damage, "vehicle hit");
        }
        TransitionEvent::Projectile(ProjectileEvent::Impact { position }) => {
            report.impacts += 1;
            trace!(x = position.x, y = position.y, "terrain impact");
        }
    }
}
