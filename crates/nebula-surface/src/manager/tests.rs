use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::DVec3;
use nebula_config::{Config, SurfaceDescriptor};

use super::*;
use crate::assets::{AssetLoad, AssetLoadError, AssetLoadSender, DetailAssets};
use crate::collaborators::{
    ChaseCameraRig, Hud, InitializedWorld, InputSample, JoinOptions, OrbitInput,
    OrbitalCameraRig, ProjectileEvent, ProjectileManager, SurfaceWorld, VehicleId, VehicleMode,
    VehicleSystem, WorldId, WorldInitError, WorldInitRequest, WorldInitializer,
};
use crate::registry::{DescriptorContext, PlanetMetadata, PlanetModule};
use crate::state::HudPreset;
use crate::thresholds::ThresholdOverrides;

const DT: f64 = 0.1;

#[derive(Default)]
struct Log {
    initialize_calls: usize,
    fail_init: bool,
    live_worlds: usize,
    disposed_worlds: usize,
    vehicle_world: Option<WorldId>,
    projectile_world: Option<WorldId>,
    vehicles: Vec<VehicleId>,
    active: Option<VehicleId>,
    /// Altitude the active vehicle reports; `None` simulates a telemetry stall.
    altitude: Option<f64>,
    snaps: usize,
    chase_configs: usize,
    chase_updates: usize,
    orbital_updates: usize,
    hud_presets: Vec<HudPreset>,
    hud_labels: Vec<String>,
    hud_updates: usize,
}

type Shared = Rc<RefCell<Log>>;

struct FakeWorld {
    log: Shared,
}

impl SurfaceWorld for FakeWorld {
    fn update(&mut self, _focus: DVec3) {}

    fn height_at(&self, _x: f64, _y: f64) -> f64 {
        0.0
    }

    fn dispose(self: Box<Self>) {
        let mut log = self.log.borrow_mut();
        log.live_worlds -= 1;
        log.disposed_worlds += 1;
    }
}

struct FakeInitializer {
    log: Shared,
}

impl WorldInitializer for FakeInitializer {
    fn initialize(&mut self, request: WorldInitRequest) -> Result<InitializedWorld, WorldInitError> {
        if let Some(previous) = request.current_world {
            previous.dispose();
        }
        let mut log = self.log.borrow_mut();
        log.initialize_calls += 1;
        if log.fail_init {
            return Err(WorldInitError("terrain generator offline".into()));
        }
        log.live_worlds += 1;
        Ok(InitializedWorld {
            world: Box::new(FakeWorld {
                log: Rc::clone(&self.log),
            }),
            map_definition: request.map_definition,
        })
    }
}

struct FakeVehicles {
    log: Shared,
    next_id: u32,
}

impl FakeVehicles {
    fn state(log: &Log) -> Option<VehicleState> {
        let altitude = log.altitude?;
        Some(VehicleState {
            position: DVec3::new(0.0, 0.0, altitude),
            altitude,
            heading: 0.0,
            speed: 40.0,
            throttle: 0.5,
            mode: VehicleMode::Flight,
        })
    }
}

impl VehicleSystem for FakeVehicles {
    fn set_world(&mut self, world: Option<WorldId>) {
        self.log.borrow_mut().vehicle_world = world;
    }

    fn clear_vehicles(&mut self) {
        let mut log = self.log.borrow_mut();
        log.vehicles.clear();
        log.active = None;
    }

    fn spawn_default_vehicles(&mut self, _world: &dyn SurfaceWorld, count: u32) {
        for _ in 0..count {
            self.next_id += 1;
            self.log.borrow_mut().vehicles.push(VehicleId(self.next_id));
        }
    }

    fn handle_player_join(&mut self, _player_id: &str, _world: &dyn SurfaceWorld, opts: JoinOptions) {
        self.next_id += 1;
        let id = VehicleId(self.next_id);
        let mut log = self.log.borrow_mut();
        log.vehicles.push(id);
        if opts.make_active {
            log.active = Some(id);
        }
    }

    fn vehicles(&self) -> Vec<VehicleId> {
        self.log.borrow().vehicles.clone()
    }

    fn active_vehicle(&self) -> Option<VehicleId> {
        self.log.borrow().active
    }

    fn vehicle_state(&self, vehicle: VehicleId) -> Option<VehicleState> {
        let log = self.log.borrow();
        if !log.vehicles.contains(&vehicle) {
            return None;
        }
        Self::state(&log)
    }

    fn update(&mut self, _frame: &FrameInput, _world: &dyn SurfaceWorld) -> VehicleUpdate {
        let log = self.log.borrow();
        let active_state = log.active.and_then(|_| Self::state(&log));
        VehicleUpdate {
            active_vehicle: log.active,
            active_state,
            hud_data: active_state.map(|s| HudData {
                speed: s.speed,
                altitude: s.altitude,
                throttle: s.throttle,
                mode: s.mode,
                vehicle_count: log.vehicles.len(),
            }),
        }
    }
}

struct FakeProjectiles {
    log: Shared,
}

impl ProjectileManager for FakeProjectiles {
    fn set_world(&mut self, world: Option<WorldId>) {
        self.log.borrow_mut().projectile_world = world;
    }

    fn clear(&mut self) {}

    fn update(&mut self, _dt: f64, ctx: &ProjectileContext<'_>) -> Vec<ProjectileEvent> {
        match ctx.shooter {
            Some((_, state)) if ctx.input.fire => vec![ProjectileEvent::Impact {
                position: state.position,
            }],
            _ => Vec::new(),
        }
    }
}

struct FakeOrbital {
    log: Shared,
}

impl OrbitalCameraRig for FakeOrbital {
    fn update(&mut self, _dt: f64, _metrics: &ProximityMetrics, _orbit: &OrbitInput) {
        self.log.borrow_mut().orbital_updates += 1;
    }
}

struct FakeChase {
    log: Shared,
}

impl ChaseCameraRig for FakeChase {
    fn set_config(&mut self, _config: &ChaseCameraConfig) {
        self.log.borrow_mut().chase_configs += 1;
    }

    fn update(&mut self, _target: &VehicleState, _dt: f64, _orbit: &OrbitInput) {
        self.log.borrow_mut().chase_updates += 1;
    }

    fn snap_to(&mut self, _target: &VehicleState) {
        self.log.borrow_mut().snaps += 1;
    }
}

struct FakeHud {
    log: Shared,
}

impl Hud for FakeHud {
    fn set_controls(&mut self, preset: HudPreset) {
        self.log.borrow_mut().hud_presets.push(preset);
    }

    fn set_map_label(&mut self, label: &str) {
        self.log.borrow_mut().hud_labels.push(label.to_string());
    }

    fn update(&mut self, _data: &HudData) {
        self.log.borrow_mut().hud_updates += 1;
    }
}

fn collaborators(log: &Shared) -> Collaborators {
    Collaborators {
        world_initializer: Box::new(FakeInitializer { log: Rc::clone(log) }),
        vehicles: Box::new(FakeVehicles {
            log: Rc::clone(log),
            next_id: 0,
        }),
        projectiles: Box::new(FakeProjectiles { log: Rc::clone(log) }),
        orbital_camera: Box::new(FakeOrbital { log: Rc::clone(log) }),
        chase_camera: Box::new(FakeChase { log: Rc::clone(log) }),
        hud: Box::new(FakeHud { log: Rc::clone(log) }),
    }
}

struct Harness {
    manager: PlanetSurfaceManager,
    log: Shared,
    elapsed: f64,
}

impl Harness {
    fn new() -> Self {
        Self::with_registry(PlanetRegistry::from_catalog(&Config::default().planets))
    }

    fn with_registry(registry: PlanetRegistry) -> Self {
        let log: Shared = Rc::new(RefCell::new(Log {
            altitude: Some(5.0),
            ..Log::default()
        }));
        let manager = PlanetSurfaceManager::new(
            SurfaceSettings::default(),
            registry,
            collaborators(&log),
        );
        Self {
            manager,
            log,
            elapsed: 0.0,
        }
    }

    fn tick(&mut self, metrics: ProximityMetrics) -> SurfaceFrame {
        self.tick_with(metrics, InputSample::default())
    }

    fn tick_with(&mut self, metrics: ProximityMetrics, input: InputSample) -> SurfaceFrame {
        self.elapsed += DT;
        let frame = FrameInput {
            input,
            ..FrameInput::tick(DT, self.elapsed)
        };
        self.manager.update(&frame, &metrics)
    }

    /// Approach `planet`, enter SURFACE, and let the activation resolve.
    fn land(&mut self, planet: &str) {
        self.tick(ProximityMetrics::at(planet, 5000.0));
        self.tick(ProximityMetrics::at(planet, 1200.0));
        self.tick(ProximityMetrics::at(planet, 1200.0));
        assert!(self.manager.surface_ready(), "surface did not activate");
    }

    fn set_altitude(&self, altitude: Option<f64>) {
        self.log.borrow_mut().altitude = altitude;
    }

    fn aborts(&mut self) -> usize {
        self.manager
            .drain_events()
            .iter()
            .filter(|e| matches!(e, TransitionEvent::ActivationAborted { .. }))
            .count()
    }
}

fn mars() -> PlanetId {
    PlanetId::from("mars")
}

fn deferred_mars() -> (PlanetRegistry, AssetLoadSender, Rc<Cell<usize>>) {
    let (sender, load) = AssetLoad::channel();
    let slot = RefCell::new(Some(load));
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let module = PlanetModule::new(PlanetMetadata::new("mars", "Mars"))
        .with_detail_assets(move |_: &PlanetId| {
            counter.set(counter.get() + 1);
            slot.borrow_mut()
                .take()
                .unwrap_or_else(|| AssetLoad::channel().1)
        })
        .with_surface_descriptor(|ctx: &DescriptorContext<'_>| {
            let mut descriptor = SurfaceDescriptor::default();
            if let Some(assets) = ctx.assets {
                descriptor.map_id = assets.pack.clone();
            }
            Some(descriptor)
        });
    let mut registry = PlanetRegistry::new();
    registry.insert(module);
    (registry, sender, calls)
}

#[test]
fn test_far_planet_stays_in_system_view() {
    let mut h = Harness::new();
    let frame = h.tick(ProximityMetrics::at("mars", 8000.0));
    assert_eq!(frame.state, PlanetSurfaceState::SystemView);
    assert_eq!(frame.effective_distance, 8000.0);
    assert!(h.manager.current_planet().is_none());
    assert!(h.manager.drain_events().is_empty());
    assert_eq!(h.log.borrow().orbital_updates, 1);
}

#[test]
fn test_approach_within_radius() {
    let mut h = Harness::new();
    let frame = h.tick(ProximityMetrics::at("mars", 5000.0));
    assert_eq!(frame.state, PlanetSurfaceState::Approach);
    assert_eq!(h.manager.current_planet(), Some(&mars()));
    assert_eq!(h.manager.active_camera(), CameraRigKind::Chase);

    let log = h.log.borrow();
    assert_eq!(log.hud_presets.last(), Some(&HudPreset::Approach));
    assert_eq!(log.hud_labels.last().map(String::as_str), Some("Mars"));
    assert_eq!(log.chase_configs, 1);
    drop(log);

    let events = h.manager.drain_events();
    assert_eq!(
        events,
        vec![TransitionEvent::StateChanged {
            from: PlanetSurfaceState::SystemView,
            to: PlanetSurfaceState::Approach,
            planet: Some(mars()),
            reason: None,
        }]
    );
}

#[test]
fn test_surface_activates_on_following_update() {
    let mut h = Harness::new();
    h.tick(ProximityMetrics::at("mars", 5000.0));

    let frame = h.tick(ProximityMetrics::at("mars", 1200.0));
    assert_eq!(frame.state, PlanetSurfaceState::Surface);
    assert!(!frame.surface_ready);
    assert_eq!(h.manager.activation_in_flight(), Some(&mars()));

    let frame = h.tick(ProximityMetrics::at("mars", 1200.0));
    assert!(frame.surface_ready);
    assert!(h.manager.activation_in_flight().is_none());

    let surface = h.manager.surface().unwrap();
    assert_eq!(surface.planet_id(), &mars());
    assert_eq!(surface.map_definition().map_id, "mars-dunes");
    assert_eq!(surface.metadata().name, "Mars");

    let log = h.log.borrow();
    assert!(log.active.is_some());
    assert_eq!(log.vehicle_world, Some(surface.world_id()));
    assert_eq!(log.projectile_world, Some(surface.world_id()));
    assert_eq!(log.live_worlds, 1);
    assert_eq!(log.snaps, 1);
    assert_eq!(log.hud_presets.last(), Some(&HudPreset::Surface));
    // Player plus the map's default fleet.
    let expected = 1 + surface.map_definition().spawn.default_vehicles as usize;
    assert_eq!(log.vehicles.len(), expected);
    drop(log);

    let events = h.manager.drain_events();
    assert!(events.contains(&TransitionEvent::SurfaceReady {
        planet: mars(),
        world: WorldId(1),
    }));
}

#[test]
fn test_manual_exit_departs_then_returns() {
    let mut h = Harness::new();
    h.land("mars");
    h.manager.drain_events();

    assert!(h.manager.request_system_view(ExitRequest::new(ExitReason::Manual)));
    assert_eq!(h.manager.state(), PlanetSurfaceState::Departing);
    assert_eq!(
        h.manager.pending_exit().map(|p| &p.reason),
        Some(&ExitReason::Manual)
    );
    assert!(h.manager.surface_ready());

    let frame = h.tick(ProximityMetrics::at("mars", 100.0));
    assert_eq!(frame.state, PlanetSurfaceState::SystemView);
    assert!(!frame.surface_ready);
    assert!(h.manager.pending_exit().is_none());
    assert!(h.manager.current_planet().is_none());
    assert_eq!(h.manager.active_camera(), CameraRigKind::Orbital);

    let log = h.log.borrow();
    assert_eq!(log.live_worlds, 0);
    assert_eq!(log.vehicle_world, None);
    assert_eq!(log.projectile_world, None);
    assert!(log.vehicles.is_empty());
    assert_eq!(log.hud_labels.last().map(String::as_str), Some("System View"));
    drop(log);

    let events = h.manager.drain_events();
    assert_eq!(
        events[0],
        TransitionEvent::StateChanged {
            from: PlanetSurfaceState::Surface,
            to: PlanetSurfaceState::Departing,
            planet: Some(mars()),
            reason: Some(ExitReason::Manual),
        }
    );
    assert!(events.contains(&TransitionEvent::StateChanged {
        from: PlanetSurfaceState::Departing,
        to: PlanetSurfaceState::SystemView,
        planet: Some(mars()),
        reason: Some(ExitReason::Manual),
    }));
    assert!(events.contains(&TransitionEvent::SurfaceDisposed {
        planet: mars(),
        world: WorldId(1),
    }));
}

#[test]
fn test_immediate_exit_tears_down_synchronously() {
    let mut h = Harness::new();
    h.land("mars");
    assert!(
        h.manager
            .request_system_view(ExitRequest::new(ExitReason::Other("cutscene".into())).immediate())
    );
    assert_eq!(h.manager.state(), PlanetSurfaceState::SystemView);
    assert!(!h.manager.surface_ready());
    assert_eq!(h.log.borrow().live_worlds, 0);
}

#[test]
fn test_exit_from_approach_builds_no_world() {
    let mut h = Harness::new();
    h.tick(ProximityMetrics::at("mars", 5000.0));
    assert_eq!(h.manager.state(), PlanetSurfaceState::Approach);
    h.manager.drain_events();

    assert!(h.manager.request_system_view(ExitRequest::new(ExitReason::Manual)));
    assert_eq!(h.manager.state(), PlanetSurfaceState::Departing);
    assert_eq!(h.manager.current_planet(), Some(&mars()));
    assert!(!h.manager.surface_ready());

    let frame = h.tick(ProximityMetrics::at("mars", 5000.0));
    assert_eq!(frame.state, PlanetSurfaceState::SystemView);
    assert!(h.manager.pending_exit().is_none());
    assert!(h.manager.activation_in_flight().is_none());

    let log = h.log.borrow();
    assert_eq!(log.initialize_calls, 0);
    assert_eq!(log.live_worlds, 0);
    drop(log);

    let events = h.manager.drain_events();
    assert_eq!(
        events,
        vec![
            TransitionEvent::StateChanged {
                from: PlanetSurfaceState::Approach,
                to: PlanetSurfaceState::Departing,
                planet: Some(mars()),
                reason: Some(ExitReason::Manual),
            },
            TransitionEvent::StateChanged {
                from: PlanetSurfaceState::Departing,
                to: PlanetSurfaceState::SystemView,
                planet: Some(mars()),
                reason: Some(ExitReason::Manual),
            },
        ]
    );
}

#[test]
fn test_dispose_twice_leaves_nothing() {
    let mut h = Harness::new();
    h.land("mars");

    h.manager.dispose();
    h.manager.dispose();

    assert_eq!(h.manager.state(), PlanetSurfaceState::SystemView);
    assert!(h.manager.surface().is_none());
    assert!(h.manager.activation_in_flight().is_none());
    let log = h.log.borrow();
    assert_eq!(log.live_worlds, 0);
    assert_eq!(log.disposed_worlds, 1);
    drop(log);

    let events = h.manager.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        TransitionEvent::StateChanged {
            reason: Some(ExitReason::Shutdown),
            ..
        }
    )));
}

#[test]
fn test_exit_request_in_system_view_is_ignored() {
    let mut h = Harness::new();
    assert!(!h.manager.request_system_view(ExitRequest::default()));
    assert!(!h.manager.request_system_view(ExitRequest::default().immediate()));
    assert!(h.manager.drain_events().is_empty());
    assert!(h.manager.pending_exit().is_none());
}

#[test]
fn test_system_view_only_reaches_approach_in_one_step() {
    for distance in [0.0, 1.0, 1200.0, 1400.0, 5999.0, 6000.0] {
        let mut h = Harness::new();
        let frame = h.tick(ProximityMetrics::at("mars", distance));
        assert_eq!(frame.state, PlanetSurfaceState::Approach, "distance={distance}");
    }
    let mut h = Harness::new();
    let frame = h.tick(ProximityMetrics::unfocused(Some(0.0)));
    assert_eq!(frame.state, PlanetSurfaceState::SystemView);
}

#[test]
fn test_activation_is_single_flight() {
    let mut h = Harness::new();
    h.tick(ProximityMetrics::at("mars", 5000.0));
    h.tick(ProximityMetrics::at("mars", 1200.0));

    assert!(!h.manager.activate_surface());
    assert!(!h.manager.activate_surface());
    h.tick(ProximityMetrics::at("mars", 1200.0));
    assert!(!h.manager.activate_surface());
    h.tick(ProximityMetrics::at("mars", 1200.0));

    assert_eq!(h.log.borrow().initialize_calls, 1);
    assert_eq!(h.log.borrow().live_worlds, 1);
}

#[test]
fn test_unfocused_approach_returns_to_system_view() {
    let mut h = Harness::new();
    h.tick(ProximityMetrics::at("mars", 5000.0));
    let frame = h.tick(ProximityMetrics::unfocused(None));
    assert_eq!(frame.state, PlanetSurfaceState::SystemView);
}

#[test]
fn test_approach_hysteresis_band() {
    let mut h = Harness::new();
    h.tick(ProximityMetrics::at("mars", 5900.0));
    // Leaving needs strictly more than the system distance.
    assert_eq!(
        h.tick(ProximityMetrics::at("mars", 5200.0)).state,
        PlanetSurfaceState::Approach
    );
    assert_eq!(
        h.tick(ProximityMetrics::at("mars", 5201.0)).state,
        PlanetSurfaceState::SystemView
    );
}

#[test]
fn test_selected_planet_drives_approach() {
    let (registry, _sender, calls) = deferred_mars();
    let mut h = Harness::with_registry(registry);
    h.manager.select_planet("mars");
    assert_eq!(h.manager.preload_status(&mars()), PreloadStatus::Pending);

    let frame = h.tick(ProximityMetrics::unfocused(Some(4000.0)));
    assert_eq!(frame.state, PlanetSurfaceState::Approach);
    assert_eq!(h.manager.current_planet(), Some(&mars()));

    h.tick(ProximityMetrics::unfocused(Some(1000.0)));
    assert_eq!(h.manager.state(), PlanetSurfaceState::Surface);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_activation_waits_for_assets() {
    let (registry, sender, _calls) = deferred_mars();
    let mut h = Harness::with_registry(registry);
    h.tick(ProximityMetrics::at("mars", 5000.0));
    h.tick(ProximityMetrics::at("mars", 1200.0));
    for _ in 0..5 {
        h.tick(ProximityMetrics::at("mars", 1200.0));
    }
    assert!(!h.manager.surface_ready());
    assert_eq!(h.log.borrow().initialize_calls, 0);

    sender.complete(Ok(DetailAssets {
        pack: "mars/detail".into(),
        ..DetailAssets::default()
    }));
    h.tick(ProximityMetrics::at("mars", 1200.0));
    assert!(h.manager.surface_ready());
    assert_eq!(
        h.manager.surface().unwrap().map_definition().map_id,
        "mars/detail"
    );
}

#[test]
fn test_asset_failure_still_activates() {
    let module = PlanetModule::new(PlanetMetadata::new("mars", "Mars"))
        .with_detail_assets(|_: &PlanetId| {
            AssetLoad::ready(Err(AssetLoadError::Failed("pack missing".into())))
        })
        .with_surface_descriptor(|_: &DescriptorContext<'_>| Some(SurfaceDescriptor::default()));
    let mut registry = PlanetRegistry::new();
    registry.insert(module);
    let mut h = Harness::with_registry(registry);

    h.land("mars");
    assert_eq!(h.manager.preload_status(&mars()), PreloadStatus::NotRequested);
    assert_eq!(h.aborts(), 0);
}

#[test]
fn test_stale_activation_is_discarded() {
    let (registry, sender, _calls) = deferred_mars();
    let mut h = Harness::with_registry(registry);
    h.tick(ProximityMetrics::at("mars", 5000.0));
    h.tick(ProximityMetrics::at("mars", 1200.0));
    assert!(h.manager.activation_in_flight().is_some());

    h.manager
        .request_system_view(ExitRequest::new(ExitReason::Manual).immediate());
    sender.complete(Ok(DetailAssets::default()));
    h.tick(ProximityMetrics::unfocused(None));

    assert!(h.manager.activation_in_flight().is_none());
    assert!(!h.manager.surface_ready());
    assert_eq!(h.log.borrow().initialize_calls, 0);
}

#[test]
fn test_unknown_planet_retries_quietly() {
    let mut h = Harness::new();
    h.tick(ProximityMetrics::at("vulcan", 5000.0));
    assert_eq!(h.manager.state(), PlanetSurfaceState::Approach);
    for _ in 0..4 {
        h.tick(ProximityMetrics::at("vulcan", 1000.0));
    }
    assert_eq!(h.manager.state(), PlanetSurfaceState::Surface);
    assert!(!h.manager.surface_ready());
    assert!(h.manager.activation_in_flight().is_none());
    assert_eq!(h.aborts(), 1);
}

#[test]
fn test_missing_descriptor_aborts() {
    let mut registry = PlanetRegistry::new();
    registry.insert(PlanetModule::new(PlanetMetadata::new("io", "Io")));
    let settings = SurfaceSettings {
        default_surface: None,
        ..SurfaceSettings::default()
    };
    let log: Shared = Rc::default();
    let mut manager = PlanetSurfaceManager::new(settings, registry, collaborators(&log));

    manager.update(&FrameInput::tick(DT, DT), &ProximityMetrics::at("io", 5000.0));
    manager.update(&FrameInput::tick(DT, DT), &ProximityMetrics::at("io", 1000.0));
    manager.update(&FrameInput::tick(DT, DT), &ProximityMetrics::at("io", 1000.0));

    assert!(!manager.surface_ready());
    assert!(manager.drain_events().contains(&TransitionEvent::ActivationAborted {
        planet: PlanetId::from("io"),
        error: ActivationError::MissingDescriptor(PlanetId::from("io")),
    }));
    assert_eq!(log.borrow().initialize_calls, 0);
}

#[test]
fn test_planet_without_surface_uses_default_descriptor() {
    let mut h = Harness::new();
    h.land("io");
    assert_eq!(
        h.manager.surface().unwrap().map_definition(),
        &SurfaceDescriptor::default()
    );
}

#[test]
fn test_world_init_failure_leaves_no_world() {
    let mut h = Harness::new();
    h.log.borrow_mut().fail_init = true;
    h.tick(ProximityMetrics::at("mars", 5000.0));
    for _ in 0..4 {
        h.tick(ProximityMetrics::at("mars", 1200.0));
    }
    assert!(!h.manager.surface_ready());
    assert_eq!(h.log.borrow().live_worlds, 0);
    assert_eq!(h.log.borrow().vehicle_world, None);
    assert_eq!(h.aborts(), 1);

    h.log.borrow_mut().fail_init = false;
    h.tick(ProximityMetrics::at("mars", 1200.0));
    assert!(h.manager.surface_ready());
    assert_eq!(h.log.borrow().live_worlds, 1);
}

#[test]
fn test_held_altitude_escapes_to_system_view() {
    let mut h = Harness::new();
    h.land("mars");
    h.manager.drain_events();
    h.set_altitude(Some(3000.0));

    let mut reached = false;
    for _ in 0..60 {
        let frame = h.tick(ProximityMetrics::at("mars", 3000.0));
        if frame.state == PlanetSurfaceState::SystemView {
            reached = true;
            break;
        }
    }
    assert!(reached, "escape never triggered");
    assert!(!h.manager.surface_ready());

    let events = h.manager.drain_events();
    assert!(events.contains(&TransitionEvent::StateChanged {
        from: PlanetSurfaceState::Departing,
        to: PlanetSurfaceState::SystemView,
        planet: Some(mars()),
        reason: Some(ExitReason::Escape),
    }));
}

#[test]
fn test_altitude_spike_does_not_escape() {
    let mut h = Harness::new();
    h.land("mars");
    h.set_altitude(Some(50_000.0));
    h.tick(ProximityMetrics::at("mars", 100.0));
    h.set_altitude(Some(20.0));
    for _ in 0..30 {
        h.tick(ProximityMetrics::at("mars", 100.0));
    }
    assert_eq!(h.manager.state(), PlanetSurfaceState::Surface);
    assert!(h.manager.surface_ready());
}

#[test]
fn test_departing_returns_to_surface_without_rebuild() {
    let mut h = Harness::new();
    h.land("mars");
    h.set_altitude(Some(2700.0));
    for _ in 0..40 {
        if h.tick(ProximityMetrics::at("mars", 2700.0)).state == PlanetSurfaceState::Departing {
            break;
        }
    }
    assert_eq!(h.manager.state(), PlanetSurfaceState::Departing);
    assert!(h.manager.surface_ready());

    h.set_altitude(Some(100.0));
    for _ in 0..20 {
        if h.tick(ProximityMetrics::at("mars", 100.0)).state == PlanetSurfaceState::Surface {
            break;
        }
    }
    assert_eq!(h.manager.state(), PlanetSurfaceState::Surface);
    assert_eq!(h.log.borrow().initialize_calls, 1);
    assert_eq!(h.manager.surface().unwrap().world_id(), WorldId(1));
}

#[test]
fn test_stale_telemetry_falls_back_to_raw_distance() {
    let mut h = Harness::new();
    h.land("mars");
    h.set_altitude(None);

    for _ in 0..20 {
        h.tick(ProximityMetrics::at("mars", 9000.0));
    }
    assert_eq!(h.manager.state(), PlanetSurfaceState::Surface);

    for _ in 0..10 {
        h.tick(ProximityMetrics::at("mars", 9000.0));
    }
    assert_eq!(h.manager.state(), PlanetSurfaceState::SystemView);
    assert_eq!(h.log.borrow().live_worlds, 0);
}

#[test]
fn test_threshold_override_widens_approach() {
    let mut h = Harness::new();
    let metrics = ProximityMetrics::at("mars", 8000.0).with_thresholds(ThresholdOverrides {
        approach_enter: Some(10_000.0),
        ..Default::default()
    });
    let frame = h.tick(metrics);
    assert_eq!(frame.state, PlanetSurfaceState::Approach);
    assert_eq!(frame.thresholds.approach_enter, 10_000.0);
}

#[test]
fn test_surface_tick_drives_camera_hud_and_projectiles() {
    let mut h = Harness::new();
    h.land("mars");
    h.manager.drain_events();
    let before = h.log.borrow().chase_updates;

    let frame = h.tick_with(
        ProximityMetrics::at("mars", 100.0),
        InputSample {
            fire: true,
            ..InputSample::default()
        },
    );
    assert!(frame.hud.is_some());
    assert!(frame.active_vehicle.is_some());
    assert_eq!(h.log.borrow().chase_updates, before + 1);
    assert!(h.log.borrow().hud_updates >= 1);
    assert!(
        h.manager
            .drain_events()
            .iter()
            .any(|e| matches!(e, TransitionEvent::Projectile(ProjectileEvent::Impact { .. })))
    );
}

#[test]
fn test_exit_reason_display() {
    assert_eq!(ExitReason::Manual.to_string(), "manual");
    assert_eq!(ExitReason::Escape.to_string(), "escape");
    assert_eq!(ExitReason::Other("cutscene".into()).to_string(), "cutscene");
}
