//! Surface ships with a damped Newtonian flight model.
//!
//! [`Fleet`] is the vehicle system of the surface world. The player's ship
//! reads the frame's controls: throttle pushes along the heading, lift
//! fights gravity, and linear damping keeps the ship from ice-skating. AI
//! ships circle the spawn point at a fixed hover height. Every ship is kept
//! above the terrain of the world passed to each update.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec3;
use nebula_surface::{
    FrameInput, HudData, JoinOptions, SurfaceWorld, VehicleId, VehicleMode, VehicleState,
    VehicleSystem, VehicleUpdate, WorldId,
};
use tracing::{debug, info};

/// Flight tuning shared by every ship.
#[derive(Debug, Clone)]
pub struct ShipConfig {
    /// Horizontal acceleration at full throttle (m/s²).
    pub acceleration: f64,
    /// Horizontal speed cap (m/s).
    pub max_speed: f64,
    /// Vertical acceleration at full lift (m/s²).
    pub lift_acceleration: f64,
    /// Gravity (m/s²).
    pub gravity: f64,
    /// Applied as `velocity *= (1 - damping * dt)` each tick.
    pub linear_damping: f64,
    /// Yaw rate at full stick (rad/s).
    pub turn_rate: f64,
    /// Height below which a ship counts as grounded.
    pub ground_clearance: f64,
    /// Hover height of AI ships.
    pub ai_hover_height: f64,
    /// Circle radius step between successive AI ships.
    pub ai_orbit_radius: f64,
    /// AI cruise speed (m/s).
    pub ai_speed: f64,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            acceleration: 30.0,
            max_speed: 120.0,
            lift_acceleration: 60.0,
            gravity: 3.7,
            linear_damping: 0.3,
            turn_rate: 1.2,
            ground_clearance: 1.0,
            ai_hover_height: 25.0,
            ai_orbit_radius: 80.0,
            ai_speed: 35.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Pilot {
    Player(String),
    Ai { center: DVec3, radius: f64, phase: f64 },
}

/// Runtime state of one ship.
#[derive(Debug, Clone)]
pub struct Ship {
    id: VehicleId,
    pilot: Pilot,
    /// World position; `z` is absolute height.
    pub position: DVec3,
    /// Velocity in world units per second.
    pub velocity: DVec3,
    /// Heading in radians, counter-clockwise from +X.
    pub heading: f64,
    /// Throttle in `[0, 1]`.
    pub throttle: f64,
    /// Height above the terrain at the last update.
    pub altitude: f64,
}

impl Ship {
    /// Forward direction on the horizontal plane.
    pub fn forward(&self) -> DVec3 {
        DVec3::new(self.heading.cos(), self.heading.sin(), 0.0)
    }

    /// Snapshot for the transition core.
    pub fn state(&self, config: &ShipConfig) -> VehicleState {
        let mode = if self.altitude <= config.ground_clearance {
            VehicleMode::Grounded
        } else {
            VehicleMode::Flight
        };
        VehicleState {
            position: self.position,
            altitude: self.altitude,
            heading: self.heading,
            speed: self.velocity.length(),
            throttle: self.throttle,
            mode,
        }
    }

    fn is_player(&self) -> bool {
        matches!(self.pilot, Pilot::Player(_))
    }

    /// Keep the ship on or above the terrain and refresh its altitude.
    fn settle(&mut self, world: &dyn SurfaceWorld) {
        let ground = world.height_at(self.position.x, self.position.y);
        if self.position.z < ground {
            self.position.z = ground;
            self.velocity.z = self.velocity.z.max(0.0);
        }
        self.altitude = self.position.z - ground;
    }
}

/// Apply one tick of player controls to `ship`.
///
/// Throttle accelerates along the heading, lift accelerates upward against
/// gravity, and damping bleeds off velocity. Horizontal speed is capped.
pub fn fly_ship(ship: &mut Ship, config: &ShipConfig, frame: &FrameInput) {
    let dt = frame.dt.max(0.0);
    let input = &frame.input;

    ship.heading = (ship.heading + input.yaw.clamp(-1.0, 1.0) * config.turn_rate * dt)
        .rem_euclid(TAU);
    ship.throttle = input.throttle.clamp(0.0, 1.0);

    let thrust = ship.forward() * ship.throttle * config.acceleration;
    let lift = input.lift.clamp(-1.0, 1.0) * config.lift_acceleration;
    ship.velocity += (thrust + DVec3::Z * (lift - config.gravity)) * dt;
    ship.velocity *= (1.0 - config.linear_damping * dt).max(0.0);

    let horizontal = ship.velocity.truncate();
    if horizontal.length() > config.max_speed {
        let capped = horizontal.normalize() * config.max_speed;
        ship.velocity.x = capped.x;
        ship.velocity.y = capped.y;
    }

    ship.position += ship.velocity * dt;
}

fn fly_ai(ship: &mut Ship, config: &ShipConfig, world: &dyn SurfaceWorld, dt: f64) {
    let Pilot::Ai {
        center,
        radius,
        phase,
    } = &mut ship.pilot
    else {
        return;
    };
    *phase = (*phase + config.ai_speed / radius.max(1.0) * dt).rem_euclid(TAU);
    let x = center.x + *radius * phase.cos();
    let y = center.y + *radius * phase.sin();
    let target = DVec3::new(x, y, world.height_at(x, y) + config.ai_hover_height);

    if dt > 0.0 {
        ship.velocity = (target - ship.position) / dt;
    }
    ship.position = target;
    ship.heading = (*phase + FRAC_PI_2).rem_euclid(TAU);
    ship.throttle = 0.5;
}

/// The vehicle system of the surface world.
#[derive(Debug, Default)]
pub struct Fleet {
    config: ShipConfig,
    ships: Vec<Ship>,
    active: Option<VehicleId>,
    world: Option<WorldId>,
    next_id: u32,
}

impl Fleet {
    /// Create an empty fleet.
    pub fn new(config: ShipConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Look up a ship.
    pub fn ship(&self, id: VehicleId) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    /// World generation the fleet is attached to.
    pub fn world(&self) -> Option<WorldId> {
        self.world
    }

    fn allocate_id(&mut self) -> VehicleId {
        self.next_id += 1;
        VehicleId(self.next_id)
    }
}

impl VehicleSystem for Fleet {
    fn set_world(&mut self, world: Option<WorldId>) {
        debug!(world = ?world.map(|w| w.0), ships = self.ships.len(), "fleet world attached");
        self.world = world;
    }

    fn clear_vehicles(&mut self) {
        if !self.ships.is_empty() {
            debug!(ships = self.ships.len(), "fleet cleared");
        }
        self.ships.clear();
        self.active = None;
    }

    fn spawn_default_vehicles(&mut self, world: &dyn SurfaceWorld, count: u32) {
        for i in 0..count {
            let id = self.allocate_id();
            let radius = self.config.ai_orbit_radius * f64::from(i + 1);
            let phase = TAU * f64::from(i) / f64::from(count.max(1));
            let mut ship = Ship {
                id,
                pilot: Pilot::Ai {
                    center: DVec3::ZERO,
                    radius,
                    phase,
                },
                position: DVec3::ZERO,
                velocity: DVec3::ZERO,
                heading: 0.0,
                throttle: 0.0,
                altitude: 0.0,
            };
            fly_ai(&mut ship, &self.config, world, 0.0);
            ship.settle(world);
            self.ships.push(ship);
        }
        debug!(count, "AI ships spawned");
    }

    fn handle_player_join(&mut self, player_id: &str, world: &dyn SurfaceWorld, opts: JoinOptions) {
        let id = self.allocate_id();
        let ground = world.height_at(opts.spawn.x, opts.spawn.y);
        let mut ship = Ship {
            id,
            pilot: Pilot::Player(player_id.to_string()),
            position: DVec3::new(opts.spawn.x, opts.spawn.y, ground + opts.spawn.z.max(0.0)),
            velocity: DVec3::ZERO,
            heading: 0.0,
            throttle: 0.0,
            altitude: 0.0,
        };
        ship.settle(world);
        self.ships.push(ship);
        if opts.make_active {
            self.active = Some(id);
        }
        info!(player = player_id, vehicle = id.0, "player joined surface");
    }

    fn vehicles(&self) -> Vec<VehicleId> {
        self.ships.iter().map(|s| s.id).collect()
    }

    fn active_vehicle(&self) -> Option<VehicleId> {
        self.active
    }

    fn vehicle_state(&self, vehicle: VehicleId) -> Option<VehicleState> {
        self.ship(vehicle).map(|s| s.state(&self.config))
    }

    fn update(&mut self, frame: &FrameInput, world: &dyn SurfaceWorld) -> VehicleUpdate {
        let dt = frame.dt.max(0.0);
        for ship in &mut self.ships {
            if ship.is_player() {
                if Some(ship.id) == self.active {
                    fly_ship(ship, &self.config, frame);
                } else {
                    ship.velocity = DVec3::ZERO;
                }
            } else {
                fly_ai(ship, &self.config, world, dt);
            }
            ship.settle(world);
        }

        let active_state = self
            .active
            .and_then(|id| self.ship(id))
            .map(|s| s.state(&self.config));
        VehicleUpdate {
            active_vehicle: self.active,
            active_state,
            hud_data: active_state.map(|s| HudData {
                speed: s.speed,
                altitude: s.altitude,
                throttle: s.throttle,
                mode: s.mode,
                vehicle_count: self.ships.len(),
            }),
        }
    }
}
