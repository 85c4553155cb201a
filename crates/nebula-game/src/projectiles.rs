//! Ballistic projectile pool.

use glam::DVec3;
use nebula_surface::{ProjectileContext, ProjectileEvent, ProjectileManager, VehicleId, WorldId};
use tracing::{debug, trace};

/// Projectile tuning.
#[derive(Debug, Clone)]
pub struct ProjectileConfig {
    /// Muzzle speed (m/s).
    pub speed: f64,
    /// Seconds before an unexploded projectile is dropped.
    pub lifetime_s: f64,
    /// Seconds between shots while the trigger is held.
    pub cooldown_s: f64,
    /// Distance at which a projectile hits a vehicle.
    pub hit_radius: f64,
    /// Damage per hit.
    pub damage: f64,
    /// Gravity (m/s²).
    pub gravity: f64,
    /// Upper bound on live projectiles.
    pub max_live: usize,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 600.0,
            lifetime_s: 3.0,
            cooldown_s: 0.25,
            hit_radius: 4.0,
            damage: 10.0,
            gravity: 3.7,
            max_live: 256,
        }
    }
}

#[derive(Debug, Clone)]
struct Projectile {
    owner: VehicleId,
    position: DVec3,
    velocity: DVec3,
    age: f64,
}

/// Projectile simulation of the surface world.
#[derive(Debug, Default)]
pub struct ProjectilePool {
    config: ProjectileConfig,
    world: Option<WorldId>,
    live: Vec<Projectile>,
    cooldown: f64,
    fired: u64,
}

impl ProjectilePool {
    /// Create an empty pool.
    pub fn new(config: ProjectileConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Projectiles in flight.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Shots fired since the pool was created.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    fn fire(&mut self, owner: VehicleId, origin: DVec3, heading: f64) {
        if self.live.len() >= self.config.max_live {
            return;
        }
        let forward = DVec3::new(heading.cos(), heading.sin(), 0.02).normalize();
        self.live.push(Projectile {
            owner,
            position: origin + forward * 2.0,
            velocity: forward * self.config.speed,
            age: 0.0,
        });
        self.cooldown = self.config.cooldown_s;
        self.fired += 1;
        trace!(vehicle = owner.0, "projectile fired");
    }
}

impl ProjectileManager for ProjectilePool {
    fn set_world(&mut self, world: Option<WorldId>) {
        self.world = world;
    }

    fn clear(&mut self) {
        if !self.live.is_empty() {
            debug!(live = self.live.len(), "projectiles cleared");
        }
        self.live.clear();
        self.cooldown = 0.0;
    }

    fn update(&mut self, dt: f64, ctx: &ProjectileContext<'_>) -> Vec<ProjectileEvent> {
        if self.world.is_none() {
            return Vec::new();
        }
        self.cooldown = (self.cooldown - dt).max(0.0);
        if ctx.input.fire
            && self.cooldown <= 0.0
            && let Some((owner, state)) = ctx.shooter
        {
            self.fire(owner, state.position, state.heading);
        }

        let config = &self.config;
        let mut events = Vec::new();
        self.live.retain_mut(|p| {
            p.velocity.z -= config.gravity * dt;
            p.position += p.velocity * dt;
            p.age += dt;

            let hit = ctx
                .targets
                .iter()
                .find(|(id, pos)| *id != p.owner && pos.distance(p.position) <= config.hit_radius);
            if let Some((vehicle, _)) = hit {
                events.push(ProjectileEvent::VehicleHit {
                    vehicle: *vehicle,
                    damage: config.damage,
                });
                return false;
            }
            if p.position.z <= ctx.world.height_at(p.position.x, p.position.y) {
                events.push(ProjectileEvent::Impact {
                    position: p.position,
                });
                return false;
            }
            p.age < config.lifetime_s
        });
        events
    }
}
