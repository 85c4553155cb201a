//! Scripted flight profile.
//!
//! Produces each tick's proximity metrics and controls from the previous
//! frame. The profile descends from orbit until the surface is live, lands,
//! patrols while firing, climbs out until the escape altitude returns the
//! session to the system view, then cruises away.

use nebula_surface::{InputSample, PlanetId, PlanetSurfaceState, ProximityMetrics, SurfaceFrame};
use tracing::info;

/// Orbital distance the flight starts from and returns to.
pub const ORBIT_DISTANCE_M: f64 = 9_000.0;

/// Legs of the profile, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    /// Closing on the planet until the surface world is live.
    Descent,
    /// Settling onto the terrain.
    Landing,
    /// Low-altitude patrol with bursts of fire.
    Patrol,
    /// Full lift until the system view is restored.
    ClimbOut,
    /// Drifting away in the system view.
    Cruise,
}

/// Timing of the profile.
#[derive(Debug, Clone)]
pub struct FlightProfile {
    /// Orbital closing speed during descent (m/s).
    pub descent_rate: f64,
    /// Orbital receding speed while cruising (m/s).
    pub cruise_rate: f64,
    /// Seconds spent landing.
    pub landing_s: f64,
    /// Seconds spent patrolling.
    pub patrol_s: f64,
    /// Hover height during the patrol.
    pub patrol_height_m: f64,
    /// Seconds spent cruising before the flight ends.
    pub cruise_s: f64,
}

impl Default for FlightProfile {
    fn default() -> Self {
        Self {
            descent_rate: 600.0,
            cruise_rate: 400.0,
            landing_s: 2.0,
            patrol_s: 8.0,
            patrol_height_m: 30.0,
            cruise_s: 3.0,
        }
    }
}

/// The pilot flying the profile.
#[derive(Debug, Clone)]
pub struct FlightPlan {
    planet: PlanetId,
    profile: FlightProfile,
    leg: Leg,
    leg_time: f64,
    distance: f64,
}

impl FlightPlan {
    /// Start a descent toward `planet` from orbit.
    pub fn new(planet: PlanetId, profile: FlightProfile) -> Self {
        Self {
            planet,
            profile,
            leg: Leg::Descent,
            leg_time: 0.0,
            distance: ORBIT_DISTANCE_M,
        }
    }

    /// Current leg.
    pub fn leg(&self) -> Leg {
        self.leg
    }

    /// Whether the profile has been flown to the end.
    pub fn finished(&self) -> bool {
        self.leg == Leg::Cruise && self.leg_time >= self.profile.cruise_s
    }

    /// Metrics and controls for the next tick, given the previous frame.
    pub fn next(&mut self, last: Option<&SurfaceFrame>, dt: f64) -> (ProximityMetrics, InputSample) {
        self.leg_time += dt;
        let surface_ready = last.is_some_and(|f| f.surface_ready);
        let altitude = last.and_then(|f| f.active_vehicle).map(|v| v.altitude);

        let mut input = InputSample::default();
        match self.leg {
            Leg::Descent => {
                self.distance = (self.distance - self.profile.descent_rate * dt).max(0.0);
                if surface_ready {
                    self.advance(Leg::Landing);
                }
            }
            Leg::Landing => {
                input.throttle = 0.2;
                if self.leg_time >= self.profile.landing_s {
                    self.advance(Leg::Patrol);
                }
            }
            Leg::Patrol => {
                input.throttle = 0.6;
                input.yaw = 0.3;
                input.fire = self.leg_time % 2.0 < 0.5;
                input.lift = match altitude {
                    Some(h) if h < self.profile.patrol_height_m => 1.0,
                    _ => 0.0,
                };
                if self.leg_time >= self.profile.patrol_s {
                    self.advance(Leg::ClimbOut);
                }
            }
            Leg::ClimbOut => {
                input.throttle = 0.3;
                input.lift = 1.0;
                if last.is_some_and(|f| f.state == PlanetSurfaceState::SystemView) {
                    self.distance = ORBIT_DISTANCE_M;
                    self.advance(Leg::Cruise);
                }
            }
            Leg::Cruise => {
                self.distance += self.profile.cruise_rate * dt;
            }
        }

        // Once on the surface the host reports the vehicle's own altitude.
        let distance = match (self.leg, altitude) {
            (Leg::Landing | Leg::Patrol | Leg::ClimbOut, Some(h)) => h,
            _ => self.distance,
        };
        (ProximityMetrics::at(self.planet.clone(), distance), input)
    }

    fn advance(&mut self, leg: Leg) {
        info!(from = ?self.leg, to = ?leg, "flight leg");
        self.leg = leg;
        self.leg_time = 0.0;
    }
}
