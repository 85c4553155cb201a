//! Per-frame proximity input and threshold resolution.

use nebula_config::ThresholdDefaults;
use serde::{Deserialize, Serialize};

use crate::state::PlanetId;

/// Ratio between the surface entry distance and the derived departure distance.
pub const DEPART_RATIO: f64 = 1.35;

/// Ratio between the departure distance and the derived system-view distance.
pub const SYSTEM_RATIO: f64 = 1.4;

/// Caller-supplied distance reading for one update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityMetrics {
    /// Focused planet, if any.
    pub planet_id: Option<PlanetId>,
    /// Distance from the player to the planet surface.
    #[serde(alias = "altitude")]
    pub distance_to_surface: Option<f64>,
    /// Per-frame threshold overrides.
    pub thresholds: Option<ThresholdOverrides>,
}

impl ProximityMetrics {
    /// Metrics focused on `planet` at `distance`.
    pub fn at(planet: impl Into<PlanetId>, distance: f64) -> Self {
        Self {
            planet_id: Some(planet.into()),
            distance_to_surface: Some(distance),
            thresholds: None,
        }
    }

    /// Metrics with no focused planet.
    pub fn unfocused(distance: Option<f64>) -> Self {
        Self {
            planet_id: None,
            distance_to_surface: distance,
            thresholds: None,
        }
    }

    /// Attach threshold overrides.
    pub fn with_thresholds(mut self, overrides: ThresholdOverrides) -> Self {
        self.thresholds = Some(overrides);
        self
    }

    /// Valid distance reading, if any.
    pub fn distance(&self) -> Option<f64> {
        self.distance_to_surface.filter(|d| !d.is_nan())
    }
}

/// Optional per-frame replacements for [`ThresholdDefaults`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdOverrides {
    /// Approach entry distance.
    #[serde(alias = "approach_radius", alias = "approach")]
    pub approach_enter: Option<f64>,
    /// Surface entry distance.
    pub surface_enter: Option<f64>,
    /// Surface departure distance.
    pub depart_leave: Option<f64>,
    /// System-view return distance.
    pub system_leave: Option<f64>,
}

/// The four distances the transition table compares against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceThresholds {
    /// SYSTEM_VIEW → APPROACH at or below this distance.
    pub approach_enter: f64,
    /// APPROACH/DEPARTING → SURFACE at or below this distance.
    pub surface_enter: f64,
    /// SURFACE → DEPARTING at or above this distance.
    pub depart_leave: f64,
    /// DEPARTING → SYSTEM_VIEW at or above (APPROACH: above) this distance.
    pub system_leave: f64,
}

impl DistanceThresholds {
    /// Resolve this frame's thresholds from overrides and static defaults.
    ///
    /// Each missing distance is derived from the one before it, so a partial
    /// override can never reorder the chain: the surface distance is clamped
    /// to the approach distance, and the departure and system distances keep
    /// their minimum ratios to the distance below them.
    pub fn resolve(metrics: &ProximityMetrics, defaults: &ThresholdDefaults) -> Self {
        let overrides = metrics.thresholds.unwrap_or_default();
        let valid = |v: Option<f64>| v.filter(|d| d.is_finite() && *d >= 0.0);

        let approach_enter = valid(overrides.approach_enter).unwrap_or(defaults.approach_enter);
        let surface_enter = valid(overrides.surface_enter)
            .unwrap_or_else(|| approach_enter.min(defaults.surface_enter));
        let depart_leave = valid(overrides.depart_leave)
            .unwrap_or_else(|| (surface_enter * DEPART_RATIO).max(defaults.depart_leave));
        let system_leave = valid(overrides.system_leave)
            .unwrap_or_else(|| (depart_leave * SYSTEM_RATIO).max(defaults.system_leave));

        Self {
            approach_enter,
            surface_enter,
            depart_leave,
            system_leave,
        }
    }
}

impl From<&ThresholdDefaults> for DistanceThresholds {
    fn from(defaults: &ThresholdDefaults) -> Self {
        Self::resolve(&ProximityMetrics::default(), defaults)
    }
}
