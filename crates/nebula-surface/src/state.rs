//! Transition states and planet identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a planet in the registry, e.g. `"mars"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanetId(String);

impl PlanetId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlanetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlanetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which simulation context is current.
///
/// Exactly one state is current at any time and it alone decides which
/// collaborator set (orbital or surface) is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlanetSurfaceState {
    /// Sparse orbital view of the solar system.
    #[default]
    SystemView,
    /// Closing on a planet: chase camera attached, assets preloading.
    Approach,
    /// Surface simulation live (or activating).
    Surface,
    /// Leaving the surface; the world stays live until the system view is reached.
    Departing,
}

impl PlanetSurfaceState {
    /// States in which a planet must be the current focus.
    pub fn requires_planet(self) -> bool {
        !matches!(self, Self::SystemView)
    }

    /// States in which the surface world must be activated.
    pub fn requires_surface(self) -> bool {
        matches!(self, Self::Surface)
    }

    /// States in which an already-live surface world is kept alive.
    pub fn keeps_surface(self) -> bool {
        !matches!(self, Self::SystemView)
    }

    /// HUD control preset applied on entry to this state.
    pub fn hud_preset(self) -> HudPreset {
        match self {
            Self::SystemView => HudPreset::Orbital,
            Self::Approach => HudPreset::Approach,
            Self::Surface => HudPreset::Surface,
            Self::Departing => HudPreset::Departure,
        }
    }
}

impl fmt::Display for PlanetSurfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SystemView => "SYSTEM_VIEW",
            Self::Approach => "APPROACH",
            Self::Surface => "SURFACE",
            Self::Departing => "DEPARTING",
        };
        f.write_str(name)
    }
}

/// HUD control layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HudPreset {
    /// Orbital map controls.
    Orbital,
    /// Approach guidance.
    Approach,
    /// Full surface flight and combat controls.
    Surface,
    /// Departure guidance.
    Departure,
}

/// Camera rig currently driving the view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraRigKind {
    /// Orbital rig of the system view.
    #[default]
    Orbital,
    /// Chase rig following the active vehicle.
    Chase,
}
