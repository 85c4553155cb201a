//! Text HUD for the headless driver.
//!
//! Keeps the current control preset, map label and readout line. The line
//! has the same compact form a window title bar would show.

use nebula_surface::{Hud, HudData, HudPreset, VehicleMode};
use tracing::{debug, info};

/// HUD that renders to a string.
#[derive(Debug, Clone)]
pub struct TextHud {
    preset: HudPreset,
    label: String,
    line: String,
}

impl Default for TextHud {
    fn default() -> Self {
        Self {
            preset: HudPreset::Orbital,
            label: String::new(),
            line: String::new(),
        }
    }
}

impl TextHud {
    /// Create an empty HUD.
    pub fn new() -> Self {
        Self::default()
    }

    /// Active control preset.
    pub fn preset(&self) -> HudPreset {
        self.preset
    }

    /// Current map label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Last readout line.
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl Hud for TextHud {
    fn set_controls(&mut self, preset: HudPreset) {
        if preset != self.preset {
            debug!(from = ?self.preset, to = ?preset, "HUD controls switched");
        }
        self.preset = preset;
    }

    fn set_map_label(&mut self, label: &str) {
        if label != self.label {
            info!(label, "map label");
            self.label = label.to_string();
        }
    }

    fn update(&mut self, data: &HudData) {
        self.line = format_hud(data);
    }
}

/// Format a readout as a compact line.
///
/// Example: `SPD: 1,234 m/s | ALT: 402.3 m | THR: 75% | MODE: FLIGHT | VEH: 4`
pub fn format_hud(data: &HudData) -> String {
    let speed = format_with_commas(data.speed.max(0.0) as u64);
    let mode = match data.mode {
        VehicleMode::Grounded => "GROUNDED",
        VehicleMode::Flight => "FLIGHT",
    };
    format!(
        "SPD: {} m/s | ALT: {:.1} m | THR: {:.0}% | MODE: {} | VEH: {}",
        speed,
        data.altitude,
        data.throttle * 100.0,
        mode,
        data.vehicle_count,
    )
}

/// Format an integer with comma thousands separators.
fn format_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
