//! Altitude smoothing with a hysteresis hold timer.
//!
//! [`AltitudeEstimator`] turns a noisy, possibly missing altitude sample into a
//! smoothed value and a debounced "above escape altitude" signal. The signal
//! only fires after the smoothed altitude has stayed above the threshold for
//! the configured hold duration *and* telemetry is still arriving, so a single
//! spike or a stalled sensor cannot trigger an escape.

use nebula_config::AltitudeFilterConfig;

/// Slack for timer comparisons, so frame steps that sum to the hold duration
/// (ten steps of 0.1 s) count as reaching it.
const TIMER_EPSILON: f64 = 1e-9;

/// Result of one estimator update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AltitudeEstimate {
    /// Last valid sample.
    pub raw: f64,
    /// Exponentially filtered altitude.
    pub smoothed: f64,
    /// `true` once the hold timer has reached the hold duration.
    pub above_threshold: bool,
}

/// Exponential altitude filter with a hold timer.
#[derive(Clone, Debug)]
pub struct AltitudeEstimator {
    response: f64,
    hold_duration: f64,
    threshold: f64,
    raw: f64,
    smoothed: f64,
    has_sample: bool,
    /// Seconds since the last valid sample. Infinite until the first one.
    sample_age: f64,
    hold_timer: f64,
}

impl AltitudeEstimator {
    /// Create an estimator with no sample history.
    pub fn new(config: &AltitudeFilterConfig) -> Self {
        Self {
            response: config.response.max(0.0),
            hold_duration: config.hold_duration_s.max(f64::EPSILON),
            threshold: config.escape_altitude,
            raw: 0.0,
            smoothed: 0.0,
            has_sample: false,
            sample_age: f64::INFINITY,
            hold_timer: 0.0,
        }
    }

    /// Feed one sample (or `None` when the sensor produced nothing this frame).
    ///
    /// Negative and non-finite samples are treated as missing. A `dt` of zero
    /// (or a non-finite `dt`) snaps `smoothed` to the target without filtering.
    pub fn update(&mut self, sample: Option<f64>, dt: f64) -> AltitudeEstimate {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        match sample.filter(|s| s.is_finite() && *s >= 0.0) {
            Some(value) => {
                self.raw = value;
                self.has_sample = true;
                self.sample_age = 0.0;
            }
            None => self.sample_age += dt,
        }

        let target = if self.has_sample {
            self.raw
        } else {
            self.smoothed
        };
        if dt > 0.0 {
            let blend = 1.0 - (-self.response * dt).exp();
            self.smoothed += (target - self.smoothed) * blend;
        } else {
            self.smoothed = target;
        }

        let fresh = self.sample_age <= 2.0 * self.hold_duration + TIMER_EPSILON;
        if fresh && self.smoothed >= self.threshold {
            // Capped so a long climb cannot bank time against a later sensor stall.
            let held = self.hold_timer + dt;
            self.hold_timer = if held + TIMER_EPSILON >= self.hold_duration {
                self.hold_duration
            } else {
                held
            };
        } else {
            self.hold_timer = (self.hold_timer - dt).max(0.0);
        }

        self.estimate()
    }

    /// Snap raw and smoothed altitude to `value` and clear all timers.
    ///
    /// Used whenever a surface world is created or destroyed so readings from
    /// the previous world cannot leak across the swap.
    pub fn reset(&mut self, value: f64) {
        self.raw = value;
        self.smoothed = value;
        self.has_sample = true;
        self.sample_age = 0.0;
        self.hold_timer = 0.0;
    }

    /// Whether a valid sample arrived within the last `max_age` seconds.
    pub fn has_recent_sample(&self, max_age: f64) -> bool {
        self.sample_age <= max_age
    }

    /// Current estimate without advancing time.
    pub fn estimate(&self) -> AltitudeEstimate {
        AltitudeEstimate {
            raw: self.raw,
            smoothed: self.smoothed,
            above_threshold: self.hold_timer + TIMER_EPSILON >= self.hold_duration,
        }
    }

    /// Escape altitude the hold timer compares against.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Seconds since the last valid sample.
    pub fn sample_age(&self) -> f64 {
        self.sample_age
    }
}
