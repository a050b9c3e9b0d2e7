//! # Mouse Sampler Module
//!
//! Relative-mode ("TrackPoint") input: pointer deltas accumulated while the
//! pointer lock is held, mapped to roll/pitch at each tick.
//!
//! The sampler sums all deltas that arrived since the previous tick and
//! scales the sum by a sensitivity factor, so a fast flick and several small
//! nudges inside one tick produce the same command. Yaw and throttle are not
//! mouse-controlled; they hold their last commanded value until a secondary
//! input supplies them.

use crate::axis::{self, AxisVector};

/// Accumulates relative pointer motion into an axis command.
///
/// Valid only while the pointer lock is held; the session activates this
/// sampler exactly when relative mode commits. As with the other samplers,
/// activation and deactivation reset all accumulation to neutral.
#[derive(Debug)]
pub struct MouseSampler {
    pending_dx: f32,
    pending_dy: f32,
    axes: AxisVector,
    sensitivity: f32,
    active: bool,
}

impl MouseSampler {
    /// Creates a sampler with the given sensitivity factor.
    ///
    /// Sensitivity scales host motion units to normalized axis deflection;
    /// a value of 0.02 means a 50-unit flick in one tick is full deflection.
    #[must_use]
    pub fn new(sensitivity: f32) -> Self {
        Self {
            pending_dx: 0.0,
            pending_dy: 0.0,
            axes: AxisVector::neutral(),
            sensitivity: if sensitivity.is_finite() { sensitivity.max(0.0) } else { 0.0 },
            active: false,
        }
    }

    /// Returns true while this sampler is the active modality.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Makes this sampler the live producer, starting from neutral.
    pub fn activate(&mut self) {
        self.reset();
        self.active = true;
    }

    /// Deactivates the sampler and drops pending motion.
    pub fn deactivate(&mut self) {
        self.reset();
        self.active = false;
    }

    /// Adds a relative pointer delta to the current tick's accumulation.
    /// Ignored while inactive.
    pub fn push_delta(&mut self, dx: f32, dy: f32) {
        if !self.active {
            return;
        }
        if dx.is_finite() {
            self.pending_dx += dx;
        }
        if dy.is_finite() {
            self.pending_dy += dy;
        }
    }

    /// Supplies yaw/throttle from a secondary input source.
    ///
    /// The mouse only drives roll and pitch; whatever secondary mapping the
    /// host provides (if any) lands here and persists until overwritten.
    pub fn set_secondary(&mut self, yaw: f32, throttle: f32) {
        if !self.active {
            return;
        }
        self.axes.yaw = axis::sanitize(yaw);
        self.axes.throttle = axis::sanitize(throttle);
    }

    /// Consumes the deltas accumulated since the last tick and returns the
    /// resulting axis command. Returns neutral while inactive.
    ///
    /// Roll follows horizontal motion, pitch follows vertical motion with
    /// the screen convention inverted (pointer up is pitch forward). With no
    /// motion during the tick, roll/pitch return to neutral while
    /// yaw/throttle keep their last commanded value.
    pub fn tick(&mut self) -> AxisVector {
        if !self.active {
            return AxisVector::neutral();
        }

        let roll = self.pending_dx * self.sensitivity;
        let pitch = -self.pending_dy * self.sensitivity;
        self.pending_dx = 0.0;
        self.pending_dy = 0.0;

        self.axes = AxisVector::new(roll, pitch, self.axes.yaw, self.axes.throttle);
        self.axes
    }

    /// Last accumulated command, without advancing the sampler.
    #[must_use]
    pub fn axes(&self) -> AxisVector {
        self.axes
    }

    fn reset(&mut self) {
        self.pending_dx = 0.0;
        self.pending_dy = 0.0;
        self.axes = AxisVector::neutral();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_sampler() -> MouseSampler {
        let mut sampler = MouseSampler::new(0.02);
        sampler.activate();
        sampler
    }

    #[test]
    fn test_inactive_sampler_ignores_deltas() {
        let mut sampler = MouseSampler::new(0.02);
        sampler.push_delta(100.0, 100.0);
        assert!(sampler.tick().is_neutral());
    }

    #[test]
    fn test_deltas_map_to_roll_and_pitch() {
        let mut sampler = active_sampler();
        sampler.push_delta(10.0, -5.0);

        let axes = sampler.tick();
        assert!((axes.roll - 0.2).abs() < 1e-6);
        assert!((axes.pitch - 0.1).abs() < 1e-6, "pointer up is pitch forward");
    }

    #[test]
    fn test_deltas_accumulate_within_a_tick() {
        let mut sampler = active_sampler();
        sampler.push_delta(5.0, 0.0);
        sampler.push_delta(5.0, 0.0);
        sampler.push_delta(5.0, 0.0);

        let axes = sampler.tick();
        assert!((axes.roll - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_deltas_do_not_carry_across_ticks() {
        let mut sampler = active_sampler();
        sampler.push_delta(10.0, 0.0);
        sampler.tick();

        // No motion this tick: roll returns to neutral
        let axes = sampler.tick();
        assert_eq!(axes.roll, 0.0);
    }

    #[test]
    fn test_large_flick_clamps() {
        let mut sampler = active_sampler();
        sampler.push_delta(10_000.0, -10_000.0);

        let axes = sampler.tick();
        assert_eq!(axes.roll, 1.0);
        assert_eq!(axes.pitch, 1.0);
    }

    #[test]
    fn test_non_finite_deltas_are_dropped() {
        let mut sampler = active_sampler();
        sampler.push_delta(f32::NAN, f32::INFINITY);
        sampler.push_delta(10.0, 0.0);

        let axes = sampler.tick();
        assert!((axes.roll - 0.2).abs() < 1e-6);
        assert_eq!(axes.pitch, 0.0);
    }

    #[test]
    fn test_secondary_axes_persist_across_ticks() {
        let mut sampler = active_sampler();
        sampler.set_secondary(0.3, 0.6);

        let axes = sampler.tick();
        assert!((axes.yaw - 0.3).abs() < 1e-6);
        assert!((axes.throttle - 0.6).abs() < 1e-6);

        // Still there on the next tick with no new secondary input
        let axes = sampler.tick();
        assert!((axes.yaw - 0.3).abs() < 1e-6);
        assert!((axes.throttle - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_activation_resets_everything() {
        let mut sampler = active_sampler();
        sampler.push_delta(10.0, 10.0);
        sampler.set_secondary(0.5, 0.5);
        sampler.tick();

        sampler.deactivate();
        assert!(sampler.axes().is_neutral());

        sampler.activate();
        let axes = sampler.tick();
        assert!(axes.is_neutral(), "re-entry must not replay stale motion");
    }
}
