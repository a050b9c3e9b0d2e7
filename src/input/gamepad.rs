//! # Gamepad Sampler Module
//!
//! Absolute-mode input: the live device exposes a pollable snapshot, and the
//! sampler maps stick positions directly to axis values each tick.
//!
//! ## Stick Assignments
//!
//! | Stick | Axis |
//! |-------|------|
//! | Right Stick X | Roll |
//! | Right Stick Y | Pitch |
//! | Left Stick X | Yaw |
//! | Left Stick Y | Throttle |
//!
//! Stick values inside the deadzone radius are forced to exactly 0.0 to
//! suppress drift at rest; non-finite or otherwise implausible snapshot
//! values default to neutral and never escalate into errors.

use tracing::debug;

use crate::axis::{self, AxisVector};

/// One poll of a gamepad's stick positions, normalized to -1.0..1.0.
///
/// Y axes follow the hardware convention (downward-positive); the sampler
/// inverts them so "stick up" means positive pitch/throttle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GamepadSnapshot {
    /// Left stick X. -1.0 = full left, 1.0 = full right.
    pub left_x: f32,
    /// Left stick Y. -1.0 = full up, 1.0 = full down.
    pub left_y: f32,
    /// Right stick X. -1.0 = full left, 1.0 = full right.
    pub right_x: f32,
    /// Right stick Y. -1.0 = full up, 1.0 = full down.
    pub right_y: f32,
}

/// Identity of a connected gamepad device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamepadHandle {
    /// Human-readable device name reported by the host.
    pub name: String,
    /// Host-specific device path or identifier.
    pub path: String,
}

/// Gamepad liveness as observed by the session.
///
/// Updated only from gamepad connect/disconnect signals and poll failures;
/// read by the mode controller to gate entry into absolute mode and by the
/// presentation layer.
#[derive(Debug, Clone, Default)]
pub struct GamepadStatus {
    /// Whether a live device is currently available.
    pub connected: bool,
    /// The last-seen device, retained across disconnects for display.
    pub handle: Option<GamepadHandle>,
}

impl GamepadStatus {
    /// Records a newly connected device.
    pub fn attach(&mut self, handle: GamepadHandle) {
        debug!("Gamepad attached: {} ({})", handle.name, handle.path);
        self.connected = true;
        self.handle = Some(handle);
    }

    /// Records device loss. The last-seen handle is kept.
    pub fn detach(&mut self) {
        self.connected = false;
    }
}

/// Maps polled gamepad snapshots to the axis command.
///
/// Poll-driven rather than event-driven: the session polls the device each
/// tick while absolute mode is active, and this sampler converts whatever
/// snapshot came back. While inactive the sampler holds neutral and ignores
/// samples entirely.
#[derive(Debug)]
pub struct GamepadSampler {
    deadzone: f32,
    axes: AxisVector,
    active: bool,
}

impl GamepadSampler {
    /// Creates a sampler with the given deadzone radius (0.0 to 0.25).
    #[must_use]
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 0.25),
            axes: AxisVector::neutral(),
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
        self.axes = AxisVector::neutral();
        self.active = true;
    }

    /// Deactivates the sampler and drops the last sampled command.
    pub fn deactivate(&mut self) {
        self.axes = AxisVector::neutral();
        self.active = false;
    }

    /// Converts one polled snapshot into the axis command for this tick.
    ///
    /// Applies deadzone suppression per axis and inverts the hardware Y
    /// convention. Returns neutral while inactive.
    pub fn sample(&mut self, snapshot: &GamepadSnapshot) -> AxisVector {
        if !self.active {
            return AxisVector::neutral();
        }

        self.axes = AxisVector::new(
            axis::apply_deadzone(snapshot.right_x, self.deadzone),
            axis::apply_deadzone(-snapshot.right_y, self.deadzone),
            axis::apply_deadzone(snapshot.left_x, self.deadzone),
            axis::apply_deadzone(-snapshot.left_y, self.deadzone),
        );

        self.axes
    }

    /// Last sampled command, without consuming a new snapshot.
    #[must_use]
    pub fn axes(&self) -> AxisVector {
        self.axes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_sampler() -> GamepadSampler {
        let mut sampler = GamepadSampler::new(0.08);
        sampler.activate();
        sampler
    }

    #[test]
    fn test_inactive_sampler_ignores_snapshots() {
        let mut sampler = GamepadSampler::new(0.08);
        let snapshot = GamepadSnapshot { right_x: 1.0, ..Default::default() };
        let axes = sampler.sample(&snapshot);
        assert!(axes.is_neutral());
        assert!(sampler.axes().is_neutral());
    }

    #[test]
    fn test_centered_sticks_are_neutral() {
        let mut sampler = active_sampler();
        let axes = sampler.sample(&GamepadSnapshot::default());
        assert!(axes.is_neutral());
    }

    #[test]
    fn test_stick_mapping() {
        let mut sampler = GamepadSampler::new(0.0);
        sampler.activate();

        let snapshot = GamepadSnapshot {
            left_x: 0.5,
            left_y: -1.0,
            right_x: -0.5,
            right_y: 1.0,
        };
        let axes = sampler.sample(&snapshot);

        assert!((axes.yaw - 0.5).abs() < 1e-6);
        assert!((axes.throttle - 1.0).abs() < 1e-6, "stick up is full climb");
        assert!((axes.roll + 0.5).abs() < 1e-6);
        assert!((axes.pitch + 1.0).abs() < 1e-6, "stick down is full back");
    }

    #[test]
    fn test_deadzone_forces_exact_zero() {
        let mut sampler = active_sampler();
        let snapshot = GamepadSnapshot {
            left_x: 0.05,
            left_y: -0.07,
            right_x: -0.03,
            right_y: 0.08,
        };
        let axes = sampler.sample(&snapshot);
        assert!(axes.is_neutral(), "all magnitudes below the radius map to 0");
    }

    #[test]
    fn test_full_deflection_survives_deadzone() {
        let mut sampler = active_sampler();
        let snapshot = GamepadSnapshot {
            left_x: 1.0,
            left_y: -1.0,
            right_x: 1.0,
            right_y: -1.0,
        };
        let axes = sampler.sample(&snapshot);
        assert!((axes.roll - 1.0).abs() < 1e-6);
        assert!((axes.pitch - 1.0).abs() < 1e-6);
        assert!((axes.yaw - 1.0).abs() < 1e-6);
        assert!((axes.throttle - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_snapshot_defaults_to_neutral() {
        let mut sampler = active_sampler();
        let snapshot = GamepadSnapshot {
            left_x: f32::NAN,
            left_y: f32::INFINITY,
            right_x: f32::NEG_INFINITY,
            right_y: f32::NAN,
        };
        let axes = sampler.sample(&snapshot);
        assert!(axes.is_neutral());
    }

    #[test]
    fn test_deactivate_resets_axes() {
        let mut sampler = active_sampler();
        sampler.sample(&GamepadSnapshot { right_x: 1.0, ..Default::default() });
        assert!(!sampler.axes().is_neutral());

        sampler.deactivate();
        assert!(sampler.axes().is_neutral());
    }

    #[test]
    fn test_status_attach_detach() {
        let mut status = GamepadStatus::default();
        assert!(!status.connected);

        status.attach(GamepadHandle {
            name: "Wireless Controller".to_string(),
            path: "/dev/input/event7".to_string(),
        });
        assert!(status.connected);

        status.detach();
        assert!(!status.connected);
        // Last-seen handle survives for presentation
        assert!(status.handle.is_some());
    }
}
