//! # Keyboard Sampler Module
//!
//! Increment-mode input: a set of held control keys nudges the axes by a
//! fixed step each tick, and released axes decay linearly back to neutral.
//!
//! ## Key Assignments
//!
//! | Key pair | Axis | Direction |
//! |----------|------|-----------|
//! | RollLeft / RollRight | Roll | -1 / +1 |
//! | PitchBack / PitchForward | Pitch | -1 / +1 |
//! | YawLeft / YawRight | Yaw | -1 / +1 |
//! | ThrottleDown / ThrottleUp | Throttle | -1 / +1 |
//!
//! The decay is linear per tick rather than an instant snap-back so a brief
//! release between taps does not produce a hard discontinuity, and strictly
//! monotonic toward zero so a stuck axis cannot survive key release.
//!
//! ## Usage
//!
//! ```
//! use teleop_link::input::keyboard::{ControlKey, KeyboardSampler};
//!
//! let mut sampler = KeyboardSampler::new(0.1, 0.05);
//! sampler.activate();
//! sampler.key_down(ControlKey::PitchForward);
//!
//! let axes = sampler.tick();
//! assert!((axes.pitch - 0.1).abs() < 1e-6);
//! ```

use std::collections::HashSet;

use crate::axis::{self, AxisVector};

/// A control key recognized by the keyboard sampler.
///
/// Host adapters translate physical key codes into these; the sampler itself
/// is layout-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKey {
    RollLeft,
    RollRight,
    PitchForward,
    PitchBack,
    YawLeft,
    YawRight,
    ThrottleUp,
    ThrottleDown,
}

/// Accumulates held keys into an incremental axis command.
///
/// The sampler only advances while active. Activation and deactivation both
/// reset the held set and the accumulated axes to neutral, so no input state
/// leaks across mode changes.
#[derive(Debug)]
pub struct KeyboardSampler {
    held: HashSet<ControlKey>,
    axes: AxisVector,
    step: f32,
    decay: f32,
    active: bool,
}

impl KeyboardSampler {
    /// Creates a sampler with the given per-tick step and decay rates.
    ///
    /// # Arguments
    ///
    /// * `step` - Axis increment per tick while the key is held (0.0 to 1.0)
    /// * `decay` - Axis decrement per tick toward neutral once released
    #[must_use]
    pub fn new(step: f32, decay: f32) -> Self {
        Self {
            held: HashSet::new(),
            axes: AxisVector::neutral(),
            step: step.clamp(0.0, 1.0),
            decay: decay.clamp(0.0, 1.0),
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

    /// Deactivates the sampler and drops all accumulated state.
    pub fn deactivate(&mut self) {
        self.reset();
        self.active = false;
    }

    /// Records a key press. Ignored while inactive.
    pub fn key_down(&mut self, key: ControlKey) {
        if self.active {
            self.held.insert(key);
        }
    }

    /// Records a key release. Ignored while inactive.
    pub fn key_up(&mut self, key: ControlKey) {
        if self.active {
            self.held.remove(&key);
        }
    }

    /// Advances one sampling tick and returns the accumulated axis command.
    ///
    /// Axes with a held key move by `step` in the held direction; axes with
    /// no held key (or both directions held) decay toward neutral. Returns
    /// the neutral vector while inactive.
    pub fn tick(&mut self) -> AxisVector {
        if !self.active {
            return AxisVector::neutral();
        }

        self.axes = AxisVector::new(
            self.advance(self.axes.roll, ControlKey::RollRight, ControlKey::RollLeft),
            self.advance(self.axes.pitch, ControlKey::PitchForward, ControlKey::PitchBack),
            self.advance(self.axes.yaw, ControlKey::YawRight, ControlKey::YawLeft),
            self.advance(self.axes.throttle, ControlKey::ThrottleUp, ControlKey::ThrottleDown),
        );

        self.axes
    }

    /// Last accumulated command, without advancing the sampler.
    #[must_use]
    pub fn axes(&self) -> AxisVector {
        self.axes
    }

    fn advance(&self, current: f32, positive: ControlKey, negative: ControlKey) -> f32 {
        let pos = self.held.contains(&positive);
        let neg = self.held.contains(&negative);

        match (pos, neg) {
            (true, false) => current + self.step,
            (false, true) => current - self.step,
            // Opposed keys cancel out and the axis drifts back to neutral
            _ => axis::decay_toward_neutral(current, self.decay),
        }
    }

    fn reset(&mut self) {
        self.held.clear();
        self.axes = AxisVector::neutral();
    }
}
