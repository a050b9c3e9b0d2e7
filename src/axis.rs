//! # Axis Mapper Module
//!
//! Normalized control-axis math shared by every input modality.
//!
//! All vehicle control flows through an [`AxisVector`]: four scalar axes
//! (roll, pitch, yaw, throttle), each in the range -1.0 to 1.0. The samplers
//! produce raw per-modality values; the functions here enforce the output
//! contract:
//!
//! - every component is clamped to [-1.0, 1.0]
//! - non-finite inputs (NaN, infinities) map to 0.0 and are never propagated
//! - gamepad values inside the deadzone radius are forced to exactly 0.0
//! - headless (pilot-relative) framing rotates roll/pitch by the negative of
//!   the vehicle heading
//!
//! ## Usage
//!
//! ```
//! use teleop_link::axis::{AxisVector, apply_deadzone};
//!
//! let v = AxisVector::new(1.7, f32::NAN, -0.25, 0.5);
//! assert_eq!(v.roll, 1.0);   // clamped
//! assert_eq!(v.pitch, 0.0);  // NaN defaulted
//!
//! assert_eq!(apply_deadzone(0.03, 0.05), 0.0);
//! ```

/// Normalized 4-axis control command.
///
/// Produced fresh on every sampling tick and consumed immediately by the
/// transport and the presentation layer. Construction through [`AxisVector::new`]
/// guarantees every component is finite and within [-1.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisVector {
    /// Lateral axis. -1.0 = full left, 1.0 = full right.
    pub roll: f32,
    /// Longitudinal axis. -1.0 = full back, 1.0 = full forward.
    pub pitch: f32,
    /// Rotational axis. -1.0 = full counter-clockwise, 1.0 = full clockwise.
    pub yaw: f32,
    /// Vertical axis. -1.0 = full descent, 1.0 = full climb.
    pub throttle: f32,
}

impl AxisVector {
    /// Creates a vector with every component sanitized and clamped.
    ///
    /// Non-finite inputs become 0.0; finite inputs are clamped to [-1.0, 1.0].
    ///
    /// # Examples
    ///
    /// ```
    /// use teleop_link::axis::AxisVector;
    ///
    /// let v = AxisVector::new(0.5, -3.0, f32::INFINITY, -0.1);
    /// assert_eq!(v.pitch, -1.0);
    /// assert_eq!(v.yaw, 0.0);
    /// ```
    #[must_use]
    pub fn new(roll: f32, pitch: f32, yaw: f32, throttle: f32) -> Self {
        Self {
            roll: sanitize(roll),
            pitch: sanitize(pitch),
            yaw: sanitize(yaw),
            throttle: sanitize(throttle),
        }
    }

    /// The neutral command: all axes at 0.0.
    #[must_use]
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Returns true if every axis is exactly 0.0.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.roll == 0.0 && self.pitch == 0.0 && self.yaw == 0.0 && self.throttle == 0.0
    }

    /// Re-sanitizes all components, returning a vector that satisfies the
    /// output contract even if fields were mutated directly.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self::new(self.roll, self.pitch, self.yaw, self.throttle)
    }
}

/// Maps a raw axis value onto the normalized range.
///
/// Non-finite values become 0.0, everything else is clamped to [-1.0, 1.0].
#[inline]
#[must_use]
pub fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Applies deadzone suppression to a normalized stick value.
///
/// Values whose magnitude is at or below `radius` are forced to exactly 0.0
/// to suppress sensor noise at rest; values outside are rescaled so the
/// remaining travel still reaches full deflection.
///
/// # Arguments
///
/// * `value` - Normalized stick value (-1.0 to 1.0)
/// * `radius` - Deadzone radius (0.0 to 0.25). Out-of-range radii are clamped.
///
/// # Examples
///
/// ```
/// use teleop_link::axis::apply_deadzone;
///
/// assert_eq!(apply_deadzone(0.04, 0.05), 0.0);
/// assert_eq!(apply_deadzone(-0.05, 0.05), 0.0);
/// assert!((apply_deadzone(1.0, 0.05) - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn apply_deadzone(value: f32, radius: f32) -> f32 {
    let value = sanitize(value);
    let radius = radius.clamp(0.0, 0.25);

    let magnitude = value.abs();
    if magnitude <= radius {
        return 0.0;
    }

    // Rescale the live range so full deflection is preserved
    let scaled = (magnitude - radius) / (1.0 - radius);
    value.signum() * scaled
}

/// Applies the control framing selected by the headless flag.
///
/// When `headless` is set, roll/pitch are rotated by the negative of the
/// vehicle's last reported heading so the stick frame follows the pilot
/// rather than the airframe. When unset, the vector passes through unchanged
/// (vehicle-relative framing). Yaw and throttle are frame-independent.
///
/// A heading of 0.0 is the identity in both framings.
///
/// # Arguments
///
/// * `raw` - Vehicle-frame axis command
/// * `headless` - Whether pilot-relative framing is active
/// * `heading_deg` - Vehicle heading in degrees, clockwise-positive
///
/// # Examples
///
/// ```
/// use teleop_link::axis::{AxisVector, apply_frame};
///
/// let raw = AxisVector::new(0.4, 0.8, 0.0, 0.0);
///
/// // Vehicle-relative framing is the identity
/// assert_eq!(apply_frame(raw, false, 270.0), raw);
///
/// // At heading 90 the pilot's "forward" becomes the vehicle's "left"
/// let framed = apply_frame(raw, true, 90.0);
/// assert!((framed.roll - 0.8).abs() < 1e-6);
/// assert!((framed.pitch - (-0.4)).abs() < 1e-6);
/// ```
#[must_use]
pub fn apply_frame(raw: AxisVector, headless: bool, heading_deg: f32) -> AxisVector {
    if !headless {
        return raw;
    }

    let theta = -sanitize_heading(heading_deg).to_radians();
    let (sin, cos) = theta.sin_cos();

    let roll = raw.roll * cos - raw.pitch * sin;
    let pitch = raw.roll * sin + raw.pitch * cos;

    AxisVector::new(roll, pitch, raw.yaw, raw.throttle)
}

/// Clamps a heading to a finite value; non-finite telemetry defaults to 0.0.
#[inline]
fn sanitize_heading(heading_deg: f32) -> f32 {
    if heading_deg.is_finite() {
        heading_deg
    } else {
        0.0
    }
}

/// Moves a value toward 0.0 by at most `rate`, without overshooting.
///
/// Used by the keyboard sampler to decay released axes back to neutral. The
/// result never crosses zero: once an axis reaches neutral it stays there
/// until new input arrives.
///
/// # Examples
///
/// ```
/// use teleop_link::axis::decay_toward_neutral;
///
/// assert_eq!(decay_toward_neutral(0.5, 0.1), 0.4);
/// assert_eq!(decay_toward_neutral(-0.05, 0.1), 0.0);
/// assert_eq!(decay_toward_neutral(0.0, 0.1), 0.0);
/// ```
#[must_use]
pub fn decay_toward_neutral(value: f32, rate: f32) -> f32 {
    let value = sanitize(value);
    let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };

    if value.abs() <= rate {
        0.0
    } else {
        value - value.signum() * rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Sanitize Tests ====================

    #[test]
    fn test_sanitize_passes_normal_values() {
        assert_eq!(sanitize(0.5), 0.5);
        assert_eq!(sanitize(-0.5), -0.5);
        assert_eq!(sanitize(0.0), 0.0);
    }

    #[test]
    fn test_sanitize_clamps_out_of_range() {
        assert_eq!(sanitize(1.5), 1.0);
        assert_eq!(sanitize(-2.0), -1.0);
    }

    #[test]
    fn test_sanitize_defaults_non_finite_to_zero() {
        assert_eq!(sanitize(f32::NAN), 0.0);
        assert_eq!(sanitize(f32::INFINITY), 0.0);
        assert_eq!(sanitize(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_new_sanitizes_all_components() {
        let v = AxisVector::new(2.0, f32::NAN, -1.5, f32::NEG_INFINITY);
        assert_eq!(v.roll, 1.0);
        assert_eq!(v.pitch, 0.0);
        assert_eq!(v.yaw, -1.0);
        assert_eq!(v.throttle, 0.0);
    }

    #[test]
    fn test_neutral_vector() {
        let v = AxisVector::neutral();
        assert!(v.is_neutral());
        assert_eq!(v, AxisVector::default());
    }

    #[test]
    fn test_is_neutral_detects_deflection() {
        let mut v = AxisVector::neutral();
        v.throttle = 0.01;
        assert!(!v.is_neutral());
    }

    // ==================== Deadzone Tests ====================

    #[test]
    fn test_deadzone_forces_exact_zero_inside_radius() {
        // Every magnitude below the radius must map to exactly 0.0
        for value in [0.0, 0.01, 0.04, -0.01, -0.049, 0.05, -0.05] {
            assert_eq!(apply_deadzone(value, 0.05), 0.0, "value {value}");
        }
    }

    #[test]
    fn test_deadzone_preserves_full_deflection() {
        assert!((apply_deadzone(1.0, 0.05) - 1.0).abs() < 1e-6);
        assert!((apply_deadzone(-1.0, 0.05) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_deadzone_rescales_live_range() {
        // Just past the radius the output is barely above zero
        let out = apply_deadzone(0.06, 0.05);
        assert!(out > 0.0 && out < 0.02, "got {out}");
    }

    #[test]
    fn test_deadzone_zero_radius_is_identity() {
        assert_eq!(apply_deadzone(0.3, 0.0), 0.3);
    }

    #[test]
    fn test_deadzone_clamps_radius() {
        // Radius above 0.25 is clamped, so 0.3 stays outside the zone
        assert!(apply_deadzone(0.3, 0.9) > 0.0);
    }

    #[test]
    fn test_deadzone_non_finite_input_is_zero() {
        assert_eq!(apply_deadzone(f32::NAN, 0.05), 0.0);
    }

    // ==================== Framing Tests ====================

    #[test]
    fn test_frame_vehicle_relative_is_identity() {
        let raw = AxisVector::new(0.3, -0.7, 0.2, 0.9);
        assert_eq!(apply_frame(raw, false, 123.0), raw);
    }

    #[test]
    fn test_frame_headless_heading_zero_is_identity() {
        let raw = AxisVector::new(0.3, -0.7, 0.2, 0.9);
        let framed = apply_frame(raw, true, 0.0);
        assert!((framed.roll - raw.roll).abs() < 1e-6);
        assert!((framed.pitch - raw.pitch).abs() < 1e-6);
    }

    #[test]
    fn test_frame_headless_rotates_at_ninety_degrees() {
        let raw = AxisVector::new(0.4, 0.8, 0.1, -0.2);
        let framed = apply_frame(raw, true, 90.0);

        // Rotation by -90: roll' = pitch, pitch' = -roll
        assert!((framed.roll - 0.8).abs() < 1e-6);
        assert!((framed.pitch + 0.4).abs() < 1e-6);

        // Yaw and throttle are untouched
        assert_eq!(framed.yaw, raw.yaw);
        assert_eq!(framed.throttle, raw.throttle);
    }

    #[test]
    fn test_frame_headless_full_turn_is_identity() {
        let raw = AxisVector::new(0.4, 0.8, 0.0, 0.0);
        let framed = apply_frame(raw, true, 360.0);
        assert!((framed.roll - raw.roll).abs() < 1e-5);
        assert!((framed.pitch - raw.pitch).abs() < 1e-5);
    }

    #[test]
    fn test_frame_headless_non_finite_heading_is_identity() {
        let raw = AxisVector::new(0.4, 0.8, 0.0, 0.0);
        let framed = apply_frame(raw, true, f32::NAN);
        assert!((framed.roll - raw.roll).abs() < 1e-6);
        assert!((framed.pitch - raw.pitch).abs() < 1e-6);
    }

    #[test]
    fn test_frame_output_stays_clamped() {
        // A diagonal at full deflection rotates past 1.0 before clamping
        let raw = AxisVector::new(1.0, 1.0, 0.0, 0.0);
        let framed = apply_frame(raw, true, 45.0);
        assert!(framed.roll <= 1.0 && framed.roll >= -1.0);
        assert!(framed.pitch <= 1.0 && framed.pitch >= -1.0);
    }

    // ==================== Decay Tests ====================

    #[test]
    fn test_decay_steps_toward_zero() {
        assert!((decay_toward_neutral(0.5, 0.1) - 0.4).abs() < 1e-6);
        assert!((decay_toward_neutral(-0.5, 0.1) + 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_decay_never_overshoots() {
        assert_eq!(decay_toward_neutral(0.05, 0.1), 0.0);
        assert_eq!(decay_toward_neutral(-0.099, 0.1), 0.0);
    }

    #[test]
    fn test_decay_is_monotonic_to_zero() {
        let mut value: f32 = 1.0;
        let mut prev = value;
        for _ in 0..50 {
            value = decay_toward_neutral(value, 0.07);
            assert!(value.abs() <= prev.abs());
            assert!(value >= 0.0, "decay must not cross neutral");
            prev = value;
        }
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_decay_holds_at_neutral() {
        assert_eq!(decay_toward_neutral(0.0, 0.1), 0.0);
    }
}
