//! # Telemetry Module
//!
//! Read-only vehicle telemetry consumed by the control core.
//!
//! The only signal the core needs is the vehicle's heading, used by the
//! axis mapper to rotate roll/pitch into the pilot's frame while headless
//! mode is active. It is fed from outside (vehicle downlink, simulator) and
//! never produced here.

use tracing::trace;

/// Latest vehicle telemetry relevant to input framing.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleTelemetry {
    heading_deg: f32,
}

impl VehicleTelemetry {
    /// Creates a telemetry view with heading 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a heading report in degrees, normalized to [0, 360).
    ///
    /// Non-finite reports are discarded; the last good heading stands.
    pub fn update_heading(&mut self, heading_deg: f32) {
        if !heading_deg.is_finite() {
            trace!("Discarding non-finite heading report");
            return;
        }
        self.heading_deg = heading_deg.rem_euclid(360.0);
    }

    /// Last known vehicle heading in degrees, clockwise from north.
    #[must_use]
    pub fn heading_deg(&self) -> f32 {
        self.heading_deg
    }
}
