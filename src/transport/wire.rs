//! # Wire Codec Module
//!
//! JSON command messages exchanged with the vehicle-control backend.
//!
//! Messages are discriminated by a `type` field and sent one per line over
//! the persistent link:
//!
//! | `type` | Payload | Cadence |
//! |--------|---------|---------|
//! | `axes` | roll, pitch, yaw, throttle, mode, headless | every tick while a continuous mode is active |
//! | `takeoff` | none | once per user action |
//! | `land` | none | once per user action |
//! | `set_profile` | name | once per user action |
//!
//! The `mode` and `headless` fields ride along with every axes message; the
//! backend selects its control strategy and framing from them.

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use crate::axis::AxisVector;
use crate::error::Result;
use crate::mode::ControlMode;

/// A command bound for the vehicle backend.
///
/// A closed set matched exhaustively at the transport boundary: either the
/// continuous axis stream or one of the discrete actions. Commands are
/// immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Axes {
        roll: f32,
        pitch: f32,
        yaw: f32,
        throttle: f32,
        mode: &'static str,
        headless: bool,
    },
    Takeoff,
    Land,
    SetProfile { name: String },
}

impl Command {
    /// Builds the continuous axes message for one tick.
    #[must_use]
    pub fn axes(vector: AxisVector, mode: ControlMode, headless: bool) -> Self {
        Command::Axes {
            roll: vector.roll,
            pitch: vector.pitch,
            yaw: vector.yaw,
            throttle: vector.throttle,
            mode: mode.wire_name(),
            headless,
        }
    }
}

/// A discrete, delivered-once user action.
///
/// Unlike the axes stream, these must never be silently dropped; the
/// transport fails them fast when the link is not open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscreteAction {
    Takeoff,
    Land,
    SetProfile(String),
}

impl DiscreteAction {
    /// Converts the action into its wire command.
    #[must_use]
    pub fn into_command(self) -> Command {
        match self {
            DiscreteAction::Takeoff => Command::Takeoff,
            DiscreteAction::Land => Command::Land,
            DiscreteAction::SetProfile(name) => Command::SetProfile { name },
        }
    }

    /// Short name for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DiscreteAction::Takeoff => "takeoff",
            DiscreteAction::Land => "land",
            DiscreteAction::SetProfile(_) => "set_profile",
        }
    }
}

/// Encodes a command as one newline-terminated JSON frame.
///
/// # Errors
///
/// Returns an encoding error if serialization fails (practically impossible
/// for this closed message set, but never unwrapped).
///
/// # Examples
///
/// ```
/// use teleop_link::transport::wire::{encode_frame, Command};
///
/// let frame = encode_frame(&Command::Takeoff)?;
/// assert_eq!(&frame[..], b"{\"type\":\"takeoff\"}\n");
/// # Ok::<(), teleop_link::error::TeleopError>(())
/// ```
pub fn encode_frame(command: &Command) -> Result<BytesMut> {
    let json = serde_json::to_vec(command)?;

    let mut frame = BytesMut::with_capacity(json.len() + 1);
    frame.put_slice(&json);
    frame.put_u8(b'\n');
    Ok(frame)
}
