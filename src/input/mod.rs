//! # Input Module
//!
//! Per-modality input sampling.
//!
//! This module handles:
//! - Keyboard increment/decay accumulation (incremental mode)
//! - Gamepad snapshot polling with deadzone suppression (absolute mode)
//! - Relative pointer delta accumulation (relative mode)
//!
//! Each sampler owns its accumulation state and is activated by the session
//! when its modality becomes the active control mode. An inactive sampler is
//! inert: its accumulators do not advance, so re-entering a mode can never
//! replay a stale burst of input.
//!
//! Raw host-environment signals reach the session as [`HostEvent`] values on
//! a channel and are routed to the active sampler from there.

pub mod gamepad;
pub mod keyboard;
pub mod mouse;

pub use gamepad::{GamepadHandle, GamepadSampler, GamepadSnapshot, GamepadStatus};
pub use keyboard::{ControlKey, KeyboardSampler};
pub use mouse::MouseSampler;

/// Host-environment input signal.
///
/// Produced by host adapters (terminal, gamepad monitor, a windowing shell)
/// and consumed by the session's single scheduling loop. Delivering these as
/// channel messages rather than callbacks keeps every state mutation on one
/// logical thread and preserves sample-before-send ordering within a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A mapped control key was pressed.
    KeyDown(ControlKey),
    /// A mapped control key was released.
    KeyUp(ControlKey),
    /// The escape signal. Forces an exit from relative mode; ignored otherwise.
    Escape,
    /// A gamepad became available.
    GamepadConnected(GamepadHandle),
    /// The gamepad went away.
    GamepadDisconnected,
    /// Relative pointer motion while the pointer lock is held.
    PointerDelta {
        /// Horizontal motion in host units, rightward-positive.
        dx: f32,
        /// Vertical motion in host units, downward-positive.
        dy: f32,
    },
    /// The host revoked the pointer lock (e.g. focus loss).
    PointerLockLost,
}
