//! # Host Environment Module
//!
//! Trait seams for the host-environment facilities the core consumes, plus
//! the concrete adapters used by the shipped binary.
//!
//! The session and mode controller only ever see these traits; swapping a
//! terminal for a windowing shell (or a test mock) touches nothing in the
//! core. Adapters:
//! - [`term`]: raw-mode terminal input and mouse-capture pointer lock
//! - [`gamepad_dev`]: evdev gamepad discovery and snapshot polling

pub mod gamepad_dev;
pub mod term;

use async_trait::async_trait;

use crate::input::GamepadSnapshot;

/// Pointer-lock facility provided by the host environment.
///
/// Acquisition may be denied by the platform; callers bound the wait with a
/// timeout. Release must be safe to call when the lock is not held.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointerLockHost: Send {
    /// Requests the pointer lock, resolving once it is held.
    async fn acquire(&mut self) -> std::io::Result<()>;

    /// Releases the pointer lock if held.
    fn release(&mut self);
}

/// Pollable gamepad snapshot source.
///
/// Hardware exposes only a point-in-time snapshot, so the gamepad sampler is
/// poll-driven: the session calls [`GamepadSource::poll`] once per tick while
/// absolute mode is active. `None` means the device is gone.
#[cfg_attr(test, mockall::automock)]
pub trait GamepadSource: Send {
    /// Returns the current stick snapshot, or `None` if no device is live.
    fn poll(&mut self) -> Option<GamepadSnapshot>;
}
