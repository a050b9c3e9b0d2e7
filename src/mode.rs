//! # Mode Controller Module
//!
//! Finite-state machine over the three input modalities.
//!
//! ## States
//!
//! | Mode | Modality | Entry precondition |
//! |------|----------|--------------------|
//! | Incremental | Keyboard step/decay | none (initial state) |
//! | Absolute | Gamepad sticks | gamepad connected |
//! | Relative | Pointer lock ("TrackPoint") | lock acquired |
//!
//! ## Transitions
//!
//! Requestable: Incremental -> Absolute, Incremental -> Relative,
//! Absolute -> Relative. Signal-driven: Relative -> Incremental (escape or
//! lock loss), Absolute -> Incremental (gamepad disconnect). Any other
//! request is ignored and leaves the mode unchanged.
//!
//! Side effects (lock acquisition, lock release) complete before the state
//! change commits, so a sampler can never observe a mode whose prerequisites
//! do not hold: there is no state where the mode is Relative but the lock
//! is not held.

use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::host::PointerLockHost;

/// The active input modality. Exactly one at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Keyboard increment mode.
    #[default]
    Incremental,
    /// Gamepad absolute mode.
    Absolute,
    /// Relative mouse ("TrackPoint") mode.
    Relative,
}

impl ControlMode {
    /// Short name used on the wire and in logs.
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            ControlMode::Incremental => "inc",
            ControlMode::Absolute => "abs",
            ControlMode::Relative => "mouse",
        }
    }
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Why a mode request was rejected.
///
/// Rejections are recoverable: the mode is unchanged and the caller may
/// retry once the precondition holds. Presentation surfaces these as a
/// disabled option, not as a failure dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeRejection {
    /// Absolute mode requested with no gamepad connected.
    #[error("no gamepad connected")]
    GamepadUnavailable,
    /// The host denied the pointer-lock request.
    #[error("pointer lock denied by host")]
    LockDenied,
    /// The pointer-lock request did not resolve within the bounded wait.
    #[error("pointer lock request timed out")]
    LockTimeout,
}

/// A committed transition, as reported back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: ControlMode,
    pub to: ControlMode,
    /// Entering relative mode asks presentation to close any open settings
    /// surface; the request is signaled, not performed here.
    pub close_settings: bool,
}

/// Result of a mode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The transition committed; samplers must be switched accordingly.
    Committed(ModeChange),
    /// The request was a no-op (already active, or not a legal transition).
    Unchanged,
    /// A precondition failed; the mode is unchanged.
    Rejected(ModeRejection),
}

/// Owns the active [`ControlMode`] and enforces legal transitions.
///
/// The controller also tracks pointer-lock ownership so that forced exits
/// (escape, lock loss, shutdown) can release the lock exactly once.
#[derive(Debug)]
pub struct ModeController {
    mode: ControlMode,
    lock_held: bool,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    /// Creates a controller in the initial Incremental state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: ControlMode::Incremental,
            lock_held: false,
        }
    }

    /// The currently active mode.
    #[must_use]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Whether the pointer lock is currently held.
    #[must_use]
    pub fn lock_held(&self) -> bool {
        self.lock_held
    }

    /// Requests a transition to `target`.
    ///
    /// Preconditions are checked and side effects performed before the state
    /// change commits. Illegal transitions are no-ops; failed preconditions
    /// return a [`ModeRejection`] with the mode unchanged.
    ///
    /// # Arguments
    ///
    /// * `target` - Requested mode
    /// * `gamepad_connected` - Current gamepad liveness, gating Absolute
    /// * `lock` - Host pointer-lock facility, used when entering Relative
    /// * `lock_timeout` - Bounded wait for lock acquisition
    pub async fn request(
        &mut self,
        target: ControlMode,
        gamepad_connected: bool,
        lock: &mut dyn PointerLockHost,
        lock_timeout: Duration,
    ) -> RequestOutcome {
        if target == self.mode {
            return RequestOutcome::Unchanged;
        }

        match (self.mode, target) {
            (ControlMode::Incremental, ControlMode::Absolute) => {
                if !gamepad_connected {
                    info!("Absolute mode rejected: no gamepad connected");
                    return RequestOutcome::Rejected(ModeRejection::GamepadUnavailable);
                }
                self.commit(target, false)
            }
            (ControlMode::Incremental | ControlMode::Absolute, ControlMode::Relative) => {
                match timeout(lock_timeout, lock.acquire()).await {
                    Ok(Ok(())) => {
                        self.lock_held = true;
                        self.commit(target, true)
                    }
                    Ok(Err(e)) => {
                        warn!("Pointer lock denied: {}", e);
                        RequestOutcome::Rejected(ModeRejection::LockDenied)
                    }
                    Err(_) => {
                        warn!(
                            "Pointer lock request timed out after {:?}",
                            lock_timeout
                        );
                        RequestOutcome::Rejected(ModeRejection::LockTimeout)
                    }
                }
            }
            // Everything else (leaving Absolute or Relative by request,
            // Relative -> Absolute) is not a legal user transition
            _ => RequestOutcome::Unchanged,
        }
    }

    /// Handles the escape signal.
    ///
    /// Forces Relative -> Incremental, releasing the still-held lock. In any
    /// other mode the signal is ignored.
    pub fn on_escape(&mut self, lock: &mut dyn PointerLockHost) -> Option<ModeChange> {
        if self.mode != ControlMode::Relative {
            return None;
        }
        self.release_lock(lock);
        match self.commit(ControlMode::Incremental, false) {
            RequestOutcome::Committed(change) => Some(change),
            _ => None,
        }
    }

    /// Handles host-reported pointer-lock loss.
    ///
    /// The platform already revoked the lock, so nothing is released here;
    /// the mode falls back to Incremental if Relative was active.
    pub fn on_lock_lost(&mut self) -> Option<ModeChange> {
        self.lock_held = false;
        if self.mode != ControlMode::Relative {
            return None;
        }
        match self.commit(ControlMode::Incremental, false) {
            RequestOutcome::Committed(change) => Some(change),
            _ => None,
        }
    }

    /// Handles gamepad disconnection.
    ///
    /// Forces Absolute -> Incremental; ignored in other modes.
    pub fn on_gamepad_disconnected(&mut self) -> Option<ModeChange> {
        if self.mode != ControlMode::Absolute {
            return None;
        }
        match self.commit(ControlMode::Incremental, false) {
            RequestOutcome::Committed(change) => Some(change),
            _ => None,
        }
    }

    /// Releases the pointer lock if held. Used by the forced-exit paths and
    /// by session shutdown.
    pub fn release_lock(&mut self, lock: &mut dyn PointerLockHost) {
        if self.lock_held {
            lock.release();
            self.lock_held = false;
        }
    }

    fn commit(&mut self, to: ControlMode, close_settings: bool) -> RequestOutcome {
        let from = self.mode;
        self.mode = to;
        info!("Control mode: {} -> {}", from, to);
        RequestOutcome::Committed(ModeChange { from, to, close_settings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mocks::ScriptedPointerLock;

    const LOCK_TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn test_initial_state_is_incremental() {
        let modes = ModeController::new();
        assert_eq!(modes.mode(), ControlMode::Incremental);
        assert!(!modes.lock_held());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ControlMode::Incremental.wire_name(), "inc");
        assert_eq!(ControlMode::Absolute.wire_name(), "abs");
        assert_eq!(ControlMode::Relative.wire_name(), "mouse");
    }

    #[tokio::test]
    async fn test_absolute_requires_gamepad() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        let outcome = modes
            .request(ControlMode::Absolute, false, &mut lock, LOCK_TIMEOUT)
            .await;

        assert_eq!(
            outcome,
            RequestOutcome::Rejected(ModeRejection::GamepadUnavailable)
        );
        assert_eq!(modes.mode(), ControlMode::Incremental);
    }

    #[tokio::test]
    async fn test_absolute_commits_with_gamepad() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        let outcome = modes
            .request(ControlMode::Absolute, true, &mut lock, LOCK_TIMEOUT)
            .await;

        assert_eq!(
            outcome,
            RequestOutcome::Committed(ModeChange {
                from: ControlMode::Incremental,
                to: ControlMode::Absolute,
                close_settings: false,
            })
        );
        assert_eq!(modes.mode(), ControlMode::Absolute);
    }

    #[tokio::test]
    async fn test_relative_acquires_lock() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        let outcome = modes
            .request(ControlMode::Relative, false, &mut lock, LOCK_TIMEOUT)
            .await;

        match outcome {
            RequestOutcome::Committed(change) => {
                assert_eq!(change.to, ControlMode::Relative);
                assert!(change.close_settings, "entering relative closes settings");
            }
            other => panic!("expected commit, got {:?}", other),
        }
        assert!(modes.lock_held());
        assert!(lock.is_held());
    }

    #[tokio::test]
    async fn test_relative_from_absolute_is_legal() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        modes.request(ControlMode::Absolute, true, &mut lock, LOCK_TIMEOUT).await;
        let outcome = modes
            .request(ControlMode::Relative, true, &mut lock, LOCK_TIMEOUT)
            .await;

        assert!(matches!(outcome, RequestOutcome::Committed(_)));
        assert_eq!(modes.mode(), ControlMode::Relative);
    }

    #[tokio::test]
    async fn test_lock_denial_leaves_mode_unchanged() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();
        lock.deny_next();

        let outcome = modes
            .request(ControlMode::Relative, false, &mut lock, LOCK_TIMEOUT)
            .await;

        assert_eq!(outcome, RequestOutcome::Rejected(ModeRejection::LockDenied));
        assert_eq!(modes.mode(), ControlMode::Incremental);
        assert!(!modes.lock_held());
        assert!(!lock.is_held(), "no dangling lock after denial");
    }

    #[tokio::test]
    async fn test_lock_timeout_leaves_mode_unchanged() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();
        lock.hang_next();

        let outcome = modes
            .request(
                ControlMode::Relative,
                false,
                &mut lock,
                Duration::from_millis(10),
            )
            .await;

        assert_eq!(outcome, RequestOutcome::Rejected(ModeRejection::LockTimeout));
        assert_eq!(modes.mode(), ControlMode::Incremental);
        assert!(!modes.lock_held());
    }

    #[tokio::test]
    async fn test_same_mode_request_is_noop() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        let outcome = modes
            .request(ControlMode::Incremental, false, &mut lock, LOCK_TIMEOUT)
            .await;
        assert_eq!(outcome, RequestOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_leaving_absolute_by_request_is_noop() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        modes.request(ControlMode::Absolute, true, &mut lock, LOCK_TIMEOUT).await;
        let outcome = modes
            .request(ControlMode::Incremental, true, &mut lock, LOCK_TIMEOUT)
            .await;

        assert_eq!(outcome, RequestOutcome::Unchanged);
        assert_eq!(modes.mode(), ControlMode::Absolute);
    }

    #[tokio::test]
    async fn test_relative_to_absolute_is_noop() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        modes.request(ControlMode::Relative, false, &mut lock, LOCK_TIMEOUT).await;
        let outcome = modes
            .request(ControlMode::Absolute, true, &mut lock, LOCK_TIMEOUT)
            .await;

        assert_eq!(outcome, RequestOutcome::Unchanged);
        assert_eq!(modes.mode(), ControlMode::Relative);
        assert!(modes.lock_held());
    }

    #[tokio::test]
    async fn test_escape_exits_relative_and_releases_lock() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        modes.request(ControlMode::Relative, false, &mut lock, LOCK_TIMEOUT).await;
        assert!(lock.is_held());

        let change = modes.on_escape(&mut lock).expect("escape forces exit");
        assert_eq!(change.from, ControlMode::Relative);
        assert_eq!(change.to, ControlMode::Incremental);
        assert_eq!(modes.mode(), ControlMode::Incremental);
        assert!(!modes.lock_held());
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_escape_outside_relative_is_ignored() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        assert!(modes.on_escape(&mut lock).is_none());
        assert_eq!(*lock.release_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lock_loss_exits_relative() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        modes.request(ControlMode::Relative, false, &mut lock, LOCK_TIMEOUT).await;

        let change = modes.on_lock_lost().expect("lock loss forces exit");
        assert_eq!(change.to, ControlMode::Incremental);
        assert!(!modes.lock_held());
    }

    #[tokio::test]
    async fn test_gamepad_disconnect_exits_absolute() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        modes.request(ControlMode::Absolute, true, &mut lock, LOCK_TIMEOUT).await;

        let change = modes
            .on_gamepad_disconnected()
            .expect("disconnect forces exit");
        assert_eq!(change.from, ControlMode::Absolute);
        assert_eq!(change.to, ControlMode::Incremental);
    }

    #[test]
    fn test_gamepad_disconnect_outside_absolute_is_ignored() {
        let mut modes = ModeController::new();
        assert!(modes.on_gamepad_disconnected().is_none());
    }

    #[tokio::test]
    async fn test_release_lock_is_idempotent() {
        let mut modes = ModeController::new();
        let mut lock = ScriptedPointerLock::new();

        modes.request(ControlMode::Relative, false, &mut lock, LOCK_TIMEOUT).await;
        modes.release_lock(&mut lock);
        modes.release_lock(&mut lock);

        assert_eq!(*lock.release_calls.lock().unwrap(), 1);
    }
}
