//! # Control Session Module
//!
//! Composition root of the teleoperation core.
//!
//! A [`ControlSession`] owns the mode controller, the three input samplers,
//! the command transport, and the telemetry view, and exposes the reactive
//! state and mutators the presentation layer consumes. It is an explicitly
//! owned object with defined construction and teardown; nothing here is
//! reachable through ambient global state.
//!
//! ## Scheduling
//!
//! All state lives on one logical thread. The driver (see `main.rs`) runs a
//! single `select!` loop over the sampling tick and the host-event channel;
//! each tick samples the active modality first and sends the result second,
//! so the transport can never observe a half-applied mode change from the
//! same tick.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::axis::{self, AxisVector};
use crate::config::Config;
use crate::error::Result;
use crate::host::{GamepadSource, PointerLockHost};
use crate::input::{
    GamepadSampler, GamepadStatus, HostEvent, KeyboardSampler, MouseSampler,
};
use crate::mode::{ControlMode, ModeChange, ModeController, RequestOutcome};
use crate::telemetry::VehicleTelemetry;
use crate::transport::link::LinkConnector;
use crate::transport::wire::DiscreteAction;
use crate::transport::{CommandTransport, ConnectionState};

/// Request signaled to the presentation layer.
///
/// The session never touches UI itself; it only asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Close any open settings surface (sent when relative mode commits).
    CloseSettings,
}

/// Snapshot of the state the presentation layer renders.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub axes: AxisVector,
    pub mode: ControlMode,
    pub gamepad_connected: bool,
    pub headless: bool,
    pub connection: ConnectionState,
}

/// Owns input fusion and command transport for one teleoperation session.
pub struct ControlSession<C: LinkConnector> {
    modes: ModeController,
    keyboard: KeyboardSampler,
    gamepad: GamepadSampler,
    mouse: MouseSampler,
    gamepad_status: GamepadStatus,
    gamepad_source: Box<dyn GamepadSource>,
    pointer_lock: Box<dyn PointerLockHost>,
    transport: CommandTransport<C>,
    telemetry: VehicleTelemetry,
    headless: bool,
    axes: AxisVector,
    lock_timeout: Duration,
    notices: Option<UnboundedSender<Notice>>,
}

impl<C: LinkConnector> ControlSession<C> {
    /// Assembles a session from its collaborators.
    ///
    /// The initial mode is Incremental with the keyboard sampler active;
    /// the transport starts disconnected until [`ControlSession::connect`].
    pub fn new(
        config: &Config,
        connector: C,
        pointer_lock: Box<dyn PointerLockHost>,
        gamepad_source: Box<dyn GamepadSource>,
    ) -> Self {
        let mut keyboard = KeyboardSampler::new(config.keyboard.step, config.keyboard.decay);
        keyboard.activate();

        Self {
            modes: ModeController::new(),
            keyboard,
            gamepad: GamepadSampler::new(config.gamepad.deadzone),
            mouse: MouseSampler::new(config.mouse.sensitivity),
            gamepad_status: GamepadStatus::default(),
            gamepad_source,
            pointer_lock,
            transport: CommandTransport::new(
                connector,
                Duration::from_millis(config.link.reconnect_base_ms),
                Duration::from_millis(config.link.reconnect_max_ms),
            ),
            telemetry: VehicleTelemetry::new(),
            headless: false,
            axes: AxisVector::neutral(),
            lock_timeout: Duration::from_millis(config.mouse.lock_timeout_ms),
            notices: None,
        }
    }

    /// Registers the channel presentation requests are signaled on.
    pub fn set_notice_sender(&mut self, sender: UnboundedSender<Notice>) {
        self.notices = Some(sender);
    }

    /// Opens the control link. Failure schedules reconnection internally.
    pub async fn connect(&mut self) -> Result<()> {
        self.transport.connect().await
    }

    /// Reactive state snapshot for the presentation layer.
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState {
            axes: self.axes,
            mode: self.modes.mode(),
            gamepad_connected: self.gamepad_status.connected,
            headless: self.headless,
            connection: self.transport.state(),
        }
    }

    /// Advances one scheduling tick: sample the active modality, frame the
    /// result, then send it. Returns the published axis command.
    pub async fn tick(&mut self) -> AxisVector {
        self.transport.maintain().await;

        let raw = match self.modes.mode() {
            ControlMode::Incremental => self.keyboard.tick(),
            ControlMode::Absolute => self.sample_gamepad(),
            ControlMode::Relative => self.mouse.tick(),
        };

        self.axes = axis::apply_frame(raw, self.headless, self.telemetry.heading_deg());

        let mode = self.modes.mode();
        self.transport.send_axes(self.axes, mode, self.headless).await;
        self.axes
    }

    /// Routes one host-environment signal.
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::KeyDown(key) => self.keyboard.key_down(key),
            HostEvent::KeyUp(key) => self.keyboard.key_up(key),
            HostEvent::Escape => {
                let change = self.modes.on_escape(self.pointer_lock.as_mut());
                self.apply_change(change);
            }
            HostEvent::GamepadConnected(handle) => self.gamepad_status.attach(handle),
            HostEvent::GamepadDisconnected => self.gamepad_lost(),
            HostEvent::PointerDelta { dx, dy } => self.mouse.push_delta(dx, dy),
            HostEvent::PointerLockLost => {
                let change = self.modes.on_lock_lost();
                self.apply_change(change);
            }
        }
    }

    /// Requests a mode change on behalf of the presentation layer.
    ///
    /// Sampler activation switches atomically with the committed transition;
    /// a rejection or no-op leaves every sampler untouched.
    pub async fn request_mode(&mut self, target: ControlMode) -> RequestOutcome {
        let outcome = self
            .modes
            .request(
                target,
                self.gamepad_status.connected,
                self.pointer_lock.as_mut(),
                self.lock_timeout,
            )
            .await;

        if let RequestOutcome::Committed(change) = outcome {
            self.apply_change(Some(change));
        }
        outcome
    }

    /// Toggles pilot-relative framing. Returns the new flag.
    pub fn toggle_headless(&mut self) -> bool {
        self.headless = !self.headless;
        info!(
            "Headless mode {}",
            if self.headless { "enabled" } else { "disabled" }
        );
        self.headless
    }

    /// Sends the takeoff action.
    ///
    /// # Errors
    ///
    /// Fails with `NotConnected` while the link is not open; the command is
    /// never queued for later.
    pub async fn request_takeoff(&mut self) -> Result<()> {
        self.transport.send_action(DiscreteAction::Takeoff).await
    }

    /// Sends the land action. Same delivery contract as takeoff.
    pub async fn request_land(&mut self) -> Result<()> {
        self.transport.send_action(DiscreteAction::Land).await
    }

    /// Selects a control profile on the backend.
    pub async fn set_profile(&mut self, name: impl Into<String>) -> Result<()> {
        self.transport
            .send_action(DiscreteAction::SetProfile(name.into()))
            .await
    }

    /// Feeds a vehicle heading report from the telemetry downlink.
    pub fn update_heading(&mut self, heading_deg: f32) {
        self.telemetry.update_heading(heading_deg);
    }

    /// Tears the session down: release the pointer lock, then close the
    /// connection, in that order.
    pub async fn shutdown(&mut self) {
        self.modes.release_lock(self.pointer_lock.as_mut());
        self.transport.close().await;
        info!("Control session shut down");
    }

    fn sample_gamepad(&mut self) -> AxisVector {
        match self.gamepad_source.poll() {
            Some(snapshot) => self.gamepad.sample(&snapshot),
            None => {
                // Device vanished between connect events; same forced exit
                // as an explicit disconnect signal
                warn!("Gamepad poll failed while absolute mode active");
                self.gamepad_lost();
                self.keyboard.tick()
            }
        }
    }

    fn gamepad_lost(&mut self) {
        self.gamepad_status.detach();
        let change = self.modes.on_gamepad_disconnected();
        self.apply_change(change);
    }

    fn apply_change(&mut self, change: Option<ModeChange>) {
        let Some(change) = change else { return };

        self.keyboard.deactivate();
        self.gamepad.deactivate();
        self.mouse.deactivate();

        match change.to {
            ControlMode::Incremental => self.keyboard.activate(),
            ControlMode::Absolute => self.gamepad.activate(),
            ControlMode::Relative => self.mouse.activate(),
        }

        self.axes = AxisVector::neutral();

        if change.close_settings {
            self.notify(Notice::CloseSettings);
        }
    }

    fn notify(&self, notice: Notice) {
        if let Some(sender) = &self.notices {
            if sender.send(notice).is_err() {
                debug!("Presentation notice channel closed");
            }
        }
    }
}
