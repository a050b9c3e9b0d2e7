//! # Command Transport Module
//!
//! Owns the persistent connection to the vehicle-control backend.
//!
//! This module handles:
//! - Opening the link with a bounded connect wait
//! - Serializing commands as newline-delimited JSON frames
//! - Dropping stale axis updates while the link is down
//! - Failing discrete actions fast while the link is down
//! - Bounded exponential-backoff reconnection
//!
//! ## Connection States
//!
//! Connecting -> Open (handshake success) -> Closed (clean shutdown) or
//! Reconnecting (unexpected drop) -> Connecting (retry) -> ...
//!
//! No command queue survives a reconnection. The vehicle is assumed to
//! revert to a safe hover/neutral state until fresh axis data arrives, so
//! replaying stale motion commands would be a hazard, not a feature.

pub mod link;
pub mod wire;

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::axis::AxisVector;
use crate::error::{Result, TeleopError};
use crate::mode::ControlMode;
use link::{CommandLink, LinkConnector};
use wire::{encode_frame, Command, DiscreteAction};

/// Lifecycle of the persistent backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// A connection attempt is in flight.
    Connecting,
    /// The link is live; commands flow.
    Open,
    /// Clean shutdown; no further attempts.
    Closed,
    /// The link dropped unexpectedly; a retry is scheduled.
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

/// Bounded exponential backoff schedule.
///
/// Delays double from `base` up to `max` and stay there; retries themselves
/// are unbounded (the client keeps trying until shutdown).
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    /// Creates a schedule doubling from `base` and capped at `max`.
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            attempt: 0,
        }
    }

    /// Returns the next delay and advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        // Cap the exponent so the shift can never overflow
        let exponent = self.attempt.min(16);
        let delay = self
            .base
            .saturating_mul(1u32 << exponent)
            .min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Resets the schedule after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of consecutive failures recorded so far.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

/// Transports commands over one persistent connection.
///
/// Continuous axis updates are latest-value-wins: while the link is not
/// open they are dropped, never queued, so stale motion commands cannot
/// pile up during an outage. Discrete actions instead fail fast with
/// [`TeleopError::NotConnected`] and are left to the caller to resubmit.
pub struct CommandTransport<C: LinkConnector> {
    connector: C,
    link: Option<C::Link>,
    state: ConnectionState,
    backoff: Backoff,
    retry_at: Option<Instant>,
}

impl<C: LinkConnector> CommandTransport<C> {
    /// Creates a transport over the given connector.
    ///
    /// # Arguments
    ///
    /// * `connector` - Link factory bound to the fixed endpoint
    /// * `reconnect_base` - First reconnect delay
    /// * `reconnect_max` - Backoff ceiling
    pub fn new(connector: C, reconnect_base: Duration, reconnect_max: Duration) -> Self {
        Self {
            connector,
            link: None,
            state: ConnectionState::Connecting,
            backoff: Backoff::new(reconnect_base, reconnect_max),
            retry_at: None,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Attempts the initial connection.
    ///
    /// On failure the transport schedules a backoff retry and keeps going;
    /// the error is returned for the caller's information only.
    pub async fn connect(&mut self) -> Result<()> {
        self.state = ConnectionState::Connecting;
        self.try_open().await
    }

    /// Drives reconnection. Call once per scheduling tick.
    ///
    /// A no-op unless the transport is Reconnecting and the scheduled retry
    /// time has arrived.
    pub async fn maintain(&mut self) {
        if self.state != ConnectionState::Reconnecting {
            return;
        }
        let due = self.retry_at.is_some_and(|at| Instant::now() >= at);
        if !due {
            return;
        }

        self.state = ConnectionState::Connecting;
        let _ = self.try_open().await;
    }

    /// Sends this tick's axis command if the link is open.
    ///
    /// Returns `true` if the frame went out. While the link is anything but
    /// Open the update is dropped (not queued) and `false` is returned;
    /// continuous state supersedes queued history.
    pub async fn send_axes(
        &mut self,
        vector: AxisVector,
        mode: ControlMode,
        headless: bool,
    ) -> bool {
        if self.state != ConnectionState::Open {
            return false;
        }

        let frame = match encode_frame(&Command::axes(vector, mode, headless)) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping unencodable axes frame: {}", e);
                return false;
            }
        };

        match self.write(&frame).await {
            Ok(()) => true,
            Err(e) => {
                self.disrupt(&e);
                false
            }
        }
    }

    /// Sends a discrete action, delivered once while Open.
    ///
    /// # Errors
    ///
    /// Returns [`TeleopError::NotConnected`] when the link is not open and
    /// [`TeleopError::Link`] when the write fails mid-flight. The action is
    /// not retried automatically in either case.
    pub async fn send_action(&mut self, action: DiscreteAction) -> Result<()> {
        if self.state != ConnectionState::Open {
            return Err(TeleopError::NotConnected);
        }

        let name = action.name();
        let frame = encode_frame(&action.into_command())?;

        match self.write(&frame).await {
            Ok(()) => {
                info!("Sent {} command", name);
                Ok(())
            }
            Err(e) => {
                self.disrupt(&e);
                Err(TeleopError::Link(format!("{} failed: {}", name, e)))
            }
        }
    }

    /// Cleanly closes the connection. No further retries are scheduled.
    pub async fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.shutdown().await {
                debug!("Link shutdown error: {}", e);
            }
        }
        self.retry_at = None;
        self.state = ConnectionState::Closed;
        info!("Control link closed");
    }

    async fn try_open(&mut self) -> Result<()> {
        match self.connector.connect().await {
            Ok(link) => {
                self.link = Some(link);
                self.state = ConnectionState::Open;
                self.backoff.reset();
                self.retry_at = None;
                info!("Control link open");
                Ok(())
            }
            Err(e) => {
                warn!("Connect failed: {}", e);
                self.schedule_retry();
                Err(TeleopError::Link(e.to_string()))
            }
        }
    }

    async fn write(&mut self, frame: &[u8]) -> std::io::Result<()> {
        match self.link.as_mut() {
            Some(link) => link.send_frame(frame).await,
            // Open without a link cannot happen; treat it as a drop
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "no live link",
            )),
        }
    }

    fn disrupt(&mut self, error: &std::io::Error) {
        warn!("Control link dropped: {}", error);
        self.link = None;
        self.schedule_retry();
    }

    fn schedule_retry(&mut self) {
        let delay = self.backoff.next_delay();
        self.retry_at = Some(Instant::now() + delay);
        self.state = ConnectionState::Reconnecting;
        debug!(
            "Reconnect attempt {} in {:?}",
            self.backoff.attempt(),
            delay
        );
    }
}
