//! # Terminal Host Adapter
//!
//! Raw-mode terminal input for the shipped client binary.
//!
//! A dedicated reader thread translates terminal events into the commands
//! the session loop consumes. Everything stateful still happens on the
//! session's single scheduling thread; this thread only produces channel
//! messages.
//!
//! ## Key Map
//!
//! | Key | Action |
//! |-----|--------|
//! | W / S | Pitch forward / back |
//! | A / D | Roll left / right |
//! | Left / Right | Yaw left / right |
//! | Up / Down | Throttle up / down |
//! | T / L | Takeoff / land |
//! | G | Request absolute (gamepad) mode |
//! | M | Request relative (TrackPoint) mode |
//! | H | Toggle headless framing |
//! | Esc | Escape signal (exits relative mode) |
//! | Q / Ctrl-C | Quit |
//!
//! ## Key release
//!
//! Terminals speaking the keyboard-enhancement protocol report real release
//! events; elsewhere a held key only autorepeats. The reader papers over
//! the difference by synthesizing a release once a key has not repeated for
//! [`SYNTHETIC_RELEASE_MS`], so an axis can never stay latched after the
//! operator lets go.
//!
//! ## Pointer lock
//!
//! Terminal mouse capture stands in for the platform pointer-lock facility:
//! acquiring the lock enables capture and motion events become relative
//! deltas against the previous cursor cell.

use std::collections::HashMap;
use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    MouseEvent, MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::{Result, TeleopError};
use crate::host::PointerLockHost;
use crate::input::{ControlKey, HostEvent};
use crate::mode::ControlMode;

/// How long a key without release reporting stays held after its last
/// press/repeat. Longer than the typical autorepeat initial delay so a held
/// key does not flap.
const SYNTHETIC_RELEASE_MS: u64 = 600;

/// Poll granularity of the reader thread.
const POLL_INTERVAL_MS: u64 = 25;

/// A command produced by the terminal, consumed by the binary's main loop.
///
/// Raw input signals pass through as [`HostEvent`]s; the rest are the
/// presentation-level mutators this minimal front end exposes.
#[derive(Debug, Clone, PartialEq)]
pub enum TermCommand {
    Input(HostEvent),
    RequestMode(ControlMode),
    ToggleHeadless,
    Takeoff,
    Land,
    Quit,
}

/// Owns the terminal raw mode and the input reader thread.
pub struct TerminalHost {
    stop: Arc<AtomicBool>,
    reader: Option<thread::JoinHandle<()>>,
    enhanced: bool,
}

impl TerminalHost {
    /// Puts the terminal into raw mode and starts the reader thread.
    ///
    /// # Errors
    ///
    /// Returns a host error if raw mode cannot be enabled.
    pub fn init(tx: UnboundedSender<TermCommand>) -> Result<Self> {
        enable_raw_mode().map_err(|e| TeleopError::Host(format!("raw mode: {}", e)))?;

        let enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            if let Err(e) = execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            ) {
                warn!("Keyboard enhancement unavailable: {}", e);
            } else {
                info!("Key release reporting enabled");
            }
        } else {
            info!(
                "No key release reporting; synthesizing releases after {}ms",
                SYNTHETIC_RELEASE_MS
            );
        }

        let stop = Arc::new(AtomicBool::new(false));
        let reader = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("term-input".to_string())
                .spawn(move || read_loop(&tx, &stop, enhanced))
                .map_err(|e| TeleopError::Host(format!("input thread: {}", e)))?
        };

        Ok(Self {
            stop,
            reader: Some(reader),
            enhanced,
        })
    }

    /// Restores the terminal. Safe to call once at shutdown.
    pub fn restore(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        if self.enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout(), DisableMouseCapture);
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to leave raw mode: {}", e);
        }
    }
}

fn read_loop(tx: &UnboundedSender<TermCommand>, stop: &AtomicBool, enhanced: bool) {
    let mut held: HashMap<ControlKey, Instant> = HashMap::new();
    let mut last_pointer: Option<(u16, u16)> = None;

    while !stop.load(Ordering::Relaxed) {
        // Synthesize releases for terminals without release reporting
        if !enhanced {
            let now = Instant::now();
            let expired: Vec<ControlKey> = held
                .iter()
                .filter(|(_, deadline)| now >= **deadline)
                .map(|(key, _)| *key)
                .collect();
            for key in expired {
                held.remove(&key);
                if tx.send(TermCommand::Input(HostEvent::KeyUp(key))).is_err() {
                    return;
                }
            }
        }

        match event::poll(Duration::from_millis(POLL_INTERVAL_MS)) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                debug!("Terminal poll error: {}", e);
                return;
            }
        }

        let event = match event::read() {
            Ok(event) => event,
            Err(e) => {
                debug!("Terminal read error: {}", e);
                return;
            }
        };

        let commands = match event {
            Event::Key(key) => translate_key(key, enhanced, &mut held),
            Event::Mouse(mouse) => translate_mouse(mouse, &mut last_pointer),
            _ => Vec::new(),
        };

        for command in commands {
            if tx.send(command).is_err() {
                return;
            }
        }
    }
}

fn translate_key(
    key: KeyEvent,
    enhanced: bool,
    held: &mut HashMap<ControlKey, Instant>,
) -> Vec<TermCommand> {
    // Ctrl-C always quits, raw mode has no signal handling
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![TermCommand::Quit];
    }

    if let Some(control) = control_key(key.code) {
        return translate_control_key(control, key.kind, enhanced, held);
    }

    if key.kind != KeyEventKind::Press {
        return Vec::new();
    }

    match key.code {
        KeyCode::Esc => vec![TermCommand::Input(HostEvent::Escape)],
        KeyCode::Char('t') => vec![TermCommand::Takeoff],
        KeyCode::Char('l') => vec![TermCommand::Land],
        KeyCode::Char('g') => vec![TermCommand::RequestMode(ControlMode::Absolute)],
        KeyCode::Char('m') => vec![TermCommand::RequestMode(ControlMode::Relative)],
        KeyCode::Char('h') => vec![TermCommand::ToggleHeadless],
        KeyCode::Char('q') => vec![TermCommand::Quit],
        _ => Vec::new(),
    }
}

fn translate_control_key(
    control: ControlKey,
    kind: KeyEventKind,
    enhanced: bool,
    held: &mut HashMap<ControlKey, Instant>,
) -> Vec<TermCommand> {
    if enhanced {
        return match kind {
            KeyEventKind::Press => vec![TermCommand::Input(HostEvent::KeyDown(control))],
            KeyEventKind::Release => vec![TermCommand::Input(HostEvent::KeyUp(control))],
            KeyEventKind::Repeat => Vec::new(),
        };
    }

    // Press and autorepeat both refresh the synthetic-release deadline
    let deadline = Instant::now() + Duration::from_millis(SYNTHETIC_RELEASE_MS);
    let newly_held = held.insert(control, deadline).is_none();
    if newly_held {
        vec![TermCommand::Input(HostEvent::KeyDown(control))]
    } else {
        Vec::new()
    }
}

fn control_key(code: KeyCode) -> Option<ControlKey> {
    match code {
        KeyCode::Char('w') => Some(ControlKey::PitchForward),
        KeyCode::Char('s') => Some(ControlKey::PitchBack),
        KeyCode::Char('a') => Some(ControlKey::RollLeft),
        KeyCode::Char('d') => Some(ControlKey::RollRight),
        KeyCode::Left => Some(ControlKey::YawLeft),
        KeyCode::Right => Some(ControlKey::YawRight),
        KeyCode::Up => Some(ControlKey::ThrottleUp),
        KeyCode::Down => Some(ControlKey::ThrottleDown),
        _ => None,
    }
}

fn translate_mouse(
    mouse: MouseEvent,
    last_pointer: &mut Option<(u16, u16)>,
) -> Vec<TermCommand> {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            let position = (mouse.column, mouse.row);
            let delta = last_pointer.map(|(col, row)| {
                (
                    f32::from(position.0) - f32::from(col),
                    f32::from(position.1) - f32::from(row),
                )
            });
            *last_pointer = Some(position);

            match delta {
                Some((dx, dy)) if dx != 0.0 || dy != 0.0 => {
                    vec![TermCommand::Input(HostEvent::PointerDelta { dx, dy })]
                }
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// Pointer lock backed by terminal mouse capture.
pub struct TermPointerLock;

#[async_trait]
impl PointerLockHost for TermPointerLock {
    async fn acquire(&mut self) -> std::io::Result<()> {
        execute!(stdout(), EnableMouseCapture)?;
        debug!("Mouse capture enabled");
        Ok(())
    }

    fn release(&mut self) {
        if let Err(e) = execute!(stdout(), DisableMouseCapture) {
            warn!("Failed to disable mouse capture: {}", e);
        } else {
            debug!("Mouse capture disabled");
        }
    }
}
