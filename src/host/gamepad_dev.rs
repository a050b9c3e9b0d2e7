//! # Gamepad Device Adapter
//!
//! Linux evdev gamepad discovery and snapshot polling.
//!
//! A monitor thread owns the device: it scans `/dev/input/event*` until a
//! pad appears, announces connect/disconnect over the host-event channel,
//! and folds the device's event stream into a shared stick snapshot. The
//! session side sees only a [`GamepadSource`] whose `poll` copies that
//! snapshot, which matches the pollable-snapshot contract real gamepad
//! hardware exposes.
//!
//! ## Device Matching
//!
//! A DualSense-class pad is matched by Sony's vendor/product IDs; any other
//! device advertising a south face button plus absolute X/Y axes is accepted
//! as a generic gamepad.
//!
//! ## Raw Axes
//!
//! Sticks report 0-255 with 128 at rest (ABS_X/ABS_Y left, ABS_Z/ABS_RZ
//! right); values are normalized to -1.0..1.0 before they reach the shared
//! snapshot.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use evdev::{AbsoluteAxisType, Device, Key};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::{Result, TeleopError};
use crate::host::GamepadSource;
use crate::input::{GamepadHandle, GamepadSnapshot, HostEvent};

/// Sony vendor ID.
const DUALSENSE_VENDOR_ID: u16 = 0x054c;

/// DualSense product ID (wired and Bluetooth).
const DUALSENSE_PRODUCT_ID: u16 = 0x0ce6;

/// Raw stick range reported by the pad.
const RAW_AXIS_MIN: i32 = 0;
const RAW_AXIS_MAX: i32 = 255;
const RAW_AXIS_CENTER: i32 = 128;

/// How often the monitor rescans for a device while disconnected.
const DISCOVERY_INTERVAL: Duration = Duration::from_secs(1);

/// Raw stick state accumulated from the event stream.
#[derive(Debug, Clone, Copy)]
struct RawSticks {
    left_x: i32,
    left_y: i32,
    right_x: i32,
    right_y: i32,
}

impl Default for RawSticks {
    fn default() -> Self {
        Self {
            left_x: RAW_AXIS_CENTER,
            left_y: RAW_AXIS_CENTER,
            right_x: RAW_AXIS_CENTER,
            right_y: RAW_AXIS_CENTER,
        }
    }
}

impl RawSticks {
    fn apply(&mut self, axis: AbsoluteAxisType, value: i32) {
        let value = value.clamp(RAW_AXIS_MIN, RAW_AXIS_MAX);
        match axis {
            AbsoluteAxisType::ABS_X => self.left_x = value,
            AbsoluteAxisType::ABS_Y => self.left_y = value,
            AbsoluteAxisType::ABS_Z => self.right_x = value,
            AbsoluteAxisType::ABS_RZ => self.right_y = value,
            _ => {}
        }
    }

    fn snapshot(&self) -> GamepadSnapshot {
        GamepadSnapshot {
            left_x: normalize(self.left_x),
            left_y: normalize(self.left_y),
            right_x: normalize(self.right_x),
            right_y: normalize(self.right_y),
        }
    }
}

/// Scales a raw 0-255 stick value to -1.0..1.0 around the rest position.
fn normalize(raw: i32) -> f32 {
    let centered = (raw - RAW_AXIS_CENTER) as f32;
    (centered / (RAW_AXIS_MAX - RAW_AXIS_CENTER) as f32).clamp(-1.0, 1.0)
}

/// Session-side view of the monitor's shared snapshot.
#[derive(Clone)]
pub struct EvdevGamepadSource {
    shared: Arc<Mutex<Option<GamepadSnapshot>>>,
}

impl GamepadSource for EvdevGamepadSource {
    fn poll(&mut self) -> Option<GamepadSnapshot> {
        match self.shared.lock() {
            Ok(snapshot) => *snapshot,
            Err(_) => None,
        }
    }
}

/// Owns the gamepad discovery/reader thread.
pub struct GamepadMonitor {
    stop: Arc<AtomicBool>,
}

impl GamepadMonitor {
    /// Starts the monitor and returns it with the session-side source.
    ///
    /// # Errors
    ///
    /// Returns a host error if the monitor thread cannot be spawned.
    pub fn spawn(events: UnboundedSender<HostEvent>) -> Result<(Self, EvdevGamepadSource)> {
        let shared: Arc<Mutex<Option<GamepadSnapshot>>> = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));

        {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("gamepad-monitor".to_string())
                .spawn(move || monitor_loop(&events, &shared, &stop))
                .map_err(|e| TeleopError::Host(format!("gamepad thread: {}", e)))?;
        }

        Ok((Self { stop }, EvdevGamepadSource { shared }))
    }

    /// Asks the monitor thread to wind down.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn monitor_loop(
    events: &UnboundedSender<HostEvent>,
    shared: &Arc<Mutex<Option<GamepadSnapshot>>>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        let (device, handle) = match discover() {
            Some(found) => found,
            None => {
                thread::sleep(DISCOVERY_INTERVAL);
                continue;
            }
        };

        info!("Gamepad connected: {} at {}", handle.name, handle.path);
        if events.send(HostEvent::GamepadConnected(handle)).is_err() {
            return;
        }

        read_device(device, shared, stop);

        if let Ok(mut snapshot) = shared.lock() {
            *snapshot = None;
        }
        if events.send(HostEvent::GamepadDisconnected).is_err() {
            return;
        }
        info!("Gamepad disconnected");
    }
}

/// Scans `/dev/input` for the first usable gamepad.
fn discover() -> Option<(Device, GamepadHandle)> {
    let input_dir = Path::new("/dev/input");
    let entries = std::fs::read_dir(input_dir).ok()?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false)
        })
        .collect();
    // Deterministic selection when several pads are plugged in
    paths.sort();

    for path in paths {
        let device = match Device::open(&path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Could not open {}: {}", path.display(), e);
                continue;
            }
        };

        if is_gamepad(&device) {
            let handle = GamepadHandle {
                name: device.name().unwrap_or("Unknown gamepad").to_string(),
                path: path.to_string_lossy().to_string(),
            };
            return Some((device, handle));
        }
    }

    None
}

/// Matches DualSense-class pads by ID, anything else by capability.
fn is_gamepad(device: &Device) -> bool {
    let id = device.input_id();
    if id.vendor() == DUALSENSE_VENDOR_ID && id.product() == DUALSENSE_PRODUCT_ID {
        return true;
    }

    let has_face_button = device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_SOUTH))
        .unwrap_or(false);
    let has_sticks = device
        .supported_absolute_axes()
        .map(|axes| {
            axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
        })
        .unwrap_or(false);

    has_face_button && has_sticks
}

/// Folds the device event stream into the shared snapshot until the device
/// goes away or shutdown is requested.
fn read_device(
    mut device: Device,
    shared: &Arc<Mutex<Option<GamepadSnapshot>>>,
    stop: &AtomicBool,
) {
    let mut sticks = RawSticks::default();
    publish(shared, &sticks);

    while !stop.load(Ordering::Relaxed) {
        let fetched = match device.fetch_events() {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Gamepad read failed: {}", e);
                return;
            }
        };

        for event in fetched {
            if let evdev::InputEventKind::AbsAxis(axis) = event.kind() {
                sticks.apply(axis, event.value());
            }
        }
        publish(shared, &sticks);
    }
}

fn publish(shared: &Arc<Mutex<Option<GamepadSnapshot>>>, sticks: &RawSticks) {
    if let Ok(mut snapshot) = shared.lock() {
        *snapshot = Some(sticks.snapshot());
    }
}
