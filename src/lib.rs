//! # Teleop Link Library
//!
//! Input-fusion and command-transport core for remote drone teleoperation.
//!
//! This library fuses keyboard, gamepad, and relative-mouse input into a
//! normalized control-axis stream, manages the transitions between those
//! modalities, and transports the resulting commands to a vehicle-control
//! backend as newline-delimited JSON over a persistent connection.

pub mod axis;
pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod mode;
pub mod session;
pub mod telemetry;
pub mod transport;
