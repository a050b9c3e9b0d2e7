//! # Error Types
//!
//! Custom error types for the teleop core using `thiserror`.

use thiserror::Error;

/// Main error type for the teleop core
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Discrete command attempted while the control link is not open.
    ///
    /// Continuous axis updates are silently dropped in this situation;
    /// discrete actions must surface the failure to the caller instead.
    #[error("not connected to vehicle")]
    NotConnected,

    /// Control link I/O failures (write errors, broken connection)
    #[error("control link error: {0}")]
    Link(String),

    /// Host environment errors (terminal setup, input thread)
    #[error("host environment error: {0}")]
    Host(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Wire message encoding errors
    #[error("message encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the teleop core
pub type Result<T> = std::result::Result<T, TeleopError>;
