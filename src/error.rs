//! Error types for the gaze estimation library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `start` requested while a session is already running
    #[error("Gaze tracking is already active")]
    AlreadyRunning,

    /// `stop` requested while no session is running
    #[error("Gaze tracking is not active")]
    NotRunning,

    /// The device lacks the face tracking capability
    #[error("Face tracking is not supported on this device")]
    Unsupported,

    /// Command name not part of the command surface
    #[error("Command not implemented: {0}")]
    NotImplemented(String),

    /// The sensor reported a failure or interruption mid-session
    #[error("Sensor session fault: {0}")]
    SessionFault(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Recorded pose trace could not be read
    #[error("Trace error: {0}")]
    Trace(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Stable error code reported on the command channel.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "ALREADY_TRACKING",
            Self::NotRunning => "NOT_TRACKING",
            Self::Unsupported => "NOT_SUPPORTED",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
            Self::SessionFault(_) => "SESSION_FAULT",
            Self::Io(_) | Self::Trace(_) => "IO_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
