//! Error types for shellcast.
//!
//! Validation never produces an error (it returns `false` and logs), and the
//! playback engine reports ignored calls through
//! [`Transition`](crate::playback::Transition). What remains here are hard
//! contract violations, format problems and I/O.

use thiserror::Error;

/// The main error type for shellcast operations.
#[derive(Debug, Error)]
pub enum ShellcastError {
    /// An operation was called in a state that does not allow it.
    #[error("cannot {operation} while recorder is {state}")]
    IllegalState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the recorder was in.
        state: String,
    },

    /// The recording uses a format version this build does not understand.
    #[error("unsupported recording format version '{version}'")]
    UnsupportedVersion {
        /// The version tag found in the file.
        version: String,
    },

    /// A recording failed structural validation.
    #[error("invalid recording: {reason}")]
    InvalidRecording {
        /// Why the recording was rejected.
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A recording is already running for this connection.
    #[error("connection '{connection_id}' is already being recorded")]
    AlreadyRecording {
        /// The connection that already has a recorder.
        connection_id: String,
    },

    /// No recording is running for this connection.
    #[error("no active recording for connection '{connection_id}'")]
    NoActiveRecording {
        /// The connection that was looked up.
        connection_id: String,
    },

    /// A stored recording was not found.
    #[error("recording '{name}' not found")]
    NotFound {
        /// Name of the missing recording.
        name: String,
    },
}

/// Result type alias for shellcast operations.
pub type Result<T> = std::result::Result<T, ShellcastError>;

impl ShellcastError {
    /// Create an illegal state error.
    pub fn illegal_state(operation: &'static str, state: impl ToString) -> Self {
        Self::IllegalState {
            operation,
            state: state.to_string(),
        }
    }

    /// Create an invalid recording error.
    pub fn invalid_recording(reason: impl Into<String>) -> Self {
        Self::InvalidRecording {
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this is an illegal state error.
    #[must_use]
    pub const fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState { .. })
    }
}
