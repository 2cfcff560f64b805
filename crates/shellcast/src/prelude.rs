//! Convenient re-exports for common shellcast usage.

// Core types
pub use crate::clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use crate::config::{Config, EnvConfig, PlaybackConfig, RecorderConfig};
pub use crate::error::{Result, ShellcastError};

// Recording format
pub use crate::recording::{
    EventKind, EventPayload, RecordingEvent, RecordingFile, RecordingMetadata, TerminalConfig,
    TerminalSize, calculate_recording_stats, deserialize_recording_file,
    generate_recording_summary, serialize_recording_file,
};

// Capture and playback
pub use crate::playback::{PlaybackCallbacks, PlaybackEngine, PlaybackStatus, Transition};
pub use crate::recorder::TerminalRecorder;

// Host integration
pub use crate::keys::{Interceptor, KeyInterceptors, KeyOutcome};
pub use crate::session::RecordingSessions;
pub use crate::store::{FileStore, RecordingStore};
