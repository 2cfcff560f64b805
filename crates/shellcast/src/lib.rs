//! shellcast: terminal session recording and playback
//!
//! This crate captures a live terminal session into an event-sourced,
//! versioned recording and replays it on a virtual timeline with variable
//! speed, seek and pause/resume.
//!
//! # Features
//!
//! - **Pause-aware recorder** that excludes paused time from the duration
//! - **Versioned JSON format** with lenient validation and typed events
//! - **Playback engine** driven by an injected clock, deterministic in tests
//! - **Host integration**: per-connection session registry, file store,
//!   asciicast v2 interchange and a scoped key interception registry
//!
//! # Example
//!
//! ```
//! use shellcast::prelude::*;
//!
//! let clock = ManualClock::shared(1_700_000_000_000);
//! let mut recorder = TerminalRecorder::builder("conn-1", "prod shell")
//!     .size(80, 24)
//!     .clock(clock.clone())
//!     .build();
//!
//! recorder.start()?;
//! recorder.record_output(b"$ ");
//! clock.advance_millis(250);
//! recorder.record_output(b"ls\r\n");
//! let file = recorder.stop()?;
//!
//! let json = serialize_recording_file(&file)?;
//! assert_eq!(deserialize_recording_file(&json), Some(file));
//! # Ok::<(), ShellcastError>(())
//! ```

pub mod asciicast;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod playback;
pub mod prelude;
pub mod recorder;
pub mod recording;
pub mod session;
pub mod store;

pub use asciicast::{AsciicastHeader, AsciicastOptions, read_asciicast, write_asciicast};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{Config, EnvConfig, LogFormat, LoggingConfig, PlaybackConfig, RecorderConfig};
pub use error::{Result, ShellcastError};
pub use keys::{Interceptor, InterceptorHandle, KeyInterceptors, KeyOutcome};
pub use playback::{
    PlaybackCallbacks, PlaybackEngine, PlaybackStatus, Transition, drive, drive_blocking,
};
pub use recorder::{RecorderBuilder, RecorderState, RecordingPreview, TerminalRecorder};
pub use recording::{
    EventKind, EventPayload, RecordingEvent, RecordingFile, RecordingMetadata, RecordingStats,
    TerminalConfig, TerminalSize,
};
pub use session::RecordingSessions;
pub use store::{
    FileStore, RecordingStore, StoredRecording, read_recording_file, write_recording_file,
};
