//! Recording event model and file container.
//!
//! This module defines the versioned JSON format recordings are stored in,
//! along with validation, encoding, statistics and naming helpers.

pub mod codec;
pub mod format;
pub mod stats;
pub mod validate;
pub mod version;

pub use codec::{decode_recording_value, deserialize_recording_file, serialize_recording_file};
pub use format::{
    CursorStyle, EventKind, EventPayload, FORMAT_VERSION, RecordingEvent, RecordingFile,
    RecordingMetadata, TerminalConfig, TerminalSize, markers,
};
pub use stats::{
    RecordingStats, calculate_recording_stats, generate_default_file_name,
    generate_recording_summary,
};
pub use validate::{validate_recording_event, validate_recording_file};
pub use version::{is_recording_file_outdated, upgrade_recording_file};
