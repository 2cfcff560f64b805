//! JSON encoding of recording files.

use serde_json::Value;

use super::format::RecordingFile;
use super::validate::validate_recording_file;
use crate::error::Result;

/// Serialize a recording as pretty-printed JSON.
pub fn serialize_recording_file(file: &RecordingFile) -> Result<String> {
    Ok(serde_json::to_string_pretty(file)?)
}

/// Parse and validate a recording.
///
/// Returns `None` when the text is not JSON, fails validation, or does not
/// decode into the typed model. Each failure is logged.
#[must_use]
pub fn deserialize_recording_file(json: &str) -> Option<RecordingFile> {
    let value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "recording is not valid JSON");
            return None;
        }
    };
    decode_recording_value(value)
}

/// Validate and decode an already-parsed JSON value.
#[must_use]
pub fn decode_recording_value(value: Value) -> Option<RecordingFile> {
    if !validate_recording_file(&value) {
        return None;
    }

    let mut file: RecordingFile = match serde_json::from_value(value) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(error = %e, "recording failed to decode");
            return None;
        }
    };

    if file.metadata.event_count != file.events.len() {
        tracing::warn!(
            declared = file.metadata.event_count,
            actual = file.events.len(),
            "recording eventCount does not match events; using actual count"
        );
        file.metadata.event_count = file.events.len();
    }

    Some(file)
}
