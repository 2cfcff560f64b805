//! Structural validation of untrusted recording JSON.
//!
//! Validators never fail loudly: they return `false` and log one warning per
//! problem found, leaving the decision to the caller.

use serde_json::Value;

use super::format::{EventKind, FORMAT_VERSION};

/// Check that `candidate` is a structurally valid recording file.
#[must_use]
pub fn validate_recording_file(candidate: &Value) -> bool {
    let Some(root) = candidate.as_object() else {
        tracing::warn!("recording is not a JSON object");
        return false;
    };

    match root.get("version").and_then(Value::as_str) {
        Some(FORMAT_VERSION) => {}
        other => {
            tracing::warn!(version = ?other, expected = FORMAT_VERSION, "unsupported recording version");
            return false;
        }
    }

    let Some(metadata) = root.get("metadata").and_then(Value::as_object) else {
        tracing::warn!("recording metadata is missing or not an object");
        return false;
    };

    let mut valid = true;

    if !metadata.get("startTime").is_some_and(Value::is_number) {
        tracing::warn!("metadata.startTime is missing or not a number");
        valid = false;
    }

    let size = metadata.get("terminalSize").and_then(Value::as_object);
    for field in ["cols", "rows"] {
        if !size.and_then(|s| s.get(field)).is_some_and(Value::is_number) {
            tracing::warn!(field, "metadata.terminalSize field is missing or not a number");
            valid = false;
        }
    }

    for field in ["connectionId", "sessionName"] {
        if !metadata.get(field).is_some_and(Value::is_string) {
            tracing::warn!(field, "metadata field is missing or not a string");
            valid = false;
        }
    }

    match root.get("events").and_then(Value::as_array) {
        Some(events) => {
            for (index, event) in events.iter().enumerate() {
                if !validate_recording_event(event) {
                    tracing::warn!(index, "recording contains an invalid event");
                    valid = false;
                    break;
                }
            }
        }
        None => {
            tracing::warn!("recording events is missing or not an array");
            valid = false;
        }
    }

    valid
}

/// Check that `candidate` is a structurally valid event.
///
/// The type tag must be one of the known kinds; unknown kinds are rejected.
#[must_use]
pub fn validate_recording_event(candidate: &Value) -> bool {
    let Some(event) = candidate.as_object() else {
        tracing::warn!("event is not a JSON object");
        return false;
    };

    if !event.get("timestamp").is_some_and(Value::is_number) {
        tracing::warn!("event.timestamp is missing or not a number");
        return false;
    }

    let Some(tag) = event.get("type").and_then(Value::as_str) else {
        tracing::warn!("event.type is missing or not a string");
        return false;
    };

    if EventKind::parse(tag).is_none() {
        tracing::warn!(event_type = tag, "unknown event type");
        return false;
    }

    if event.get("data").is_none_or(Value::is_null) {
        tracing::warn!(event_type = tag, "event.data is missing");
        return false;
    }

    true
}
