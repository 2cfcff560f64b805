//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use shellcast::playback::PlaybackCallbacks;
use shellcast::recording::{RecordingEvent, RecordingFile, RecordingMetadata, TerminalSize};

/// Start time used by every fixture recording.
pub const START: i64 = 1_700_000_000_000;

/// Output events at the given offsets from [`START`], each carrying its
/// offset as text.
pub fn output_file(offsets: &[i64]) -> RecordingFile {
    let events = offsets
        .iter()
        .map(|o| RecordingEvent::output(START + o, o.to_string().into_bytes()))
        .collect();
    RecordingFile::new(
        RecordingMetadata::new("conn-1", "fixture", START, TerminalSize::default()),
        events,
    )
}

/// A recording with one event of every kind.
pub fn mixed_file() -> RecordingFile {
    let mut metadata = RecordingMetadata::new("conn-1", "mixed", START, TerminalSize::new(100, 30));
    metadata.end_time = Some(START + 2_000);
    metadata.duration = 2.0;
    metadata.tags = vec!["ssh".into()];
    RecordingFile::new(
        metadata,
        vec![
            RecordingEvent::metadata(START, "recording_start", json!({ "cols": 100, "rows": 30 })),
            RecordingEvent::output(START + 10, b"$ ".to_vec()),
            RecordingEvent::input(START + 500, "ls\r"),
            RecordingEvent::output(START + 520, b"ls\r\nfile.txt\r\n".to_vec()),
            RecordingEvent::resize(START + 1_000, 120, 40),
            RecordingEvent::metadata(START + 2_000, "recording_end", json!({ "duration": 2.0 })),
        ],
    )
}

/// Raw JSON for a minimal valid recording.
pub fn valid_json() -> Value {
    json!({
        "version": "1.0",
        "metadata": {
            "startTime": START,
            "duration": 0.5,
            "terminalSize": { "cols": 80, "rows": 24 },
            "connectionId": "conn-1",
            "sessionName": "raw",
            "tags": [],
            "eventCount": 1
        },
        "events": [
            { "timestamp": START + 500, "type": "output", "data": { "data": [104, 105] } }
        ]
    })
}

/// What a playback sink observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Seen {
    Output(String),
    Resize(u16, u16),
    Metadata(String),
    Progress(i64, i64),
    Ended,
}

/// Callbacks that log everything into a shared vector.
pub fn logging_callbacks() -> (PlaybackCallbacks, Arc<Mutex<Vec<Seen>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (o, r, m, p, e) = (
        Arc::clone(&log),
        Arc::clone(&log),
        Arc::clone(&log),
        Arc::clone(&log),
        Arc::clone(&log),
    );
    let callbacks = PlaybackCallbacks::new()
        .on_output(move |b| {
            o.lock()
                .unwrap()
                .push(Seen::Output(String::from_utf8_lossy(b).into_owned()));
        })
        .on_resize(move |c, rows| r.lock().unwrap().push(Seen::Resize(c, rows)))
        .on_metadata(move |k, _| m.lock().unwrap().push(Seen::Metadata(k.to_string())))
        .on_progress(move |cur, total| p.lock().unwrap().push(Seen::Progress(cur, total)))
        .on_ended(move || e.lock().unwrap().push(Seen::Ended));
    (callbacks, log)
}

/// Output payloads in the order they were seen.
pub fn outputs(log: &Arc<Mutex<Vec<Seen>>>) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|s| match s {
            Seen::Output(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}
