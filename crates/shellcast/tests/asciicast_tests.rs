//! Integration tests for asciicast interchange.

mod common;

use std::io::{BufReader, Cursor};

use common::mixed_file;
use shellcast::asciicast::IMPORTED_CONNECTION_ID;
use shellcast::{AsciicastOptions, EventKind, EventPayload, read_asciicast, write_asciicast};

#[test]
fn export_then_import_keeps_output_and_resizes() {
    let original = mixed_file();
    let mut cast = Vec::new();
    write_asciicast(&mut cast, &original, &AsciicastOptions::new()).unwrap();

    let imported = read_asciicast(BufReader::new(Cursor::new(cast))).unwrap();
    assert_eq!(imported.output_text(), original.output_text());
    assert_eq!(imported.metadata.session_name, "mixed");
    assert_eq!(imported.metadata.connection_id, IMPORTED_CONNECTION_ID);
    assert_eq!(imported.metadata.terminal_size, original.metadata.terminal_size);

    let resizes: Vec<_> = imported
        .filter(EventKind::Resize)
        .into_iter()
        .map(|e| (e.timestamp - imported.start_time(), e.payload.clone()))
        .collect();
    assert_eq!(resizes, vec![(1_000, EventPayload::Resize { cols: 120, rows: 40 })]);
    assert_eq!(imported.end_time() - imported.start_time(), 2_000);
}

#[test]
fn markers_keep_keys_only() {
    let mut cast = Vec::new();
    write_asciicast(&mut cast, &mixed_file(), &AsciicastOptions::new()).unwrap();
    let imported = read_asciicast(cast.as_slice()).unwrap();

    let keys: Vec<_> = imported.events.iter().filter_map(|e| e.metadata_key()).collect();
    assert_eq!(keys, vec!["recording_start", "recording_end"]);
}

#[test]
fn idle_limit_shortens_import() {
    let mut cast = Vec::new();
    write_asciicast(
        &mut cast,
        &mixed_file(),
        &AsciicastOptions::new().with_idle_time_limit(0.1),
    )
    .unwrap();
    let imported = read_asciicast(cast.as_slice()).unwrap();
    assert!(imported.end_time() - imported.start_time() <= 500);
}

#[test]
fn output_only_export() {
    let mut cast = Vec::new();
    write_asciicast(
        &mut cast,
        &mixed_file(),
        &AsciicastOptions::new().without_input().without_markers(),
    )
    .unwrap();
    let imported = read_asciicast(cast.as_slice()).unwrap();
    assert!(imported.filter(EventKind::Input).is_empty());
    assert!(imported.filter(EventKind::Metadata).is_empty());
    assert_eq!(imported.filter(EventKind::Output).len(), 2);
}

#[test]
fn huge_offsets_saturate_on_import() {
    let cast = "{\"version\": 2, \"width\": 80, \"height\": 24, \"timestamp\": 1700000000}\n\
                [1e20, \"o\", \"x\"]\n";
    let imported = read_asciicast(cast.as_bytes()).unwrap();
    assert_eq!(imported.events.len(), 1);
    assert_eq!(imported.events[0].timestamp, i64::MAX);
    assert_eq!(imported.end_time(), i64::MAX);
    assert_eq!(imported.output_text(), "x");
}

#[test]
fn extreme_recording_exports() {
    use shellcast::{RecordingEvent, RecordingFile, RecordingMetadata, TerminalSize};

    let file = RecordingFile::new(
        RecordingMetadata::new("conn", "extreme", i64::MIN, TerminalSize::default()),
        vec![
            RecordingEvent::output(i64::MIN, b"a".to_vec()),
            RecordingEvent::output(i64::MAX, b"b".to_vec()),
        ],
    );
    let mut cast = Vec::new();
    write_asciicast(&mut cast, &file, &AsciicastOptions::new()).unwrap();
    let imported = read_asciicast(cast.as_slice()).unwrap();
    assert_eq!(imported.output_text(), "ab");
}
