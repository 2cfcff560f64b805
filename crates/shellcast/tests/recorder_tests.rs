//! Integration tests for the terminal recorder and session registry.

mod common;

use std::time::Duration;

use shellcast::recording::markers;
use shellcast::{
    EventKind, FileStore, ManualClock, RecorderConfig, RecorderState, RecordingSessions,
    RecordingStore, ShellcastError, TerminalConfig, TerminalRecorder, TerminalSize,
};

#[test]
fn duration_is_sum_of_active_intervals() {
    let clock = ManualClock::shared(common::START);
    let mut recorder = TerminalRecorder::builder("conn-1", "prod")
        .clock(clock.clone())
        .build();

    recorder.start().unwrap();
    clock.advance(Duration::from_millis(1_200));
    recorder.pause();
    clock.advance(Duration::from_millis(3_000));
    recorder.resume();
    clock.advance(Duration::from_millis(800));
    recorder.pause();
    clock.advance(Duration::from_millis(500));
    recorder.resume();
    clock.advance(Duration::from_millis(1_000));
    let file = recorder.stop().unwrap();

    assert!((file.metadata.duration - 3.0).abs() < 1e-9);
    let wall = (file.end_time() - file.start_time()) as f64 / 1000.0;
    assert!(file.metadata.duration < wall);
}

#[test]
fn lifecycle_markers_bracket_the_session() {
    let clock = ManualClock::shared(common::START);
    let mut recorder = TerminalRecorder::builder("conn-1", "prod")
        .size(132, 43)
        .clock(clock.clone())
        .build();
    assert_eq!(recorder.state(), RecorderState::Created);

    recorder.start().unwrap();
    recorder.pause();
    recorder.resume();
    let file = recorder.stop().unwrap();
    assert_eq!(recorder.state(), RecorderState::Stopped);

    let keys: Vec<_> = file.events.iter().filter_map(|e| e.metadata_key()).collect();
    assert_eq!(
        keys,
        vec![
            markers::RECORDING_START,
            markers::RECORDING_PAUSED,
            markers::RECORDING_RESUMED,
            markers::RECORDING_END,
        ]
    );

    match &file.events[0].payload {
        shellcast::EventPayload::Metadata { value, .. } => {
            assert_eq!(value["connectionId"], "conn-1");
            assert_eq!(value["sessionName"], "prod");
            assert_eq!(value["cols"], 132);
            assert_eq!(value["rows"], 43);
        }
        other => panic!("unexpected first event {other:?}"),
    }
}

#[test]
fn no_growth_before_start_or_after_stop() {
    let mut recorder = TerminalRecorder::new("c", "s", TerminalSize::default());
    recorder.record_output(b"before");
    recorder.record_input("x");
    recorder.record_resize(1, 1);
    assert_eq!(recorder.event_count(), 0);

    recorder.start().unwrap();
    let _ = recorder.stop().unwrap();
    let count = recorder.event_count();
    recorder.record_output(b"after");
    assert_eq!(recorder.event_count(), count);
}

#[test]
fn stop_twice_is_an_error() {
    let mut recorder = TerminalRecorder::new("c", "s", TerminalSize::default());
    recorder.start().unwrap();
    recorder.stop().unwrap();
    let err = recorder.stop().unwrap_err();
    assert!(matches!(err, ShellcastError::IllegalState { operation: "stop", .. }));
}

#[test]
fn restart_after_stop_is_an_error() {
    let mut recorder = TerminalRecorder::new("c", "s", TerminalSize::default());
    recorder.start().unwrap();
    recorder.stop().unwrap();
    assert!(recorder.start().unwrap_err().is_illegal_state());
}

#[test]
fn events_are_a_copy() {
    let mut recorder = TerminalRecorder::new("c", "s", TerminalSize::default());
    recorder.start().unwrap();
    let mut events = recorder.events();
    events.clear();
    assert_eq!(recorder.event_count(), 1);
}

#[test]
fn file_snapshot_includes_config() {
    let clock = ManualClock::shared(0);
    let mut recorder = TerminalRecorder::builder("c", "s")
        .clock(clock.clone())
        .terminal_config(TerminalConfig::new().with_font("Iosevka", 14.0))
        .config(&RecorderConfig::new().max_events(1).tag("audit"))
        .build();
    recorder.start().unwrap();
    recorder.record_output(b"kept");
    recorder.record_output(b"dropped");
    let file = recorder.stop().unwrap();

    assert_eq!(file.filter(EventKind::Output).len(), 1);
    assert_eq!(file.metadata.tags, vec!["audit"]);
    assert_eq!(
        file.metadata.terminal_config.and_then(|c| c.font_family).as_deref(),
        Some("Iosevka")
    );
}

#[test]
fn sessions_stop_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut sessions = RecordingSessions::new(ManualClock::shared(common::START));

    sessions
        .start("conn-1", "prod db", TerminalSize::default(), None)
        .unwrap();
    sessions.record_output("conn-1", b"hello");
    sessions.record_input("conn-1", "q");
    sessions.record_resize("conn-1", 100, 50);

    let stored = sessions.stop_and_save("conn-1", &store).unwrap();
    assert_eq!(stored.name, "proddb_2023-11-14_22-13-20.json");
    assert!(sessions.active().is_empty());

    let loaded = store.load(&stored.name).unwrap();
    assert_eq!(loaded.output_text(), "hello");
    assert_eq!(loaded.metadata.event_count, 5);

    assert!(matches!(
        sessions.stop_and_save("conn-1", &store),
        Err(ShellcastError::NoActiveRecording { .. })
    ));
}
