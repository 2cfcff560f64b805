//! Integration tests for the recording format.

mod common;

use common::{START, mixed_file, valid_json};
use serde_json::json;
use shellcast::recording::{
    EventKind, FORMAT_VERSION, calculate_recording_stats, decode_recording_value,
    deserialize_recording_file, generate_default_file_name, generate_recording_summary,
    is_recording_file_outdated, serialize_recording_file, upgrade_recording_file,
    validate_recording_event, validate_recording_file,
};
use shellcast::{RecordingFile, RecordingMetadata, ShellcastError, TerminalConfig, TerminalSize};

#[test]
fn validator_accepts_minimal_file() {
    assert!(validate_recording_file(&valid_json()));
}

#[test]
fn validator_rejects_empty_object() {
    assert!(!validate_recording_file(&json!({})));
}

#[test]
fn validator_rejects_other_versions() {
    let mut value = valid_json();
    value["version"] = json!("2.0");
    assert!(!validate_recording_file(&value));
}

#[test]
fn validator_rejects_unknown_event_type() {
    let mut value = valid_json();
    value["events"][0]["type"] = json!("unknown");
    assert!(!validate_recording_file(&value));
}

#[test]
fn validator_rejects_missing_fields() {
    for pointer in ["startTime", "connectionId", "sessionName", "terminalSize"] {
        let mut value = valid_json();
        value["metadata"].as_object_mut().unwrap().remove(pointer);
        assert!(!validate_recording_file(&value), "{pointer}");
    }

    let mut value = valid_json();
    value["events"] = json!({});
    assert!(!validate_recording_file(&value));

    assert!(!validate_recording_file(&json!([])));
    assert!(!validate_recording_file(&json!(null)));
}

#[test]
fn event_validator() {
    assert!(validate_recording_event(
        &json!({ "timestamp": 1, "type": "resize", "data": { "cols": 1, "rows": 1 } })
    ));
    assert!(!validate_recording_event(&json!({ "timestamp": "1", "type": "resize", "data": {} })));
    assert!(!validate_recording_event(&json!({ "timestamp": 1, "type": "input" })));
    assert!(!validate_recording_event(&json!({ "timestamp": 1, "type": "input", "data": null })));
}

#[test]
fn round_trip_preserves_file() {
    let mut file = mixed_file();
    file.metadata.terminal_config = Some(TerminalConfig::new().with_theme("dracula").with_font("Fira Code", 13.0));
    let json = serialize_recording_file(&file).unwrap();
    assert_eq!(deserialize_recording_file(&json), Some(file));
}

#[test]
fn serialized_file_uses_camel_case() {
    let json = serialize_recording_file(&mixed_file()).unwrap();
    assert!(json.contains("\"startTime\""));
    assert!(json.contains("\"eventCount\": 6"));
    assert!(json.contains("\"terminalSize\""));
    assert!(json.contains('\n'));
}

#[test]
fn decode_corrects_event_count() {
    let mut value = valid_json();
    value["metadata"]["eventCount"] = json!(99);
    let file = decode_recording_value(value).unwrap();
    assert_eq!(file.metadata.event_count, 1);
}

#[test]
fn decode_rejects_garbage() {
    assert!(deserialize_recording_file("").is_none());
    assert!(deserialize_recording_file("{}").is_none());
    let mut value = valid_json();
    value["events"][0]["data"] = json!({ "cols": 1 });
    assert!(decode_recording_value(value).is_none());
}

#[test]
fn stats_count_each_kind() {
    let stats = calculate_recording_stats(&mixed_file());
    assert_eq!(stats.event_count, 6);
    assert_eq!(stats.input_events, 1);
    assert_eq!(stats.output_events, 2);
    assert_eq!(stats.resize_events, 1);
    assert_eq!(stats.metadata_events, 2);
    assert_eq!(stats.total_output_bytes, 2 + 14);
    assert!((stats.average_event_interval_ms - 400.0).abs() < 1e-9);
}

#[test]
fn stats_on_empty_file() {
    let file = RecordingFile::new(
        RecordingMetadata::new("c", "s", START, TerminalSize::default()),
        Vec::new(),
    );
    let stats = calculate_recording_stats(&file);
    assert_eq!(stats.event_count, 0);
    assert!(stats.average_event_interval_ms.abs() < f64::EPSILON);
}

#[test]
fn summary_mentions_key_facts() {
    let summary = generate_recording_summary(&mixed_file());
    assert!(summary.contains("mixed"));
    assert!(summary.contains("conn-1"));
    assert!(summary.contains("0m 2s"));
    assert!(summary.contains("100x30"));
    assert!(summary.contains("ssh"));
}

#[test]
fn default_file_name_is_sanitized_utc() {
    let name = generate_default_file_name("prod: db/1 (eu)", START);
    assert_eq!(name, "proddb1eu_2023-11-14_22-13-20.json");
    assert_eq!(
        generate_default_file_name("***", 0),
        "recording_1970-01-01_00-00-00.json"
    );
}

#[test]
fn version_gate() {
    let file = mixed_file();
    assert_eq!(file.version, FORMAT_VERSION);
    assert!(!is_recording_file_outdated(&file));

    let mut old = file;
    old.version = "0.1".into();
    assert!(matches!(
        upgrade_recording_file(old),
        Err(ShellcastError::UnsupportedVersion { .. })
    ));
}

#[test]
fn filter_and_text_helpers() {
    let file = mixed_file();
    assert_eq!(file.filter(EventKind::Resize).len(), 1);
    assert_eq!(file.output_text(), "$ ls\r\nfile.txt\r\n");
    assert_eq!(file.input_text(), "ls\r");
    assert_eq!(file.end_time(), START + 2_000);
}

fn extreme_timestamps_file() -> RecordingFile {
    let json = json!({
        "version": "1.0",
        "metadata": {
            "startTime": -9_000_000_000_000_000_000_i64,
            "duration": 1.0,
            "terminalSize": { "cols": 80, "rows": 24 },
            "connectionId": "conn-1",
            "sessionName": "extreme",
            "tags": [],
            "eventCount": 2
        },
        "events": [
            { "timestamp": -9e18, "type": "output", "data": { "data": [97] } },
            { "timestamp": 9e18, "type": "output", "data": { "data": [98] } }
        ]
    });
    deserialize_recording_file(&json.to_string()).unwrap()
}

#[test]
fn stats_saturate_on_extreme_timestamps() {
    let file = extreme_timestamps_file();
    let stats = calculate_recording_stats(&file);
    assert_eq!(stats.output_events, 2);
    assert!(stats.average_event_interval_ms.is_finite());
    assert!(stats.average_event_interval_ms > 0.0);
    assert!(generate_recording_summary(&file).contains("extreme"));
}

#[test]
fn playback_handles_extreme_timestamps() {
    let file = extreme_timestamps_file();
    let mut engine = shellcast::PlaybackEngine::new(shellcast::ManualClock::shared(0));
    engine.load(file);

    assert!(engine.seek(0).is_applied());
    let progress = engine.progress();
    assert!((0.0..=1.0).contains(&progress), "{progress}");

    assert!(engine.play().is_applied());
    assert!(engine.tick().is_applied());
    assert!(engine.seek(i64::MAX).is_applied());
    assert!((engine.progress() - 1.0).abs() < f64::EPSILON);
}
