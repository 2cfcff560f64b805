//! Derived statistics, summaries and file naming.

use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::format::{EventPayload, RecordingFile};

/// File name used when a session name sanitizes to nothing.
const FALLBACK_NAME: &str = "recording";

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("file name pattern is a valid regex"));

/// Aggregate statistics for a recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingStats {
    /// Total number of events.
    pub event_count: usize,
    /// Number of input events.
    pub input_events: usize,
    /// Number of output events.
    pub output_events: usize,
    /// Number of resize events.
    pub resize_events: usize,
    /// Number of metadata events.
    pub metadata_events: usize,
    /// Total bytes across all output events.
    pub total_output_bytes: usize,
    /// Mean gap between consecutive events, in milliseconds, over strictly
    /// increasing timestamps only.
    pub average_event_interval_ms: f64,
}

/// Compute statistics in a single pass over the events.
#[must_use]
pub fn calculate_recording_stats(file: &RecordingFile) -> RecordingStats {
    let mut stats = RecordingStats {
        event_count: file.events.len(),
        ..RecordingStats::default()
    };

    let mut interval_sum: i64 = 0;
    let mut interval_count: u32 = 0;
    let mut previous: Option<i64> = None;

    for event in &file.events {
        match &event.payload {
            EventPayload::Input(_) => stats.input_events += 1,
            EventPayload::Output(bytes) => {
                stats.output_events += 1;
                stats.total_output_bytes += bytes.len();
            }
            EventPayload::Resize { .. } => stats.resize_events += 1,
            EventPayload::Metadata { .. } => stats.metadata_events += 1,
        }

        if let Some(prev) = previous {
            let delta = event.timestamp.saturating_sub(prev);
            if delta > 0 {
                interval_sum = interval_sum.saturating_add(delta);
                interval_count += 1;
            }
        }
        previous = Some(event.timestamp);
    }

    if interval_count > 0 {
        stats.average_event_interval_ms = interval_sum as f64 / f64::from(interval_count);
    }

    stats
}

/// Render a human-readable summary of a recording.
#[must_use]
pub fn generate_recording_summary(file: &RecordingFile) -> String {
    let stats = calculate_recording_stats(file);
    let metadata = &file.metadata;

    let total_secs = metadata.duration.max(0.0) as u64;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;

    let started = format_timestamp(metadata.start_time, "%Y-%m-%d %H:%M:%S UTC")
        .unwrap_or_else(|| metadata.start_time.to_string());
    let tags = if metadata.tags.is_empty() {
        "none".to_string()
    } else {
        metadata.tags.join(", ")
    };

    let mut out = String::new();
    let _ = writeln!(out, "Session: {}", metadata.session_name);
    let _ = writeln!(out, "Connection: {}", metadata.connection_id);
    let _ = writeln!(out, "Started: {started}");
    let _ = writeln!(out, "Duration: {minutes}m {seconds}s");
    let _ = writeln!(out, "Terminal: {}", metadata.terminal_size);
    if let Some(theme) = metadata
        .terminal_config
        .as_ref()
        .and_then(|c| c.theme_id.as_deref())
    {
        let _ = writeln!(out, "Theme: {theme}");
    }
    let _ = writeln!(out, "Tags: {tags}");
    let _ = writeln!(
        out,
        "Events: {} (input {}, output {}, resize {}, metadata {})",
        stats.event_count,
        stats.input_events,
        stats.output_events,
        stats.resize_events,
        stats.metadata_events
    );
    let _ = writeln!(out, "Output: {} bytes", stats.total_output_bytes);
    let _ = write!(
        out,
        "Average interval: {:.1} ms",
        stats.average_event_interval_ms
    );
    out
}

/// Build `<name>_<YYYY-MM-DD>_<HH-MM-SS>.json` for a recording, in UTC.
///
/// Everything outside `[A-Za-z0-9_-]` is stripped from the session name.
#[must_use]
pub fn generate_default_file_name(session_name: &str, start_time: i64) -> String {
    let sanitized = UNSAFE_FILE_CHARS.replace_all(session_name, "");
    let name = if sanitized.is_empty() {
        FALLBACK_NAME
    } else {
        sanitized.as_ref()
    };

    let stamp = format_timestamp(start_time, "%Y-%m-%d_%H-%M-%S")
        .unwrap_or_else(|| "1970-01-01_00-00-00".to_string());
    format!("{name}_{stamp}.json")
}

fn format_timestamp(millis: i64, pattern: &str) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.format(pattern).to_string())
}
