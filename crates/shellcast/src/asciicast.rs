//! Asciinema asciicast v2 interchange.
//!
//! Export turns a [`RecordingFile`] into a `.cast` file any asciinema
//! player understands; import brings one back into the native format.
//! Metadata events map to asciicast markers (`m`) carrying only the key, so
//! metadata values do not survive a round trip.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellcastError};
use crate::recording::{
    EventPayload, RecordingEvent, RecordingFile, RecordingMetadata, TerminalSize,
};

/// The asciicast format version this module reads and writes.
pub const ASCIICAST_VERSION: u8 = 2;

/// Connection id given to imported recordings.
pub const IMPORTED_CONNECTION_ID: &str = "asciicast";

/// Session name given to imported recordings without a title.
pub const IMPORTED_SESSION_NAME: &str = "imported";

/// Asciicast v2 header line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsciicastHeader {
    /// Format version.
    pub version: u8,
    /// Terminal width.
    pub width: u16,
    /// Terminal height.
    pub height: u16,
    /// Recording start, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Total duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Gaps longer than this were compressed, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_time_limit: Option<f64>,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Environment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Default for AsciicastHeader {
    fn default() -> Self {
        Self::new(TerminalSize::default())
    }
}

impl AsciicastHeader {
    /// Create a header for a terminal of the given size.
    #[must_use]
    pub fn new(size: TerminalSize) -> Self {
        Self {
            version: ASCIICAST_VERSION,
            width: size.cols,
            height: size.rows,
            timestamp: None,
            duration: None,
            idle_time_limit: None,
            title: None,
            env: BTreeMap::new(),
        }
    }
}

/// Export options.
#[derive(Debug, Clone, PartialEq)]
pub struct AsciicastOptions {
    /// Cap every gap between events at this many seconds.
    pub idle_time_limit: Option<f64>,
    /// Write input events (`i`).
    pub include_input: bool,
    /// Write metadata events as markers (`m`).
    pub include_markers: bool,
}

impl Default for AsciicastOptions {
    fn default() -> Self {
        Self {
            idle_time_limit: None,
            include_input: true,
            include_markers: true,
        }
    }
}

impl AsciicastOptions {
    /// Create default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress idle gaps.
    #[must_use]
    pub fn with_idle_time_limit(mut self, seconds: f64) -> Self {
        self.idle_time_limit = (seconds.is_finite() && seconds > 0.0).then_some(seconds);
        self
    }

    /// Leave input events out.
    #[must_use]
    pub const fn without_input(mut self) -> Self {
        self.include_input = false;
        self
    }

    /// Leave metadata markers out.
    #[must_use]
    pub const fn without_markers(mut self) -> Self {
        self.include_markers = false;
        self
    }
}

#[derive(Serialize, Deserialize)]
struct EventLine(f64, String, String);

/// Maps absolute timestamps to (optionally idle-compressed) offsets.
struct Timeline {
    previous: i64,
    offset: f64,
    limit: Option<f64>,
}

impl Timeline {
    const fn new(start: i64, limit: Option<f64>) -> Self {
        Self {
            previous: start,
            offset: 0.0,
            limit,
        }
    }

    fn at(&mut self, timestamp: i64) -> f64 {
        let gap = timestamp.saturating_sub(self.previous).max(0) as f64 / 1000.0;
        self.offset += self.limit.map_or(gap, |limit| gap.min(limit));
        self.previous = self.previous.max(timestamp);
        self.offset
    }
}

/// Write a recording in asciicast v2 format.
pub fn write_asciicast<W: Write>(
    writer: &mut W,
    file: &RecordingFile,
    options: &AsciicastOptions,
) -> Result<()> {
    let mut timeline = Timeline::new(file.start_time(), options.idle_time_limit);
    let mut lines = Vec::with_capacity(file.events.len());

    for event in &file.events {
        let (code, data) = match &event.payload {
            EventPayload::Output(bytes) => ("o", String::from_utf8_lossy(bytes).into_owned()),
            EventPayload::Input(text) if options.include_input => ("i", text.clone()),
            EventPayload::Resize { cols, rows } => ("r", format!("{cols}x{rows}")),
            EventPayload::Metadata { key, .. } if options.include_markers => ("m", key.clone()),
            EventPayload::Input(_) | EventPayload::Metadata { .. } => {
                timeline.at(event.timestamp);
                continue;
            }
        };
        lines.push(EventLine(timeline.at(event.timestamp), code.to_string(), data));
    }

    let mut header = AsciicastHeader::new(file.metadata.terminal_size);
    header.timestamp = Some(file.start_time().div_euclid(1000));
    header.duration = Some(timeline.at(file.end_time()));
    header.idle_time_limit = options.idle_time_limit;
    header.title = Some(file.metadata.session_name.clone());

    let header_json = serde_json::to_string(&header)?;
    ShellcastError::with_io_context(
        writeln!(writer, "{header_json}"),
        "writing asciicast header",
    )?;
    for line in &lines {
        let json = serde_json::to_string(line)?;
        ShellcastError::with_io_context(writeln!(writer, "{json}"), "writing asciicast event")?;
    }

    writer.flush()?;

    tracing::debug!(events = lines.len(), "asciicast written");
    Ok(())
}

/// Read an asciicast v2 file into a recording.
///
/// Unknown event codes are skipped. The connection id is
/// [`IMPORTED_CONNECTION_ID`]; the session name is the cast's title.
pub fn read_asciicast<R: BufRead>(reader: R) -> Result<RecordingFile> {
    let mut lines = reader.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| ShellcastError::invalid_recording("empty asciicast file"))?;
    let header_line = ShellcastError::with_io_context(header_line, "reading asciicast header")?;
    let header: AsciicastHeader = serde_json::from_str(&header_line)
        .map_err(|e| ShellcastError::invalid_recording(format!("bad asciicast header: {e}")))?;
    if header.version != ASCIICAST_VERSION {
        return Err(ShellcastError::UnsupportedVersion {
            version: header.version.to_string(),
        });
    }

    let start = header.timestamp.unwrap_or(0).saturating_mul(1000);
    let mut events = Vec::new();
    let mut last = start;

    for (index, line) in lines.enumerate() {
        let line = ShellcastError::with_io_context(line, "reading asciicast event")?;
        if line.trim().is_empty() {
            continue;
        }
        let EventLine(time, code, data) = serde_json::from_str(&line).map_err(|e| {
            ShellcastError::invalid_recording(format!("bad asciicast event on line {}: {e}", index + 2))
        })?;

        let timestamp = start.saturating_add(seconds_to_millis(time)).max(last);
        let payload = match code.as_str() {
            "o" => EventPayload::Output(data.into_bytes()),
            "i" => EventPayload::Input(data),
            "r" => match parse_size(&data) {
                Some(size) => EventPayload::Resize {
                    cols: size.cols,
                    rows: size.rows,
                },
                None => {
                    tracing::warn!(line = index + 2, data = %data, "skipping malformed resize");
                    continue;
                }
            },
            "m" => EventPayload::Metadata {
                key: data,
                value: serde_json::Value::Null,
            },
            other => {
                tracing::debug!(code = other, "skipping unknown asciicast event");
                continue;
            }
        };
        last = timestamp;
        events.push(RecordingEvent::new(timestamp, payload));
    }

    let mut metadata = RecordingMetadata::new(
        IMPORTED_CONNECTION_ID,
        header
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| IMPORTED_SESSION_NAME.to_string()),
        start,
        TerminalSize::new(header.width, header.height),
    );
    let end = header
        .duration
        .map_or(last, |d| start.saturating_add(seconds_to_millis(d)).max(last));
    metadata.end_time = Some(end);
    let duration = header.duration.unwrap_or(end.saturating_sub(start) as f64 / 1000.0);
    metadata.duration = duration;

    Ok(RecordingFile::new(metadata, events))
}

fn seconds_to_millis(seconds: f64) -> i64 {
    if seconds.is_finite() {
        (seconds * 1000.0).round().max(0.0) as i64
    } else {
        0
    }
}

fn parse_size(data: &str) -> Option<TerminalSize> {
    let (cols, rows) = data.split_once('x')?;
    Some(TerminalSize::new(cols.trim().parse().ok()?, rows.trim().parse().ok()?))
}
