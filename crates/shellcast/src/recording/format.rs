//! Recording format definitions.
//!
//! On disk an event is `{"timestamp", "type", "data"}` where the shape of
//! `data` depends on `type`. In memory the tag and payload are a single
//! [`EventPayload`], so a mismatched pair cannot be represented.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ShellcastError;

/// Current recording format version.
pub const FORMAT_VERSION: &str = "1.0";

/// Metadata keys used for lifecycle markers.
pub mod markers {
    /// Appended by `start()`.
    pub const RECORDING_START: &str = "recording_start";
    /// Appended by `pause()`.
    pub const RECORDING_PAUSED: &str = "recording_paused";
    /// Appended by `resume()`.
    pub const RECORDING_RESUMED: &str = "recording_resumed";
    /// Appended by `stop()`.
    pub const RECORDING_END: &str = "recording_end";
}

/// Event type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Keystrokes sent to the remote shell.
    Input,
    /// Bytes received from the remote shell.
    Output,
    /// Terminal resize.
    Resize,
    /// Lifecycle marker or host annotation.
    Metadata,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Input, Self::Output, Self::Resize, Self::Metadata];

    /// The wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Resize => "resize",
            Self::Metadata => "metadata",
        }
    }

    /// Parse a wire tag. Unknown tags are `None`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Raw keystrokes.
    Input(String),
    /// Raw output bytes, order preserved.
    Output(Vec<u8>),
    /// New terminal dimensions.
    Resize {
        /// Column count.
        cols: u16,
        /// Row count.
        rows: u16,
    },
    /// Key/value annotation.
    Metadata {
        /// Marker or annotation key.
        key: String,
        /// Arbitrary JSON value.
        value: Value,
    },
}

impl EventPayload {
    /// The tag for this payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Input(_) => EventKind::Input,
            Self::Output(_) => EventKind::Output,
            Self::Resize { .. } => EventKind::Resize,
            Self::Metadata { .. } => EventKind::Metadata,
        }
    }

    fn into_data(self) -> Value {
        match self {
            Self::Input(text) => json!({ "data": text }),
            Self::Output(bytes) => json!({ "data": bytes }),
            Self::Resize { cols, rows } => json!({ "cols": cols, "rows": rows }),
            Self::Metadata { key, value } => json!({ "key": key, "value": value }),
        }
    }

    fn from_data(kind: EventKind, data: Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Text {
            data: String,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Bytes {
            Wrapped { data: Vec<u8> },
            Legacy(Vec<u8>),
        }

        #[derive(Deserialize)]
        struct Size {
            cols: u16,
            rows: u16,
        }

        #[derive(Deserialize)]
        struct Annotation {
            key: String,
            #[serde(default)]
            value: Value,
        }

        Ok(match kind {
            EventKind::Input => Self::Input(serde_json::from_value::<Text>(data)?.data),
            EventKind::Output => match serde_json::from_value::<Bytes>(data)? {
                Bytes::Wrapped { data } | Bytes::Legacy(data) => Self::Output(data),
            },
            EventKind::Resize => {
                let Size { cols, rows } = serde_json::from_value(data)?;
                Self::Resize { cols, rows }
            }
            EventKind::Metadata => {
                let Annotation { key, value } = serde_json::from_value(data)?;
                Self::Metadata { key, value }
            }
        })
    }
}

/// One timestamped occurrence in a recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent", into = "RawEvent")]
pub struct RecordingEvent {
    /// Absolute wall-clock time in epoch milliseconds.
    pub timestamp: i64,
    /// Event payload.
    pub payload: EventPayload,
}

impl RecordingEvent {
    /// Create an event.
    #[must_use]
    pub const fn new(timestamp: i64, payload: EventPayload) -> Self {
        Self { timestamp, payload }
    }

    /// Create an input event.
    #[must_use]
    pub fn input(timestamp: i64, data: impl Into<String>) -> Self {
        Self::new(timestamp, EventPayload::Input(data.into()))
    }

    /// Create an output event.
    #[must_use]
    pub fn output(timestamp: i64, data: impl Into<Vec<u8>>) -> Self {
        Self::new(timestamp, EventPayload::Output(data.into()))
    }

    /// Create a resize event.
    #[must_use]
    pub const fn resize(timestamp: i64, cols: u16, rows: u16) -> Self {
        Self::new(timestamp, EventPayload::Resize { cols, rows })
    }

    /// Create a metadata event.
    #[must_use]
    pub fn metadata(timestamp: i64, key: impl Into<String>, value: Value) -> Self {
        Self::new(
            timestamp,
            EventPayload::Metadata {
                key: key.into(),
                value,
            },
        )
    }

    /// The event's tag.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The metadata key, if this is a metadata event.
    #[must_use]
    pub fn metadata_key(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Metadata { key, .. } => Some(key),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawEvent {
    #[serde(deserialize_with = "epoch_millis")]
    timestamp: i64,
    #[serde(rename = "type")]
    kind: EventKind,
    data: Value,
}

impl TryFrom<RawEvent> for RecordingEvent {
    type Error = ShellcastError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let payload = EventPayload::from_data(raw.kind, raw.data).map_err(|e| {
            ShellcastError::invalid_recording(format!("malformed {} payload: {e}", raw.kind))
        })?;
        Ok(Self::new(raw.timestamp, payload))
    }
}

impl From<RecordingEvent> for RawEvent {
    fn from(event: RecordingEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            kind: event.kind(),
            data: event.payload.into_data(),
        }
    }
}

/// Accepts integral or fractional JSON numbers; fractions are truncated.
fn epoch_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    number
        .as_i64()
        .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .ok_or_else(|| de::Error::custom("timestamp is not a finite number"))
}

fn optional_epoch_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "epoch_millis")] i64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(ms)| ms))
}

/// Terminal dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSize {
    /// Number of columns.
    pub cols: u16,
    /// Number of rows.
    pub rows: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

impl TerminalSize {
    /// Create a new terminal size.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Cursor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorStyle {
    /// Full cell block.
    Block,
    /// Underline.
    Underline,
    /// Vertical bar.
    Bar,
}

/// Snapshot of the terminal's visual configuration at recording time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalConfig {
    /// Theme identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    /// Font family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Font size in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// Font weight (`normal`, `bold`, `400`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    /// Line height multiplier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    /// Cursor shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_style: Option<CursorStyle>,
    /// Whether the cursor blinks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_blink: Option<bool>,
    /// Extra letter spacing in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
}

impl TerminalConfig {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the theme id.
    #[must_use]
    pub fn with_theme(mut self, theme_id: impl Into<String>) -> Self {
        self.theme_id = Some(theme_id.into());
        self
    }

    /// Set font family and size.
    #[must_use]
    pub fn with_font(mut self, family: impl Into<String>, size: f64) -> Self {
        self.font_family = Some(family.into());
        self.font_size = Some(size);
        self
    }

    /// Set the cursor style and blink.
    #[must_use]
    pub const fn with_cursor(mut self, style: CursorStyle, blink: bool) -> Self {
        self.cursor_style = Some(style);
        self.cursor_blink = Some(blink);
        self
    }
}

/// Recording metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    /// Start of capture, epoch milliseconds.
    #[serde(deserialize_with = "epoch_millis")]
    pub start_time: i64,
    /// End of capture, epoch milliseconds.
    #[serde(
        default,
        deserialize_with = "optional_epoch_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<i64>,
    /// Active (non-paused) duration in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Terminal size when capture started.
    pub terminal_size: TerminalSize,
    /// Opaque connection identifier.
    pub connection_id: String,
    /// Display name of the session.
    pub session_name: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Number of events in the file.
    #[serde(default)]
    pub event_count: usize,
    /// Visual configuration snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_config: Option<TerminalConfig>,
}

impl RecordingMetadata {
    /// Create metadata for a session starting at `start_time`.
    #[must_use]
    pub fn new(
        connection_id: impl Into<String>,
        session_name: impl Into<String>,
        start_time: i64,
        terminal_size: TerminalSize,
    ) -> Self {
        Self {
            start_time,
            end_time: None,
            duration: 0.0,
            terminal_size,
            connection_id: connection_id.into(),
            session_name: session_name.into(),
            tags: Vec::new(),
            event_count: 0,
            terminal_config: None,
        }
    }
}

/// A complete, versioned recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingFile {
    /// Format version tag.
    pub version: String,
    /// Metadata.
    pub metadata: RecordingMetadata,
    /// Events in non-decreasing timestamp order.
    pub events: Vec<RecordingEvent>,
}

impl RecordingFile {
    /// Create a file at the current format version. `eventCount` is derived
    /// from `events`.
    #[must_use]
    pub fn new(mut metadata: RecordingMetadata, events: Vec<RecordingEvent>) -> Self {
        metadata.event_count = events.len();
        Self {
            version: FORMAT_VERSION.to_string(),
            metadata,
            events,
        }
    }

    /// Start of the recording's time range.
    #[must_use]
    pub const fn start_time(&self) -> i64 {
        self.metadata.start_time
    }

    /// End of the recording's time range: the recorded end time, else the
    /// last event, else the start.
    #[must_use]
    pub fn end_time(&self) -> i64 {
        self.metadata
            .end_time
            .or_else(|| self.events.last().map(|e| e.timestamp))
            .unwrap_or(self.metadata.start_time)
            .max(self.metadata.start_time)
    }

    /// Whether the file holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All output concatenated as lossy UTF-8.
    #[must_use]
    pub fn output_text(&self) -> String {
        let output: Vec<u8> = self
            .events
            .iter()
            .filter_map(|e| match &e.payload {
                EventPayload::Output(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect();
        String::from_utf8_lossy(&output).into_owned()
    }

    /// All input concatenated.
    #[must_use]
    pub fn input_text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match &e.payload {
                EventPayload::Input(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Filter events by kind.
    #[must_use]
    pub fn filter(&self, kind: EventKind) -> Vec<&RecordingEvent> {
        self.events.iter().filter(|e| e.kind() == kind).collect()
    }
}
