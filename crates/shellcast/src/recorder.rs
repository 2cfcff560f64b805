//! Live session capture.
//!
//! A [`TerminalRecorder`] turns the input, output and resize stream of one
//! terminal session into a [`RecordingFile`]. Active duration is tracked
//! separately from event timestamps so paused intervals never count towards
//! the recording's length.

use std::fmt;

use serde_json::json;

use crate::clock::{SharedClock, SystemClock};
use crate::config::RecorderConfig;
use crate::error::{Result, ShellcastError};
use crate::recording::{
    RecordingEvent, RecordingFile, RecordingMetadata, TerminalConfig, TerminalSize, markers,
};

/// Recorder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Built but not started.
    Created,
    /// Capturing events.
    Recording,
    /// Started, capture suspended.
    Paused,
    /// Finished. Terminal.
    Stopped,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        })
    }
}

/// Snapshot of recording progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingPreview {
    /// Start of capture, epoch milliseconds.
    pub start_time: i64,
    /// Events captured so far.
    pub event_count: usize,
    /// Active duration so far, in seconds.
    pub duration: f64,
}

/// Captures one terminal session. Single use: one `start`/`stop` pair.
#[derive(Debug)]
pub struct TerminalRecorder {
    clock: SharedClock,
    connection_id: String,
    session_name: String,
    initial_size: TerminalSize,
    current_size: TerminalSize,
    terminal_config: Option<TerminalConfig>,
    tags: Vec<String>,
    max_events: Option<usize>,
    state: RecorderState,
    start_time: i64,
    accumulated_ms: i64,
    last_resume_time: i64,
    events: Vec<RecordingEvent>,
    data_events: usize,
    cap_reported: bool,
}

impl TerminalRecorder {
    /// Create a recorder using the system clock.
    #[must_use]
    pub fn new(
        connection_id: impl Into<String>,
        session_name: impl Into<String>,
        size: TerminalSize,
    ) -> Self {
        RecorderBuilder::new(connection_id, session_name)
            .size(size.cols, size.rows)
            .build()
    }

    /// Start building a recorder.
    #[must_use]
    pub fn builder(
        connection_id: impl Into<String>,
        session_name: impl Into<String>,
    ) -> RecorderBuilder {
        RecorderBuilder::new(connection_id, session_name)
    }

    /// Begin capturing.
    ///
    /// Fails unless the recorder is freshly created.
    pub fn start(&mut self) -> Result<()> {
        if self.state != RecorderState::Created {
            return Err(ShellcastError::illegal_state("start", self.state));
        }

        let now = self.clock.now_millis();
        self.start_time = now;
        self.accumulated_ms = 0;
        self.last_resume_time = now;
        self.events.clear();
        self.data_events = 0;
        self.state = RecorderState::Recording;

        self.push(RecordingEvent::metadata(
            now,
            markers::RECORDING_START,
            json!({
                "connectionId": self.connection_id,
                "sessionName": self.session_name,
                "cols": self.initial_size.cols,
                "rows": self.initial_size.rows,
            }),
        ));

        tracing::info!(
            connection_id = %self.connection_id,
            session = %self.session_name,
            size = %self.initial_size,
            "recording started"
        );
        Ok(())
    }

    /// Record keystrokes sent to the shell.
    pub fn record_input(&mut self, data: &str) {
        if !self.accepts_data() {
            return;
        }
        let ts = self.timestamp();
        self.push_data(RecordingEvent::input(ts, data));
    }

    /// Record bytes received from the shell. The bytes are copied.
    pub fn record_output(&mut self, data: &[u8]) {
        if !self.accepts_data() {
            return;
        }
        let ts = self.timestamp();
        self.push_data(RecordingEvent::output(ts, data));
    }

    /// Record a terminal resize.
    pub fn record_resize(&mut self, cols: u16, rows: u16) {
        if !self.accepts_data() {
            return;
        }
        self.current_size = TerminalSize::new(cols, rows);
        let ts = self.timestamp();
        self.push_data(RecordingEvent::resize(ts, cols, rows));
    }

    /// Suspend capture. Returns whether the call had an effect.
    pub fn pause(&mut self) -> bool {
        if self.state != RecorderState::Recording {
            return false;
        }

        // Fold the running interval in before the state flips.
        let now = self.clock.now_millis();
        self.accumulated_ms = self
            .accumulated_ms
            .saturating_add(now.saturating_sub(self.last_resume_time).max(0));
        self.state = RecorderState::Paused;

        let ts = self.timestamp();
        self.push(RecordingEvent::metadata(
            ts,
            markers::RECORDING_PAUSED,
            json!({ "activeDuration": millis_to_secs(self.accumulated_ms) }),
        ));
        tracing::debug!(connection_id = %self.connection_id, "recording paused");
        true
    }

    /// Resume capture. Returns whether the call had an effect.
    pub fn resume(&mut self) -> bool {
        if self.state != RecorderState::Paused {
            return false;
        }

        self.last_resume_time = self.clock.now_millis();
        self.state = RecorderState::Recording;

        let ts = self.timestamp();
        self.push(RecordingEvent::metadata(
            ts,
            markers::RECORDING_RESUMED,
            json!({ "activeDuration": millis_to_secs(self.accumulated_ms) }),
        ));
        tracing::debug!(connection_id = %self.connection_id, "recording resumed");
        true
    }

    /// Finish capturing and assemble the recording.
    ///
    /// Fails unless the recorder is recording or paused.
    pub fn stop(&mut self) -> Result<RecordingFile> {
        if !self.is_recording() {
            return Err(ShellcastError::illegal_state("stop", self.state));
        }

        let now = self.clock.now_millis();
        let active_ms = self.active_millis(now);
        self.accumulated_ms = active_ms;
        self.state = RecorderState::Stopped;

        let duration = millis_to_secs(active_ms);
        let end_time = self.timestamp();
        self.push(RecordingEvent::metadata(
            end_time,
            markers::RECORDING_END,
            json!({ "duration": duration }),
        ));

        let mut metadata = RecordingMetadata::new(
            self.connection_id.clone(),
            self.session_name.clone(),
            self.start_time,
            self.initial_size,
        );
        metadata.end_time = Some(end_time);
        metadata.duration = duration;
        metadata.tags.clone_from(&self.tags);
        metadata.terminal_config.clone_from(&self.terminal_config);

        let file = RecordingFile::new(metadata, self.events.clone());
        tracing::info!(
            connection_id = %self.connection_id,
            events = file.metadata.event_count,
            duration_secs = duration,
            "recording stopped"
        );
        Ok(file)
    }

    /// Current progress. Does not change recorder state.
    #[must_use]
    pub fn preview(&self) -> RecordingPreview {
        RecordingPreview {
            start_time: self.start_time,
            event_count: self.events.len(),
            duration: millis_to_secs(self.active_millis(self.clock.now_millis())),
        }
    }

    /// Copy of the events captured so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordingEvent> {
        self.events.clone()
    }

    /// Number of events captured so far.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RecorderState {
        self.state
    }

    /// Whether `start` has been called and `stop` has not (paused included).
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording | RecorderState::Paused)
    }

    /// Whether capture is suspended.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state == RecorderState::Paused
    }

    /// Most recent terminal size seen by the recorder.
    #[must_use]
    pub const fn terminal_size(&self) -> TerminalSize {
        self.current_size
    }

    /// Connection identifier.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Session display name.
    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    fn active_millis(&self, now: i64) -> i64 {
        match self.state {
            RecorderState::Recording => self
                .accumulated_ms
                .saturating_add(now.saturating_sub(self.last_resume_time).max(0)),
            _ => self.accumulated_ms,
        }
    }

    fn accepts_data(&mut self) -> bool {
        if self.state != RecorderState::Recording {
            return false;
        }
        match self.max_events {
            Some(max) if self.data_events >= max => {
                if !self.cap_reported {
                    self.cap_reported = true;
                    tracing::warn!(
                        connection_id = %self.connection_id,
                        max_events = max,
                        "event cap reached; further session data is dropped"
                    );
                }
                false
            }
            _ => true,
        }
    }

    /// Clock reading, clamped so timestamps never decrease.
    fn timestamp(&self) -> i64 {
        let now = self.clock.now_millis();
        self.events.last().map_or(now, |last| now.max(last.timestamp))
    }

    fn push_data(&mut self, event: RecordingEvent) {
        self.data_events += 1;
        self.push(event);
    }

    fn push(&mut self, event: RecordingEvent) {
        self.events.push(event);
    }
}

fn millis_to_secs(millis: i64) -> f64 {
    millis as f64 / 1000.0
}

/// Builder for creating recorders.
#[derive(Debug)]
pub struct RecorderBuilder {
    connection_id: String,
    session_name: String,
    size: TerminalSize,
    terminal_config: Option<TerminalConfig>,
    tags: Vec<String>,
    max_events: Option<usize>,
    clock: Option<SharedClock>,
}

impl RecorderBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(connection_id: impl Into<String>, session_name: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            session_name: session_name.into(),
            size: TerminalSize::default(),
            terminal_config: None,
            tags: Vec::new(),
            max_events: None,
            clock: None,
        }
    }

    /// Set initial dimensions.
    #[must_use]
    pub const fn size(mut self, cols: u16, rows: u16) -> Self {
        self.size = TerminalSize::new(cols, rows);
        self
    }

    /// Attach a visual configuration snapshot.
    #[must_use]
    pub fn terminal_config(mut self, config: TerminalConfig) -> Self {
        self.terminal_config = Some(config);
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set maximum data events.
    #[must_use]
    pub const fn max_events(mut self, count: usize) -> Self {
        self.max_events = Some(count);
        self
    }

    /// Apply recorder configuration (cap and default tags).
    #[must_use]
    pub fn config(mut self, config: &RecorderConfig) -> Self {
        if config.max_events.is_some() {
            self.max_events = config.max_events;
        }
        self.tags.extend(config.default_tags.iter().cloned());
        self
    }

    /// Use a specific clock.
    #[must_use]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the recorder.
    #[must_use]
    pub fn build(self) -> TerminalRecorder {
        TerminalRecorder {
            clock: self.clock.unwrap_or_else(SystemClock::shared),
            connection_id: self.connection_id,
            session_name: self.session_name,
            initial_size: self.size,
            current_size: self.size,
            terminal_config: self.terminal_config,
            tags: self.tags,
            max_events: self.max_events,
            state: RecorderState::Created,
            start_time: 0,
            accumulated_ms: 0,
            last_resume_time: 0,
            events: Vec::new(),
            data_events: 0,
            cap_reported: false,
        }
    }
}
