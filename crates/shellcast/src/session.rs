//! Per-connection recorder registry.
//!
//! A host running several terminal connections keeps one
//! [`RecordingSessions`] and routes each connection's I/O through it by id.
//! At most one recorder exists per connection.

use std::collections::HashMap;

use crate::clock::{SharedClock, SystemClock};
use crate::config::RecorderConfig;
use crate::error::{Result, ShellcastError};
use crate::recorder::{RecordingPreview, TerminalRecorder};
use crate::recording::{RecordingFile, TerminalConfig, TerminalSize};
use crate::store::{RecordingStore, StoredRecording};

/// Active recorders keyed by connection id.
#[derive(Debug)]
pub struct RecordingSessions {
    clock: SharedClock,
    config: RecorderConfig,
    recorders: HashMap<String, TerminalRecorder>,
}

impl Default for RecordingSessions {
    fn default() -> Self {
        Self::new(SystemClock::shared())
    }
}

impl RecordingSessions {
    /// Create an empty registry.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            config: RecorderConfig::default(),
            recorders: HashMap::new(),
        }
    }

    /// Apply recorder configuration to every recorder started from now on.
    #[must_use]
    pub fn with_config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }

    /// Start recording a connection.
    pub fn start(
        &mut self,
        connection_id: &str,
        session_name: &str,
        size: TerminalSize,
        terminal_config: Option<TerminalConfig>,
    ) -> Result<()> {
        if self.recorders.contains_key(connection_id) {
            return Err(ShellcastError::AlreadyRecording {
                connection_id: connection_id.to_string(),
            });
        }

        let mut builder = TerminalRecorder::builder(connection_id, session_name)
            .size(size.cols, size.rows)
            .clock(self.clock.clone())
            .config(&self.config);
        if let Some(terminal_config) = terminal_config {
            builder = builder.terminal_config(terminal_config);
        }

        let mut recorder = builder.build();
        recorder.start()?;
        self.recorders.insert(connection_id.to_string(), recorder);
        Ok(())
    }

    /// Route keystrokes. Unknown connections are ignored.
    pub fn record_input(&mut self, connection_id: &str, data: &str) {
        if let Some(recorder) = self.recorders.get_mut(connection_id) {
            recorder.record_input(data);
        }
    }

    /// Route output bytes. Unknown connections are ignored.
    pub fn record_output(&mut self, connection_id: &str, data: &[u8]) {
        if let Some(recorder) = self.recorders.get_mut(connection_id) {
            recorder.record_output(data);
        }
    }

    /// Route a resize. Unknown connections are ignored.
    pub fn record_resize(&mut self, connection_id: &str, cols: u16, rows: u16) {
        if let Some(recorder) = self.recorders.get_mut(connection_id) {
            recorder.record_resize(cols, rows);
        }
    }

    /// Pause a connection's recorder.
    pub fn pause(&mut self, connection_id: &str) -> Result<bool> {
        Ok(self.recorder_mut(connection_id)?.pause())
    }

    /// Resume a connection's recorder.
    pub fn resume(&mut self, connection_id: &str) -> Result<bool> {
        Ok(self.recorder_mut(connection_id)?.resume())
    }

    /// Stop a connection's recorder and hand back the recording.
    pub fn stop(&mut self, connection_id: &str) -> Result<RecordingFile> {
        let mut recorder =
            self.recorders
                .remove(connection_id)
                .ok_or_else(|| ShellcastError::NoActiveRecording {
                    connection_id: connection_id.to_string(),
                })?;
        recorder.stop()
    }

    /// Stop a connection's recorder and persist the result.
    pub fn stop_and_save(
        &mut self,
        connection_id: &str,
        store: &dyn RecordingStore,
    ) -> Result<StoredRecording> {
        let file = self.stop(connection_id)?;
        store.save(&file)
    }

    /// Progress of a connection's recording.
    #[must_use]
    pub fn preview(&self, connection_id: &str) -> Option<RecordingPreview> {
        self.recorders.get(connection_id).map(TerminalRecorder::preview)
    }

    /// Whether a connection is being recorded (paused included).
    #[must_use]
    pub fn is_recording(&self, connection_id: &str) -> bool {
        self.recorders.contains_key(connection_id)
    }

    /// Connection ids with an active recorder, sorted.
    #[must_use]
    pub fn active(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.recorders.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn recorder_mut(&mut self, connection_id: &str) -> Result<&mut TerminalRecorder> {
        self.recorders
            .get_mut(connection_id)
            .ok_or_else(|| ShellcastError::NoActiveRecording {
                connection_id: connection_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn sessions() -> RecordingSessions {
        RecordingSessions::new(ManualClock::shared(1_000))
    }

    #[test]
    fn one_recorder_per_connection() {
        let mut sessions = sessions();
        sessions
            .start("a", "alpha", TerminalSize::default(), None)
            .unwrap();
        let err = sessions
            .start("a", "again", TerminalSize::default(), None)
            .unwrap_err();
        assert!(matches!(err, ShellcastError::AlreadyRecording { .. }));
        assert_eq!(sessions.active(), vec!["a"]);
    }

    #[test]
    fn routes_by_connection() {
        let mut sessions = sessions();
        sessions.start("a", "alpha", TerminalSize::default(), None).unwrap();
        sessions.start("b", "beta", TerminalSize::default(), None).unwrap();
        sessions.record_output("a", b"to a");
        sessions.record_output("missing", b"dropped");

        assert_eq!(sessions.preview("a").map(|p| p.event_count), Some(2));
        assert_eq!(sessions.preview("b").map(|p| p.event_count), Some(1));

        let file = sessions.stop("a").unwrap();
        assert_eq!(file.output_text(), "to a");
        assert!(!sessions.is_recording("a"));
        assert!(sessions.is_recording("b"));
    }

    #[test]
    fn unknown_connection_errors() {
        let mut sessions = sessions();
        assert!(matches!(
            sessions.stop("x"),
            Err(ShellcastError::NoActiveRecording { .. })
        ));
        assert!(sessions.pause("x").is_err());
    }

    #[test]
    fn pause_and_resume_report_effect() {
        let mut sessions = sessions();
        sessions.start("a", "alpha", TerminalSize::default(), None).unwrap();
        assert!(sessions.pause("a").unwrap());
        assert!(!sessions.pause("a").unwrap());
        assert!(sessions.resume("a").unwrap());
    }

    #[test]
    fn config_applies_to_new_recorders() {
        let mut sessions = sessions().with_config(RecorderConfig::new().tag("ssh"));
        sessions
            .start(
                "a",
                "alpha",
                TerminalSize::new(120, 40),
                Some(TerminalConfig::new().with_theme("nord")),
            )
            .unwrap();
        let file = sessions.stop("a").unwrap();
        assert_eq!(file.metadata.tags, vec!["ssh"]);
        assert_eq!(file.metadata.terminal_size, TerminalSize::new(120, 40));
        assert!(file.metadata.terminal_config.is_some());
    }
}
