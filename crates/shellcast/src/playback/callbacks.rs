//! Playback sinks.

use std::fmt;

use serde_json::Value;

use crate::recording::{EventPayload, RecordingEvent};

type OutputFn = Box<dyn FnMut(&[u8]) + Send>;
type ResizeFn = Box<dyn FnMut(u16, u16) + Send>;
type MetadataFn = Box<dyn FnMut(&str, &Value) + Send>;
type ProgressFn = Box<dyn FnMut(i64, i64) + Send>;
type EndedFn = Box<dyn FnMut() + Send>;

/// Optional handlers the engine dispatches to. Any subset may be set.
#[derive(Default)]
pub struct PlaybackCallbacks {
    on_output: Option<OutputFn>,
    on_resize: Option<ResizeFn>,
    on_metadata: Option<MetadataFn>,
    on_progress: Option<ProgressFn>,
    on_ended: Option<EndedFn>,
}

impl PlaybackCallbacks {
    /// Create an empty set of callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive recorded output bytes.
    #[must_use]
    pub fn on_output(mut self, f: impl FnMut(&[u8]) + Send + 'static) -> Self {
        self.on_output = Some(Box::new(f));
        self
    }

    /// Receive terminal resizes as `(cols, rows)`.
    #[must_use]
    pub fn on_resize(mut self, f: impl FnMut(u16, u16) + Send + 'static) -> Self {
        self.on_resize = Some(Box::new(f));
        self
    }

    /// Receive metadata annotations and lifecycle markers.
    #[must_use]
    pub fn on_metadata(mut self, f: impl FnMut(&str, &Value) + Send + 'static) -> Self {
        self.on_metadata = Some(Box::new(f));
        self
    }

    /// Receive `(current_time, end_time)` after every tick and seek.
    #[must_use]
    pub fn on_progress(mut self, f: impl FnMut(i64, i64) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Called when playback stops, naturally or explicitly.
    #[must_use]
    pub fn on_ended(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_ended = Some(Box::new(f));
        self
    }

    /// Input is never replayed: it was the user's keystrokes, and the
    /// session's echo of them is already in the output stream.
    pub(crate) fn dispatch(&mut self, event: &RecordingEvent) {
        match &event.payload {
            EventPayload::Input(_) => {}
            EventPayload::Output(bytes) => {
                if let Some(f) = self.on_output.as_mut() {
                    f(bytes);
                }
            }
            EventPayload::Resize { cols, rows } => {
                if let Some(f) = self.on_resize.as_mut() {
                    f(*cols, *rows);
                }
            }
            EventPayload::Metadata { key, value } => {
                if let Some(f) = self.on_metadata.as_mut() {
                    f(key, value);
                }
            }
        }
    }

    pub(crate) fn progress(&mut self, current: i64, total: i64) {
        if let Some(f) = self.on_progress.as_mut() {
            f(current, total);
        }
    }

    pub(crate) fn ended(&mut self) {
        if let Some(f) = self.on_ended.as_mut() {
            f();
        }
    }
}

impl fmt::Debug for PlaybackCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCallbacks")
            .field("on_output", &self.on_output.is_some())
            .field("on_resize", &self.on_resize.is_some())
            .field("on_metadata", &self.on_metadata.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_ended", &self.on_ended.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn empty_callbacks_tolerate_every_event() {
        let mut callbacks = PlaybackCallbacks::new();
        callbacks.dispatch(&RecordingEvent::output(0, b"x".to_vec()));
        callbacks.dispatch(&RecordingEvent::resize(0, 1, 1));
        callbacks.dispatch(&RecordingEvent::metadata(0, "k", json!(1)));
        callbacks.progress(0, 1);
        callbacks.ended();
    }

    #[test]
    fn input_is_not_replayed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let mut callbacks =
            PlaybackCallbacks::new().on_output(move |b| sink.lock().unwrap().push(b.to_vec()));
        callbacks.dispatch(&RecordingEvent::input(0, "ls"));
        callbacks.dispatch(&RecordingEvent::output(1, b"out".to_vec()));
        assert_eq!(*log.lock().unwrap(), vec![b"out".to_vec()]);
    }

    #[test]
    fn debug_shows_which_are_set() {
        let callbacks = PlaybackCallbacks::new().on_ended(|| {});
        let text = format!("{callbacks:?}");
        assert!(text.contains("on_ended: true"));
        assert!(text.contains("on_output: false"));
    }
}
