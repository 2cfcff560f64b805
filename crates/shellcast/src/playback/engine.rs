//! Virtual-timeline playback engine.

use std::fmt;
use std::time::Duration;

use super::callbacks::PlaybackCallbacks;
use crate::clock::{SharedClock, SystemClock};
use crate::config::{MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED, PlaybackConfig};
use crate::recording::RecordingFile;

/// Playback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Loaded (or empty) and not started.
    #[default]
    Idle,
    /// Advancing with wall-clock time.
    Playing,
    /// Frozen at the current position.
    Paused,
    /// Stopped explicitly or at end of recording.
    Stopped,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        })
    }
}

/// Outcome of a playback operation.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The operation took effect.
    Applied,
    /// Ignored: no recording is loaded.
    NoRecording,
    /// Ignored: the current status does not allow the operation.
    InvalidState,
}

impl Transition {
    /// Whether the operation took effect.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Replays a [`RecordingFile`] on a virtual timeline.
///
/// Virtual time is `start + (now - base_time) * speed`, where `base_time` is
/// re-anchored on every play, resume, seek and speed change so the timeline
/// never jumps.
#[derive(Debug)]
pub struct PlaybackEngine {
    clock: SharedClock,
    tick_interval: Duration,
    default_speed: f64,
    callbacks: PlaybackCallbacks,
    file: Option<RecordingFile>,
    status: PlaybackStatus,
    current_time: i64,
    current_event_index: usize,
    speed: f64,
    base_time: f64,
    armed: bool,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(SystemClock::shared())
    }
}

impl PlaybackEngine {
    /// Create an idle engine reading time from `clock`.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        let config = PlaybackConfig::default();
        Self {
            clock,
            tick_interval: config.tick_interval,
            default_speed: config.default_speed,
            callbacks: PlaybackCallbacks::default(),
            file: None,
            status: PlaybackStatus::Idle,
            current_time: 0,
            current_event_index: 0,
            speed: config.default_speed,
            base_time: 0.0,
            armed: false,
        }
    }

    /// Apply tick interval and default speed.
    #[must_use]
    pub fn with_config(mut self, config: &PlaybackConfig) -> Self {
        if !config.tick_interval.is_zero() {
            self.tick_interval = config.tick_interval;
        }
        self.default_speed = clamp_speed(config.default_speed).unwrap_or(1.0);
        self.speed = self.default_speed;
        self
    }

    /// Install callbacks.
    #[must_use]
    pub fn with_callbacks(mut self, callbacks: PlaybackCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Replace the callbacks.
    pub fn set_callbacks(&mut self, callbacks: PlaybackCallbacks) {
        self.callbacks = callbacks;
    }

    /// Load a recording and rewind to its start. Does not start playback.
    pub fn load(&mut self, file: RecordingFile) {
        self.armed = false;
        self.current_time = file.start_time();
        self.current_event_index = 0;
        self.speed = self.default_speed;
        self.base_time = 0.0;
        self.status = PlaybackStatus::Idle;
        tracing::debug!(
            session = %file.metadata.session_name,
            events = file.events.len(),
            "recording loaded"
        );
        self.file = Some(file);
    }

    /// Start playing from the current position, or from the beginning after
    /// a stop. Events already due are dispatched immediately.
    pub fn play(&mut self) -> Transition {
        if self.file.is_none() {
            return Transition::NoRecording;
        }
        if self.status == PlaybackStatus::Playing {
            return Transition::InvalidState;
        }

        self.status = PlaybackStatus::Playing;
        self.anchor();
        self.armed = true;
        self.advance();
        Transition::Applied
    }

    /// Freeze playback at the last computed position.
    pub fn pause(&mut self) -> Transition {
        if self.file.is_none() {
            return Transition::NoRecording;
        }
        if self.status != PlaybackStatus::Playing {
            return Transition::InvalidState;
        }

        self.status = PlaybackStatus::Paused;
        self.armed = false;
        Transition::Applied
    }

    /// Continue from where `pause` left off.
    pub fn resume(&mut self) -> Transition {
        if self.file.is_none() {
            return Transition::NoRecording;
        }
        if self.status != PlaybackStatus::Paused {
            return Transition::InvalidState;
        }

        self.status = PlaybackStatus::Playing;
        self.anchor();
        self.armed = true;
        Transition::Applied
    }

    /// Stop and rewind. Fires `on_ended`. Safe to call repeatedly.
    pub fn stop(&mut self) -> Transition {
        let Some(start) = self.file.as_ref().map(RecordingFile::start_time) else {
            return Transition::NoRecording;
        };

        self.status = PlaybackStatus::Stopped;
        self.armed = false;
        self.current_time = start;
        self.current_event_index = 0;
        self.callbacks.ended();
        Transition::Applied
    }

    /// Jump to `timestamp` (absolute epoch ms), clamped to the recording.
    ///
    /// The next event dispatched is the first one at or after the target.
    /// Status is unchanged.
    pub fn seek(&mut self, timestamp: i64) -> Transition {
        let Some(file) = self.file.as_ref() else {
            return Transition::NoRecording;
        };

        let (start, end) = (file.start_time(), file.end_time());
        let target = timestamp.clamp(start, end);
        // Linear scan; recordings are small enough that this never shows up.
        self.current_event_index = file
            .events
            .iter()
            .position(|e| e.timestamp >= target)
            .unwrap_or(file.events.len());
        self.current_time = target;

        if self.status == PlaybackStatus::Playing {
            self.anchor();
        }
        self.callbacks.progress(target, end);
        Transition::Applied
    }

    /// Set the speed multiplier, clamped to `[0.1, 4.0]`.
    ///
    /// While playing, the timeline is re-anchored at once so the new rate
    /// applies from this instant.
    pub fn set_playback_speed(&mut self, speed: f64) -> Transition {
        let Some(speed) = clamp_speed(speed) else {
            tracing::warn!(speed, "ignoring non-finite playback speed");
            return Transition::InvalidState;
        };

        if self.status == PlaybackStatus::Playing {
            self.current_time = self.virtual_now();
            self.speed = speed;
            self.anchor();
        } else {
            self.speed = speed;
        }
        Transition::Applied
    }

    /// Advance to the current wall-clock position.
    ///
    /// Dispatches every due event in order, reports progress, and stops at
    /// the end of the recording.
    pub fn tick(&mut self) -> Transition {
        if self.file.is_none() {
            return Transition::NoRecording;
        }
        if self.status != PlaybackStatus::Playing {
            return Transition::InvalidState;
        }

        self.current_time = self.virtual_now();
        self.advance();
        Transition::Applied
    }

    /// Drop the recording and callbacks. Does not fire `on_ended`.
    pub fn dispose(&mut self) {
        self.armed = false;
        self.file = None;
        self.callbacks = PlaybackCallbacks::default();
        self.status = PlaybackStatus::Idle;
        self.current_time = 0;
        self.current_event_index = 0;
    }

    /// Delay until the next tick is due, or `None` when no tick is needed.
    #[must_use]
    pub fn next_tick_in(&self) -> Option<Duration> {
        self.armed.then(|| self.tick_interval.div_f64(self.speed))
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Current virtual time, absolute epoch ms.
    #[must_use]
    pub const fn current_time(&self) -> i64 {
        self.current_time
    }

    /// Index of the next event to dispatch.
    #[must_use]
    pub const fn current_event_index(&self) -> usize {
        self.current_event_index
    }

    /// Speed multiplier.
    #[must_use]
    pub const fn playback_speed(&self) -> f64 {
        self.speed
    }

    /// Start of the loaded recording.
    #[must_use]
    pub fn start_time(&self) -> Option<i64> {
        self.file.as_ref().map(RecordingFile::start_time)
    }

    /// End of the loaded recording.
    #[must_use]
    pub fn end_time(&self) -> Option<i64> {
        self.file.as_ref().map(RecordingFile::end_time)
    }

    /// Position as a fraction of the recording, in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let Some(file) = self.file.as_ref() else {
            return 0.0;
        };
        let span = file.end_time().saturating_sub(file.start_time());
        if span <= 0 {
            return 0.0;
        }
        (self.current_time.saturating_sub(file.start_time()) as f64 / span as f64).clamp(0.0, 1.0)
    }

    /// The loaded recording.
    #[must_use]
    pub const fn recording(&self) -> Option<&RecordingFile> {
        self.file.as_ref()
    }

    /// The clock the engine reads.
    #[must_use]
    pub const fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Pin `base_time` so that `virtual_now()` equals `current_time`.
    fn anchor(&mut self) {
        let start = self.start_time().unwrap_or(0);
        let elapsed_virtual = self.current_time.saturating_sub(start) as f64;
        self.base_time = self.clock.now_millis() as f64 - elapsed_virtual / self.speed;
    }

    fn virtual_now(&self) -> i64 {
        let Some(file) = self.file.as_ref() else {
            return self.current_time;
        };
        let (start, end) = (file.start_time(), file.end_time());
        let elapsed = (self.clock.now_millis() as f64 - self.base_time) * self.speed;
        start.saturating_add(elapsed.round() as i64).clamp(start, end)
    }

    /// Dispatch due events, report progress, finish at the end.
    fn advance(&mut self) {
        let Some(file) = self.file.as_ref() else {
            return;
        };
        let end = file.end_time();

        while let Some(event) = file.events.get(self.current_event_index) {
            if event.timestamp > self.current_time {
                break;
            }
            self.current_event_index += 1;
            self.callbacks.dispatch(event);
        }

        self.callbacks.progress(self.current_time, end);

        if self.current_time >= end {
            tracing::debug!(dispatched = self.current_event_index, "playback reached end");
            let _ = self.stop();
        }
    }
}

fn clamp_speed(speed: f64) -> Option<f64> {
    speed
        .is_finite()
        .then(|| speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED))
}
