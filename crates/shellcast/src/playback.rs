//! Recording playback.
//!
//! The [`PlaybackEngine`] maps wall-clock time onto a recording's virtual
//! timeline and dispatches events to [`PlaybackCallbacks`]. The engine owns
//! no timer: a driver ([`drive`] or [`drive_blocking`]) asks it how long to
//! wait via [`PlaybackEngine::next_tick_in`] and calls
//! [`PlaybackEngine::tick`].
//!
//! # Example
//!
//! ```
//! use shellcast::clock::ManualClock;
//! use shellcast::playback::{PlaybackCallbacks, PlaybackEngine, drive_blocking};
//! use shellcast::recording::{RecordingEvent, RecordingFile, RecordingMetadata, TerminalSize};
//! use std::sync::{Arc, Mutex};
//!
//! let metadata = RecordingMetadata::new("conn", "demo", 0, TerminalSize::default());
//! let file = RecordingFile::new(metadata, vec![RecordingEvent::output(120, b"hi".to_vec())]);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let mut engine = PlaybackEngine::new(ManualClock::shared(0)).with_callbacks(
//!     PlaybackCallbacks::new().on_output(move |bytes| sink.lock().unwrap().extend_from_slice(bytes)),
//! );
//!
//! engine.load(file);
//! assert!(engine.play().is_applied());
//! drive_blocking(&mut engine);
//! assert_eq!(seen.lock().unwrap().as_slice(), b"hi");
//! ```

mod callbacks;
mod driver;
mod engine;

pub use callbacks::PlaybackCallbacks;
pub use driver::{drive, drive_blocking};
pub use engine::{PlaybackEngine, PlaybackStatus, Transition};
