//! Configuration types for shellcast.
//!
//! Configuration is read from a TOML file and then overridden from
//! `SHELLCAST_*` environment variables (see [`env`]). Every section has a
//! usable default, so an empty file is a valid configuration.

pub mod env;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellcastError};

pub use env::{DEFAULT_PREFIX, EnvConfig};

/// Default playback tick interval at 1x speed.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Slowest allowed playback speed.
pub const MIN_PLAYBACK_SPEED: f64 = 0.1;

/// Fastest allowed playback speed.
pub const MAX_PLAYBACK_SPEED: f64 = 4.0;

/// Default directory for stored recordings.
pub const DEFAULT_STORAGE_DIR: &str = "recordings";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recorder settings.
    pub recorder: RecorderConfig,
    /// Playback settings.
    pub playback: PlaybackConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ShellcastError::config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = ShellcastError::with_io_context(
            std::fs::read_to_string(path),
            format!("reading config {}", path.display()),
        )?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&content)
    }

    /// Apply environment overrides.
    #[must_use]
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        if let Some(speed) = env.parse::<f64>("PLAYBACK_SPEED") {
            self.playback.default_speed = speed;
        }
        if let Some(interval) = env.duration_millis("TICK_INTERVAL_MS") {
            self.playback.tick_interval = interval;
        }
        if let Some(dir) = env.get("STORAGE_DIR") {
            self.storage.directory = PathBuf::from(dir);
        }
        if let Some(max) = env.parse::<usize>("MAX_EVENTS") {
            self.recorder.max_events = Some(max);
        }
        if let Some(level) = env.get("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env.get("LOG_FORMAT").and_then(|f| LogFormat::parse(&f)) {
            self.logging.format = format;
        }
        self
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.playback.tick_interval.is_zero() {
            return Err(ShellcastError::config("playback.tick_interval_ms must be positive"));
        }
        if !self.playback.default_speed.is_finite() || self.playback.default_speed <= 0.0 {
            return Err(ShellcastError::config("playback.default_speed must be positive"));
        }
        if self.recorder.max_events == Some(0) {
            return Err(ShellcastError::config("recorder.max_events must be positive"));
        }
        Ok(())
    }
}

/// Configuration for recorders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Maximum number of data events to capture. Lifecycle markers are not
    /// counted against the cap.
    pub max_events: Option<usize>,
    /// Tags attached to every new recording.
    pub default_tags: Vec<String>,
}

impl RecorderConfig {
    /// Create a default recorder configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event cap.
    #[must_use]
    pub const fn max_events(mut self, count: usize) -> Self {
        self.max_events = Some(count);
        self
    }

    /// Add a default tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tags.push(tag.into());
        self
    }
}

/// Configuration for the playback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Tick interval at 1x speed; divided by the speed while playing.
    #[serde(rename = "tick_interval_ms", with = "duration_millis")]
    pub tick_interval: Duration,
    /// Speed applied on `load`.
    pub default_speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            default_speed: 1.0,
        }
    }
}

impl PlaybackConfig {
    /// Create a default playback configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval.
    #[must_use]
    pub const fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set the default speed.
    #[must_use]
    pub const fn default_speed(mut self, speed: f64) -> Self {
        self.default_speed = speed;
        self
    }
}

/// Configuration for the file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory recordings are written to.
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// Single-line compact output.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Parse a format name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
