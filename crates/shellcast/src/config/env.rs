//! Environment-based configuration.

use std::collections::HashMap;
use std::time::Duration;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "SHELLCAST";

/// Environment variable reader.
///
/// Values come from the process environment unless overridden with
/// [`EnvConfig::with_var`], which keeps tests free of global state.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Explicit values that shadow the process environment.
    overrides: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Shadow a variable (by its unprefixed name).
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        let key = self.var_name(name);
        self.overrides.insert(key, value.into());
        self
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        self.overrides
            .get(&var_name)
            .cloned()
            .or_else(|| std::env::var(&var_name).ok())
    }

    /// Get a parsed value. Unparseable values are logged and ignored.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        let raw = self.get(name)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(var = %self.var_name(name), value = %raw, "ignoring unparseable environment override");
                None
            }
        }
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a duration in milliseconds.
    #[must_use]
    pub fn duration_millis(&self, name: &str) -> Option<Duration> {
        self.parse::<u64>(name).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LogFormat};

    #[test]
    fn var_name_uses_prefix() {
        let env = EnvConfig::default();
        assert_eq!(env.var_name("playback_speed"), "SHELLCAST_PLAYBACK_SPEED");
    }

    #[test]
    fn overrides_shadow_environment() {
        let env = EnvConfig::new("SHELLCAST_TEST_UNSET").with_var("speed", "1.5");
        assert_eq!(env.parse::<f64>("speed"), Some(1.5));
        assert_eq!(env.get("other"), None);
    }

    #[test]
    fn bad_values_are_ignored() {
        let env = EnvConfig::new("SHELLCAST_TEST_UNSET").with_var("MAX_EVENTS", "lots");
        assert_eq!(env.parse::<usize>("MAX_EVENTS"), None);
    }

    #[test]
    fn bool_values() {
        let env = EnvConfig::new("SHELLCAST_TEST_UNSET")
            .with_var("a", "yes")
            .with_var("b", "0");
        assert_eq!(env.bool("a"), Some(true));
        assert_eq!(env.bool("b"), Some(false));
    }

    #[test]
    fn config_env_overrides() {
        let env = EnvConfig::new("SHELLCAST_TEST_UNSET")
            .with_var("PLAYBACK_SPEED", "3")
            .with_var("TICK_INTERVAL_MS", "10")
            .with_var("STORAGE_DIR", "/var/casts")
            .with_var("MAX_EVENTS", "42")
            .with_var("LOG_FORMAT", "json");
        let config = Config::default().with_env(&env);

        assert!((config.playback.default_speed - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.playback.tick_interval, Duration::from_millis(10));
        assert_eq!(config.storage.directory.to_str(), Some("/var/casts"));
        assert_eq!(config.recorder.max_events, Some(42));
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
